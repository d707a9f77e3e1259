use ccptracker_store::{now_dtm, TurnLog};

/// `ccptracker add <id> <timestamp> <path> <prompt>`
pub fn add(
    log: &TurnLog,
    session_id: &str,
    timestamp: &str,
    project_path: &str,
    prompt: &str,
) -> anyhow::Result<()> {
    tracing::debug!(session_id, project_path, "appending turn");
    let row = log.append(timestamp, prompt)?;
    println!(
        "✅ New row added to CSV (ID: {}, Session: {session_id})",
        row.id
    );
    Ok(())
}

/// Metadata the Stop hook passes along with the response. Logged, not stored.
pub struct ResponseMeta<'a> {
    pub duration: &'a str,
    pub tools_used: &'a str,
    pub tools_count: &'a str,
}

/// `ccptracker update-response <id> <response> <duration> <tools_used> <tools_count>`
pub fn update_response(
    log: &TurnLog,
    session_id: &str,
    response: &str,
    meta: &ResponseMeta<'_>,
) -> anyhow::Result<()> {
    tracing::debug!(
        session_id,
        duration = meta.duration,
        tools_used = meta.tools_used,
        tools_count = meta.tools_count,
        "updating response"
    );
    if log.update_response(response, &now_dtm())?.is_none() {
        tracing::debug!(path = %log.path().display(), "turn log empty, nothing to update");
    }
    println!("✅ Response information updated (Session: {session_id})");
    Ok(())
}

/// `ccptracker update-satisfaction <id> <score> <comment>`
pub fn update_satisfaction(
    log: &TurnLog,
    session_id: &str,
    score: i64,
    comment: &str,
) -> anyhow::Result<()> {
    if log
        .update_satisfaction(score, comment, &now_dtm())?
        .is_none()
    {
        tracing::debug!(path = %log.path().display(), "turn log empty, nothing to rate");
    }
    println!("✅ Satisfaction information updated (Session: {session_id}, Score: {score}/5)");
    Ok(())
}

/// `ccptracker get-latest`
pub fn get_latest(log: &TurnLog) -> anyhow::Result<()> {
    println!("{}", latest_json(log)?);
    Ok(())
}

/// Last row as a spaced one-line JSON object in column order, or `{}` for an
/// empty log.
fn latest_json(log: &TurnLog) -> anyhow::Result<String> {
    match log.latest()? {
        Some(row) => Ok(ccptracker_transcript::to_json_line(&row)?),
        None => Ok("{}".to_string()),
    }
}
