use ccptracker_store::{TurnLog, TurnStats};

pub fn execute(log: &TurnLog, json: bool) -> anyhow::Result<()> {
    let stats = TurnStats::from_rows(&log.read_rows()?);

    if json {
        let out = serde_json::json!({
            "data_path": log.path().display().to_string(),
            "stats": stats,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!("Data: {}", log.path().display());
    println!("Conversations: {}", stats.total_turns);
    match stats.average_rating {
        Some(avg) => println!("Average rating: {avg:.2}/5 ({} rated)", stats.rated_turns),
        None => println!("Average rating: (none)"),
    }
    println!(
        "Last conversation: {}",
        stats.last_request_dtm.as_deref().unwrap_or("(none)")
    );
    Ok(())
}
