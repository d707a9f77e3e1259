use ccptracker_store::{export_rows, now_dtm, ExportFormat, TurnLog};
use std::path::{Path, PathBuf};

pub fn execute(
    log: &TurnLog,
    format: ExportFormat,
    output: Option<&Path>,
    cwd: &Path,
) -> anyhow::Result<()> {
    let rows = log.read_rows()?;
    let output = match output {
        Some(p) => p.to_path_buf(),
        None => default_output(cwd, format, &now_dtm()),
    };
    export_rows(&rows, format, &output)?;
    println!(
        "Exported {} conversations to {}",
        rows.len(),
        output.display()
    );
    Ok(())
}

/// `ccptracker-export-2024-01-15T10-30-00.json` in `cwd`.
fn default_output(cwd: &Path, format: ExportFormat, dtm: &str) -> PathBuf {
    let stamp = dtm.replacen(' ', "T", 1).replace(':', "-");
    cwd.join(format!("ccptracker-export-{stamp}.{}", format.extension()))
}
