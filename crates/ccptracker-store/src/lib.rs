pub mod config;
pub mod export;
pub mod stats;
pub mod turns;

pub use config::{ConfigError, DataLocation, TrackerConfig};
pub use export::{export_rows, ExportError, ExportFormat};
pub use stats::TurnStats;
pub use turns::{format_row_id, now_dtm, TurnLog, TurnRow, FIELDNAMES};

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Return the per-user store root: `~/.ccptracker/`
pub fn store_root() -> PathBuf {
    match dirs::home_dir() {
        Some(home) => home.join(".ccptracker"),
        None => PathBuf::from(".ccptracker"),
    }
}

/// `~/.ccptracker/config.json`
pub fn config_path() -> PathBuf {
    store_root().join("config.json")
}

/// Default CSV location for the global store: `~/.ccptracker/data/ccptracker.csv`
pub fn global_csv_path() -> PathBuf {
    store_root().join("data").join("ccptracker.csv")
}

/// Per-project CSV location: `<project>/ccptracker/data/ccptracker.csv`
pub fn project_csv_path(project_dir: &Path) -> PathBuf {
    project_dir
        .join("ccptracker")
        .join("data")
        .join("ccptracker.csv")
}

/// Atomic write: write to temp file in same dir, then rename.
pub fn write_atomic(path: &Path, data: &[u8]) -> anyhow::Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent)?;
    let mut tmp = tempfile::NamedTempFile::new_in(parent)?;
    tmp.write_all(data)?;
    tmp.flush()?;
    tmp.persist(path)?;
    Ok(())
}
