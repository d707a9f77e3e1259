use ccptracker_store::{DataLocation, TrackerConfig};
use clap::Subcommand;
use std::path::Path;

// ── CLI Schema ──

#[derive(Subcommand)]
pub enum ConfigCmd {
    /// Print ~/.ccptracker/config.json and the CSV path it resolves to
    Show,
    /// Store the turn log globally or per project
    SetLocation {
        /// global or project
        location: DataLocation,
    },
}

// ── Dispatch ──

pub fn run(cmd: ConfigCmd, config_path: &Path, project_dir: &Path) -> anyhow::Result<()> {
    match cmd {
        ConfigCmd::Show => show(config_path, project_dir),
        ConfigCmd::SetLocation { location } => set_location(config_path, location),
    }
}

// ── Command Implementations ──

/// `ccptracker config show`
fn show(config_path: &Path, project_dir: &Path) -> anyhow::Result<()> {
    let config = TrackerConfig::load(config_path);
    println!("config: {}", config_path.display());
    println!("{}", serde_json::to_string_pretty(&config)?);
    println!("csv: {}", config.csv_path_for(project_dir).display());
    Ok(())
}

/// `ccptracker config set-location <global|project>`
fn set_location(config_path: &Path, location: DataLocation) -> anyhow::Result<()> {
    let mut config = TrackerConfig::load(config_path);
    config.data_location = location;
    config.save(config_path)?;
    println!("dataLocation = {location}");
    Ok(())
}
