use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid data location {0:?}: use \"global\" or \"project\"")]
    InvalidLocation(String),
}

/// Where the turn log lives.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataLocation {
    /// One CSV for every project, at `csvPath`.
    #[default]
    Global,
    /// `<project>/ccptracker/data/ccptracker.csv`
    Project,
}

impl FromStr for DataLocation {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "global" => Ok(Self::Global),
            "project" => Ok(Self::Project),
            other => Err(ConfigError::InvalidLocation(other.to_string())),
        }
    }
}

impl fmt::Display for DataLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Global => f.write_str("global"),
            Self::Project => f.write_str("project"),
        }
    }
}

/// Contents of `~/.ccptracker/config.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackerConfig {
    #[serde(default)]
    pub data_location: DataLocation,
    #[serde(default = "crate::global_csv_path")]
    pub csv_path: PathBuf,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            data_location: DataLocation::Global,
            csv_path: crate::global_csv_path(),
        }
    }
}

impl TrackerConfig {
    /// Load config. A missing or unreadable file yields the defaults.
    pub fn load(path: &Path) -> Self {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(_) => return Self::default(),
        };
        match serde_json::from_str(&content) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "ignoring malformed config");
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        crate::write_atomic(path, json.as_bytes())
    }

    /// CSV path for a hook running in `project_dir`.
    pub fn csv_path_for(&self, project_dir: &Path) -> PathBuf {
        match self.data_location {
            DataLocation::Project => crate::project_csv_path(project_dir),
            DataLocation::Global => self.csv_path.clone(),
        }
    }
}

/// Pick the turn log path: an explicit override wins, otherwise the config
/// file decides relative to `project_dir`.
pub fn resolve_csv_path(
    override_path: Option<&Path>,
    config_path: &Path,
    project_dir: &Path,
) -> PathBuf {
    match override_path {
        Some(p) => p.to_path_buf(),
        None => TrackerConfig::load(config_path).csv_path_for(project_dir),
    }
}
