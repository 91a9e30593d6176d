//! # Configuration Module
//!
//! Data directory discovery and runtime settings for Encore.
//!
//! ## Data Storage
//!
//! Encore keeps its database and optional `config.json` in the platform data
//! directory:
//! - Linux: `~/.local/share/encore/`
//! - macOS: `~/Library/Application Support/encore/`
//! - Windows: `%APPDATA%\encore\`
//!
//! ## Settings
//!
//! `config.json` may set any of the [`RuntimeConfig`] fields; missing fields
//! fall back to defaults. The CLI `--db` flag (or `ENCORE_DB`) overrides the
//! database path on top of that.

use anyhow::{Context, Result};
use log::debug;
use path_absolutize::Absolutize;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "config.json";
pub const DB_FILE_NAME: &str = "encore.db";

/// Returns the platform-appropriate data directory for Encore, creating it
/// if needed.
///
/// # Errors
///
/// This function will return an error if:
/// - The system data directory cannot be determined
/// - The encore subdirectory cannot be created due to permissions
pub fn get_data_dir() -> Result<PathBuf> {
    let data_dir = dirs::data_dir()
        .ok_or_else(|| anyhow::anyhow!(
            "Could not determine system data directory. Please ensure your platform supports standard data directories."
        ))?;

    let encore_dir = data_dir.join("encore");
    fs::create_dir_all(&encore_dir)
        .with_context(|| format!(
            "Failed to create Encore data directory at {}. Please check file permissions.",
            encore_dir.display()
        ))?;

    Ok(encore_dir)
}

/// Returns the platform-appropriate database file path.
///
/// ```no_run
/// use encore::config::get_db_path;
///
/// let db_path = get_db_path()?;
/// println!("Database location: {}", db_path.display());
/// # Ok::<(), anyhow::Error>(())
/// ```
pub fn get_db_path() -> Result<PathBuf> {
    Ok(get_data_dir()?.join(DB_FILE_NAME))
}

/// Make `path` absolute relative to the current directory, without touching
/// the filesystem.
pub fn absolute_path(path: &Path) -> Result<PathBuf> {
    Ok(path
        .absolutize()
        .with_context(|| format!("Cannot resolve path {}", path.display()))?
        .into_owned())
}

fn default_limit() -> usize {
    10
}

/// Configuration for runtime behavior
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Path to the database file
    pub db_path: PathBuf,
    /// Number of recommendations shown when `--limit` is not given
    #[serde(default = "default_limit")]
    pub default_limit: usize,
    /// Where `export` writes and `import-profiles` reads when no path is given
    pub snapshot_path: Option<PathBuf>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            db_path: get_db_path().unwrap_or_else(|_| PathBuf::from(DB_FILE_NAME)),
            default_limit: default_limit(),
            snapshot_path: None,
        }
    }
}

impl RuntimeConfig {
    /// Defaults, overlaid with `config.json` from the data directory if
    /// present.
    pub fn load() -> Result<Self> {
        let path = get_data_dir()?.join(CONFIG_FILE_NAME);
        if path.exists() {
            Self::from_file(&path)
        } else {
            debug!("No config file at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Self = serde_json::from_str(&text)
            .with_context(|| format!("Invalid configuration in {}", path.display()))?;
        debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Create configuration with explicit database path
    pub fn with_db_path(db_path: PathBuf) -> Self {
        Self {
            db_path,
            ..Self::default()
        }
    }

    /// Apply a command-line database override, made absolute.
    pub fn override_db_path(mut self, db_path: Option<&Path>) -> Result<Self> {
        if let Some(path) = db_path {
            self.db_path = absolute_path(path)?;
        }
        Ok(self)
    }
}
