// Configuration module for the save toolkit

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Config file name, looked up next to the current directory.
pub const CONFIG_FILE_NAME: &str = "er-save-tool.toml";

// =============================================================================
// CONFIGURATION STRUCTURES
// =============================================================================

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Log to stderr
    #[serde(default)]
    pub console: bool,

    /// Log file path (relative to the working directory or absolute).
    /// Empty string disables file logging.
    #[serde(default)]
    pub log_file: String,

    /// Filter directives, same syntax as `RUST_LOG`.
    /// `RUST_LOG` itself takes precedence when set.
    #[serde(default = "default_level")]
    pub level: String,
}

fn default_level() -> String {
    "warn,er_save_toolkit=debug".to_string()
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            console: false,
            log_file: String::new(),
            level: default_level(),
        }
    }
}

impl LoggingSettings {
    /// Configured log file as a path, if any.
    pub fn log_path(&self) -> Option<PathBuf> {
        if self.log_file.is_empty() {
            return None;
        }
        Some(PathBuf::from(&self.log_file))
    }
}

/// Tool configuration, all optional
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Directory backups are written to. Defaults to `backups/` next to
    /// the save file.
    #[serde(default)]
    pub backup_dir: Option<PathBuf>,

    #[serde(default)]
    pub logging: LoggingSettings,
}

impl Config {
    /// Load `er-save-tool.toml` from the working directory; missing file
    /// means defaults.
    pub fn load() -> Self {
        Self::load_from(Path::new(CONFIG_FILE_NAME))
    }

    pub fn load_from(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(text) => match toml::from_str(&text) {
                Ok(config) => {
                    debug!(path = %path.display(), "loaded configuration");
                    config
                }
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "ignoring malformed config");
                    Self::default()
                }
            },
            Err(_) => Self::default(),
        }
    }
}
