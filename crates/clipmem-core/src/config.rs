//! Settings
//!
//! User-editable settings stored as JSON under the platform config dir, with
//! `CLIPMEM_*` environment variables applied on top. Out-of-range values are
//! clamped by `sanitized()`, never rejected.
//!
//! | Variable | Field |
//! |---|---|
//! | `CLIPMEM_MAX_SIZE` | `max_size` |
//! | `CLIPMEM_AUTO_DELETE_DAYS` | `auto_delete_after_days` |
//! | `CLIPMEM_DUPLICATE_DETECTION` | `duplicate_detection` |
//! | `CLIPMEM_POLL_INTERVAL_MS` | `poll_interval_ms` |
//! | `CLIPMEM_CLIPBOARD_TIMEOUT_SECS` | `clipboard_timeout_secs` |
//! | `CLIPMEM_MAINTENANCE_INTERVAL_SECS` | `maintenance_interval_secs` |
//! | `CLIPMEM_DATA_DIR` | `data_dir` |

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::storage::{DB_FILE_NAME, HistoryConfig};

/// Settings file name inside the config dir
pub const SETTINGS_FILE_NAME: &str = "settings.json";

/// Settings error type
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Settings IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Settings parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Could not determine platform directories")]
    NoPlatformDirs,
}

/// Settings result type
pub type Result<T> = std::result::Result<T, SettingsError>;

/// Runtime settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub max_size: usize,
    pub auto_delete_after_days: Option<u32>,
    pub duplicate_detection: bool,
    pub poll_interval_ms: u64,
    pub clipboard_timeout_secs: u64,
    pub maintenance_interval_secs: u64,
    /// Overrides the platform data dir
    pub data_dir: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            max_size: 1000,
            auto_delete_after_days: None,
            duplicate_detection: true,
            poll_interval_ms: 1000,
            clipboard_timeout_secs: 5,
            maintenance_interval_secs: 3600,
            data_dir: None,
        }
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "clipmem", "clipmem")
}

impl Settings {
    /// Default settings file location
    pub fn default_path() -> Result<PathBuf> {
        project_dirs()
            .map(|dirs| dirs.config_dir().join(SETTINGS_FILE_NAME))
            .ok_or(SettingsError::NoPlatformDirs)
    }

    /// Load settings from `path` (or the default location), apply environment
    /// overrides and clamp. A missing file yields defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::default_path()?,
        };

        let settings = if path.exists() {
            tracing::info!(path = %path.display(), "Loading settings");
            Self::from_json(&std::fs::read_to_string(&path)?)?
        } else {
            tracing::debug!(path = %path.display(), "No settings file, using defaults");
            Self::default()
        };

        Ok(settings.with_env_overrides().sanitized())
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Write settings as pretty JSON, creating parent directories
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        tracing::info!(path = %path.display(), "Saved settings");
        Ok(())
    }

    /// Apply `CLIPMEM_*` environment variables
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary lookup; unparsable values are ignored
    pub fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        fn parsed<T: std::str::FromStr>(value: Option<String>, key: &str) -> Option<T> {
            let raw = value?;
            match raw.trim().parse() {
                Ok(v) => Some(v),
                Err(_) => {
                    tracing::warn!(key, value = %raw, "Ignoring unparsable setting override");
                    None
                }
            }
        }

        if let Some(v) = parsed(lookup("CLIPMEM_MAX_SIZE"), "CLIPMEM_MAX_SIZE") {
            self.max_size = v;
        }
        if let Some(v) = parsed::<u32>(lookup("CLIPMEM_AUTO_DELETE_DAYS"), "CLIPMEM_AUTO_DELETE_DAYS") {
            self.auto_delete_after_days = Some(v);
        }
        if let Some(v) = parsed(lookup("CLIPMEM_DUPLICATE_DETECTION"), "CLIPMEM_DUPLICATE_DETECTION") {
            self.duplicate_detection = v;
        }
        if let Some(v) = parsed(lookup("CLIPMEM_POLL_INTERVAL_MS"), "CLIPMEM_POLL_INTERVAL_MS") {
            self.poll_interval_ms = v;
        }
        if let Some(v) = parsed(lookup("CLIPMEM_CLIPBOARD_TIMEOUT_SECS"), "CLIPMEM_CLIPBOARD_TIMEOUT_SECS") {
            self.clipboard_timeout_secs = v;
        }
        if let Some(v) = parsed(
            lookup("CLIPMEM_MAINTENANCE_INTERVAL_SECS"),
            "CLIPMEM_MAINTENANCE_INTERVAL_SECS",
        ) {
            self.maintenance_interval_secs = v;
        }
        if let Some(dir) = lookup("CLIPMEM_DATA_DIR").filter(|d| !d.trim().is_empty()) {
            self.data_dir = Some(PathBuf::from(dir));
        }
        self
    }

    /// Clamp every value into its valid range
    pub fn sanitized(mut self) -> Self {
        self.max_size = self.max_size.clamp(1, 100_000);
        self.poll_interval_ms = self.poll_interval_ms.clamp(100, 60_000);
        self.clipboard_timeout_secs = self.clipboard_timeout_secs.clamp(1, 300);
        self.maintenance_interval_secs = self.maintenance_interval_secs.clamp(60, 7 * 24 * 3600);
        if self.auto_delete_after_days == Some(0) {
            self.auto_delete_after_days = None;
        }
        self
    }

    /// Directory holding the database
    pub fn resolved_data_dir(&self) -> Result<PathBuf> {
        match &self.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => project_dirs()
                .map(|dirs| dirs.data_dir().to_path_buf())
                .ok_or(SettingsError::NoPlatformDirs),
        }
    }

    /// SQLite database path
    pub fn db_path(&self) -> Result<PathBuf> {
        Ok(self.resolved_data_dir()?.join(DB_FILE_NAME))
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn clipboard_timeout(&self) -> Duration {
        Duration::from_secs(self.clipboard_timeout_secs)
    }

    pub fn maintenance_interval(&self) -> Duration {
        Duration::from_secs(self.maintenance_interval_secs)
    }

    /// Store configuration derived from these settings
    pub fn history_config(&self) -> HistoryConfig {
        HistoryConfig {
            max_size: self.max_size,
            auto_delete_after_days: self.auto_delete_after_days,
            duplicate_detection: self.duplicate_detection,
        }
    }
}
