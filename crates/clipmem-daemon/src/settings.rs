//! Settings resolution for the binaries
//!
//! Precedence, lowest first: defaults, settings file, `CLIPMEM_*`
//! environment, command-line flags.

use std::path::PathBuf;

use clipmem_core::Settings;

/// Load settings from `config` (or the platform default) and apply a
/// `--data-dir` override
pub fn resolve(config: Option<PathBuf>, data_dir: Option<PathBuf>) -> anyhow::Result<Settings> {
    let mut settings = Settings::load(config.as_deref())?;
    if let Some(dir) = data_dir {
        settings.data_dir = Some(dir);
    }
    Ok(settings.sanitized())
}
