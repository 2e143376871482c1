//! User configuration loading for mosaic-ls.
//!
//! User config location: $XDG_CONFIG_HOME/mosaic-ls/mosaic-ls.toml
//! Fallback: the platform config directory (e.g. ~/.config/mosaic-ls/mosaic-ls.toml)

use std::path::{Path, PathBuf};

use log::debug;

use super::MosaicSettings;
use crate::error::{ConfigError, ConfigResult};

const APP_DIR: &str = "mosaic-ls";
const FILE_NAME: &str = "mosaic-ls.toml";

/// Returns the path to the user configuration file.
///
/// The path is determined by:
/// 1. If $XDG_CONFIG_HOME is set: $XDG_CONFIG_HOME/mosaic-ls/mosaic-ls.toml
/// 2. Otherwise: `dirs::config_dir()`/mosaic-ls/mosaic-ls.toml
///
/// Returns None if no config directory can be determined.
pub fn user_config_path() -> Option<PathBuf> {
    let base = match std::env::var_os("XDG_CONFIG_HOME") {
        Some(xdg) if !xdg.is_empty() => PathBuf::from(xdg),
        _ => dirs::config_dir()?,
    };
    Some(base.join(APP_DIR).join(FILE_NAME))
}

/// Load settings from an explicit file.
pub fn load_config_file(path: &Path) -> ConfigResult<MosaicSettings> {
    let source = std::fs::read_to_string(path).map_err(|e| ConfigError::read(path, e))?;
    MosaicSettings::from_toml(&source).map_err(|e| ConfigError::parse(path, e))
}

/// Load the user configuration file.
///
/// A missing file is not an error: `Ok(None)` is returned.
pub fn load_user_config() -> ConfigResult<Option<MosaicSettings>> {
    let Some(path) = user_config_path() else {
        return Ok(None);
    };
    if !path.exists() {
        debug!(target: "mosaic::config", "no user config at {}", path.display());
        return Ok(None);
    }
    load_config_file(&path).map(Some)
}
