//! Centralized path configuration for Herogate.
//!
//! All on-disk client state goes through this module.

use std::path::PathBuf;

/// Get the Herogate configuration directory.
///
/// Resolution order:
/// 1. `HEROGATE_CONFIG_DIR` environment variable
/// 2. `~/.herogate`
/// 3. `.herogate` in the working directory when no home directory is known
pub fn config_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("HEROGATE_CONFIG_DIR") {
        return PathBuf::from(dir);
    }

    dirs::home_dir().map(|h| h.join(".herogate")).unwrap_or_else(|| PathBuf::from(".herogate"))
}

/// Get the configuration file path.
pub fn config_path() -> PathBuf {
    config_dir().join("config.json")
}

/// Get the directory holding blueprint bodies.
pub fn blueprints_dir() -> PathBuf {
    config_dir().join("blueprints")
}

/// Get the blueprint body path for a blueprint version.
pub fn blueprint_path(version: &str) -> PathBuf {
    blueprints_dir().join(format!("platform-{}.yaml", version))
}
