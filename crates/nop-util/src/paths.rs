//! Default paths for nop-provider components
//!
//! Paths are user-writable by default (no root required):
//! - Config: `$XDG_CONFIG_HOME/nopd/config.toml` or `~/.config/nopd/config.toml`
//! - Data: `$XDG_DATA_HOME/nopd` or `~/.local/share/nopd`

use std::path::PathBuf;

/// Environment variable for overriding the data directory
pub const NOPD_DATA_DIR_ENV: &str = "NOPD_DATA_DIR";

/// Application subdirectory name
const APP_DIR: &str = "nopd";

/// Config filename within the config directory
const CONFIG_FILENAME: &str = "config.toml";

/// Get the default config file path.
///
/// Order of precedence:
/// 1. `$XDG_CONFIG_HOME/nopd/config.toml` (if XDG_CONFIG_HOME is set)
/// 2. `~/.config/nopd/config.toml` (fallback)
pub fn default_config_path() -> PathBuf {
    if let Ok(config_home) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(config_home).join(APP_DIR).join(CONFIG_FILENAME);
    }

    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home)
            .join(".config")
            .join(APP_DIR)
            .join(CONFIG_FILENAME);
    }

    PathBuf::from("/etc").join(APP_DIR).join(CONFIG_FILENAME)
}

/// Get the default data directory.
///
/// Order of precedence:
/// 1. `$NOPD_DATA_DIR` environment variable (if set)
/// 2. `$XDG_DATA_HOME/nopd` (if XDG_DATA_HOME is set)
/// 3. `~/.local/share/nopd` (fallback)
pub fn default_data_dir() -> PathBuf {
    if let Ok(path) = std::env::var(NOPD_DATA_DIR_ENV) {
        return PathBuf::from(path);
    }

    data_dir_without_env()
}

/// Get the data directory without checking NOPD_DATA_DIR env var.
/// Used for default values in configs where the env var is checked separately.
pub fn data_dir_without_env() -> PathBuf {
    if let Ok(data_home) = std::env::var("XDG_DATA_HOME") {
        return PathBuf::from(data_home).join(APP_DIR);
    }

    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home)
            .join(".local")
            .join("share")
            .join(APP_DIR);
    }

    // Last resort
    PathBuf::from("/tmp").join(APP_DIR).join("data")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_path_ends_with_config_toml() {
        let path = default_config_path();
        assert!(path.ends_with("nopd/config.toml"));
    }

    #[test]
    fn data_dir_contains_nopd() {
        let path = data_dir_without_env();
        assert!(path.to_string_lossy().contains("nopd"));
    }
}
