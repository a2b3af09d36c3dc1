//! User configuration location for tree-cache.
//!
//! User config location: $XDG_CONFIG_HOME/tree-cache/tree-cache.toml
//! Fallback: the platform config directory (e.g. ~/.config/tree-cache/tree-cache.toml)

use std::path::{Path, PathBuf};

use super::CONFIG_FILE_NAME;

const APP_DIR: &str = "tree-cache";

/// Returns the path to the user configuration file.
///
/// Returns None if no config directory can be determined.
pub fn user_config_path() -> Option<PathBuf> {
    let xdg_config = std::env::var_os("XDG_CONFIG_HOME").map(PathBuf::from);
    config_path_in(xdg_config.or_else(dirs::config_dir)?.as_path())
}

fn config_path_in(config_dir: &Path) -> Option<PathBuf> {
    if config_dir.as_os_str().is_empty() {
        return None;
    }
    Some(config_dir.join(APP_DIR).join(CONFIG_FILE_NAME))
}
