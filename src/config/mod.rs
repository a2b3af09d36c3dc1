pub mod settings;
pub mod user;

pub use settings::{DEFAULT_CAPACITY, QuerySource, TreeCacheSettings};
pub use user::user_config_path;

use std::path::Path;

use crate::error::{TreeCacheError, TreeCacheResult};

/// File name of the project configuration
pub const CONFIG_FILE_NAME: &str = "tree-cache.toml";

/// Merge two TreeCacheSettings, preferring values from `primary` over `fallback`
pub fn merge_settings(
    fallback: Option<TreeCacheSettings>,
    primary: Option<TreeCacheSettings>,
) -> Option<TreeCacheSettings> {
    match (fallback, primary) {
        (None, None) => None,
        (Some(settings), None) => Some(settings),
        (None, Some(settings)) => Some(settings),
        (Some(fallback), Some(primary)) => Some(TreeCacheSettings {
            capacity: primary.capacity.or(fallback.capacity),
            declarations: primary.declarations.or(fallback.declarations),
        }),
    }
}

/// Load settings from a TOML file
pub fn load_settings(path: &Path) -> TreeCacheResult<TreeCacheSettings> {
    let contents = std::fs::read_to_string(path)?;
    toml::from_str(&contents).map_err(|e| {
        TreeCacheError::config(format!("Failed to parse {}: {}", path.display(), e))
    })
}

/// Load settings from a TOML file if it exists
pub fn load_optional_settings(path: &Path) -> TreeCacheResult<Option<TreeCacheSettings>> {
    if !path.exists() {
        return Ok(None);
    }
    load_settings(path).map(Some)
}

/// Parse settings passed as JSON (e.g. initialization options)
pub fn settings_from_json(value: serde_json::Value) -> TreeCacheResult<TreeCacheSettings> {
    serde_json::from_value(value)
        .map_err(|e| TreeCacheError::config(format!("Invalid settings: {}", e)))
}
