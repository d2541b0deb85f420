use serde::{Deserialize, Serialize};

/// Configuration from board.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BoardConfig {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub sync: SyncConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Root URL of the remote document store
    #[serde(default)]
    pub base_url: String,
    /// Appended to every resolved path (selects the JSON serialization)
    #[serde(default = "default_suffix")]
    pub suffix: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            base_url: String::new(),
            suffix: default_suffix(),
        }
    }
}

fn default_suffix() -> String {
    ".json".to_string()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Session cache directory. None = $XDG_CACHE_HOME/taskboard
    #[serde(default)]
    pub dir: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Also push renumbered sibling `order` values after a drop.
    /// Off by default: only the dragged task's `{status, order}` goes remote.
    #[serde(default)]
    pub propagate_lane_order: bool,
}
