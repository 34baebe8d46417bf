use serde::{Deserialize, Serialize};

/// Configuration from config.toml in the data directory
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub sync: SyncConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Local cache file name, relative to the data directory
    #[serde(default = "default_cache_file")]
    pub cache_file: String,
    /// Writes larger than this fail as quota exceeded
    #[serde(default = "default_capacity_kb")]
    pub capacity_kb: u64,
    /// Usage above this is reported as a warning after each save
    #[serde(default = "default_warn_kb")]
    pub warn_kb: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig {
            cache_file: default_cache_file(),
            capacity_kb: default_capacity_kb(),
            warn_kb: default_warn_kb(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Remote write coalescing window
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    /// Directory serving as the per-user remote document store.
    /// Remote sync is disabled when unset.
    #[serde(default)]
    pub remote_dir: Option<String>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        SyncConfig {
            debounce_ms: default_debounce_ms(),
            remote_dir: None,
        }
    }
}

fn default_cache_file() -> String {
    "dashboard.json".to_string()
}

fn default_capacity_kb() -> u64 {
    5120
}

fn default_warn_kb() -> u64 {
    4096
}

fn default_debounce_ms() -> u64 {
    500
}
