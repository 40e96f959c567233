use serde::{Deserialize, Serialize};
use std::path::PathBuf;
pub use cricket_common::config::MatchRules;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    /// Where match documents are kept, default is platform dependent
    pub data_dir: Option<PathBuf>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MirrorSettings {
    pub enabled: bool,
    pub url: String,
    pub timeout_ms: u64,
    pub queue_len: usize,
    pub proxy: Option<String>,
}

impl Default for MirrorSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            url: "https://scorebox-live.firebaseio.com".to_string(),
            timeout_ms: 5000,
            queue_len: 16,
            proxy: None,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub store: StoreSettings,
    pub mirror: MirrorSettings,
    pub defaults: MatchRules,
}
