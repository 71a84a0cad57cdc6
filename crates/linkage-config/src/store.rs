//! Link store location settings.

use serde::{Deserialize, Serialize};

fn default_db_path() -> String {
    ".linkage/links.db".to_string()
}

fn default_trail_dir() -> String {
    ".linkage/trail".to_string()
}

const fn default_trail_enabled() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StoreConfig {
    /// libSQL database file. `:memory:` keeps everything in process.
    #[serde(default = "default_db_path")]
    pub db_path: String,

    /// Directory receiving one `<intake>.jsonl` trail file per intake.
    #[serde(default = "default_trail_dir")]
    pub trail_dir: String,

    #[serde(default = "default_trail_enabled")]
    pub trail_enabled: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            trail_dir: default_trail_dir(),
            trail_enabled: default_trail_enabled(),
        }
    }
}

impl StoreConfig {
    #[must_use]
    pub fn is_in_memory(&self) -> bool {
        self.db_path == ":memory:"
    }
}
