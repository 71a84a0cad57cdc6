//! Business rules applied when links are created or edited.

use linkage_core::enums::{EntityType, RestorePlacement};
use serde::{Deserialize, Serialize};

use crate::ConfigError;

fn default_primary_eligible() -> Vec<EntityType> {
    vec![EntityType::Dossier, EntityType::Position]
}

const fn default_max_batch_size() -> u32 {
    50
}

const fn default_max_notes_len() -> usize {
    1000
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LinkRulesConfig {
    /// Entity types that may be auto-promoted to primary when the selection
    /// carries no explicit primary flag.
    #[serde(default = "default_primary_eligible")]
    pub primary_eligible: Vec<EntityType>,

    /// Upper bound on links in one batch create.
    #[serde(default = "default_max_batch_size")]
    pub max_batch_size: u32,

    /// Maximum notes length, in characters.
    #[serde(default = "default_max_notes_len")]
    pub max_notes_len: usize,

    #[serde(default)]
    pub restore_placement: RestorePlacement,
}

impl Default for LinkRulesConfig {
    fn default() -> Self {
        Self {
            primary_eligible: default_primary_eligible(),
            max_batch_size: default_max_batch_size(),
            max_notes_len: default_max_notes_len(),
            restore_placement: RestorePlacement::default(),
        }
    }
}

impl LinkRulesConfig {
    /// Reject settings that would make every create fail.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` naming the offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_batch_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "links.max_batch_size".into(),
                reason: "must be at least 1".into(),
            });
        }
        if self.max_notes_len == 0 {
            return Err(ConfigError::InvalidValue {
                field: "links.max_notes_len".into(),
                reason: "must be at least 1".into(),
            });
        }
        Ok(())
    }
}
