//! Link-type and payload rules shared by the engine and the store.

use linkage_config::LinkRulesConfig;
use linkage_core::enums::{EntityType, LinkType, RestorePlacement};

use crate::error::EngineError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkRules {
    pub primary_eligible: Vec<EntityType>,
    pub max_batch_size: usize,
    pub max_notes_len: usize,
    pub restore_placement: RestorePlacement,
}

impl Default for LinkRules {
    fn default() -> Self {
        Self::from(&LinkRulesConfig::default())
    }
}

impl From<&LinkRulesConfig> for LinkRules {
    fn from(config: &LinkRulesConfig) -> Self {
        Self {
            primary_eligible: config.primary_eligible.clone(),
            max_batch_size: usize::try_from(config.max_batch_size).unwrap_or(usize::MAX),
            max_notes_len: config.max_notes_len,
            restore_placement: config.restore_placement,
        }
    }
}

impl LinkRules {
    /// Whether a candidate of this type may be auto-promoted to primary.
    #[must_use]
    pub fn is_primary_eligible(&self, entity_type: EntityType) -> bool {
        self.primary_eligible.contains(&entity_type)
    }

    /// # Errors
    ///
    /// `Validation` when `link_type` is restricted to other entity types.
    pub fn check_link_type(
        &self,
        link_type: LinkType,
        entity_type: EntityType,
    ) -> Result<(), EngineError> {
        if link_type.allows(entity_type) {
            Ok(())
        } else {
            Err(EngineError::Validation(format!(
                "link type '{link_type}' is not allowed for entity type '{entity_type}'"
            )))
        }
    }

    /// # Errors
    ///
    /// `Validation` when the notes exceed `max_notes_len` characters.
    pub fn check_notes(&self, notes: Option<&str>) -> Result<(), EngineError> {
        match notes {
            Some(text) if text.chars().count() > self.max_notes_len => {
                Err(EngineError::Validation(format!(
                    "notes exceed {} characters",
                    self.max_notes_len
                )))
            }
            _ => Ok(()),
        }
    }

    /// # Errors
    ///
    /// `Validation` when `len` is zero or above `max_batch_size`.
    pub fn check_batch_len(&self, len: usize) -> Result<(), EngineError> {
        if len == 0 {
            return Err(EngineError::Validation("batch must contain at least one link".into()));
        }
        if len > self.max_batch_size {
            return Err(EngineError::Validation(format!(
                "batch of {len} links exceeds the limit of {}",
                self.max_batch_size
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn defaults_follow_config_defaults() {
        let rules = LinkRules::default();
        assert!(rules.is_primary_eligible(EntityType::Dossier));
        assert!(rules.is_primary_eligible(EntityType::Position));
        assert!(!rules.is_primary_eligible(EntityType::Country));
        assert_eq!(rules.max_batch_size, 50);
    }

    #[rstest]
    #[case(LinkType::Requested, EntityType::Position, true)]
    #[case(LinkType::Requested, EntityType::Dossier, false)]
    #[case(LinkType::AssignedTo, EntityType::Assignment, true)]
    #[case(LinkType::AssignedTo, EntityType::Topic, false)]
    #[case(LinkType::Mentioned, EntityType::Forum, true)]
    fn link_type_restrictions(
        #[case] link_type: LinkType,
        #[case] entity_type: EntityType,
        #[case] ok: bool,
    ) {
        assert_eq!(
            LinkRules::default().check_link_type(link_type, entity_type).is_ok(),
            ok
        );
    }

    #[test]
    fn notes_limit_counts_characters() {
        let rules = LinkRules {
            max_notes_len: 3,
            ..LinkRules::default()
        };
        assert!(rules.check_notes(Some("äöü")).is_ok());
        assert!(rules.check_notes(Some("abcd")).is_err());
        assert!(rules.check_notes(None).is_ok());
    }

    #[test]
    fn batch_bounds() {
        let rules = LinkRules::default();
        assert!(rules.check_batch_len(0).is_err());
        assert!(rules.check_batch_len(50).is_ok());
        assert!(rules.check_batch_len(51).is_err());
    }
}
