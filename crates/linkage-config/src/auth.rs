//! Credentials used for the suggestion API and as the acting identity.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AuthConfig {
    /// Recorded as `created_by` / `deleted_by` and in the audit trail.
    #[serde(default)]
    pub user_id: String,

    #[serde(default)]
    pub org_id: String,

    /// Bearer token sent to the suggestion API.
    #[serde(default)]
    pub token: String,

    #[serde(default)]
    pub clearance_level: u8,
}

impl AuthConfig {
    #[must_use]
    pub fn is_configured(&self) -> bool {
        !self.user_id.is_empty() && !self.token.is_empty()
    }
}
