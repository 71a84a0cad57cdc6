use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Lightweight authenticated user identity for cross-crate passing.
///
/// Produced by whatever session provider fronts the application; consumed by
/// `linkage-flow` (session gate) and `linkage-db` (provenance columns).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct AuthIdentity {
    /// User id recorded as `created_by` / `deleted_by`.
    pub user_id: String,
    /// Organization the user belongs to. `None` = no organization scope.
    pub org_id: Option<String>,
    /// Session clearance level. 0 when the provider supplies none.
    #[serde(default)]
    pub clearance_level: u8,
}
