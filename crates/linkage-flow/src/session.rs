//! Bearer session gate.
//!
//! Every linking operation asks the session for its bearer token first, so
//! an expired or missing credential fails before reconciliation or any store
//! call.

use chrono::{DateTime, Utc};
use linkage_config::AuthConfig;
use linkage_core::identity::AuthIdentity;

use crate::error::FlowError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    identity: AuthIdentity,
    token: String,
    expires_at: Option<DateTime<Utc>>,
}

impl Session {
    pub fn new(
        identity: AuthIdentity,
        token: impl Into<String>,
        expires_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            identity,
            token: token.into(),
            expires_at,
        }
    }

    /// Session from the `[auth]` config section. Config tokens do not expire.
    ///
    /// # Errors
    ///
    /// `Unauthenticated` when `user_id` or `token` is missing.
    pub fn from_config(auth: &AuthConfig) -> Result<Self, FlowError> {
        if !auth.is_configured() {
            return Err(FlowError::Unauthenticated(
                "auth.user_id and auth.token must be set".into(),
            ));
        }
        let identity = AuthIdentity {
            user_id: auth.user_id.clone(),
            org_id: (!auth.org_id.is_empty()).then(|| auth.org_id.clone()),
            clearance_level: auth.clearance_level,
        };
        Ok(Self::new(identity, auth.token.clone(), None))
    }

    #[must_use]
    pub const fn identity(&self) -> &AuthIdentity {
        &self.identity
    }

    #[must_use]
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        !self.token.trim().is_empty() && self.expires_at.is_none_or(|exp| now < exp)
    }

    /// # Errors
    ///
    /// `Unauthenticated` for an empty or expired token.
    pub fn bearer_at(&self, now: DateTime<Utc>) -> Result<&str, FlowError> {
        if self.token.trim().is_empty() {
            return Err(FlowError::Unauthenticated("no bearer token".into()));
        }
        if let Some(exp) = self.expires_at
            && now >= exp
        {
            return Err(FlowError::Unauthenticated(format!(
                "session expired at {}",
                exp.to_rfc3339()
            )));
        }
        Ok(&self.token)
    }

    /// # Errors
    ///
    /// See [`Self::bearer_at`].
    pub fn bearer(&self) -> Result<&str, FlowError> {
        self.bearer_at(Utc::now())
    }
}
