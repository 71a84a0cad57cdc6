//! Gate for user-initiated suggestion retries.
//!
//! After the suggestion service reports itself unavailable, retries are
//! allowed only once `retry_after` has elapsed and only up to a fixed count.
//! A successful call resets the gate.

use std::time::{Duration, Instant};

use crate::error::FlowError;

#[derive(Debug, Clone)]
pub struct RetryGate {
    max_retries: u32,
    retries: u32,
    not_before: Option<Instant>,
    unavailable: bool,
}

impl RetryGate {
    #[must_use]
    pub const fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            retries: 0,
            not_before: None,
            unavailable: false,
        }
    }

    #[must_use]
    pub const fn retries(&self) -> u32 {
        self.retries
    }

    #[must_use]
    pub const fn remaining(&self) -> u32 {
        self.max_retries.saturating_sub(self.retries)
    }

    /// Check whether a request may go out now and count it as a retry if the
    /// service was last seen unavailable.
    ///
    /// # Errors
    ///
    /// `RetryBlocked` while `retry_after` has not elapsed or once the retry
    /// budget is spent.
    pub fn try_begin(&mut self, now: Instant) -> Result<(), FlowError> {
        if !self.unavailable {
            return Ok(());
        }
        if self.retries >= self.max_retries {
            return Err(FlowError::RetryBlocked(format!(
                "retry limit of {} reached, search manually instead",
                self.max_retries
            )));
        }
        if let Some(at) = self.not_before
            && now < at
        {
            let wait = at.duration_since(now).as_secs().max(1);
            return Err(FlowError::RetryBlocked(format!("retry in {wait}s")));
        }
        self.retries += 1;
        Ok(())
    }

    /// Record an unavailable answer.
    pub fn record_unavailable(&mut self, retry_after: Option<u64>, now: Instant) {
        self.unavailable = true;
        self.not_before = retry_after.map(|secs| now + Duration::from_secs(secs));
    }

    pub const fn record_success(&mut self) {
        self.retries = 0;
        self.not_before = None;
        self.unavailable = false;
    }
}
