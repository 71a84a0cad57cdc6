//! Per-intake mutation queue.
//!
//! Mutations on one intake run one after another; different intakes proceed
//! independently. Waiters are served in FIFO order by `tokio::sync::Mutex`.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};

#[derive(Debug, Default)]
pub struct IntakeQueue {
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl IntakeQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for the intake's turn. The slot is released when the guard drops.
    pub async fn acquire(&self, intake_id: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            Arc::clone(locks.entry(intake_id.to_string()).or_default())
        };
        lock.lock_owned().await
    }

    /// Drop locks nobody holds or waits on. Returns how many were removed.
    pub async fn prune(&self) -> usize {
        let mut locks = self.locks.lock().await;
        let before = locks.len();
        locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        before - locks.len()
    }

    pub async fn len(&self) -> usize {
        self.locks.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.locks.lock().await.is_empty()
    }
}
