//! Pending reminders.
//!
//! Each reminder is a tokio task that sleeps, then delivers. The tasks are
//! tracked by [ReminderId] so they can be cancelled, and nothing outlives the
//! process.

use std::collections::HashMap;
use std::fmt::Display;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::AbortHandle;

/// Identifies a scheduled reminder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReminderId(u64);

impl Display for ReminderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Table of reminders waiting to fire.
/// Internally uses an [Arc], so it's cheap to clone.
#[derive(Debug, Default, Clone)]
pub struct Reminders {
    inner: Arc<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    next_id: AtomicU64,
    pending: Mutex<HashMap<ReminderId, AbortHandle>>,
}

impl Reminders {
    /// Run `delivery` after `delay` without blocking the caller.
    pub async fn schedule<F>(&self, delay: Duration, delivery: F) -> ReminderId
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let id = ReminderId(self.inner.next_id.fetch_add(1, Ordering::Relaxed) + 1);

        // Hold the table while spawning so the task can't finish before it's registered.
        let mut pending = self.inner.pending.lock().await;
        let inner = self.inner.clone();
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            inner.pending.lock().await.remove(&id);
            tracing::debug!("Delivering reminder {id}.");
            delivery.await;
        });
        pending.insert(id, task.abort_handle());

        tracing::debug!("Scheduled reminder {id} in {delay:?}.");
        id
    }

    /// Stop a reminder before it fires. Returns `false` if it already fired or never existed.
    pub async fn cancel(&self, id: ReminderId) -> bool {
        match self.inner.pending.lock().await.remove(&id) {
            Some(task) => {
                task.abort();
                tracing::debug!("Cancelled reminder {id}.");
                true
            }
            None => false,
        }
    }

    /// Number of reminders that haven't fired yet.
    pub async fn pending(&self) -> usize {
        self.inner.pending.lock().await.len()
    }

    /// Abort every pending reminder. Returns how many were dropped.
    pub async fn shutdown(&self) -> usize {
        let mut pending = self.inner.pending.lock().await;
        let dropped = pending.len();
        for (_, task) in pending.drain() {
            task.abort();
        }
        dropped
    }
}
