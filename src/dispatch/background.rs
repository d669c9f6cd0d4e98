//! Bounded runner for fire-and-forget side effects.
//!
//! Each side effect runs on its own tokio task, holding one semaphore permit
//! for its lifetime and bounded by a timeout. When every permit is taken the
//! side effect is dropped with a warning instead of queueing, so a hung
//! downstream service cannot pile up unbounded work.

use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct Background {
    permits: Arc<Semaphore>,
    max_in_flight: usize,
    timeout: Duration,
}

impl Background {
    pub fn new(max_in_flight: usize, timeout: Duration) -> Self {
        let max_in_flight = max_in_flight
            .clamp(1, u32::MAX as usize)
            .min(Semaphore::MAX_PERMITS);
        Self {
            permits: Arc::new(Semaphore::new(max_in_flight)),
            max_in_flight,
            timeout,
        }
    }

    /// Spawns `task` without waiting for it. Returns false if the side effect
    /// was dropped because the runner is saturated.
    pub fn spawn<F, E>(&self, label: &'static str, task: F) -> bool
    where
        F: Future<Output = Result<(), E>> + Send + 'static,
        E: Display + Send + 'static,
    {
        let permit = match self.permits.clone().try_acquire_owned() {
            Ok(permit) => permit,
            Err(_) => {
                warn!(
                    task = label,
                    max_in_flight = self.max_in_flight,
                    "background runner saturated, dropping side effect"
                );
                return false;
            }
        };

        let timeout = self.timeout;
        tokio::spawn(async move {
            let _permit = permit;
            match tokio::time::timeout(timeout, task).await {
                Ok(Ok(())) => debug!(task = label, "side effect completed"),
                Ok(Err(e)) => warn!(task = label, error = %e, "side effect failed"),
                Err(_) => warn!(
                    task = label,
                    timeout_ms = timeout.as_millis() as u64,
                    "side effect timed out"
                ),
            }
        });
        true
    }

    pub fn in_flight(&self) -> usize {
        self.max_in_flight - self.permits.available_permits()
    }

    /// Waits until every spawned side effect has finished.
    pub async fn drain(&self) {
        if let Ok(all) = self.permits.acquire_many(self.max_in_flight as u32).await {
            drop(all);
        }
    }
}
