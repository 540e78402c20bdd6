//! FIFO request scheduler with minimum spacing and retry
//!
//! Every outbound request to the bibliographic API goes through one owned
//! `RequestScheduler`. Callers queue on a fair mutex, so requests are
//! dispatched in arrival order and never closer together than
//! `min_interval`. Transient failures are retried with doubling backoff.

use crate::errors::{AppError, Result};
use crate::metrics;
use backoff::backoff::Backoff;
use backoff::{ExponentialBackoff, ExponentialBackoffBuilder};
use std::future::Future;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};
use tracing::{debug, warn};

/// Scheduler settings
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Minimum time between two dispatched requests
    pub min_interval: Duration,
    /// Retries after the first failed attempt
    pub max_retries: u32,
    /// Delay before the first retry; doubles on each further retry
    pub backoff_base: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            min_interval: Duration::from_millis(1100),
            max_retries: 3,
            backoff_base: Duration::from_millis(1000),
        }
    }
}

impl From<&crate::config::RetrievalConfig> for SchedulerConfig {
    fn from(config: &crate::config::RetrievalConfig) -> Self {
        Self {
            min_interval: config.min_interval(),
            max_retries: config.max_retries,
            backoff_base: config.backoff_base(),
        }
    }
}

/// Serializes upstream requests
pub struct RequestScheduler {
    config: SchedulerConfig,
    /// Dispatch time of the last request; the lock itself is the FIFO queue
    last_dispatch: Mutex<Option<Instant>>,
}

impl RequestScheduler {
    pub fn new(config: SchedulerConfig) -> Self {
        Self {
            config,
            last_dispatch: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Wait for this caller's turn and mark a dispatch.
    ///
    /// Tokio's mutex is fair, so waiters are admitted in the order they
    /// called `acquire`. The lock is held while sleeping, which keeps later
    /// callers queued behind the current one.
    pub async fn acquire(&self) {
        let mut last = self.last_dispatch.lock().await;

        if let Some(previous) = *last {
            let ready_at = previous + self.config.min_interval;
            let now = Instant::now();
            if ready_at > now {
                let wait = ready_at - now;
                debug!(wait_ms = wait.as_millis() as u64, "Waiting for request slot");
                sleep(wait).await;
            }
        }

        *last = Some(Instant::now());
    }

    /// Run `op` through the queue, retrying transient failures.
    ///
    /// Each attempt (including retries) takes its own slot in the queue.
    /// After `max_retries` retries the last error is returned.
    pub async fn execute<T, F, Fut>(&self, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut delays = self.backoff();
        let mut attempt: u32 = 0;

        loop {
            self.acquire().await;

            match op().await {
                Ok(value) => {
                    metrics::record_retrieval(true, attempt > 0);
                    return Ok(value);
                }
                Err(e) if e.is_retryable() && attempt < self.config.max_retries => {
                    metrics::record_retrieval(false, true);
                    let delay = delays.next_backoff().unwrap_or(self.config.backoff_base);
                    attempt += 1;
                    warn!(
                        attempt,
                        max_retries = self.config.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Retrieval request failed, retrying"
                    );
                    sleep(delay).await;
                }
                Err(e) => {
                    metrics::record_retrieval(false, false);
                    return Err(e);
                }
            }
        }
    }

    /// Deterministic doubling schedule: base, 2*base, 4*base, ...
    fn backoff(&self) -> ExponentialBackoff {
        ExponentialBackoffBuilder::new()
            .with_initial_interval(self.config.backoff_base)
            .with_multiplier(2.0)
            .with_randomization_factor(0.0)
            .with_max_interval(self.config.backoff_base * 64)
            .with_max_elapsed_time(None)
            .build()
    }
}

impl Default for RequestScheduler {
    fn default() -> Self {
        Self::new(SchedulerConfig::default())
    }
}

/// Map a non-success HTTP status into a typed error
pub fn status_error(status: u16, body: String) -> AppError {
    AppError::Upstream {
        status,
        message: body,
    }
}
