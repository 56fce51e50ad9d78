//! Sliding-window rate limiter for calls against a shared remote endpoint.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use tokio::time::{sleep, Instant};
use tracing::{debug, info};

use crate::{prelude::*, telemetry::MetricsRecorder, Error};

/// Statistics returned by one pass through [`SlidingWindowLimiter::admit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdmissionReport {
    /// Total time this admission spent waiting for window capacity
    pub waited: Duration,
    /// Calls left in the current window after this admission
    pub remaining_calls: usize,
    /// Recorded admissions currently inside the window
    pub queue_size: usize,
}

/// Rate limiter admitting at most `max_calls` within any trailing `time_window`.
///
/// Admission timestamps are appended in non-decreasing order under the lock,
/// so the front of the queue is always the oldest live entry and the wait
/// time can be computed from it alone.
pub struct SlidingWindowLimiter {
    max_calls: usize,
    time_window: Duration,
    calls: Mutex<VecDeque<Instant>>,
    metrics: MetricsRecorder,
}

impl std::fmt::Debug for SlidingWindowLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlidingWindowLimiter")
            .field("max_calls", &self.max_calls)
            .field("time_window", &self.time_window)
            .field("metrics", &self.metrics.is_some())
            .finish()
    }
}

impl SlidingWindowLimiter {
    /// Create a limiter. Both parameters must be positive.
    pub fn new(max_calls: usize, time_window: Duration) -> Result<Self> {
        if max_calls == 0 {
            return Err(Error::Config("max_calls must be positive".to_string()));
        }
        if time_window.is_zero() {
            return Err(Error::Config("time_window must be positive".to_string()));
        }
        Ok(Self {
            max_calls,
            time_window,
            calls: Mutex::new(VecDeque::new()),
            metrics: None,
        })
    }

    /// Attach a metrics recorder that observes admission waits.
    pub fn with_metrics(mut self, metrics: MetricsRecorder) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn max_calls(&self) -> usize {
        self.max_calls
    }

    pub fn time_window(&self) -> Duration {
        self.time_window
    }

    /// Admit one call, suspending the task until it fits in the window.
    ///
    /// Expired timestamps are purged first; while the window is full the
    /// task sleeps until the oldest entry leaves the window, then re-checks.
    /// The lock is never held across the sleep, so `reset` and concurrent
    /// admissions proceed during a wait.
    pub async fn admit(&self) -> AdmissionReport {
        let mut waited = Duration::ZERO;
        loop {
            let wait = {
                let mut calls = self.calls.lock().unwrap();
                let now = Instant::now();

                // Strictly-older-than comparison; an entry exactly
                // time_window old is handled below.
                while calls
                    .front()
                    .is_some_and(|t| now.duration_since(*t) > self.time_window)
                {
                    calls.pop_front();
                }

                // An entry exactly time_window old no longer constrains
                // admission even though the strict purge keeps it.
                if calls.len() >= self.max_calls
                    && calls
                        .front()
                        .is_some_and(|t| (*t + self.time_window).duration_since(now).is_zero())
                {
                    calls.pop_front();
                }

                debug!(
                    queued = calls.len(),
                    max_calls = self.max_calls,
                    "Checking window occupancy"
                );

                if calls.len() < self.max_calls {
                    calls.push_back(now);
                    let queue_size = calls.len();
                    if !waited.is_zero() {
                        if let Some(metrics) = &self.metrics {
                            metrics.record_admission_wait(waited);
                        }
                    }
                    return AdmissionReport {
                        waited,
                        remaining_calls: self.max_calls - queue_size,
                        queue_size,
                    };
                }

                let Some(oldest) = calls.front().copied() else {
                    continue;
                };
                (oldest + self.time_window).duration_since(now)
            };

            info!(
                wait_secs = wait.as_secs_f64(),
                "Rate limit reached, waiting for window capacity"
            );
            sleep(wait).await;
            waited += wait;
        }
    }

    /// Clear all tracked admissions immediately.
    ///
    /// Future admissions start from an empty window; a wait already in
    /// progress is not interrupted.
    pub fn reset(&self) {
        self.calls.lock().unwrap().clear();
        info!("Rate limiter reset");
    }
}
