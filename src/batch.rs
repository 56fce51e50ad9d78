//! Batch execution of independent queries under a shared concurrency bound.

use std::collections::HashMap;
use std::fmt::Display;
use std::future::Future;

use tokio::task::{Id, JoinSet};
use tracing::{info, warn};

use crate::{gate::ConcurrencyGate, prelude::*, telemetry::MetricsRecorder, Error};

/// Failure record for one batch item.
#[derive(Debug)]
pub struct BatchFailure {
    /// Identity of the originating item (e.g. an account id)
    pub identity: String,
    /// Position of the item in the input collection
    pub index: usize,
    /// What went wrong
    pub error: Error,
}

/// Outcome of one batch item.
///
/// Exactly one outcome is produced per input item, at the item's original
/// index. Callers inspect each entry to tell success from failure; the
/// executor itself never errors on individual items.
#[derive(Debug)]
pub enum BatchOutcome<T> {
    Ok(T),
    Failed(BatchFailure),
}

impl<T> BatchOutcome<T> {
    pub fn is_ok(&self) -> bool {
        matches!(self, BatchOutcome::Ok(_))
    }

    pub fn ok(self) -> Option<T> {
        match self {
            BatchOutcome::Ok(value) => Some(value),
            BatchOutcome::Failed(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&BatchFailure> {
        match self {
            BatchOutcome::Ok(_) => None,
            BatchOutcome::Failed(failure) => Some(failure),
        }
    }
}

/// Drives a collection of independent work items through a concurrency
/// gate, collecting partial successes and per-item failures without
/// aborting the batch.
pub struct BatchExecutor {
    gate: ConcurrencyGate,
    metrics: MetricsRecorder,
}

impl BatchExecutor {
    /// Create an executor running at most `max_concurrency` items at once.
    pub fn new(max_concurrency: usize) -> Result<Self> {
        Ok(Self {
            gate: ConcurrencyGate::new(max_concurrency)?,
            metrics: None,
        })
    }

    /// Attach a metrics recorder that observes per-item failures.
    pub fn with_metrics(mut self, metrics: MetricsRecorder) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn gate(&self) -> &ConcurrencyGate {
        &self.gate
    }

    /// Run `work` over every item concurrently, bounded by the gate.
    ///
    /// All tasks are spawned up front; each acquires a gate token, runs
    /// `work`, and releases the token on every exit path. Output order
    /// equals input order regardless of completion order. A failing or
    /// panicking item is captured at its index and never cancels siblings.
    /// Dropping the returned future aborts the remaining tasks; held
    /// tokens are released as each task unwinds.
    pub async fn run_batch<I, T, F, Fut>(&self, items: Vec<I>, work: F) -> Vec<BatchOutcome<T>>
    where
        I: Display + Send + 'static,
        T: Send + 'static,
        F: Fn(I) -> Fut + Clone + Send + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        let total = items.len();
        let mut tasks = JoinSet::new();
        let mut labels: HashMap<Id, (usize, String)> = HashMap::with_capacity(total);

        for (index, item) in items.into_iter().enumerate() {
            let identity = item.to_string();
            let gate = self.gate.clone();
            let work = work.clone();
            let handle = tasks.spawn(async move {
                let _token = gate.acquire().await?;
                work(item).await
            });
            labels.insert(handle.id(), (index, identity));
        }

        info!(total, "Batch started");

        let mut indexed: Vec<(usize, BatchOutcome<T>)> = Vec::with_capacity(total);
        while let Some(joined) = tasks.join_next_with_id().await {
            let (task_id, result) = match joined {
                Ok((id, result)) => (id, result),
                Err(join_error) => {
                    let id = join_error.id();
                    (id, Err(Error::Task(join_error.to_string())))
                }
            };
            let Some((index, identity)) = labels.remove(&task_id) else {
                continue;
            };
            let outcome = match result {
                Ok(value) => BatchOutcome::Ok(value),
                Err(error) => {
                    warn!(identity = %identity, index, error = %error, "Batch item failed");
                    if let Some(metrics) = &self.metrics {
                        metrics.record_item_failure(&identity);
                    }
                    BatchOutcome::Failed(BatchFailure {
                        identity,
                        index,
                        error,
                    })
                }
            };
            indexed.push((index, outcome));
        }

        indexed.sort_by_key(|(index, _)| *index);
        let failures = indexed.iter().filter(|(_, o)| !o.is_ok()).count();
        info!(total, failures, "Batch finished");

        indexed.into_iter().map(|(_, outcome)| outcome).collect()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use tokio::time::sleep;

    use super::*;

    // =========================================================================
    // Ordering
    // =========================================================================

    #[tokio::test(start_paused = true)]
    async fn test_output_order_matches_input_order() {
        let executor = BatchExecutor::new(16).unwrap();
        let items: Vec<u64> = (0..10).collect();

        // Later items finish first: completion order is the reverse of
        // input order.
        let outcomes = executor
            .run_batch(items, |i| async move {
                sleep(Duration::from_millis(100 * (10 - i))).await;
                Ok(i)
            })
            .await;

        assert_eq!(outcomes.len(), 10);
        for (index, outcome) in outcomes.into_iter().enumerate() {
            assert_eq!(outcome.ok(), Some(index as u64));
        }
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let executor = BatchExecutor::new(4).unwrap();
        let outcomes = executor
            .run_batch(Vec::<u64>::new(), |i| async move { Ok(i) })
            .await;
        assert!(outcomes.is_empty());
    }

    // =========================================================================
    // Failure isolation
    // =========================================================================

    #[tokio::test]
    async fn test_single_failure_does_not_abort_batch() {
        let executor = BatchExecutor::new(4).unwrap();
        let items: Vec<u64> = (0..5).collect();

        let outcomes = executor
            .run_batch(items, |i| async move {
                if i == 2 {
                    Err(Error::GraphQl("NRQL query timed out".to_string()))
                } else {
                    Ok(i * 10)
                }
            })
            .await;

        for (index, outcome) in outcomes.iter().enumerate() {
            if index == 2 {
                let failure = outcome.failure().unwrap();
                assert_eq!(failure.identity, "2");
                assert_eq!(failure.index, 2);
                assert!(matches!(failure.error, Error::GraphQl(_)));
            } else {
                assert!(outcome.is_ok());
            }
        }
    }

    #[tokio::test]
    async fn test_panicking_item_is_isolated() {
        let executor = BatchExecutor::new(4).unwrap();
        let items: Vec<u64> = (0..3).collect();

        let outcomes = executor
            .run_batch(items, |i| async move {
                if i == 1 {
                    panic!("boom");
                }
                Ok(i)
            })
            .await;

        assert!(outcomes[0].is_ok());
        assert!(matches!(
            outcomes[1].failure().unwrap().error,
            Error::Task(_)
        ));
        assert!(outcomes[2].is_ok());
        assert_eq!(executor.gate().available_permits(), 4);
    }

    // =========================================================================
    // Concurrency bound and permit symmetry
    // =========================================================================

    #[tokio::test(start_paused = true)]
    async fn test_in_flight_never_exceeds_gate_capacity() {
        let executor = BatchExecutor::new(5).unwrap();
        let in_flight = Arc::new(AtomicUsize::new(0));
        let observed_max = Arc::new(AtomicUsize::new(0));
        let items: Vec<u64> = (0..50).collect();

        let outcomes = {
            let in_flight = Arc::clone(&in_flight);
            let observed_max = Arc::clone(&observed_max);
            executor
                .run_batch(items, move |i| {
                    let in_flight = Arc::clone(&in_flight);
                    let observed_max = Arc::clone(&observed_max);
                    async move {
                        let current = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                        observed_max.fetch_max(current, Ordering::SeqCst);
                        sleep(Duration::from_millis(10)).await;
                        in_flight.fetch_sub(1, Ordering::SeqCst);
                        Ok(i)
                    }
                })
                .await
        };

        assert_eq!(outcomes.len(), 50);
        assert!(outcomes.iter().all(|o| o.is_ok()));
        assert!(observed_max.load(Ordering::SeqCst) <= 5);
        assert_eq!(in_flight.load(Ordering::SeqCst), 0);
        assert_eq!(executor.gate().available_permits(), 5);
    }

    #[tokio::test]
    async fn test_permits_balance_after_mixed_outcomes() {
        let executor = BatchExecutor::new(2).unwrap();
        let items: Vec<u64> = (0..8).collect();

        executor
            .run_batch(items, |i| async move {
                if i % 2 == 0 {
                    Err(Error::GenericRequest("connection reset".to_string()))
                } else {
                    Ok(i)
                }
            })
            .await;

        assert_eq!(executor.gate().available_permits(), 2);
    }

    #[tokio::test]
    async fn test_cancelling_batch_releases_permits() {
        let executor = BatchExecutor::new(2).unwrap();
        let items: Vec<u64> = (0..4).collect();

        let batch = executor.run_batch(items, |i| async move {
            sleep(Duration::from_secs(3600)).await;
            Ok(i)
        });

        tokio::select! {
            _ = batch => panic!("batch should not finish"),
            _ = sleep(Duration::from_millis(20)) => {}
        }

        // Aborted tasks unwind at their next suspension point and drop
        // their tokens.
        for _ in 0..20 {
            tokio::task::yield_now().await;
        }
        assert_eq!(executor.gate().available_permits(), 2);
    }
}
