//! Bounded-concurrency permit pool.

use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::{prelude::*, Error};

/// Permit for one unit of the concurrency budget.
///
/// Dropping the token returns the permit to the pool, so release happens on
/// every exit path: success, error return and task cancellation.
#[derive(Debug)]
pub struct ConcurrencyToken {
    _permit: OwnedSemaphorePermit,
}

/// Counting permit pool bounding the number of simultaneous in-flight
/// requests.
///
/// Independent of any rate limiting: a request may be rate-limited but not
/// concurrency-limited, and vice versa. Waiters are served FIFO, so no
/// caller starves under bounded load. A capacity of 1 makes execution fully
/// sequential.
#[derive(Clone, Debug)]
pub struct ConcurrencyGate {
    semaphore: Arc<Semaphore>,
    max_concurrency: usize,
}

impl ConcurrencyGate {
    /// Create a gate with the given capacity. Must be positive.
    pub fn new(max_concurrency: usize) -> Result<Self> {
        if max_concurrency == 0 {
            return Err(Error::Config("max_concurrency must be positive".to_string()));
        }
        Ok(Self {
            semaphore: Arc::new(Semaphore::new(max_concurrency)),
            max_concurrency,
        })
    }

    /// Acquire one permit, suspending the task until one is free.
    pub async fn acquire(&self) -> Result<ConcurrencyToken> {
        let permit = self
            .semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| Error::Task("concurrency gate closed".to_string()))?;
        Ok(ConcurrencyToken { _permit: permit })
    }

    /// Number of permits currently free.
    pub fn available_permits(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Configured capacity of the pool.
    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }
}
