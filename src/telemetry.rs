//! Injected observability hooks.

use std::sync::Arc;
use std::time::Duration;

/// Trait for recording SDK throughput metrics.
/// Implement this trait to collect statistics about rate-limit waits,
/// request round trips and batch failures. Handles are passed to the
/// components that emit them; nothing is discovered through global state.
pub trait ClientMetricsRecorder: Send + Sync {
    /// Called when an admission had to wait for window capacity
    fn record_admission_wait(&self, waited: Duration);
    /// Called when a request round trip starts
    fn record_request_started(&self);
    /// Called when a request round trip finishes (success or failure)
    fn record_request_finished(&self);
    /// Called when a batch item fails
    fn record_item_failure(&self, identity: &str);
}

/// Type alias for optional metrics recorder.
pub type MetricsRecorder = Option<Arc<dyn ClientMetricsRecorder>>;
