#![deny(unreachable_pub)]

// Core modules
mod consts;
mod errors;
mod prelude;
mod req;

// Feature modules
mod batch;
mod client;
mod gate;
pub mod logging;
pub mod queries;
mod rate_limiter;
mod telemetry;

// Re-exports
pub use batch::{BatchExecutor, BatchFailure, BatchOutcome};
pub use client::{GraphQlError, GraphQlResponse, NerdGraphClient, QueryRunner};
pub use consts::{BaseUrl, API_KEY_ENV_VAR, EU_API_URL, US_API_URL};
pub use errors::{Error, HttpErrorKind};
pub use gate::{ConcurrencyGate, ConcurrencyToken};
pub use queries::response_structs::{Account, AccountNrqlResult};
pub use rate_limiter::{AdmissionReport, SlidingWindowLimiter};
pub use telemetry::{ClientMetricsRecorder, MetricsRecorder};
