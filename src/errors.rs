use thiserror::Error;

/// HTTP error classification
#[derive(Error, Debug, Clone)]
pub enum HttpErrorKind {
    #[error("Client error: {body}")]
    Client { body: String },
    #[error("Server error: {body}")]
    Server { body: String },
}

/// Main SDK error type
#[derive(Error, Debug, Clone)]
pub enum Error {
    /// Invalid construction parameter (limiter, gate or client config)
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// HTTP error with status code and classification
    #[error("HTTP error (status {status}): {kind}")]
    Http { status: u16, kind: HttpErrorKind },

    /// Generic request error (connection-level failure)
    #[error("Generic request error: {0}")]
    GenericRequest(String),

    /// The remote API answered with a non-empty GraphQL error list
    #[error("GraphQL error: {0}")]
    GraphQl(String),

    /// JSON parse error
    #[error("Json parse error: {0}")]
    JsonParse(String),

    /// Response parsed but carried neither data nor errors
    #[error("Response missing data field")]
    MissingData,

    /// A batch task failed to run to completion
    #[error("Batch task failed: {0}")]
    Task(String),
}

// Convenience constructors for common error patterns
impl Error {
    /// Create an HTTP client error (4xx)
    pub fn client_error(status: u16, body: String) -> Self {
        Error::Http {
            status,
            kind: HttpErrorKind::Client { body },
        }
    }

    /// Create an HTTP server error (5xx)
    pub fn server_error(status: u16, body: String) -> Self {
        Error::Http {
            status,
            kind: HttpErrorKind::Server { body },
        }
    }

    /// True for errors raised before any request was attempted.
    pub fn is_config(&self) -> bool {
        matches!(self, Error::Config(_))
    }
}
