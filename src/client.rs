//! Core NerdGraph client implementation.

use std::env;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::error;

use crate::{
    consts::API_KEY_ENV_VAR, prelude::*, rate_limiter::SlidingWindowLimiter, req::HttpClient,
    telemetry::MetricsRecorder, BaseUrl, Error,
};

/// One entry in a GraphQL response's error list.
#[derive(Deserialize, Debug, Clone)]
pub struct GraphQlError {
    pub message: String,
}

/// GraphQL response envelope: a `data` payload on success, a non-empty
/// `errors` list when the remote API reports a logical failure.
#[derive(Deserialize, Debug, Clone)]
pub struct GraphQlResponse {
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub errors: Option<Vec<GraphQlError>>,
}

/// Interpret a raw response body as a GraphQL envelope and extract its data
/// payload. Remote errors are joined into a single message.
fn interpret_body(body: &str) -> Result<Value> {
    let response: GraphQlResponse =
        serde_json::from_str(body).map_err(|e| Error::JsonParse(e.to_string()))?;

    if let Some(errors) = &response.errors {
        if !errors.is_empty() {
            let joined = errors
                .iter()
                .map(|e| e.message.as_str())
                .collect::<Vec<_>>()
                .join("; ");
            return Err(Error::GraphQl(joined));
        }
    }
    response.data.ok_or(Error::MissingData)
}

/// Query execution seam for the helpers in [`crate::queries`].
/// Abstracts the client to enable testing and mocking.
#[async_trait]
pub trait QueryRunner: Send + Sync {
    /// Run one GraphQL query and return its data payload.
    async fn run_query(&self, query: &str, variables: Option<Value>) -> Result<Value>;
}

/// Authenticated client for the NerdGraph GraphQL endpoint.
///
/// Owns the credential and the HTTP transport. Performs one query-and-parse
/// round trip per call; no retries. An optional [`SlidingWindowLimiter`]
/// can be attached so every request admission-checks first.
pub struct NerdGraphClient {
    pub http_client: HttpClient,
    api_key: String,
    rate_limiter: Option<Arc<SlidingWindowLimiter>>,
    metrics: MetricsRecorder,
}

// Custom Debug implementation to prevent credential leakage
impl std::fmt::Debug for NerdGraphClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NerdGraphClient")
            .field("http_client", &self.http_client)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

impl NerdGraphClient {
    /// Create a client for the given credential and region.
    ///
    /// An empty credential is a configuration error.
    pub fn new(
        api_key: impl Into<String>,
        client: Option<Client>,
        base_url: Option<BaseUrl>,
    ) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(Error::Config("missing API key".to_string()));
        }
        Ok(Self {
            http_client: HttpClient {
                client: client.unwrap_or_default(),
                endpoint: base_url.unwrap_or_default().get_url(),
            },
            api_key,
            rate_limiter: None,
            metrics: None,
        })
    }

    /// Create a client from the `NEW_RELIC_API_KEY` environment variable.
    pub fn from_env(client: Option<Client>, base_url: Option<BaseUrl>) -> Result<Self> {
        let api_key = env::var(API_KEY_ENV_VAR)
            .map_err(|_| Error::Config(format!("{API_KEY_ENV_VAR} is not set")))?;
        Self::new(api_key, client, base_url)
    }

    /// Attach a sliding-window limiter consulted before every request.
    pub fn with_rate_limiter(mut self, limiter: Arc<SlidingWindowLimiter>) -> Self {
        self.rate_limiter = Some(limiter);
        self
    }

    /// Attach a metrics recorder that observes request round trips.
    pub fn with_metrics(mut self, metrics: MetricsRecorder) -> Self {
        self.metrics = metrics;
        self
    }

    /// Replace the credential used for subsequent requests.
    pub fn update_api_key(&mut self, api_key: impl Into<String>) -> Result<()> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(Error::Config("missing API key".to_string()));
        }
        self.api_key = api_key;
        Ok(())
    }

    /// Execute a single GraphQL query and return its data payload.
    pub async fn execute_query(&self, query: &str, variables: Option<Value>) -> Result<Value> {
        if let Some(limiter) = &self.rate_limiter {
            limiter.admit().await;
        }

        let body = serde_json::to_string(&json!({ "query": query, "variables": variables }))
            .map_err(|e| Error::JsonParse(e.to_string()))?;

        if let Some(metrics) = &self.metrics {
            metrics.record_request_started();
        }
        let result = self.http_client.post(body, &self.api_key).await;
        if let Some(metrics) = &self.metrics {
            metrics.record_request_finished();
        }

        let text = match result {
            Ok(text) => text,
            Err(e) => {
                error!(error = %e, "Query failed to run");
                return Err(e);
            }
        };
        interpret_body(&text)
    }

    /// Execute a query and deserialize its data payload into `T`.
    pub async fn execute_query_typed<T: for<'a> Deserialize<'a>>(
        &self,
        query: &str,
        variables: Option<Value>,
    ) -> Result<T> {
        let data = self.execute_query(query, variables).await?;
        serde_json::from_value(data).map_err(|e| Error::JsonParse(e.to_string()))
    }
}

#[async_trait]
impl QueryRunner for NerdGraphClient {
    async fn run_query(&self, query: &str, variables: Option<Value>) -> Result<Value> {
        self.execute_query(query, variables).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // Response interpretation
    // =========================================================================

    #[test]
    fn test_interpret_body_returns_data() {
        let body = r#"{"data": {"actor": {"accounts": []}}}"#;
        let data = interpret_body(body).unwrap();
        assert!(data["actor"]["accounts"].is_array());
    }

    #[test]
    fn test_interpret_body_joins_remote_errors() {
        let body = r#"{"errors": [{"message": "first"}, {"message": "second"}]}"#;
        let err = interpret_body(body).unwrap_err();
        match err {
            Error::GraphQl(message) => assert_eq!(message, "first; second"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_interpret_body_empty_error_list_is_not_a_failure() {
        let body = r#"{"data": {"ok": true}, "errors": []}"#;
        let data = interpret_body(body).unwrap();
        assert_eq!(data["ok"], true);
    }

    #[test]
    fn test_interpret_body_rejects_malformed_json() {
        let err = interpret_body("<html>bad gateway</html>").unwrap_err();
        assert!(matches!(err, Error::JsonParse(_)));
    }

    #[test]
    fn test_interpret_body_without_data_or_errors() {
        let err = interpret_body("{}").unwrap_err();
        assert!(matches!(err, Error::MissingData));
    }

    // =========================================================================
    // Credential handling
    // =========================================================================

    #[test]
    fn test_empty_api_key_rejected() {
        let err = NerdGraphClient::new("", None, None).unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn test_update_api_key_rejects_empty() {
        let mut client = NerdGraphClient::new("NRAK-XXXX", None, None).unwrap();
        assert!(client.update_api_key("").is_err());
        assert!(client.update_api_key("NRAK-YYYY").is_ok());
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let client = NerdGraphClient::new("NRAK-SECRET", None, None).unwrap();
        let debug = format!("{client:?}");
        assert!(!debug.contains("NRAK-SECRET"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_default_endpoint_is_us() {
        let client = NerdGraphClient::new("NRAK-XXXX", None, None).unwrap();
        assert_eq!(client.http_client.endpoint, crate::consts::US_API_URL);
    }
}
