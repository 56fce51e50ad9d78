use reqwest::{Client, Response};
use tracing::debug;

use crate::{consts::API_KEY_HEADER, prelude::*, Error};

#[derive(Debug)]
pub struct HttpClient {
    pub client: Client,
    pub endpoint: String,
}

async fn parse_response(response: Response) -> Result<String> {
    let status_code = response.status().as_u16();
    let text = response
        .text()
        .await
        .map_err(|e| Error::GenericRequest(e.to_string()))?;

    if status_code < 400 {
        return Ok(text);
    }
    if (400..500).contains(&status_code) {
        return Err(Error::client_error(status_code, text));
    }
    Err(Error::server_error(status_code, text))
}

impl HttpClient {
    /// Send a single POST request with the credential attached.
    ///
    /// Exactly one attempt is made; retry policy belongs to the caller.
    pub async fn post(&self, body: String, api_key: &str) -> Result<String> {
        let request = self
            .client
            .post(&self.endpoint)
            .header("Content-Type", "application/json")
            .header(API_KEY_HEADER, api_key)
            .body(body)
            .build()
            .map_err(|e| Error::GenericRequest(e.to_string()))?;

        debug!(endpoint = %self.endpoint, "Sending GraphQL request");

        let result = self
            .client
            .execute(request)
            .await
            .map_err(|e| Error::GenericRequest(e.to_string()))?;

        parse_response(result).await
    }
}
