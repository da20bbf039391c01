//! Production `HttpClient` backed by reqwest.

use futures::future::BoxFuture;
use pantry_core::environment::{HttpClient, HttpError};
use pantry_core::http::HttpRequest;
use reqwest::header::CONTENT_TYPE;
use serde_json::Value;
use std::time::Duration;

/// Configuration for [`ReqwestClient`]
///
/// # Example
///
/// ```
/// use pantry_http::ClientConfig;
/// use std::time::Duration;
///
/// let config = ClientConfig::default().with_timeout(Duration::from_secs(5));
/// assert_eq!(config.timeout, Duration::from_secs(5));
/// ```
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Total time allowed for one request, including reading the body
    pub timeout: Duration,
    /// Time allowed to establish a connection
    pub connect_timeout: Duration,
}

impl ClientConfig {
    /// Set the request timeout
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the connect timeout
    #[must_use]
    pub const fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

/// HTTP client for the remote document store
///
/// Sends every request with a JSON content type and decodes every response
/// body as JSON. Non-2xx statuses are errors.
#[derive(Clone, Debug)]
pub struct ReqwestClient {
    client: reqwest::Client,
}

impl ReqwestClient {
    /// Create a client with the default configuration
    ///
    /// # Errors
    ///
    /// Returns [`HttpError::Transport`] if the TLS backend cannot be initialized.
    pub fn new() -> Result<Self, HttpError> {
        Self::with_config(&ClientConfig::default())
    }

    /// Create a client with explicit configuration
    ///
    /// # Errors
    ///
    /// Returns [`HttpError::Transport`] if the TLS backend cannot be initialized.
    pub fn with_config(config: &ClientConfig) -> Result<Self, HttpError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(|e| HttpError::Transport(e.to_string()))?;

        Ok(Self { client })
    }

    async fn run(client: reqwest::Client, request: HttpRequest) -> Result<Value, HttpError> {
        let method = reqwest::Method::from_bytes(request.method.as_str().as_bytes())
            .map_err(|e| HttpError::InvalidRequest(e.to_string()))?;

        let mut builder = client
            .request(method, request.url.as_str())
            .header(CONTENT_TYPE, "application/json");
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await.map_err(classify)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(HttpError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await.map_err(classify)?;
        serde_json::from_slice(&bytes).map_err(|e| HttpError::Decode(e.to_string()))
    }
}

impl HttpClient for ReqwestClient {
    fn execute(&self, request: HttpRequest) -> BoxFuture<'static, Result<Value, HttpError>> {
        Box::pin(Self::run(self.client.clone(), request))
    }
}

fn classify(error: reqwest::Error) -> HttpError {
    if error.is_timeout() {
        HttpError::Timeout
    } else if error.is_builder() {
        HttpError::InvalidRequest(error.to_string())
    } else {
        HttpError::Transport(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
    }

    #[tokio::test]
    async fn invalid_verb_is_an_invalid_request() {
        let Ok(client) = ReqwestClient::new() else {
            unreachable!("default client builds");
        };
        let request = HttpRequest::new(
            pantry_core::http::Method::Other("BAD VERB".to_string()),
            "http://127.0.0.1:9/ingredients.json",
        );

        let result = client.execute(request).await;
        assert!(matches!(result, Err(HttpError::InvalidRequest(_))));
    }
}
