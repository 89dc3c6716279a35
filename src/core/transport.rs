//! HTTP Transport
//!
//! HTTP client interface and implementations for token endpoint and API requests.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use crate::error::TransportError;
use crate::types::DEFAULT_TIMEOUT;

const AUTHORIZATION: &str = "authorization";
const BEARER_PREFIX: &str = "Bearer ";

/// HTTP request definition.
#[derive(Clone, Debug)]
pub struct HttpRequest {
    /// HTTP method.
    pub method: HttpMethod,
    /// Request URL.
    pub url: String,
    /// Request headers.
    pub headers: HashMap<String, String>,
    /// Request body.
    pub body: Option<String>,
    /// Request timeout.
    pub timeout: Option<Duration>,
}

impl HttpRequest {
    /// Create a request without headers or body.
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: HashMap::new(),
            body: None,
            timeout: None,
        }
    }

    /// Add a header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Set the body.
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Header value, matched case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Bearer credential currently attached, if any.
    pub fn bearer_token(&self) -> Option<&str> {
        self.header(AUTHORIZATION)
            .and_then(|value| value.strip_prefix(BEARER_PREFIX))
    }

    /// Replace any Authorization header with a bearer credential.
    pub fn set_bearer_token(&mut self, token: &str) {
        self.headers
            .retain(|key, _| !key.eq_ignore_ascii_case(AUTHORIZATION));
        self.headers
            .insert(AUTHORIZATION.to_string(), format!("{BEARER_PREFIX}{token}"));
    }
}

/// HTTP method.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HttpMethod {
    Post,
    Put,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Post => "POST",
            Self::Put => "PUT",
        }
    }
}

/// HTTP response definition.
#[derive(Clone, Debug)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response headers.
    pub headers: HashMap<String, String>,
    /// Response body.
    pub body: String,
}

impl HttpResponse {
    /// Create a response with an empty header map.
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            body: body.into(),
        }
    }

    /// Status 200.
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }

    /// Status 401.
    pub fn is_unauthorized(&self) -> bool {
        self.status == 401
    }

    /// Turn a 401 into [`TransportError::Unauthorized`].
    pub fn error_for_unauthorized(self) -> Result<Self, TransportError> {
        if self.is_unauthorized() {
            Err(TransportError::Unauthorized)
        } else {
            Ok(self)
        }
    }
}

/// HTTP transport interface (for dependency injection).
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Send an HTTP request.
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}

/// Default reqwest-based HTTP transport.
pub struct ReqwestHttpTransport {
    client: reqwest::Client,
    default_timeout: Duration,
}

impl ReqwestHttpTransport {
    /// Create new transport with the default bounded timeout.
    pub fn new() -> Result<Self, TransportError> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    /// Create transport with a custom timeout.
    pub fn with_timeout(timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::ConnectionFailed {
                message: format!("failed to create HTTP client: {e}"),
            })?;

        Ok(Self {
            client,
            default_timeout: timeout,
        })
    }
}

#[async_trait]
impl HttpTransport for ReqwestHttpTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let timeout = request.timeout.unwrap_or(self.default_timeout);

        let mut req_builder = match request.method {
            HttpMethod::Post => self.client.post(&request.url),
            HttpMethod::Put => self.client.put(&request.url),
        };

        for (key, value) in &request.headers {
            req_builder = req_builder.header(key, value);
        }

        if let Some(body) = request.body {
            req_builder = req_builder.body(body);
        }

        tracing::debug!(method = request.method.as_str(), url = %request.url, "sending request");

        let response = req_builder.timeout(timeout).send().await.map_err(|e| {
            if e.is_timeout() {
                TransportError::Timeout { timeout }
            } else {
                TransportError::ConnectionFailed {
                    message: e.to_string(),
                }
            }
        })?;

        let status = response.status().as_u16();

        let mut headers = HashMap::new();
        for (key, value) in response.headers() {
            if let Ok(v) = value.to_str() {
                headers.insert(key.as_str().to_lowercase(), v.to_string());
            }
        }

        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                TransportError::Timeout { timeout }
            } else {
                TransportError::InvalidResponse {
                    message: e.to_string(),
                }
            }
        })?;

        tracing::debug!(status, "received response");

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

/// Mock HTTP transport for testing. Responses are returned in queue order.
#[derive(Default)]
pub struct MockHttpTransport {
    responses: Mutex<VecDeque<Result<HttpResponse, TransportError>>>,
    request_history: Mutex<Vec<HttpRequest>>,
    default_response: Mutex<Option<HttpResponse>>,
}

impl MockHttpTransport {
    /// Create new mock transport.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response to return.
    pub fn queue_response(&self, response: HttpResponse) -> &Self {
        lock(&self.responses).push_back(Ok(response));
        self
    }

    /// Queue a JSON response.
    pub fn queue_json_response<T: serde::Serialize>(&self, status: u16, body: &T) -> &Self {
        let mut response = HttpResponse::new(
            status,
            serde_json::to_string(body).unwrap_or_default(),
        );
        response
            .headers
            .insert("content-type".to_string(), "application/json".to_string());
        self.queue_response(response)
    }

    /// Queue a transport-level failure.
    pub fn queue_error(&self, error: TransportError) -> &Self {
        lock(&self.responses).push_back(Err(error));
        self
    }

    /// Set default response when queue is empty.
    pub fn set_default_response(&self, response: HttpResponse) -> &Self {
        *lock(&self.default_response) = Some(response);
        self
    }

    /// Get request history.
    pub fn get_requests(&self) -> Vec<HttpRequest> {
        lock(&self.request_history).clone()
    }

    /// Get last request.
    pub fn get_last_request(&self) -> Option<HttpRequest> {
        lock(&self.request_history).last().cloned()
    }
}

#[async_trait]
impl HttpTransport for MockHttpTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        lock(&self.request_history).push(request);

        let queued = lock(&self.responses).pop_front();
        match queued {
            Some(result) => result,
            None => lock(&self.default_response).clone().ok_or_else(|| {
                TransportError::ConnectionFailed {
                    message: "No mock response available".to_string(),
                }
            }),
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_transport() {
        let transport = MockHttpTransport::new();
        transport.queue_json_response(200, &serde_json::json!({"key": "value"}));
        transport.queue_response(HttpResponse::new(401, ""));

        let request = HttpRequest::new(HttpMethod::Put, "https://example.com");

        let response = transport.send(request.clone()).await.unwrap();
        assert_eq!(response.status, 200);
        assert!(response.body.contains("value"));

        let response = transport.send(request).await.unwrap();
        assert!(response.is_unauthorized());

        let history = transport.get_requests();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].url, "https://example.com");
    }

    #[tokio::test]
    async fn test_mock_transport_empty_queue_fails() {
        let transport = MockHttpTransport::new();
        let result = transport
            .send(HttpRequest::new(HttpMethod::Put, "https://example.com"))
            .await;
        assert!(matches!(result, Err(TransportError::ConnectionFailed { .. })));
    }

    #[test]
    fn test_bearer_token_helpers() {
        let mut request = HttpRequest::new(HttpMethod::Put, "https://api.monzo.com")
            .with_header("Authorization", "Bearer caller-token");
        assert_eq!(request.bearer_token(), Some("caller-token"));

        request.set_bearer_token("fresh-token");
        assert_eq!(request.bearer_token(), Some("fresh-token"));
        assert_eq!(request.headers.len(), 1);
    }

    #[test]
    fn test_error_for_unauthorized() {
        assert!(HttpResponse::new(401, "").error_for_unauthorized().is_err());
        assert!(HttpResponse::new(500, "").error_for_unauthorized().is_ok());
    }

    #[test]
    fn test_http_method_as_str() {
        assert_eq!(HttpMethod::Post.as_str(), "POST");
        assert_eq!(HttpMethod::Put.as_str(), "PUT");
    }
}
