//! Token Exchange
//!
//! Trades an authorization code or a refresh token for a new token pair at the
//! provider's token endpoint.

use async_trait::async_trait;
use secrecy::ExposeSecret;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

use crate::core::{HttpMethod, HttpRequest, HttpResponse, HttpTransport};
use crate::error::{create_error_from_response, ExchangeError, TransportError};
use crate::types::{MonzoConfig, TokenPair, TokenResponse};

/// Token exchange interface.
#[async_trait]
pub trait TokenExchange: Send + Sync {
    /// Exchange an authorization code captured by the callback listener.
    async fn exchange_authorization_code(&self, code: &str) -> Result<TokenPair, ExchangeError>;

    /// Exchange a refresh token for a fresh pair.
    async fn exchange_refresh_token(&self, refresh_token: &str)
        -> Result<TokenPair, ExchangeError>;
}

/// Token endpoint client.
///
/// Uses the plain transport: a 401 here means bad client credentials, not an
/// expired session.
pub struct TokenExchangeClient<T: HttpTransport> {
    config: MonzoConfig,
    transport: Arc<T>,
}

impl<T: HttpTransport> TokenExchangeClient<T> {
    /// Create new token exchange client.
    pub fn new(config: MonzoConfig, transport: Arc<T>) -> Self {
        Self { config, transport }
    }

    fn build_request_body(&self, grant: &[(&str, &str)]) -> String {
        let credentials = &self.config.credentials;
        url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(grant.iter().take(1))
            .append_pair("client_id", &credentials.client_id)
            .append_pair("client_secret", credentials.client_secret.expose_secret())
            .extend_pairs(grant.iter().skip(1))
            .finish()
    }

    async fn request_tokens(&self, body: String) -> Result<TokenPair, ExchangeError> {
        let request = HttpRequest::new(HttpMethod::Post, &self.config.provider.token_endpoint)
            .with_header("content-type", "application/x-www-form-urlencoded")
            .with_header("accept", "application/json")
            .with_body(body);

        let response = self.transport.send(request).await?;
        parse_token_response(&response)
    }
}

/// Decode a token endpoint response. Anything but 200 is an error.
pub fn parse_token_response(response: &HttpResponse) -> Result<TokenPair, ExchangeError> {
    if !response.is_ok() {
        return Err(create_error_from_response(response.status, &response.body));
    }

    let tokens: TokenResponse =
        serde_json::from_str(&response.body).map_err(|e| ExchangeError::MalformedResponse {
            message: e.to_string(),
        })?;

    tracing::debug!(user_id = %tokens.user_id, "token endpoint issued new pair");
    Ok(tokens.into())
}

#[async_trait]
impl<T: HttpTransport> TokenExchange for TokenExchangeClient<T> {
    async fn exchange_authorization_code(&self, code: &str) -> Result<TokenPair, ExchangeError> {
        let body = self.build_request_body(&[
            ("grant_type", "authorization_code"),
            ("redirect_uri", self.config.callback.redirect_uri.as_str()),
            ("code", code),
        ]);

        tracing::info!("exchanging authorization code");
        self.request_tokens(body).await
    }

    async fn exchange_refresh_token(
        &self,
        refresh_token: &str,
    ) -> Result<TokenPair, ExchangeError> {
        let body = self.build_request_body(&[
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
        ]);

        tracing::info!("refreshing access token");
        self.request_tokens(body).await
    }
}

/// Exchange call recorded by [`MockTokenExchange`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExchangeCall {
    AuthorizationCode(String),
    RefreshToken(String),
}

/// Mock token exchange for testing. Results are returned in queue order.
#[derive(Default)]
pub struct MockTokenExchange {
    results: Mutex<VecDeque<Result<TokenPair, ExchangeError>>>,
    history: Mutex<Vec<ExchangeCall>>,
}

impl MockTokenExchange {
    /// Create new mock token exchange.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful exchange.
    pub fn queue_tokens(&self, tokens: TokenPair) -> &Self {
        lock(&self.results).push_back(Ok(tokens));
        self
    }

    /// Queue a failed exchange.
    pub fn queue_error(&self, error: ExchangeError) -> &Self {
        lock(&self.results).push_back(Err(error));
        self
    }

    /// Get call history.
    pub fn get_calls(&self) -> Vec<ExchangeCall> {
        lock(&self.history).clone()
    }

    /// Number of refresh calls made.
    pub fn refresh_count(&self) -> usize {
        lock(&self.history)
            .iter()
            .filter(|call| matches!(call, ExchangeCall::RefreshToken(_)))
            .count()
    }

    fn next_result(&self, call: ExchangeCall) -> Result<TokenPair, ExchangeError> {
        lock(&self.history).push(call);
        lock(&self.results).pop_front().unwrap_or_else(|| {
            Err(ExchangeError::Transport(TransportError::ConnectionFailed {
                message: "No mock exchange result available".to_string(),
            }))
        })
    }
}

#[async_trait]
impl TokenExchange for MockTokenExchange {
    async fn exchange_authorization_code(&self, code: &str) -> Result<TokenPair, ExchangeError> {
        self.next_result(ExchangeCall::AuthorizationCode(code.to_string()))
    }

    async fn exchange_refresh_token(
        &self,
        refresh_token: &str,
    ) -> Result<TokenPair, ExchangeError> {
        self.next_result(ExchangeCall::RefreshToken(refresh_token.to_string()))
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builders::MonzoConfigBuilder;
    use crate::core::MockHttpTransport;
    use std::collections::HashMap;

    fn config() -> MonzoConfig {
        MonzoConfigBuilder::new()
            .client_id("oauth2client_123")
            .client_secret("mnzconf.secret")
            .build()
            .unwrap()
    }

    fn form(body: &str) -> HashMap<String, String> {
        url::form_urlencoded::parse(body.as_bytes())
            .into_owned()
            .collect()
    }

    #[tokio::test]
    async fn test_exchange_authorization_code() {
        let transport = Arc::new(MockHttpTransport::new());
        transport.queue_json_response(
            200,
            &serde_json::json!({
                "access_token": "abc123",
                "refresh_token": "xyz789",
                "user_id": "user_00009"
            }),
        );

        let client = TokenExchangeClient::new(config(), transport.clone());
        let tokens = client.exchange_authorization_code("code-1").await.unwrap();
        assert_eq!(tokens, TokenPair::new("abc123", "xyz789"));

        let request = transport.get_last_request().unwrap();
        assert_eq!(request.method, HttpMethod::Post);
        assert_eq!(request.url, "https://api.monzo.com/oauth2/token");
        assert_eq!(
            request.header("Content-Type"),
            Some("application/x-www-form-urlencoded")
        );

        let params = form(request.body.as_deref().unwrap());
        assert_eq!(params["grant_type"], "authorization_code");
        assert_eq!(params["client_id"], "oauth2client_123");
        assert_eq!(params["client_secret"], "mnzconf.secret");
        assert_eq!(params["redirect_uri"], "http://127.0.0.1:21234/callback");
        assert_eq!(params["code"], "code-1");
    }

    #[tokio::test]
    async fn test_exchange_refresh_token_form() {
        let transport = Arc::new(MockHttpTransport::new());
        transport.queue_json_response(
            200,
            &serde_json::json!({
                "access_token": "newAccess",
                "refresh_token": "newRefresh",
                "user_id": "user_00009"
            }),
        );

        let client = TokenExchangeClient::new(config(), transport.clone());
        let tokens = client.exchange_refresh_token("xyz789").await.unwrap();
        assert_eq!(tokens, TokenPair::new("newAccess", "newRefresh"));

        let request = transport.get_last_request().unwrap();
        let params = form(request.body.as_deref().unwrap());
        assert_eq!(params["grant_type"], "refresh_token");
        assert_eq!(params["refresh_token"], "xyz789");
        assert!(!params.contains_key("code"));
        assert!(!params.contains_key("redirect_uri"));
    }

    #[tokio::test]
    async fn test_form_values_are_encoded() {
        let transport = Arc::new(MockHttpTransport::new());
        transport.queue_response(HttpResponse::new(500, ""));

        let client = TokenExchangeClient::new(config(), transport.clone());
        let _ = client.exchange_authorization_code("a&b=c d").await;

        let body = transport.get_last_request().unwrap().body.unwrap();
        assert!(body.contains("code=a%26b%3Dc+d"));
        assert_eq!(form(&body)["code"], "a&b=c d");
    }

    #[tokio::test]
    async fn test_non_200_is_unexpected_status() {
        let transport = Arc::new(MockHttpTransport::new());
        transport.queue_json_response(
            401,
            &serde_json::json!({
                "error": "unauthorized",
                "error_description": "invalid client"
            }),
        );

        let client = TokenExchangeClient::new(config(), transport);
        let error = client.exchange_refresh_token("xyz789").await.unwrap_err();

        match &error {
            ExchangeError::UnexpectedStatus {
                status,
                description,
            } => {
                assert_eq!(*status, 401);
                assert_eq!(description.as_deref(), Some("invalid client"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(error.is_rejected());
    }

    #[tokio::test]
    async fn test_malformed_response() {
        let bodies = [
            serde_json::json!({"access_token": "a", "refresh_token": "r"}),
            serde_json::json!({"access_token": 1, "refresh_token": "r", "user_id": "u"}),
            serde_json::json!({"refresh_token": "r", "user_id": "u"}),
        ];

        for body in bodies {
            let transport = Arc::new(MockHttpTransport::new());
            transport.queue_json_response(200, &body);

            let client = TokenExchangeClient::new(config(), transport);
            let result = client.exchange_authorization_code("code").await;
            assert!(
                matches!(result, Err(ExchangeError::MalformedResponse { .. })),
                "body {body}"
            );
        }
    }

    #[tokio::test]
    async fn test_transport_error_propagates() {
        let transport = Arc::new(MockHttpTransport::new());
        transport.queue_error(TransportError::ConnectionFailed {
            message: "refused".to_string(),
        });

        let client = TokenExchangeClient::new(config(), transport);
        let result = client.exchange_refresh_token("xyz789").await;
        assert!(matches!(result, Err(ExchangeError::Transport(_))));
    }

    #[tokio::test]
    async fn test_mock_token_exchange() {
        let exchange = MockTokenExchange::new();
        exchange.queue_tokens(TokenPair::new("a", "r"));

        let tokens = exchange.exchange_refresh_token("old").await.unwrap();
        assert_eq!(tokens.access_token(), "a");
        assert!(exchange.exchange_authorization_code("c").await.is_err());

        assert_eq!(
            exchange.get_calls(),
            vec![
                ExchangeCall::RefreshToken("old".to_string()),
                ExchangeCall::AuthorizationCode("c".to_string()),
            ]
        );
        assert_eq!(exchange.refresh_count(), 1);
    }
}
