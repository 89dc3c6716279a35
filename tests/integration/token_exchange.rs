//! Integration tests for the token endpoint client

use super::*;
use monzo_receipts::{ExchangeError, ReqwestHttpTransport, TokenExchange, TokenExchangeClient};
use std::sync::Arc;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::Mock;

fn client(server: &MockServer) -> TokenExchangeClient<ReqwestHttpTransport> {
    let transport = Arc::new(ReqwestHttpTransport::new().expect("client builds"));
    TokenExchangeClient::new(config_for(server), transport)
}

#[tokio::test]
async fn test_authorization_code_exchange() {
    let mock_server = setup_mock_server().await;

    Mock::given(method("POST"))
        .and(path("/oauth2/token"))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .and(body_string_contains("grant_type=authorization_code"))
        .and(body_string_contains("client_id=oauth2client_00009"))
        .and(body_string_contains("client_secret=mnzconf.secret"))
        .and(body_string_contains(
            "redirect_uri=http%3A%2F%2F127.0.0.1%3A21234%2Fcallback",
        ))
        .and(body_string_contains("code=auth-code-1"))
        .respond_with(token_response("abc123", "xyz789"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let tokens = client(&mock_server)
        .exchange_authorization_code("auth-code-1")
        .await
        .expect("exchange succeeds");

    assert_eq!(tokens.access_token(), "abc123");
    assert_eq!(tokens.refresh_token(), "xyz789");
}

#[tokio::test]
async fn test_refresh_rejected_with_description() {
    let mock_server = setup_mock_server().await;

    Mock::given(method("POST"))
        .and(path("/oauth2/token"))
        .and(body_string_contains("grant_type=refresh_token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "invalid_grant",
            "error_description": "refresh token has been evicted"
        })))
        .mount(&mock_server)
        .await;

    let error = client(&mock_server)
        .exchange_refresh_token("xyz789")
        .await
        .unwrap_err();

    match error {
        ExchangeError::UnexpectedStatus {
            status,
            description,
        } => {
            assert_eq!(status, 400);
            assert_eq!(description.as_deref(), Some("refresh token has been evicted"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_response_without_user_id_is_malformed() {
    let mock_server = setup_mock_server().await;

    Mock::given(method("POST"))
        .and(path("/oauth2/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "abc123",
            "refresh_token": "xyz789"
        })))
        .mount(&mock_server)
        .await;

    let result = client(&mock_server).exchange_refresh_token("xyz789").await;
    assert!(matches!(result, Err(ExchangeError::MalformedResponse { .. })));
}
