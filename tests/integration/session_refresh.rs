//! Integration tests for the self-refreshing session

use super::*;
use async_trait::async_trait;
use monzo_receipts::{
    ApprovalPrompt, App, AuthorizationError, BrowserLauncher, CredentialStore, Error,
    InMemoryCredentialStore, ReceiptUploader, ReqwestHttpTransport, ResilientTransport, Session,
    TokenExchangeClient, TokenPair, TransportError, UploadError,
};
use std::sync::Arc;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::Mock;

const RECEIPTS: &str = r#"[{
    "transaction_id": "tx_00009WVHLHPQ1VhHDhfRZ5",
    "external_id": "receipt-1",
    "total": 1299,
    "currency": "GBP",
    "items": [{"description": "Coffee", "quantity": 1, "amount": 1299, "currency": "GBP"}]
}]"#;

/// Fails if the application tries to start a browser authorization.
struct NoBrowser;

impl BrowserLauncher for NoBrowser {
    fn open(&self, _url: &str) -> std::io::Result<()> {
        Err(std::io::Error::other("browser must not be opened"))
    }
}

struct NoPrompt;

#[async_trait]
impl ApprovalPrompt for NoPrompt {
    async fn wait_for_approval(&self) -> Result<(), AuthorizationError> {
        Ok(())
    }
}

async fn mount_receipts(server: &MockServer, bearer: &str, status: u16) {
    Mock::given(method("PUT"))
        .and(path("/transaction-receipts"))
        .and(header("authorization", format!("Bearer {bearer}").as_str()))
        .and(header("content-type", "application/json"))
        .respond_with(ResponseTemplate::new(status).set_body_json(json!({})))
        .mount(server)
        .await;
}

async fn mount_refresh(server: &MockServer, expected_calls: u64) {
    Mock::given(method("POST"))
        .and(path("/oauth2/token"))
        .and(body_string_contains("grant_type=refresh_token"))
        .and(body_string_contains("refresh_token=xyz789"))
        .respond_with(token_response("newAccess", "newRefresh"))
        .expect(expected_calls)
        .mount(server)
        .await;
}

fn uploader(
    server: &MockServer,
    store: Arc<InMemoryCredentialStore>,
    session: Arc<Session>,
) -> ReceiptUploader<
    ResilientTransport<
        ReqwestHttpTransport,
        TokenExchangeClient<ReqwestHttpTransport>,
        InMemoryCredentialStore,
    >,
> {
    let config = config_for(server);
    let transport = Arc::new(ReqwestHttpTransport::new().expect("client builds"));
    let exchange = Arc::new(TokenExchangeClient::new(config.clone(), transport.clone()));
    let client = Arc::new(ResilientTransport::new(transport, exchange, store, session));
    ReceiptUploader::new(client, &config.provider.api_base_url)
}

#[tokio::test]
async fn test_expired_access_token_is_refreshed_and_persisted() {
    let mock_server = setup_mock_server().await;
    mount_receipts(&mock_server, "abc123", 401).await;
    mount_receipts(&mock_server, "newAccess", 200).await;
    mount_refresh(&mock_server, 1).await;

    let store = Arc::new(InMemoryCredentialStore::with_blob("abc123::xyz789"));
    let session = Arc::new(Session::with_tokens(TokenPair::new("abc123", "xyz789")));
    let receipts = serde_json::from_str::<Vec<monzo_receipts::Receipt>>(RECEIPTS).unwrap();

    let uploaded = uploader(&mock_server, store.clone(), session.clone())
        .upload_all(&receipts)
        .await
        .expect("upload succeeds after refresh");

    assert_eq!(uploaded, 1);
    assert_eq!(store.load().await.unwrap(), "newAccess::newRefresh");
    assert_eq!(
        session.tokens().await,
        Some(TokenPair::new("newAccess", "newRefresh"))
    );
}

#[tokio::test]
async fn test_still_unauthorized_after_refresh() {
    let mock_server = setup_mock_server().await;
    mount_receipts(&mock_server, "abc123", 401).await;
    mount_receipts(&mock_server, "newAccess", 401).await;
    mount_refresh(&mock_server, 1).await;

    let store = Arc::new(InMemoryCredentialStore::with_blob("abc123::xyz789"));
    let session = Arc::new(Session::with_tokens(TokenPair::new("abc123", "xyz789")));
    let receipts = serde_json::from_str::<Vec<monzo_receipts::Receipt>>(RECEIPTS).unwrap();

    let error = uploader(&mock_server, store, session)
        .upload_all(&receipts)
        .await
        .unwrap_err();

    assert!(matches!(
        error,
        UploadError::Transport(TransportError::Unauthorized)
    ));

    let puts = mock_server
        .received_requests()
        .await
        .unwrap()
        .into_iter()
        .filter(|request| request.method.as_str() == "PUT")
        .count();
    assert_eq!(puts, 2);
}

#[tokio::test]
async fn test_app_run_with_cached_session() {
    let mock_server = setup_mock_server().await;
    mount_receipts(&mock_server, "abc123", 401).await;
    mount_receipts(&mock_server, "newAccess", 200).await;
    mount_refresh(&mock_server, 1).await;

    let payload = temp_path("payload.json");
    tokio::fs::write(&payload, RECEIPTS).await.unwrap();

    let mut config = config_for(&mock_server);
    config.payload_path = payload.clone();
    let store = Arc::new(InMemoryCredentialStore::with_blob("abc123::xyz789"));

    let uploaded = App::new(config, store.clone(), NoBrowser, NoPrompt)
        .run()
        .await
        .expect("run succeeds");

    assert_eq!(uploaded, 1);
    assert_eq!(store.current().as_deref(), Some("newAccess::newRefresh"));

    tokio::fs::remove_file(&payload).await.unwrap();
}

#[tokio::test]
async fn test_app_run_with_corrupted_record() {
    let mock_server = setup_mock_server().await;

    let store = Arc::new(InMemoryCredentialStore::with_blob("abc123"));
    let error = App::new(config_for(&mock_server), store, NoBrowser, NoPrompt)
        .run()
        .await
        .unwrap_err();

    assert!(matches!(error, Error::Format(_)));
    assert!(mock_server.received_requests().await.unwrap().is_empty());
}
