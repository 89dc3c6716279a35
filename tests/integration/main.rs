//! Integration tests using WireMock
//!
//! These tests run the token exchange, the resilient transport and the full
//! application against a mock Monzo API.

mod session_refresh;
mod token_exchange;

use monzo_receipts::{monzo_config, MonzoConfig};
use serde_json::json;
use wiremock::{MockServer, ResponseTemplate};

/// Start a mock server standing in for both the token endpoint and the API.
pub async fn setup_mock_server() -> MockServer {
    MockServer::start().await
}

/// Configuration pointed at the mock server.
pub fn config_for(server: &MockServer) -> MonzoConfig {
    monzo_config()
        .client_id("oauth2client_00009")
        .client_secret("mnzconf.secret")
        .token_endpoint(format!("{}/oauth2/token", server.uri()))
        .api_base_url(server.uri())
        .build()
        .expect("valid test configuration")
}

/// Token endpoint success body.
pub fn token_response(access: &str, refresh: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "access_token": access,
        "refresh_token": refresh,
        "user_id": "user_00009",
        "token_type": "Bearer",
        "expires_in": 21600
    }))
}

/// Unique scratch file path for this test process.
pub fn temp_path(name: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!("monzo-receipts-it-{}-{name}", std::process::id()))
}
