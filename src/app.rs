//! Application
//!
//! Wires configuration, the session, the authorization flow and the receipt
//! uploader into one run.

use std::sync::Arc;

use crate::builders::MonzoConfigBuilder;
use crate::client::ResilientTransport;
use crate::core::{
    ApprovalPrompt, BrowserLauncher, ReqwestHttpTransport, StdinApprovalPrompt, SystemBrowser,
};
use crate::error::Result;
use crate::flows::AuthorizationCodeFlow;
use crate::receipts::{load_receipts, ReceiptUploader};
use crate::session::{establish_session, Session};
use crate::token::{CredentialStore, KeyringCredentialStore, TokenExchangeClient};
use crate::types::MonzoConfig;

/// One end-to-end run: establish a session, then upload the payload.
pub struct App<S, B, P>
where
    S: CredentialStore,
    B: BrowserLauncher,
    P: ApprovalPrompt,
{
    config: MonzoConfig,
    store: Arc<S>,
    browser: B,
    prompt: P,
}

impl App<KeyringCredentialStore, SystemBrowser, StdinApprovalPrompt> {
    /// Production wiring: OS keychain, system browser, stdin prompt.
    pub fn from_config(config: MonzoConfig) -> Self {
        let store = Arc::new(KeyringCredentialStore::new(config.keyring.clone()));
        Self::new(config, store, SystemBrowser, StdinApprovalPrompt)
    }
}

impl<S, B, P> App<S, B, P>
where
    S: CredentialStore,
    B: BrowserLauncher,
    P: ApprovalPrompt,
{
    /// Create an application with explicit collaborators.
    pub fn new(config: MonzoConfig, store: Arc<S>, browser: B, prompt: P) -> Self {
        Self {
            config,
            store,
            browser,
            prompt,
        }
    }

    /// Run once. Returns the number of receipts uploaded.
    pub async fn run(self) -> Result<usize> {
        let Self {
            config,
            store,
            browser,
            prompt,
        } = self;

        let transport = Arc::new(ReqwestHttpTransport::with_timeout(config.timeout)?);
        let exchange = Arc::new(TokenExchangeClient::new(config.clone(), transport.clone()));
        let session = Arc::new(Session::new());

        let flow = AuthorizationCodeFlow::new(
            config.clone(),
            exchange.clone(),
            session.clone(),
            browser,
            prompt,
        );
        let origin = establish_session(store.as_ref(), &session, &flow).await?;
        tracing::debug!(?origin, "session established");

        let receipts = load_receipts(&config.payload_path).await?;

        let client = Arc::new(ResilientTransport::new(transport, exchange, store, session));
        let uploader = ReceiptUploader::new(client, &config.provider.api_base_url);
        Ok(uploader.upload_all(&receipts).await?)
    }
}

/// Run with configuration from the environment and production collaborators.
pub async fn run() -> Result<usize> {
    let config = MonzoConfigBuilder::from_env()?.build()?;
    App::from_config(config).run().await
}
