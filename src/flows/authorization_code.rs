//! Authorization Code Flow
//!
//! Browser-based authorization: open the consent page, capture the redirect,
//! exchange the code, then wait for in-app approval.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};
use url::Url;

use crate::core::{ApprovalPrompt, BrowserLauncher, StateNonce};
use crate::error::AuthorizationError;
use crate::flows::callback::CallbackListener;
use crate::session::Session;
use crate::token::TokenExchange;
use crate::types::{MonzoConfig, TokenPair};

/// Anything that can obtain a fresh token pair from the user.
#[async_trait]
pub trait Authorizer: Send + Sync {
    /// Run a full authorization and return the issued pair.
    async fn authorize(&self) -> Result<TokenPair, AuthorizationError>;
}

/// Authorization Code Flow orchestrator.
pub struct AuthorizationCodeFlow<E: TokenExchange, B: BrowserLauncher, P: ApprovalPrompt> {
    config: MonzoConfig,
    exchange: Arc<E>,
    session: Arc<Session>,
    browser: B,
    prompt: P,
}

impl<E: TokenExchange, B: BrowserLauncher, P: ApprovalPrompt> AuthorizationCodeFlow<E, B, P> {
    /// Create new Authorization Code Flow.
    pub fn new(
        config: MonzoConfig,
        exchange: Arc<E>,
        session: Arc<Session>,
        browser: B,
        prompt: P,
    ) -> Self {
        Self {
            config,
            exchange,
            session,
            browser,
            prompt,
        }
    }

    /// Build the consent page URL for one attempt.
    pub fn build_authorization_url(&self, state: &StateNonce) -> Result<Url, AuthorizationError> {
        let mut url = Url::parse(&self.config.provider.authorization_endpoint).map_err(|e| {
            AuthorizationError::InvalidUrl {
                message: e.to_string(),
            }
        })?;

        url.query_pairs_mut()
            .append_pair("client_id", &self.config.credentials.client_id)
            .append_pair("redirect_uri", &self.config.callback.redirect_uri)
            .append_pair("response_type", "code")
            .append_pair("state", state.as_str());

        Ok(url)
    }
}

#[async_trait]
impl<E, B, P> Authorizer for AuthorizationCodeFlow<E, B, P>
where
    E: TokenExchange,
    B: BrowserLauncher,
    P: ApprovalPrompt,
{
    async fn authorize(&self) -> Result<TokenPair, AuthorizationError> {
        let state = StateNonce::generate();
        let url = self.build_authorization_url(&state)?;

        println!("Please visit the following URL to authenticate: {url}");
        self.browser
            .open(url.as_str())
            .map_err(|e| AuthorizationError::BrowserLaunch {
                message: e.to_string(),
            })?;

        let listener =
            CallbackListener::bind(&self.config.callback, self.session.clone(), &state).await?;
        listener.run().await?;

        let code = self
            .session
            .take_pending_code()
            .ok_or(AuthorizationError::MissingCode)?;

        let tokens = self.exchange.exchange_authorization_code(&code).await?;
        self.session.set_tokens(tokens.clone()).await;

        self.prompt.wait_for_approval().await?;
        tracing::info!("authorization complete");

        Ok(tokens)
    }
}

/// Mock authorizer for testing. Results are returned in queue order.
#[derive(Default)]
pub struct MockAuthorizer {
    results: Mutex<VecDeque<Result<TokenPair, AuthorizationError>>>,
    calls: Mutex<usize>,
}

impl MockAuthorizer {
    /// Create new mock authorizer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful authorization.
    pub fn queue_tokens(&self, tokens: TokenPair) -> &Self {
        lock(&self.results).push_back(Ok(tokens));
        self
    }

    /// Queue a failed authorization.
    pub fn queue_error(&self, error: AuthorizationError) -> &Self {
        lock(&self.results).push_back(Err(error));
        self
    }

    /// Number of authorize calls.
    pub fn call_count(&self) -> usize {
        *lock(&self.calls)
    }
}

#[async_trait]
impl Authorizer for MockAuthorizer {
    async fn authorize(&self) -> Result<TokenPair, AuthorizationError> {
        *lock(&self.calls) += 1;
        lock(&self.results)
            .pop_front()
            .unwrap_or(Err(AuthorizationError::MissingCode))
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
