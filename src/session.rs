//! Session
//!
//! Live credential state for the process, shared by the authorization flow,
//! the callback listener and the resilient transport.

use std::sync::{Mutex, PoisonError};
use tokio::sync::MutexGuard;

use crate::error::Result;
use crate::flows::Authorizer;
use crate::token::{codec, CredentialStore};
use crate::types::TokenPair;

/// Process-local session.
///
/// The token pair sits behind one async lock so a refresh, the session
/// update and the store write can be done as a unit.
#[derive(Default)]
pub struct Session {
    tokens: tokio::sync::Mutex<Option<TokenPair>>,
    pending_code: Mutex<Option<String>>,
}

impl Session {
    /// Create an unauthenticated session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a session that already holds a pair.
    pub fn with_tokens(tokens: TokenPair) -> Self {
        Self {
            tokens: tokio::sync::Mutex::new(Some(tokens)),
            pending_code: Mutex::new(None),
        }
    }

    /// Snapshot of the current pair.
    pub async fn tokens(&self) -> Option<TokenPair> {
        self.tokens.lock().await.clone()
    }

    /// Current access token.
    pub async fn access_token(&self) -> Option<String> {
        self.tokens
            .lock()
            .await
            .as_ref()
            .map(|tokens| tokens.access_token().to_string())
    }

    /// Replace the pair.
    pub async fn set_tokens(&self, tokens: TokenPair) {
        *self.tokens.lock().await = Some(tokens);
    }

    pub(crate) async fn lock_tokens(&self) -> MutexGuard<'_, Option<TokenPair>> {
        self.tokens.lock().await
    }

    /// Record the code from a validated callback.
    ///
    /// Returns `false` and leaves the stored code alone if one is already pending.
    pub fn set_pending_code(&self, code: impl Into<String>) -> bool {
        let mut pending = self.pending_code();
        if pending.is_some() {
            return false;
        }
        *pending = Some(code.into());
        true
    }

    /// Take the pending code, clearing it.
    pub fn take_pending_code(&self) -> Option<String> {
        self.pending_code().take()
    }

    /// Check if a callback code is waiting to be exchanged.
    pub fn has_pending_code(&self) -> bool {
        self.pending_code().is_some()
    }

    fn pending_code(&self) -> std::sync::MutexGuard<'_, Option<String>> {
        self.pending_code
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("has_pending_code", &self.has_pending_code())
            .finish_non_exhaustive()
    }
}

/// Where the session's pair came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionOrigin {
    /// Decoded from the credential store.
    Cached,
    /// Issued by a fresh authorization and written to the store.
    Authorized,
}

/// Populate `session` from the credential store, running the authorization
/// flow on first use.
///
/// Only [`StorageError::NotFound`](crate::error::StorageError::NotFound) leads
/// to authorization; other store failures and corrupted records are returned.
pub async fn establish_session<S, A>(
    store: &S,
    session: &Session,
    authorizer: &A,
) -> Result<SessionOrigin>
where
    S: CredentialStore + ?Sized,
    A: Authorizer + ?Sized,
{
    match store.load().await {
        Ok(blob) => {
            let tokens = codec::decode(&blob)?;
            session.set_tokens(tokens).await;
            tracing::info!("using stored credentials");
            Ok(SessionOrigin::Cached)
        }
        Err(e) if e.is_not_found() => {
            tracing::info!("no stored credentials, starting authorization");
            let tokens = authorizer.authorize().await?;
            let blob = codec::encode(&tokens)?;
            store.save(&blob).await?;
            session.set_tokens(tokens).await;
            Ok(SessionOrigin::Authorized)
        }
        Err(e) => Err(e.into()),
    }
}
