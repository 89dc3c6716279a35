//! Resilient Transport
//!
//! Authenticated HTTP transport that heals an expired session by refreshing
//! once and replaying the request.

use async_trait::async_trait;
use std::sync::Arc;

use crate::core::{HttpRequest, HttpResponse, HttpTransport};
use crate::error::TransportError;
use crate::session::Session;
use crate::token::{codec, CredentialStore, TokenExchange};

/// Decorator over an [`HttpTransport`] that attaches the session's bearer
/// credential and refreshes it on a 401.
///
/// At most two requests go out per call: the first attempt and one replay.
pub struct ResilientTransport<T, E, S>
where
    T: HttpTransport,
    E: TokenExchange,
    S: CredentialStore,
{
    inner: Arc<T>,
    exchange: Arc<E>,
    store: Arc<S>,
    session: Arc<Session>,
}

impl<T, E, S> ResilientTransport<T, E, S>
where
    T: HttpTransport,
    E: TokenExchange,
    S: CredentialStore,
{
    /// Create new resilient transport.
    pub fn new(inner: Arc<T>, exchange: Arc<E>, store: Arc<S>, session: Arc<Session>) -> Self {
        Self {
            inner,
            exchange,
            store,
            session,
        }
    }

    /// Shared session.
    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    /// Refresh the session and return the access token to replay with.
    ///
    /// `stale` is the session token the rejected request carried. When the
    /// session has moved on since, another caller already refreshed and its
    /// pair is reused. A caller-supplied bearer passes `None` and always
    /// refreshes. The session lock is held across the exchange and the store
    /// write.
    async fn refresh(&self, stale: Option<&str>) -> Result<String, TransportError> {
        let mut guard = self.session.lock_tokens().await;
        let current = guard.as_ref().ok_or(TransportError::NotAuthenticated)?;

        if stale.is_some_and(|stale| current.access_token() != stale) {
            tracing::debug!("session already refreshed by a concurrent request");
            return Ok(current.access_token().to_string());
        }

        let tokens = self
            .exchange
            .exchange_refresh_token(current.refresh_token())
            .await
            .map_err(|e| TransportError::RefreshFailed(Box::new(e)))?;

        let access = tokens.access_token().to_string();
        let blob = codec::encode(&tokens);
        *guard = Some(tokens);
        let blob = blob?;

        self.store
            .save(&blob)
            .await
            .map_err(TransportError::PersistFailed)?;

        tracing::info!("access token refreshed");
        Ok(access)
    }
}

#[async_trait]
impl<T, E, S> HttpTransport for ResilientTransport<T, E, S>
where
    T: HttpTransport,
    E: TokenExchange,
    S: CredentialStore,
{
    async fn send(&self, mut request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let attached = if request.bearer_token().is_some() {
            None
        } else {
            let access = self
                .session
                .access_token()
                .await
                .ok_or(TransportError::NotAuthenticated)?;
            request.set_bearer_token(&access);
            Some(access)
        };

        let replay = request.clone();

        let response = self.inner.send(request).await?;
        if !response.is_unauthorized() {
            return Ok(response);
        }

        tracing::warn!(url = %replay.url, "request unauthorized, refreshing session");
        let access = self.refresh(attached.as_deref()).await?;

        let mut replay = replay;
        replay.set_bearer_token(&access);
        self.inner.send(replay).await
    }
}
