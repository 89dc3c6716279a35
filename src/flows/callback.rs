//! Callback Listener
//!
//! Loopback HTTP listener that captures the authorization code from the
//! provider's redirect, then shuts itself down.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::{oneshot, watch};

use crate::core::StateNonce;
use crate::error::AuthorizationError;
use crate::session::Session;
use crate::types::{CallbackConfig, CallbackParams, CALLBACK_PATH};

/// Body returned to the browser once the code is captured.
pub const SUCCESS_MESSAGE: &str = "Authentication successful! You can now close this window.";

/// Listener lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ListenerPhase {
    /// Bound and accepting callbacks.
    Listening,
    /// Checking a callback's parameters.
    Validating,
    /// Code captured, answering the browser.
    Responding,
    /// Grace period over, draining connections.
    ShuttingDown,
    /// Server has exited.
    Stopped,
}

#[derive(Clone)]
struct ListenerState {
    expected_state: StateNonce,
    session: Arc<Session>,
    shutdown: Arc<Mutex<Option<oneshot::Sender<()>>>>,
    phase: Arc<watch::Sender<ListenerPhase>>,
    grace: Duration,
}

impl ListenerState {
    fn enter(&self, phase: ListenerPhase) {
        enter_phase(&self.phase, phase);
    }

    fn take_shutdown(&self) -> Option<oneshot::Sender<()>> {
        self.shutdown
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }
}

fn enter_phase(phase_tx: &watch::Sender<ListenerPhase>, phase: ListenerPhase) {
    tracing::debug!(?phase, "callback listener phase");
    phase_tx.send_replace(phase);
}

/// Bound callback listener for a single authorization attempt.
pub struct CallbackListener {
    listener: TcpListener,
    local_addr: SocketAddr,
    router: Router,
    shutdown_rx: oneshot::Receiver<()>,
    phase: Arc<watch::Sender<ListenerPhase>>,
    timeout: Option<Duration>,
}

impl CallbackListener {
    /// Bind the configured loopback address.
    ///
    /// A bind failure is final; no other port is tried.
    pub async fn bind(
        config: &CallbackConfig,
        session: Arc<Session>,
        expected_state: &StateNonce,
    ) -> Result<Self, AuthorizationError> {
        let bind_error = |e: std::io::Error| AuthorizationError::ListenerBind {
            addr: config.bind_addr,
            message: e.to_string(),
        };

        let listener = TcpListener::bind(config.bind_addr)
            .await
            .map_err(bind_error)?;
        let local_addr = listener.local_addr().map_err(bind_error)?;

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let (phase, _) = watch::channel(ListenerPhase::Listening);
        let phase = Arc::new(phase);

        let state = ListenerState {
            expected_state: expected_state.clone(),
            session,
            shutdown: Arc::new(Mutex::new(Some(shutdown_tx))),
            phase: phase.clone(),
            grace: config.shutdown_grace,
        };

        let router = Router::new()
            .route(CALLBACK_PATH, get(handle_callback))
            .with_state(state);

        tracing::info!(addr = %local_addr, "callback listener bound");

        Ok(Self {
            listener,
            local_addr,
            router,
            shutdown_rx,
            phase,
            timeout: config.timeout,
        })
    }

    /// Address actually bound.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Watch the listener's phase.
    pub fn subscribe(&self) -> watch::Receiver<ListenerPhase> {
        self.phase.subscribe()
    }

    /// Serve until a valid callback has been answered and the grace delay
    /// has elapsed, or until the configured timeout.
    pub async fn run(self) -> Result<(), AuthorizationError> {
        let Self {
            listener,
            router,
            shutdown_rx,
            phase,
            timeout,
            ..
        } = self;

        let shutdown_phase = phase.clone();
        let serve = axum::serve(listener, router).with_graceful_shutdown(async move {
            let _ = shutdown_rx.await;
            enter_phase(&shutdown_phase, ListenerPhase::ShuttingDown);
        });

        let result = match timeout {
            Some(timeout) => tokio::time::timeout(timeout, serve).await.map_err(|_| {
                tracing::warn!(?timeout, "no callback received");
                AuthorizationError::CallbackTimeout { timeout }
            })?,
            None => serve.await,
        };

        enter_phase(&phase, ListenerPhase::Stopped);
        result.map_err(|e| AuthorizationError::Listener {
            message: e.to_string(),
        })
    }
}

async fn handle_callback(
    State(state): State<ListenerState>,
    Query(params): Query<CallbackParams>,
) -> (StatusCode, &'static str) {
    state.enter(ListenerPhase::Validating);

    let code = match params.validate(&state.expected_state) {
        Ok(code) => code,
        Err(rejection) => {
            tracing::warn!(reason = rejection.message(), "rejected callback");
            state.enter(ListenerPhase::Listening);
            return (StatusCode::BAD_REQUEST, rejection.message());
        }
    };

    state.enter(ListenerPhase::Responding);

    // First valid callback wins; later ones get the same answer.
    if let Some(shutdown_tx) = state.take_shutdown() {
        state.session.set_pending_code(code);
        tracing::info!("authorization code received");

        let grace = state.grace;
        tokio::spawn(async move {
            tokio::time::sleep(grace).await;
            let _ = shutdown_tx.send(());
        });
    }

    (StatusCode::OK, SUCCESS_MESSAGE)
}
