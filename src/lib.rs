//! Monzo Receipts
//!
//! Single-user OAuth2 session for the Monzo API and a receipt uploader built
//! on top of it.
//!
//! # Features
//!
//! - Authorization Code Flow with a loopback callback listener
//! - OS keychain credential storage
//! - Transparent refresh-once on 401 with persisted token rotation
//! - Transaction receipt upload
//!
//! # Example
//!
//! ```rust,ignore
//! use monzo_receipts::{monzo_config, App};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = monzo_config()
//!         .client_id("oauth2client_00009")
//!         .client_secret("mnzconf.secret")
//!         .payload_path("payload.json")
//!         .build()?;
//!
//!     let uploaded = App::from_config(config).run().await?;
//!     println!("{uploaded} receipts uploaded");
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - `types`: configuration, token, callback and receipt types
//! - `error`: error hierarchy
//! - `core`: HTTP transport, state nonce, browser launch, approval prompt
//! - `token`: credential storage, record codec, token exchange
//! - `flows`: authorization code flow and callback listener
//! - `session`: live credential state and startup session establishment
//! - `client`: resilient authenticated transport
//! - `receipts`: payload loading and upload
//! - `builders`: fluent configuration builder
//! - `telemetry`: logging setup

pub mod app;
pub mod builders;
pub mod client;
pub mod core;
pub mod error;
pub mod flows;
pub mod receipts;
pub mod session;
pub mod telemetry;
pub mod token;
pub mod types;

// Re-export application entry points
pub use app::{run, App};

// Re-export builders
pub use builders::{monzo_config, MonzoConfigBuilder};

// Re-export resilient transport
pub use client::ResilientTransport;

// Re-export core components
pub use crate::core::{
    ApprovalPrompt, BrowserLauncher, HttpMethod, HttpRequest, HttpResponse, HttpTransport,
    MockHttpTransport, ReqwestHttpTransport, StateNonce, StdinApprovalPrompt, SystemBrowser,
};

// Re-export errors
pub use error::{
    AuthorizationError, ConfigurationError, Error, ExchangeError, FormatError, PayloadError,
    Result, StorageError, TransportError, UploadError,
};

// Re-export flows
pub use flows::{AuthorizationCodeFlow, Authorizer, CallbackListener, ListenerPhase};

// Re-export receipts
pub use receipts::{load_receipts, ReceiptUploader};

// Re-export session
pub use session::{establish_session, Session, SessionOrigin};

// Re-export token management
pub use token::{
    CredentialStore, InMemoryCredentialStore, KeyringCredentialStore, MockCredentialStore,
    MockTokenExchange, TokenExchange, TokenExchangeClient,
};

// Re-export types
pub use types::{
    CallbackConfig, KeyringConfig, MonzoConfig, ProviderConfig, Receipt, TokenPair,
    TokenResponse,
};
