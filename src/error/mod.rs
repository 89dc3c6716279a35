//! Error Types
//!
//! Error hierarchy for the Monzo session, token exchange and receipt upload.

use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;

/// Root error type.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("Credential store error: {0}")]
    Storage(#[from] StorageError),

    #[error("Stored credentials are corrupted: {0}")]
    Format(#[from] FormatError),

    #[error("Failed to authenticate: {0}")]
    Authorization(#[from] AuthorizationError),

    #[error("Token exchange failed: {0}")]
    Exchange(#[from] ExchangeError),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Payload error: {0}")]
    Payload(#[from] PayloadError),

    #[error("Upload error: {0}")]
    Upload(#[from] UploadError),
}

impl Error {
    /// Get error code for telemetry.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "MONZO_CONFIG",
            Self::Storage(_) => "MONZO_STORAGE",
            Self::Format(_) => "MONZO_FORMAT",
            Self::Authorization(_) => "MONZO_AUTH",
            Self::Exchange(_) => "MONZO_EXCHANGE",
            Self::Transport(_) => "MONZO_TRANSPORT",
            Self::Payload(_) => "MONZO_PAYLOAD",
            Self::Upload(_) => "MONZO_UPLOAD",
        }
    }

    /// Check if the stored session is unusable and the user has to sign in again.
    pub fn needs_reauth(&self) -> bool {
        match self {
            Self::Format(_) => true,
            Self::Transport(e) => e.needs_reauth(),
            Self::Upload(UploadError::Transport(e)) => e.needs_reauth(),
            _ => false,
        }
    }
}

/// Result type for fallible top-level operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Configuration error. Always raised before any network activity.
#[derive(Error, Debug)]
pub enum ConfigurationError {
    #[error("The Client ID and Client secret were not found in env vars (missing {name})")]
    MissingEnvVar { name: String },

    #[error("Missing required field: {field}")]
    MissingRequired { field: String },

    #[error("Invalid endpoint URL: {url}")]
    InvalidEndpoint { url: String },

    #[error("Invalid value for {name}: {value}")]
    InvalidValue { name: String, value: String },
}

/// Credential store error.
#[derive(Error, Debug)]
pub enum StorageError {
    /// No record exists yet. Expected on first run.
    #[error("No stored credentials for {service}/{key}")]
    NotFound { service: String, key: String },

    #[error("Read failed: {message}")]
    ReadFailed { message: String },

    #[error("Write failed: {message}")]
    WriteFailed { message: String },
}

impl StorageError {
    /// Check if this is the expected "no record yet" outcome.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Stored credential record could not be encoded or decoded.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum FormatError {
    #[error("unexpected token format: expected 2 parts, found {parts}")]
    InvalidPartCount { parts: usize },

    #[error("unexpected token format: empty {part} token")]
    EmptyPart { part: &'static str },

    #[error("token contains the record delimiter")]
    DelimiterCollision,
}

/// Authorization flow error.
#[derive(Error, Debug)]
pub enum AuthorizationError {
    #[error("Failed to bind callback listener on {addr}: {message}")]
    ListenerBind { addr: SocketAddr, message: String },

    #[error("Callback listener failed: {message}")]
    Listener { message: String },

    #[error("Failed to open browser: {message}")]
    BrowserLaunch { message: String },

    #[error("No callback received within {timeout:?}")]
    CallbackTimeout { timeout: Duration },

    #[error("no auth code provided")]
    MissingCode,

    #[error("Invalid authorization URL: {message}")]
    InvalidUrl { message: String },

    #[error("Failed to read approval confirmation: {message}")]
    Prompt { message: String },

    #[error(transparent)]
    Exchange(#[from] ExchangeError),
}

/// Token endpoint error.
#[derive(Error, Debug)]
pub enum ExchangeError {
    #[error("unexpected status code: {status}{}", .description.as_deref().map(|d| format!(" ({d})")).unwrap_or_default())]
    UnexpectedStatus {
        status: u16,
        description: Option<String>,
    },

    #[error("malformed token response: {message}")]
    MalformedResponse { message: String },

    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl ExchangeError {
    /// Check if the provider rejected the grant itself (bad/revoked token or client).
    pub fn is_rejected(&self) -> bool {
        matches!(self, Self::UnexpectedStatus { status: 400 | 401 | 403, .. })
    }
}

/// Network/transport error.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Connection failed: {message}")]
    ConnectionFailed { message: String },

    #[error("Request timeout after {timeout:?}")]
    Timeout { timeout: Duration },

    #[error("Invalid response: {message}")]
    InvalidResponse { message: String },

    #[error("No active session to authenticate the request")]
    NotAuthenticated,

    #[error("Still unauthorized after refreshing the session")]
    Unauthorized,

    #[error("Token refresh failed: {0}")]
    RefreshFailed(#[source] Box<ExchangeError>),

    #[error("Failed to persist refreshed tokens: {0}")]
    PersistFailed(#[source] StorageError),

    #[error("Failed to encode refreshed tokens: {0}")]
    Encode(#[from] FormatError),
}

impl TransportError {
    /// Check if error is retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ConnectionFailed { .. } | Self::Timeout { .. })
    }

    /// Check if the session can no longer be healed by refreshing.
    pub fn needs_reauth(&self) -> bool {
        match self {
            Self::Unauthorized | Self::NotAuthenticated => true,
            Self::RefreshFailed(e) => e.is_rejected(),
            _ => false,
        }
    }
}

/// Input payload error.
#[derive(Error, Debug)]
pub enum PayloadError {
    #[error("Failed to read {path}: {message}")]
    Read { path: String, message: String },

    #[error("Invalid JSON in {path}: {message}")]
    InvalidJson { path: String, message: String },
}

/// Receipt upload error.
#[derive(Error, Debug)]
pub enum UploadError {
    #[error("receipt {index}: unexpected status code: {status}")]
    UnexpectedStatus { index: usize, status: u16 },

    #[error("receipt {index}: failed to serialize: {message}")]
    Serialize { index: usize, message: String },

    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// OAuth2 error response from the token endpoint.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct OAuth2ErrorResponse {
    pub error: String,
    #[serde(default)]
    pub error_description: Option<String>,
}

/// Parse error response from HTTP body.
pub fn parse_error_response(body: &str) -> Option<OAuth2ErrorResponse> {
    serde_json::from_str(body).ok()
}

/// Create exchange error from a non-200 token endpoint response.
pub fn create_error_from_response(status: u16, body: &str) -> ExchangeError {
    let description = parse_error_response(body)
        .map(|response| response.error_description.unwrap_or(response.error));

    ExchangeError::UnexpectedStatus {
        status,
        description,
    }
}
