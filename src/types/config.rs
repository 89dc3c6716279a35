//! Configuration Types
//!
//! Monzo client configuration types and fixed defaults.

use secrecy::SecretString;
use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

/// Browser-facing authorization endpoint.
pub const DEFAULT_AUTHORIZATION_ENDPOINT: &str = "https://auth.monzo.com";
/// Machine-facing token endpoint.
pub const DEFAULT_TOKEN_ENDPOINT: &str = "https://api.monzo.com/oauth2/token";
/// Base URL of the Monzo API.
pub const DEFAULT_API_BASE_URL: &str = "https://api.monzo.com";

/// Loopback port the callback listener binds to.
pub const DEFAULT_CALLBACK_PORT: u16 = 21234;
/// Path the provider redirects to.
pub const CALLBACK_PATH: &str = "/callback";

/// Bounded timeout for every outbound HTTP call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
/// Delay between answering the callback and stopping the listener.
pub const DEFAULT_SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

/// Keychain service the token record lives under.
pub const DEFAULT_KEYRING_SERVICE: &str = "monzo-access-token";
/// Keychain record key.
pub const DEFAULT_KEYRING_KEY: &str = "tokens";

/// Receipts file read at startup.
pub const DEFAULT_PAYLOAD_PATH: &str = "payload.json";

/// Environment variable holding the OAuth client identifier.
pub const CLIENT_ID_ENV: &str = "MONZO_CLIENT_ID";
/// Environment variable holding the OAuth client secret.
pub const CLIENT_SECRET_ENV: &str = "MONZO_CLIENT_SECRET";
/// Optional overall wait for the browser callback, in seconds.
pub const CALLBACK_TIMEOUT_ENV: &str = "MONZO_CALLBACK_TIMEOUT_SECS";

/// Fully resolved client configuration.
#[derive(Clone, Debug)]
pub struct MonzoConfig {
    /// Provider endpoints.
    pub provider: ProviderConfig,
    /// Client credentials.
    pub credentials: ClientCredentials,
    /// Callback listener settings.
    pub callback: CallbackConfig,
    /// Credential store location.
    pub keyring: KeyringConfig,
    /// HTTP timeout.
    pub timeout: Duration,
    /// Receipts payload file.
    pub payload_path: PathBuf,
}

/// Provider endpoint configuration.
#[derive(Clone, Debug)]
pub struct ProviderConfig {
    /// Authorization endpoint URL.
    pub authorization_endpoint: String,
    /// Token endpoint URL.
    pub token_endpoint: String,
    /// API base URL.
    pub api_base_url: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            authorization_endpoint: DEFAULT_AUTHORIZATION_ENDPOINT.to_string(),
            token_endpoint: DEFAULT_TOKEN_ENDPOINT.to_string(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
        }
    }
}

/// Client credentials, read from the environment.
#[derive(Clone)]
pub struct ClientCredentials {
    /// Client identifier.
    pub client_id: String,
    /// Client secret.
    pub client_secret: SecretString,
}

impl std::fmt::Debug for ClientCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .finish()
    }
}

/// Local redirect-capture listener settings.
#[derive(Clone, Debug)]
pub struct CallbackConfig {
    /// Address the listener binds to.
    pub bind_addr: SocketAddr,
    /// Redirect URI registered with the provider.
    pub redirect_uri: String,
    /// Delay before the listener stops after a successful callback.
    pub shutdown_grace: Duration,
    /// Overall wait for the callback. `None` waits indefinitely.
    pub timeout: Option<Duration>,
}

impl CallbackConfig {
    /// Listener on the given loopback port with the matching redirect URI.
    pub fn on_port(port: u16) -> Self {
        let bind_addr = SocketAddr::from((Ipv4Addr::LOCALHOST, port));
        Self {
            bind_addr,
            redirect_uri: redirect_uri_for(bind_addr),
            shutdown_grace: DEFAULT_SHUTDOWN_GRACE,
            timeout: None,
        }
    }
}

impl Default for CallbackConfig {
    fn default() -> Self {
        Self::on_port(DEFAULT_CALLBACK_PORT)
    }
}

/// Build the redirect URI served by a listener bound to `addr`.
pub fn redirect_uri_for(addr: SocketAddr) -> String {
    format!("http://{}{}", addr, CALLBACK_PATH)
}

/// OS keychain record location.
#[derive(Clone, Debug)]
pub struct KeyringConfig {
    /// Service name.
    pub service: String,
    /// Record key.
    pub key: String,
}

impl Default for KeyringConfig {
    fn default() -> Self {
        Self {
            service: DEFAULT_KEYRING_SERVICE.to_string(),
            key: DEFAULT_KEYRING_KEY.to_string(),
        }
    }
}
