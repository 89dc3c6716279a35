//! Configuration Builder
//!
//! Fluent builder for the Monzo client configuration.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigurationError;
use crate::types::{
    CallbackConfig, ClientCredentials, KeyringConfig, MonzoConfig, ProviderConfig,
    CALLBACK_TIMEOUT_ENV, CLIENT_ID_ENV, CLIENT_SECRET_ENV, DEFAULT_PAYLOAD_PATH, DEFAULT_TIMEOUT,
};
use secrecy::SecretString;

/// Monzo configuration builder.
#[derive(Default)]
pub struct MonzoConfigBuilder {
    client_id: Option<String>,
    client_secret: Option<SecretString>,
    provider: ProviderConfig,
    callback: CallbackConfig,
    keyring: KeyringConfig,
    timeout: Option<Duration>,
    payload_path: Option<PathBuf>,
}

impl MonzoConfigBuilder {
    /// Create new configuration builder with the production defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder seeded from the process environment.
    pub fn from_env() -> Result<Self, ConfigurationError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builder seeded from an arbitrary variable lookup.
    ///
    /// Empty values count as missing.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigurationError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let client_id = read(CLIENT_ID_ENV).ok_or_else(|| ConfigurationError::MissingEnvVar {
            name: CLIENT_ID_ENV.to_string(),
        })?;
        let client_secret =
            read(CLIENT_SECRET_ENV).ok_or_else(|| ConfigurationError::MissingEnvVar {
                name: CLIENT_SECRET_ENV.to_string(),
            })?;

        let mut builder = Self::new().client_id(client_id).client_secret(client_secret);

        if let Some(raw) = read(CALLBACK_TIMEOUT_ENV) {
            let secs: u64 = raw
                .trim()
                .parse()
                .map_err(|_| ConfigurationError::InvalidValue {
                    name: CALLBACK_TIMEOUT_ENV.to_string(),
                    value: raw.clone(),
                })?;
            builder = builder.callback_timeout(Duration::from_secs(secs));
        }

        Ok(builder)
    }

    /// Set client ID.
    pub fn client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self
    }

    /// Set client secret.
    pub fn client_secret(mut self, client_secret: impl Into<String>) -> Self {
        self.client_secret = Some(SecretString::new(client_secret.into()));
        self
    }

    /// Set authorization endpoint.
    pub fn authorization_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.provider.authorization_endpoint = endpoint.into();
        self
    }

    /// Set token endpoint.
    pub fn token_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.provider.token_endpoint = endpoint.into();
        self
    }

    /// Set API base URL.
    pub fn api_base_url(mut self, url: impl Into<String>) -> Self {
        self.provider.api_base_url = url.into();
        self
    }

    /// Set callback listener settings.
    pub fn callback(mut self, callback: CallbackConfig) -> Self {
        self.callback = callback;
        self
    }

    /// Bound the wait for the browser callback.
    pub fn callback_timeout(mut self, timeout: Duration) -> Self {
        self.callback.timeout = Some(timeout);
        self
    }

    /// Set keychain record location.
    pub fn keyring(mut self, service: impl Into<String>, key: impl Into<String>) -> Self {
        self.keyring = KeyringConfig {
            service: service.into(),
            key: key.into(),
        };
        self
    }

    /// Set request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set receipts payload path.
    pub fn payload_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.payload_path = Some(path.into());
        self
    }

    /// Build the configuration.
    pub fn build(self) -> Result<MonzoConfig, ConfigurationError> {
        let client_id = self
            .client_id
            .ok_or_else(|| ConfigurationError::MissingRequired {
                field: "client_id".to_string(),
            })?;

        let client_secret =
            self.client_secret
                .ok_or_else(|| ConfigurationError::MissingRequired {
                    field: "client_secret".to_string(),
                })?;

        for endpoint in [
            &self.provider.authorization_endpoint,
            &self.provider.token_endpoint,
            &self.provider.api_base_url,
        ] {
            url::Url::parse(endpoint).map_err(|_| ConfigurationError::InvalidEndpoint {
                url: endpoint.clone(),
            })?;
        }

        Ok(MonzoConfig {
            provider: self.provider,
            credentials: ClientCredentials {
                client_id,
                client_secret,
            },
            callback: self.callback,
            keyring: self.keyring,
            timeout: self.timeout.unwrap_or(DEFAULT_TIMEOUT),
            payload_path: self
                .payload_path
                .unwrap_or_else(|| PathBuf::from(DEFAULT_PAYLOAD_PATH)),
        })
    }
}

/// Create a new configuration builder.
pub fn monzo_config() -> MonzoConfigBuilder {
    MonzoConfigBuilder::new()
}
