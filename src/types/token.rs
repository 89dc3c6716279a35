//! Token Types
//!
//! The live credential pair and the token endpoint response.

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

/// Token response from the provider's token endpoint.
///
/// All three fields are required strings; a body missing any of them, or
/// carrying one with the wrong type, fails to decode.
#[derive(Clone, Deserialize)]
pub struct TokenResponse {
    /// Access token.
    pub access_token: String,
    /// Refresh token.
    pub refresh_token: String,
    /// Monzo user identifier. Checked for presence only.
    pub user_id: String,
}

impl std::fmt::Debug for TokenResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenResponse")
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .field("user_id", &self.user_id)
            .finish()
    }
}

/// Access and refresh token, always replaced together.
#[derive(Clone)]
pub struct TokenPair {
    access_token: SecretString,
    refresh_token: SecretString,
}

impl TokenPair {
    /// Create new token pair.
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: SecretString::new(access_token.into()),
            refresh_token: SecretString::new(refresh_token.into()),
        }
    }

    /// Access token value (for the Authorization header).
    pub fn access_token(&self) -> &str {
        self.access_token.expose_secret()
    }

    /// Refresh token value.
    pub fn refresh_token(&self) -> &str {
        self.refresh_token.expose_secret()
    }
}

impl From<TokenResponse> for TokenPair {
    fn from(response: TokenResponse) -> Self {
        Self::new(response.access_token, response.refresh_token)
    }
}

impl PartialEq for TokenPair {
    fn eq(&self, other: &Self) -> bool {
        self.access_token() == other.access_token()
            && self.refresh_token() == other.refresh_token()
    }
}

impl Eq for TokenPair {}

impl std::fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenPair")
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .finish()
    }
}
