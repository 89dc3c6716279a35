//! State Nonce
//!
//! Anti-forgery `state` parameter for one authorization attempt.

use base64::Engine;
use rand::Rng;

/// Single-use state value bound to one authorization attempt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StateNonce(String);

impl StateNonce {
    /// Generate a fresh nonce from 32 random bytes.
    pub fn generate() -> Self {
        let mut rng = rand::thread_rng();
        let bytes: [u8; 32] = rng.gen();
        Self(base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes))
    }

    /// Wrap a known value.
    pub fn from_value(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Check a received value, ignoring surrounding whitespace.
    pub fn matches(&self, received: &str) -> bool {
        received.trim() == self.0
    }
}

impl std::fmt::Display for StateNonce {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
