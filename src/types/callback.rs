//! Callback Types
//!
//! Query parameters carried by the provider's redirect and their validation.

use serde::Deserialize;

use crate::core::StateNonce;

/// Callback parameters from the authorization redirect.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct CallbackParams {
    /// Authorization code.
    #[serde(default)]
    pub code: Option<String>,
    /// State parameter.
    #[serde(default)]
    pub state: Option<String>,
}

/// Reason a callback request was turned away.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CallbackRejection {
    MissingCode,
    MissingState,
    StateMismatch,
}

impl CallbackRejection {
    /// Body sent back to the browser. Never echoes the received or expected state.
    pub fn message(&self) -> &'static str {
        match self {
            Self::MissingCode => "cannot find temporary auth code in callback URL",
            Self::MissingState => "cannot find randomised auth state in callback URL",
            Self::StateMismatch => "invalid randomised auth state in callback URL",
        }
    }
}

impl CallbackParams {
    /// Check the callback against the nonce issued for this attempt and
    /// return the authorization code.
    ///
    /// Presence is checked before content: an empty `code=` is present.
    pub fn validate(&self, expected_state: &StateNonce) -> Result<&str, CallbackRejection> {
        let code = self.code.as_deref().ok_or(CallbackRejection::MissingCode)?;
        let state = self.state.as_deref().ok_or(CallbackRejection::MissingState)?;

        if !expected_state.matches(state) {
            return Err(CallbackRejection::StateMismatch);
        }

        Ok(code)
    }
}
