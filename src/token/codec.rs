//! Token Codec
//!
//! Encodes the token pair into the single string kept in the credential store.

use crate::error::FormatError;
use crate::types::TokenPair;

/// Separator between the access and refresh token.
pub const DELIMITER: &str = "::";

/// Encode a token pair as `access::refresh`.
///
/// Fails rather than writing a record that would not decode back to the same pair.
pub fn encode(tokens: &TokenPair) -> Result<String, FormatError> {
    let (access, refresh) = (tokens.access_token(), tokens.refresh_token());
    check_non_empty(access, refresh)?;

    let blob = format!("{access}{DELIMITER}{refresh}");
    match blob.split_once(DELIMITER) {
        Some((a, r)) if a == access && r == refresh && !r.contains(DELIMITER) => Ok(blob),
        _ => Err(FormatError::DelimiterCollision),
    }
}

/// Decode a stored record into its token pair.
pub fn decode(blob: &str) -> Result<TokenPair, FormatError> {
    let parts: Vec<&str> = blob.split(DELIMITER).collect();
    if parts.len() != 2 {
        return Err(FormatError::InvalidPartCount { parts: parts.len() });
    }

    check_non_empty(parts[0], parts[1])?;
    Ok(TokenPair::new(parts[0], parts[1]))
}

fn check_non_empty(access: &str, refresh: &str) -> Result<(), FormatError> {
    if access.is_empty() {
        return Err(FormatError::EmptyPart { part: "access" });
    }
    if refresh.is_empty() {
        return Err(FormatError::EmptyPart { part: "refresh" });
    }
    Ok(())
}
