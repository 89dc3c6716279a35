//! Token Management
//!
//! Credential storage, the stored record format, and the token endpoint client.

pub mod codec;
pub mod exchange;
pub mod storage;

// Credential Storage
pub use storage::{
    CredentialStore, InMemoryCredentialStore, KeyringCredentialStore, MockCredentialStore,
};

// Token Exchange
pub use exchange::{
    parse_token_response, ExchangeCall, MockTokenExchange, TokenExchange, TokenExchangeClient,
};
