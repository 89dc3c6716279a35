//! Types
//!
//! Configuration, token, callback and receipt type definitions.

pub mod callback;
pub mod config;
pub mod receipt;
pub mod token;

pub use callback::*;
pub use config::*;
pub use receipt::*;
pub use token::*;
