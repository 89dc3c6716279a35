//! Core Components
//!
//! Core infrastructure: HTTP transport, state nonce, browser launch and user prompt.

pub mod browser;
pub mod prompt;
pub mod state;
pub mod transport;

pub use browser::*;
pub use prompt::*;
pub use state::*;
pub use transport::*;
