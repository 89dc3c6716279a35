//! Authorization Flows
//!
//! The browser-based authorization code flow and its loopback callback listener.

pub mod authorization_code;
pub mod callback;

pub use authorization_code::{AuthorizationCodeFlow, Authorizer, MockAuthorizer};
pub use callback::{CallbackListener, ListenerPhase, SUCCESS_MESSAGE};
