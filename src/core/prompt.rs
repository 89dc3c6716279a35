//! Approval Prompt
//!
//! Blocks until the user confirms the in-app approval step.

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use crate::error::AuthorizationError;

const APPROVAL_MESSAGE: &str = "Please open your Monzo app, click \"Allow access to your data\" for your application, and follow the instructions.\nOnce approved, press [Enter] to continue:\n";

/// Approval prompt interface (for dependency injection).
#[async_trait]
pub trait ApprovalPrompt: Send + Sync {
    /// Wait for the user to confirm the out-of-band approval.
    async fn wait_for_approval(&self) -> Result<(), AuthorizationError>;
}

/// Prompt on stdout, confirmation on stdin.
#[derive(Clone, Copy, Debug, Default)]
pub struct StdinApprovalPrompt;

#[async_trait]
impl ApprovalPrompt for StdinApprovalPrompt {
    async fn wait_for_approval(&self) -> Result<(), AuthorizationError> {
        let prompt_error = |e: std::io::Error| AuthorizationError::Prompt {
            message: e.to_string(),
        };

        let mut stdout = tokio::io::stdout();
        stdout
            .write_all(APPROVAL_MESSAGE.as_bytes())
            .await
            .map_err(prompt_error)?;
        stdout.flush().await.map_err(prompt_error)?;

        let mut line = String::new();
        BufReader::new(tokio::io::stdin())
            .read_line(&mut line)
            .await
            .map_err(prompt_error)?;

        Ok(())
    }
}
