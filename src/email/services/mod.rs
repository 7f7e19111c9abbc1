mod noop_service;
mod test_service;

use async_trait::async_trait;
use error_stack::Report;
pub use noop_service::*;
pub use test_service::*;
use thiserror::Error;

use super::Email;

/// Errors returned from an [EmailService]
#[derive(Debug, Error)]
pub enum EmailError {
    /// Email failed to send, without more detail
    #[error("Generic failure")]
    Failed,
    /// The email template failed to render
    #[error("Failed to render email")]
    Rendering,
}

/// A service that can send an email
#[async_trait]
pub trait EmailService: Send + Sync {
    /// Send an email
    async fn send(&self, email: Email) -> Result<(), Report<EmailError>>;
}
