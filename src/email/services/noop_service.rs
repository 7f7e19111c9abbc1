use async_trait::async_trait;
use error_stack::Report;
use tracing::{event, Level};

use super::{EmailError, EmailService};
use crate::email::Email;

/// An email service that logs emails instead of sending them. Useful when first setting up a
/// site, before a mail provider is configured.
pub struct NoopEmailService {}

#[async_trait]
impl EmailService for NoopEmailService {
    async fn send(&self, email: Email) -> Result<(), Report<EmailError>> {
        event!(Level::INFO, to=?email.to, subject=%email.subject, "Skipping email send");
        Ok(())
    }
}
