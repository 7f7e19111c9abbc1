use std::sync::Mutex;

use async_trait::async_trait;
use error_stack::Report;

use super::{EmailError, EmailService};
use crate::email::Email;

/// An email service that doesn't send emails, but does save the generated emails for later
/// checking.
#[derive(Default)]
pub struct TestEmailService {
    /// The emails that have been sent
    pub emails: Mutex<Vec<Email>>,
}

impl TestEmailService {
    /// Create a new TestEmailService
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EmailService for TestEmailService {
    async fn send(&self, email: Email) -> Result<(), Report<EmailError>> {
        self.emails
            .lock()
            .map_err(|_| Report::new(EmailError::Failed))?
            .push(email);
        Ok(())
    }
}
