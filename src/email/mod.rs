use std::sync::Arc;

use error_stack::Report;
use typed_builder::TypedBuilder;

use self::{
    services::{EmailError, EmailService},
    templates::EmailTemplate,
};

/// Email sending services
pub mod services;
/// Rendering email bodies from templates
pub mod templates;

/// An email to be sent
#[derive(Debug, Default, Clone, TypedBuilder)]
#[builder(doc, field_defaults(default))]
pub struct Email {
    /// Sender of the email
    #[builder(setter(into))]
    pub from: String,
    /// Recipients of the email
    #[builder(!default, setter(into))]
    pub to: Vec<String>,
    /// Subject of the email
    #[builder(!default, setter(into))]
    pub subject: String,
    /// Plain text content of the email
    #[builder(setter(into))]
    pub text: String,
    /// HTML content of the email
    #[builder(setter(into))]
    pub html: String,
    /// Tags for this email, for those services that support them.
    pub tags: Vec<String>,
}

/// Renders templated emails and sends them through an [EmailService].
pub struct EmailSender {
    /// The default From address
    pub from: String,
    /// Templates available to [EmailTemplate] implementations
    pub templates: Arc<tera::Tera>,
    service: Arc<dyn EmailService>,
}

impl EmailSender {
    pub fn new(from: String, templates: Arc<tera::Tera>, service: Arc<dyn EmailService>) -> Self {
        Self {
            from,
            templates,
            service,
        }
    }

    /// Render `template` and send it to all of `to` as one email.
    pub async fn send_template(
        &self,
        to: Vec<String>,
        template: &(impl EmailTemplate + Sync),
    ) -> Result<(), Report<EmailError>> {
        let email = template.into_email(&self.templates, self.from.clone(), to)?;
        self.send(email).await
    }

    /// Send an email
    pub async fn send(&self, email: Email) -> Result<(), Report<EmailError>> {
        self.service.send(email).await
    }
}
