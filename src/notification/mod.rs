mod recipients;

use std::sync::Arc;

use async_trait::async_trait;
pub use recipients::*;
use error_stack::{Report, ResultExt};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::instrument;

use crate::{
    email::{
        templates::{render_template_pair, EmailContent, EmailTemplate},
        EmailSender,
    },
    event_log::UserRef,
    requests::RequestContext,
};

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Failed to read notice settings")]
    Settings,
    #[error("Failed to send notice")]
    Send,
}

/// Identifies which notice is being sent. Each notice type may have its own templates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NoticeType(String);

impl NoticeType {
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for NoticeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Data passed to notice templates
#[derive(Debug, Clone, Serialize)]
pub struct NoticeContext {
    /// The saved object
    pub object: serde_json::Value,
    pub object_name: String,
    pub object_repr: String,
    /// The user who saved the object
    pub user: UserRef,
    pub request: RequestContext,
}

/// Delivers notices to a list of recipients.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_emails(
        &self,
        recipients: &[String],
        notice_type: &NoticeType,
        context: &NoticeContext,
    ) -> Result<(), Report<NotifyError>>;
}

/// Templates used for notice types that don't register their own.
pub const DEFAULT_NOTICE_TEMPLATES: &[(&str, &str)] = &[
    (
        "notices/default.html",
        r#"<p>{{ object_name }} <strong>{{ object_repr }}</strong> was saved by {{ user.username }}.</p>
{% if request.path %}<p>Request: {{ request.method }} {{ request.path }}</p>{% endif %}"#,
    ),
    (
        "notices/default.txt",
        r#"{{ object_name }} "{{ object_repr }}" was saved by {{ user.username }}.
{% if request.path %}Request: {{ request.method }} {{ request.path }}{% endif %}"#,
    ),
];

struct NoticeEmail<'a> {
    notice_type: &'a NoticeType,
    context: &'a NoticeContext,
}

impl NoticeEmail<'_> {
    fn template_base(&self, renderer: &tera::Tera) -> String {
        let custom = format!("notices/{}", self.notice_type);
        let has_custom = renderer
            .get_template_names()
            .any(|name| name == format!("{custom}.html"));
        if has_custom {
            custom
        } else {
            "notices/default".to_string()
        }
    }
}

impl EmailTemplate for NoticeEmail<'_> {
    fn subject(&self) -> String {
        format!(
            "[{}] {} \"{}\"",
            self.notice_type, self.context.object_name, self.context.object_repr
        )
    }

    fn render(&self, renderer: &tera::Tera) -> Result<EmailContent, tera::Error> {
        let base = self.template_base(renderer);
        render_template_pair(
            renderer,
            self.context,
            &format!("{base}.html"),
            &format!("{base}.txt"),
        )
    }

    fn tags(&self) -> Vec<String> {
        vec![self.notice_type.to_string()]
    }
}

/// A [Notifier] that emails all recipients in one message.
pub struct EmailNotifier {
    sender: Arc<EmailSender>,
}

impl EmailNotifier {
    pub fn new(sender: Arc<EmailSender>) -> Self {
        Self { sender }
    }
}

#[async_trait]
impl Notifier for EmailNotifier {
    #[instrument(skip(self, context), fields(object = %context.object_repr))]
    async fn send_emails(
        &self,
        recipients: &[String],
        notice_type: &NoticeType,
        context: &NoticeContext,
    ) -> Result<(), Report<NotifyError>> {
        let template = NoticeEmail {
            notice_type,
            context,
        };

        self.sender
            .send_template(recipients.to_vec(), &template)
            .await
            .change_context(NotifyError::Send)
    }
}
