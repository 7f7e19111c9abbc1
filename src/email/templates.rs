use error_stack::{Report, ResultExt};
use serde::Serialize;

use super::{services::EmailError, Email};

/// The HTML and Text content of an email
pub struct EmailContent {
    /// HTML content of the email
    pub html: String,
    /// Text content of the email
    pub text: String,
}

/// An Email Template
pub trait EmailTemplate {
    /// Generate a subject for the email
    fn subject(&self) -> String;

    /// Render plaintext and HTML for an email
    fn render(&self, renderer: &tera::Tera) -> Result<EmailContent, tera::Error>;

    /// Tags for this email
    fn tags(&self) -> Vec<String> {
        vec![]
    }

    /// Render an email from this template.
    fn into_email(
        &self,
        renderer: &tera::Tera,
        from: String,
        to: Vec<String>,
    ) -> Result<Email, Report<EmailError>> {
        let EmailContent { html, text } = self
            .render(renderer)
            .change_context(EmailError::Rendering)?;
        Ok(Email {
            from,
            to,
            subject: self.subject(),
            html,
            text,
            tags: self.tags(),
        })
    }
}

/// A helper function for [EmailTemplate] implementors to render a text and html template
pub fn render_template_pair(
    tera: &tera::Tera,
    data: &impl Serialize,
    html_path: &str,
    text_path: &str,
) -> Result<EmailContent, tera::Error> {
    let context = tera::Context::from_serialize(data)?;
    let html = tera.render(html_path, &context)?;
    let text = tera.render(text_path, &context)?;

    Ok(EmailContent { html, text })
}

/// Create a Tera instance from (name, source) pairs. Only `.html` and `.txt` templates are
/// loaded, and HTML templates are autoescaped.
pub fn create_templates<'a>(
    templates: impl IntoIterator<Item = (&'a str, &'a str)>,
) -> Result<tera::Tera, tera::Error> {
    let templates = templates
        .into_iter()
        .filter(|(name, _)| name.ends_with(".html") || name.ends_with(".txt"))
        .collect::<Vec<_>>();

    let mut tera = tera::Tera::default();
    tera.autoescape_on(vec![".html"]);
    tera.add_raw_templates(templates)?;

    Ok(tera)
}

#[cfg(test)]
mod test {
    use serde_json::json;

    use super::*;

    #[test]
    fn renders_pair() {
        let tera = create_templates([
            ("hello.html", "<p>Hello {{ name }}</p>"),
            ("hello.txt", "Hello {{ name }}"),
            ("README.md", "not a template"),
        ])
        .unwrap();

        let content =
            render_template_pair(&tera, &json!({ "name": "<Ada>" }), "hello.html", "hello.txt")
                .unwrap();
        assert_eq!(content.html, "<p>Hello &lt;Ada&gt;</p>");
        assert_eq!(content.text, "Hello <Ada>");
        assert!(tera.get_template_names().all(|name| name != "README.md"));
    }
}
