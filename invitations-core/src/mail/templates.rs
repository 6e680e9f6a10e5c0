use tera::{Context, Tera};

use super::{MailContext, MailError};

pub const INVITE_TEMPLATE_PREFIX: &str = "invitations/email/email_invite";
pub const DEFAULT_HTML_TEMPLATE: &str = "invitations/email/email_invite_message.html";

const INVITE_SUBJECT: &str = "Invitation to join {{ site_name }}";

const INVITE_MESSAGE_TXT: &str = "Hello,

You ({{ email }}) have been invited to join {{ site_name }}

If you'd like to join, please go to {{ invite_url }}
";

const INVITE_MESSAGE_HTML: &str = r#"<p>Hello,</p>

<p>You ({{ email }}) have been invited to join {{ site_name }}</p>

<p>If you'd like to join, please go to <a href="{{ invite_url | safe }}">{{ invite_url | safe }}</a></p>
"#;

/// A rendered message, ready for delivery.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedMail {
    pub subject: String,
    pub text: String,
    pub html: Option<String>,
}

/// Tera-backed renderer preloaded with the invitation templates.
#[derive(Clone)]
pub struct TemplateRenderer {
    tera: Tera,
}

impl TemplateRenderer {
    pub fn new() -> Result<Self, MailError> {
        let mut tera = Tera::default();
        tera.add_raw_templates(vec![
            (format!("{}_subject.txt", INVITE_TEMPLATE_PREFIX), INVITE_SUBJECT),
            (format!("{}_message.txt", INVITE_TEMPLATE_PREFIX), INVITE_MESSAGE_TXT),
            (DEFAULT_HTML_TEMPLATE.to_string(), INVITE_MESSAGE_HTML),
        ])
        .map_err(|e| MailError::Template(e.to_string()))?;
        Ok(Self { tera })
    }

    /// Register or replace a template under `name`.
    pub fn add_template(&mut self, name: &str, content: &str) -> Result<(), MailError> {
        self.tera
            .add_raw_template(name, content)
            .map_err(|e| MailError::Template(format!("{}: {}", name, e)))
    }

    pub fn has_template(&self, name: &str) -> bool {
        self.tera.get_template_names().any(|n| n == name)
    }

    pub fn render(&self, name: &str, context: &MailContext) -> Result<String, MailError> {
        let mut ctx = Context::new();
        for (k, v) in context {
            ctx.insert(k.as_str(), v);
        }
        self.tera
            .render(name, &ctx)
            .map_err(|e| MailError::Template(format!("{}: {}", name, e)))
    }

    /// Subject and plain body are required, the html body is optional.
    pub fn render_mail(
        &self,
        template_prefix: &str,
        context: &MailContext,
    ) -> Result<RenderedMail, MailError> {
        let subject = self.render(&format!("{}_subject.txt", template_prefix), context)?;
        let text = self.render(&format!("{}_message.txt", template_prefix), context)?;
        let html_name = format!("{}_message.html", template_prefix);
        let html = if self.has_template(&html_name) {
            Some(self.render(&html_name, context)?)
        } else {
            None
        };
        Ok(RenderedMail {
            subject: format_subject(&subject),
            text,
            html,
        })
    }
}

/// Subjects must be a single line.
fn format_subject(subject: &str) -> String {
    subject
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::{format_subject, TemplateRenderer, DEFAULT_HTML_TEMPLATE, INVITE_TEMPLATE_PREFIX};
    use crate::mail::MailContext;

    fn context() -> MailContext {
        let mut ctx = MailContext::new();
        ctx.insert("email".to_string(), "guest@example.com".to_string());
        ctx.insert("site_name".to_string(), "Example & Co".to_string());
        ctx.insert(
            "invite_url".to_string(),
            "https://example.com/invitations/accept-invite/abc/".to_string(),
        );
        ctx.insert("key".to_string(), "abc".to_string());
        ctx
    }

    #[test]
    pub fn test_render_invite_mail() {
        let renderer = TemplateRenderer::new().unwrap();
        let mail = renderer
            .render_mail(INVITE_TEMPLATE_PREFIX, &context())
            .unwrap();
        assert_eq!("Invitation to join Example & Co", mail.subject);
        assert!(mail.text.contains("guest@example.com"));
        assert!(mail
            .text
            .contains("https://example.com/invitations/accept-invite/abc/"));
        assert!(mail.html.is_some());
    }

    #[test]
    pub fn test_html_escapes_but_keeps_url() {
        let renderer = TemplateRenderer::new().unwrap();
        let html = renderer.render(DEFAULT_HTML_TEMPLATE, &context()).unwrap();
        assert!(html.contains("Example &amp; Co"));
        assert!(html.contains("href=\"https://example.com/invitations/accept-invite/abc/\""));
    }

    #[test]
    pub fn test_override_template() {
        let mut renderer = TemplateRenderer::new().unwrap();
        renderer
            .add_template("custom.txt", "Join via {{ key }}")
            .unwrap();
        assert_eq!("Join via abc", renderer.render("custom.txt", &context()).unwrap());
    }

    #[test]
    pub fn test_missing_template_is_an_error() {
        let renderer = TemplateRenderer::new().unwrap();
        assert!(renderer.render("nope.txt", &context()).is_err());
    }

    #[test]
    pub fn test_subject_is_one_line() {
        assert_eq!("Join us today", format_subject("\n Join us\ntoday \n"));
    }
}
