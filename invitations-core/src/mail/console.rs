use futures::future::BoxFuture;
use tracing::{debug, info};

use super::{MailAdapter, MailContext, MailError, TemplateRenderer};

/// Renders each message and writes it to the log instead of delivering it.
pub struct LogMailAdapter {
    renderer: TemplateRenderer,
    from_email: String,
}

impl LogMailAdapter {
    pub fn new(renderer: TemplateRenderer, from_email: impl Into<String>) -> Self {
        Self {
            renderer,
            from_email: from_email.into(),
        }
    }
}

impl MailAdapter for LogMailAdapter {
    fn send_mail<'a>(
        &'a self,
        template_prefix: &'a str,
        email: &'a str,
        context: MailContext,
    ) -> BoxFuture<'a, Result<(), MailError>> {
        Box::pin(async move {
            let mail = self.renderer.render_mail(template_prefix, &context)?;
            info!(
                from = %self.from_email,
                to = %email,
                subject = %mail.subject,
                "\n{}",
                mail.text
            );
            if let Some(html) = &mail.html {
                debug!(to = %email, "html alternative\n{}", html);
            }
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use futures::executor::block_on;

    use super::LogMailAdapter;
    use crate::mail::{MailAdapter, MailContext, MailError, TemplateRenderer, INVITE_TEMPLATE_PREFIX};

    #[test]
    pub fn test_missing_context_fails_render() {
        let adapter = LogMailAdapter::new(TemplateRenderer::new().unwrap(), "noreply@example.com");
        let res = block_on(adapter.send_mail(INVITE_TEMPLATE_PREFIX, "a@b.com", MailContext::new()));
        match res {
            Err(MailError::Template(_)) => assert!(true),
            _ => assert!(false, "Expected a template error"),
        }
    }

    #[test]
    pub fn test_html_alternative_is_rendered() {
        let mut renderer = TemplateRenderer::new().unwrap();
        renderer.add_template("welcome_subject.txt", "Hi").unwrap();
        renderer.add_template("welcome_message.txt", "Hello").unwrap();
        renderer
            .add_template("welcome_message.html", "<p>{{ missing }}</p>")
            .unwrap();
        let adapter = LogMailAdapter::new(renderer, "noreply@example.com");
        let res = block_on(adapter.send_mail("welcome", "a@b.com", MailContext::new()));
        match res {
            Err(MailError::Template(msg)) => assert!(msg.contains("welcome_message.html")),
            _ => assert!(false, "Expected the html template to be rendered"),
        }
    }

    #[test]
    pub fn test_text_only_mail_is_sent() {
        let mut renderer = TemplateRenderer::new().unwrap();
        renderer.add_template("plain_subject.txt", "Hi").unwrap();
        renderer.add_template("plain_message.txt", "Hello").unwrap();
        let adapter = LogMailAdapter::new(renderer, "noreply@example.com");
        assert!(block_on(adapter.send_mail("plain", "a@b.com", MailContext::new())).is_ok());
    }
}
