use chrono::{DateTime, Utc};
use std::future::Future;
use tracing::info;

use crate::mail::{MailAdapter, MailContext, TemplateRenderer, DEFAULT_HTML_TEMPLATE, INVITE_TEMPLATE_PREFIX};
use crate::settings::Site;
use crate::signals::{InvitationSignal, SignalBus};

use super::invitations::{Invitation, InvitationError};

pub fn invite_url(site: &Site, key: &str) -> String {
    format!("https://{}/invitations/accept-invite/{}/", site.domain, key)
}

fn base_context(invitation: &Invitation, site: &Site, url: &str) -> MailContext {
    let mut ctx = MailContext::new();
    ctx.insert("invite_url".to_string(), url.to_string());
    ctx.insert("site_name".to_string(), site.name.clone());
    ctx.insert("email".to_string(), invitation.email.clone());
    ctx.insert("key".to_string(), invitation.key.clone());
    ctx
}

/// Renders the invitation as a single html message and marks it sent.
///
/// `email_template` falls back to the bundled html template. Values in
/// `extra` override the built-in context.
pub async fn generate_html_invitation<F>(
    update: impl FnOnce(Invitation) -> F,
    renderer: &TemplateRenderer,
    invitation: Invitation,
    site: &Site,
    email_template: Option<&str>,
    extra: MailContext,
    now: DateTime<Utc>,
) -> Result<(Invitation, String), InvitationError>
where
    F: Future<Output = Result<Invitation, InvitationError>>,
{
    let url = invite_url(site, &invitation.key);
    let mut ctx = base_context(&invitation, site, &url);
    ctx.extend(extra);

    let template = email_template
        .filter(|t| !t.is_empty())
        .unwrap_or(DEFAULT_HTML_TEMPLATE);
    let message = renderer.render(template, &ctx)?;

    let saved = update(Invitation {
        sent: Some(now),
        ..invitation
    })
    .await?;
    Ok((saved, message))
}

/// Mails the invitation through `mailer`, records the send time and
/// announces `InviteUrlSent`. Nothing is persisted if delivery fails.
pub async fn send_invitation<F>(
    update: impl FnOnce(Invitation) -> F,
    mailer: &dyn MailAdapter,
    signals: &SignalBus,
    invitation: Invitation,
    site: &Site,
    extra: MailContext,
    now: DateTime<Utc>,
) -> Result<Invitation, InvitationError>
where
    F: Future<Output = Result<Invitation, InvitationError>>,
{
    let url = invite_url(site, &invitation.key);
    let mut ctx = base_context(&invitation, site, &url);
    ctx.insert(
        "inviter".to_string(),
        invitation
            .inviter_id
            .map(|id| id.to_string())
            .unwrap_or_default(),
    );
    ctx.extend(extra);

    mailer
        .send_mail(INVITE_TEMPLATE_PREFIX, &invitation.email, ctx)
        .await?;

    let saved = update(Invitation {
        sent: Some(now),
        ..invitation
    })
    .await?;
    info!(email = %saved.email, invite_url = %url, "invitation sent");

    signals.send(InvitationSignal::InviteUrlSent {
        inviter_id: saved.inviter_id,
        invite_url: url,
        invitation: saved.clone(),
    });
    Ok(saved)
}
