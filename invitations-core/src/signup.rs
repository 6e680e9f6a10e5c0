use crate::models::invitations::Invitation;
use crate::settings::InvitationsSettings;
use crate::signals::{InvitationSignal, SignalBus};

/// What the signup gate needs to know about the current session.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct SignupRequest {
    /// Email of an invitation accepted in this session, if any.
    pub account_verified_email: Option<String>,
}

pub trait AccountAdapter {
    fn is_open_for_signup(&self, request: &SignupRequest) -> bool;
}

pub struct InvitationsAdapter {
    invitation_only: bool,
    signals: SignalBus,
}

impl InvitationsAdapter {
    pub fn new(settings: &InvitationsSettings, signals: SignalBus) -> Self {
        Self {
            invitation_only: settings.invitation_only,
            signals,
        }
    }

    /// Bus on which `UserSignedUp` is announced.
    pub fn user_signed_up_signal(&self) -> &SignalBus {
        &self.signals
    }

    /// Remember the accepted invitation's email so the session may sign up.
    pub fn accept_into_session(&self, request: &mut SignupRequest, invitation: &Invitation) {
        request.account_verified_email = Some(invitation.email.clone());
    }

    pub fn user_signed_up(&self, email: &str) {
        self.signals.send(InvitationSignal::UserSignedUp {
            email: email.to_string(),
        });
    }
}

impl AccountAdapter for InvitationsAdapter {
    fn is_open_for_signup(&self, request: &SignupRequest) -> bool {
        let verified = request
            .account_verified_email
            .as_deref()
            .map_or(false, |e| !e.is_empty());
        verified || !self.invitation_only
    }
}

#[cfg(test)]
mod tests {
    use super::{AccountAdapter, InvitationsAdapter, SignupRequest};
    use crate::models::invitations::Invitation;
    use crate::settings::InvitationsSettings;
    use crate::signals::{InvitationSignal, SignalBus};

    fn adapter(invitation_only: bool) -> InvitationsAdapter {
        let settings = InvitationsSettings {
            invitation_only,
            ..InvitationsSettings::default()
        };
        InvitationsAdapter::new(&settings, SignalBus::new())
    }

    fn verified(email: &str) -> SignupRequest {
        SignupRequest {
            account_verified_email: Some(email.to_string()),
        }
    }

    #[test]
    pub fn test_open_site_accepts_anyone() {
        assert!(adapter(false).is_open_for_signup(&SignupRequest::default()));
        assert!(adapter(false).is_open_for_signup(&verified("a@b.com")));
    }

    #[test]
    pub fn test_invitation_only_requires_verified_email() {
        let a = adapter(true);
        assert!(!a.is_open_for_signup(&SignupRequest::default()));
        assert!(!a.is_open_for_signup(&verified("")));
        assert!(a.is_open_for_signup(&verified("a@b.com")));
    }

    #[test]
    pub fn test_accept_into_session_opens_signup() {
        let a = adapter(true);
        let mut request = SignupRequest::default();
        a.accept_into_session(&mut request, &Invitation::create("guest@example.com", None));
        assert_eq!(Some("guest@example.com".to_string()), request.account_verified_email);
        assert!(a.is_open_for_signup(&request));
    }

    #[test]
    pub fn test_user_signed_up_is_announced() {
        let a = adapter(true);
        let mut rx = a.user_signed_up_signal().subscribe();
        a.user_signed_up("guest@example.com");
        match rx.try_recv() {
            Ok(InvitationSignal::UserSignedUp { email }) => assert_eq!("guest@example.com", email),
            _ => assert!(false, "Expected UserSignedUp"),
        }
    }
}
