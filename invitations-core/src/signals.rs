//! In-process notifications for the invitation lifecycle.
//!
//! Hosts subscribe to react to sends, acceptances and completed signups.
//! Events are only delivered within a single process.

use tokio::sync::broadcast;
use tracing::debug;
use uuid::Uuid;

use crate::models::invitations::Invitation;

const CHANNEL_CAPACITY: usize = 100;

#[derive(Debug, Clone)]
pub enum InvitationSignal {
    InviteUrlSent {
        invitation: Invitation,
        invite_url: String,
        inviter_id: Option<Uuid>,
    },
    InviteAccepted {
        email: String,
    },
    UserSignedUp {
        email: String,
    },
}

#[derive(Clone)]
pub struct SignalBus {
    sender: broadcast::Sender<InvitationSignal>,
}

impl SignalBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<InvitationSignal> {
        self.sender.subscribe()
    }

    /// Delivers to current subscribers. Having none is not an error.
    pub fn send(&self, signal: InvitationSignal) {
        if let Err(broadcast::error::SendError(signal)) = self.sender.send(signal) {
            debug!(?signal, "no subscribers for signal");
        }
    }
}

impl Default for SignalBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::{InvitationSignal, SignalBus};

    #[test]
    pub fn test_send_without_subscribers() {
        let bus = SignalBus::new();
        bus.send(InvitationSignal::InviteAccepted {
            email: "a@b.com".to_string(),
        });
    }

    #[test]
    pub fn test_subscriber_receives() {
        let bus = SignalBus::new();
        let mut rx = bus.subscribe();
        bus.send(InvitationSignal::UserSignedUp {
            email: "a@b.com".to_string(),
        });
        match rx.try_recv() {
            Ok(InvitationSignal::UserSignedUp { email }) => assert_eq!("a@b.com", email),
            _ => assert!(false, "Expected a UserSignedUp signal"),
        }
    }
}
