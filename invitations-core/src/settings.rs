use serde::Deserialize;

pub const DEFAULT_INVITATION_EXPIRY_DAYS: i64 = 3;
pub const DEFAULT_EMAIL_MAX_LENGTH: usize = 254;

fn default_invitation_expiry() -> i64 {
    DEFAULT_INVITATION_EXPIRY_DAYS
}

fn default_email_max_length() -> usize {
    DEFAULT_EMAIL_MAX_LENGTH
}

/// Tunables for the invitation flow, read from `INVITATIONS_*` variables.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct InvitationsSettings {
    /// Days an invitation stays valid after it was last sent.
    #[serde(default = "default_invitation_expiry")]
    pub invitation_expiry: i64,
    /// When set, signup is only open to holders of an accepted invitation.
    #[serde(default)]
    pub invitation_only: bool,
    #[serde(default = "default_email_max_length")]
    pub email_max_length: usize,
}

impl Default for InvitationsSettings {
    fn default() -> Self {
        Self {
            invitation_expiry: DEFAULT_INVITATION_EXPIRY_DAYS,
            invitation_only: false,
            email_max_length: DEFAULT_EMAIL_MAX_LENGTH,
        }
    }
}

/// The site invitations are issued for.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Site {
    pub domain: String,
    pub name: String,
}
