pub mod common;
pub mod invitation_mail;
pub mod invitations;
pub mod migrations;
