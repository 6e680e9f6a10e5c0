//! Invitation-gated signup: single-use tokens tied to an email address,
//! their send/accept lifecycle, and the policy deciding whether signup is open.

pub mod common;
pub mod mail;
pub mod models;
pub mod postgres_common;
pub mod settings;
pub mod signals;
pub mod signup;
