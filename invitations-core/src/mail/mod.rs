//! Outgoing invitation mail.
//!
//! `MailAdapter` is the seam hosts plug their delivery into. The bundled
//! `LogMailAdapter` renders the message and writes it to the log.

mod console;
mod templates;

pub use console::LogMailAdapter;
pub use templates::{RenderedMail, TemplateRenderer, DEFAULT_HTML_TEMPLATE, INVITE_TEMPLATE_PREFIX};

use std::collections::BTreeMap;

use futures::future::BoxFuture;
use thiserror::Error;

/// Template variables, keyed by name.
pub type MailContext = BTreeMap<String, String>;

#[derive(Debug, Error)]
pub enum MailError {
    #[error("Template error: {0}")]
    Template(String),

    #[error("Failed to send email: {0}")]
    SendFailed(String),
}

pub trait MailAdapter: Send + Sync {
    /// Render `<template_prefix>_subject.txt` / `_message.txt` with `context`
    /// and deliver the result to `email`.
    fn send_mail<'a>(
        &'a self,
        template_prefix: &'a str,
        email: &'a str,
        context: MailContext,
    ) -> BoxFuture<'a, Result<(), MailError>>;
}
