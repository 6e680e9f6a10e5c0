use crate::common::{self, hash_map_from_validation_errors, hash_map_to_string};
use crate::postgres_common::core::{entity, insert, select, select_all, update, QueryCondition};
use crate::signals::{InvitationSignal, SignalBus};

use chrono::{DateTime, Duration, Utc};
use futures::future::BoxFuture;
use postgres_derive::{FromSql, ToSql};
use rand::{distributions::Alphanumeric, Rng};
use serde::Deserialize;
use std::{
    borrow::Cow,
    collections::HashMap,
    fmt::{self, Display},
    future::Future,
};
use tokio_postgres::GenericClient;
use tracing::{info, warn};
use uuid::Uuid;
use validator::{Validate, ValidationError, ValidationErrors};

use super::common::field_names_without_id;

pub const INVITATION_TABLE: &str = "invitations";
pub const KEY_LENGTH: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ToSql, FromSql)]
#[postgres(transparent)]
pub struct InvitationId(pub Uuid);

impl InvitationId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for InvitationId {
    fn default() -> Self {
        Self::new()
    }
}

entity! {
    #[derive(Debug, Clone, PartialEq)]
    pub struct Invitation {
        id: InvitationId,
        email: String,
        accepted: bool,
        created: DateTime<Utc>,
        key: String,
        sent: Option<DateTime<Utc>>,
        inviter_id: Option<Uuid>,
    }
}

/// 64 random alphanumerics, lower-cased.
pub fn generate_key() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(KEY_LENGTH)
        .map(|c| char::from(c).to_ascii_lowercase())
        .collect()
}

impl Invitation {
    /// A fresh, unsent and unaccepted invitation with a new key.
    pub fn create(email: &str, inviter_id: Option<Uuid>) -> Self {
        Invitation {
            id: InvitationId::new(),
            email: email.to_string(),
            accepted: false,
            created: Utc::now(),
            key: generate_key(),
            sent: None,
            inviter_id,
        }
    }

    /// True once `expiry_days` have passed since the invitation was last sent.
    /// An invitation that was never sent has no validity window and counts as
    /// expired. A window reaching past the representable range never expires.
    pub fn key_expired(&self, now: DateTime<Utc>, expiry_days: i64) -> bool {
        let sent = match self.sent {
            Some(sent) => sent,
            None => return true,
        };
        match Duration::try_days(expiry_days).and_then(|d| sent.checked_add_signed(d)) {
            Some(expires) => expires <= now,
            None => expiry_days < 0,
        }
    }
}

impl Display for Invitation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Invite: {}", self.email)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum InvitationError {
    #[error("Email invalid: {}", hash_map_to_string(.0))]
    InvalidEmail(HashMap<String, String>),

    #[error("An invitation for this email already exists")]
    AlreadyInvited,

    #[error("Invitation not found")]
    NotFound,

    #[error("Invitation has already been accepted")]
    AlreadyAccepted,

    #[error("Invitation has expired")]
    Expired,

    #[error("Repo Error: {0}")]
    RepoError(String),

    #[error("Mail Error: {0}")]
    MailError(#[from] crate::mail::MailError),
}

impl From<anyhow::Error> for InvitationError {
    fn from(e: anyhow::Error) -> Self {
        InvitationError::RepoError(e.to_string())
    }
}

#[derive(Debug, Validate, Deserialize, Clone)]
pub struct InvitationDto {
    #[validate(email(message = "invalid_email"))]
    pub email: String,
    pub inviter_id: Option<Uuid>,
}

pub fn validate_invitation_dto(
    email_max_length: usize,
) -> impl FnOnce(&InvitationDto) -> Result<(), InvitationError> {
    move |dto: &InvitationDto| {
        let mut errs = dto.validate().err().unwrap_or_else(ValidationErrors::new);
        if dto.email.chars().count() > email_max_length {
            let mut e = ValidationError::new("length");
            e.message = Some(Cow::from(format!(
                "email_longer_than_{}_chars",
                email_max_length
            )));
            errs.add("email", e);
        }
        if errs.errors().is_empty() {
            Ok(())
        } else {
            Err(InvitationError::InvalidEmail(
                hash_map_from_validation_errors(errs),
            ))
        }
    }
}

pub fn find_one<'a, C>(
    client: &'a C,
) -> impl FnOnce(Vec<InvitationCriteria>) -> BoxFuture<'a, Result<Option<Invitation>, InvitationError>>
where
    C: GenericClient + Sync,
{
    move |crit: Vec<InvitationCriteria>| {
        Box::pin(async move {
            let cond: Vec<QueryCondition> = crit.iter().map(|x| x.to_query_condition()).collect();
            let found = select(client, INVITATION_TABLE, &cond, Invitation::from_row).await?;
            Ok(found)
        })
    }
}

pub fn find_all<'a, C>(
    client: &'a C,
) -> impl FnOnce(Vec<InvitationCriteria>) -> BoxFuture<'a, Result<Vec<Invitation>, InvitationError>>
where
    C: GenericClient + Sync,
{
    move |crit: Vec<InvitationCriteria>| {
        Box::pin(async move {
            let cond: Vec<QueryCondition> = crit.iter().map(|x| x.to_query_condition()).collect();
            let all = select_all(client, INVITATION_TABLE, &cond, Invitation::from_row).await?;
            Ok(all)
        })
    }
}

pub fn find_by_email<'a, C>(
    client: &'a C,
) -> impl FnOnce(String) -> BoxFuture<'a, Result<Option<Invitation>, InvitationError>>
where
    C: GenericClient + Sync,
{
    move |email: String| find_one(client)(vec![InvitationCriteria::EmailEq(email)])
}

pub fn find_by_key<'a, C>(
    client: &'a C,
) -> impl FnOnce(String) -> BoxFuture<'a, Result<Option<Invitation>, InvitationError>>
where
    C: GenericClient + Sync,
{
    move |key: String| find_one(client)(vec![InvitationCriteria::KeyEq(key)])
}

pub fn insert_invitation<'a, C>(
    client: &'a C,
) -> impl FnOnce(Invitation) -> BoxFuture<'a, Result<(), InvitationError>>
where
    C: GenericClient + Sync,
{
    move |invitation: Invitation| {
        Box::pin(async move {
            let fields = field_names_without_id(Invitation::field_names());
            insert(
                client,
                INVITATION_TABLE,
                "id",
                fields.as_slice(),
                &invitation.id,
                &invitation.to_params(),
            )
            .await?;
            Ok(())
        })
    }
}

/// Persists every field and hands the saved invitation back.
pub fn update_invitation<'a, C>(
    client: &'a C,
) -> impl FnOnce(Invitation) -> BoxFuture<'a, Result<Invitation, InvitationError>>
where
    C: GenericClient + Sync,
{
    move |invitation: Invitation| {
        Box::pin(async move {
            let fields = field_names_without_id(Invitation::field_names());
            let affected = update(
                client,
                INVITATION_TABLE,
                "id",
                fields.as_slice(),
                &invitation.id,
                &invitation.to_params(),
            )
            .await?;
            if affected == 0 {
                return Err(InvitationError::NotFound);
            }
            Ok(invitation)
        })
    }
}

pub async fn create_invitation<FA, FB>(
    validate: impl FnOnce(&InvitationDto) -> Result<(), InvitationError>,
    find_by_email: impl FnOnce(String) -> FA,
    insert: impl FnOnce(Invitation) -> FB,
    dto: &InvitationDto,
) -> Result<Invitation, InvitationError>
where
    FA: Future<Output = Result<Option<Invitation>, InvitationError>>,
    FB: Future<Output = Result<(), InvitationError>>,
{
    let invitation = common::create(
        validate,
        |i: &Invitation| find_by_email(i.email.clone()),
        insert,
        |d: &InvitationDto| Invitation::create(&d.email, d.inviter_id),
        dto,
        InvitationError::AlreadyInvited,
    )
    .await?;
    info!(id = %invitation.id.0, email = %invitation.email, "invitation created");
    Ok(invitation)
}

pub async fn accept_invitation<FA, FB>(
    find_by_key: impl FnOnce(String) -> FA,
    update: impl FnOnce(Invitation) -> FB,
    signals: &SignalBus,
    key: &str,
    now: DateTime<Utc>,
    expiry_days: i64,
) -> Result<Invitation, InvitationError>
where
    FA: Future<Output = Result<Option<Invitation>, InvitationError>>,
    FB: Future<Output = Result<Invitation, InvitationError>>,
{
    let invitation = find_by_key(key.to_string())
        .await?
        .ok_or(InvitationError::NotFound)?;
    if invitation.accepted {
        warn!(email = %invitation.email, "invitation already accepted");
        return Err(InvitationError::AlreadyAccepted);
    }
    if invitation.key_expired(now, expiry_days) {
        warn!(email = %invitation.email, "invitation expired");
        return Err(InvitationError::Expired);
    }
    let accepted = update(Invitation {
        accepted: true,
        ..invitation
    })
    .await?;
    signals.send(InvitationSignal::InviteAccepted {
        email: accepted.email.clone(),
    });
    info!(email = %accepted.email, "invitation accepted");
    Ok(accepted)
}
