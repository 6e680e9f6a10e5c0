mod config;
mod migrations;

use std::path::PathBuf;

use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand};
use tokio_postgres::{Client, NoTls};
use tracing::error;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use config::{load_settings, read_extra, EnvConfig};
use invitations_core::{
    mail::{LogMailAdapter, TemplateRenderer},
    models::{
        invitation_mail::{generate_html_invitation, send_invitation},
        invitations::{
            accept_invitation, create_invitation, find_all, find_by_email, find_by_key,
            insert_invitation, update_invitation, validate_invitation_dto, Invitation,
            InvitationCriteria, InvitationDto, InvitationError,
        },
    },
    settings::InvitationsSettings,
    signals::SignalBus,
    signup::{AccountAdapter, InvitationsAdapter, SignupRequest},
};

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    #[clap(subcommand)]
    op: Op,
}

#[derive(Subcommand, Debug)]
enum Op {
    /// Create the invitations schema
    Migrate,
    /// Drop the invitations schema
    Rollback,
    /// Issue a new invitation for an email address
    Create {
        email: String,
        #[clap(long)]
        inviter: Option<Uuid>,
    },
    /// Mail the invitation and mark it sent
    Send {
        email: String,
        /// YAML file of extra template variables
        #[clap(long)]
        extra: Option<PathBuf>,
    },
    /// Print the html invitation and mark it sent
    Render {
        email: String,
        #[clap(long)]
        template: Option<PathBuf>,
        #[clap(long)]
        extra: Option<PathBuf>,
    },
    /// Accept an invitation by key
    Accept { key: String },
    /// Report whether an invitation has expired
    Expired { email: String },
    /// List invitations
    List {
        #[clap(long)]
        pending: bool,
    },
    /// Report whether signup is open
    SignupOpen {
        #[clap(long)]
        verified_email: Option<String>,
    },
}

async fn connect(config: &EnvConfig) -> Result<Client, anyhow::Error> {
    let (client, connection) = tokio_postgres::connect(&config.connection_string(), NoTls)
        .await
        .context("connecting to postgres")?;
    tokio::spawn(async move {
        if let Err(e) = connection.await {
            error!(error = %e, "postgres connection error");
        }
    });
    Ok(client)
}

async fn existing(client: &Client, email: &str) -> Result<Invitation, InvitationError> {
    find_by_email(client)(email.to_string())
        .await?
        .ok_or(InvitationError::NotFound)
}

async fn run(op: Op, settings: InvitationsSettings) -> Result<(), anyhow::Error> {
    let signals = SignalBus::new();
    let adapter = InvitationsAdapter::new(&settings, signals.clone());

    if let Op::SignupOpen { verified_email } = op {
        let request = SignupRequest {
            account_verified_email: verified_email,
        };
        println!("{}", adapter.is_open_for_signup(&request));
        return Ok(());
    }

    let config = EnvConfig::from_env()?;
    let mut client = connect(&config).await?;
    let site = config.site();

    match op {
        Op::Migrate => migrations::run_migrations::run_migration_up(&mut client).await?,
        Op::Rollback => migrations::run_migrations::run_migration_down(&mut client).await?,
        Op::Create { email, inviter } => {
            let dto = InvitationDto {
                email,
                inviter_id: inviter,
            };
            let trans = client.transaction().await?;
            let invitation = create_invitation(
                validate_invitation_dto(settings.email_max_length),
                find_by_email(&trans),
                insert_invitation(&trans),
                &dto,
            )
            .await?;
            trans.commit().await?;
            println!("{} key={}", invitation, invitation.key);
        }
        Op::Send { email, extra } => {
            let invitation = existing(&client, &email).await?;
            let mailer = LogMailAdapter::new(TemplateRenderer::new()?, config.from_email.clone());
            let extra = read_extra(extra.as_deref())?;
            let saved = send_invitation(
                update_invitation(&client),
                &mailer,
                &signals,
                invitation,
                &site,
                extra,
                Utc::now(),
            )
            .await?;
            println!("{} sent", saved);
        }
        Op::Render {
            email,
            template,
            extra,
        } => {
            let invitation = existing(&client, &email).await?;
            let mut renderer = TemplateRenderer::new()?;
            let template_name = match &template {
                Some(path) => {
                    let name = path.display().to_string();
                    let content = std::fs::read_to_string(path)
                        .with_context(|| format!("reading {}", name))?;
                    renderer.add_template(&name, &content)?;
                    Some(name)
                }
                None => None,
            };
            let extra = read_extra(extra.as_deref())?;
            let (_, message) = generate_html_invitation(
                update_invitation(&client),
                &renderer,
                invitation,
                &site,
                template_name.as_deref(),
                extra,
                Utc::now(),
            )
            .await?;
            println!("{}", message);
        }
        Op::Accept { key } => {
            let accepted = accept_invitation(
                find_by_key(&client),
                update_invitation(&client),
                &signals,
                &key,
                Utc::now(),
                settings.invitation_expiry,
            )
            .await?;
            let mut request = SignupRequest::default();
            adapter.accept_into_session(&mut request, &accepted);
            println!(
                "{} accepted, signup open: {}",
                accepted,
                adapter.is_open_for_signup(&request)
            );
        }
        Op::Expired { email } => {
            let invitation = existing(&client, &email).await?;
            println!(
                "{}",
                invitation.key_expired(Utc::now(), settings.invitation_expiry)
            );
        }
        Op::List { pending } => {
            let crit = if pending {
                vec![InvitationCriteria::AcceptedEq(false)]
            } else {
                vec![]
            };
            for invitation in find_all(&client)(crit).await? {
                let sent = invitation
                    .sent
                    .map(|s| s.to_rfc3339())
                    .unwrap_or_else(|| "never".to_string());
                println!(
                    "{}\taccepted={}\tsent={}",
                    invitation, invitation.accepted, sent
                );
            }
        }
        Op::SignupOpen { .. } => {}
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let settings = load_settings()?;
    run(args.op, settings).await
}
