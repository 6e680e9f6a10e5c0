use std::{collections::BTreeMap, path::Path};

use anyhow::Context;
use invitations_core::{
    mail::MailContext,
    settings::{InvitationsSettings, Site},
};
use serde::Deserialize;

fn default_from_email() -> String {
    "webmaster@localhost".to_string()
}

#[derive(Deserialize, Debug)]
pub struct EnvConfig {
    pub db_host: String,
    pub db_port: String,
    pub db_user: String,
    pub db_pass: String,
    pub db_name: Option<String>,
    pub site_domain: String,
    pub site_name: String,
    #[serde(default = "default_from_email")]
    pub from_email: String,
}

impl EnvConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenv::dotenv().ok();
        envy::from_env::<EnvConfig>().context("reading database and site configuration")
    }

    pub fn connection_string(&self) -> String {
        let db_name = self.db_name.as_deref().unwrap_or("invitations");
        format!(
            "host={} port={} user={} password={} dbname={}",
            self.db_host, self.db_port, self.db_user, self.db_pass, db_name
        )
    }

    pub fn site(&self) -> Site {
        Site {
            domain: self.site_domain.clone(),
            name: self.site_name.clone(),
        }
    }
}

pub fn load_settings() -> Result<InvitationsSettings, anyhow::Error> {
    dotenv::dotenv().ok();
    let settings = envy::prefixed("INVITATIONS_")
        .from_env::<InvitationsSettings>()
        .context("reading INVITATIONS_* settings")?;
    check_settings(settings)
}

pub fn check_settings(settings: InvitationsSettings) -> Result<InvitationsSettings, anyhow::Error> {
    anyhow::ensure!(
        settings.invitation_expiry >= 0,
        "INVITATIONS_INVITATION_EXPIRY must not be negative, got {}",
        settings.invitation_expiry
    );
    Ok(settings)
}

/// Extra template variables from a flat YAML mapping.
pub fn read_extra(path: Option<&Path>) -> Result<MailContext, anyhow::Error> {
    match path {
        None => Ok(MailContext::new()),
        Some(p) => {
            let file = std::fs::File::open(p)
                .with_context(|| format!("opening {}", p.display()))?;
            let extra: BTreeMap<String, String> = serde_yaml::from_reader(file)
                .with_context(|| format!("parsing {}", p.display()))?;
            Ok(extra)
        }
    }
}

#[cfg(test)]
mod tests {
    use invitations_core::settings::InvitationsSettings;

    use super::{check_settings, EnvConfig};

    #[test]
    pub fn test_negative_expiry_is_rejected() {
        let settings = InvitationsSettings {
            invitation_expiry: -1,
            ..InvitationsSettings::default()
        };
        assert!(check_settings(settings).is_err());
        assert!(check_settings(InvitationsSettings::default()).is_ok());
    }

    #[test]
    pub fn test_connection_string_defaults_db_name() {
        let config = EnvConfig {
            db_host: "localhost".to_string(),
            db_port: "5432".to_string(),
            db_user: "app".to_string(),
            db_pass: "secret".to_string(),
            db_name: None,
            site_domain: "example.com".to_string(),
            site_name: "Example".to_string(),
            from_email: "noreply@example.com".to_string(),
        };
        assert_eq!(
            "host=localhost port=5432 user=app password=secret dbname=invitations",
            config.connection_string()
        );
        assert_eq!("example.com", config.site().domain);
    }
}
