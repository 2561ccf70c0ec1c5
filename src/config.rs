//! Process configuration.
//!
//! Everything is read from the environment once at start-up into explicit
//! structs. The invitation options live behind [`SharedSettings`] so they can
//! be read at call time and replaced while the server runs.
//!
//! ```bash
//! INVITATIONS_INVITATION_EXPIRY=3          # days
//! INVITATIONS_INVITATION_ONLY=false
//! INVITATIONS_CONFIRM_INVITE_ON_GET=true
//! INVITATIONS_ALLOW_JSON_INVITES=false
//! INVITATIONS_SIGNUP_REDIRECT=/auth/signup
//!
//! INVITATIONS_BIND=127.0.0.1:3587
//! INVITATIONS_DATABASE_URL=ws://localhost:8050
//! INVITATIONS_JWT_SECRET=...
//! INVITATIONS_SITE_URL=http://127.0.0.1:3587
//! INVITATIONS_SITE_NAME=example.com
//!
//! INVITATIONS_EMAIL_BACKEND=smtp           # or console
//! INVITATIONS_EMAIL_FROM=webmaster@localhost
//! SMTP_HOST=smtp.example.com
//! SMTP_PORT=587
//! SMTP_USERNAME=user
//! SMTP_PASSWORD=secret
//! SMTP_USE_TLS=true
//! ```

use std::{env, sync::Arc};

use chrono::Duration;
use parking_lot::RwLock;
use thiserror::Error;
use url::Url;

const PREFIX: &str = "INVITATIONS_";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid boolean for {0}: `{1}`")]
    InvalidBool(String, String),

    #[error("Invalid number for {0}: `{1}`")]
    InvalidNumber(String, String),

    #[error("Invalid site url `{0}`: {1}")]
    InvalidSiteUrl(String, url::ParseError),

    #[error("Invalid email backend: {0}. Expected 'console' or 'smtp'")]
    InvalidEmailBackend(String),
}

/// The invitation options. `Default` carries the documented defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvitationSettings {
    /// Days an invitation stays acceptable after it was sent.
    pub invitation_expiry: u32,
    /// Signup is closed unless an invitation was accepted in this session.
    pub invitation_only: bool,
    /// A plain GET on the accept link confirms the invitation.
    pub confirm_invite_on_get: bool,
    /// Exposes the bulk JSON invite endpoint.
    pub allow_json_invites: bool,
    /// Where to send the visitor after accepting.
    pub signup_redirect: String,
}

impl Default for InvitationSettings {
    fn default() -> Self {
        Self {
            invitation_expiry: 3,
            invitation_only: false,
            confirm_invite_on_get: true,
            allow_json_invites: false,
            signup_redirect: "/auth/signup".to_string(),
        }
    }
}

impl InvitationSettings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |name: &str| lookup(&format!("{PREFIX}{name}"));

        Ok(Self {
            invitation_expiry: match get("INVITATION_EXPIRY") {
                Some(v) => parse_number(&format!("{PREFIX}INVITATION_EXPIRY"), &v)?,
                None => defaults.invitation_expiry,
            },
            invitation_only: match get("INVITATION_ONLY") {
                Some(v) => parse_bool(&format!("{PREFIX}INVITATION_ONLY"), &v)?,
                None => defaults.invitation_only,
            },
            confirm_invite_on_get: match get("CONFIRM_INVITE_ON_GET") {
                Some(v) => parse_bool(&format!("{PREFIX}CONFIRM_INVITE_ON_GET"), &v)?,
                None => defaults.confirm_invite_on_get,
            },
            allow_json_invites: match get("ALLOW_JSON_INVITES") {
                Some(v) => parse_bool(&format!("{PREFIX}ALLOW_JSON_INVITES"), &v)?,
                None => defaults.allow_json_invites,
            },
            signup_redirect: get("SIGNUP_REDIRECT").unwrap_or(defaults.signup_redirect),
        })
    }

    pub fn expiry(&self) -> Duration {
        Duration::days(i64::from(self.invitation_expiry))
    }
}

/// Live invitation settings shared by the handlers and the adapter.
#[derive(Debug, Clone, Default)]
pub struct SharedSettings(Arc<RwLock<InvitationSettings>>);

impl SharedSettings {
    pub fn new(settings: InvitationSettings) -> Self {
        Self(Arc::new(RwLock::new(settings)))
    }

    /// Snapshot of the current values.
    pub fn get(&self) -> InvitationSettings {
        self.0.read().clone()
    }

    pub fn update(&self, f: impl FnOnce(&mut InvitationSettings)) {
        f(&mut self.0.write());
    }
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub namespace: String,
    pub database: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "ws://localhost:8050".to_string(),
            username: None,
            password: None,
            namespace: "test".to_string(),
            database: "test".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SiteConfig {
    /// Absolute base url used to build invitation links.
    pub url: String,
    pub name: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:3587".to_string(),
            name: "example.com".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub enum EmailBackendConfig {
    /// Log outgoing mail instead of delivering it.
    Console,
    Smtp {
        host: String,
        port: u16,
        username: Option<String>,
        password: Option<String>,
        use_tls: bool,
    },
}

#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub from_address: String,
    pub backend: EmailBackendConfig,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            from_address: "webmaster@localhost".to_string(),
            backend: EmailBackendConfig::Console,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: String,
    pub database: DatabaseConfig,
    pub jwt_secret: String,
    pub site: SiteConfig,
    pub email: EmailConfig,
    pub invitations: InvitationSettings,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:3587".to_string(),
            database: DatabaseConfig::default(),
            jwt_secret: String::new(),
            site: SiteConfig::default(),
            email: EmailConfig::default(),
            invitations: InvitationSettings::default(),
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |name: &str| lookup(&format!("{PREFIX}{name}"));

        let jwt_secret = get("JWT_SECRET")
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar(format!("{PREFIX}JWT_SECRET")))?;

        let site = SiteConfig {
            url: get("SITE_URL").unwrap_or(defaults.site.url),
            name: get("SITE_NAME").unwrap_or(defaults.site.name),
        };
        Url::parse(&site.url).map_err(|e| ConfigError::InvalidSiteUrl(site.url.clone(), e))?;

        let database = DatabaseConfig {
            url: get("DATABASE_URL").unwrap_or(defaults.database.url),
            username: get("DATABASE_USER"),
            password: get("DATABASE_PASSWORD"),
            namespace: get("DATABASE_NS").unwrap_or(defaults.database.namespace),
            database: get("DATABASE_DB").unwrap_or(defaults.database.database),
        };

        let backend = match get("EMAIL_BACKEND")
            .map(|b| b.to_lowercase())
            .as_deref()
        {
            None | Some("console") => EmailBackendConfig::Console,
            Some("smtp") => {
                let host = lookup("SMTP_HOST")
                    .ok_or_else(|| ConfigError::MissingEnvVar("SMTP_HOST".to_string()))?;
                let port = match lookup("SMTP_PORT") {
                    Some(p) => p
                        .parse::<u16>()
                        .map_err(|_| ConfigError::InvalidNumber("SMTP_PORT".to_string(), p))?,
                    None => 587,
                };
                let use_tls = match lookup("SMTP_USE_TLS") {
                    Some(v) => parse_bool("SMTP_USE_TLS", &v)?,
                    None => true,
                };
                EmailBackendConfig::Smtp {
                    host,
                    port,
                    username: lookup("SMTP_USERNAME"),
                    password: lookup("SMTP_PASSWORD"),
                    use_tls,
                }
            }
            Some(other) => return Err(ConfigError::InvalidEmailBackend(other.to_string())),
        };

        Ok(Self {
            bind: get("BIND").unwrap_or(defaults.bind),
            database,
            jwt_secret,
            site,
            email: EmailConfig {
                from_address: get("EMAIL_FROM").unwrap_or(defaults.email.from_address),
                backend,
            },
            invitations: InvitationSettings::from_lookup(&lookup)?,
        })
    }
}

fn parse_bool(name: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(ConfigError::InvalidBool(name.to_string(), value.to_string())),
    }
}

fn parse_number<T: std::str::FromStr>(name: &str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidNumber(name.to_string(), value.to_string()))
}
