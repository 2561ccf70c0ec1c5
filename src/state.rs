use std::sync::Arc;

use surrealdb::{
    Surreal,
    engine::any::{self, Any},
    opt::auth::Root,
};
use tracing::info;

use crate::{
    adapter::{BaseInvitationsAdapter, InvitationsAdapter},
    config::{DatabaseConfig, ServerConfig, SharedSettings},
    errors::Result,
    events::InvitationEvents,
    mail::{MailTransport, create_transport},
    session::SessionStore,
};

const SCHEMA: &str = r#"
DEFINE TABLE IF NOT EXISTS invitations SCHEMALESS;
DEFINE INDEX IF NOT EXISTS invitation_key ON TABLE invitations COLUMNS `key` UNIQUE;
DEFINE INDEX IF NOT EXISTS invitation_email ON TABLE invitations COLUMNS email;
DEFINE TABLE IF NOT EXISTS users SCHEMALESS;
DEFINE INDEX IF NOT EXISTS user_email ON TABLE users COLUMNS email UNIQUE;
"#;

#[derive(Clone)]
pub struct AppState {
    pub sdb: Surreal<Any>,
    pub config: Arc<ServerConfig>,
    pub settings: SharedSettings,
    pub adapter: Arc<dyn InvitationsAdapter>,
    pub events: InvitationEvents,
    pub sessions: SessionStore,
}

impl AppState {
    pub async fn init(config: ServerConfig) -> Result<Self> {
        let sdb = Self::connect(&config.database).await?;
        let mailer = create_transport(&config.email)?;
        Ok(Self::new(sdb, config, mailer))
    }

    pub async fn connect(database: &DatabaseConfig) -> Result<Surreal<Any>> {
        let sdb = any::connect(database.url.as_str()).await?;
        if let (Some(username), Some(password)) = (&database.username, &database.password) {
            sdb.signin(Root {
                username: username.as_str(),
                password: password.as_str(),
            })
            .await?;
        }
        sdb.use_ns(database.namespace.as_str())
            .use_db(database.database.as_str())
            .await?;
        sdb.query(SCHEMA).await?.check()?;

        info!("Connected to {}", database.url);
        Ok(sdb)
    }

    /// State with the default adapter delivering through `mailer`.
    pub fn new(sdb: Surreal<Any>, config: ServerConfig, mailer: Arc<dyn MailTransport>) -> Self {
        let settings = SharedSettings::new(config.invitations.clone());
        let adapter = Arc::new(BaseInvitationsAdapter::new(
            mailer,
            config.email.from_address.clone(),
            settings.clone(),
        ));

        Self {
            sdb,
            config: Arc::new(config),
            settings,
            adapter,
            events: InvitationEvents::new(),
            sessions: SessionStore::new(),
        }
    }

    /// Replaces the default adapter.
    pub fn with_adapter(mut self, adapter: Arc<dyn InvitationsAdapter>) -> Self {
        self.adapter = adapter;
        self
    }
}
