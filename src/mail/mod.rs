//! Outbound mail.
//!
//! The invitations adapter renders a template into an [`OutgoingEmail`] and
//! hands it to a [`MailTransport`]. SMTP delivers for real, the console
//! transport logs, and the memory transport keeps an outbox for tests.

mod console;
mod memory;
mod smtp;
pub mod templates;

pub use console::ConsoleTransport;
pub use memory::MemoryTransport;
pub use smtp::SmtpTransport;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::{EmailBackendConfig, EmailConfig};

#[derive(Debug, Error)]
pub enum MailError {
    #[error("Failed to send email: {0}")]
    SendFailed(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Unknown email template: {0}")]
    UnknownTemplate(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub text: String,
    pub html: String,
}

#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(&self, email: OutgoingEmail) -> Result<(), MailError>;
}

pub fn create_transport(config: &EmailConfig) -> Result<Arc<dyn MailTransport>, MailError> {
    match &config.backend {
        EmailBackendConfig::Console => Ok(Arc::new(ConsoleTransport)),
        EmailBackendConfig::Smtp {
            host,
            port,
            username,
            password,
            use_tls,
        } => Ok(Arc::new(SmtpTransport::new(
            host.clone(),
            *port,
            username.clone(),
            password.clone(),
            *use_tls,
        )?)),
    }
}
