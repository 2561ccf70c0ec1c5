use async_trait::async_trait;
use tracing::info;

use super::{MailError, MailTransport, OutgoingEmail};

/// Writes mail to the log instead of delivering it.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleTransport;

#[async_trait]
impl MailTransport for ConsoleTransport {
    async fn send(&self, email: OutgoingEmail) -> Result<(), MailError> {
        info!(
            from = %email.from,
            to = %email.to,
            subject = %email.subject,
            "\n{}",
            email.text
        );
        Ok(())
    }
}
