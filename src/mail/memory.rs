use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::{MailError, MailTransport, OutgoingEmail};

/// Keeps every message in an outbox. Cloned handles share the outbox.
#[derive(Debug, Clone, Default)]
pub struct MemoryTransport {
    outbox: Arc<Mutex<Vec<OutgoingEmail>>>,
    failing: bool,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// A transport whose every send fails.
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    pub fn outbox(&self) -> Vec<OutgoingEmail> {
        self.outbox.lock().clone()
    }
}

#[async_trait]
impl MailTransport for MemoryTransport {
    async fn send(&self, email: OutgoingEmail) -> Result<(), MailError> {
        if self.failing {
            return Err(MailError::SendFailed(format!("refused mail to {}", email.to)));
        }
        self.outbox.lock().push(email);
        Ok(())
    }
}
