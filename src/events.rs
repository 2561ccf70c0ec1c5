//! Invitation notifications for in-process subscribers.

use surrealdb::RecordId;
use tokio::sync::broadcast;

use crate::models::invitation::Invitation;

const CHANNEL_CAPACITY: usize = 100;

#[derive(Debug, Clone)]
pub enum InvitationEvent {
    /// The invitation email went out.
    InviteUrlSent {
        invitation: Invitation,
        invite_url: String,
        inviter: Option<RecordId>,
    },
    /// The stashed invitation was consumed by a completed signup.
    InviteAccepted {
        invitation_id: RecordId,
        email: String,
    },
}

#[derive(Debug, Clone)]
pub struct InvitationEvents {
    tx: broadcast::Sender<InvitationEvent>,
}

impl InvitationEvents {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { tx }
    }

    pub fn publish(&self, event: InvitationEvent) {
        // no subscribers is fine
        let _ = self.tx.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<InvitationEvent> {
        self.tx.subscribe()
    }
}

impl Default for InvitationEvents {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_publish_and_subscribe() {
        let events = InvitationEvents::new();
        let mut rx = events.subscribe();

        events.publish(InvitationEvent::InviteAccepted {
            invitation_id: RecordId::from_table_key("invitations", "one"),
            email: "email@example.com".to_string(),
        });

        match rx.recv().await.expect("event") {
            InvitationEvent::InviteAccepted { email, .. } => assert_eq!(email, "email@example.com"),
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_publish_without_subscribers() {
        let events = InvitationEvents::new();
        events.publish(InvitationEvent::InviteAccepted {
            invitation_id: RecordId::from_table_key("invitations", "one"),
            email: "email@example.com".to_string(),
        });
    }
}
