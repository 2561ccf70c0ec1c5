//! Account-side effects of the invitation flow, behind one injectable trait.

use std::sync::Arc;

use async_trait::async_trait;
use surrealdb::RecordId;
use tracing::info;

use crate::{
    config::SharedSettings,
    errors::Result,
    mail::{
        MailTransport, OutgoingEmail,
        templates::{EmailContent, InviteContext},
    },
    session::Session,
};

#[async_trait]
pub trait InvitationsAdapter: Send + Sync {
    /// Renders `template` with `context` and delivers it to `email`.
    async fn send_mail(&self, template: &str, email: &str, context: &InviteContext) -> Result<()>;

    fn stash_verified_email(&self, session: &Session, email: &str);

    fn stash_invitation(&self, session: &Session, invitation_id: RecordId);

    /// Takes the pending invitation out of the session.
    fn unstash_invitation(&self, session: &Session) -> Option<RecordId>;

    /// Whether a signup may go ahead for this visitor.
    fn is_open_for_signup(&self, session: &Session) -> bool;
}

pub struct BaseInvitationsAdapter {
    mailer: Arc<dyn MailTransport>,
    from_address: String,
    settings: SharedSettings,
}

impl BaseInvitationsAdapter {
    pub fn new(
        mailer: Arc<dyn MailTransport>,
        from_address: String,
        settings: SharedSettings,
    ) -> Self {
        Self {
            mailer,
            from_address,
            settings,
        }
    }
}

#[async_trait]
impl InvitationsAdapter for BaseInvitationsAdapter {
    async fn send_mail(&self, template: &str, email: &str, context: &InviteContext) -> Result<()> {
        let content = EmailContent::render(template, context)?;
        self.mailer
            .send(OutgoingEmail {
                from: self.from_address.clone(),
                to: email.to_string(),
                subject: content.subject,
                text: content.text,
                html: content.html,
            })
            .await?;
        info!("Sent {} to {}", template, email);
        Ok(())
    }

    fn stash_verified_email(&self, session: &Session, email: &str) {
        session.update(|data| data.verified_email = Some(email.to_string()));
    }

    fn stash_invitation(&self, session: &Session, invitation_id: RecordId) {
        session.update(|data| data.invitation = Some(invitation_id));
    }

    fn unstash_invitation(&self, session: &Session) -> Option<RecordId> {
        let mut invitation = None;
        session.update(|data| invitation = data.invitation.take());
        invitation
    }

    fn is_open_for_signup(&self, session: &Session) -> bool {
        if session.data().verified_email.is_some() {
            true
        } else {
            // closed to everyone without an accepted invite
            !self.settings.get().invitation_only
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::InvitationSettings, consts::invitation_const::EMAIL_INVITE_TEMPLATE,
        mail::MemoryTransport, session::SessionStore,
    };

    fn adapter(invitation_only: bool) -> (BaseInvitationsAdapter, MemoryTransport) {
        let mailer = MemoryTransport::new();
        let settings = SharedSettings::new(InvitationSettings {
            invitation_only,
            ..InvitationSettings::default()
        });
        let adapter = BaseInvitationsAdapter::new(
            Arc::new(mailer.clone()),
            "webmaster@localhost".to_string(),
            settings,
        );
        (adapter, mailer)
    }

    #[test]
    fn test_open_for_signup_with_verified_email() {
        let (adapter, _) = adapter(true);
        let session = SessionStore::new().load(None);
        adapter.stash_verified_email(&session, "email@example.com");
        assert!(adapter.is_open_for_signup(&session));
    }

    #[test]
    fn test_closed_for_signup_when_invitation_only() {
        let (adapter, _) = adapter(true);
        let session = SessionStore::new().load(None);
        assert!(!adapter.is_open_for_signup(&session));
    }

    #[test]
    fn test_open_for_signup_by_default() {
        let (adapter, _) = adapter(false);
        let session = SessionStore::new().load(None);
        assert!(adapter.is_open_for_signup(&session));

        adapter.stash_verified_email(&session, "email@example.com");
        assert!(adapter.is_open_for_signup(&session));
    }

    #[test]
    fn test_unstash_takes_the_invitation() {
        let (adapter, _) = adapter(false);
        let session = SessionStore::new().load(None);
        let id = RecordId::from_table_key("invitations", "one");

        adapter.stash_invitation(&session, id.clone());
        assert_eq!(adapter.unstash_invitation(&session), Some(id));
        assert_eq!(adapter.unstash_invitation(&session), None);
    }

    #[tokio::test]
    async fn test_send_mail_renders_and_delivers() {
        let (adapter, mailer) = adapter(false);
        let context = InviteContext {
            invite_url: "http://testserver/invitations/accept-invite/abc".to_string(),
            site_name: "example.com".to_string(),
            email: "email@example.com".to_string(),
            key: "abc".to_string(),
            inviter: None,
        };

        adapter
            .send_mail(EMAIL_INVITE_TEMPLATE, "email@example.com", &context)
            .await
            .unwrap();

        let outbox = mailer.outbox();
        assert_eq!(outbox.len(), 1);
        assert_eq!(outbox[0].to, "email@example.com");
        assert_eq!(outbox[0].from, "webmaster@localhost");
        assert_eq!(outbox[0].subject, "Invitation to join example.com");
    }
}
