//! Invitation queries, validation rules and lifecycle.

use chrono::{DateTime, Duration, Utc};
use serde_json::json;
use surrealdb::{RecordId, Surreal, engine::any::Any};
use tracing::info;

use crate::{
    adapter::InvitationsAdapter,
    config::InvitationSettings,
    consts::{
        auth_const::{INVITATION_TABLE, USER_TABLE},
        invitation_const::{ACCEPT_INVITE_PATH, EMAIL_INVITE_TEMPLATE},
    },
    errors::{EmailRejection, Error, Result},
    events::InvitationEvent,
    mail::templates::InviteContext,
    models::{
        invitation::{CreateInvitation, Invitation},
        user::User,
    },
    session::Session,
    state::AppState,
    utils::email::is_valid_email,
};

// ? Queries

// ? `sent` round-trips as an RFC 3339 string, hence the casts. An unsent
// ? invitation never expires.
const VALID: &str =
    "accepted = false AND (sent IS NONE OR sent IS NULL OR <datetime> sent > <datetime> $cutoff)";
const EXPIRED: &str = "accepted = true OR (sent IS NOT NONE AND sent IS NOT NULL AND <datetime> sent <= <datetime> $cutoff)";

/// Invitations that are neither accepted nor expired.
pub async fn all_valid(
    sdb: &Surreal<Any>,
    now: DateTime<Utc>,
    expiry: Duration,
) -> Result<Vec<Invitation>> {
    match now.checked_sub_signed(expiry) {
        Some(cutoff) => select_where(sdb, VALID, Some(cutoff)).await,
        None => select_where(sdb, "accepted = false", None).await,
    }
}

/// Invitations that were accepted or sent too long ago.
pub async fn all_expired(
    sdb: &Surreal<Any>,
    now: DateTime<Utc>,
    expiry: Duration,
) -> Result<Vec<Invitation>> {
    match now.checked_sub_signed(expiry) {
        Some(cutoff) => select_where(sdb, EXPIRED, Some(cutoff)).await,
        // nothing was sent that long ago
        None => select_where(sdb, "accepted = true", None).await,
    }
}

async fn select_where(
    sdb: &Surreal<Any>,
    predicate: &str,
    cutoff: Option<DateTime<Utc>>,
) -> Result<Vec<Invitation>> {
    let mut query = sdb
        .query(format!("SELECT * FROM type::table($table) WHERE {predicate};"))
        .bind(("table", INVITATION_TABLE));
    if let Some(cutoff) = cutoff {
        query = query.bind(("cutoff", cutoff.to_rfc3339()));
    }
    let invitations = query.await?.take::<Vec<Invitation>>(0)?;
    Ok(invitations)
}

pub async fn find_by_email(sdb: &Surreal<Any>, email: &str) -> Result<Vec<Invitation>> {
    let invitations = sdb
        .query("SELECT * FROM type::table($table) WHERE email = $email;")
        .bind(("table", INVITATION_TABLE))
        .bind(("email", email.to_string()))
        .await?
        .take::<Vec<Invitation>>(0)?;
    Ok(invitations)
}

/// Looks `key` up case-insensitively within the valid set.
pub async fn find_valid_by_key(
    sdb: &Surreal<Any>,
    key: &str,
    now: DateTime<Utc>,
    expiry: Duration,
) -> Result<Option<Invitation>> {
    let invitation = sdb
        .query("SELECT * FROM type::table($table) WHERE `key` = $key;")
        .bind(("table", INVITATION_TABLE))
        .bind(("key", key.to_lowercase()))
        .await?
        .take::<Vec<Invitation>>(0)?
        .into_iter()
        .find(|invitation| invitation.is_valid(now, expiry));
    Ok(invitation)
}

async fn is_email_registered(sdb: &Surreal<Any>, email: &str) -> Result<bool> {
    let users = sdb
        .query("SELECT * FROM type::table($table) WHERE email = $email AND email_verified = true;")
        .bind(("table", USER_TABLE))
        .bind(("email", email.to_string()))
        .await?
        .take::<Vec<User>>(0)?;
    Ok(!users.is_empty())
}

// ? Validation

/// Rejects an address that already accepted, or still has a pending invite.
pub async fn validate_invitation(
    sdb: &Surreal<Any>,
    email: &str,
    now: DateTime<Utc>,
    expiry: Duration,
) -> Result<()> {
    let invitations = find_by_email(sdb, email).await?;

    if invitations.iter().any(|invitation| invitation.accepted) {
        return Err(EmailRejection::AlreadyAccepted.into());
    }
    if invitations
        .iter()
        .any(|invitation| invitation.is_valid(now, expiry))
    {
        return Err(EmailRejection::AlreadyInvited.into());
    }
    Ok(())
}

/// Full check for the single invite form: invitation state, format, then
/// existing verified accounts.
pub async fn clean_email(
    sdb: &Surreal<Any>,
    email: &str,
    now: DateTime<Utc>,
    expiry: Duration,
) -> Result<()> {
    validate_invitation(sdb, email, now, expiry).await?;

    if !is_valid_email(email) {
        return Err(EmailRejection::InvalidEmail.into());
    }
    if is_email_registered(sdb, email).await? {
        return Err(EmailRejection::UserRegisteredEmail.into());
    }
    Ok(())
}

// ? Lifecycle

pub async fn insert(sdb: &Surreal<Any>, data: CreateInvitation) -> Result<Invitation> {
    let invitation = sdb
        .create::<Option<Invitation>>(INVITATION_TABLE)
        .content(data)
        .await?
        .ok_or(Error::InternalServerError)?;
    Ok(invitation)
}

/// New unsent invitation with a freshly generated key.
pub async fn create(
    sdb: &Surreal<Any>,
    email: &str,
    inviter: Option<RecordId>,
    now: DateTime<Utc>,
) -> Result<Invitation> {
    let invitation = insert(sdb, CreateInvitation::init(email.to_string(), inviter, now)).await?;
    info!("Created {}", invitation);
    Ok(invitation)
}

pub fn invite_url(site_url: &str, key: &str) -> String {
    format!(
        "{}{}/{}",
        site_url.trim_end_matches('/'),
        ACCEPT_INVITE_PATH,
        key
    )
}

/// Mails the invitation, stamps `sent` and announces it. `actor` is whoever
/// triggered the send.
pub async fn send(
    state: &AppState,
    invitation: Invitation,
    actor: Option<RecordId>,
    now: DateTime<Utc>,
) -> Result<Invitation> {
    if invitation.sent.is_some() {
        return Err(Error::AlreadySent(invitation.key));
    }

    let url = invite_url(&state.config.site.url, &invitation.key);
    let context = InviteContext {
        invite_url: url.clone(),
        site_name: state.config.site.name.clone(),
        email: invitation.email.clone(),
        key: invitation.key.clone(),
        inviter: invitation.inviter.as_ref().map(ToString::to_string),
    };

    state
        .adapter
        .send_mail(EMAIL_INVITE_TEMPLATE, &invitation.email, &context)
        .await?;

    let invitation = state
        .sdb
        .update::<Option<Invitation>>(invitation.id.clone())
        .merge(json!({ "sent": now }))
        .await?
        .ok_or(Error::NotFound)?;

    info!("Sent invitation to {}", invitation.email);
    state.events.publish(InvitationEvent::InviteUrlSent {
        invitation: invitation.clone(),
        invite_url: url,
        inviter: actor,
    });
    Ok(invitation)
}

/// Stashes the invitation in the session and returns where to continue the
/// signup. `accepted` is left alone until [`mark_accepted`].
pub fn accept(
    adapter: &dyn InvitationsAdapter,
    session: &Session,
    invitation: &Invitation,
    settings: &InvitationSettings,
) -> String {
    adapter.stash_verified_email(session, &invitation.email);
    adapter.stash_invitation(session, invitation.id.clone());
    info!("Invitation to - {} - has been accepted", invitation.email);
    settings.signup_redirect.clone()
}

pub async fn mark_accepted(state: &AppState, invitation_id: &RecordId) -> Result<Invitation> {
    let invitation = state
        .sdb
        .update::<Option<Invitation>>(invitation_id.clone())
        .merge(json!({ "accepted": true }))
        .await?
        .ok_or(Error::NotFound)?;

    state.events.publish(InvitationEvent::InviteAccepted {
        invitation_id: invitation.id.clone(),
        email: invitation.email.clone(),
    });
    Ok(invitation)
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::{
        consts::auth_const::USER_TABLE,
        mail::MemoryTransport,
        models::user::UserReqForSignUp,
        state::test_state::{test_state, test_state_with},
    };

    fn days(n: i64) -> Duration {
        Duration::days(n)
    }

    async fn sent_at(state: &AppState, email: &str, sent: DateTime<Utc>) -> Invitation {
        let invitation = create(&state.sdb, email, None, sent).await.unwrap();
        send(state, invitation, None, sent).await.unwrap()
    }

    async fn accepted(state: &AppState, email: &str) -> Invitation {
        let invitation = create(&state.sdb, email, None, Utc::now()).await.unwrap();
        mark_accepted(state, &invitation.id).await.unwrap()
    }

    #[tokio::test]
    async fn test_create_invitation() {
        let (state, _) = test_state().await;
        let now = Utc.with_ymd_and_hms(2015, 7, 30, 12, 0, 6).unwrap();

        let invitation = create(&state.sdb, "email@example.com", None, now)
            .await
            .unwrap();

        assert_eq!(invitation.email, "email@example.com");
        assert_eq!(invitation.key.len(), 64);
        assert!(!invitation.accepted);
        assert!(invitation.sent.is_none());
        assert_eq!(invitation.created, now);
    }

    #[tokio::test]
    async fn test_duplicate_key_fails_loudly() {
        let (state, _) = test_state().await;
        let data = CreateInvitation::init("email@example.com".to_string(), None, Utc::now());

        insert(&state.sdb, data.clone()).await.unwrap();
        let err = insert(&state.sdb, data).await.unwrap_err();
        assert!(matches!(err, Error::SurrealError(_)));
    }

    #[tokio::test]
    async fn test_valid_and_expired_sets() {
        let (state, _) = test_state().await;
        let now = Utc::now();
        let expiry = days(3);

        accepted(&state, "email1@example.com").await;
        sent_at(&state, "email2@example.com", now - days(4)).await;
        create(&state.sdb, "email3@example.com", None, now)
            .await
            .unwrap();
        sent_at(&state, "email4@example.com", now - days(2)).await;
        sent_at(&state, "email5@example.com", now - expiry).await;

        let mut valid: Vec<String> = all_valid(&state.sdb, now, expiry)
            .await
            .unwrap()
            .into_iter()
            .map(|i| i.email)
            .collect();
        valid.sort();
        let mut expired: Vec<String> = all_expired(&state.sdb, now, expiry)
            .await
            .unwrap()
            .into_iter()
            .map(|i| i.email)
            .collect();
        expired.sort();

        assert_eq!(valid, vec!["email3@example.com", "email4@example.com"]);
        assert_eq!(
            expired,
            vec!["email1@example.com", "email2@example.com", "email5@example.com"]
        );

        // an expiry reaching past the calendar keeps every sent invitation valid
        let forever = days(i64::from(u32::MAX));
        assert_eq!(all_valid(&state.sdb, now, forever).await.unwrap().len(), 4);
        assert_eq!(all_expired(&state.sdb, now, forever).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_find_valid_by_key_ignores_case() {
        let (state, _) = test_state().await;
        let invitation = create(&state.sdb, "email@example.com", None, Utc::now())
            .await
            .unwrap();

        let found = find_valid_by_key(
            &state.sdb,
            &invitation.key.to_uppercase(),
            Utc::now(),
            days(3),
        )
        .await
        .unwrap()
        .expect("invitation");
        assert_eq!(found.id, invitation.id);

        let missing = find_valid_by_key(&state.sdb, "invalidKey", Utc::now(), days(3))
            .await
            .unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_find_valid_by_key_skips_consumed_and_expired() {
        let (state, _) = test_state().await;
        let now = Utc::now();
        let used = accepted(&state, "used@example.com").await;
        let old = sent_at(&state, "old@example.com", now - days(3)).await;

        for key in [used.key, old.key] {
            let found = find_valid_by_key(&state.sdb, &key, now, days(3))
                .await
                .unwrap();
            assert!(found.is_none());
        }
    }

    #[tokio::test]
    async fn test_validate_invitation_rules() {
        let (state, _) = test_state().await;
        let now = Utc::now();
        accepted(&state, "already@accepted.com").await;
        sent_at(&state, "pending@example.com", now - days(2)).await;
        sent_at(&state, "lapsed@example.com", now - days(5)).await;

        let check = |email: &'static str| validate_invitation(&state.sdb, email, now, days(3));

        assert!(matches!(
            check("already@accepted.com").await,
            Err(Error::Rejected(EmailRejection::AlreadyAccepted))
        ));
        assert!(matches!(
            check("pending@example.com").await,
            Err(Error::Rejected(EmailRejection::AlreadyInvited))
        ));
        assert!(check("lapsed@example.com").await.is_ok());
        assert!(check("bogger@something.com").await.is_ok());
    }

    #[tokio::test]
    async fn test_clean_email_checks_format_and_accounts() {
        let (state, _) = test_state().await;
        let now = Utc::now();
        let _: Option<User> = state
            .sdb
            .create(USER_TABLE)
            .content(UserReqForSignUp {
                user_name: "flobble".to_string(),
                email: "flobble@example.com".to_string(),
                email_verified: true,
                created_at: now.to_rfc3339(),
            })
            .await
            .unwrap();

        assert!(matches!(
            clean_email(&state.sdb, "xample.com", now, days(3)).await,
            Err(Error::Rejected(EmailRejection::InvalidEmail))
        ));
        assert!(matches!(
            clean_email(&state.sdb, "invalid@example", now, days(3)).await,
            Err(Error::Rejected(EmailRejection::InvalidEmail))
        ));
        assert!(matches!(
            clean_email(&state.sdb, "flobble@example.com", now, days(3)).await,
            Err(Error::Rejected(EmailRejection::UserRegisteredEmail))
        ));
        assert!(
            clean_email(&state.sdb, "bogger@something.com", now, days(3))
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn test_send_invitation() {
        let (state, mailer) = test_state().await;
        let mut events = state.events.subscribe();
        let now = Utc.with_ymd_and_hms(2015, 7, 30, 12, 0, 6).unwrap();
        let actor = RecordId::from_table_key("users", "monkey");

        let invitation = create(&state.sdb, "email@example.com", None, now)
            .await
            .unwrap();
        let sent = send(&state, invitation.clone(), Some(actor.clone()), now)
            .await
            .unwrap();

        assert_eq!(sent.sent, Some(now));
        let expected_url = format!(
            "http://testserver/invitations/accept-invite/{}",
            invitation.key
        );

        let outbox = mailer.outbox();
        assert_eq!(outbox.len(), 1);
        assert_eq!(outbox[0].to, "email@example.com");
        assert!(outbox[0].subject.contains("Invitation to join example.com"));
        assert!(outbox[0].text.contains(&expected_url));

        match events.try_recv().expect("event") {
            InvitationEvent::InviteUrlSent {
                invitation,
                invite_url,
                inviter,
            } => {
                assert_eq!(invitation.id, sent.id);
                assert_eq!(invite_url, expected_url);
                assert_eq!(inviter, Some(actor));
            }
            other => panic!("unexpected event {:?}", other),
        }
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_send_is_stamped_once() {
        let (state, _) = test_state().await;
        let sent = sent_at(&state, "email@example.com", Utc::now()).await;
        let err = send(&state, sent, None, Utc::now()).await.unwrap_err();
        assert!(matches!(err, Error::AlreadySent(_)));
    }

    #[tokio::test]
    async fn test_failed_mail_leaves_invitation_unsent() {
        let state = test_state_with(MemoryTransport::failing()).await;
        let invitation = create(&state.sdb, "email@example.com", None, Utc::now())
            .await
            .unwrap();

        let err = send(&state, invitation, None, Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::MailError(_)));

        let stored = find_by_email(&state.sdb, "email@example.com").await.unwrap();
        assert_eq!(stored.len(), 1);
        assert!(stored[0].sent.is_none());
    }

    #[tokio::test]
    async fn test_accept_stashes_without_consuming() {
        let (state, _) = test_state().await;
        let invitation = create(&state.sdb, "email@example.com", None, Utc::now())
            .await
            .unwrap();
        let session = state.sessions.load(None);

        let redirect = accept(
            state.adapter.as_ref(),
            &session,
            &invitation,
            &state.settings.get(),
        );

        assert_eq!(redirect, "/auth/signup");
        let data = session.data();
        assert_eq!(data.verified_email.as_deref(), Some("email@example.com"));
        assert_eq!(data.invitation, Some(invitation.id.clone()));

        let stored = find_by_email(&state.sdb, "email@example.com").await.unwrap();
        assert!(!stored[0].accepted);
    }

    #[tokio::test]
    async fn test_mark_accepted() {
        let (state, _) = test_state().await;
        let mut events = state.events.subscribe();
        let invitation = create(&state.sdb, "email@example.com", None, Utc::now())
            .await
            .unwrap();

        let accepted = mark_accepted(&state, &invitation.id).await.unwrap();
        assert!(accepted.accepted);

        match events.try_recv().expect("event") {
            InvitationEvent::InviteAccepted { email, .. } => {
                assert_eq!(email, "email@example.com")
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_invite_url() {
        assert_eq!(
            invite_url("http://testserver/", "abc"),
            "http://testserver/invitations/accept-invite/abc"
        );
        assert_eq!(
            invite_url("https://example.com", "abc"),
            "https://example.com/invitations/accept-invite/abc"
        );
    }
}
