use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

use crate::utils::token::generate_invitation_key;

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InvitationType {
    #[default]
    Default,
    Group,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct Invitation {
    pub id: RecordId,
    pub email: String,
    pub key: String, // ! unique & (len = 64)
    pub created: DateTime<Utc>,
    #[serde(default)]
    pub sent: Option<DateTime<Utc>>, // ! None until the email went out
    pub accepted: bool,
    #[serde(default)]
    pub inviter: Option<RecordId>, // ! userId
    #[serde(default)]
    pub invitation_type: InvitationType,
    #[serde(default)]
    pub subject_id: Option<i64>,
}

impl Invitation {
    /// `None` while unsent, or when the deadline lies beyond the calendar.
    pub fn expires_at(&self, expiry: Duration) -> Option<DateTime<Utc>> {
        self.sent.and_then(|sent| sent.checked_add_signed(expiry))
    }

    /// An invitation that was never sent never expires.
    pub fn is_expired(&self, now: DateTime<Utc>, expiry: Duration) -> bool {
        self.expires_at(expiry)
            .is_some_and(|expires_at| now >= expires_at)
    }

    pub fn is_valid(&self, now: DateTime<Utc>, expiry: Duration) -> bool {
        !self.accepted && !self.is_expired(now, expiry)
    }
}

impl std::fmt::Display for Invitation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.inviter {
            Some(inviter) => write!(f, "Invite: {} by {}", self.email, inviter),
            None => write!(f, "Invite: {}", self.email),
        }
    }
}

#[derive(Serialize, Debug, Clone)]
pub struct CreateInvitation {
    pub email: String,
    pub key: String,
    pub created: DateTime<Utc>,
    pub sent: Option<DateTime<Utc>>,
    pub accepted: bool,
    pub inviter: Option<RecordId>,
    pub invitation_type: InvitationType,
    pub subject_id: Option<i64>,
}

impl CreateInvitation {
    pub fn init(email: String, inviter: Option<RecordId>, now: DateTime<Utc>) -> Self {
        Self {
            email,
            key: generate_invitation_key(),
            created: now,
            sent: None,
            accepted: false,
            inviter,
            invitation_type: InvitationType::Default,
            subject_id: None,
        }
    }
}
