//! Cookie-keyed server-side sessions.
//!
//! Only the two values the invitation flow stashes live here: the verified
//! email and the pending invitation id.

use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{
        HeaderMap, HeaderValue,
        header::{COOKIE, SET_COOKIE},
        request::Parts,
    },
    middleware::Next,
    response::Response,
};
use dashmap::DashMap;
use parking_lot::Mutex;
use surrealdb::RecordId;
use uuid::Uuid;

use crate::{
    consts::invitation_const::SESSION_COOKIE,
    errors::{Error, Result},
    state::AppState,
};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionData {
    pub verified_email: Option<String>,
    pub invitation: Option<RecordId>,
}

#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    sessions: Arc<DashMap<String, SessionData>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle on the session named by `id`. Unknown or missing ids give an
    /// empty handle; nothing is stored until the first write.
    pub fn load(&self, id: Option<&str>) -> Session {
        let id = id
            .filter(|id| self.sessions.contains_key(*id))
            .map(ToString::to_string);
        Session {
            id: Arc::new(Mutex::new(id)),
            store: self.clone(),
        }
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

/// Handle on one visitor's session. Clones share the id, so a handler that
/// writes lets the middleware see the new session.
#[derive(Debug, Clone)]
pub struct Session {
    id: Arc<Mutex<Option<String>>>,
    store: SessionStore,
}

impl Session {
    pub fn id(&self) -> Option<String> {
        self.id.lock().clone()
    }

    pub fn data(&self) -> SessionData {
        self.id()
            .and_then(|id| self.store.sessions.get(&id).map(|data| data.value().clone()))
            .unwrap_or_default()
    }

    /// Applies `f`, creating the stored session on first use. A session left
    /// empty by `f` is dropped from the store.
    pub fn update(&self, f: impl FnOnce(&mut SessionData)) {
        let mut id = self.id.lock();
        let key = id
            .get_or_insert_with(|| Uuid::new_v4().simple().to_string())
            .clone();

        let empty = {
            let mut data = self.store.sessions.entry(key.clone()).or_default();
            f(data.value_mut());
            *data.value() == SessionData::default()
        };
        if empty {
            self.store.sessions.remove(&key);
            *id = None;
        }
    }
}

impl<S> FromRequestParts<S> for Session
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self> {
        parts
            .extensions
            .get::<Session>()
            .cloned()
            .ok_or(Error::InternalServerError)
    }
}

pub async fn session_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let cookie = session_id_from_headers(request.headers());
    let session = state.sessions.load(cookie.as_deref());
    let known = session.id();
    request.extensions_mut().insert(session.clone());

    let mut response = next.run(request).await;

    if let Some(id) = session.id().filter(|id| known.as_ref() != Some(id)) {
        let cookie = format!("{SESSION_COOKIE}={id}; Path=/; HttpOnly; SameSite=Lax");
        if let Ok(value) = HeaderValue::from_str(&cookie) {
            response.headers_mut().append(SET_COOKIE, value);
        }
    }
    response
}

fn session_id_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.to_string())
}
