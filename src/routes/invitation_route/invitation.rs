use std::collections::BTreeMap;

use axum::{
    Extension, Form, Json,
    body::Bytes,
    extract::{Path, State},
    http::{Method, StatusCode},
    response::{IntoResponse, Redirect, Response},
};
use chrono::Utc;
use serde_json::Value;
use surrealdb::RecordId;
use tracing::error;

use crate::{
    errors::{EmailRejection, Error, Result},
    middleware::UserId,
    services::invitation::{self as invitations, clean_email, validate_invitation},
    session::Session,
    state::AppState,
    utils::{email::is_valid_email, get_record_id::get_record_id_from_string},
};

#[derive(serde::Deserialize, Debug, Clone)]
pub struct InviteForm {
    pub email: String,
}

#[derive(serde::Serialize, Debug, Clone)]
pub struct InviteFormSuccess {
    pub success_message: String,
}

#[derive(serde::Serialize, Debug, Clone)]
pub struct InviteFormErrors {
    pub errors: BTreeMap<&'static str, Vec<String>>,
}

fn form_invalid(message: String) -> Response {
    let errors = InviteFormErrors {
        errors: BTreeMap::from([("email", vec![message])]),
    };
    (StatusCode::BAD_REQUEST, Json(errors)).into_response()
}

async fn create_and_send(state: &AppState, email: &str, inviter: RecordId) -> Result<()> {
    let now = Utc::now();
    let invitation = invitations::create(&state.sdb, email, Some(inviter.clone()), now).await?;
    invitations::send(state, invitation, Some(inviter), now).await?;
    Ok(())
}

pub async fn send_invite(
    State(state): State<AppState>,
    Extension(UserId(user_id)): Extension<UserId>,
    Form(input): Form<InviteForm>,
) -> Result<Response> {
    let email = input.email.trim().to_string();
    let settings = state.settings.get();
    let inviter = get_record_id_from_string(&user_id)?;

    let invited = match clean_email(&state.sdb, &email, Utc::now(), settings.expiry()).await {
        Ok(()) => create_and_send(&state, &email, inviter).await,
        Err(Error::Rejected(rejection)) => return Ok(form_invalid(rejection.to_string())),
        Err(e) => Err(e),
    };

    if let Err(e) = invited {
        error!("Failed to invite {}: {:#?}", email, e);
        return Ok(form_invalid(format!("Could not send an invitation to {}.", email)));
    }

    Ok((
        StatusCode::OK,
        Json(InviteFormSuccess {
            success_message: format!("{} has been invited", email),
        }),
    )
        .into_response())
}

#[derive(serde::Serialize, Debug, Clone, Default, PartialEq)]
pub struct JsonInviteResponse {
    pub valid: Vec<BTreeMap<String, String>>,
    pub invalid: Vec<BTreeMap<String, String>>,
}

impl JsonInviteResponse {
    fn valid(&mut self, email: String) {
        self.valid
            .push(BTreeMap::from([(email, "invited".to_string())]));
    }

    fn invalid(&mut self, email: String, reason: &str) {
        self.invalid
            .push(BTreeMap::from([(email, reason.to_string())]));
    }
}

pub async fn send_json_invite(
    State(state): State<AppState>,
    Extension(UserId(user_id)): Extension<UserId>,
    method: Method,
    body: Bytes,
) -> Result<(StatusCode, Json<JsonInviteResponse>)> {
    if method != Method::POST {
        return Err(Error::MethodNotAllowed);
    }
    let inviter = get_record_id_from_string(&user_id)?;
    let expiry = state.settings.get().expiry();
    let invitees: Value = serde_json::from_slice(&body)?;
    let mut response = JsonInviteResponse::default();

    if let Value::Array(invitees) = invitees {
        for invitee in invitees {
            // ! anything that isn't a string is skipped
            let Value::String(email) = invitee else {
                continue;
            };

            if !is_valid_email(&email) {
                response.invalid(email, EmailRejection::InvalidEmail.reason());
                continue;
            }
            let invited = match validate_invitation(&state.sdb, &email, Utc::now(), expiry).await {
                Ok(()) => create_and_send(&state, &email, inviter.clone()).await,
                Err(Error::Rejected(rejection)) => {
                    response.invalid(email, rejection.reason());
                    continue;
                }
                Err(e) => Err(e),
            };

            // ! a failing entry never stops the rest of the batch
            match invited {
                Ok(()) => response.valid(email),
                Err(e) => {
                    error!("Failed to invite {}: {:#?}", email, e);
                    response.invalid(email, "send failed");
                }
            }
        }
    }

    let status = if response.valid.is_empty() {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::CREATED
    };
    Ok((status, Json(response)))
}

pub async fn accept_invite(
    State(state): State<AppState>,
    session: Session,
    method: Method,
    Path(key): Path<String>,
) -> Result<Redirect> {
    let settings = state.settings.get();
    if method == Method::GET && !settings.confirm_invite_on_get {
        return Err(Error::NotFound);
    }

    let invitation = invitations::find_valid_by_key(&state.sdb, &key, Utc::now(), settings.expiry())
        .await?
        .ok_or(Error::NotFound)?;

    let target = invitations::accept(state.adapter.as_ref(), &session, &invitation, &settings);
    Ok(Redirect::to(&target))
}
