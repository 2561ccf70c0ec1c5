use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use jsonwebtoken::errors::ErrorKind;

use crate::errors::{Error, Result as RResult};
use crate::state::AppState;
use crate::utils::jwt::decode_jwt;

/// Id (`users:<key>`) of the authenticated caller.
#[derive(Debug, Clone)]
pub struct UserId(pub String);

pub async fn auth_jwt_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<impl IntoResponse, Response> {
    let request = buffer_request_and_authenticate(request, &state.config.jwt_secret).await?;

    Ok(next.run(request).await)
}

async fn buffer_request_and_authenticate<B>(
    request: Request<B>,
    secret: &str,
) -> Result<Request<B>, Response> {
    let (mut parts, body) = request.into_parts();
    let user_id = check_auth_parts(&parts, secret)
        .await
        .map_err(IntoResponse::into_response)?;

    parts.extensions.insert(user_id);

    Ok(Request::from_parts(parts, body))
}

async fn check_auth_parts(parts: &Parts, secret: &str) -> RResult<UserId> {
    let header_value = parts
        .headers
        .get(AUTHORIZATION)
        .ok_or(Error::MissingToken)?
        .to_str()
        .map_err(|_| Error::InvalidToken)?;

    let mut parts = header_value.trim().splitn(2, ' ');

    let scheme = parts.next().ok_or(Error::MissingToken)?;
    let token = parts.next().ok_or(Error::MissingToken)?;

    if scheme != "Bearer" {
        tracing::warn!("Invalid auth scheme: {scheme}");
        return Err(Error::InvalidScheme);
    }

    match decode_jwt(token, secret) {
        Ok(data) => Ok(UserId(data.claims.id)),
        Err(Error::JwTError(e)) if matches!(e.kind(), ErrorKind::ExpiredSignature) => {
            Err(Error::TokenExpired)
        }
        Err(_) => Err(Error::InvalidToken),
    }
}

/// Answers 404 for the bulk endpoint while JSON invites are switched off.
pub async fn json_invites_enabled(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    if !state.settings.get().allow_json_invites {
        return Error::NotFound.into_response();
    }
    next.run(request).await
}
