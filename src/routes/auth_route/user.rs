use axum::{Json, extract::State, http::StatusCode};
use chrono::{DateTime, FixedOffset, Local};
use tracing::info;
use validator::Validate;

use crate::{
    consts::auth_const::{AUTH_PASSWORD_TABLE, USER_TABLE},
    errors::{Error, Result},
    models::{
        invitation::Invitation,
        user::{User, UserReqForSignUp, UserReqWithPassword, UserWithPassword},
    },
    services::invitation::mark_accepted,
    session::Session,
    state::AppState,
    utils::{
        jwt::{Claims, encode_jwt},
        pwd::{hash_password, verify_password},
        validated_form::ValidatedForm,
    },
};

#[derive(Debug, Clone, serde::Deserialize, Validate)]
pub struct SignUpFormRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 3, max = 20))]
    pub username: String,
    #[validate(length(min = 8))]
    pub password: String,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct SignUpFormResponse {
    msg: String,
}

pub async fn sign_up(
    State(state): State<AppState>,
    session: Session,
    ValidatedForm(input): ValidatedForm<SignUpFormRequest>,
) -> Result<(StatusCode, Json<SignUpFormResponse>)> {
    if !state.adapter.is_open_for_signup(&session) {
        return Err(Error::SignupClosed);
    }

    let check_user: Vec<User> = state
        .sdb
        .query("SELECT * FROM type::table($table) WHERE email = $email;")
        .bind(("table", USER_TABLE))
        .bind(("email", input.email.clone()))
        .await?
        .take(0)?;

    if !check_user.is_empty() {
        return Err(Error::EmailExist(input.email.clone()));
    }
    let password_hash = hash_password(input.password.as_bytes())?;
    let created_at = Local::now();
    let created_at: DateTime<FixedOffset> = created_at.with_timezone(created_at.offset());
    let created_at = created_at.to_rfc3339();

    // ? the address was proven by following the invitation link
    let email_verified = session
        .data()
        .verified_email
        .is_some_and(|verified| verified.eq_ignore_ascii_case(&input.email));

    let user_data = UserReqForSignUp {
        user_name: input.username,
        email: input.email.clone(),
        email_verified,
        created_at,
    };
    let user = state
        .sdb
        .create::<Option<User>>(USER_TABLE)
        .content(user_data)
        .await?
        .ok_or(Error::InternalServerError)?;

    let auth_password = UserReqWithPassword {
        user_id: user.id.clone(),
        password_hash,
    };
    let _: Option<UserWithPassword> = state
        .sdb
        .create(AUTH_PASSWORD_TABLE)
        .content(auth_password)
        .await?;

    // ? only the invitation addressed to this account is consumed
    if let Some(invitation_id) = state.adapter.unstash_invitation(&session) {
        let invitation: Option<Invitation> = state.sdb.select(invitation_id).await?;
        match invitation {
            Some(invitation) if invitation.email.eq_ignore_ascii_case(&user.email) => {
                let invitation = mark_accepted(&state, &invitation.id).await?;
                info!("{} signed up through invitation {}", user.email, invitation.id);
            }
            Some(invitation) => {
                info!(
                    "{} signed up with the invitation for {}, leaving it open",
                    user.email, invitation.email
                );
            }
            None => {}
        }
    }

    Ok((
        StatusCode::CREATED,
        Json(SignUpFormResponse {
            msg: format!("user with email: {} created", input.email),
        }),
    ))
}

#[derive(Debug, Clone, serde::Deserialize, Validate)]
pub struct SignInFormRequest {
    #[validate(email)]
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct SignInFormResponse {
    pub token: String,
}

pub async fn sign_in(
    State(state): State<AppState>,
    ValidatedForm(input): ValidatedForm<SignInFormRequest>,
) -> Result<Json<SignInFormResponse>> {
    let user = state
        .sdb
        .query("SELECT * FROM type::table($table) WHERE email = $email;")
        .bind(("table", USER_TABLE))
        .bind(("email", input.email.clone()))
        .await?
        .take::<Vec<User>>(0)?
        .into_iter()
        .next()
        .ok_or(Error::InvalidLoginDetails)?;

    let password = state
        .sdb
        .query("SELECT * FROM type::table($table) WHERE user_id = $user_id;")
        .bind(("table", AUTH_PASSWORD_TABLE))
        .bind(("user_id", user.id.clone()))
        .await?
        .take::<Vec<UserWithPassword>>(0)?
        .into_iter()
        .next()
        .ok_or(Error::InvalidLoginDetails)?;

    if !verify_password(input.password.as_bytes(), &password.password_hash)? {
        return Err(Error::InvalidLoginDetails);
    }

    let token = encode_jwt(&Claims::for_user(&user.id), &state.config.jwt_secret)?;
    info!("{} signed in", user.email);
    Ok(Json(SignInFormResponse { token }))
}
