use argon2::password_hash::Error as ArError;
use axum::{Json, http::StatusCode, response::IntoResponse};
use jsonwebtoken::errors::Error as JWError;
use serde_json::json;
use surrealdb::Error as SError;

use thiserror::Error;
use tracing::error;

use crate::{config::ConfigError, mail::MailError};

pub type Result<T> = core::result::Result<T, Error>;

/// Why an address cannot be invited.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmailRejection {
    #[error("This e-mail address has already accepted an invite.")]
    AlreadyAccepted,

    #[error("This e-mail address has already been invited.")]
    AlreadyInvited,

    #[error("Enter a valid email address.")]
    InvalidEmail,

    #[error("An active user is using this e-mail address")]
    UserRegisteredEmail,
}

impl EmailRejection {
    /// Short reason reported per entry by the bulk endpoint.
    pub fn reason(&self) -> &'static str {
        match self {
            EmailRejection::AlreadyAccepted => "already accepted",
            EmailRejection::AlreadyInvited => "pending invite",
            EmailRejection::InvalidEmail => "invalid email",
            EmailRejection::UserRegisteredEmail => "user registered email",
        }
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("Argon 2 Error: {0}")]
    Argon2Error(#[from] ArError),

    #[error("Jason web token Error: {0}")]
    JwTError(#[from] JWError),

    #[error("SurrealDb Error: {0}")]
    SurrealError(#[from] SError),

    #[error("Io Error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Config Error: {0}")]
    ConfigError(#[from] ConfigError),

    #[error("Mail Error: {0}")]
    MailError(#[from] MailError),

    #[error("Validator Error: {0}")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Form Rejection Error: {0}")]
    AxumFormRejection(#[from] axum::extract::rejection::FormRejection),

    #[error("Json Error: {0}")]
    SerdeJsonError(#[from] serde_json::Error),

    #[error("{0}")]
    Rejected(#[from] EmailRejection),

    #[error("Invitation `{0}` has already been sent")]
    AlreadySent(String),

    #[error("Invalid login detail")]
    InvalidLoginDetails,

    #[error("User with email `{0}` already exists!")]
    EmailExist(String),

    #[error("Sign Up Closed")]
    SignupClosed,

    #[error("Invalid record id `{0}`")]
    InvalidRecordId(String),

    #[error("Internal Server Error")]
    InternalServerError,
    #[error("Not Found")]
    NotFound,
    #[error("Method Not Allowed")]
    MethodNotAllowed,

    // ! Auth
    #[error("Missing authorization token")]
    MissingToken,
    #[error("Invalid authorization token")]
    InvalidToken,
    #[error("Invalid authorization scheme")]
    InvalidScheme,
    #[error("Token expired")]
    TokenExpired,
}

impl IntoResponse for Error {
    fn into_response(self) -> axum::response::Response {
        let internal = || {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal Error".to_string(),
            )
        };
        let (status, message) = match self {
            Error::Argon2Error(error) => {
                error!("Argon 2 Error:{:#?}", error);
                internal()
            }
            Error::JwTError(error) => {
                error!("JWT Error:{:#?}", error);
                internal()
            }
            Error::SurrealError(error) => {
                error!("Surreal  Error:{:#?}", error);
                internal()
            }
            Error::IoError(error) => {
                error!("Io  Error:{:#?}", error);
                internal()
            }
            Error::ConfigError(error) => {
                error!("Config Error:{:#?}", error);
                internal()
            }
            Error::MailError(error) => {
                error!("Mail Error:{:#?}", error);
                internal()
            }
            Error::AlreadySent(key) => {
                error!("Invitation {} was sent twice", key);
                internal()
            }
            Error::InvalidRecordId(id) => {
                error!("Invalid record id: {}", id);
                internal()
            }
            Error::InternalServerError => internal(),
            Error::ValidationError(error) => {
                let message = format!("Input validation error: [{}]", error).replace('\n', ", ");
                error!("Validation Error:{:#?}", error);
                (StatusCode::BAD_REQUEST, message)
            }
            Error::AxumFormRejection(error) => {
                error!("Axum Form Rejection Error:{:#?}", error);
                (StatusCode::BAD_REQUEST, error.to_string())
            }
            Error::SerdeJsonError(error) => (StatusCode::BAD_REQUEST, error.to_string()),
            Error::Rejected(rejection) => (StatusCode::BAD_REQUEST, rejection.to_string()),
            Error::InvalidLoginDetails => {
                error!("Invalid login details");
                (StatusCode::BAD_REQUEST, "Invalid Login Details".to_string())
            }
            Error::EmailExist(email) => (
                StatusCode::BAD_REQUEST,
                format!("User with email {} already exists!", email),
            ),
            Error::SignupClosed => (StatusCode::FORBIDDEN, "Sign Up Closed".to_string()),
            Error::NotFound => (StatusCode::NOT_FOUND, "Not Found".to_string()),
            Error::MethodNotAllowed => (
                StatusCode::METHOD_NOT_ALLOWED,
                "Method Not Allowed".to_string(),
            ),
            Error::MissingToken => (
                StatusCode::UNAUTHORIZED,
                "Missing authorization token".to_string(),
            ),
            Error::InvalidToken => (
                StatusCode::UNAUTHORIZED,
                "Invalid authorization token".to_string(),
            ),
            Error::InvalidScheme => (
                StatusCode::UNAUTHORIZED,
                "Invalid authorization scheme".to_string(),
            ),
            Error::TokenExpired => (StatusCode::UNAUTHORIZED, "Token expired".to_string()),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}
