use axum::{Router, routing::post};

use crate::{
    routes::auth_route::user::{sign_in, sign_up},
    state::AppState,
};

pub mod user;

pub fn auth_router(config: AppState) -> Router<AppState> {
    Router::new()
        .route("/signin", post(sign_in))
        .route("/signup", post(sign_up))
        .with_state(config)
}
