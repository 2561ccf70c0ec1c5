use axum::{
    Router, middleware,
    routing::{any, get, post},
};

use crate::{
    middleware::{auth_jwt_middleware, json_invites_enabled},
    routes::invitation_route::invitation::{accept_invite, send_invite, send_json_invite},
    state::AppState,
};

pub mod invitation;

pub fn invitation_router(config: AppState) -> Router<AppState> {
    let protected = |config: AppState| -> Router<AppState> {
        Router::new()
            .route("/send-invite/", post(send_invite))
            .layer(middleware::from_fn_with_state(
                config.clone(),
                auth_jwt_middleware,
            ))
            .with_state(config)
    };
    // ? the switch is checked before authentication, the method after it
    let json = |config: AppState| -> Router<AppState> {
        Router::new()
            .route("/send-json-invite/", any(send_json_invite))
            .layer(middleware::from_fn_with_state(
                config.clone(),
                auth_jwt_middleware,
            ))
            .layer(middleware::from_fn_with_state(
                config.clone(),
                json_invites_enabled,
            ))
            .with_state(config)
    };

    Router::new()
        .route(
            "/accept-invite/{key}",
            get(accept_invite).post(accept_invite),
        )
        .merge(protected(config.clone()))
        .merge(json(config.clone()))
        .with_state(config)
}
