use axum::{Router, middleware::from_fn_with_state};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::{
    config::ServerConfig,
    errors::Result,
    routes::{auth_route::auth_router, invitation_route::invitation_router},
    session::session_middleware,
    state::AppState,
};

pub mod adapter;
pub mod config;
pub mod consts;
pub mod errors;
pub mod events;
pub mod mail;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod session;
pub mod state;
pub mod utils;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ServerConfig::from_env()?;
    let bind = config.bind.clone();
    let state = AppState::init(config).await?;

    info!("Starting server");

    let listener = tokio::net::TcpListener::bind(&bind).await?;
    info!("Serving invitations at http://{}", listener.local_addr()?);
    axum::serve(listener, app(state)).await?;

    Ok(())
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .nest("/auth", auth_router(state.clone()))
        .nest("/invitations", invitation_router(state.clone()))
        .layer(from_fn_with_state(state.clone(), session_middleware))
        .with_state(state)
}
