//! HTTP route handlers.

pub mod auth;
pub mod front;
pub mod health;
pub mod helpers;
pub mod images;
pub mod pages;
pub mod translation;

use axum::Router;
use axum::extract::DefaultBodyLimit;

use crate::state::AppState;

/// Build the application router without session or tracing layers.
pub fn app(state: AppState) -> Router {
    let body_limit = DefaultBodyLimit::max(state.max_upload_bytes());

    Router::new()
        .merge(front::router())
        .merge(auth::router())
        .merge(pages::router())
        .merge(images::router())
        .merge(translation::router())
        .merge(health::router())
        .layer(body_limit)
        .with_state(state)
}
