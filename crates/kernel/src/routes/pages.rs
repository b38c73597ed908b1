//! Authenticated dashboard pages.

use axum::Router;
use axum::extract::State;
use axum::response::Response;
use axum::routing::get;
use tower_sessions::Session;

use crate::error::AppError;
use crate::state::AppState;

use super::helpers::{render_page, require_login};

/// Create the dashboard pages router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(dashboard))
        .route("/images", get(images))
        .route("/translation", get(translation))
        .route("/gallery", get(gallery))
}

/// GET /dashboard
async fn dashboard(State(state): State<AppState>, session: Session) -> Response {
    let user = match require_login(&session).await {
        Ok(user) => user,
        Err(redirect) => return redirect,
    };
    render_page(&state, "dashboard.html", Some(&user), tera::Context::new())
}

/// Upload form.
///
/// GET /images
async fn images(State(state): State<AppState>, session: Session) -> Response {
    let user = match require_login(&session).await {
        Ok(user) => user,
        Err(redirect) => return redirect,
    };
    render_page(&state, "images.html", Some(&user), tera::Context::new())
}

/// Translation editor. Languages come from the shared page context.
///
/// GET /translation
async fn translation(State(state): State<AppState>, session: Session) -> Response {
    let user = match require_login(&session).await {
        Ok(user) => user,
        Err(redirect) => return redirect,
    };
    render_page(&state, "translation.html", Some(&user), tera::Context::new())
}

/// Image gallery.
///
/// GET /gallery
async fn gallery(State(state): State<AppState>, session: Session) -> Result<Response, AppError> {
    let user = match require_login(&session).await {
        Ok(user) => user,
        Err(redirect) => return Ok(redirect),
    };

    let images = state.images().list_urls().await?;

    let mut context = tera::Context::new();
    context.insert("images", &images);
    Ok(render_page(&state, "gallery.html", Some(&user), context))
}
