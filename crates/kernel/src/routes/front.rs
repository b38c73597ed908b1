//! Front page route handler.

use axum::Router;
use axum::response::Redirect;
use axum::routing::get;
use tower_sessions::Session;

use crate::state::AppState;

use super::helpers::{LOGIN_PATH, current_user};

/// Create the front page router.
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(front_page))
}

/// Front page handler.
///
/// Sends logged-in users to their dashboard and everyone else to login.
async fn front_page(session: Session) -> Redirect {
    if current_user(&session).await.is_some() {
        Redirect::to("/dashboard")
    } else {
        Redirect::to(LOGIN_PATH)
    }
}
