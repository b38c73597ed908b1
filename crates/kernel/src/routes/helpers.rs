//! Shared route helpers for session lookup and page rendering.

use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use tower_sessions::Session;

use crate::auth::UserProfile;
use crate::state::AppState;

/// Session key for the authenticated user's profile.
pub const SESSION_USER: &str = "user";

/// Login entry point unauthenticated visitors are sent to.
pub const LOGIN_PATH: &str = "/login";

/// Profile of the logged-in user, if any.
pub async fn current_user(session: &Session) -> Option<UserProfile> {
    match session.get::<UserProfile>(SESSION_USER).await {
        Ok(user) => user,
        Err(e) => {
            tracing::warn!(error = %e, "failed to read user from session");
            None
        }
    }
}

/// Require an authenticated user, or redirect to login.
///
/// Returns the [`UserProfile`] if one is logged in. Returns a redirect
/// response if the session holds no profile.
pub async fn require_login(session: &Session) -> Result<UserProfile, Response> {
    match current_user(session).await {
        Some(user) => Ok(user),
        None => Err(Redirect::to(LOGIN_PATH).into_response()),
    }
}

/// Render a page template with the user and shared context.
///
/// Adds: `user` (when given), `languages`.
pub fn render_page(
    state: &AppState,
    template: &str,
    user: Option<&UserProfile>,
    mut context: tera::Context,
) -> Response {
    if let Some(user) = user {
        context.insert("user", user);
    }
    context.insert("languages", state.translations().languages());

    match state.theme().render(template, &context) {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), template = %template, "failed to render template");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Html(format!(
                    r#"<!DOCTYPE html>
<html><head><title>Error</title></head>
<body><h1>Template Error</h1><pre>{}</pre></body></html>"#,
                    html_escape(template)
                )),
            )
                .into_response()
        }
    }
}

/// HTML-escape a string for safe output.
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}
