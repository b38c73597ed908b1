//! Authentication routes (login page, OAuth flow, logout).

use axum::Router;
use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::get;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::{info, warn};

use crate::auth::{AuthError, generate_state_token, verify_state_token};
use crate::error::AppError;
use crate::state::AppState;

use super::helpers::{LOGIN_PATH, SESSION_USER, current_user, render_page};

/// Where users land after logging in.
const DASHBOARD_PATH: &str = "/dashboard";

/// Query parameters the identity provider sends to the callback.
#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Create the auth router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", get(login_page))
        .route("/auth/{provider}", get(start_login))
        .route("/auth/{provider}/callback", get(finish_login))
        .route("/logout", get(logout))
}

/// Login page.
///
/// GET /login
async fn login_page(State(state): State<AppState>, session: Session) -> Response {
    let user = current_user(&session).await;

    let mut context = tera::Context::new();
    context.insert("provider", state.identity().name());

    render_page(&state, "login.html", user.as_ref(), context)
}

/// Start the authorization-code flow.
///
/// GET /auth/{provider}
async fn start_login(
    State(state): State<AppState>,
    session: Session,
    Path(provider): Path<String>,
) -> Result<Response, AppError> {
    let identity = state.identity();
    if provider != identity.name() {
        return Err(AppError::NotFound);
    }

    let token = generate_state_token(&session).await?;
    let url = identity
        .authorize_url(&token)
        .map_err(|e| AppError::Internal(e.into()))?;

    Ok(Redirect::to(&url).into_response())
}

/// Finish the authorization-code flow.
///
/// GET /auth/{provider}/callback
/// - On success stores the profile in a fresh session and redirects to the dashboard
/// - On any failure redirects back to the login page
async fn finish_login(
    State(state): State<AppState>,
    session: Session,
    Path(provider): Path<String>,
    Query(params): Query<CallbackParams>,
) -> Result<Response, AppError> {
    if provider != state.identity().name() {
        return Err(AppError::NotFound);
    }

    match complete_login(&state, &session, params).await {
        Ok(()) => Ok(Redirect::to(DASHBOARD_PATH).into_response()),
        Err(e) => {
            warn!(provider = %provider, error = %e, "login failed");
            Ok(Redirect::to(LOGIN_PATH).into_response())
        }
    }
}

async fn complete_login(
    state: &AppState,
    session: &Session,
    params: CallbackParams,
) -> Result<(), AuthError> {
    let returned_state = params.state.unwrap_or_default();
    if !verify_state_token(session, &returned_state).await? {
        return Err(AuthError::StateMismatch);
    }

    if let Some(error) = params.error {
        return Err(AuthError::ProviderDenied(error));
    }

    let code = params
        .code
        .filter(|c| !c.is_empty())
        .ok_or(AuthError::MissingCode)?;

    let profile = state.identity().exchange(&code).await?;

    // New identity, new session id.
    session
        .cycle_id()
        .await
        .map_err(|e| anyhow::anyhow!("failed to cycle session id: {e}"))?;
    session
        .insert(SESSION_USER, &profile)
        .await
        .map_err(|e| anyhow::anyhow!("failed to store user in session: {e}"))?;

    info!(user_id = %profile.id, provider = %profile.provider, "user logged in");
    Ok(())
}

/// Logout handler.
///
/// GET /logout
/// - Deletes the session from the store and clears its data
/// - Redirects to the login page
async fn logout(session: Session) -> Result<Response, AppError> {
    if let Some(user) = current_user(&session).await {
        info!(user_id = %user.id, "user logged out");
    }

    session
        .flush()
        .await
        .map_err(|e| anyhow::anyhow!("failed to delete session: {e}"))?;

    Ok(Redirect::to(LOGIN_PATH).into_response())
}
