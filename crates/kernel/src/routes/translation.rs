//! Translation JSON API.
//!
//! Reads are public so pages can fetch their strings; updates require a
//! logged-in user.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::{error, warn};

use crate::state::AppState;
use crate::translation::{Dictionary, validate_language};

use super::helpers::current_user;

/// Single value lookup response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ValueResponse {
    pub value: String,
}

/// Update request body.
#[derive(Debug, Deserialize)]
pub struct UpdateRequest {
    pub language: String,
    pub key: String,
    pub value: String,
}

/// Update response.
#[derive(Debug, Serialize)]
pub struct UpdateResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Error body for failed reads.
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: String,
}

/// Create the translation API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/translation/update", post(update))
        .route("/api/translation/{language}", get(read_all))
        .route("/api/translation/{language}/{key}", get(read_one))
}

/// GET /api/translation/{language}/{key}
///
/// Unknown languages and keys yield `{"value": ""}`.
async fn read_one(
    State(state): State<AppState>,
    Path((language, key)): Path<(String, String)>,
) -> Json<ValueResponse> {
    Json(ValueResponse {
        value: state.translations().get(&language, &key),
    })
}

/// GET /api/translation/{language}
///
/// Reads the dictionary from the object store, not from memory.
async fn read_all(
    State(state): State<AppState>,
    Path(language): Path<String>,
) -> Result<Json<Dictionary>, (StatusCode, Json<ApiError>)> {
    if let Err(e) = validate_language(&language) {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ApiError {
                error: e.to_string(),
            }),
        ));
    }

    match state.translations().fetch_remote(&language).await {
        Ok(dictionary) => Ok(Json(dictionary)),
        Err(e) => {
            error!(language = %language, error = %e, "failed to fetch translations");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiError {
                    error: "failed to fetch translations".to_string(),
                }),
            ))
        }
    }
}

/// POST /api/translation/update
///
/// Body: `{"language": "en", "key": "hello", "value": "Hello World"}`
async fn update(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<UpdateRequest>,
) -> (StatusCode, Json<UpdateResponse>) {
    if current_user(&session).await.is_none() {
        return failure(StatusCode::UNAUTHORIZED, "authentication required");
    }

    match state
        .translations()
        .update(&request.language, &request.key, &request.value)
        .await
    {
        Ok(()) => (
            StatusCode::OK,
            Json(UpdateResponse {
                success: true,
                error: None,
            }),
        ),
        Err(e) if e.is_client_error() => {
            warn!(language = %request.language, error = %e, "rejected translation update");
            failure(StatusCode::BAD_REQUEST, &e.to_string())
        }
        Err(e) => {
            error!(
                language = %request.language,
                key = %request.key,
                error = %e,
                "failed to update translation"
            );
            failure(StatusCode::INTERNAL_SERVER_ERROR, "failed to update translation")
        }
    }
}

fn failure(status: StatusCode, message: &str) -> (StatusCode, Json<UpdateResponse>) {
    (
        status,
        Json(UpdateResponse {
            success: false,
            error: Some(message.to_string()),
        }),
    )
}
