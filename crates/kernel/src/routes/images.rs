//! Image upload and listing route handlers.

use axum::Router;
use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::Response;
use axum::routing::{get, post};
use tower_sessions::Session;
use tracing::warn;

use crate::error::AppError;
use crate::images::UPLOAD_FIELD;
use crate::state::AppState;

use super::helpers::{render_page, require_login};

/// Create the image router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/upload", post(upload))
        .route("/list-images", get(list_images))
}

/// A file pulled out of the multipart body.
struct UploadedFile {
    filename: String,
    content_type: Option<String>,
    data: Vec<u8>,
}

/// Upload an image.
///
/// POST /upload
/// Content-Type: multipart/form-data
///
/// Form fields:
/// - image: The file to upload
async fn upload(
    State(state): State<AppState>,
    session: Session,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, AppError> {
    // Login is checked before the body is looked at.
    let user = match require_login(&session).await {
        Ok(user) => user,
        Err(redirect) => return Ok(redirect),
    };

    let multipart = multipart.map_err(|e| {
        warn!(error = %e, "rejected upload body");
        AppError::BadRequest("expected a multipart/form-data body".to_string())
    })?;

    let file = read_upload(multipart).await?;

    let uploaded = state
        .images()
        .upload(&file.filename, file.content_type.as_deref(), file.data)
        .await?;

    let mut context = tera::Context::new();
    context.insert("image", &uploaded);
    Ok(render_page(
        &state,
        "upload_success.html",
        Some(&user),
        context,
    ))
}

/// Pull the first file under [`UPLOAD_FIELD`] out of the form.
///
/// Rejects forms without one before anything touches storage.
async fn read_upload(mut multipart: Multipart) -> Result<UploadedFile, AppError> {
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                warn!(error = %e, "failed to read multipart body");
                return Err(multipart_error(e, "malformed multipart body"));
            }
        };

        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }

        let Some(filename) = field.file_name().map(str::to_string).filter(|f| !f.is_empty())
        else {
            break;
        };
        let content_type = field.content_type().map(str::to_string);

        let data = field.bytes().await.map_err(|e| {
            warn!(error = %e, "failed to read upload data");
            multipart_error(e, "failed to read file data")
        })?;

        return Ok(UploadedFile {
            filename,
            content_type,
            data: data.to_vec(),
        });
    }

    Err(AppError::BadRequest("no file uploaded".to_string()))
}

/// Map a multipart read failure, keeping the body limit's 413.
fn multipart_error(e: MultipartError, message: &str) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge("upload exceeds the size limit".to_string())
    } else {
        AppError::BadRequest(message.to_string())
    }
}

/// Page listing every uploaded image URL.
///
/// GET /list-images
async fn list_images(State(state): State<AppState>, session: Session) -> Result<Response, AppError> {
    let user = match require_login(&session).await {
        Ok(user) => user,
        Err(redirect) => return Ok(redirect),
    };

    let images = state.images().list_urls().await?;

    let mut context = tera::Context::new();
    context.insert("images", &images);
    Ok(render_page(&state, "image_list.html", Some(&user), context))
}
