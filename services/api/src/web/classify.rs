//! services/api/src/web/classify.rs
//!
//! The image-classification endpoint and the upload/classify pipeline it
//! shares with the camera-capture flow.
//!
//! Per request: parse the multipart body, spool the `image` part to a
//! temporary file, submit its bytes for label detection, append the labels to
//! the audit collection, respond. The temporary file is removed when the
//! request finishes.

use crate::web::rest::{fail, ClassifyResponse, ErrorBody, HandlerError};
use crate::web::state::AppState;
use axum::{
    body::Bytes,
    extract::{FromRequest, Multipart, Request, State},
    http::{header, Method, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use pantry_core::domain::ClassificationResult;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::NamedTempFile;
use tracing::{error, info, warn};

/// The multipart field carrying the image.
pub const IMAGE_FIELD: &str = "image";

pub const PARSE_ERROR: &str = "Error parsing the files";
pub const MISSING_IMAGE_ERROR: &str = "Image file not found";
pub const CLASSIFY_ERROR: &str = "Error classifying image";

//=========================================================================================
// Upload Pipeline
//=========================================================================================

/// Reads the multipart body and spools the `image` part into a temporary file
/// under `upload_dir`. Other parts are drained and ignored.
pub async fn spool_image(
    multipart: &mut Multipart,
    upload_dir: &Path,
) -> Result<NamedTempFile, HandlerError> {
    while let Some(field) = multipart.next_field().await.map_err(parse_failed)? {
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }
        let data = field.bytes().await.map_err(parse_failed)?;
        return spool_bytes(data, upload_dir.to_path_buf())
            .await
            .map_err(parse_failed);
    }

    Err(fail(StatusCode::BAD_REQUEST, MISSING_IMAGE_ERROR))
}

/// Writes `data` to a new temporary file in `dir` on the blocking pool. The
/// file is deleted when the returned handle is dropped.
async fn spool_bytes(data: Bytes, dir: PathBuf) -> std::io::Result<NamedTempFile> {
    tokio::task::spawn_blocking(move || -> std::io::Result<NamedTempFile> {
        let mut file = NamedTempFile::new_in(&dir)?;
        file.write_all(&data)?;
        file.flush()?;
        Ok(file)
    })
    .await
    .map_err(std::io::Error::other)?
}

fn parse_failed(e: impl std::fmt::Display) -> HandlerError {
    error!("Failed to parse upload: {}", e);
    fail(StatusCode::INTERNAL_SERVER_ERROR, PARSE_ERROR)
}

/// Submits the spooled image for label detection and records the result in
/// the audit collection. A failed audit write is logged and does not fail
/// the classification.
pub async fn classify_file(
    state: &AppState,
    file: &NamedTempFile,
) -> Result<ClassificationResult, HandlerError> {
    let image = tokio::fs::read(file.path()).await.map_err(|e| {
        error!("Failed to read spooled image {:?}: {}", file.path(), e);
        fail(StatusCode::INTERNAL_SERVER_ERROR, PARSE_ERROR)
    })?;

    let labels = state.vision.detect_labels(&image).await.map_err(|e| {
        error!("Label detection failed: {:?}", e);
        fail(StatusCode::INTERNAL_SERVER_ERROR, CLASSIFY_ERROR)
    })?;
    let result = ClassificationResult::from_labels(labels);
    info!(labels = ?result.labels, "Image classified");

    match state.db.append_classification(&result.labels).await {
        Ok(id) => info!(audit_id = %id, "Classification recorded"),
        Err(e) => warn!("Failed to record classification: {:?}", e),
    }

    Ok(result)
}

//=========================================================================================
// Handler
//=========================================================================================

/// Classify an uploaded image.
///
/// Accepts a multipart/form-data request with a file part named `image` and
/// returns the detected labels. Any method other than POST is rejected.
#[utoipa::path(
    post,
    path = "/api/classifyImage",
    request_body(content_type = "multipart/form-data", description = "The image to classify, in the `image` field."),
    responses(
        (status = 200, description = "Labels detected", body = ClassifyResponse),
        (status = 400, description = "No image file in the form", body = ErrorBody),
        (status = 405, description = "Method not allowed"),
        (status = 500, description = "Parse or classification failure", body = ErrorBody)
    )
)]
pub async fn classify_image_handler(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Response {
    if request.method() != Method::POST {
        return (StatusCode::METHOD_NOT_ALLOWED, [(header::ALLOW, "POST")]).into_response();
    }

    match classify_request(&state, request).await {
        Ok(result) => (
            StatusCode::OK,
            Json(ClassifyResponse {
                labels: result.labels,
            }),
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}

async fn classify_request(
    state: &AppState,
    request: Request,
) -> Result<ClassificationResult, HandlerError> {
    let mut multipart = Multipart::from_request(request, &()).await.map_err(|e| {
        error!("Rejected multipart body: {}", e);
        fail(StatusCode::INTERNAL_SERVER_ERROR, PARSE_ERROR)
    })?;

    let file = spool_image(&mut multipart, &state.config.upload_dir).await?;
    classify_file(state, &file).await
}
