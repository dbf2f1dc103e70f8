// src/handlers/blueprints.rs

use axum::{
    Json,
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;

use crate::{error::AppError, state::AppState, storage::BLUEPRINT_BUCKET};

#[derive(Debug, Default, Deserialize)]
pub struct UploadParams {
    #[serde(default)]
    pub upsert: bool,
}

/// Uploads a blueprint image under the given file name. Teacher only.
/// Returns the public URL to store as the exam's `imageUrl`.
pub async fn upload_blueprint(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(params): Query<UploadParams>,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    if body.is_empty() {
        return Err(AppError::BadRequest("File gambar kosong.".to_string()));
    }

    let url = state
        .blobs
        .upload(BLUEPRINT_BUCKET, &name, &body, params.upsert)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "name": name, "url": url })),
    ))
}
