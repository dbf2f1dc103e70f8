// src/handlers/students.rs

use axum::{
    Json,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::IntoResponse,
};
use uuid::Uuid;

use crate::{
    error::AppError,
    import::{BAD_FORMAT, ImportPayload, TEMPLATE_CSV},
    models::student::{StudentListParams, search_students},
    state::AppState,
};

/// Lists students ordered by name, optionally filtered.
pub async fn list_students(
    State(state): State<AppState>,
    Query(params): Query<StudentListParams>,
) -> Result<impl IntoResponse, AppError> {
    let students = state.store.list_students().await?;
    Ok(Json(search_students(&students, params.q.as_deref())))
}

/// Bulk import from worksheet rows or CSV text.
///
/// Rows missing name, NISN or class are skipped. The remaining batch is
/// inserted atomically; any duplicate NISN rejects all of it.
pub async fn import_students(
    State(state): State<AppState>,
    Json(payload): Json<ImportPayload>,
) -> Result<impl IntoResponse, AppError> {
    let students = payload.into_students();
    if students.is_empty() {
        return Err(AppError::BadRequest(BAD_FORMAT.to_string()));
    }

    let inserted = state.store.insert_students(students).await?;
    tracing::info!("Imported {} students", inserted);

    let students = state.store.list_students().await?;
    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "imported": inserted,
            "students": students,
        })),
    ))
}

/// Empty import template with the expected headers.
pub async fn import_template() -> impl IntoResponse {
    (
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"Template_Import_Siswa.csv\"",
            ),
        ],
        TEMPLATE_CSV,
    )
}

pub async fn delete_student(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    state.store.delete_student(id).await?;
    let students = state.store.list_students().await?;
    Ok(Json(students))
}
