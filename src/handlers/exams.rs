// src/handlers/exams.rs

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::AppError,
    models::exam::{Exam, ExamListParams, ExamUpdate, NewExam},
    session::SessionStore,
    utils::html::clean_html,
};

fn not_found() -> AppError {
    AppError::NotFound("Soal tidak ditemukan.".to_string())
}

/// "120" becomes "120 Menit"; anything with a unit is kept as typed.
fn normalize_duration(raw: &str) -> String {
    let trimmed = raw.trim();
    if !trimmed.is_empty() && trimmed.chars().all(|c| c.is_ascii_digit()) {
        format!("{} Menit", trimmed)
    } else {
        trimmed.to_string()
    }
}

fn search_exams(exams: &[Exam], query: Option<&str>) -> Vec<Exam> {
    let Some(q) = query.map(str::trim).filter(|q| !q.is_empty()) else {
        return exams.to_vec();
    };
    let q = q.to_lowercase();
    exams
        .iter()
        .filter(|e| e.title.to_lowercase().contains(&q) || e.description.to_lowercase().contains(&q))
        .cloned()
        .collect()
}

/// Lists exams, newest first. Available to both roles.
pub async fn list_exams(
    State(session): State<SessionStore>,
    Query(params): Query<ExamListParams>,
) -> Result<impl IntoResponse, AppError> {
    let exams = session.fetch_exams().await?;
    Ok(Json(search_exams(&exams, params.q.as_deref())))
}

pub async fn get_exam(
    State(session): State<SessionStore>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let exam = session.exam(id).await?.ok_or_else(not_found)?;
    Ok(Json(exam))
}

/// Creates an exam packet. Teacher only.
/// Returns 201 and the refreshed exam list.
pub async fn create_exam(
    State(session): State<SessionStore>,
    Json(mut payload): Json<NewExam>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    payload.description = clean_html(&payload.description);
    payload.duration = normalize_duration(&payload.duration);

    let exams = session.add_exam(payload).await?;
    Ok((StatusCode::CREATED, Json(exams)))
}

/// Partial update. Teacher only.
pub async fn update_exam(
    State(session): State<SessionStore>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ExamUpdate>,
) -> Result<impl IntoResponse, AppError> {
    let mut payload = payload.normalized();
    payload.validate()?;

    payload.description = payload.description.map(|d| clean_html(&d));
    payload.duration = payload.duration.map(|d| normalize_duration(&d));

    let exams = session.update_exam(id, payload).await?;
    Ok(Json(exams))
}

/// Deletes an exam and its submissions. Teacher only.
pub async fn delete_exam(
    State(session): State<SessionStore>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let exams = session.delete_exam(id).await?;
    Ok(Json(exams))
}
