// src/handlers/attempts.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use uuid::Uuid;

use crate::{
    error::AppError,
    state::AppState,
    timer::AttemptClock,
    utils::jwt::Claims,
};

/// Current attempt state for the logged-in student. Reloading the exam page
/// calls this and gets the remaining time recomputed from the stored start.
pub async fn get_attempt(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(exam_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let exam = state
        .session()
        .exam(exam_id)
        .await?
        .ok_or(AppError::NotFound("Soal tidak ditemukan.".to_string()))?;

    let clock = AttemptClock::new(state.kv.as_ref(), &claims.sub);
    let attempt = clock.state(exam_id, &exam.duration, chrono::Utc::now()).await?;
    Ok(Json(attempt))
}

/// The student accepted the rules: start (or resume) the attempt. Open
/// sockets of this student start counting down.
pub async fn start_attempt(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(exam_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let exam = state
        .session()
        .exam(exam_id)
        .await?
        .ok_or(AppError::NotFound("Soal tidak ditemukan.".to_string()))?;

    let clock = AttemptClock::new(state.kv.as_ref(), &claims.sub);
    let attempt = clock
        .accept_rules(exam_id, &exam.duration, chrono::Utc::now())
        .await?;
    state
        .hub
        .attempt_started(exam_id, &claims.sub, attempt.remaining_seconds);
    Ok(Json(attempt))
}
