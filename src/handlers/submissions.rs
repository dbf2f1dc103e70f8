// src/handlers/submissions.rs

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::AppError,
    grading::GradeRequest,
    models::submission::{
        NewSubmission, SubmissionListParams, SubmissionStats, SubmitRequest, filter_submissions,
    },
    session::SessionStore,
    state::AppState,
    timer::AttemptClock,
    utils::{
        html::clean_html,
        jwt::Claims,
        link::{INVALID_ONSHAPE_LINK, validate_onshape_link},
    },
};

fn not_found() -> AppError {
    AppError::NotFound("Pengumpulan tidak ditemukan.".to_string())
}

/// Submits the Onshape link for an exam.
///
/// * Validates the link.
/// * Marks the submission late when the attempt has no time left.
/// * Clears the stored attempt start once the row is saved.
/// * Ends the student's live timer.
pub async fn submit(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(exam_id): Path<Uuid>,
    Json(payload): Json<SubmitRequest>,
) -> Result<impl IntoResponse, AppError> {
    let onshape_link = validate_onshape_link(&payload.onshape_link)
        .ok_or(AppError::BadRequest(INVALID_ONSHAPE_LINK.to_string()))?;

    let session = state.session();
    let exam = session
        .exam(exam_id)
        .await?
        .ok_or(AppError::NotFound("Soal tidak ditemukan.".to_string()))?;

    let now = chrono::Utc::now();
    let clock = AttemptClock::new(state.kv.as_ref(), &claims.sub);
    let attempt = clock.state(exam_id, &exam.duration, now).await?;

    let (created, _) = session
        .add_submission(NewSubmission {
            student_name: claims.name.clone(),
            nis: claims.sub.clone(),
            exam_id,
            exam_title: exam.title.clone(),
            submit_time: now,
            onshape_link,
            is_late: attempt.is_late(),
        })
        .await?;

    if let Err(e) = clock.clear(exam_id).await {
        tracing::warn!("Failed to clear attempt start for {}: {}", claims.sub, e);
    }
    state.hub.attempt_submitted(exam_id, &claims.sub);

    tracing::info!(
        "Submission from {} for {} (late: {})",
        claims.sub,
        exam_id,
        created.is_late
    );

    Ok((StatusCode::CREATED, Json(created)))
}

/// The logged-in student's own submissions.
pub async fn my_submissions(
    State(session): State<SessionStore>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let submissions = session.fetch_submissions().await?;
    let mine: Vec<_> = submissions
        .iter()
        .filter(|s| s.nis == claims.sub)
        .cloned()
        .collect();
    Ok(Json(mine))
}

/// Teacher dashboard list with status tab and search.
pub async fn list_submissions(
    State(session): State<SessionStore>,
    Query(params): Query<SubmissionListParams>,
) -> Result<impl IntoResponse, AppError> {
    let submissions = session.fetch_submissions().await?;
    Ok(Json(filter_submissions(&submissions, &params)))
}

pub async fn submission_stats(State(session): State<SessionStore>) -> Result<impl IntoResponse, AppError> {
    let submissions = session.fetch_submissions().await?;
    Ok(Json(SubmissionStats::from_submissions(&submissions)))
}

pub async fn get_submission(
    State(session): State<SessionStore>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let submission = session.submission(id).await?.ok_or_else(not_found)?;
    Ok(Json(submission))
}

pub async fn delete_submission(
    State(session): State<SessionStore>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let submissions = session.delete_submission(id).await?;
    Ok(Json(submissions))
}

/// Grades a submission against the rubric. Teacher only.
///
/// Criteria outside their bounds are rejected; the stored total is the
/// clamped sum. Re-grading overwrites the previous grade.
pub async fn grade_submission(
    State(session): State<SessionStore>,
    Path(id): Path<Uuid>,
    Json(payload): Json<GradeRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let feedback = payload
        .feedback
        .map(|f| clean_html(f.trim()))
        .filter(|f| !f.is_empty());

    let submissions = session
        .grade_submission(id, payload.criteria, feedback)
        .await?;

    let graded = submissions
        .iter()
        .find(|s| s.id == id)
        .cloned()
        .ok_or_else(not_found)?;
    Ok(Json(graded))
}
