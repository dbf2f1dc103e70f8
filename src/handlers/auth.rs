// src/handlers/auth.rs

use axum::{Json, extract::State, response::IntoResponse};
use serde_json::{Value, json};
use validator::Validate;

use crate::{
    error::AppError,
    models::teacher::LoginRequest,
    state::AppState,
    utils::jwt::{Claims, Role, sign_jwt},
};

fn token_response(claims: &Claims, secret: &str) -> Result<Json<Value>, AppError> {
    let token = sign_jwt(claims, secret)?;

    Ok(Json(json!({
        "token": token,
        "type": "Bearer",
        "user": {
            "name": claims.name,
            "nisn": if claims.role == Role::Student { Some(&claims.sub) } else { None },
            "class": claims.class,
            "role": claims.role,
        }
    })))
}

/// Student login: the NISN is the identifier and also the password.
pub async fn student_login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let nisn = payload.username.trim();
    let student = state
        .store
        .find_student_by_nisn(nisn)
        .await?
        .ok_or(AppError::AuthError("NISN tidak terdaftar.".to_string()))?;

    if payload.password != student.nisn {
        return Err(AppError::AuthError(
            "Password salah. Gunakan NISN sebagai password.".to_string(),
        ));
    }

    tracing::info!("Student logged in: {}", student.nisn);

    let claims = Claims::new(
        &student.nisn,
        Role::Student,
        &student.name,
        Some(&student.class),
        state.config.jwt_expiration,
    )?;
    token_response(&claims, &state.config.jwt_secret)
}

/// Teacher login against the `teachers` table (plain-text comparison).
pub async fn teacher_login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let invalid = || AppError::AuthError("Username atau Password guru salah.".to_string());

    let teacher = state
        .store
        .find_teacher(payload.username.trim())
        .await?
        .ok_or_else(invalid)?;

    if teacher.password != payload.password {
        return Err(invalid());
    }

    tracing::info!("Teacher logged in: {}", teacher.username);

    let claims = Claims::new(
        &teacher.username,
        Role::Teacher,
        &teacher.name,
        None,
        state.config.jwt_expiration,
    )?;
    token_response(&claims, &state.config.jwt_secret)
}
