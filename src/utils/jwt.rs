// src/utils/jwt.rs

use std::time::{SystemTime, UNIX_EPOCH};

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode, header},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::{config::Config, error::AppError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Teacher,
}

/// JWT Claims structure. Mirrors the client's `user_info` record.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Claims {
    /// Subject: the NISN for students, the username for teachers.
    pub sub: String,
    pub role: Role,
    pub name: String,
    /// Students only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,
    /// Expiration time as Unix timestamp.
    pub exp: usize,
}

impl Claims {
    pub fn new(sub: &str, role: Role, name: &str, class: Option<&str>, expiration_seconds: u64) -> Result<Self, AppError> {
        let exp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| AppError::InternalServerError(e.to_string()))?
            .as_secs() as usize
            + expiration_seconds as usize;

        Ok(Self {
            sub: sub.to_owned(),
            role,
            name: name.to_owned(),
            class: class.map(str::to_owned),
            exp,
        })
    }

    pub fn require(&self, role: Role) -> Result<(), AppError> {
        if self.role == role {
            Ok(())
        } else {
            Err(AppError::Forbidden("Akses ditolak.".to_string()))
        }
    }
}

pub fn sign_jwt(claims: &Claims, secret: &str) -> Result<String, AppError> {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::InternalServerError(e.to_string()))
}

/// Verifies and decodes a JWT string.
pub fn verify_jwt(token: &str, secret: &str) -> Result<Claims, AppError> {
    let token_data = decode(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| AppError::AuthError("Sesi tidak valid, silakan login ulang.".to_string()))?;

    Ok(token_data.claims)
}

/// Axum Middleware: Authentication.
///
/// Validates the 'Authorization: Bearer <token>' header and injects `Claims`
/// into the request extensions.
pub async fn auth_middleware(
    State(config): State<Config>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    let token = match auth_header.and_then(|h| h.strip_prefix("Bearer ")) {
        Some(token) => token,
        None => return Err(StatusCode::UNAUTHORIZED),
    };

    match verify_jwt(token, &config.jwt_secret) {
        Ok(claims) => {
            req.extensions_mut().insert(claims);
            Ok(next.run(req).await)
        }
        Err(_) => Err(StatusCode::UNAUTHORIZED),
    }
}

async fn role_gate(role: Role, req: Request<Body>, next: Next) -> Result<Response, StatusCode> {
    let claims = req
        .extensions()
        .get::<Claims>()
        .ok_or(StatusCode::UNAUTHORIZED)?;

    if claims.role != role {
        return Err(StatusCode::FORBIDDEN);
    }

    Ok(next.run(req).await)
}

/// Must be used AFTER `auth_middleware`.
pub async fn teacher_middleware(req: Request<Body>, next: Next) -> Result<Response, StatusCode> {
    role_gate(Role::Teacher, req, next).await
}

/// Must be used AFTER `auth_middleware`.
pub async fn student_middleware(req: Request<Body>, next: Next) -> Result<Response, StatusCode> {
    role_gate(Role::Student, req, next).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_student_claims() {
        let claims = Claims::new("0051234567", Role::Student, "Andi", Some("XI TKR 1"), 60).unwrap();
        let token = sign_jwt(&claims, "secret").unwrap();
        let decoded = verify_jwt(&token, "secret").unwrap();
        assert_eq!(decoded.sub, "0051234567");
        assert_eq!(decoded.role, Role::Student);
        assert_eq!(decoded.class.as_deref(), Some("XI TKR 1"));
    }

    #[test]
    fn wrong_secret_is_an_auth_error() {
        let claims = Claims::new("guru", Role::Teacher, "Pak Guru", None, 60).unwrap();
        let token = sign_jwt(&claims, "secret").unwrap();
        assert!(matches!(verify_jwt(&token, "other"), Err(AppError::AuthError(_))));
    }

    #[test]
    fn require_checks_role() {
        let claims = Claims::new("guru", Role::Teacher, "Pak Guru", None, 60).unwrap();
        assert!(claims.require(Role::Teacher).is_ok());
        assert!(matches!(claims.require(Role::Student), Err(AppError::Forbidden(_))));
    }
}
