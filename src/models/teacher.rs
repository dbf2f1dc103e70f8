// src/models/teacher.rs

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Represents the 'teachers' table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Teacher {
    pub id: Uuid,
    pub username: String,

    /// Stored and compared as plain text.
    #[serde(skip)]
    pub password: String,

    pub name: String,
}

/// Login body shared by both roles. For students `username` is the NISN.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, max = 50, message = "Username wajib diisi."))]
    pub username: String,
    #[validate(length(min = 1, max = 128, message = "Password wajib diisi."))]
    pub password: String,
}
