// src/handlers/mod.rs

pub mod attempts;
pub mod auth;
pub mod blueprints;
pub mod exams;
pub mod live;
pub mod students;
pub mod submissions;
