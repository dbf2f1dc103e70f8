// src/models/mod.rs

pub mod exam;
pub mod student;
pub mod submission;
pub mod teacher;
