// src/store/mod.rs

//! Persistence seams. `DataStore` is the table-oriented backend used by the
//! session store; `KeyValueStore` holds small per-student values such as the
//! attempt start timestamp.

mod memory;
mod postgres;

pub use memory::{MemoryKv, MemoryStore};
pub use postgres::PgStore;

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{
    exam::{Exam, ExamUpdate, NewExam},
    student::{NewStudent, Student},
    submission::{GradeUpdate, NewSubmission, Submission},
    teacher::Teacher,
};

pub const DUPLICATE_NISN: &str = "Beberapa NISN sudah terdaftar di database.";
pub const DUPLICATE_SUBMISSION: &str = "Jawaban untuk ujian ini sudah dikumpulkan.";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Unique constraint violation. Carries the user-facing message.
    #[error("{0}")]
    Duplicate(String),

    #[error("storage backend error: {0}")]
    Backend(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait DataStore: Send + Sync {
    /// Newest first.
    async fn list_exams(&self) -> StoreResult<Vec<Exam>>;
    async fn get_exam(&self, id: Uuid) -> StoreResult<Option<Exam>>;
    async fn insert_exam(&self, exam: NewExam) -> StoreResult<Exam>;
    async fn update_exam(&self, id: Uuid, update: ExamUpdate) -> StoreResult<()>;
    /// Also removes the exam's submissions.
    async fn delete_exam(&self, id: Uuid) -> StoreResult<()>;

    /// Most recent submit time first.
    async fn list_submissions(&self) -> StoreResult<Vec<Submission>>;
    async fn get_submission(&self, id: Uuid) -> StoreResult<Option<Submission>>;
    /// Fails with `Duplicate` when the student already submitted this exam.
    async fn insert_submission(&self, submission: NewSubmission) -> StoreResult<Submission>;
    /// Writes score, criteria and feedback and marks the submission graded.
    async fn grade_submission(&self, id: Uuid, grade: GradeUpdate) -> StoreResult<()>;
    async fn delete_submission(&self, id: Uuid) -> StoreResult<()>;

    /// Ordered by name.
    async fn list_students(&self) -> StoreResult<Vec<Student>>;
    async fn find_student_by_nisn(&self, nisn: &str) -> StoreResult<Option<Student>>;
    /// All-or-nothing: a duplicate NISN inserts no row from the batch.
    async fn insert_students(&self, students: Vec<NewStudent>) -> StoreResult<usize>;
    async fn delete_student(&self, id: Uuid) -> StoreResult<()>;

    async fn find_teacher(&self, username: &str) -> StoreResult<Option<Teacher>>;
    async fn insert_teacher(&self, username: &str, password: &str, name: &str) -> StoreResult<Teacher>;
}

/// String values namespaced by a scope (the student's NISN).
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, scope: &str, key: &str) -> StoreResult<Option<String>>;
    async fn set(&self, scope: &str, key: &str, value: &str) -> StoreResult<()>;
    /// Removing an absent key is not an error.
    async fn remove(&self, scope: &str, key: &str) -> StoreResult<()>;
}
