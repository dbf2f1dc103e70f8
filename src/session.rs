// src/session.rs

//! Session store: the CRUD façade the handlers talk to.
//!
//! Every mutation is followed by a full refetch of the affected collection
//! and returns that fresh snapshot. Nothing is patched locally, so a caller
//! never holds a list the backend does not agree with.

use std::sync::Arc;

use uuid::Uuid;

use crate::grading::Criteria;
use crate::models::{
    exam::{Exam, ExamUpdate, NewExam},
    submission::{GradeUpdate, NewSubmission, Submission},
};
use crate::store::{DataStore, StoreResult};

/// Immutable view of the exam collection.
pub type ExamSnapshot = Arc<[Exam]>;

/// Immutable view of the submission collection.
pub type SubmissionSnapshot = Arc<[Submission]>;

#[derive(Clone)]
pub struct SessionStore {
    store: Arc<dyn DataStore>,
}

impl SessionStore {
    pub fn new(store: Arc<dyn DataStore>) -> Self {
        Self { store }
    }

    pub async fn fetch_exams(&self) -> StoreResult<ExamSnapshot> {
        Ok(self.store.list_exams().await?.into())
    }

    pub async fn fetch_submissions(&self) -> StoreResult<SubmissionSnapshot> {
        Ok(self.store.list_submissions().await?.into())
    }

    pub async fn exam(&self, id: Uuid) -> StoreResult<Option<Exam>> {
        self.store.get_exam(id).await
    }

    pub async fn submission(&self, id: Uuid) -> StoreResult<Option<Submission>> {
        self.store.get_submission(id).await
    }

    pub async fn add_exam(&self, exam: NewExam) -> StoreResult<ExamSnapshot> {
        let created = self.store.insert_exam(exam).await?;
        tracing::info!("Exam created: {} ({})", created.title, created.id);
        self.fetch_exams().await
    }

    pub async fn update_exam(&self, id: Uuid, update: ExamUpdate) -> StoreResult<ExamSnapshot> {
        self.store.update_exam(id, update.normalized()).await?;
        self.fetch_exams().await
    }

    pub async fn delete_exam(&self, id: Uuid) -> StoreResult<ExamSnapshot> {
        self.store.delete_exam(id).await?;
        tracing::info!("Exam deleted: {}", id);
        self.fetch_exams().await
    }

    /// Returns the created row alongside the refreshed collection.
    pub async fn add_submission(&self, submission: NewSubmission) -> StoreResult<(Submission, SubmissionSnapshot)> {
        let created = self.store.insert_submission(submission).await?;
        let snapshot = self.fetch_submissions().await?;
        Ok((created, snapshot))
    }

    /// Grades (or re-grades) a submission. Last write wins.
    pub async fn grade_submission(
        &self,
        id: Uuid,
        criteria: Criteria,
        feedback: Option<String>,
    ) -> StoreResult<SubmissionSnapshot> {
        let grade = GradeUpdate {
            score: criteria.total(),
            criteria,
            feedback,
        };
        tracing::info!("Grading submission {}: total {}", id, grade.score);
        self.store.grade_submission(id, grade).await?;
        self.fetch_submissions().await
    }

    pub async fn delete_submission(&self, id: Uuid) -> StoreResult<SubmissionSnapshot> {
        self.store.delete_submission(id).await?;
        self.fetch_submissions().await
    }
}
