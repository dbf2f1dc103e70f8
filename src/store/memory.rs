// src/store/memory.rs

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    DUPLICATE_NISN, DUPLICATE_SUBMISSION, DataStore, KeyValueStore, StoreError, StoreResult,
};
use crate::models::{
    exam::{Exam, ExamUpdate, NewExam},
    student::{NewStudent, Student},
    submission::{GradeUpdate, NewSubmission, Submission, SubmissionStatus},
    teacher::Teacher,
};

#[derive(Default)]
struct Tables {
    /// Insertion sequence stands in for `created_at`.
    exams: Vec<(u64, Exam)>,
    submissions: Vec<Submission>,
    students: Vec<Student>,
    teachers: Vec<Teacher>,
    next_seq: u64,
}

/// Process-local store with the same semantics as the Postgres tables.
/// Used when no database is configured, and by the test suite.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DataStore for MemoryStore {
    async fn list_exams(&self) -> StoreResult<Vec<Exam>> {
        let tables = self.tables.read().await;
        let mut rows: Vec<_> = tables.exams.iter().collect();
        rows.sort_by(|a, b| b.0.cmp(&a.0));
        Ok(rows.into_iter().map(|(_, e)| e.clone()).collect())
    }

    async fn get_exam(&self, id: Uuid) -> StoreResult<Option<Exam>> {
        let tables = self.tables.read().await;
        Ok(tables
            .exams
            .iter()
            .find(|(_, e)| e.id == id)
            .map(|(_, e)| e.clone()))
    }

    async fn insert_exam(&self, exam: NewExam) -> StoreResult<Exam> {
        let mut tables = self.tables.write().await;
        let row = Exam {
            id: Uuid::new_v4(),
            title: exam.title,
            description: exam.description,
            duration: exam.duration,
            status: exam.status,
            due_date: exam.due_date,
            image_url: exam.image_url,
        };
        let seq = tables.next_seq;
        tables.next_seq += 1;
        tables.exams.push((seq, row.clone()));
        Ok(row)
    }

    async fn update_exam(&self, id: Uuid, update: ExamUpdate) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        let (_, exam) = tables
            .exams
            .iter_mut()
            .find(|(_, e)| e.id == id)
            .ok_or(StoreError::NotFound("Ujian"))?;
        update.apply_to(exam);
        Ok(())
    }

    async fn delete_exam(&self, id: Uuid) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        let before = tables.exams.len();
        tables.exams.retain(|(_, e)| e.id != id);
        if tables.exams.len() == before {
            return Err(StoreError::NotFound("Ujian"));
        }
        tables.submissions.retain(|s| s.exam_id != id);
        Ok(())
    }

    async fn list_submissions(&self) -> StoreResult<Vec<Submission>> {
        let tables = self.tables.read().await;
        let mut rows = tables.submissions.clone();
        // Reverse first so equal submit times list the later insert first.
        rows.reverse();
        rows.sort_by(|a, b| b.submit_time.cmp(&a.submit_time));
        Ok(rows)
    }

    async fn get_submission(&self, id: Uuid) -> StoreResult<Option<Submission>> {
        let tables = self.tables.read().await;
        Ok(tables.submissions.iter().find(|s| s.id == id).cloned())
    }

    async fn insert_submission(&self, submission: NewSubmission) -> StoreResult<Submission> {
        let mut tables = self.tables.write().await;
        if tables
            .submissions
            .iter()
            .any(|s| s.exam_id == submission.exam_id && s.nis == submission.nis)
        {
            return Err(StoreError::Duplicate(DUPLICATE_SUBMISSION.to_string()));
        }
        if !tables.exams.iter().any(|(_, e)| e.id == submission.exam_id) {
            return Err(StoreError::NotFound("Ujian"));
        }
        let row = Submission {
            id: Uuid::new_v4(),
            student_name: submission.student_name,
            nis: submission.nis,
            exam_id: submission.exam_id,
            exam_title: submission.exam_title,
            submit_time: submission.submit_time,
            status: SubmissionStatus::Pending,
            score: None,
            onshape_link: submission.onshape_link,
            is_late: submission.is_late,
            criteria: None,
            feedback: None,
        };
        tables.submissions.push(row.clone());
        Ok(row)
    }

    async fn grade_submission(&self, id: Uuid, grade: GradeUpdate) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        let row = tables
            .submissions
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or(StoreError::NotFound("Pengumpulan"))?;
        row.status = SubmissionStatus::Graded;
        row.score = Some(grade.score);
        row.criteria = Some(grade.criteria);
        if grade.feedback.is_some() {
            row.feedback = grade.feedback;
        }
        Ok(())
    }

    async fn delete_submission(&self, id: Uuid) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        let before = tables.submissions.len();
        tables.submissions.retain(|s| s.id != id);
        if tables.submissions.len() == before {
            return Err(StoreError::NotFound("Pengumpulan"));
        }
        Ok(())
    }

    async fn list_students(&self) -> StoreResult<Vec<Student>> {
        let tables = self.tables.read().await;
        let mut rows = tables.students.clone();
        rows.sort_by(|a, b| {
            a.name
                .to_lowercase()
                .cmp(&b.name.to_lowercase())
                .then_with(|| a.nisn.cmp(&b.nisn))
        });
        Ok(rows)
    }

    async fn find_student_by_nisn(&self, nisn: &str) -> StoreResult<Option<Student>> {
        let tables = self.tables.read().await;
        Ok(tables.students.iter().find(|s| s.nisn == nisn).cloned())
    }

    async fn insert_students(&self, students: Vec<NewStudent>) -> StoreResult<usize> {
        let mut tables = self.tables.write().await;

        let mut seen: HashSet<&str> = tables.students.iter().map(|s| s.nisn.as_str()).collect();
        for s in &students {
            if !seen.insert(s.nisn.as_str()) {
                return Err(StoreError::Duplicate(DUPLICATE_NISN.to_string()));
            }
        }

        let now = chrono::Utc::now();
        let count = students.len();
        tables
            .students
            .extend(students.into_iter().map(|s| Student {
                id: Uuid::new_v4(),
                name: s.name,
                nisn: s.nisn,
                class: s.class,
                created_at: now,
            }));
        Ok(count)
    }

    async fn delete_student(&self, id: Uuid) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        let before = tables.students.len();
        tables.students.retain(|s| s.id != id);
        if tables.students.len() == before {
            return Err(StoreError::NotFound("Siswa"));
        }
        Ok(())
    }

    async fn find_teacher(&self, username: &str) -> StoreResult<Option<Teacher>> {
        let tables = self.tables.read().await;
        Ok(tables.teachers.iter().find(|t| t.username == username).cloned())
    }

    async fn insert_teacher(&self, username: &str, password: &str, name: &str) -> StoreResult<Teacher> {
        let mut tables = self.tables.write().await;
        if tables.teachers.iter().any(|t| t.username == username) {
            return Err(StoreError::Duplicate(format!(
                "Username '{}' sudah terdaftar",
                username
            )));
        }
        let teacher = Teacher {
            id: Uuid::new_v4(),
            username: username.to_string(),
            password: password.to_string(),
            name: name.to_string(),
        };
        tables.teachers.push(teacher.clone());
        Ok(teacher)
    }
}

/// In-memory key/value store keyed by `(scope, key)`.
#[derive(Default)]
pub struct MemoryKv {
    entries: RwLock<HashMap<(String, String), String>>,
}

impl MemoryKv {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryKv {
    async fn get(&self, scope: &str, key: &str) -> StoreResult<Option<String>> {
        let entries = self.entries.read().await;
        Ok(entries.get(&(scope.to_string(), key.to_string())).cloned())
    }

    async fn set(&self, scope: &str, key: &str, value: &str) -> StoreResult<()> {
        let mut entries = self.entries.write().await;
        entries.insert((scope.to_string(), key.to_string()), value.to_string());
        Ok(())
    }

    async fn remove(&self, scope: &str, key: &str) -> StoreResult<()> {
        let mut entries = self.entries.write().await;
        entries.remove(&(scope.to_string(), key.to_string()));
        Ok(())
    }
}
