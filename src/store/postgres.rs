// src/store/postgres.rs

use async_trait::async_trait;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder, types::Json};
use uuid::Uuid;

use super::{
    DUPLICATE_NISN, DUPLICATE_SUBMISSION, DataStore, KeyValueStore, StoreError, StoreResult,
};
use crate::grading::Criteria;
use crate::models::{
    exam::{Exam, ExamStatus, ExamUpdate, NewExam},
    student::{NewStudent, Student},
    submission::{GradeUpdate, NewSubmission, Submission, SubmissionStatus},
    teacher::Teacher,
};

/// Postgres error code for unique violation.
const UNIQUE_VIOLATION: &str = "23505";

/// Postgres-backed store. Column names stay snake_case; the row structs below
/// translate them into the camelCase entities.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn backend(context: &str, err: sqlx::Error) -> StoreError {
    tracing::error!("{}: {:?}", context, err);
    StoreError::Backend(err.to_string())
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .and_then(|e| e.code())
        .is_some_and(|code| code == UNIQUE_VIOLATION)
}

#[derive(FromRow)]
struct ExamRow {
    id: Uuid,
    title: String,
    description: String,
    duration: String,
    status: String,
    due_date: String,
    image_url: Option<String>,
}

impl TryFrom<ExamRow> for Exam {
    type Error = StoreError;

    fn try_from(row: ExamRow) -> Result<Self, Self::Error> {
        let status = ExamStatus::parse(&row.status)
            .ok_or_else(|| StoreError::Backend(format!("unknown exam status '{}'", row.status)))?;
        Ok(Exam {
            id: row.id,
            title: row.title,
            description: row.description,
            duration: row.duration,
            status,
            due_date: row.due_date,
            image_url: row.image_url,
        })
    }
}

#[derive(FromRow)]
struct SubmissionRow {
    id: Uuid,
    student_name: String,
    nis: String,
    exam_id: Uuid,
    exam_title: String,
    submit_time: chrono::DateTime<chrono::Utc>,
    status: String,
    score: Option<i32>,
    onshape_link: String,
    is_late: bool,
    criteria: Option<Json<Criteria>>,
    feedback: Option<String>,
}

impl TryFrom<SubmissionRow> for Submission {
    type Error = StoreError;

    fn try_from(row: SubmissionRow) -> Result<Self, Self::Error> {
        let status = SubmissionStatus::parse(&row.status).ok_or_else(|| {
            StoreError::Backend(format!("unknown submission status '{}'", row.status))
        })?;
        Ok(Submission {
            id: row.id,
            student_name: row.student_name,
            nis: row.nis,
            exam_id: row.exam_id,
            exam_title: row.exam_title,
            submit_time: row.submit_time,
            status,
            score: row.score,
            onshape_link: row.onshape_link,
            is_late: row.is_late,
            criteria: row.criteria.map(|c| c.0),
            feedback: row.feedback,
        })
    }
}

#[derive(FromRow)]
struct StudentRow {
    id: Uuid,
    name: String,
    nisn: String,
    class: String,
    created_at: chrono::DateTime<chrono::Utc>,
}

impl From<StudentRow> for Student {
    fn from(row: StudentRow) -> Self {
        Student {
            id: row.id,
            name: row.name,
            nisn: row.nisn,
            class: row.class,
            created_at: row.created_at,
        }
    }
}

#[derive(FromRow)]
struct TeacherRow {
    id: Uuid,
    username: String,
    password: String,
    name: String,
}

const EXAM_COLUMNS: &str = "id, title, description, duration, status, due_date, image_url";
const SUBMISSION_COLUMNS: &str = "id, student_name, nis, exam_id, exam_title, submit_time, status, \
     score, onshape_link, is_late, criteria, feedback";

#[async_trait]
impl DataStore for PgStore {
    async fn list_exams(&self) -> StoreResult<Vec<Exam>> {
        let rows: Vec<ExamRow> = sqlx::query_as(&format!(
            "SELECT {} FROM exams ORDER BY created_at DESC",
            EXAM_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| backend("Failed to fetch exams", e))?;

        rows.into_iter().map(Exam::try_from).collect()
    }

    async fn get_exam(&self, id: Uuid) -> StoreResult<Option<Exam>> {
        let row: Option<ExamRow> =
            sqlx::query_as(&format!("SELECT {} FROM exams WHERE id = $1", EXAM_COLUMNS))
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| backend("Failed to fetch exam", e))?;

        row.map(Exam::try_from).transpose()
    }

    async fn insert_exam(&self, exam: NewExam) -> StoreResult<Exam> {
        let row: ExamRow = sqlx::query_as(&format!(
            r#"
            INSERT INTO exams (id, title, description, duration, status, due_date, image_url)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            EXAM_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(&exam.title)
        .bind(&exam.description)
        .bind(&exam.duration)
        .bind(exam.status.as_str())
        .bind(&exam.due_date)
        .bind(&exam.image_url)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| backend("Failed to add exam", e))?;

        Exam::try_from(row)
    }

    async fn update_exam(&self, id: Uuid, update: ExamUpdate) -> StoreResult<()> {
        let mut builder = QueryBuilder::<Postgres>::new("UPDATE exams SET ");
        let mut fields = builder.separated(", ");
        let mut any = false;

        if let Some(title) = &update.title {
            fields.push("title = ").push_bind_unseparated(title.clone());
            any = true;
        }
        if let Some(description) = &update.description {
            fields
                .push("description = ")
                .push_bind_unseparated(description.clone());
            any = true;
        }
        if let Some(duration) = &update.duration {
            fields.push("duration = ").push_bind_unseparated(duration.clone());
            any = true;
        }
        if let Some(status) = update.status {
            fields.push("status = ").push_bind_unseparated(status.as_str());
            any = true;
        }
        if let Some(due_date) = &update.due_date {
            fields.push("due_date = ").push_bind_unseparated(due_date.clone());
            any = true;
        }
        if let Some(image_url) = &update.image_url {
            fields.push("image_url = ").push_bind_unseparated(image_url.clone());
            any = true;
        }

        if !any {
            // Nothing to write; still report a missing exam.
            return match self.get_exam(id).await? {
                Some(_) => Ok(()),
                None => Err(StoreError::NotFound("Ujian")),
            };
        }

        builder.push(" WHERE id = ").push_bind(id);
        let result = builder
            .build()
            .execute(&self.pool)
            .await
            .map_err(|e| backend("Failed to update exam", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound("Ujian"));
        }
        Ok(())
    }

    async fn delete_exam(&self, id: Uuid) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM exams WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| backend("Failed to delete exam", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound("Ujian"));
        }
        Ok(())
    }

    async fn list_submissions(&self) -> StoreResult<Vec<Submission>> {
        let rows: Vec<SubmissionRow> = sqlx::query_as(&format!(
            "SELECT {} FROM submissions ORDER BY submit_time DESC",
            SUBMISSION_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| backend("Failed to fetch submissions", e))?;

        rows.into_iter().map(Submission::try_from).collect()
    }

    async fn get_submission(&self, id: Uuid) -> StoreResult<Option<Submission>> {
        let row: Option<SubmissionRow> = sqlx::query_as(&format!(
            "SELECT {} FROM submissions WHERE id = $1",
            SUBMISSION_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| backend("Failed to fetch submission", e))?;

        row.map(Submission::try_from).transpose()
    }

    async fn insert_submission(&self, submission: NewSubmission) -> StoreResult<Submission> {
        let row: SubmissionRow = sqlx::query_as(&format!(
            r#"
            INSERT INTO submissions
                (id, student_name, nis, exam_id, exam_title, submit_time, status, onshape_link, is_late)
            VALUES ($1, $2, $3, $4, $5, $6, 'pending', $7, $8)
            RETURNING {}
            "#,
            SUBMISSION_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(&submission.student_name)
        .bind(&submission.nis)
        .bind(submission.exam_id)
        .bind(&submission.exam_title)
        .bind(submission.submit_time)
        .bind(&submission.onshape_link)
        .bind(submission.is_late)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                StoreError::Duplicate(DUPLICATE_SUBMISSION.to_string())
            } else if e
                .as_database_error()
                .is_some_and(|d| d.is_foreign_key_violation())
            {
                StoreError::NotFound("Ujian")
            } else {
                backend("Failed to add submission", e)
            }
        })?;

        Submission::try_from(row)
    }

    async fn grade_submission(&self, id: Uuid, grade: GradeUpdate) -> StoreResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE submissions
            SET status = 'graded',
                score = $1,
                criteria = $2,
                feedback = COALESCE($3, feedback)
            WHERE id = $4
            "#,
        )
        .bind(grade.score)
        .bind(Json(grade.criteria))
        .bind(grade.feedback)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| backend("Failed to grade submission", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound("Pengumpulan"));
        }
        Ok(())
    }

    async fn delete_submission(&self, id: Uuid) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM submissions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| backend("Failed to delete submission", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound("Pengumpulan"));
        }
        Ok(())
    }

    async fn list_students(&self) -> StoreResult<Vec<Student>> {
        let rows: Vec<StudentRow> =
            sqlx::query_as("SELECT id, name, nisn, class, created_at FROM students ORDER BY LOWER(name) ASC, nisn ASC")
                .fetch_all(&self.pool)
                .await
                .map_err(|e| backend("Failed to fetch students", e))?;

        Ok(rows.into_iter().map(Student::from).collect())
    }

    async fn find_student_by_nisn(&self, nisn: &str) -> StoreResult<Option<Student>> {
        let row: Option<StudentRow> =
            sqlx::query_as("SELECT id, name, nisn, class, created_at FROM students WHERE nisn = $1")
                .bind(nisn)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| backend("Failed to fetch student", e))?;

        Ok(row.map(Student::from))
    }

    async fn insert_students(&self, students: Vec<NewStudent>) -> StoreResult<usize> {
        if students.is_empty() {
            return Ok(0);
        }

        // A single multi-row INSERT is atomic: one bad row rejects all.
        let mut builder = QueryBuilder::<Postgres>::new("INSERT INTO students (id, name, nisn, class) ");
        builder.push_values(&students, |mut b, s| {
            b.push_bind(Uuid::new_v4())
                .push_bind(s.name.clone())
                .push_bind(s.nisn.clone())
                .push_bind(s.class.clone());
        });

        let result = builder.build().execute(&self.pool).await.map_err(|e| {
            if is_unique_violation(&e) {
                StoreError::Duplicate(DUPLICATE_NISN.to_string())
            } else {
                backend("Failed to import students", e)
            }
        })?;

        Ok(result.rows_affected() as usize)
    }

    async fn delete_student(&self, id: Uuid) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM students WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| backend("Failed to delete student", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound("Siswa"));
        }
        Ok(())
    }

    async fn find_teacher(&self, username: &str) -> StoreResult<Option<Teacher>> {
        let row: Option<TeacherRow> =
            sqlx::query_as("SELECT id, username, password, name FROM teachers WHERE username = $1")
                .bind(username)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| backend("Login DB error", e))?;

        Ok(row.map(|r| Teacher {
            id: r.id,
            username: r.username,
            password: r.password,
            name: r.name,
        }))
    }

    async fn insert_teacher(&self, username: &str, password: &str, name: &str) -> StoreResult<Teacher> {
        let row: TeacherRow = sqlx::query_as(
            r#"
            INSERT INTO teachers (id, username, password, name)
            VALUES ($1, $2, $3, $4)
            RETURNING id, username, password, name
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(username)
        .bind(password)
        .bind(name)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                StoreError::Duplicate(format!("Username '{}' sudah terdaftar", username))
            } else {
                backend("Failed to create teacher", e)
            }
        })?;

        Ok(Teacher {
            id: row.id,
            username: row.username,
            password: row.password,
            name: row.name,
        })
    }
}

#[async_trait]
impl KeyValueStore for PgStore {
    async fn get(&self, scope: &str, key: &str) -> StoreResult<Option<String>> {
        let value: Option<(String,)> =
            sqlx::query_as("SELECT value FROM kv_entries WHERE scope = $1 AND key = $2")
                .bind(scope)
                .bind(key)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| backend("Failed to read kv entry", e))?;

        Ok(value.map(|(v,)| v))
    }

    async fn set(&self, scope: &str, key: &str, value: &str) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO kv_entries (scope, key, value)
            VALUES ($1, $2, $3)
            ON CONFLICT (scope, key) DO UPDATE SET value = EXCLUDED.value
            "#,
        )
        .bind(scope)
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await
        .map_err(|e| backend("Failed to write kv entry", e))?;

        Ok(())
    }

    async fn remove(&self, scope: &str, key: &str) -> StoreResult<()> {
        sqlx::query("DELETE FROM kv_entries WHERE scope = $1 AND key = $2")
            .bind(scope)
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(|e| backend("Failed to remove kv entry", e))?;

        Ok(())
    }
}
