// src/models/exam.rs

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Whether students may still take the exam.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExamStatus {
    Aktif,
    Selesai,
}

impl ExamStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExamStatus::Aktif => "Aktif",
            ExamStatus::Selesai => "Selesai",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "Aktif" => Some(ExamStatus::Aktif),
            "Selesai" => Some(ExamStatus::Selesai),
            _ => None,
        }
    }
}

/// An exam packet as seen by the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Exam {
    pub id: Uuid,
    pub title: String,
    pub description: String,

    /// Free text such as "120 Menit" or "2 Jam".
    pub duration: String,

    pub status: ExamStatus,
    pub due_date: String,

    /// Public URL of the blueprint image.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

/// Fields of a new exam. The id is assigned by the store.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewExam {
    #[validate(length(min = 1, max = 200, message = "Judul soal wajib diisi."))]
    pub title: String,
    #[validate(length(max = 5000))]
    #[serde(default)]
    pub description: String,
    #[validate(length(min = 1, max = 50, message = "Durasi wajib diisi."))]
    pub duration: String,
    #[serde(default = "default_status")]
    pub status: ExamStatus,
    #[validate(length(max = 100))]
    #[serde(default)]
    pub due_date: String,
    #[validate(length(max = 500), url)]
    pub image_url: Option<String>,
}

fn default_status() -> ExamStatus {
    ExamStatus::Aktif
}

/// Partial update. Empty strings are treated as "not provided".
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ExamUpdate {
    #[validate(length(max = 200))]
    pub title: Option<String>,
    #[validate(length(max = 5000))]
    pub description: Option<String>,
    #[validate(length(max = 50))]
    pub duration: Option<String>,
    pub status: Option<ExamStatus>,
    #[validate(length(max = 100))]
    pub due_date: Option<String>,
    #[validate(length(max = 500), url)]
    pub image_url: Option<String>,
}

impl ExamUpdate {
    /// Drops empty strings so they do not overwrite stored values.
    pub fn normalized(self) -> Self {
        fn keep(v: Option<String>) -> Option<String> {
            v.filter(|s| !s.trim().is_empty())
        }
        Self {
            title: keep(self.title),
            description: keep(self.description),
            duration: keep(self.duration),
            status: self.status,
            due_date: keep(self.due_date),
            image_url: keep(self.image_url),
        }
    }

    pub fn apply_to(&self, exam: &mut Exam) {
        if let Some(v) = &self.title {
            exam.title = v.clone();
        }
        if let Some(v) = &self.description {
            exam.description = v.clone();
        }
        if let Some(v) = &self.duration {
            exam.duration = v.clone();
        }
        if let Some(v) = self.status {
            exam.status = v;
        }
        if let Some(v) = &self.due_date {
            exam.due_date = v.clone();
        }
        if let Some(v) = &self.image_url {
            exam.image_url = Some(v.clone());
        }
    }
}

/// Query parameters for listing exams.
#[derive(Debug, Default, Deserialize)]
pub struct ExamListParams {
    pub q: Option<String>,
}
