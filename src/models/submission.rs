// src/models/submission.rs

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::grading::Criteria;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionStatus {
    Pending,
    Graded,
}

impl SubmissionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubmissionStatus::Pending => "pending",
            SubmissionStatus::Graded => "graded",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "pending" => Some(SubmissionStatus::Pending),
            "graded" => Some(SubmissionStatus::Graded),
            _ => None,
        }
    }
}

/// A student's answer to one exam: a link to the CAD document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub id: Uuid,
    pub student_name: String,
    pub nis: String,
    pub exam_id: Uuid,
    pub exam_title: String,
    pub submit_time: chrono::DateTime<chrono::Utc>,
    pub status: SubmissionStatus,
    pub score: Option<i32>,
    pub onshape_link: String,
    pub is_late: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub criteria: Option<Criteria>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
}

/// Insert shape. Status, score and criteria start empty.
#[derive(Debug, Clone)]
pub struct NewSubmission {
    pub student_name: String,
    pub nis: String,
    pub exam_id: Uuid,
    pub exam_title: String,
    pub submit_time: chrono::DateTime<chrono::Utc>,
    pub onshape_link: String,
    pub is_late: bool,
}

/// Grade written back onto a submission.
#[derive(Debug, Clone)]
pub struct GradeUpdate {
    pub score: i32,
    pub criteria: Criteria,
    pub feedback: Option<String>,
}

/// Body of a student's submit request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitRequest {
    pub onshape_link: String,
}

/// Filter for the teacher dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    #[default]
    All,
    Pending,
    Graded,
}

impl StatusFilter {
    pub fn matches(&self, status: SubmissionStatus) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Pending => status == SubmissionStatus::Pending,
            StatusFilter::Graded => status == SubmissionStatus::Graded,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct SubmissionListParams {
    #[serde(default)]
    pub status: StatusFilter,
    pub q: Option<String>,
}

/// Dashboard counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmissionStats {
    pub total: usize,
    pub pending: usize,
    pub graded: usize,
}

impl SubmissionStats {
    pub fn from_submissions(submissions: &[Submission]) -> Self {
        let pending = submissions
            .iter()
            .filter(|s| s.status == SubmissionStatus::Pending)
            .count();
        Self {
            total: submissions.len(),
            pending,
            graded: submissions.len() - pending,
        }
    }
}

/// Applies the dashboard filter: status tab plus a case-insensitive search
/// over student name, NIS and exam title.
pub fn filter_submissions(submissions: &[Submission], params: &SubmissionListParams) -> Vec<Submission> {
    let needle = params
        .q
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .map(str::to_lowercase);

    submissions
        .iter()
        .filter(|s| params.status.matches(s.status))
        .filter(|s| match &needle {
            Some(q) => {
                s.student_name.to_lowercase().contains(q)
                    || s.nis.contains(q.as_str())
                    || s.exam_title.to_lowercase().contains(q)
            }
            None => true,
        })
        .cloned()
        .collect()
}
