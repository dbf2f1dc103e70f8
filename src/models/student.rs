// src/models/student.rs

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Represents the 'students' table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Student {
    pub id: Uuid,
    pub name: String,

    /// National student number. Unique; also the login identifier.
    pub nisn: String,

    pub class: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// One validated import row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewStudent {
    pub name: String,
    pub nisn: String,
    pub class: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct StudentListParams {
    pub q: Option<String>,
}

/// Case-insensitive search over name, NISN and class.
pub fn search_students(students: &[Student], query: Option<&str>) -> Vec<Student> {
    let Some(q) = query.map(str::trim).filter(|q| !q.is_empty()) else {
        return students.to_vec();
    };
    let q = q.to_lowercase();
    students
        .iter()
        .filter(|s| {
            s.name.to_lowercase().contains(&q)
                || s.nisn.contains(&q)
                || s.class.to_lowercase().contains(&q)
        })
        .cloned()
        .collect()
}
