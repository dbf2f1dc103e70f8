// src/grading.rs

//! Fixed three-criterion rubric.

use serde::{Deserialize, Serialize};
use validator::Validate;

pub const MAX_DIMENSION: i32 = 40;
pub const MAX_EFFICIENCY: i32 = 40;
pub const MAX_AESTHETICS: i32 = 20;
pub const MAX_TOTAL: i32 = 100;

/// Per-criterion scores, stored as a JSON document next to the total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct Criteria {
    /// Dimension accuracy.
    #[validate(range(min = 0, max = 40, message = "Nilai dimensi harus 0-40."))]
    pub dimension: i32,

    /// Modeling efficiency (feature usage).
    #[validate(range(min = 0, max = 40, message = "Nilai efisiensi harus 0-40."))]
    pub efficiency: i32,

    /// Neatness of the drawing.
    #[validate(range(min = 0, max = 20, message = "Nilai kerapian harus 0-20."))]
    pub aesthetics: i32,
}

impl Criteria {
    /// Sum of the criteria clamped to `0..=100`.
    pub fn total(&self) -> i32 {
        self.dimension
            .saturating_add(self.efficiency)
            .saturating_add(self.aesthetics)
            .clamp(0, MAX_TOTAL)
    }
}

/// Body of a grade request.
#[derive(Debug, Deserialize, Validate)]
pub struct GradeRequest {
    #[validate(nested)]
    pub criteria: Criteria,
    #[validate(length(max = 5000))]
    pub feedback: Option<String>,
}
