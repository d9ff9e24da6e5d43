use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::services::answer_key::EvaluationDetail;

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct AnswerCreate {
    #[serde(alias = "examId")]
    #[validate(length(min = 1, message = "exam_id must not be empty"))]
    pub(crate) exam_id: String,
    #[serde(alias = "studentId")]
    #[validate(length(min = 1, message = "student_id must not be empty"))]
    pub(crate) student_id: String,
    /// Raw text extraction of the student's answer document.
    pub(crate) document: String,
    #[serde(alias = "fileName")]
    #[validate(length(min = 1, message = "file_name must not be empty"))]
    pub(crate) file_name: String,
}

/// List view of a grading result, joined with student display fields.
#[derive(Debug, PartialEq, Serialize)]
pub(crate) struct AnswerListItem {
    pub(crate) id: i64,
    pub(crate) student_name: String,
    pub(crate) student_roll_no: String,
    pub(crate) score: f64,
    pub(crate) confidence: f64,
    pub(crate) file_name: String,
}

/// Individually fetched result: list fields plus the per-question breakdown
/// and the exam's score ceiling.
#[derive(Debug, Serialize)]
pub(crate) struct AnswerDetailResponse {
    pub(crate) id: i64,
    pub(crate) student_name: String,
    pub(crate) student_roll_no: String,
    pub(crate) score: f64,
    pub(crate) confidence: f64,
    pub(crate) file_name: String,
    pub(crate) evaluation_details: Vec<EvaluationDetail>,
    pub(crate) max_exam_score: f64,
}
