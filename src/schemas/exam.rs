use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::{format_date, format_primitive};
use crate::db::models::Exam;

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct ExamCreate {
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub(crate) name: String,
    /// ISO date (YYYY-MM-DD).
    #[serde(default)]
    #[serde(alias = "conductedDate")]
    pub(crate) conducted_date: Option<String>,
    #[serde(default)]
    pub(crate) description: String,
    #[serde(alias = "totalMarks")]
    #[validate(range(exclusive_min = 0.0, message = "total_marks must be positive"))]
    pub(crate) total_marks: f64,
    #[serde(default)]
    #[serde(alias = "contextId")]
    pub(crate) context_id: Option<String>,
    /// Raw text extraction of the answer-key document.
    #[serde(alias = "answerKeyDocument")]
    pub(crate) answer_key_document: String,
    #[serde(alias = "fileName")]
    #[validate(length(min = 1, message = "file_name must not be empty"))]
    pub(crate) file_name: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct ExamResponse {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) conducted_date: Option<String>,
    pub(crate) description: String,
    pub(crate) total_marks: f64,
    pub(crate) question_count: usize,
    pub(crate) context_id: Option<String>,
    pub(crate) file_name: String,
    pub(crate) created_at: String,
}

impl From<Exam> for ExamResponse {
    fn from(exam: Exam) -> Self {
        Self {
            id: exam.id,
            name: exam.name,
            conducted_date: exam.conducted_date.map(format_date),
            description: exam.description,
            total_marks: exam.total_marks,
            question_count: exam.answer_key.0.len(),
            context_id: exam.context_id,
            file_name: exam.file_name,
            created_at: format_primitive(exam.created_at),
        }
    }
}
