use sqlx::types::Json;
use thiserror::Error;

use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::models::Exam;
use crate::repositories;
use crate::repositories::answers::AnswerWithStudentRow;
use crate::schemas::answer::{AnswerCreate, AnswerDetailResponse, AnswerListItem};
use crate::services::answer_key::{self, AnswerKey, SubmittedEntry};

/// No confidence signal is computed yet; every result carries this placeholder.
const NEUTRAL_CONFIDENCE: f64 = 0.0;

/// Failure taxonomy of a grading run. `DataIntegrity` covers stored state
/// that is internally inconsistent (corrupted key, dangling context) and is
/// never attributed to the current request's input.
#[derive(Debug, Error)]
pub(crate) enum PipelineError {
    #[error("{0}")]
    InvalidInput(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    DataIntegrity(String),
    #[error("upstream grading service failed: {0:#}")]
    Upstream(anyhow::Error),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// Run one grading pipeline: resolve exam and context, split the submission,
/// reconcile it against the stored answer key, grade, persist, and shape the
/// response. Any failure aborts the call; nothing is persisted partially.
pub(crate) async fn create_answer(
    state: &AppState,
    user_id: &str,
    payload: &AnswerCreate,
) -> Result<AnswerListItem, PipelineError> {
    let exam = repositories::exams::find_for_user(state.db(), &payload.exam_id, user_id)
        .await?
        .ok_or_else(|| PipelineError::NotFound("Exam does not exist".to_string()))?;
    let context_key = resolve_context_key(state, &exam).await?;

    let student = repositories::students::find_for_user(state.db(), &payload.student_id, user_id)
        .await?
        .ok_or_else(|| PipelineError::NotFound("Student does not exist".to_string()))?;

    ensure_document_not_empty(&payload.document)?;

    let split = state.splitter().split(&payload.document).await.map_err(PipelineError::Upstream)?;
    let mut submitted: Vec<SubmittedEntry> =
        split.into_iter().map(|entry| SubmittedEntry { no: entry.no, answer: entry.answer }).collect();
    answer_key::sort_submitted(&mut submitted);

    let key = AnswerKey::new(exam.answer_key.0.clone()).map_err(|err| {
        PipelineError::DataIntegrity(format!("Stored answer key is corrupted: {err}"))
    })?;

    let merged = answer_key::merge(&submitted, &key)
        .map_err(|err| PipelineError::DataIntegrity(err.to_string()))?;

    let outcome =
        state.grader().grade(&context_key, &merged).await.map_err(PipelineError::Upstream)?;

    let answer_id = repositories::answers::create(
        state.db(),
        repositories::answers::CreateAnswer {
            exam_id: &exam.id,
            student_id: &student.id,
            score: outcome.total_score,
            confidence: NEUTRAL_CONFIDENCE,
            evaluation_details: Json(outcome.details),
            file_name: &payload.file_name,
            created_at: primitive_now_utc(),
        },
    )
    .await?;

    tracing::info!(
        answer_id,
        exam_id = %exam.id,
        student_id = %student.id,
        score = outcome.total_score,
        "Answer graded and stored"
    );

    let row = repositories::answers::find_for_user(state.db(), answer_id, user_id)
        .await?
        .ok_or_else(|| {
            PipelineError::DataIntegrity("Stored answer vanished after insert".to_string())
        })?;

    Ok(list_item(&row))
}

pub(crate) async fn get_answer(
    state: &AppState,
    user_id: &str,
    answer_id: i64,
) -> Result<AnswerDetailResponse, PipelineError> {
    let row = repositories::answers::find_for_user(state.db(), answer_id, user_id)
        .await?
        .ok_or_else(|| PipelineError::NotFound("Answer does not exist".to_string()))?;
    Ok(detail(row))
}

pub(crate) async fn list_answers_for_exam(
    state: &AppState,
    user_id: &str,
    exam_id: &str,
) -> Result<Vec<AnswerListItem>, PipelineError> {
    let exam = repositories::exams::find_for_user(state.db(), exam_id, user_id)
        .await?
        .ok_or_else(|| PipelineError::NotFound("Exam does not exist".to_string()))?;

    let rows = repositories::answers::list_by_exam(state.db(), &exam.id).await?;
    Ok(rows.iter().map(list_item).collect())
}

/// Explicit deletes treat a missing target as an error rather than masking
/// client bugs with a silent success.
pub(crate) async fn delete_answer(
    state: &AppState,
    user_id: &str,
    answer_id: i64,
) -> Result<(), PipelineError> {
    let deleted = repositories::answers::delete_for_user(state.db(), answer_id, user_id).await?;
    if deleted == 0 {
        return Err(PipelineError::NotFound("Answer does not exist".to_string()));
    }
    Ok(())
}

/// Rejects blank submissions before any splitter or oracle call is made.
fn ensure_document_not_empty(document: &str) -> Result<(), PipelineError> {
    if document.trim().is_empty() {
        return Err(PipelineError::InvalidInput(
            "Submission document is empty; nothing to grade".to_string(),
        ));
    }
    Ok(())
}

async fn resolve_context_key(state: &AppState, exam: &Exam) -> Result<String, PipelineError> {
    let context_id = exam.context_id.as_deref().ok_or_else(|| {
        PipelineError::DataIntegrity(format!("Exam {} has no grading context", exam.id))
    })?;

    repositories::contexts::find_context_key(state.db(), context_id).await?.ok_or_else(|| {
        PipelineError::DataIntegrity(format!(
            "Exam {} references missing context {context_id}",
            exam.id
        ))
    })
}

fn list_item(row: &AnswerWithStudentRow) -> AnswerListItem {
    AnswerListItem {
        id: row.id,
        student_name: row.student_name.clone(),
        student_roll_no: row.student_roll_no.clone(),
        score: row.score,
        confidence: row.confidence,
        file_name: row.file_name.clone(),
    }
}

fn detail(row: AnswerWithStudentRow) -> AnswerDetailResponse {
    AnswerDetailResponse {
        id: row.id,
        student_name: row.student_name,
        student_roll_no: row.student_roll_no,
        score: row.score,
        confidence: row.confidence,
        file_name: row.file_name,
        evaluation_details: row.evaluation_details.0,
        max_exam_score: row.max_exam_score,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::answer_key::EvaluationDetail;

    fn sample_row() -> AnswerWithStudentRow {
        AnswerWithStudentRow {
            id: 7,
            exam_id: "exam-1".to_string(),
            student_id: "student-1".to_string(),
            student_name: "Ada Lovelace".to_string(),
            student_roll_no: "CS-042".to_string(),
            score: 8.5,
            confidence: 0.0,
            evaluation_details: Json(vec![EvaluationDetail {
                no: 1,
                question: "Q1".to_string(),
                student_answer: "ans1".to_string(),
                answer_key: "A1".to_string(),
                marks_awarded: 4.0,
                feedback: "Good.".to_string(),
            }]),
            file_name: "ada_answers.pdf".to_string(),
            max_exam_score: 10.0,
        }
    }

    #[test]
    fn blank_submission_documents_are_invalid_input() {
        let err = ensure_document_not_empty("   \n\t ").expect_err("blank document");
        assert!(matches!(err, PipelineError::InvalidInput(_)));

        assert!(ensure_document_not_empty("Q1: the answer").is_ok());
    }

    #[test]
    fn list_item_carries_student_display_fields() {
        let item = list_item(&sample_row());
        assert_eq!(
            item,
            AnswerListItem {
                id: 7,
                student_name: "Ada Lovelace".to_string(),
                student_roll_no: "CS-042".to_string(),
                score: 8.5,
                confidence: 0.0,
                file_name: "ada_answers.pdf".to_string(),
            }
        );
    }

    #[test]
    fn detail_includes_breakdown_and_exam_ceiling() {
        let response = detail(sample_row());
        assert_eq!(response.id, 7);
        assert_eq!(response.evaluation_details.len(), 1);
        assert_eq!(response.evaluation_details[0].marks_awarded, 4.0);
        assert_eq!(response.max_exam_score, 10.0);
    }
}
