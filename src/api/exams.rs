use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use sqlx::types::Json as SqlJson;
use time::{macros::format_description, Date};
use uuid::Uuid;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::CurrentUser;
use crate::core::{state::AppState, time::primitive_now_utc};
use crate::repositories;
use crate::schemas::exam::{ExamCreate, ExamResponse};
use crate::services::answer_key::{AnswerKey, KeyEntry};

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_exam).get(list_exams))
        .route("/:exam_id", get(get_exam))
        .route("/:exam_id", delete(delete_exam))
}

async fn create_exam(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<ExamCreate>,
) -> Result<(StatusCode, Json<ExamResponse>), ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;
    if payload.answer_key_document.trim().is_empty() {
        return Err(ApiError::BadRequest("Answer key document is empty".to_string()));
    }

    let conducted_date = parse_conducted_date(payload.conducted_date.as_deref())?;

    if let Some(context_id) = payload.context_id.as_deref() {
        repositories::contexts::find_for_user(state.db(), context_id, &user.id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to fetch context"))?
            .ok_or_else(|| ApiError::NotFound("Context does not exist".to_string()))?;
    }

    let mut entries: Vec<KeyEntry> = state
        .splitter()
        .split(&payload.answer_key_document)
        .await
        .map_err(|e| {
            tracing::error!(error = %format!("{e:#}"), "Answer key splitting failed");
            ApiError::BadGateway("Could not parse the answer key document".to_string())
        })?
        .into_iter()
        .map(|entry| KeyEntry { no: entry.no, question: entry.question, answer: entry.answer })
        .collect();
    entries.sort_by_key(|entry| entry.no);

    // Validated once here; grading runs re-check the stored copy.
    let answer_key = AnswerKey::new(entries).map_err(|e| {
        ApiError::BadRequest(format!("Answer key document produced an invalid sequence: {e}"))
    })?;

    let exam = repositories::exams::create(
        state.db(),
        repositories::exams::CreateExam {
            id: &Uuid::new_v4().to_string(),
            name: &payload.name,
            conducted_date,
            description: &payload.description,
            total_marks: payload.total_marks,
            answer_key: SqlJson(answer_key.into_entries()),
            file_name: &payload.file_name,
            context_id: payload.context_id.as_deref(),
            user_id: &user.id,
            created_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create exam"))?;

    Ok((StatusCode::CREATED, Json(ExamResponse::from(exam))))
}

async fn list_exams(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<ExamResponse>>, ApiError> {
    let exams = repositories::exams::list_by_user(state.db(), &user.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list exams"))?;

    Ok(Json(exams.into_iter().map(ExamResponse::from).collect()))
}

async fn get_exam(
    Path(exam_id): Path<String>,
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<ExamResponse>, ApiError> {
    let exam = repositories::exams::find_for_user(state.db(), &exam_id, &user.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch exam"))?
        .ok_or_else(|| ApiError::NotFound("Exam does not exist".to_string()))?;

    Ok(Json(ExamResponse::from(exam)))
}

async fn delete_exam(
    Path(exam_id): Path<String>,
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<StatusCode, ApiError> {
    let deleted = repositories::exams::delete_for_user(state.db(), &exam_id, &user.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete exam"))?;

    if deleted == 0 {
        return Err(ApiError::NotFound("Exam does not exist".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}

fn parse_conducted_date(value: Option<&str>) -> Result<Option<Date>, ApiError> {
    let Some(raw) = value else {
        return Ok(None);
    };

    let format = format_description!("[year]-[month]-[day]");
    Date::parse(raw, &format)
        .map(Some)
        .map_err(|_| ApiError::BadRequest(format!("Invalid conducted_date: {raw}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::time::format_date;

    #[test]
    fn parse_conducted_date_accepts_iso_dates() {
        let parsed = parse_conducted_date(Some("2026-05-14")).expect("date");
        assert_eq!(parsed.map(format_date), Some("2026-05-14".to_string()));
        assert!(parse_conducted_date(None).expect("none").is_none());
    }

    #[test]
    fn parse_conducted_date_rejects_other_formats() {
        assert!(parse_conducted_date(Some("14/05/2026")).is_err());
        assert!(parse_conducted_date(Some("yesterday")).is_err());
    }
}
