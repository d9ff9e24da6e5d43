use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::CurrentUser;
use crate::core::state::AppState;
use crate::schemas::answer::{AnswerCreate, AnswerDetailResponse, AnswerListItem};
use crate::services::grading_pipeline;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_answer))
        .route("/:answer_id", get(get_answer))
        .route("/:answer_id", delete(delete_answer))
        .route("/exam/:exam_id", get(list_answers_for_exam))
}

async fn create_answer(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<AnswerCreate>,
) -> Result<(StatusCode, Json<AnswerListItem>), ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let item = grading_pipeline::create_answer(&state, &user.id, &payload).await?;

    Ok((StatusCode::CREATED, Json(item)))
}

async fn get_answer(
    Path(answer_id): Path<i64>,
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<AnswerDetailResponse>, ApiError> {
    let detail = grading_pipeline::get_answer(&state, &user.id, answer_id).await?;

    Ok(Json(detail))
}

async fn list_answers_for_exam(
    Path(exam_id): Path<String>,
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<AnswerListItem>>, ApiError> {
    let items = grading_pipeline::list_answers_for_exam(&state, &user.id, &exam_id).await?;

    Ok(Json(items))
}

async fn delete_answer(
    Path(answer_id): Path<i64>,
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<StatusCode, ApiError> {
    grading_pipeline::delete_answer(&state, &user.id, answer_id).await?;

    Ok(StatusCode::NO_CONTENT)
}
