use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::CurrentUser;
use crate::core::{state::AppState, time::primitive_now_utc};
use crate::repositories;
use crate::schemas::student::{StudentCreate, StudentResponse};

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_student).get(list_students))
        .route("/:student_id", get(get_student))
        .route("/:student_id", delete(delete_student))
}

async fn create_student(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<StudentCreate>,
) -> Result<(StatusCode, Json<StudentResponse>), ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let student = repositories::students::create(
        state.db(),
        repositories::students::CreateStudent {
            id: &Uuid::new_v4().to_string(),
            name: &payload.name,
            roll_no: &payload.roll_no,
            email: &payload.email,
            user_id: &user.id,
            created_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| {
        if repositories::is_unique_violation(&e) {
            ApiError::Conflict(
                "Student with this roll number or email already exists".to_string(),
            )
        } else {
            ApiError::internal(e, "Failed to create student")
        }
    })?;

    Ok((StatusCode::CREATED, Json(StudentResponse::from(student))))
}

async fn list_students(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<StudentResponse>>, ApiError> {
    let students = repositories::students::list_by_user(state.db(), &user.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list students"))?;

    Ok(Json(students.into_iter().map(StudentResponse::from).collect()))
}

async fn get_student(
    Path(student_id): Path<String>,
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<StudentResponse>, ApiError> {
    let student = repositories::students::find_for_user(state.db(), &student_id, &user.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch student"))?
        .ok_or_else(|| ApiError::NotFound("Student does not exist".to_string()))?;

    Ok(Json(StudentResponse::from(student)))
}

async fn delete_student(
    Path(student_id): Path<String>,
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<StatusCode, ApiError> {
    let deleted = repositories::students::delete_for_user(state.db(), &student_id, &user.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete student"))?;

    if deleted == 0 {
        return Err(ApiError::NotFound("Student does not exist".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}
