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
use crate::schemas::context::{ContextCreate, ContextResponse};

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_context).get(list_contexts))
        .route("/:context_id", get(get_context))
        .route("/:context_id", delete(delete_context))
}

async fn create_context(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<ContextCreate>,
) -> Result<(StatusCode, Json<ContextResponse>), ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;
    if payload.document.trim().is_empty() {
        return Err(ApiError::BadRequest("Reference document is empty".to_string()));
    }

    let context_key = generate_context_key();

    state.vector_store().embed_and_store(&context_key, &payload.document).await.map_err(|e| {
        tracing::error!(error = %format!("{e:#}"), "Reference embedding failed");
        ApiError::BadGateway("Could not process the reference document".to_string())
    })?;

    let context = repositories::contexts::create(
        state.db(),
        repositories::contexts::CreateContext {
            id: &Uuid::new_v4().to_string(),
            name: &payload.name,
            comments: &payload.comments,
            context_key: &context_key,
            file_name: &payload.file_name,
            user_id: &user.id,
            created_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create context"))?;

    Ok((StatusCode::CREATED, Json(ContextResponse::from(context))))
}

async fn list_contexts(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<ContextResponse>>, ApiError> {
    let contexts = repositories::contexts::list_by_user(state.db(), &user.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list contexts"))?;

    Ok(Json(contexts.into_iter().map(ContextResponse::from).collect()))
}

async fn get_context(
    Path(context_id): Path<String>,
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<ContextResponse>, ApiError> {
    let context = repositories::contexts::find_for_user(state.db(), &context_id, &user.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch context"))?
        .ok_or_else(|| ApiError::NotFound("Context does not exist".to_string()))?;

    Ok(Json(ContextResponse::from(context)))
}

async fn delete_context(
    Path(context_id): Path<String>,
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<StatusCode, ApiError> {
    let context = repositories::contexts::find_for_user(state.db(), &context_id, &user.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch context"))?
        .ok_or_else(|| ApiError::NotFound("Context does not exist".to_string()))?;

    let deleted = repositories::contexts::delete_for_user(state.db(), &context.id, &user.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete context"))?;
    if deleted == 0 {
        return Err(ApiError::NotFound("Context does not exist".to_string()));
    }

    // The database row is authoritative; orphaned chunks are only a storage leak.
    if let Err(err) = state.vector_store().delete_context(&context.context_key).await {
        tracing::warn!(
            context_key = %context.context_key,
            error = %format!("{err:#}"),
            "Failed to delete embedded chunks for removed context"
        );
    }

    Ok(StatusCode::NO_CONTENT)
}

/// Opaque handle tying an embedded corpus to its database row.
fn generate_context_key() -> String {
    format!("CONTEXT{}", Uuid::new_v4().simple())
}

#[cfg(test)]
mod tests {
    use super::generate_context_key;

    #[test]
    fn context_keys_are_prefixed_and_unique() {
        let a = generate_context_key();
        let b = generate_context_key();

        assert!(a.starts_with("CONTEXT"));
        assert_eq!(a.len(), "CONTEXT".len() + 32);
        assert_ne!(a, b);
    }
}
