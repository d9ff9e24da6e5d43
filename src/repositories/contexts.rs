use sqlx::PgPool;
use time::PrimitiveDateTime;

use crate::db::models::ReferenceContext;

const COLUMNS: &str = "id, name, comments, context_key, file_name, user_id, created_at";

pub(crate) async fn find_for_user(
    pool: &PgPool,
    id: &str,
    user_id: &str,
) -> Result<Option<ReferenceContext>, sqlx::Error> {
    sqlx::query_as::<_, ReferenceContext>(&format!(
        "SELECT {COLUMNS} FROM contexts WHERE id = $1 AND user_id = $2"
    ))
    .bind(id)
    .bind(user_id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn list_by_user(
    pool: &PgPool,
    user_id: &str,
) -> Result<Vec<ReferenceContext>, sqlx::Error> {
    sqlx::query_as::<_, ReferenceContext>(&format!(
        "SELECT {COLUMNS} FROM contexts WHERE user_id = $1 ORDER BY created_at, id"
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await
}

pub(crate) async fn find_context_key(
    pool: &PgPool,
    id: &str,
) -> Result<Option<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>("SELECT context_key FROM contexts WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub(crate) struct CreateContext<'a> {
    pub(crate) id: &'a str,
    pub(crate) name: &'a str,
    pub(crate) comments: &'a str,
    pub(crate) context_key: &'a str,
    pub(crate) file_name: &'a str,
    pub(crate) user_id: &'a str,
    pub(crate) created_at: PrimitiveDateTime,
}

pub(crate) async fn create(
    pool: &PgPool,
    params: CreateContext<'_>,
) -> Result<ReferenceContext, sqlx::Error> {
    sqlx::query_as::<_, ReferenceContext>(&format!(
        "INSERT INTO contexts (id, name, comments, context_key, file_name, user_id, created_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7)
         RETURNING {COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.name)
    .bind(params.comments)
    .bind(params.context_key)
    .bind(params.file_name)
    .bind(params.user_id)
    .bind(params.created_at)
    .fetch_one(pool)
    .await
}

pub(crate) async fn delete_for_user(
    pool: &PgPool,
    id: &str,
    user_id: &str,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM contexts WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}
