use sqlx::types::Json;
use sqlx::PgPool;
use time::{Date, PrimitiveDateTime};

use crate::db::models::Exam;
use crate::services::answer_key::KeyEntry;

const COLUMNS: &str = "\
    id, name, conducted_date, description, total_marks, answer_key, \
    file_name, context_id, user_id, created_at";

pub(crate) async fn find_for_user(
    pool: &PgPool,
    id: &str,
    user_id: &str,
) -> Result<Option<Exam>, sqlx::Error> {
    sqlx::query_as::<_, Exam>(&format!(
        "SELECT {COLUMNS} FROM exams WHERE id = $1 AND user_id = $2"
    ))
    .bind(id)
    .bind(user_id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn list_by_user(pool: &PgPool, user_id: &str) -> Result<Vec<Exam>, sqlx::Error> {
    sqlx::query_as::<_, Exam>(&format!(
        "SELECT {COLUMNS} FROM exams WHERE user_id = $1 ORDER BY created_at, id"
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await
}

pub(crate) struct CreateExam<'a> {
    pub(crate) id: &'a str,
    pub(crate) name: &'a str,
    pub(crate) conducted_date: Option<Date>,
    pub(crate) description: &'a str,
    pub(crate) total_marks: f64,
    pub(crate) answer_key: Json<Vec<KeyEntry>>,
    pub(crate) file_name: &'a str,
    pub(crate) context_id: Option<&'a str>,
    pub(crate) user_id: &'a str,
    pub(crate) created_at: PrimitiveDateTime,
}

pub(crate) async fn create(pool: &PgPool, params: CreateExam<'_>) -> Result<Exam, sqlx::Error> {
    sqlx::query_as::<_, Exam>(&format!(
        "INSERT INTO exams (id, name, conducted_date, description, total_marks, answer_key,
                            file_name, context_id, user_id, created_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
         RETURNING {COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.name)
    .bind(params.conducted_date)
    .bind(params.description)
    .bind(params.total_marks)
    .bind(params.answer_key)
    .bind(params.file_name)
    .bind(params.context_id)
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
    let result = sqlx::query("DELETE FROM exams WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}
