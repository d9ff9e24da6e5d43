use sqlx::types::Json;
use sqlx::PgPool;
use time::PrimitiveDateTime;

use crate::services::answer_key::EvaluationDetail;

const ROW_SELECT: &str = "\
    SELECT a.id,
           a.exam_id,
           a.student_id,
           s.name AS student_name,
           s.roll_no AS student_roll_no,
           a.score,
           a.confidence,
           a.evaluation_details,
           a.file_name,
           e.total_marks AS max_exam_score
    FROM answers a
    JOIN students s ON s.id = a.student_id
    JOIN exams e ON e.id = a.exam_id";

/// Answer joined with the student display fields and the exam score ceiling.
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct AnswerWithStudentRow {
    pub(crate) id: i64,
    pub(crate) exam_id: String,
    pub(crate) student_id: String,
    pub(crate) student_name: String,
    pub(crate) student_roll_no: String,
    pub(crate) score: f64,
    pub(crate) confidence: f64,
    pub(crate) evaluation_details: Json<Vec<EvaluationDetail>>,
    pub(crate) file_name: String,
    pub(crate) max_exam_score: f64,
}

pub(crate) async fn find_for_user(
    pool: &PgPool,
    id: i64,
    user_id: &str,
) -> Result<Option<AnswerWithStudentRow>, sqlx::Error> {
    sqlx::query_as::<_, AnswerWithStudentRow>(&format!(
        "{ROW_SELECT} WHERE a.id = $1 AND e.user_id = $2"
    ))
    .bind(id)
    .bind(user_id)
    .fetch_optional(pool)
    .await
}

/// Ascending id = creation order.
pub(crate) async fn list_by_exam(
    pool: &PgPool,
    exam_id: &str,
) -> Result<Vec<AnswerWithStudentRow>, sqlx::Error> {
    sqlx::query_as::<_, AnswerWithStudentRow>(&format!(
        "{ROW_SELECT} WHERE a.exam_id = $1 ORDER BY a.id"
    ))
    .bind(exam_id)
    .fetch_all(pool)
    .await
}

pub(crate) struct CreateAnswer<'a> {
    pub(crate) exam_id: &'a str,
    pub(crate) student_id: &'a str,
    pub(crate) score: f64,
    pub(crate) confidence: f64,
    pub(crate) evaluation_details: Json<Vec<EvaluationDetail>>,
    pub(crate) file_name: &'a str,
    pub(crate) created_at: PrimitiveDateTime,
}

pub(crate) async fn create(pool: &PgPool, params: CreateAnswer<'_>) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        "INSERT INTO answers (exam_id, student_id, score, confidence, evaluation_details,
                              file_name, created_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7)
         RETURNING id",
    )
    .bind(params.exam_id)
    .bind(params.student_id)
    .bind(params.score)
    .bind(params.confidence)
    .bind(params.evaluation_details)
    .bind(params.file_name)
    .bind(params.created_at)
    .fetch_one(pool)
    .await
}

pub(crate) async fn delete_for_user(
    pool: &PgPool,
    id: i64,
    user_id: &str,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "DELETE FROM answers a USING exams e WHERE a.exam_id = e.id AND a.id = $1 AND e.user_id = $2",
    )
    .bind(id)
    .bind(user_id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}
