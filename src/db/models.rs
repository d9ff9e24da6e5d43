use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use time::{Date, PrimitiveDateTime};

use crate::services::answer_key::KeyEntry;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct User {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) email: String,
    pub(crate) hashed_password: String,
    pub(crate) created_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Student {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) roll_no: String,
    pub(crate) email: String,
    pub(crate) user_id: String,
    pub(crate) created_at: PrimitiveDateTime,
}

/// Reference corpus registration; the embedded chunks live in the vector
/// store under `context_key`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct ReferenceContext {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) comments: String,
    pub(crate) context_key: String,
    pub(crate) file_name: String,
    pub(crate) user_id: String,
    pub(crate) created_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Exam {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) conducted_date: Option<Date>,
    pub(crate) description: String,
    pub(crate) total_marks: f64,
    pub(crate) answer_key: Json<Vec<KeyEntry>>,
    pub(crate) file_name: String,
    pub(crate) context_id: Option<String>,
    pub(crate) user_id: String,
    pub(crate) created_at: PrimitiveDateTime,
}
