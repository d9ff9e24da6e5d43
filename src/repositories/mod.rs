pub(crate) mod answers;
pub(crate) mod contexts;
pub(crate) mod exams;
pub(crate) mod students;
pub(crate) mod users;

/// Postgres unique-constraint violation, used to map inserts onto 409s.
pub(crate) fn is_unique_violation(error: &sqlx::Error) -> bool {
    matches!(
        error,
        sqlx::Error::Database(db_error) if db_error.code().as_deref() == Some("23505")
    )
}
