pub(crate) mod answers;
pub(crate) mod auth;
pub(crate) mod contexts;
pub(crate) mod errors;
pub(crate) mod exams;
pub(crate) mod guards;
pub(crate) mod handlers;
pub(crate) mod router;
pub(crate) mod students;
pub(crate) mod validation;
