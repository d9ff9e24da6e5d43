use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::Student;

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct StudentCreate {
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub(crate) name: String,
    #[serde(alias = "rollNo")]
    #[validate(length(min = 1, message = "roll_no must not be empty"))]
    pub(crate) roll_no: String,
    #[validate(email(message = "invalid email address"))]
    pub(crate) email: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct StudentResponse {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) roll_no: String,
    pub(crate) email: String,
    pub(crate) created_at: String,
}

impl From<Student> for StudentResponse {
    fn from(student: Student) -> Self {
        Self {
            id: student.id,
            name: student.name,
            roll_no: student.roll_no,
            email: student.email,
            created_at: format_primitive(student.created_at),
        }
    }
}
