use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::ReferenceContext;

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct ContextCreate {
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub(crate) name: String,
    #[serde(default)]
    pub(crate) comments: String,
    /// Raw text extraction of the reference document.
    pub(crate) document: String,
    #[serde(alias = "fileName")]
    #[validate(length(min = 1, message = "file_name must not be empty"))]
    pub(crate) file_name: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct ContextResponse {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) comments: String,
    pub(crate) context_key: String,
    pub(crate) file_name: String,
    pub(crate) created_at: String,
}

impl From<ReferenceContext> for ContextResponse {
    fn from(context: ReferenceContext) -> Self {
        Self {
            id: context.id,
            name: context.name,
            comments: context.comments,
            context_key: context.context_key,
            file_name: context.file_name,
            created_at: format_primitive(context.created_at),
        }
    }
}
