pub(crate) mod answer_key;
pub(crate) mod grader;
pub(crate) mod grading_pipeline;
pub(crate) mod splitter;
pub(crate) mod vector_store;
