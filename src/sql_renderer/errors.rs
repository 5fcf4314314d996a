use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum SqlRenderError {
    #[error("Statement cannot be rendered: {0}")]
    Unrenderable(String),
}
