use coordgraph_common::ArrayError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransformError {
    #[error("Graph definition error: {0}")]
    GraphDefinition(String),

    #[error("Dependency cycle at `{name}`: {path}")]
    Cycle { name: String, path: String },

    #[error("Unresolved name: `{0}`")]
    UnresolvedName(String),

    #[error("Coordinate collision: {0}")]
    CoordCollision(String),

    #[error("Inconsistent dense and event results: {0}")]
    Consistency(String),

    #[error("Array error: {0}")]
    Array(ArrayError),
}

impl From<ArrayError> for TransformError {
    fn from(err: ArrayError) -> Self {
        match err {
            ArrayError::KeyNotFound(name) => TransformError::UnresolvedName(name),
            err => TransformError::Array(err),
        }
    }
}

pub type Result<T> = std::result::Result<T, TransformError>;
