use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ArrayError {
    #[error("Dimension mismatch: {0}")]
    DimensionMismatch(String),

    #[error("Duplicate dimension: `{0}`")]
    DuplicateDimension(String),

    #[error("Shape mismatch: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    #[error("Bin mismatch: {0}")]
    BinMismatch(String),

    #[error("Key not found: `{0}`")]
    KeyNotFound(String),

    #[error("Invalid bins: {0}")]
    InvalidBins(String),

    #[error("Data array `{0}` is not binned")]
    NotBinned(String),
}

impl From<ndarray::ShapeError> for ArrayError {
    fn from(err: ndarray::ShapeError) -> Self {
        ArrayError::DimensionMismatch(err.to_string())
    }
}
