use thiserror::Error;

/// `(rows, cols)` of a matrix, carried by shape errors.
pub type Shape = (usize, usize);

/// Result type used throughout the crate.
pub type Result<T> = std::result::Result<T, NnError>;

#[derive(Error, Debug)]
pub enum NnError {
    /// Operand dimensions are incompatible for the named operation.
    #[error("shape mismatch in {op}: {}x{} vs {}x{}", left.0, left.1, right.0, right.1)]
    ShapeMismatch {
        op: &'static str,
        left: Shape,
        right: Shape,
    },

    #[error("invalid dimension: {0}")]
    InvalidDimension(String),

    #[error("index ({row}, {col}) out of range for {rows}x{cols} matrix")]
    IndexOutOfRange {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },

    /// Output labels do not line up with the output layer.
    #[error("{labels} output labels given for an output layer of {neurons} neurons")]
    LabelCountMismatch { labels: usize, neurons: usize },

    #[error("corrupt model: {0}")]
    CorruptModel(String),

    #[error("dataset error: {0}")]
    Dataset(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl NnError {
    pub fn shape_mismatch(op: &'static str, left: Shape, right: Shape) -> Self {
        NnError::ShapeMismatch { op, left, right }
    }

    pub fn corrupt<S: Into<String>>(reason: S) -> Self {
        NnError::CorruptModel(reason.into())
    }
}
