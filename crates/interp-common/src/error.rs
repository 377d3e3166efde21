//! Error types for grid interpolation.

use thiserror::Error;

/// Result type alias using InterpError.
pub type InterpResult<T> = Result<T, InterpError>;

/// Fatal errors raised at the interpolation boundary.
///
/// Per-cell conditions (a target cell outside the source grid, an oracle
/// lookup failure) are never errors: the affected cell is written as the
/// target missing value and interpolation proceeds.
#[derive(Debug, Error)]
pub enum InterpError {
    /// Invalid or inconsistent configuration (unknown method/mode tokens,
    /// missing oracle for the grib method, bad descriptor fields).
    #[error("configuration error: {0}")]
    Config(String),

    /// Filesystem failure against the intertable store.
    #[error("store I/O error: {0}")]
    Io(String),

    /// An intertable file exists but cannot be decoded.
    #[error("intertable decode error: {0}")]
    Decode(String),

    /// A table or value array does not match the geometry it is applied to.
    #[error("shape mismatch: expected {expected}, got {actual}")]
    ShapeMismatch { expected: String, actual: String },

    /// Fewer than two source nodes; no spatial index can be built.
    #[error("degenerate source grid: {0} node(s), need at least 2")]
    DegenerateGrid(usize),
}

impl InterpError {
    /// Create a Config error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a Decode error.
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Create a ShapeMismatch error.
    pub fn shape_mismatch(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Self::ShapeMismatch {
            expected: expected.into(),
            actual: actual.into(),
        }
    }
}

impl From<std::io::Error> for InterpError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}
