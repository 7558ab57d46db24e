//! Errors raised while reading and validating a count matrix container.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ContainerError {
    #[error("The count matrix file {path:?} does not exist or is not readable")]
    ContainerNotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("The count matrix file is missing the required field '{field}'")]
    MissingField { field: String },

    #[error("Malformed field '{field}'{}: {reason}", .index.map(|i| format!(" at index {i}")).unwrap_or_default())]
    MalformedContainer {
        field: String,
        index: Option<usize>,
        reason: String,
    },

    #[error("Shape mismatch in {what}: expected {expected}, found {actual}")]
    ShapeMismatch {
        what: String,
        expected: i64,
        actual: i64,
    },

    #[error(
        "Row index {row} at position {position} of 'matrix/indices' is out of range for a \
         matrix with {rows} rows"
    )]
    IndexOutOfRange { position: usize, row: i64, rows: i64 },
}

impl ContainerError {
    pub(crate) fn malformed(field: &str, err: impl std::fmt::Display) -> Self {
        ContainerError::MalformedContainer {
            field: field.to_string(),
            index: None,
            reason: err.to_string(),
        }
    }

    pub(crate) fn shape_mismatch(what: impl Into<String>, expected: usize, actual: usize) -> Self {
        ContainerError::ShapeMismatch {
            what: what.into(),
            expected: expected as i64,
            actual: actual as i64,
        }
    }
}
