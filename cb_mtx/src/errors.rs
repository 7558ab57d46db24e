//! Errors raised while writing or checking a Matrix Market output directory.

use cb_h5::ContainerError;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error(transparent)]
    Container(#[from] ContainerError),

    #[error(
        "Feature columns differ in length: {ids} ids, {names} names and {types} feature types"
    )]
    LengthMismatch {
        ids: usize,
        names: usize,
        types: usize,
    },

    #[error("{nnz} nonzero entries do not fit in the Matrix Market entry count (max {max})")]
    EncodingOverflow { nnz: usize, max: u64 },

    #[error("Could not create the output directory {path:?}")]
    OutputDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not write {path:?}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not write the compressed file {path:?}")]
    CompressionFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not remove {path:?}")]
    CleanupFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("The output directory is incomplete: {reason} ({path:?})")]
    IncompleteOutput { path: PathBuf, reason: &'static str },

    #[error("Malformed output file {path:?} at line {line}: {reason}")]
    MalformedOutput {
        path: PathBuf,
        line: usize,
        reason: String,
    },
}
