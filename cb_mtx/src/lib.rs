//! cb_mtx
//!
//! Convert a CellBender count matrix HDF5 file into a feature-barcode matrix
//! directory: `barcodes.tsv.gz`, `features.tsv.gz` and `matrix.mtx.gz`.

pub mod convert;
pub mod encode;
mod errors;
pub mod finalize;
pub mod verify;

pub use convert::{convert, ConversionSummary, MtxOutputs};
pub use errors::ExportError;

/// Uncompressed name of the barcode list.
pub const BARCODES_TSV: &str = "barcodes.tsv";
/// Uncompressed name of the feature list.
pub const FEATURES_TSV: &str = "features.tsv";
/// Uncompressed name of the Matrix Market file, also the on-disk intermediate.
pub const MATRIX_MTX: &str = "matrix.mtx";

/// The compressed files every complete output directory holds.
pub const OUTPUT_FILES: [&str; 3] = ["barcodes.tsv.gz", "features.tsv.gz", "matrix.mtx.gz"];
