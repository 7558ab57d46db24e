//! Canonical text encodings of the three feature-barcode matrix files.

use crate::errors::ExportError;
use crate::{BARCODES_TSV, FEATURES_TSV};
use cb_h5::{CscMatrix, FeatureList};
use std::io::{self, Write};

/// Header of a general integer coordinate Matrix Market file.
pub const MTX_BANNER: &str = "%%MatrixMarket matrix coordinate integer general\n%\n";

/// The uncompressed contents of one output file, handed over to be compressed.
#[derive(Debug, PartialEq, Eq)]
pub struct EncodedArtifact {
    /// File name without the `.gz` suffix.
    pub file_name: &'static str,
    pub bytes: Vec<u8>,
}

/// One barcode per line, in matrix column order.
pub fn encode_barcodes(barcodes: &[String]) -> EncodedArtifact {
    let mut text = String::with_capacity(barcodes.iter().map(|bc| bc.len() + 1).sum());
    for bc in barcodes {
        text.push_str(bc);
        text.push('\n');
    }
    EncodedArtifact {
        file_name: BARCODES_TSV,
        bytes: text.into_bytes(),
    }
}

/// One `id\tname\ttype` line per feature, in matrix row order.
pub fn encode_features(features: &FeatureList) -> Result<EncodedArtifact, ExportError> {
    let FeatureList { ids, names, types } = features;
    if ids.len() != names.len() || ids.len() != types.len() {
        return Err(ExportError::LengthMismatch {
            ids: ids.len(),
            names: names.len(),
            types: types.len(),
        });
    }

    let mut text = String::new();
    for ((id, name), feature_type) in ids.iter().zip(names).zip(types) {
        text.push_str(id);
        text.push('\t');
        text.push_str(name);
        text.push('\t');
        text.push_str(feature_type);
        text.push('\n');
    }
    Ok(EncodedArtifact {
        file_name: FEATURES_TSV,
        bytes: text.into_bytes(),
    })
}

/// Convert an entry count to the width used by the header line.
/// Readers of this format load `indptr` as int64, so that is the limit.
pub fn checked_entry_count(nnz: usize) -> Result<u64, ExportError> {
    match i64::try_from(nnz) {
        Ok(n) => Ok(n as u64),
        Err(_) => Err(ExportError::EncodingOverflow {
            nnz,
            max: i64::MAX as u64,
        }),
    }
}

/// Streams a [`CscMatrix`] as Matrix Market coordinate text.
///
/// Explicitly stored zeros are not written and are not counted in the header.
/// Entries are written column by column, in stored order within a column, with
/// 1-based indices.
pub struct MatrixMarketEncoder<'a> {
    matrix: &'a CscMatrix,
    nnz: u64,
}

impl<'a> MatrixMarketEncoder<'a> {
    pub fn new(matrix: &'a CscMatrix) -> Result<Self, ExportError> {
        let nnz = checked_entry_count(matrix.nonzero_count())?;
        Ok(MatrixMarketEncoder { matrix, nnz })
    }

    /// The entry count written to the header line.
    pub fn nnz(&self) -> u64 {
        self.nnz
    }

    /// Write the banner, the dimension line and all entries. Returns the
    /// number of entry lines written.
    pub fn write_to<W: Write>(&self, mut writer: W) -> io::Result<u64> {
        let shape = self.matrix.shape();
        writer.write_all(MTX_BANNER.as_bytes())?;
        writeln!(writer, "{} {} {}", shape.rows, shape.cols, self.nnz)?;

        let mut written = 0u64;
        for entry in self.matrix.entries().filter(|e| e.value != 0) {
            // indices are 1-based
            writeln!(writer, "{} {} {}", entry.row + 1, entry.col + 1, entry.value)?;
            written += 1;
        }
        writer.flush()?;
        Ok(written)
    }
}
