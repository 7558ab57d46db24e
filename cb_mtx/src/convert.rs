//! Run the whole conversion for one input file.

use crate::encode::{encode_barcodes, encode_features, MatrixMarketEncoder};
use crate::errors::ExportError;
use crate::finalize::{clear_outputs, write_gzip_artifact, write_matrix_mtx_gz};
use crate::OUTPUT_FILES;
use cb_h5::{CountMatrixH5, FeatureBarcodeMatrix};
use log::info;
use std::path::{Path, PathBuf};

/// Paths of the three files of a feature-barcode matrix directory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MtxOutputs {
    pub barcodes: PathBuf,
    pub features: PathBuf,
    pub matrix: PathBuf,
}

impl MtxOutputs {
    pub fn in_dir(dir: &Path) -> Self {
        let [barcodes, features, matrix] = OUTPUT_FILES.map(|name| dir.join(name));
        MtxOutputs {
            barcodes,
            features,
            matrix,
        }
    }

    pub fn paths(&self) -> [&Path; 3] {
        [
            self.barcodes.as_path(),
            self.features.as_path(),
            self.matrix.as_path(),
        ]
    }
}

#[derive(Debug)]
pub struct ConversionSummary {
    pub outputs: MtxOutputs,
    pub num_barcodes: usize,
    pub num_features: usize,
    /// Entries stored in the input, explicit zeros included.
    pub stored_entries: usize,
    /// Entry lines written to `matrix.mtx.gz`.
    pub written_entries: u64,
}

/// Convert the count matrix in `input` into `output_dir`.
///
/// The input is read and validated in full before the output directory is
/// created, so a malformed input leaves nothing behind. After that, any
/// failure leaves a partial directory and the run must be treated as failed.
pub fn convert(input: &Path, output_dir: &Path) -> Result<ConversionSummary, ExportError> {
    let raw = CountMatrixH5::new(input).read()?;
    let matrix = FeatureBarcodeMatrix::from_container(raw)?;
    info!(
        "Constructed sparse CSC matrix: {} features x {} barcodes, {} stored entries",
        matrix.num_features(),
        matrix.num_barcodes(),
        matrix.matrix.stored_len()
    );

    let barcodes = encode_barcodes(&matrix.barcodes);
    let features = encode_features(&matrix.features)?;
    let mtx = MatrixMarketEncoder::new(&matrix.matrix)?;

    std::fs::create_dir_all(output_dir).map_err(|source| ExportError::OutputDirectory {
        path: output_dir.to_path_buf(),
        source,
    })?;
    clear_outputs(output_dir)?;

    let barcodes = write_gzip_artifact(output_dir, barcodes)?;
    let features = write_gzip_artifact(output_dir, features)?;
    let (matrix_gz, written_entries) = write_matrix_mtx_gz(output_dir, &mtx)?;
    info!("All files saved to {}", output_dir.display());

    Ok(ConversionSummary {
        outputs: MtxOutputs {
            barcodes,
            features,
            matrix: matrix_gz,
        },
        num_barcodes: matrix.num_barcodes(),
        num_features: matrix.num_features(),
        stored_entries: matrix.matrix.stored_len(),
        written_entries,
    })
}
