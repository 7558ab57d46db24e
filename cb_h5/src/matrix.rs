//! A feature-barcode matrix: the validated counts with their row and column labels.

use crate::csc::CscMatrix;
use crate::{ContainerError, RawContainer};

/// Parallel feature columns, one entry per matrix row.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FeatureList {
    /// `ENSG00000243485` for example
    pub ids: Vec<String>,
    /// `MIR1302-2HG` for example
    pub names: Vec<String>,
    /// `Gene Expression` for example
    pub types: Vec<String>,
}

impl FeatureList {
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// In-memory feature-barcode count matrix, built once per conversion.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FeatureBarcodeMatrix {
    pub barcodes: Vec<String>,
    pub features: FeatureList,
    pub matrix: CscMatrix,
}

impl FeatureBarcodeMatrix {
    /// Validate the raw arrays and assemble the matrix, consuming the container.
    pub fn from_container(raw: RawContainer) -> Result<Self, ContainerError> {
        let RawContainer {
            barcodes,
            feature_ids,
            feature_names,
            feature_types,
            data,
            indices,
            indptr,
            shape,
        } = raw;

        let matrix = CscMatrix::new(shape, data, indices, indptr)?;

        if barcodes.len() != matrix.num_cols() {
            return Err(ContainerError::shape_mismatch(
                "len(matrix/barcodes) vs matrix/shape cols",
                matrix.num_cols(),
                barcodes.len(),
            ));
        }
        for (name, len) in [
            ("matrix/features/id", feature_ids.len()),
            ("matrix/features/name", feature_names.len()),
            ("matrix/features/feature_type", feature_types.len()),
        ] {
            if len != matrix.num_rows() {
                return Err(ContainerError::shape_mismatch(
                    format!("len({name}) vs matrix/shape rows"),
                    matrix.num_rows(),
                    len,
                ));
            }
        }

        Ok(FeatureBarcodeMatrix {
            barcodes,
            features: FeatureList {
                ids: feature_ids,
                names: feature_names,
                types: feature_types,
            },
            matrix,
        })
    }

    pub fn num_barcodes(&self) -> usize {
        self.barcodes.len()
    }

    pub fn num_features(&self) -> usize {
        self.features.len()
    }
}
