//! Read the raw arrays of a count matrix HDF5 file.

use crate::layout::{
    BARCODES, DATA, FEATURE_GROUP, FEATURE_ID, FEATURE_NAME, FEATURE_TYPE, INDICES, INDPTR,
    MATRIX_GROUP, SHAPE,
};
use crate::{
    field_path, read_i64_dataset, read_string_dataset, require_dataset, require_group,
    ContainerError,
};
use hdf5::Group;
use log::debug;
use std::path::{Path, PathBuf};

/// Matrix dimensions as stored in `matrix/shape`: features × barcodes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MatrixShape {
    pub rows: i64,
    pub cols: i64,
}

/// The arrays of a count matrix file, decoded but not yet validated
/// against each other.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RawContainer {
    pub barcodes: Vec<String>,
    pub feature_ids: Vec<String>,
    pub feature_names: Vec<String>,
    pub feature_types: Vec<String>,
    pub data: Vec<i64>,
    pub indices: Vec<i64>,
    pub indptr: Vec<i64>,
    pub shape: MatrixShape,
}

/// A feature-barcode count matrix HDF5 file, as written by CellBender.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CountMatrixH5(PathBuf);

impl CountMatrixH5 {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        CountMatrixH5(path.into())
    }

    pub fn path(&self) -> &Path {
        &self.0
    }

    /// Open the file read-only. The handle is closed when the returned
    /// `File` is dropped, on every path out of the caller.
    fn open(&self) -> Result<hdf5::File, ContainerError> {
        // Distinguish an unreadable path from a readable file that is not HDF5.
        std::fs::File::open(&self.0).map_err(|source| ContainerError::ContainerNotFound {
            path: self.0.clone(),
            source,
        })?;
        hdf5::File::open(&self.0)
            .map_err(|e| ContainerError::malformed(&self.0.display().to_string(), e))
    }

    fn matrix_group(file: &hdf5::File) -> Result<Group, ContainerError> {
        require_group(file, MATRIX_GROUP, MATRIX_GROUP)
    }

    /// Read all arrays into memory.
    pub fn read(&self) -> Result<RawContainer, ContainerError> {
        let file = self.open()?;
        let raw = Self::read_matrix(&file)?;
        debug!(
            "Read {} barcodes, {} features and {} stored entries from {}",
            raw.barcodes.len(),
            raw.feature_ids.len(),
            raw.data.len(),
            self.0.display()
        );
        Ok(raw)
    }

    fn read_matrix(file: &hdf5::File) -> Result<RawContainer, ContainerError> {
        let matrix = Self::matrix_group(file)?;
        let string_dataset = |group: &Group, group_path: &str, name: &str| {
            let path = field_path(group_path, name);
            read_string_dataset(&require_dataset(group, name, &path)?, &path)
        };
        let int_dataset = |name: &str| {
            let path = field_path(MATRIX_GROUP, name);
            read_i64_dataset(&require_dataset(&matrix, name, &path)?, &path)
        };

        let barcodes = string_dataset(&matrix, MATRIX_GROUP, BARCODES)?;

        let feature_path = field_path(MATRIX_GROUP, FEATURE_GROUP);
        let features = require_group(&matrix, FEATURE_GROUP, &feature_path)?;
        let feature_ids = string_dataset(&features, &feature_path, FEATURE_ID)?;
        let feature_names = string_dataset(&features, &feature_path, FEATURE_NAME)?;
        let feature_types = string_dataset(&features, &feature_path, FEATURE_TYPE)?;

        let data = int_dataset(DATA)?;
        let indices = int_dataset(INDICES)?;
        let indptr = int_dataset(INDPTR)?;
        let shape = read_shape(&matrix)?;

        Ok(RawContainer {
            barcodes,
            feature_ids,
            feature_names,
            feature_types,
            data,
            indices,
            indptr,
            shape,
        })
    }
}

fn read_shape(matrix: &Group) -> Result<MatrixShape, ContainerError> {
    let path = field_path(MATRIX_GROUP, SHAPE);
    let shape = read_i64_dataset(&require_dataset(matrix, SHAPE, &path)?, &path)?;
    let [rows, cols] = shape.as_slice() else {
        return Err(ContainerError::malformed(
            &path,
            format!("expected 2 dimensions, found {}", shape.len()),
        ));
    };
    Ok(MatrixShape {
        rows: *rows,
        cols: *cols,
    })
}
