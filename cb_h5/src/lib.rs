//! cb_h5
//!
//! Read the feature-barcode count matrix HDF5 files written by CellBender
//! (the 10x `matrix` group layout) into validated in-memory structures.

use hdf5::types::{FixedAscii, FixedUnicode, TypeDescriptor, VarLenAscii, VarLenUnicode};
use hdf5::{Dataset, Group, H5Type};

pub mod container;
pub mod csc;
mod errors;
pub mod matrix;
mod write;

pub use container::{CountMatrixH5, MatrixShape, RawContainer};
pub use csc::CscMatrix;
pub use errors::ContainerError;
pub use matrix::{FeatureBarcodeMatrix, FeatureList};
pub use write::write_count_matrix_h5;

/// Fixed-width strings are read into buffers of this many bytes.
pub const FA_LEN: usize = 256;

/// Group and dataset names of the count matrix layout.
pub mod layout {
    /// Top-level group holding the matrix.
    pub const MATRIX_GROUP: &str = "matrix";
    /// Group holding the feature reference, inside the matrix group.
    pub const FEATURE_GROUP: &str = "features";

    /// Barcode strings, one per column.
    pub const BARCODES: &str = "barcodes";
    /// Feature identifiers.
    pub const FEATURE_ID: &str = "id";
    /// Feature display names.
    pub const FEATURE_NAME: &str = "name";
    /// Feature types, e.g. `Gene Expression`.
    pub const FEATURE_TYPE: &str = "feature_type";
    /// Stored count values.
    pub const DATA: &str = "data";
    /// Row (feature) index of each stored value.
    pub const INDICES: &str = "indices";
    /// Offsets into `data` where each column (barcode) starts.
    pub const INDPTR: &str = "indptr";
    /// `[num_features, num_barcodes]`.
    pub const SHAPE: &str = "shape";
}

/// String dataset element types that expose their raw bytes.
trait H5Text: H5Type {
    fn text_bytes(&self) -> &[u8];
}

impl<const N: usize> H5Text for FixedAscii<N> {
    fn text_bytes(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl<const N: usize> H5Text for FixedUnicode<N> {
    fn text_bytes(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl H5Text for VarLenAscii {
    fn text_bytes(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl H5Text for VarLenUnicode {
    fn text_bytes(&self) -> &[u8] {
        self.as_bytes()
    }
}

/// Read every element of a string dataset and decode it as UTF-8.
/// `field` is the full path of the dataset, used in error messages.
fn read_text<T: H5Text>(ds: &Dataset, field: &str) -> Result<Vec<String>, ContainerError> {
    ds.read_raw::<T>()
        .map_err(|e| ContainerError::malformed(field, e))?
        .iter()
        .enumerate()
        .map(|(index, s)| {
            std::str::from_utf8(s.text_bytes())
                .map(str::to_owned)
                .map_err(|e| ContainerError::MalformedContainer {
                    field: field.to_string(),
                    index: Some(index),
                    reason: e.to_string(),
                })
        })
        .collect()
}

/// Read a 1-D string dataset, whatever the string flavour it was written with.
pub(crate) fn read_string_dataset(ds: &Dataset, field: &str) -> Result<Vec<String>, ContainerError> {
    let descriptor = ds
        .dtype()
        .and_then(|dtype| dtype.to_descriptor())
        .map_err(|e| ContainerError::malformed(field, e))?;
    match descriptor {
        TypeDescriptor::FixedAscii(width) | TypeDescriptor::FixedUnicode(width)
            if width > FA_LEN =>
        {
            Err(ContainerError::malformed(
                field,
                format!("fixed-width strings of {width} bytes exceed the supported {FA_LEN}"),
            ))
        }
        TypeDescriptor::FixedAscii(_) => read_text::<FixedAscii<FA_LEN>>(ds, field),
        TypeDescriptor::FixedUnicode(_) => read_text::<FixedUnicode<FA_LEN>>(ds, field),
        TypeDescriptor::VarLenAscii => read_text::<VarLenAscii>(ds, field),
        TypeDescriptor::VarLenUnicode => read_text::<VarLenUnicode>(ds, field),
        other => Err(ContainerError::malformed(
            field,
            format!("expected a string dataset, found {other:?}"),
        )),
    }
}

/// Read a 1-D integer dataset, widening to i64.
pub(crate) fn read_i64_dataset(ds: &Dataset, field: &str) -> Result<Vec<i64>, ContainerError> {
    ds.read_raw::<i64>()
        .map_err(|e| ContainerError::malformed(field, e))
}

/// Open the group `name` inside `parent`, reporting `path` when it is absent.
pub(crate) fn require_group(parent: &Group, name: &str, path: &str) -> Result<Group, ContainerError> {
    if !parent.link_exists(name) {
        return Err(ContainerError::MissingField {
            field: path.to_string(),
        });
    }
    parent
        .group(name)
        .map_err(|e| ContainerError::malformed(path, e))
}

/// Open the dataset `name` inside `parent`, reporting `path` when it is absent.
pub(crate) fn require_dataset(
    parent: &Group,
    name: &str,
    path: &str,
) -> Result<Dataset, ContainerError> {
    if !parent.link_exists(name) {
        return Err(ContainerError::MissingField {
            field: path.to_string(),
        });
    }
    parent
        .dataset(name)
        .map_err(|e| ContainerError::malformed(path, e))
}

/// Join a group path and a member name, e.g. `matrix` + `data`.
pub(crate) fn field_path(group: &str, name: &str) -> String {
    format!("{group}/{name}")
}
