//! Write arrays in the count matrix layout. The inverse of [`crate::CountMatrixH5::read`].

use crate::layout::{
    BARCODES, DATA, FEATURE_GROUP, FEATURE_ID, FEATURE_NAME, FEATURE_TYPE, INDICES, INDPTR,
    MATRIX_GROUP, SHAPE,
};
use crate::{RawContainer, FA_LEN};
use anyhow::Result;
use hdf5::types::{FixedAscii, VarLenUnicode};
use hdf5::{Group, H5Type};
use itertools::Itertools;
use std::path::Path;
use std::str::FromStr;

/// Write a 1-D dataset with the same filters as the 10x matrix files.
fn write_column_ds<T: H5Type>(group: &Group, name: &str, data: &[T]) -> Result<()> {
    let dataset = group.new_dataset::<T>().shape(data.len());
    if data.is_empty() {
        // Filters are not permitted for an empty dataset.
        dataset.create(name)?;
    } else {
        dataset.shuffle().deflate(1).create(name)?.write(data)?;
    }
    Ok(())
}

/// Write strings as fixed-width ASCII when they fit, otherwise as variable-length UTF-8.
fn write_string_column(group: &Group, name: &str, strings: &[String]) -> Result<()> {
    if strings.iter().all(|s| s.is_ascii() && s.len() <= FA_LEN) {
        let values: Vec<FixedAscii<FA_LEN>> =
            strings.iter().map(FixedAscii::<FA_LEN>::from_ascii).try_collect()?;
        write_column_ds(group, name, &values)
    } else {
        let values: Vec<VarLenUnicode> = strings
            .iter()
            .map(|s| VarLenUnicode::from_str(s))
            .try_collect()?;
        group
            .new_dataset::<VarLenUnicode>()
            .shape(values.len())
            .create(name)?
            .write(&values)?;
        Ok(())
    }
}

/// Write `raw` to a new HDF5 file at `path`, replacing any existing file.
///
/// /matrix
///     /barcodes
///     /features/{id,name,feature_type}
///     /data, /indices, /indptr (int64)
///     /shape ([rows, cols])
pub fn write_count_matrix_h5(path: &Path, raw: &RawContainer) -> Result<()> {
    let file = hdf5::File::create(path)?;
    let matrix = file.create_group(MATRIX_GROUP)?;
    write_string_column(&matrix, BARCODES, &raw.barcodes)?;

    let features = matrix.create_group(FEATURE_GROUP)?;
    write_string_column(&features, FEATURE_ID, &raw.feature_ids)?;
    write_string_column(&features, FEATURE_NAME, &raw.feature_names)?;
    write_string_column(&features, FEATURE_TYPE, &raw.feature_types)?;

    write_column_ds(&matrix, DATA, &raw.data)?;
    write_column_ds(&matrix, INDICES, &raw.indices)?;
    write_column_ds(&matrix, INDPTR, &raw.indptr)?;
    write_column_ds(&matrix, SHAPE, &[raw.shape.rows, raw.shape.cols])?;

    file.close()?;
    Ok(())
}
