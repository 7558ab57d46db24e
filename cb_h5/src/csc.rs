//! A validated compressed-sparse-column count matrix.

use crate::{ContainerError, MatrixShape};
use itertools::Itertools;
use std::ops::Range;

/// The stored value of one matrix entry.
pub type Count = i64;

/// Compressed-sparse-column matrix of features (rows) × barcodes (columns).
///
/// Construction checks that the arrays are mutually consistent. Entries are
/// kept exactly as stored: rows within a column may be unsorted, duplicates
/// and explicit zeros are passed through.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CscMatrix {
    shape: MatrixShape,
    data: Vec<Count>,
    indices: Vec<i64>,
    indptr: Vec<i64>,
}

/// One stored entry, 0-based.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Entry {
    pub row: usize,
    pub col: usize,
    pub value: Count,
}

impl CscMatrix {
    pub fn new(
        shape: MatrixShape,
        data: Vec<Count>,
        indices: Vec<i64>,
        indptr: Vec<i64>,
    ) -> Result<Self, ContainerError> {
        let MatrixShape { rows, cols } = shape;
        for (what, dim) in [("matrix/shape rows", rows), ("matrix/shape cols", cols)] {
            if dim < 0 {
                return Err(ContainerError::ShapeMismatch {
                    what: format!("{what} (must be non-negative)"),
                    expected: 0,
                    actual: dim,
                });
            }
        }

        // An i64::MAX column count has no representable indptr length.
        if cols.checked_add(1) != Some(indptr.len() as i64) {
            return Err(ContainerError::ShapeMismatch {
                what: "len(matrix/indptr) vs matrix/shape cols + 1".into(),
                expected: cols.saturating_add(1),
                actual: indptr.len() as i64,
            });
        }
        if data.len() != indices.len() {
            return Err(ContainerError::shape_mismatch(
                "len(matrix/indices) vs len(matrix/data)",
                data.len(),
                indices.len(),
            ));
        }
        if indptr[0] != 0 {
            return Err(ContainerError::ShapeMismatch {
                what: "matrix/indptr[0]".into(),
                expected: 0,
                actual: indptr[0],
            });
        }
        if let Some((pos, (&prev, &next))) = indptr
            .iter()
            .tuple_windows()
            .enumerate()
            .find(|&(_, (prev, next))| next < prev)
        {
            return Err(ContainerError::ShapeMismatch {
                what: format!("matrix/indptr[{}] (must not decrease)", pos + 1),
                expected: prev,
                actual: next,
            });
        }
        let last = indptr[indptr.len() - 1];
        if last != data.len() as i64 {
            return Err(ContainerError::ShapeMismatch {
                what: "matrix/indptr[-1] vs len(matrix/data)".into(),
                expected: data.len() as i64,
                actual: last,
            });
        }

        if let Some((position, &row)) = indices
            .iter()
            .enumerate()
            .find(|&(_, &row)| row < 0 || row >= rows)
        {
            return Err(ContainerError::IndexOutOfRange {
                position,
                row,
                rows,
            });
        }

        Ok(CscMatrix {
            shape,
            data,
            indices,
            indptr,
        })
    }

    pub fn shape(&self) -> MatrixShape {
        self.shape
    }

    pub fn num_rows(&self) -> usize {
        self.shape.rows as usize
    }

    pub fn num_cols(&self) -> usize {
        self.shape.cols as usize
    }

    /// Number of stored entries, explicit zeros included.
    pub fn stored_len(&self) -> usize {
        self.data.len()
    }

    /// Number of stored entries with a nonzero value.
    pub fn nonzero_count(&self) -> usize {
        self.data.iter().filter(|&&v| v != 0).count()
    }

    /// Range of `data` holding column `col`.
    fn column_range(&self, col: usize) -> Range<usize> {
        self.indptr[col] as usize..self.indptr[col + 1] as usize
    }

    /// Iterate stored entries column by column, in stored order within each column.
    pub fn entries(&self) -> impl Iterator<Item = Entry> + '_ {
        (0..self.num_cols()).flat_map(move |col| {
            self.column_range(col).map(move |i| Entry {
                row: self.indices[i] as usize,
                col,
                value: self.data[i],
            })
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    fn shape(rows: i64, cols: i64) -> MatrixShape {
        MatrixShape { rows, cols }
    }

    #[test]
    fn test_entries_follow_stored_order() {
        // Column 0 stores rows out of order; column 1 is empty.
        let m = CscMatrix::new(shape(3, 3), vec![5, 2, 0, 9], vec![2, 0, 1, 1], vec![0, 2, 2, 4])
            .unwrap();
        let entries: Vec<_> = m
            .entries()
            .map(|e| (e.row, e.col, e.value))
            .collect();
        assert_eq!(entries, vec![(2, 0, 5), (0, 0, 2), (1, 2, 0), (1, 2, 9)]);
        assert_eq!(m.stored_len(), 4);
        assert_eq!(m.nonzero_count(), 3);
    }

    #[test]
    fn test_empty_dimensions() {
        let m = CscMatrix::new(shape(0, 0), vec![], vec![], vec![0]).unwrap();
        assert_eq!(m.entries().count(), 0);
        let m = CscMatrix::new(shape(0, 4), vec![], vec![], vec![0; 5]).unwrap();
        assert_eq!(m.num_cols(), 4);
        assert_eq!(m.nonzero_count(), 0);
        let m = CscMatrix::new(shape(5, 0), vec![], vec![], vec![0]).unwrap();
        assert_eq!(m.num_rows(), 5);
    }

    #[test]
    fn test_indptr_length() {
        let err = CscMatrix::new(shape(2, 2), vec![1], vec![0], vec![0, 1]).unwrap_err();
        match err {
            ContainerError::ShapeMismatch {
                expected, actual, ..
            } => {
                assert_eq!(expected, 3);
                assert_eq!(actual, 2);
            }
            err => panic!("unexpected error {err}"),
        }
    }

    #[test]
    fn test_max_column_count_is_rejected() {
        let err = CscMatrix::new(shape(1, i64::MAX), vec![], vec![], vec![0]).unwrap_err();
        assert!(matches!(
            err,
            ContainerError::ShapeMismatch {
                expected: i64::MAX,
                actual: 1,
                ..
            }
        ));
    }

    #[test]
    fn test_indptr_end_must_match_data() {
        let err = CscMatrix::new(shape(2, 2), vec![1, 2], vec![0, 1], vec![0, 1, 3]).unwrap_err();
        match err {
            ContainerError::ShapeMismatch {
                expected, actual, ..
            } => {
                assert_eq!(expected, 2);
                assert_eq!(actual, 3);
            }
            err => panic!("unexpected error {err}"),
        }
    }

    #[test]
    fn test_data_indices_length() {
        let err = CscMatrix::new(shape(2, 1), vec![1, 2], vec![0], vec![0, 2]).unwrap_err();
        assert!(matches!(
            err,
            ContainerError::ShapeMismatch {
                expected: 2,
                actual: 1,
                ..
            }
        ));
    }

    #[test]
    fn test_indptr_must_start_at_zero_and_not_decrease() {
        let err = CscMatrix::new(shape(2, 2), vec![1], vec![0], vec![1, 1, 1]).unwrap_err();
        assert!(matches!(err, ContainerError::ShapeMismatch { .. }));

        let err =
            CscMatrix::new(shape(2, 3), vec![1, 2], vec![0, 1], vec![0, 2, 1, 2]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Shape mismatch in matrix/indptr[2] (must not decrease): expected 2, found 1"
        );
    }

    #[test]
    fn test_row_index_out_of_range() {
        let err = CscMatrix::new(shape(2, 1), vec![1, 1], vec![0, 2], vec![0, 2]).unwrap_err();
        assert!(matches!(
            err,
            ContainerError::IndexOutOfRange {
                position: 1,
                row: 2,
                rows: 2
            }
        ));
        let err = CscMatrix::new(shape(2, 1), vec![1], vec![-1], vec![0, 1]).unwrap_err();
        assert!(matches!(
            err,
            ContainerError::IndexOutOfRange { row: -1, .. }
        ));
    }

    #[test]
    fn test_negative_shape() {
        let err = CscMatrix::new(shape(-1, 0), vec![], vec![], vec![0]).unwrap_err();
        assert!(matches!(err, ContainerError::ShapeMismatch { actual: -1, .. }));
    }
}
