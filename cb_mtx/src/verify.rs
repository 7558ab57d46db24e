//! Check and read back a feature-barcode matrix directory.

use crate::convert::MtxOutputs;
use crate::errors::ExportError;
use crate::MATRIX_MTX;
use cb_h5::csc::Entry;
use cb_h5::FeatureList;
use flate2::read::GzDecoder;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

/// The decoded contents of a feature-barcode matrix directory.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct MtxContents {
    pub barcodes: Vec<String>,
    pub features: FeatureList,
    pub rows: u64,
    pub cols: u64,
    /// 0-based entries, in file order.
    pub entries: Vec<Entry>,
}

/// A run is complete only when all three compressed files exist and the
/// uncompressed matrix intermediate is gone.
pub fn check_outputs(dir: &Path) -> Result<MtxOutputs, ExportError> {
    let outputs = MtxOutputs::in_dir(dir);
    if let Some(missing) = outputs.paths().into_iter().find(|p| !p.is_file()) {
        return Err(ExportError::IncompleteOutput {
            path: missing.to_path_buf(),
            reason: "missing output file",
        });
    }
    let intermediate = dir.join(MATRIX_MTX);
    if intermediate.exists() {
        return Err(ExportError::IncompleteOutput {
            path: intermediate,
            reason: "uncompressed matrix left behind",
        });
    }
    Ok(outputs)
}

/// Iterate the lines of a gzipped text file, numbered from 1.
fn gz_lines(
    path: &Path,
) -> Result<impl Iterator<Item = (usize, Result<String, ExportError>)> + '_, ExportError> {
    let file = File::open(path).map_err(|e| malformed(path, 0, e))?;
    Ok(BufReader::new(GzDecoder::new(file))
        .lines()
        .enumerate()
        .map(move |(i, line)| (i + 1, line.map_err(|e| malformed(path, i + 1, e)))))
}

fn malformed(path: &Path, line: usize, reason: impl ToString) -> ExportError {
    ExportError::MalformedOutput {
        path: path.to_path_buf(),
        line,
        reason: reason.to_string(),
    }
}

fn read_barcodes(path: &Path) -> Result<Vec<String>, ExportError> {
    gz_lines(path)?.map(|(_, line)| line).collect()
}

fn read_features(path: &Path) -> Result<FeatureList, ExportError> {
    let mut features = FeatureList::default();
    for (n, line) in gz_lines(path)? {
        let line = line?;
        let fields: Vec<_> = line.split('\t').collect();
        let [id, name, feature_type] = fields.as_slice() else {
            return Err(malformed(
                path,
                n,
                format!("expected 3 tab-separated fields, found {}", fields.len()),
            ));
        };
        features.ids.push(id.to_string());
        features.names.push(name.to_string());
        features.types.push(feature_type.to_string());
    }
    Ok(features)
}

/// Parse whitespace-separated numbers, requiring exactly `N` of them.
fn parse_fields<T: std::str::FromStr, const N: usize>(
    path: &Path,
    n: usize,
    line: &str,
) -> Result<[T; N], ExportError>
where
    T::Err: std::fmt::Display,
{
    let values: Vec<T> = line
        .split_ascii_whitespace()
        .map(|field| field.parse::<T>().map_err(|e| malformed(path, n, e)))
        .collect::<Result<_, _>>()?;
    let found = values.len();
    values
        .try_into()
        .map_err(|_| malformed(path, n, format!("expected {N} fields, found {found}")))
}

struct MatrixMarket {
    rows: u64,
    cols: u64,
    entries: Vec<Entry>,
}

fn read_matrix(path: &Path) -> Result<MatrixMarket, ExportError> {
    let mut lines = gz_lines(path)?;

    let (n, banner) = lines
        .next()
        .ok_or_else(|| malformed(path, 0, "empty file"))?;
    if !banner?.starts_with("%%MatrixMarket matrix coordinate") {
        return Err(malformed(path, n, "not a coordinate Matrix Market file"));
    }

    let mut header: Option<(u64, u64, u64)> = None;
    let mut entries = Vec::new();
    for (n, line) in lines {
        let line = line?;
        if line.starts_with('%') {
            continue;
        }
        let Some((rows, cols, nnz)) = header else {
            let [rows, cols, nnz] = parse_fields::<u64, 3>(path, n, &line)?;
            header = Some((rows, cols, nnz));
            entries.reserve(nnz.min(1 << 20) as usize);
            continue;
        };
        let [row, col, value] = parse_fields::<i64, 3>(path, n, &line)?;
        if row < 1 || row as u64 > rows || col < 1 || col as u64 > cols {
            return Err(malformed(
                path,
                n,
                format!("entry ({row}, {col}) is outside a {rows} x {cols} matrix"),
            ));
        }
        if entries.len() as u64 == nnz {
            return Err(malformed(path, n, format!("more than {nnz} entries")));
        }
        entries.push(Entry {
            row: row as usize - 1,
            col: col as usize - 1,
            value,
        });
    }

    let Some((rows, cols, nnz)) = header else {
        return Err(malformed(path, 0, "missing dimension line"));
    };
    if entries.len() as u64 != nnz {
        return Err(malformed(
            path,
            0,
            format!("expected {nnz} entries, found {}", entries.len()),
        ));
    }
    Ok(MatrixMarket {
        rows,
        cols,
        entries,
    })
}

/// Decompress and parse all three files of a complete output directory.
pub fn read_mtx_dir(dir: &Path) -> Result<MtxContents, ExportError> {
    let outputs = check_outputs(dir)?;
    let matrix = read_matrix(&outputs.matrix)?;
    Ok(MtxContents {
        barcodes: read_barcodes(&outputs.barcodes)?,
        features: read_features(&outputs.features)?,
        rows: matrix.rows,
        cols: matrix.cols,
        entries: matrix.entries,
    })
}

/// Path of the leftover intermediate, if a failed run left one behind.
pub fn leftover_intermediate(dir: &Path) -> Option<PathBuf> {
    let path = dir.join(MATRIX_MTX);
    path.exists().then_some(path)
}

#[cfg(test)]
mod test {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use pretty_assertions::assert_eq;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_gz(path: &Path, text: &str) {
        let mut encoder = GzEncoder::new(File::create(path).unwrap(), Compression::fast());
        encoder.write_all(text.as_bytes()).unwrap();
        encoder.finish().unwrap();
    }

    fn write_dir(dir: &Path, matrix: &str) {
        write_gz(&dir.join("barcodes.tsv.gz"), "AAAA\nCCCC\n");
        write_gz(&dir.join("features.tsv.gz"), "G1\tGene1\tGene Expression\n");
        write_gz(&dir.join("matrix.mtx.gz"), matrix);
    }

    #[test]
    fn test_read_back() {
        let dir = TempDir::new().unwrap();
        write_dir(
            dir.path(),
            "%%MatrixMarket matrix coordinate integer general\n%\n1 2 2\n1 1 3\n1 2 4\n",
        );
        let contents = read_mtx_dir(dir.path()).unwrap();
        assert_eq!(contents.barcodes, vec!["AAAA", "CCCC"]);
        assert_eq!(contents.features.names, vec!["Gene1"]);
        assert_eq!((contents.rows, contents.cols), (1, 2));
        assert_eq!(
            contents.entries,
            vec![
                Entry {
                    row: 0,
                    col: 0,
                    value: 3
                },
                Entry {
                    row: 0,
                    col: 1,
                    value: 4
                }
            ]
        );
    }

    #[test]
    fn test_incomplete_directory() {
        let dir = TempDir::new().unwrap();
        write_gz(&dir.path().join("barcodes.tsv.gz"), "AAAA\n");
        let err = check_outputs(dir.path()).unwrap_err();
        assert!(
            matches!(err, ExportError::IncompleteOutput { ref path, .. } if path.ends_with("features.tsv.gz"))
        );

        write_dir(
            dir.path(),
            "%%MatrixMarket matrix coordinate integer general\n%\n1 2 0\n",
        );
        std::fs::write(dir.path().join("matrix.mtx"), "").unwrap();
        assert_eq!(
            leftover_intermediate(dir.path()),
            Some(dir.path().join("matrix.mtx"))
        );
        let err = check_outputs(dir.path()).unwrap_err();
        assert!(matches!(
            err,
            ExportError::IncompleteOutput {
                reason: "uncompressed matrix left behind",
                ..
            }
        ));
    }

    #[test]
    fn test_malformed_matrix() {
        let dir = TempDir::new().unwrap();
        write_dir(
            dir.path(),
            "%%MatrixMarket matrix coordinate integer general\n%\n1 2 2\n1 3 1\n",
        );
        match read_mtx_dir(dir.path()).unwrap_err() {
            ExportError::MalformedOutput { line, reason, .. } => {
                assert_eq!(line, 4);
                assert!(reason.contains("outside"));
            }
            err => panic!("unexpected error {err}"),
        }

        write_dir(
            dir.path(),
            "%%MatrixMarket matrix coordinate integer general\n%\n1 2 2\n1 1 1\n",
        );
        let err = read_mtx_dir(dir.path()).unwrap_err();
        assert!(err.to_string().contains("expected 2 entries, found 1"));
    }
}
