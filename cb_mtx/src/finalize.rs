//! Compress encoded artifacts into the output directory.
//!
//! The two lists are gzipped straight from memory. The matrix goes through
//! `matrix.mtx`, which is removed only once `matrix.mtx.gz` has been
//! completely written and synced; if anything fails before that, the
//! uncompressed file stays on disk. A `.gz` that fails part way is removed.

use crate::encode::{EncodedArtifact, MatrixMarketEncoder};
use crate::errors::ExportError;
use crate::{MATRIX_MTX, OUTPUT_FILES};
use flate2::write::GzEncoder;
use flate2::Compression;
use log::{debug, info, warn};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

/// `name` with `.gz` appended.
pub fn gz_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".gz");
    PathBuf::from(name)
}

/// Create a gzip stream into a new file. Headers carry neither a timestamp
/// nor a file name, so identical input gives identical bytes.
fn gzip_file(path: &Path) -> io::Result<GzEncoder<File>> {
    Ok(GzEncoder::new(File::create(path)?, Compression::fast()))
}

/// Finish the gzip stream and sync the file to disk.
fn finish_gzip(encoder: GzEncoder<File>) -> io::Result<()> {
    encoder.finish()?.sync_all()
}

/// Create `path` and fill it through a gzip stream. If `fill` or finishing
/// the stream fails, the partial file is removed.
fn write_gzip_with(
    path: &Path,
    fill: impl FnOnce(&mut GzEncoder<File>) -> io::Result<()>,
) -> io::Result<()> {
    let mut encoder = gzip_file(path)?;
    if let Err(err) = fill(&mut encoder).and_then(|()| finish_gzip(encoder)) {
        if let Err(rm) = std::fs::remove_file(path) {
            warn!("Could not remove partial {}: {rm}", path.display());
        }
        return Err(err);
    }
    Ok(())
}

/// Write `<dir>/<file_name>.gz` from an in-memory artifact, consuming it.
pub fn write_gzip_artifact(dir: &Path, artifact: EncodedArtifact) -> Result<PathBuf, ExportError> {
    let path = gz_path(&dir.join(artifact.file_name));
    write_gzip_with(&path, |encoder| encoder.write_all(&artifact.bytes)).map_err(|source| {
        ExportError::CompressionFailed {
            path: path.clone(),
            source,
        }
    })?;
    info!("Saved {}", path.display());
    Ok(path)
}

/// Write the uncompressed `<dir>/matrix.mtx`. Returns its path and the
/// number of entry lines written.
pub fn write_matrix_mtx(
    dir: &Path,
    encoder: &MatrixMarketEncoder<'_>,
) -> Result<(PathBuf, u64), ExportError> {
    let path = dir.join(MATRIX_MTX);
    let write = || -> io::Result<u64> {
        let mut writer = BufWriter::new(File::create(&path)?);
        let written = encoder.write_to(&mut writer)?;
        writer.into_inner().map_err(|e| e.into_error())?.sync_all()?;
        Ok(written)
    };
    let written = write().map_err(|source| ExportError::WriteFailed {
        path: path.clone(),
        source,
    })?;
    info!("Saved {}", path.display());
    Ok((path, written))
}

/// Read `src` back and write a gzipped copy next to it as `<src>.gz`.
/// `src` is never touched.
pub fn compress_file(src: &Path) -> Result<PathBuf, ExportError> {
    let dest = gz_path(src);
    let failed = |source| ExportError::CompressionFailed {
        path: dest.clone(),
        source,
    };

    let mut reader = File::open(src).map_err(failed)?;
    write_gzip_with(&dest, |encoder| io::copy(&mut reader, encoder).map(drop)).map_err(failed)?;
    info!("Compressed {}", dest.display());
    Ok(dest)
}

/// Remove the compressed files of an earlier run, the matrix first. Missing
/// files are skipped.
pub fn clear_outputs(dir: &Path) -> Result<(), ExportError> {
    for name in OUTPUT_FILES.iter().rev() {
        let path = dir.join(name);
        match std::fs::remove_file(&path) {
            Ok(()) => debug!("Removed previous {}", path.display()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(source) => return Err(ExportError::CleanupFailed { path, source }),
        }
    }
    Ok(())
}

/// Delete the uncompressed intermediate.
pub fn remove_intermediate(path: &Path) -> Result<(), ExportError> {
    std::fs::remove_file(path).map_err(|source| ExportError::CleanupFailed {
        path: path.to_path_buf(),
        source,
    })?;
    info!("Deleted uncompressed {}", path.display());
    Ok(())
}

/// Write `<dir>/matrix.mtx.gz` through the uncompressed intermediate.
/// Returns the compressed path and the number of entry lines written.
pub fn write_matrix_mtx_gz(
    dir: &Path,
    encoder: &MatrixMarketEncoder<'_>,
) -> Result<(PathBuf, u64), ExportError> {
    let (mtx_path, written) = write_matrix_mtx(dir, encoder)?;
    let gz = compress_file(&mtx_path)?;
    remove_intermediate(&mtx_path)?;
    Ok((gz, written))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::encode::encode_barcodes;
    use cb_h5::{CscMatrix, MatrixShape};
    use flate2::read::GzDecoder;
    use pretty_assertions::assert_eq;
    use std::io::Read;
    use tempfile::TempDir;

    fn gunzip(path: &Path) -> String {
        let mut text = String::new();
        GzDecoder::new(File::open(path).unwrap())
            .read_to_string(&mut text)
            .unwrap();
        text
    }

    #[test]
    fn test_gz_path() {
        assert_eq!(
            gz_path(Path::new("out/matrix.mtx")),
            PathBuf::from("out/matrix.mtx.gz")
        );
    }

    #[test]
    fn test_artifact_is_gzipped_directly() {
        let dir = TempDir::new().unwrap();
        let barcodes = vec!["AAAA".to_string(), "CCCC".to_string()];
        let path = write_gzip_artifact(dir.path(), encode_barcodes(&barcodes)).unwrap();
        assert_eq!(path, dir.path().join("barcodes.tsv.gz"));
        assert_eq!(gunzip(&path), "AAAA\nCCCC\n");
        assert!(!dir.path().join("barcodes.tsv").exists());
    }

    #[test]
    fn test_matrix_intermediate_is_removed() {
        let dir = TempDir::new().unwrap();
        let matrix =
            CscMatrix::new(MatrixShape { rows: 2, cols: 1 }, vec![5], vec![1], vec![0, 1])
                .unwrap();
        let encoder = MatrixMarketEncoder::new(&matrix).unwrap();
        let (path, written) = write_matrix_mtx_gz(dir.path(), &encoder).unwrap();
        assert_eq!(written, 1);
        assert_eq!(path, dir.path().join("matrix.mtx.gz"));
        assert!(!dir.path().join("matrix.mtx").exists());
        assert_eq!(
            gunzip(&path),
            "%%MatrixMarket matrix coordinate integer general\n%\n2 1 1\n2 1 5\n"
        );
    }

    #[test]
    fn test_failed_compression_keeps_uncompressed() {
        let dir = TempDir::new().unwrap();
        let mtx = dir.path().join("matrix.mtx");
        std::fs::write(&mtx, "%%MatrixMarket matrix coordinate integer general\n").unwrap();
        // A directory in the way of the compressed file.
        std::fs::create_dir(dir.path().join("matrix.mtx.gz")).unwrap();

        let err = compress_file(&mtx).unwrap_err();
        assert!(matches!(err, ExportError::CompressionFailed { .. }));
        assert!(mtx.exists());
    }

    #[test]
    fn test_failed_gzip_write_removes_partial() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("features.tsv.gz");
        let err = write_gzip_with(&path, |encoder| {
            encoder.write_all(b"G1\tGene1\tGene Expression\n")?;
            Err(io::Error::new(io::ErrorKind::Other, "disk full"))
        })
        .unwrap_err();
        assert_eq!(err.to_string(), "disk full");
        assert!(!path.exists());
    }

    #[test]
    fn test_clear_outputs() {
        let dir = TempDir::new().unwrap();
        for name in OUTPUT_FILES {
            std::fs::write(dir.path().join(name), "stale").unwrap();
        }
        std::fs::write(dir.path().join("summary.csv"), "kept").unwrap();
        clear_outputs(dir.path()).unwrap();
        for name in OUTPUT_FILES {
            assert!(!dir.path().join(name).exists());
        }
        assert!(dir.path().join("summary.csv").exists());
        // Nothing left to remove.
        clear_outputs(dir.path()).unwrap();
    }

    #[test]
    fn test_missing_intermediate_is_cleanup_failure() {
        let dir = TempDir::new().unwrap();
        let err = remove_intermediate(&dir.path().join("matrix.mtx")).unwrap_err();
        assert!(matches!(err, ExportError::CleanupFailed { .. }));
    }

    #[test]
    fn test_gzip_output_is_deterministic() {
        let dir = TempDir::new().unwrap();
        let barcodes = vec!["AAAC-1".to_string()];
        let a = dir.path().join("a");
        let b = dir.path().join("b");
        std::fs::create_dir(&a).unwrap();
        std::fs::create_dir(&b).unwrap();
        let pa = write_gzip_artifact(&a, encode_barcodes(&barcodes)).unwrap();
        let pb = write_gzip_artifact(&b, encode_barcodes(&barcodes)).unwrap();
        assert_eq!(std::fs::read(pa).unwrap(), std::fs::read(pb).unwrap());
    }
}
