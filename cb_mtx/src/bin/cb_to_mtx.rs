//! cb_to_mtx
//!
//! Convert a CellBender output HDF5 file into a 10x feature-barcode matrix
//! directory containing barcodes.tsv.gz, features.tsv.gz and matrix.mtx.gz.
#![deny(missing_docs)]

use anyhow::{Context, Result};
use cb_mtx::verify::{check_outputs, leftover_intermediate};
use clap::Parser;
use env_logger::Env;
use log::{error, info, warn};
use std::path::PathBuf;

/// Convert a CellBender count matrix HDF5 file into a Matrix Market directory.
#[derive(Debug, Parser)]
struct Args {
    /// CellBender count matrix, e.g. output_file_filtered.h5
    input: PathBuf,
    /// Directory to write the matrix files to; created if absent
    output_dir: PathBuf,
}

fn run(args: &Args) -> Result<()> {
    let summary = cb_mtx::convert(&args.input, &args.output_dir).with_context(|| {
        format!(
            "While converting {} into {}",
            args.input.display(),
            args.output_dir.display()
        )
    })?;
    check_outputs(&args.output_dir)?;
    info!(
        "Wrote {} barcodes, {} features and {} of {} stored entries to {}",
        summary.num_barcodes,
        summary.num_features,
        summary.written_entries,
        summary.stored_entries,
        args.output_dir.display()
    );
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    if let Err(err) = run(&args) {
        if let Some(path) = leftover_intermediate(&args.output_dir) {
            warn!("Kept uncompressed {}", path.display());
        }
        error!("{err:#}");
        std::process::exit(1);
    }
}
