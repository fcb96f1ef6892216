//! Per-cell overlap counting for single-nucleus ATAC-seq.
//!
//! In a single nucleus every genomic position is present at most twice, so a
//! cell with more than `expected_overlap` read pairs piled onto the same bases
//! is a hint that the "cell" holds more than one nucleus. This crate streams a
//! coordinate sorted BAM or fragment file once, filters the reads, and writes:
//!
//! - `Overlaps.txt`: every region where a cell exceeds the expected overlap,
//!   with the reads that make it up
//! - `OverlapSummary.txt`: read and overlap counts per cell
//! - `StatSummary.txt`: how many reads were kept and why the rest were not
//! - `RunTime.txt`
//!
//! The [`multiplets`] module then reads `Overlaps.txt` and
//! `OverlapSummary.txt` back and calls the cells that overlap unusually many
//! regions as multiplets.
//!
//! ```no_run
//! use std::path::{Path, PathBuf};
//! use amulet_counter::{CounterInputs, OverlapConfig, count_fragment_overlaps};
//!
//! let inputs = CounterInputs {
//!     barcodes: PathBuf::from("singlecell.csv"),
//!     chromosomes: PathBuf::from("human_autosomes.txt"),
//!     outdir: PathBuf::from("out"),
//! };
//! let summary = count_fragment_overlaps(
//!     Path::new("fragments.tsv.gz"),
//!     &inputs,
//!     &OverlapConfig::default(),
//! )
//! .unwrap();
//! println!("{} overlaps", summary.overlaps);
//! ```

pub mod bam;
pub mod barcodes;
pub mod chromosomes;
pub mod config;
pub mod consts;
pub mod counter;
pub mod driver;
pub mod errors;
pub mod fragments;
pub mod guard;
pub mod multiplets;
pub mod record;
pub mod report;
pub mod statistics;

// re-exports
pub use self::barcodes::BarcodeRegistry;
pub use self::chromosomes::ChromosomeAllowlist;
pub use self::config::{ConfigError, MultipletConfig, OverlapConfig, parse_numeric_option};
pub use self::counter::{
    CounterInputs, RunSummary, count_bam_overlaps, count_fragment_overlaps, count_overlaps,
};
pub use self::driver::OverlapDriver;
pub use self::errors::{CounterError, Result};
pub use self::multiplets::{MultipletInputs, MultipletSummary, detect_multiplets};
pub use self::record::{AlignmentRecord, AlignmentSource, SpanLength};
pub use self::statistics::{Rejection, RunStatistics};
