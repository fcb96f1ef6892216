use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use indicatif::{ProgressBar, ProgressStyle};
use log::info;

use crate::bam::BamRecordSource;
use crate::barcodes::BarcodeRegistry;
use crate::chromosomes::ChromosomeAllowlist;
use crate::config::OverlapConfig;
use crate::consts::*;
use crate::driver::OverlapDriver;
use crate::errors::Result;
use crate::fragments::FragmentRecordSource;
use crate::record::AlignmentSource;
use crate::report::{
    OverlapReportWriter, write_overlap_summary, write_run_time, write_stat_summary,
};

/// The inputs of one run, besides the alignments themselves.
#[derive(Debug, Clone)]
pub struct CounterInputs {
    pub barcodes: PathBuf,
    pub chromosomes: PathBuf,
    pub outdir: PathBuf,
}

///
/// Totals of a finished run, mirrored in the log.
///
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    pub records: u64,
    pub valid: u64,
    pub cells: usize,
    pub flushes: u64,
    pub peak_pending: usize,
    pub overlaps: u64,
}

///
/// Count overlaps in a coordinate sorted BAM file and write the reports to
/// `inputs.outdir`.
///
pub fn count_bam_overlaps(
    bam: &Path,
    inputs: &CounterInputs,
    config: &OverlapConfig,
) -> Result<RunSummary> {
    config.validate()?;
    let tag = config.barcode_tag_bytes()?;
    let source = BamRecordSource::open(bam, tag, config.force_sorted)?;
    count_overlaps(source, inputs, config)
}

///
/// Count overlaps in a fragment file and write the reports to `inputs.outdir`.
///
pub fn count_fragment_overlaps(
    fragments: &Path,
    inputs: &CounterInputs,
    config: &OverlapConfig,
) -> Result<RunSummary> {
    config.validate()?;
    let source = FragmentRecordSource::open(fragments)?;
    count_overlaps(source, inputs, config)
}

///
/// Drive a record source through the overlap counter.
///
/// Loads the barcode table and chromosome list, streams every record once,
/// and writes `Overlaps.txt`, `OverlapSummary.txt`, `StatSummary.txt` and
/// `RunTime.txt`.
///
pub fn count_overlaps<A: AlignmentSource>(
    source: A,
    inputs: &CounterInputs,
    config: &OverlapConfig,
) -> Result<RunSummary> {
    let start_time = Instant::now();
    config.validate()?;

    fs::create_dir_all(&inputs.outdir)?;

    let (barcode_col, cellid_col, iscell_col) = config.columns();
    let registry =
        BarcodeRegistry::from_file(&inputs.barcodes, barcode_col, cellid_col, iscell_col)?;
    let allowlist = ChromosomeAllowlist::from_file(&inputs.chromosomes)?;
    info!(
        "Loaded {} cells ({} barcodes) and {} chromosomes",
        registry.n_cells(),
        registry.n_barcodes(),
        allowlist.len()
    );

    let mut report = OverlapReportWriter::create(&inputs.outdir.join(OVERLAPS_FILE))?;
    let mut driver = OverlapDriver::new(config, &registry, &allowlist);

    info!(
        "Reading {}, reporting positions covered by at least {} reads of one cell",
        source.describe(),
        driver.tracker().threshold()
    );

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed}] {msg} ({per_sec})")?
            .tick_strings(&["-", "\\", "|", "/"]),
    );
    spinner.set_message("Counting overlaps...");

    let mut processed: u64 = 0;
    for record in source {
        let record = record?;
        driver.process(&record, &mut report)?;

        processed += 1;
        if processed % PROGRESS_INTERVAL == 0 {
            spinner.set_message(format!("Processed {} records", processed));
            spinner.set_position(processed);
        }
    }

    driver.finish(&mut report)?;
    spinner.finish_with_message(format!("Done! {} records", processed));

    report.finish()?;

    let summary_file = fs::File::create(inputs.outdir.join(OVERLAP_SUMMARY_FILE))?;
    write_overlap_summary(
        std::io::BufWriter::new(summary_file),
        &registry,
        driver.tracker(),
        driver.stats(),
    )?;
    write_stat_summary(
        &inputs.outdir.join(STAT_SUMMARY_FILE),
        driver.stats(),
        config.min_mapq,
    )?;

    let summary = RunSummary {
        records: driver.stats().total,
        valid: driver.stats().valid,
        cells: registry.n_cells(),
        flushes: driver.tracker().flushes(),
        peak_pending: driver.tracker().peak_pending(),
        overlaps: driver.tracker().total_overlaps(),
    };

    info!(
        "Processed {} records: {} valid intervals across {} cells",
        summary.records, summary.valid, summary.cells
    );
    info!(
        "Flushed {} batches (largest pending batch: {} intervals), found {} overlaps",
        summary.flushes, summary.peak_pending, summary.overlaps
    );

    write_run_time(&inputs.outdir, start_time.elapsed())?;

    Ok(summary)
}
