use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::Local;

use amulet_core::OverlapRegion;
use amulet_core::utils::format_float;
use amulet_overlaps::{CellIntervalTracker, OverlapSink};

use crate::barcodes::BarcodeRegistry;
use crate::consts::*;
use crate::statistics::RunStatistics;

pub const OVERLAPS_HEADER: &str = "chr\tstart\tend\tcell id\tMin Overlap Count\tMax Overlap Count\tMean Mapping Quality\tMin Mapping Quality\tMax Mapping Quality\tStarts\tEnds";
pub const OVERLAP_SUMMARY_HEADER: &str =
    "Cell Id\tNumber of Valid Read Pairs\tNumber of Overlaps\tBarcode\tTotal Number of Reads";

///
/// Writes one tab separated row per overlap region, the `Overlaps.txt` report.
///
pub struct OverlapReportWriter<W: Write> {
    out: W,
    rows: u64,
}

impl OverlapReportWriter<BufWriter<File>> {
    pub fn create(path: &Path) -> io::Result<Self> {
        let file = File::create(path)?;
        Self::new(BufWriter::new(file))
    }
}

impl<W: Write> OverlapReportWriter<W> {
    /// Wrap a writer and emit the header line.
    pub fn new(mut out: W) -> io::Result<Self> {
        writeln!(out, "{OVERLAPS_HEADER}")?;
        Ok(OverlapReportWriter { out, rows: 0 })
    }

    pub fn rows(&self) -> u64 {
        self.rows
    }

    pub fn finish(mut self) -> io::Result<W> {
        self.out.flush()?;
        Ok(self.out)
    }

    fn write_region(&mut self, cell_id: &str, region: &OverlapRegion) -> io::Result<()> {
        let (mean, min, max) = match region.mapq() {
            Some(stats) => (
                format_float(stats.mean),
                stats.min.to_string(),
                stats.max.to_string(),
            ),
            None => (".".to_string(), ".".to_string(), ".".to_string()),
        };

        writeln!(
            self.out,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
            region.chr,
            region.start,
            region.end,
            cell_id,
            region.min_coverage,
            region.max_coverage,
            mean,
            min,
            max,
            region.starts_field(),
            region.ends_field(),
        )?;
        self.rows += 1;
        Ok(())
    }
}

impl<W: Write> OverlapSink for OverlapReportWriter<W> {
    fn emit(&mut self, cell_id: &str, regions: &[OverlapRegion]) -> io::Result<()> {
        for region in regions {
            self.write_region(cell_id, region)?;
        }
        Ok(())
    }
}

///
/// Write the per-cell summary, one row per selected cell in cell id order.
///
pub fn write_overlap_summary<W: Write>(
    mut out: W,
    registry: &BarcodeRegistry,
    tracker: &CellIntervalTracker,
    stats: &RunStatistics,
) -> io::Result<()> {
    writeln!(out, "{OVERLAP_SUMMARY_HEADER}")?;
    for cell_id in registry.cell_ids() {
        let counts = stats.cell(cell_id);
        writeln!(
            out,
            "{}\t{}\t{}\t{}\t{}",
            cell_id,
            counts.valid,
            tracker.overlap_count(cell_id),
            registry.barcode(cell_id).unwrap_or("."),
            counts.total,
        )?;
    }
    out.flush()
}

pub fn write_stat_summary(path: &Path, stats: &RunStatistics, min_mapq: i64) -> io::Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    stats.write_summary(&mut out, min_mapq)?;
    out.flush()
}

pub fn write_run_time(outdir: &Path, elapsed: Duration) -> io::Result<()> {
    let mut out = File::create(outdir.join(RUN_TIME_FILE))?;
    write!(
        out,
        "Overlap counter finished in: {} seconds.",
        elapsed.as_secs_f64()
    )
}

///
/// Persist a failed run's error chain as `Error_<date>T<time>.txt` in `outdir`.
///
/// Returns the path written.
///
pub fn write_error_file(outdir: &Path, message: &str) -> io::Result<PathBuf> {
    let stamp = Local::now().format("%Y-%m-%dT%H%M%S");
    let path = outdir.join(format!("{ERROR_FILE_PREFIX}_{stamp}.txt"));
    std::fs::write(&path, message)?;
    Ok(path)
}
