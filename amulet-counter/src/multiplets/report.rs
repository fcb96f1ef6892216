use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::sync::Arc;

use amulet_core::utils::format_float;

use crate::consts::*;

pub const MULTIPLET_PROBABILITIES_HEADER: &str = "cell_id\tbarcode\tp-value\tq-value";

/// The verdict on one cell.
#[derive(Debug, Clone, PartialEq)]
pub struct CellCall {
    pub cell_id: Arc<str>,
    pub barcode: String,
    pub p_value: f64,
    pub q_value: f64,
    pub multiplet: bool,
}

///
/// Totals of a multiplet detection run, written to `MultipletSummary.txt`.
///
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MultipletSummary {
    pub cells: usize,
    /// Merged regions before repeat inference.
    pub merged_regions: usize,
    pub repetitive_regions: usize,
    pub multiplets: usize,
}

impl MultipletSummary {
    pub fn multiplet_percent(&self) -> f64 {
        if self.cells == 0 {
            return 0.0;
        }
        self.multiplets as f64 * 100.0 / self.cells as f64
    }
}

///
/// Write `MultipletCellIds_<suffix>.txt` and `MultipletBarcodes_<suffix>.txt`,
/// one called multiplet per line and no header.
///
pub fn write_multiplet_calls(outdir: &Path, suffix: &str, calls: &[CellCall]) -> io::Result<()> {
    let mut ids = BufWriter::new(File::create(
        outdir.join(format!("{MULTIPLET_CELL_IDS_PREFIX}_{suffix}.txt")),
    )?);
    let mut barcodes = BufWriter::new(File::create(
        outdir.join(format!("{MULTIPLET_BARCODES_PREFIX}_{suffix}.txt")),
    )?);

    for call in calls.iter().filter(|call| call.multiplet) {
        writeln!(ids, "{}", call.cell_id)?;
        writeln!(barcodes, "{}", call.barcode)?;
    }

    ids.flush()?;
    barcodes.flush()
}

pub fn write_multiplet_probabilities(path: &Path, calls: &[CellCall]) -> io::Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    writeln!(out, "{MULTIPLET_PROBABILITIES_HEADER}")?;
    for call in calls {
        writeln!(
            out,
            "{}\t{}\t{}\t{}",
            call.cell_id,
            call.barcode,
            format_float(call.p_value),
            format_float(call.q_value)
        )?;
    }
    out.flush()
}

pub fn write_multiplet_summary(path: &Path, summary: &MultipletSummary) -> io::Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    writeln!(out, "Number of Cells\t{}", summary.cells)?;
    writeln!(out, "Number of Merged Regions\t{}", summary.merged_regions)?;
    writeln!(out, "Number of Multiplets\t{}", summary.multiplets)?;
    writeln!(
        out,
        "Multiplet Percent\t{}",
        format_float(summary.multiplet_percent())
    )?;
    out.flush()
}
