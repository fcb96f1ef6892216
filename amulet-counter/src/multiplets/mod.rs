//! Multiplet detection over the reports of a finished counting run.
//!
//! Every cell's overlap regions are pooled and merged across cells. Merged
//! regions touched by far more cells than the average are taken to be repeats
//! and dropped; a cell is then called a multiplet when it overlaps far more
//! of the remaining merged regions than the average cell. "Far more" is a
//! Poisson upper tail test, corrected for the number of tests with
//! Benjamini-Hochberg.

pub mod filter;
pub mod inputs;
pub mod matrix;
pub mod regions;
pub mod report;
pub mod stats;

use std::fs;
use std::path::PathBuf;

use fxhash::FxHashSet;
use log::{debug, info, warn};

use amulet_core::utils::format_float;

use crate::config::MultipletConfig;
use crate::consts::*;
use crate::errors::Result;

use self::filter::filter_repeat_reads;
use self::inputs::{CellOverlap, read_cells, read_overlaps};
use self::matrix::{CellColumns, Incidence};
use self::regions::RegionSet;
use self::report::{
    write_multiplet_calls, write_multiplet_probabilities, write_multiplet_summary,
};
use self::stats::{benjamini_hochberg, poisson_upper_tail};

pub use self::report::{CellCall, MultipletSummary};

/// The reports of a counting run, and where the multiplet reports go.
#[derive(Debug, Clone)]
pub struct MultipletInputs {
    pub overlaps: PathBuf,
    pub overlap_summary: PathBuf,
    pub outdir: PathBuf,
}

///
/// Call multiplets from `Overlaps.txt` and `OverlapSummary.txt`, writing the
/// cell ids, barcodes, per-cell probabilities and a summary to
/// `inputs.outdir`.
///
pub fn detect_multiplets(
    inputs: &MultipletInputs,
    config: &MultipletConfig,
) -> Result<MultipletSummary> {
    config.validate()?;
    fs::create_dir_all(&inputs.outdir)?;

    let cells = read_cells(&inputs.overlap_summary)?;
    let rows = read_overlaps(&inputs.overlaps)?;
    info!("Loaded {} overlap regions of {} cells", rows.len(), cells.len());

    let repeats = match &config.repeat_filter {
        Some(path) => {
            info!("Filtering reads in the regions of {}", path.display());
            let repeats = RegionSet::from_bed_file(path)?;
            if repeats.is_empty() {
                warn!("{} holds no regions, no reads are filtered", path.display());
            }
            repeats
        }
        None => RegionSet::default(),
    };

    let total_rows = rows.len();
    let mut filtered = filter_repeat_reads(rows, &repeats, config.threshold());
    filtered.retain(|row| row.region.width() >= config.min_overlap);
    let removed = total_rows as i64 - filtered.len() as i64;
    let removed_percent = match total_rows {
        0 => 0.0,
        n => removed as f64 * 100.0 / n as f64,
    };
    info!(
        "Number of regions filtered: {removed} ({}%)",
        format_float(removed_percent)
    );

    let columns = CellColumns::new(&cells);
    if columns.is_empty() {
        warn!("{} lists no cells", inputs.overlap_summary.display());
    }

    // repeat inference over the regions of all cells
    let merged = RegionSet::union(filtered.iter().map(CellOverlap::span));
    let incidence = Incidence::build(&filtered, &merged, &columns);
    let region_q = benjamini_hochberg(&poisson_upper_tail(&incidence.region_counts));
    let repetitive: FxHashSet<usize> = region_q
        .iter()
        .enumerate()
        .filter(|(_, q)| **q < config.q_repeat)
        .map(|(idx, _)| idx)
        .collect();
    info!(
        "{} of {} merged regions are covered by unusually many cells and look repetitive",
        repetitive.len(),
        merged.len()
    );
    for region in repetitive.iter().filter_map(|&idx| merged.get(idx)) {
        debug!("Repetitive region {region}");
    }

    let kept: Vec<CellOverlap> = filtered
        .into_iter()
        .filter(|row| {
            merged
                .find(&row.region.chr, row.region.start, row.region.end)
                .is_none_or(|idx| !repetitive.contains(&idx))
        })
        .collect();

    // multiplet calls over what is left
    let kept_regions = RegionSet::union(kept.iter().map(CellOverlap::span));
    let incidence = Incidence::build(&kept, &kept_regions, &columns);
    let cell_p = poisson_upper_tail(&incidence.cell_counts);
    let cell_q = benjamini_hochberg(&cell_p);

    let calls: Vec<CellCall> = cells
        .into_iter()
        .zip(cell_p.into_iter().zip(cell_q))
        .map(|(cell, (p_value, q_value))| CellCall {
            cell_id: cell.cell_id,
            barcode: cell.barcode,
            p_value,
            q_value,
            multiplet: q_value < config.q,
        })
        .collect();

    let summary = MultipletSummary {
        cells: calls.len(),
        merged_regions: merged.len(),
        repetitive_regions: repetitive.len(),
        multiplets: calls.iter().filter(|call| call.multiplet).count(),
    };

    write_multiplet_calls(&inputs.outdir, &config.file_suffix(), &calls)?;
    write_multiplet_probabilities(&inputs.outdir.join(MULTIPLET_PROBABILITIES_FILE), &calls)?;
    write_multiplet_summary(&inputs.outdir.join(MULTIPLET_SUMMARY_FILE), &summary)?;

    info!(
        "Called {} multiplets among {} cells ({}%)",
        summary.multiplets,
        summary.cells,
        format_float(summary.multiplet_percent())
    );

    Ok(summary)
}
