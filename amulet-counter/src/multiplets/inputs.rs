use std::io::BufRead;
use std::path::Path;
use std::sync::Arc;

use amulet_core::utils::get_dynamic_reader;
use amulet_core::{Interval, OverlapRegion, Position};

use crate::errors::{CounterError, Result};

/// Columns of an `Overlaps.txt` row.
const OVERLAP_COLUMNS: usize = 11;
/// Columns of an `OverlapSummary.txt` row.
const SUMMARY_COLUMNS: usize = 5;

///
/// One row of `Overlaps.txt`: an overlap region of one cell, with the read
/// spans that make it up.
///
#[derive(Debug, Clone, PartialEq)]
pub struct CellOverlap {
    pub cell_id: Arc<str>,
    pub region: OverlapRegion,
}

impl CellOverlap {
    /// The region's own span.
    pub fn span(&self) -> Interval {
        Interval::new(
            Arc::clone(&self.region.chr),
            self.region.start,
            self.region.end,
            None,
        )
    }
}

/// One row of `OverlapSummary.txt`.
#[derive(Debug, Clone, PartialEq)]
pub struct CellRecord {
    pub cell_id: Arc<str>,
    pub barcode: String,
}

fn open(path: &Path) -> Result<impl BufRead> {
    get_dynamic_reader(path).map_err(|e| CounterError::FileReadError(format!("{e:#}")))
}

fn malformed(label: &str, line: usize, reason: impl Into<String>) -> CounterError {
    CounterError::MalformedReportRow {
        file: label.to_string(),
        line,
        reason: reason.into(),
    }
}

/// Rows after the header, with their 1-based line numbers; blank lines skipped.
fn data_rows<R: BufRead>(reader: R) -> impl Iterator<Item = (usize, std::io::Result<String>)> {
    reader
        .lines()
        .enumerate()
        .skip(1)
        .map(|(index, line)| (index + 1, line))
        .filter(|(_, line)| line.as_ref().map_or(true, |l| !l.trim().is_empty()))
}

pub fn read_overlaps(path: &Path) -> Result<Vec<CellOverlap>> {
    read_overlaps_from(open(path)?, &path.display().to_string())
}

///
/// Parse an overlap report as written by the counter. The first line is the
/// header. Contributing reads come from the comma terminated `Starts` and
/// `Ends` columns; they carry no mapping quality.
///
pub fn read_overlaps_from<R: BufRead>(reader: R, label: &str) -> Result<Vec<CellOverlap>> {
    let mut rows = Vec::new();
    let mut last_chr: Option<Arc<str>> = None;

    for (line_number, line) in data_rows(reader) {
        let line = line?;
        let fields: Vec<&str> = line.trim_end_matches(['\n', '\r']).split('\t').collect();
        if fields.len() < OVERLAP_COLUMNS {
            return Err(malformed(
                label,
                line_number,
                format!("expected {OVERLAP_COLUMNS} columns, found {}", fields.len()),
            ));
        }

        let (Ok(start), Ok(end)) = (fields[1].parse::<Position>(), fields[2].parse::<Position>())
        else {
            return Err(malformed(label, line_number, "start and end must be integers"));
        };
        let (Ok(min_coverage), Ok(max_coverage)) = (fields[4].parse::<u32>(), fields[5].parse::<u32>())
        else {
            return Err(malformed(label, line_number, "overlap counts must be integers"));
        };
        let (Some(starts), Some(ends)) = (
            parse_positions(fields[fields.len() - 2]),
            parse_positions(fields[fields.len() - 1]),
        ) else {
            return Err(malformed(label, line_number, "read starts and ends must be integers"));
        };
        if starts.len() != ends.len() {
            return Err(malformed(
                label,
                line_number,
                format!("{} read starts but {} read ends", starts.len(), ends.len()),
            ));
        }

        let chr = match &last_chr {
            Some(last) if last.as_ref() == fields[0] => Arc::clone(last),
            _ => {
                let chr: Arc<str> = Arc::from(fields[0]);
                last_chr = Some(Arc::clone(&chr));
                chr
            }
        };
        let contributing = starts
            .into_iter()
            .zip(ends)
            .map(|(s, e)| Interval::new(Arc::clone(&chr), s, e, None))
            .collect();

        rows.push(CellOverlap {
            cell_id: Arc::from(fields[3]),
            region: OverlapRegion::new(chr, start, end, min_coverage, max_coverage, contributing),
        });
    }

    Ok(rows)
}

/// `10,15,18,` into `[10, 15, 18]`.
fn parse_positions(field: &str) -> Option<Vec<Position>> {
    field
        .split(',')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(|v| v.parse::<Position>().ok())
        .collect()
}

pub fn read_cells(path: &Path) -> Result<Vec<CellRecord>> {
    read_cells_from(open(path)?, &path.display().to_string())
}

///
/// Parse an overlap summary; the cells come back in file order, which is
/// the order the multiplet reports list them in.
///
pub fn read_cells_from<R: BufRead>(reader: R, label: &str) -> Result<Vec<CellRecord>> {
    let mut cells = Vec::new();

    for (line_number, line) in data_rows(reader) {
        let line = line?;
        let fields: Vec<&str> = line.trim_end_matches(['\n', '\r']).split('\t').collect();
        if fields.len() < SUMMARY_COLUMNS {
            return Err(malformed(
                label,
                line_number,
                format!("expected {SUMMARY_COLUMNS} columns, found {}", fields.len()),
            ));
        }

        cells.push(CellRecord {
            cell_id: Arc::from(fields[0]),
            barcode: fields[3].to_string(),
        });
    }

    Ok(cells)
}
