use std::fmt::{self, Display};
use std::io::{self, Write};

use fxhash::FxHashMap;

use amulet_core::Position;
use amulet_core::utils::format_float;

///
/// Why a record did not become an interval. Checks run in this order and
/// the first one that fails is the one counted.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Rejection {
    Unpaired,
    Unmapped,
    MateUnmapped,
    SecondaryOrSupplementary,
    Duplicate,
    MateOnOtherReference,
    ReverseStrand,
    NonPositiveInsertSize,
    LowMappingQuality,
    ChromosomeNotAllowed,
    MissingBarcode,
    UnknownBarcode,
    InsertSizeTooLarge,
}

impl Rejection {
    pub const ALL: [Rejection; 13] = [
        Rejection::Unpaired,
        Rejection::Unmapped,
        Rejection::MateUnmapped,
        Rejection::SecondaryOrSupplementary,
        Rejection::Duplicate,
        Rejection::MateOnOtherReference,
        Rejection::ReverseStrand,
        Rejection::NonPositiveInsertSize,
        Rejection::LowMappingQuality,
        Rejection::ChromosomeNotAllowed,
        Rejection::MissingBarcode,
        Rejection::UnknownBarcode,
        Rejection::InsertSizeTooLarge,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Rejection::Unpaired => "Unpaired Reads",
            Rejection::Unmapped => "Unmapped Reads",
            Rejection::MateUnmapped => "Mate Unmapped Reads",
            Rejection::SecondaryOrSupplementary => "Secondary or Supplementary Reads",
            Rejection::Duplicate => "Duplicate Reads",
            Rejection::MateOnOtherReference => "Mate on Different Chromosome Reads",
            Rejection::ReverseStrand => "Skipped Negative Strand Reads",
            Rejection::NonPositiveInsertSize => "Non-positive Insert Size Reads",
            Rejection::LowMappingQuality => "Low Mapping Quality Reads",
            Rejection::ChromosomeNotAllowed => "Excluded Chromosome Reads",
            Rejection::MissingBarcode => "Missing Barcode Reads",
            Rejection::UnknownBarcode => "Non-cell Barcode Reads",
            Rejection::InsertSizeTooLarge => "Insert Size Too Large Reads",
        }
    }
}

impl Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Reads seen for one cell.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CellReadCounts {
    /// Every record whose barcode resolves to the cell.
    pub total: u64,
    /// Records that became intervals.
    pub valid: u64,
}

///
/// Process-wide tallies for one run of the driver.
///
#[derive(Debug, Default)]
pub struct RunStatistics {
    pub total: u64,
    pub forward: u64,
    pub reverse: u64,
    pub valid: u64,
    rejections: FxHashMap<Rejection, u64>,
    read_length_sum: u64,
    read_length_n: u64,
    insert_size_sum: i64,
    cells: FxHashMap<String, CellReadCounts>,
}

impl RunStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_seen(&mut self, reverse: bool) {
        self.total += 1;
        if reverse {
            self.reverse += 1;
        } else {
            self.forward += 1;
        }
    }

    pub fn reject(&mut self, reason: Rejection) {
        *self.rejections.entry(reason).or_insert(0) += 1;
    }

    ///
    /// Count an accepted interval; `span` is `end - start` of the corrected
    /// interval.
    ///
    pub fn accept(&mut self, read_length: Option<usize>, span: Position) {
        self.valid += 1;
        self.insert_size_sum += span;
        if let Some(len) = read_length {
            self.read_length_sum += len as u64;
            self.read_length_n += 1;
        }
    }

    pub fn cell_read(&mut self, cell_id: &str, valid: bool) {
        if !self.cells.contains_key(cell_id) {
            self.cells.insert(cell_id.to_string(), CellReadCounts::default());
        }
        let Some(counts) = self.cells.get_mut(cell_id) else {
            return;
        };
        counts.total += 1;
        if valid {
            counts.valid += 1;
        }
    }

    pub fn cell(&self, cell_id: &str) -> CellReadCounts {
        self.cells.get(cell_id).copied().unwrap_or_default()
    }

    pub fn rejected(&self, reason: Rejection) -> u64 {
        self.rejections.get(&reason).copied().unwrap_or(0)
    }

    pub fn total_rejected(&self) -> u64 {
        self.rejections.values().sum()
    }

    /// Mean read length over accepted reads that carry one.
    pub fn mean_read_length(&self) -> Option<f64> {
        (self.read_length_n > 0).then(|| self.read_length_sum as f64 / self.read_length_n as f64)
    }

    pub fn mean_insert_size(&self) -> Option<f64> {
        (self.valid > 0).then(|| self.insert_size_sum as f64 / self.valid as f64)
    }

    ///
    /// Write the `label:\tvalue` run summary.
    ///
    /// Means print `.` when nothing was accepted.
    ///
    pub fn write_summary<W: Write>(&self, mut out: W, min_mapq: i64) -> io::Result<()> {
        writeln!(out, "Total Reads:\t{}", self.total)?;
        writeln!(out, "Positive Strand Reads:\t{}", self.forward)?;
        writeln!(out, "Negative Strand Reads:\t{}", self.reverse)?;
        for reason in Rejection::ALL {
            match reason {
                Rejection::LowMappingQuality => writeln!(
                    out,
                    "{} (<={min_mapq}):\t{}",
                    reason.label(),
                    self.rejected(reason)
                )?,
                _ => writeln!(out, "{}:\t{}", reason.label(), self.rejected(reason))?,
            }
        }
        writeln!(out, "Valid Reads:\t{}", self.valid)?;
        writeln!(out, "Mean Read Length:\t{}", format_mean(self.mean_read_length()))?;
        writeln!(out, "Mean Insert Size:\t{}", format_mean(self.mean_insert_size()))?;
        Ok(())
    }
}

pub(crate) fn format_mean(mean: Option<f64>) -> String {
    match mean {
        Some(v) => format_float(v),
        None => ".".to_string(),
    }
}
