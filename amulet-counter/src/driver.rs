use std::sync::Arc;

use log::debug;

use amulet_core::{Interval, Position};
use amulet_overlaps::{CellIntervalTracker, OverlapSink};

use crate::barcodes::BarcodeRegistry;
use crate::chromosomes::ChromosomeAllowlist;
use crate::config::OverlapConfig;
use crate::errors::Result;
use crate::guard::SortOrderGuard;
use crate::record::AlignmentRecord;
use crate::statistics::{Rejection, RunStatistics};

// accepted: cell id, interval and its insert size
type Classified = std::result::Result<(Arc<str>, Interval, Position), Rejection>;

/// Numeric filter settings, resolved once from an [`OverlapConfig`].
#[derive(Debug, Clone, Copy)]
struct Filters {
    min_mapq: i64,
    max_insert_size: i64,
    start_bases: i64,
    end_bases: i64,
}

///
/// Classifies alignment records, keeps the run statistics and routes accepted
/// intervals to the per-cell tracker.
///
/// Records must come in coordinate order; the sort guard enforces this unless
/// the config trusts the input.
///
pub struct OverlapDriver<'a> {
    registry: &'a BarcodeRegistry,
    allowlist: &'a ChromosomeAllowlist,
    filters: Filters,
    guard: SortOrderGuard,
    tracker: CellIntervalTracker,
    stats: RunStatistics,
}

impl<'a> OverlapDriver<'a> {
    pub fn new(
        config: &OverlapConfig,
        registry: &'a BarcodeRegistry,
        allowlist: &'a ChromosomeAllowlist,
    ) -> Self {
        let tracker =
            CellIntervalTracker::with_cells(config.threshold(), registry.cell_ids().cloned());

        OverlapDriver {
            registry,
            allowlist,
            filters: Filters {
                min_mapq: config.min_mapq,
                max_insert_size: config.max_insert_size,
                start_bases: config.start_bases,
                end_bases: config.end_bases,
            },
            guard: SortOrderGuard::new(config.force_sorted),
            tracker,
            stats: RunStatistics::new(),
        }
    }

    ///
    /// Handle one record: count it, and if it passes every filter turn it into
    /// an interval for its cell.
    ///
    pub fn process<S>(&mut self, record: &AlignmentRecord, sink: &mut S) -> Result<()>
    where
        S: OverlapSink + ?Sized,
    {
        self.stats
            .record_seen(record.flags.is_reverse_complemented());

        if let Some((chr, start)) = record.placement() {
            if !record.flags.is_unmapped() {
                self.guard.observe(chr, start)?;
            }
        }

        let cell_id = record
            .barcode
            .as_deref()
            .and_then(|barcode| self.registry.cell_id(barcode))
            .cloned();

        match self.classify(record, cell_id.as_ref(), sink)? {
            Ok((cell_id, interval, insert_size)) => {
                self.stats.accept(record.read_length, insert_size);
                self.stats.cell_read(&cell_id, true);
                self.tracker.push(&cell_id, interval, sink)?;
            }
            Err(reason) => {
                self.stats.reject(reason);
                if let Some(cell_id) = cell_id {
                    self.stats.cell_read(&cell_id, false);
                }
            }
        }

        Ok(())
    }

    ///
    /// Run the filters in order. The chromosome switch is applied as soon as a
    /// record on an allowed chromosome passes the read level checks, before
    /// its barcode is looked at.
    ///
    fn classify<S>(
        &mut self,
        record: &AlignmentRecord,
        cell_id: Option<&Arc<str>>,
        sink: &mut S,
    ) -> Result<Classified>
    where
        S: OverlapSink + ?Sized,
    {
        let flags = record.flags;

        let reject = |reason: Rejection| -> Result<Classified> { Ok(Err(reason)) };

        if !flags.is_segmented() {
            return reject(Rejection::Unpaired);
        }
        let Some((chr, start)) = record.placement().filter(|_| !flags.is_unmapped()) else {
            return reject(Rejection::Unmapped);
        };
        if flags.is_mate_unmapped() {
            return reject(Rejection::MateUnmapped);
        }
        if flags.is_secondary() || flags.is_supplementary() {
            return reject(Rejection::SecondaryOrSupplementary);
        }
        if flags.is_duplicate() {
            return reject(Rejection::Duplicate);
        }
        if !record.mate_same_reference {
            return reject(Rejection::MateOnOtherReference);
        }
        if flags.is_reverse_complemented() {
            return reject(Rejection::ReverseStrand);
        }
        if record.insert_size <= 0 {
            return reject(Rejection::NonPositiveInsertSize);
        }
        if let Some(mapq) = record.mapq {
            if i64::from(mapq) <= self.filters.min_mapq {
                return reject(Rejection::LowMappingQuality);
            }
        }
        if !self.allowlist.contains(chr) {
            return reject(Rejection::ChromosomeNotAllowed);
        }

        if self.tracker.chromosome() != Some(chr.as_ref()) {
            debug!("Starting chromosome {chr}");
            self.tracker.start_chromosome(Arc::clone(chr), sink)?;
        }

        if record.barcode.is_none() {
            return reject(Rejection::MissingBarcode);
        }
        let Some(cell_id) = cell_id else {
            return reject(Rejection::UnknownBarcode);
        };

        let corrected = self
            .corrected_span(start, record.insert_size)
            .filter(|(interval_start, interval_end)| interval_end >= interval_start)
            .and_then(|(interval_start, interval_end)| {
                let length = record.span_length.measure(interval_start, interval_end)?;
                Some((interval_start, interval_end, length))
            });
        let Some((interval_start, interval_end, insert_size)) =
            corrected.filter(|(_, _, length)| *length <= self.filters.max_insert_size)
        else {
            return reject(Rejection::InsertSizeTooLarge);
        };

        let interval = Interval::new(Arc::clone(chr), interval_start, interval_end, record.mapq);
        Ok(Ok((Arc::clone(cell_id), interval, insert_size)))
    }

    /// Closed span of the fragment after the start/end corrections; `None` if
    /// a coordinate leaves the `Position` range.
    fn corrected_span(&self, start: Position, insert_size: i64) -> Option<(Position, Position)> {
        let end = start.checked_add(insert_size)?.checked_sub(1)?;
        Some((
            start.checked_add(self.filters.start_bases)?,
            end.checked_add(self.filters.end_bases)?,
        ))
    }

    ///
    /// Flush everything still pending. Call once, after the last record.
    ///
    pub fn finish<S>(&mut self, sink: &mut S) -> Result<()>
    where
        S: OverlapSink + ?Sized,
    {
        self.tracker.finish(sink)?;
        Ok(())
    }

    pub fn stats(&self) -> &RunStatistics {
        &self.stats
    }

    pub fn tracker(&self) -> &CellIntervalTracker {
        &self.tracker
    }
}
