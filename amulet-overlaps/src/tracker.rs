use std::collections::BTreeMap;
use std::io;
use std::sync::Arc;

use amulet_core::{Interval, Position};
use log::debug;

use crate::find_overlaps;
use crate::traits::OverlapSink;

///
/// Pending batch and bookkeeping for a single cell.
///
/// `watermark` is the furthest end seen in the current batch. Every interval
/// in `pending` starts at or before it; once a new interval starts past it,
/// nothing buffered can overlap anything still to come on this chromosome.
///
#[derive(Debug, Clone)]
pub struct CellState {
    pending: Vec<Interval>,
    watermark: Position,
    overlaps: u64,
}

impl Default for CellState {
    fn default() -> Self {
        CellState {
            pending: Vec::new(),
            watermark: Position::MIN,
            overlaps: 0,
        }
    }
}

impl CellState {
    pub fn pending(&self) -> &[Interval] {
        &self.pending
    }

    pub fn watermark(&self) -> Position {
        self.watermark
    }

    /// Overlap regions emitted for this cell so far, across all chromosomes.
    pub fn overlaps(&self) -> u64 {
        self.overlaps
    }

    ///
    /// Resolve the pending batch, hand its regions to `sink` and clear it.
    ///
    /// Returns the number of regions emitted. The watermark is left alone; the
    /// caller decides whether the next batch continues from it.
    ///
    pub fn flush<S>(&mut self, cell_id: &str, threshold: u32, sink: &mut S) -> io::Result<usize>
    where
        S: OverlapSink + ?Sized,
    {
        let Some(first) = self.pending.first() else {
            return Ok(0);
        };

        let chr = Arc::clone(&first.chr);
        let regions = find_overlaps(&chr, &self.pending, threshold);
        if !regions.is_empty() {
            sink.emit(cell_id, &regions)?;
        }

        self.overlaps += regions.len() as u64;
        self.pending.clear();

        Ok(regions.len())
    }

    fn reset(&mut self) {
        self.pending.clear();
        self.watermark = Position::MIN;
    }
}

///
/// Owns the [`CellState`] of every cell and applies the flush policy.
///
/// Intervals must arrive grouped by chromosome and sorted by start within a
/// chromosome. Call [`CellIntervalTracker::start_chromosome`] whenever the
/// chromosome changes and [`CellIntervalTracker::finish`] at the end of the
/// stream.
///
#[derive(Debug)]
pub struct CellIntervalTracker {
    threshold: u32,
    cells: BTreeMap<Arc<str>, CellState>,
    chromosome: Option<Arc<str>>,
    flushes: u64,
    peak_pending: usize,
}

impl CellIntervalTracker {
    pub fn new(threshold: u32) -> Self {
        CellIntervalTracker {
            threshold,
            cells: BTreeMap::new(),
            chromosome: None,
            flushes: 0,
            peak_pending: 0,
        }
    }

    ///
    /// Create a tracker with an empty state for each of `cell_ids`, so that
    /// cells without any accepted interval still show up in the summary.
    ///
    pub fn with_cells<I>(threshold: u32, cell_ids: I) -> Self
    where
        I: IntoIterator<Item = Arc<str>>,
    {
        let mut tracker = Self::new(threshold);
        for id in cell_ids {
            tracker.cells.entry(id).or_default();
        }
        tracker
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    /// The chromosome currently being accumulated, if any.
    pub fn chromosome(&self) -> Option<&str> {
        self.chromosome.as_deref()
    }

    ///
    /// Add an accepted interval for `cell_id`.
    ///
    /// If the interval starts past the cell's watermark, the current batch is
    /// flushed first and the interval opens the next one.
    ///
    pub fn push<S>(&mut self, cell_id: &Arc<str>, interval: Interval, sink: &mut S) -> io::Result<()>
    where
        S: OverlapSink + ?Sized,
    {
        let threshold = self.threshold;
        let state = self.cells.entry(Arc::clone(cell_id)).or_default();

        if state.watermark < interval.start && !state.pending.is_empty() {
            state.flush(cell_id, threshold, sink)?;
            self.flushes += 1;
        }

        state.watermark = state.watermark.max(interval.end);
        state.pending.push(interval);
        self.peak_pending = self.peak_pending.max(state.pending.len());

        Ok(())
    }

    ///
    /// Flush every cell and reset all batches and watermarks for `chr`.
    ///
    /// Regions still pending are emitted under the chromosome they were
    /// collected on. Overlap counts carry over.
    ///
    pub fn start_chromosome<S>(&mut self, chr: Arc<str>, sink: &mut S) -> io::Result<()>
    where
        S: OverlapSink + ?Sized,
    {
        let pending = self.pending_len();
        self.flush_all(sink)?;
        if let Some(previous) = &self.chromosome {
            debug!(
                "Finished {previous}: resolved {pending} pending intervals, {} overlaps so far",
                self.total_overlaps()
            );
        }
        for state in self.cells.values_mut() {
            state.reset();
        }
        self.chromosome = Some(chr);
        Ok(())
    }

    ///
    /// Flush whatever is still pending at the end of the stream.
    ///
    pub fn finish<S>(&mut self, sink: &mut S) -> io::Result<()>
    where
        S: OverlapSink + ?Sized,
    {
        self.flush_all(sink)?;
        for state in self.cells.values_mut() {
            state.reset();
        }
        self.chromosome = None;
        Ok(())
    }

    fn flush_all<S>(&mut self, sink: &mut S) -> io::Result<()>
    where
        S: OverlapSink + ?Sized,
    {
        let threshold = self.threshold;
        for (cell_id, state) in self.cells.iter_mut() {
            if state.pending.is_empty() {
                continue;
            }
            state.flush(cell_id, threshold, sink)?;
            self.flushes += 1;
        }
        Ok(())
    }

    pub fn cell(&self, cell_id: &str) -> Option<&CellState> {
        self.cells.get(cell_id)
    }

    pub fn overlap_count(&self, cell_id: &str) -> u64 {
        self.cells.get(cell_id).map(|s| s.overlaps).unwrap_or(0)
    }

    /// Overlap counts for every known cell, ordered by cell id.
    pub fn overlap_counts(&self) -> impl Iterator<Item = (&str, u64)> {
        self.cells.iter().map(|(id, s)| (id.as_ref(), s.overlaps))
    }

    /// Intervals currently buffered across all cells.
    pub fn pending_len(&self) -> usize {
        self.cells.values().map(|s| s.pending.len()).sum()
    }

    /// Largest batch any single cell has held.
    pub fn peak_pending(&self) -> usize {
        self.peak_pending
    }

    /// Number of non-empty batches resolved so far.
    pub fn flushes(&self) -> u64 {
        self.flushes
    }

    pub fn total_overlaps(&self) -> u64 {
        self.cells.values().map(|s| s.overlaps).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use rstest::*;

    fn iv(chr: &str, start: Position, end: Position) -> Interval {
        Interval::new(Arc::from(chr), start, end, Some(40))
    }

    #[fixture]
    fn cell() -> Arc<str> {
        Arc::from("cell_1")
    }

    #[rstest]
    fn test_staircase_flushed_at_end_of_stream(cell: Arc<str>) {
        let mut sink: Vec<(String, amulet_core::OverlapRegion)> = Vec::new();
        let mut tracker = CellIntervalTracker::new(3);

        tracker.start_chromosome(Arc::from("chr1"), &mut sink).unwrap();
        for i in [iv("chr1", 10, 20), iv("chr1", 15, 25), iv("chr1", 18, 30)] {
            tracker.push(&cell, i, &mut sink).unwrap();
        }
        assert_eq!(sink.is_empty(), true);

        tracker.finish(&mut sink).unwrap();
        assert_eq!(sink.len(), 1);

        let (id, region) = &sink[0];
        assert_eq!(id, "cell_1");
        assert_eq!((region.start, region.end), (18, 20));
        assert_eq!((region.min_coverage, region.max_coverage), (3, 3));
        assert_eq!(region.contributing().len(), 3);
        assert_eq!(tracker.overlap_count("cell_1"), 1);
        assert_eq!(tracker.pending_len(), 0);
    }

    #[rstest]
    fn test_pending_len_spans_cells_until_chromosome_switch() {
        let mut sink: Vec<(String, amulet_core::OverlapRegion)> = Vec::new();
        let mut tracker = CellIntervalTracker::new(2);
        assert_eq!(tracker.threshold(), 2);

        tracker.start_chromosome(Arc::from("chr1"), &mut sink).unwrap();
        tracker.push(&Arc::from("a"), iv("chr1", 1, 10), &mut sink).unwrap();
        tracker.push(&Arc::from("a"), iv("chr1", 5, 12), &mut sink).unwrap();
        tracker.push(&Arc::from("b"), iv("chr1", 8, 9), &mut sink).unwrap();
        assert_eq!(tracker.pending_len(), 3);

        tracker.start_chromosome(Arc::from("chr2"), &mut sink).unwrap();
        assert_eq!(tracker.pending_len(), 0);
        assert_eq!(sink.len(), 1);
        assert_eq!(sink[0].0, "a");
    }

    #[rstest]
    fn test_gap_past_watermark_triggers_flush(cell: Arc<str>) {
        let mut sink: Vec<(String, amulet_core::OverlapRegion)> = Vec::new();
        let mut tracker = CellIntervalTracker::new(2);

        tracker.push(&cell, iv("chr1", 1, 10), &mut sink).unwrap();
        tracker.push(&cell, iv("chr1", 5, 12), &mut sink).unwrap();
        // starts past watermark 12
        tracker.push(&cell, iv("chr1", 13, 20), &mut sink).unwrap();

        assert_eq!(sink.len(), 1);
        assert_eq!((sink[0].1.start, sink[0].1.end), (5, 10));

        // the interval that triggered the flush seeds the next batch
        let state = tracker.cell("cell_1").unwrap();
        assert_eq!(state.pending().len(), 1);
        assert_eq!(state.pending()[0].start, 13);
        assert_eq!(state.watermark(), 20);
        assert_eq!(tracker.flushes(), 1);
    }

    #[rstest]
    fn test_disjoint_batch_emits_nothing(cell: Arc<str>) {
        let mut sink: Vec<(String, amulet_core::OverlapRegion)> = Vec::new();
        let mut tracker = CellIntervalTracker::new(2);

        tracker.push(&cell, iv("chr1", 1, 5), &mut sink).unwrap();
        tracker.push(&cell, iv("chr1", 10, 15), &mut sink).unwrap();
        tracker.finish(&mut sink).unwrap();

        assert_eq!(sink.is_empty(), true);
        assert_eq!(tracker.overlap_count("cell_1"), 0);
        assert_eq!(tracker.flushes(), 2);
    }

    #[rstest]
    fn test_flushing_empty_state_is_a_no_op() {
        let mut sink: Vec<(String, amulet_core::OverlapRegion)> = Vec::new();
        let mut state = CellState::default();
        assert_eq!(state.flush("cell_1", 3, &mut sink).unwrap(), 0);
        assert_eq!(sink.is_empty(), true);

        let mut tracker = CellIntervalTracker::with_cells(3, [Arc::from("a"), Arc::from("b")]);
        tracker.finish(&mut sink).unwrap();
        assert_eq!(sink.is_empty(), true);
        assert_eq!(tracker.flushes(), 0);
        assert_eq!(
            tracker.overlap_counts().collect::<Vec<_>>(),
            vec![("a", 0), ("b", 0)]
        );
    }

    #[rstest]
    fn test_chromosome_switch_flushes_under_old_name(cell: Arc<str>) {
        let mut sink: Vec<(String, amulet_core::OverlapRegion)> = Vec::new();
        let mut tracker = CellIntervalTracker::new(2);

        tracker.start_chromosome(Arc::from("chr1"), &mut sink).unwrap();
        tracker.push(&cell, iv("chr1", 100, 200), &mut sink).unwrap();
        tracker.push(&cell, iv("chr1", 150, 250), &mut sink).unwrap();

        tracker.start_chromosome(Arc::from("chr2"), &mut sink).unwrap();
        assert_eq!(sink.len(), 1);
        assert_eq!(sink[0].1.chr.as_ref(), "chr1");
        assert_eq!((sink[0].1.start, sink[0].1.end), (150, 200));

        // watermark reset: a chr2 interval starting low does not join the old batch
        let state = tracker.cell("cell_1").unwrap();
        assert_eq!(state.pending().is_empty(), true);
        assert_eq!(state.watermark(), Position::MIN);
        assert_eq!(tracker.chromosome(), Some("chr2"));

        tracker.push(&cell, iv("chr2", 10, 20), &mut sink).unwrap();
        tracker.push(&cell, iv("chr2", 15, 30), &mut sink).unwrap();
        tracker.finish(&mut sink).unwrap();

        assert_eq!(sink.len(), 2);
        assert_eq!(sink[1].1.chr.as_ref(), "chr2");
        assert_eq!(tracker.overlap_count("cell_1"), 2);
    }

    #[rstest]
    fn test_cells_are_tracked_independently() {
        let a: Arc<str> = Arc::from("a");
        let b: Arc<str> = Arc::from("b");
        let mut sink: Vec<(String, amulet_core::OverlapRegion)> = Vec::new();
        let mut tracker = CellIntervalTracker::new(2);

        tracker.push(&a, iv("chr1", 1, 10), &mut sink).unwrap();
        tracker.push(&b, iv("chr1", 2, 10), &mut sink).unwrap();
        tracker.push(&a, iv("chr1", 50, 60), &mut sink).unwrap();
        tracker.push(&b, iv("chr1", 5, 8), &mut sink).unwrap();
        tracker.finish(&mut sink).unwrap();

        // only b ever had two intervals overlapping
        assert_eq!(sink.len(), 1);
        assert_eq!(sink[0].0, "b");
        assert_eq!(tracker.overlap_count("a"), 0);
        assert_eq!(tracker.overlap_count("b"), 1);
    }

    #[rstest]
    fn test_interval_reaching_watermark_stays_in_batch(cell: Arc<str>) {
        let mut sink: Vec<(String, amulet_core::OverlapRegion)> = Vec::new();
        let mut tracker = CellIntervalTracker::new(2);

        tracker.push(&cell, iv("chr1", 1, 10), &mut sink).unwrap();
        // start == watermark: closed intervals share base 10
        tracker.push(&cell, iv("chr1", 10, 20), &mut sink).unwrap();
        assert_eq!(tracker.cell("cell_1").unwrap().pending().len(), 2);

        tracker.finish(&mut sink).unwrap();
        assert_eq!(sink.len(), 1);
        assert_eq!((sink[0].1.start, sink[0].1.end), (10, 10));
    }

    proptest! {
        #[test]
        fn prop_batches_only_hold_mutually_reachable_intervals(
            pairs in prop::collection::vec((0i64..500, 0i64..30), 1..60),
        ) {
            let mut intervals: Vec<Interval> = pairs
                .into_iter()
                .map(|(start, len)| iv("chr1", start, start + len))
                .collect();
            intervals.sort_by_key(|i| i.start);

            let cell: Arc<str> = Arc::from("c");
            let mut sink: Vec<(String, amulet_core::OverlapRegion)> = Vec::new();
            let mut tracker = CellIntervalTracker::new(2);

            for interval in intervals.iter().cloned() {
                tracker.push(&cell, interval, &mut sink).unwrap();
                let state = tracker.cell("c").unwrap();
                // every buffered interval starts within the current window
                for pending in state.pending() {
                    prop_assert!(pending.start <= state.watermark());
                }
                // the batch is a chain: each interval starts at or before the furthest end before it
                let mut reach = Position::MIN;
                for (idx, pending) in state.pending().iter().enumerate() {
                    if idx > 0 {
                        prop_assert!(pending.start <= reach);
                    }
                    reach = reach.max(pending.end);
                }
            }
            tracker.finish(&mut sink).unwrap();

            // streaming in batches finds the same regions as one sweep over everything
            let chr: Arc<str> = Arc::from("chr1");
            let whole = crate::find_overlaps(&chr, &intervals, 2);
            let streamed: Vec<(Position, Position)> =
                sink.iter().map(|(_, r)| (r.start, r.end)).collect();
            let expected: Vec<(Position, Position)> =
                whole.iter().map(|r| (r.start, r.end)).collect();
            prop_assert_eq!(streamed, expected);
        }
    }
}
