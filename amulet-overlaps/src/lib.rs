//! Overlap detection for per-cell fragment intervals.
//!
//! A sorted stream of fragments is split by cell. Each cell keeps a small
//! pending batch of intervals that could still overlap one another; once a
//! new fragment starts past everything in the batch, the batch is swept for
//! positions covered by at least `threshold` fragments and then dropped.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use amulet_core::Interval;
//! use amulet_overlaps::find_overlaps;
//!
//! let chr: Arc<str> = Arc::from("chr1");
//! let intervals = vec![
//!     Interval::new(chr.clone(), 10, 20, Some(40)),
//!     Interval::new(chr.clone(), 15, 25, Some(30)),
//!     Interval::new(chr.clone(), 18, 30, Some(50)),
//! ];
//!
//! let regions = find_overlaps(&chr, &intervals, 3);
//! assert_eq!(regions.len(), 1);
//! assert_eq!((regions[0].start, regions[0].end), (18, 20));
//! ```

use std::sync::Arc;

use amulet_core::{Interval, OverlapRegion};

/// Sweep-line coverage over a batch of intervals.
pub mod sweep;

/// Mapping coverage spans back to the intervals that produce them.
pub mod provenance;

/// Per-cell pending batches and flush policy.
pub mod tracker;

/// Where flushed overlap regions go.
pub mod traits;

pub use self::provenance::resolve_provenance;
pub use self::sweep::{CoverageSpan, find_coverage_spans};
pub use self::tracker::{CellIntervalTracker, CellState};
pub use self::traits::OverlapSink;

///
/// Find the overlap regions of one batch of intervals on a single chromosome.
///
/// The batch is sorted by start before provenance is resolved; the sweep
/// itself does not care about order.
///
pub fn find_overlaps(chr: &Arc<str>, intervals: &[Interval], threshold: u32) -> Vec<OverlapRegion> {
    let spans = find_coverage_spans(intervals, threshold);
    if spans.is_empty() {
        return Vec::new();
    }

    if intervals.windows(2).all(|w| w[0].start <= w[1].start) {
        resolve_provenance(chr, &spans, intervals)
    } else {
        let mut sorted = intervals.to_vec();
        sorted.sort_by_key(|i| i.start);
        resolve_provenance(chr, &spans, &sorted)
    }
}
