use amulet_core::{Interval, Position};

/// A maximal run of positions `[start, end]` (inclusive) where coverage is at
/// or above the threshold, with the lowest and highest coverage seen inside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoverageSpan {
    pub start: Position,
    pub end: Position,
    pub min_coverage: u32,
    pub max_coverage: u32,
}

impl CoverageSpan {
    fn opened_at(position: Position, coverage: u32) -> Self {
        CoverageSpan {
            start: position,
            end: position,
            min_coverage: coverage,
            max_coverage: coverage,
        }
    }

    fn observe(&mut self, coverage: u32) {
        self.min_coverage = self.min_coverage.min(coverage);
        self.max_coverage = self.max_coverage.max(coverage);
    }
}

///
/// Find every maximal span where at least `threshold` intervals overlap.
///
/// Each interval contributes `+1` at its start and `-1` at the first base past
/// its end. Events sharing a position are summed into one change, so the order
/// of the input does not matter. Coverage is then swept left to right: a span
/// opens where coverage climbs to the threshold and closes on the base before
/// it drops below it. Min/max coverage only look at positions inside the span.
///
/// Nothing is covered past the last event, so it always closes an open span,
/// even when `threshold` is zero.
///
/// # Arguments
/// - intervals: the intervals to sweep, in any order
/// - threshold: minimum coverage for a position to be reported
///
pub fn find_coverage_spans(intervals: &[Interval], threshold: u32) -> Vec<CoverageSpan> {
    let mut events: Vec<(Position, i64)> = Vec::with_capacity(intervals.len() * 2);
    for interval in intervals {
        events.push((interval.start, 1));
        events.push((interval.end_exclusive(), -1));
    }
    events.sort_unstable_by_key(|&(position, _)| position);

    let mut spans = Vec::new();
    let mut open: Option<CoverageSpan> = None;
    let mut coverage: i64 = 0;

    let mut idx = 0;
    while idx < events.len() {
        let position = events[idx].0;
        while idx < events.len() && events[idx].0 == position {
            coverage += events[idx].1;
            idx += 1;
        }
        let past_last_event = idx == events.len();

        // every -1 sits after its matching +1, so the running sum never goes negative
        let depth = coverage as u32;

        if depth >= threshold && !past_last_event {
            match open.as_mut() {
                Some(span) => span.observe(depth),
                None => open = Some(CoverageSpan::opened_at(position, depth)),
            }
        } else if let Some(mut span) = open.take() {
            span.end = position - 1;
            spans.push(span);
        }
    }

    spans
}
