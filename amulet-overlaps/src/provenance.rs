use std::sync::Arc;

use amulet_core::{Interval, OverlapRegion};

use crate::sweep::CoverageSpan;

///
/// Attach to every coverage span the intervals that intersect it.
///
/// Both inputs must be sorted by start. The intervals are walked once with a
/// cursor; an interval that reaches past the end of the current span is carried
/// into the next one, since it may intersect that span too. Anything that ends
/// before the current span is dropped for good.
///
/// # Arguments
/// - chr: chromosome every returned region is placed on
/// - spans: coverage spans in ascending start order
/// - intervals: the intervals the spans were computed from, sorted by start
///
pub fn resolve_provenance(
    chr: &Arc<str>,
    spans: &[CoverageSpan],
    intervals: &[Interval],
) -> Vec<OverlapRegion> {
    debug_assert!(intervals.windows(2).all(|w| w[0].start <= w[1].start));

    let mut regions = Vec::with_capacity(spans.len());
    let mut carried: Vec<&Interval> = Vec::new();
    let mut cursor = 0;

    for span in spans {
        let mut contributing: Vec<Interval> = Vec::new();

        carried.retain(|interval| {
            if interval.intersects(span.start, span.end) {
                contributing.push((*interval).clone());
            }
            interval.end >= span.end
        });

        while cursor < intervals.len() && intervals[cursor].start <= span.end {
            let interval = &intervals[cursor];
            if interval.intersects(span.start, span.end) {
                contributing.push(interval.clone());
            }
            if interval.end >= span.end {
                carried.push(interval);
            }
            cursor += 1;
        }

        contributing.sort_by_key(|i| i.start);

        regions.push(OverlapRegion::new(
            Arc::clone(chr),
            span.start,
            span.end,
            span.min_coverage,
            span.max_coverage,
            contributing,
        ));
    }

    regions
}
