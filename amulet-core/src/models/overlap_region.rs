use std::fmt::{self, Display, Write};
use std::sync::Arc;

use super::interval::{Interval, Position};

///
/// Mapping quality summary over the intervals that make up an overlap region.
///
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MappingQualityStats {
    pub min: u8,
    pub max: u8,
    pub mean: f64,
}

impl MappingQualityStats {
    ///
    /// Summarise the mapping qualities of a set of intervals.
    ///
    /// Intervals without a mapping quality are skipped. Returns `None` when
    /// none of the intervals carries one.
    ///
    pub fn from_intervals<'a, I>(intervals: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a Interval>,
    {
        let mut min = u8::MAX;
        let mut max = u8::MIN;
        let mut sum: u64 = 0;
        let mut n: u64 = 0;

        for mapq in intervals.into_iter().filter_map(|i| i.mapq) {
            min = min.min(mapq);
            max = max.max(mapq);
            sum += u64::from(mapq);
            n += 1;
        }

        if n == 0 {
            return None;
        }

        Some(MappingQualityStats {
            min,
            max,
            mean: sum as f64 / n as f64,
        })
    }
}

///
/// A maximal span `[start, end]` (inclusive) where at least the threshold
/// number of intervals overlap, with the intervals that contribute to it.
///
/// Regions are assembled in one go by the provenance resolver; the
/// contributors and their mapping quality summary never change afterwards.
///
#[derive(Debug, Clone, PartialEq)]
pub struct OverlapRegion {
    pub chr: Arc<str>,
    pub start: Position,
    pub end: Position,
    pub min_coverage: u32,
    pub max_coverage: u32,
    contributing: Vec<Interval>,
    mapq: Option<MappingQualityStats>,
}

impl OverlapRegion {
    pub fn new(
        chr: Arc<str>,
        start: Position,
        end: Position,
        min_coverage: u32,
        max_coverage: u32,
        contributing: Vec<Interval>,
    ) -> Self {
        let mapq = MappingQualityStats::from_intervals(&contributing);
        OverlapRegion {
            chr,
            start,
            end,
            min_coverage,
            max_coverage,
            contributing,
            mapq,
        }
    }

    /// The intervals overlapping this region, in ascending start order.
    pub fn contributing(&self) -> &[Interval] {
        &self.contributing
    }

    pub fn mapq(&self) -> Option<&MappingQualityStats> {
        self.mapq.as_ref()
    }

    ///
    /// Number of bases in the region.
    ///
    pub fn width(&self) -> Position {
        self.end - self.start + 1
    }

    ///
    /// Contributor starts as a comma separated list.
    ///
    /// Every value is followed by a comma, including the last one; tools
    /// reading the overlap report split on `,` and drop the trailing field.
    ///
    pub fn starts_field(&self) -> String {
        join_with_trailing_comma(self.contributing.iter().map(|i| i.start))
    }

    ///
    /// Contributor ends, formatted like [`OverlapRegion::starts_field`].
    ///
    pub fn ends_field(&self) -> String {
        join_with_trailing_comma(self.contributing.iter().map(|i| i.end))
    }
}

fn join_with_trailing_comma(values: impl Iterator<Item = Position>) -> String {
    let mut out = String::new();
    for v in values {
        // writing into a String cannot fail
        let _ = write!(out, "{v},");
    }
    out
}

impl Display for OverlapRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}-{}", self.chr, self.start, self.end)
    }
}
