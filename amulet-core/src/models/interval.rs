use std::fmt::{self, Display};
use std::sync::Arc;

/// A genomic coordinate.
///
/// Signed so that start corrections and the "nothing buffered yet" watermark
/// can sit below the first base of a chromosome.
pub type Position = i64;

///
/// The span covered by one read pair, `[start, end]` with both ends inclusive.
///
/// Intervals are built once by the driver from an accepted alignment record and
/// are never modified afterwards.
///
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Interval {
    pub chr: Arc<str>,
    pub start: Position,
    pub end: Position,
    /// Mapping quality of the read that seeded the interval. Fragment files carry none.
    pub mapq: Option<u8>,
}

impl Interval {
    pub fn new(chr: Arc<str>, start: Position, end: Position, mapq: Option<u8>) -> Self {
        Interval {
            chr,
            start,
            end,
            mapq,
        }
    }

    /// First position no longer covered by this interval.
    #[inline]
    pub fn end_exclusive(&self) -> Position {
        self.end + 1
    }

    /// Check whether this interval shares at least one base with `[start, end]`.
    #[inline]
    pub fn intersects(&self, start: Position, end: Position) -> bool {
        self.end >= start && end >= self.start
    }
}

impl Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}-{}", self.chr, self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::*;

    #[fixture]
    fn interval() -> Interval {
        Interval::new(Arc::from("chr1"), 10, 20, Some(40))
    }

    #[rstest]
    #[case(0, 9, false)]
    #[case(0, 10, true)]
    #[case(12, 15, true)]
    #[case(20, 30, true)]
    #[case(21, 30, false)]
    #[case(5, 25, true)]
    fn test_intersects_is_inclusive(
        interval: Interval,
        #[case] start: Position,
        #[case] end: Position,
        #[case] expected: bool,
    ) {
        assert_eq!(interval.intersects(start, end), expected);
    }

    #[rstest]
    fn test_exclusive_end(interval: Interval) {
        assert_eq!(interval.end_exclusive(), 21);
    }

    #[rstest]
    fn test_display(interval: Interval) {
        assert_eq!(interval.to_string(), "chr1:10-20");
    }
}
