use std::sync::Arc;

use fxhash::FxHashSet;

use amulet_core::{Interval, Position};
use amulet_overlaps::find_overlaps;

use super::inputs::CellOverlap;
use super::regions::RegionSet;

///
/// Drop the reads of every overlap row that fall in `repeats`, along with
/// repeated copies of the same read span, and re-derive the row's overlaps
/// from what is left.
///
/// A row that loses nothing is kept as it is. A row that loses reads is swept
/// again at `threshold`: it may shrink, split in several rows, or vanish. A row
/// left with fewer than `threshold` reads always vanishes.
///
pub fn filter_repeat_reads(
    rows: Vec<CellOverlap>,
    repeats: &RegionSet,
    threshold: u32,
) -> Vec<CellOverlap> {
    let mut filtered = Vec::with_capacity(rows.len());

    for row in rows {
        let contributing = row.region.contributing();
        let mut seen: FxHashSet<(Position, Position)> = FxHashSet::default();
        let kept: Vec<Interval> = contributing
            .iter()
            .filter(|read| seen.insert((read.start, read.end)))
            .filter(|read| !repeats.overlaps(&read.chr, read.start, read.end))
            .cloned()
            .collect();

        if kept.len() == contributing.len() {
            filtered.push(row);
            continue;
        }
        if kept.len() < threshold as usize {
            continue;
        }

        let chr = Arc::clone(&row.region.chr);
        for region in find_overlaps(&chr, &kept, threshold) {
            filtered.push(CellOverlap {
                cell_id: Arc::clone(&row.cell_id),
                region,
            });
        }
    }

    filtered
}

#[cfg(test)]
mod tests {
    use super::*;
    use amulet_core::OverlapRegion;
    use pretty_assertions::assert_eq;
    use rstest::*;

    fn row(cell: &str, start: Position, end: Position, reads: &[(Position, Position)]) -> CellOverlap {
        let chr: Arc<str> = Arc::from("chr1");
        let contributing = reads
            .iter()
            .map(|&(s, e)| Interval::new(Arc::clone(&chr), s, e, None))
            .collect();
        CellOverlap {
            cell_id: Arc::from(cell),
            region: OverlapRegion::new(chr, start, end, 3, 3, contributing),
        }
    }

    fn repeats(regions: &[(Position, Position)]) -> RegionSet {
        RegionSet::union(
            regions
                .iter()
                .map(|&(s, e)| Interval::new(Arc::from("chr1"), s, e, None)),
        )
    }

    fn spans(rows: &[CellOverlap]) -> Vec<(&str, Position, Position)> {
        rows.iter()
            .map(|r| (r.cell_id.as_ref(), r.region.start, r.region.end))
            .collect()
    }

    #[rstest]
    fn test_untouched_rows_pass_through() {
        let rows = vec![row("_cell_0", 18, 20, &[(10, 20), (15, 25), (18, 30)])];
        let filtered = filter_repeat_reads(rows.clone(), &repeats(&[(500, 600)]), 3);
        assert_eq!(filtered, rows);
    }

    #[rstest]
    fn test_row_left_with_too_few_reads_is_dropped() {
        let rows = vec![row("_cell_0", 18, 20, &[(10, 20), (15, 25), (18, 30)])];
        let filtered = filter_repeat_reads(rows, &repeats(&[(29, 35)]), 3);
        assert_eq!(filtered.is_empty(), true);
    }

    #[rstest]
    fn test_duplicate_read_spans_count_once() {
        let rows = vec![row("_cell_0", 18, 20, &[(10, 20), (10, 20), (18, 30)])];
        let filtered = filter_repeat_reads(rows, &RegionSet::default(), 3);
        assert_eq!(filtered.is_empty(), true);
    }

    #[rstest]
    fn test_overlap_is_recomputed_from_the_reads_left() {
        // four reads, the last one sits in a repeat
        let rows = vec![row(
            "_cell_0",
            18,
            22,
            &[(10, 22), (15, 25), (18, 30), (19, 40)],
        )];
        let filtered = filter_repeat_reads(rows, &repeats(&[(35, 45)]), 3);

        assert_eq!(spans(&filtered), vec![("_cell_0", 18, 22)]);
        assert_eq!(filtered[0].region.contributing().len(), 3);
        assert_eq!(filtered[0].region.max_coverage, 3);
    }

    #[rstest]
    fn test_recomputed_row_can_split() {
        let rows = vec![row(
            "_cell_1",
            10,
            50,
            &[(10, 20), (10, 20), (12, 22), (14, 48), (40, 50), (45, 55)],
        )];
        let filtered = filter_repeat_reads(rows, &RegionSet::default(), 2);
        assert_eq!(
            spans(&filtered),
            vec![("_cell_1", 12, 22), ("_cell_1", 40, 50)]
        );
    }
}
