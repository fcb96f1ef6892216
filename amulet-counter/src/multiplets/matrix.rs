use std::sync::Arc;

use fxhash::{FxHashMap, FxHashSet};

use super::inputs::{CellOverlap, CellRecord};
use super::regions::RegionSet;

///
/// Column of every cell in the merged region by cell matrix, in the order of
/// the overlap summary. A cell id listed twice keeps its last column.
///
#[derive(Debug, Clone, Default)]
pub struct CellColumns {
    columns: FxHashMap<Arc<str>, usize>,
    len: usize,
}

impl CellColumns {
    pub fn new(cells: &[CellRecord]) -> Self {
        let columns = cells
            .iter()
            .enumerate()
            .map(|(column, cell)| (Arc::clone(&cell.cell_id), column))
            .collect();
        CellColumns {
            columns,
            len: cells.len(),
        }
    }

    pub fn get(&self, cell_id: &str) -> Option<usize> {
        self.columns.get(cell_id).copied()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

///
/// The 0/1 matrix of merged regions by cells, where a cell has a 1 in every
/// region it has at least one overlap row in. Only the row and column sums
/// are kept.
///
#[derive(Debug, Clone, PartialEq)]
pub struct Incidence {
    /// Number of cells overlapping each merged region.
    pub region_counts: Vec<u64>,
    /// Number of merged regions each cell overlaps.
    pub cell_counts: Vec<u64>,
}

impl Incidence {
    ///
    /// Place every row in its merged region. Rows of cells missing from
    /// `columns` and rows outside `regions` are skipped.
    ///
    pub fn build(rows: &[CellOverlap], regions: &RegionSet, columns: &CellColumns) -> Self {
        let mut hits: FxHashSet<(usize, usize)> = FxHashSet::default();
        for row in rows {
            let Some(column) = columns.get(&row.cell_id) else {
                continue;
            };
            let Some(region) = regions.find(&row.region.chr, row.region.start, row.region.end)
            else {
                continue;
            };
            hits.insert((region, column));
        }

        let mut region_counts = vec![0; regions.len()];
        let mut cell_counts = vec![0; columns.len()];
        for (region, column) in hits {
            region_counts[region] += 1;
            cell_counts[column] += 1;
        }

        Incidence {
            region_counts,
            cell_counts,
        }
    }
}
