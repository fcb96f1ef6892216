use std::io::BufRead;
use std::ops::Range;
use std::path::Path;
use std::sync::Arc;

use fxhash::FxHashMap;

use amulet_core::utils::get_dynamic_reader;
use amulet_core::{Interval, Position};

use crate::errors::{CounterError, Result};

///
/// Disjoint closed regions sorted by chromosome and start. Regions that share
/// a base are merged on construction.
///
/// Lookups binary search the regions of one chromosome, so asking which
/// region a span touches costs `O(log n)`.
///
#[derive(Debug, Clone, Default)]
pub struct RegionSet {
    regions: Vec<Interval>,
    chromosomes: FxHashMap<Arc<str>, Range<usize>>,
}

impl RegionSet {
    ///
    /// Merge `regions` into their union.
    ///
    /// Two regions are merged when the second starts on or before the last
    /// base of the first; regions that merely abut stay apart.
    ///
    pub fn union<I>(regions: I) -> Self
    where
        I: IntoIterator<Item = Interval>,
    {
        let mut sorted: Vec<Interval> = regions.into_iter().collect();
        sorted.sort_by(|a, b| a.chr.cmp(&b.chr).then(a.start.cmp(&b.start)));

        let mut merged: Vec<Interval> = Vec::with_capacity(sorted.len());
        for region in sorted {
            match merged.last_mut() {
                Some(last) if last.chr == region.chr && region.start <= last.end => {
                    last.end = last.end.max(region.end);
                }
                _ => merged.push(Interval::new(region.chr, region.start, region.end, None)),
            }
        }

        let mut chromosomes = FxHashMap::default();
        let mut first = 0;
        for idx in 1..=merged.len() {
            if idx == merged.len() || merged[idx].chr != merged[first].chr {
                chromosomes.insert(Arc::clone(&merged[first].chr), first..idx);
                first = idx;
            }
        }

        RegionSet {
            regions: merged,
            chromosomes,
        }
    }

    ///
    /// Load a BED file (gzip'd or not) of regions to exclude, such as known
    /// repeats. BED starts are 0-based, so `chr1 99 200` covers the closed
    /// span `[100, 200]`. Columns past the third are ignored.
    ///
    pub fn from_bed_file(path: &Path) -> Result<Self> {
        let reader = get_dynamic_reader(path)
            .map_err(|e| CounterError::FileReadError(format!("{e:#}")))?;
        Self::from_bed_reader(reader, &path.display().to_string())
    }

    pub fn from_bed_reader<R: BufRead>(reader: R, label: &str) -> Result<Self> {
        let mut regions = Vec::new();
        let mut last_chr: Option<Arc<str>> = None;

        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            let trimmed = line.trim();
            if trimmed.is_empty()
                || trimmed.starts_with('#')
                || trimmed.starts_with("track")
                || trimmed.starts_with("browser")
            {
                continue;
            }

            let malformed = |reason: &str| CounterError::MalformedReportRow {
                file: label.to_string(),
                line: index + 1,
                reason: reason.to_string(),
            };

            let mut fields = trimmed.split('\t');
            let (Some(chr), Some(start), Some(end)) = (fields.next(), fields.next(), fields.next())
            else {
                return Err(malformed("expected at least 3 tab separated columns"));
            };
            let (Ok(start), Ok(end)) = (start.trim().parse::<Position>(), end.trim().parse::<Position>())
            else {
                return Err(malformed("start and end must be integers"));
            };
            let Some(start) = start.checked_add(1) else {
                return Err(malformed("start is out of range"));
            };

            let chr = match &last_chr {
                Some(last) if last.as_ref() == chr.trim() => Arc::clone(last),
                _ => {
                    let chr: Arc<str> = Arc::from(chr.trim());
                    last_chr = Some(Arc::clone(&chr));
                    chr
                }
            };
            regions.push(Interval::new(chr, start, end, None));
        }

        Ok(Self::union(regions))
    }

    ///
    /// Index of the region sharing at least one base with `[start, end]`. If
    /// several do, the leftmost one.
    ///
    pub fn find(&self, chr: &str, start: Position, end: Position) -> Option<usize> {
        let range = self.chromosomes.get(chr)?;
        let regions = &self.regions[range.clone()];
        // ends are sorted too, since the regions are disjoint
        let idx = regions.partition_point(|region| region.end < start);
        let region = regions.get(idx)?;
        region.intersects(start, end).then_some(range.start + idx)
    }

    pub fn overlaps(&self, chr: &str, start: Position, end: Position) -> bool {
        self.find(chr, start, end).is_some()
    }

    pub fn get(&self, idx: usize) -> Option<&Interval> {
        self.regions.get(idx)
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}
