use std::sync::Arc;

use noodles::sam::alignment::record::Flags;

use amulet_core::Position;

use crate::errors::Result;

///
/// How a record's insert size is measured against the maximum.
///
/// BAM reads follow the `TLEN` convention (`end - start` of the closed span,
/// one less than the number of bases). Fragment files report the fragment
/// length itself, i.e. the number of bases.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpanLength {
    #[default]
    EndToEnd,
    Bases,
}

impl SpanLength {
    /// Length of the closed span `[start, end]`; `None` on overflow.
    pub fn measure(self, start: Position, end: Position) -> Option<Position> {
        let distance = end.checked_sub(start)?;
        match self {
            SpanLength::EndToEnd => Some(distance),
            SpanLength::Bases => distance.checked_add(1),
        }
    }
}

///
/// A decoded alignment, owning everything the overlap driver looks at.
///
/// Both input formats are mapped onto this shape so the driver applies one set
/// of filters regardless of where the reads came from.
///
#[derive(Debug, Clone, PartialEq)]
pub struct AlignmentRecord {
    /// Reference sequence name; `None` for unplaced reads.
    pub reference: Option<Arc<str>>,
    /// 1-based leftmost aligned base.
    pub alignment_start: Option<Position>,
    /// Inferred insert size (`TLEN`); negative on the rightmost mate.
    pub insert_size: i64,
    /// `None` when the aligner did not report one (`255`) or the format has none.
    pub mapq: Option<u8>,
    pub flags: Flags,
    pub mate_same_reference: bool,
    pub barcode: Option<String>,
    pub read_length: Option<usize>,
    pub span_length: SpanLength,
}

impl AlignmentRecord {
    ///
    /// A record as read from a fragment file: a forward, properly paired read
    /// pair on one reference, spanning `[start, start + insert_size - 1]`.
    ///
    pub fn fragment(
        reference: Arc<str>,
        start: Position,
        insert_size: i64,
        barcode: Option<String>,
    ) -> Self {
        AlignmentRecord {
            reference: Some(reference),
            alignment_start: Some(start),
            insert_size,
            mapq: None,
            flags: Flags::SEGMENTED | Flags::PROPERLY_SEGMENTED,
            mate_same_reference: true,
            barcode,
            read_length: None,
            span_length: SpanLength::Bases,
        }
    }

    /// Reference name and start, when the read is placed.
    pub fn placement(&self) -> Option<(&Arc<str>, Position)> {
        match (&self.reference, self.alignment_start) {
            (Some(chr), Some(start)) => Some((chr, start)),
            _ => None,
        }
    }
}

///
/// A pull-based stream of alignment records, exhausted once it yields `None`.
///
pub trait AlignmentSource: Iterator<Item = Result<AlignmentRecord>> {
    /// Short label for log messages.
    fn describe(&self) -> String;
}
