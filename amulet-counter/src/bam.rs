use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{debug, warn};
use noodles::bam;
use noodles::bgzf;
use noodles::sam;
use noodles::sam::alignment::record::data::field::Value;
use noodles::sam::alignment::record::data::field::value::Array;
use noodles::sam::header::record::value::map::header::tag::SORT_ORDER;

use crate::errors::{CounterError, Result};
use crate::record::{AlignmentRecord, AlignmentSource, SpanLength};

const COORDINATE: &[u8] = b"coordinate";

///
/// Streams records out of a BAM file, one at a time.
///
/// The header must declare `SO:coordinate` unless `trust_sort_order` is set.
/// Reference names are resolved once from the header and shared between
/// records.
///
pub struct BamRecordSource {
    path: PathBuf,
    reader: bam::io::Reader<bgzf::Reader<File>>,
    reference_names: Vec<Arc<str>>,
    barcode_tag: [u8; 2],
    record: bam::Record,
    n_read: u64,
    done: bool,
}

impl BamRecordSource {
    pub fn open(path: &Path, barcode_tag: [u8; 2], trust_sort_order: bool) -> Result<Self> {
        let file = File::open(path).map_err(|e| {
            CounterError::FileReadError(format!("Failed to open BAM file {:?}: {e}", path))
        })?;
        let mut reader = bam::io::reader::Builder::default().build_from_reader(file);
        let header = reader.read_header()?;

        match sort_order(&header) {
            Some(so) if so == COORDINATE => {}
            so => {
                let so = so
                    .map(|s| String::from_utf8_lossy(s).into_owned())
                    .unwrap_or_else(|| "missing".to_string());
                if !trust_sort_order {
                    return Err(CounterError::UnsortedHeader(so));
                }
                warn!("BAM header declares SO:{so}; treating {:?} as coordinate sorted", path);
            }
        }

        let reference_names: Vec<Arc<str>> = header
            .reference_sequences()
            .keys()
            .map(|name| Arc::from(name.to_string()))
            .collect();
        debug!("{} reference sequences in {:?}", reference_names.len(), path);

        Ok(BamRecordSource {
            path: path.to_path_buf(),
            reader,
            reference_names,
            barcode_tag,
            record: bam::Record::default(),
            n_read: 0,
            done: false,
        })
    }

    fn reference_name(&self, id: Option<std::io::Result<usize>>) -> Result<Option<Arc<str>>> {
        match id {
            None => Ok(None),
            Some(Ok(idx)) => match self.reference_names.get(idx) {
                Some(name) => Ok(Some(Arc::clone(name))),
                None => Err(self.malformed(format!("reference sequence id {idx} not in header"))),
            },
            Some(Err(e)) => Err(self.malformed(format!("invalid reference sequence id: {e}"))),
        }
    }

    fn malformed(&self, reason: String) -> CounterError {
        CounterError::MalformedRecord {
            record: self.n_read,
            reason,
        }
    }

    fn decode(&self) -> Result<AlignmentRecord> {
        let record = &self.record;

        let reference_id = record.reference_sequence_id();
        let mate_reference_id = record.mate_reference_sequence_id();

        let mate_same_reference = match (&reference_id, &mate_reference_id) {
            (Some(Ok(a)), Some(Ok(b))) => a == b,
            (None, None) => true,
            _ => false,
        };

        let reference = self.reference_name(reference_id)?;

        let alignment_start = match record.alignment_start() {
            None => None,
            Some(Ok(position)) => Some(usize::from(position) as i64),
            Some(Err(e)) => return Err(self.malformed(format!("invalid alignment start: {e}"))),
        };

        let barcode = decode_barcode(record, &self.barcode_tag);

        Ok(AlignmentRecord {
            reference,
            alignment_start,
            insert_size: i64::from(record.template_length()),
            mapq: record.mapping_quality().map(|q| q.get()),
            flags: record.flags(),
            mate_same_reference,
            barcode,
            read_length: Some(record.sequence().len()),
            span_length: SpanLength::EndToEnd,
        })
    }
}

impl Iterator for BamRecordSource {
    type Item = Result<AlignmentRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        match self.reader.read_record(&mut self.record) {
            Ok(0) => {
                self.done = true;
                None
            }
            Ok(_) => {
                self.n_read += 1;
                Some(self.decode())
            }
            Err(e) => {
                self.done = true;
                Some(Err(e.into()))
            }
        }
    }
}

impl AlignmentSource for BamRecordSource {
    fn describe(&self) -> String {
        format!("BAM file {:?}", self.path)
    }
}

fn sort_order(header: &sam::Header) -> Option<&[u8]> {
    header
        .header()
        .and_then(|hd| hd.other_fields().get(&SORT_ORDER))
        .map(|so| so.as_ref())
}

///
/// Read the cell barcode from a record's aux data.
///
/// Accepts `Z` strings and `B:C` byte arrays; anything else, or a value that
/// is not valid UTF-8, counts as no barcode.
///
fn decode_barcode(record: &bam::Record, tag: &[u8; 2]) -> Option<String> {
    match record.data().get(tag) {
        Some(Ok(Value::String(value))) => std::str::from_utf8(value.as_ref())
            .ok()
            .map(str::to_string),
        Some(Ok(Value::Array(Array::UInt8(values)))) => {
            let bytes: Vec<u8> = values.iter().collect::<std::io::Result<Vec<_>>>().ok()?;
            String::from_utf8(bytes).ok()
        }
        Some(Ok(_)) | Some(Err(_)) | None => None,
    }
}
