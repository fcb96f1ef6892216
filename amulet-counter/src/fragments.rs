use std::io::BufRead;
use std::path::Path;
use std::sync::Arc;

use amulet_core::Position;
use amulet_core::utils::get_dynamic_reader;

use crate::errors::{CounterError, Result};
use crate::record::{AlignmentRecord, AlignmentSource};

///
/// Streams a 10x style fragment file, gzip'd or not:
///
/// | chr1 | 10000 | 10150 | AAACGAAAGCGCAATG-1 | 2 |
/// |------|-------|-------|--------------------|---|
///
/// Coordinates are 0-based half-open. Each fragment becomes a read pair
/// record covering the closed 1-based span `[start + 1, end]`. Lines starting
/// with `#` are skipped; the read support column is optional and ignored.
///
pub struct FragmentRecordSource<R: BufRead> {
    label: String,
    reader: R,
    line: String,
    line_number: usize,
    // consecutive fragments share one chromosome allocation
    last_chr: Option<Arc<str>>,
    done: bool,
}

impl FragmentRecordSource<std::io::BufReader<Box<dyn std::io::Read>>> {
    pub fn open(path: &Path) -> Result<Self> {
        let reader = get_dynamic_reader(path)
            .map_err(|e| CounterError::FileReadError(format!("{e:#}")))?;
        Ok(Self::new(reader, format!("fragment file {:?}", path)))
    }
}

impl<R: BufRead> FragmentRecordSource<R> {
    pub fn new(reader: R, label: String) -> Self {
        FragmentRecordSource {
            label,
            reader,
            line: String::new(),
            line_number: 0,
            last_chr: None,
            done: false,
        }
    }

    fn chromosome(&mut self, name: &str) -> Arc<str> {
        match &self.last_chr {
            Some(chr) if chr.as_ref() == name => Arc::clone(chr),
            _ => {
                let chr: Arc<str> = Arc::from(name);
                self.last_chr = Some(Arc::clone(&chr));
                chr
            }
        }
    }

    fn parse_line(&mut self) -> Result<AlignmentRecord> {
        let line = std::mem::take(&mut self.line);
        let mut parts = line.trim_end_matches(['\n', '\r']).split('\t');

        let fields = (parts.next(), parts.next(), parts.next(), parts.next());
        let (Some(chr), Some(start), Some(end), Some(barcode)) = fields else {
            return Err(self.malformed(&line));
        };

        let (Ok(start), Ok(end)) = (start.trim().parse::<Position>(), end.trim().parse::<Position>())
        else {
            return Err(self.malformed(&line));
        };
        let (Some(one_based_start), Some(length)) = (start.checked_add(1), end.checked_sub(start))
        else {
            return Err(self.malformed(&line));
        };

        let chr = self.chromosome(chr.trim());
        let barcode = barcode.trim();
        let barcode = (!barcode.is_empty()).then(|| barcode.to_string());

        self.line = line;
        Ok(AlignmentRecord::fragment(chr, one_based_start, length, barcode))
    }

    fn malformed(&self, line: &str) -> CounterError {
        CounterError::MalformedFragment {
            line: self.line_number,
            content: line.trim_end().to_string(),
        }
    }
}

impl<R: BufRead> Iterator for FragmentRecordSource<R> {
    type Item = Result<AlignmentRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        loop {
            self.line.clear();
            match self.reader.read_line(&mut self.line) {
                Ok(0) => {
                    self.done = true;
                    return None;
                }
                Ok(_) => {
                    self.line_number += 1;
                    let trimmed = self.line.trim();
                    if trimmed.is_empty() || trimmed.starts_with('#') {
                        continue;
                    }
                    return Some(self.parse_line());
                }
                Err(e) => {
                    self.done = true;
                    return Some(Err(e.into()));
                }
            }
        }
    }
}

impl<R: BufRead> AlignmentSource for FragmentRecordSource<R> {
    fn describe(&self) -> String {
        self.label.clone()
    }
}
