use std::io::BufRead;
use std::path::Path;

use fxhash::FxHashSet;

use amulet_core::utils::{first_field, get_dynamic_reader};

use crate::errors::{CounterError, Result};

///
/// Chromosomes eligible for overlap counting.
///
/// Read from a list with one chromosome per line; only the first tab or comma
/// separated token is used, so a `chrom.sizes` file works as is.
///
#[derive(Debug, Default, Clone)]
pub struct ChromosomeAllowlist {
    names: FxHashSet<String>,
}

impl ChromosomeAllowlist {
    pub fn from_file(path: &Path) -> Result<Self> {
        let reader = get_dynamic_reader(path)
            .map_err(|e| CounterError::FileReadError(format!("{e:#}")))?;
        Self::from_reader(reader)
    }

    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self> {
        let mut names = FxHashSet::default();
        for line in reader.lines() {
            let line = line?;
            if let Some(chr) = first_field(&line) {
                names.insert(chr.to_string());
            }
        }
        Ok(ChromosomeAllowlist { names })
    }

    pub fn contains(&self, chr: &str) -> bool {
        self.names.contains(chr)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for ChromosomeAllowlist {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        ChromosomeAllowlist {
            names: iter.into_iter().map(Into::into).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::*;
    use std::io::Cursor;

    #[rstest]
    fn test_chrom_sizes_file() {
        let sizes = "chr1\t248956422\nchr2\t242193529\n\nchrX,156040895\n";
        let allowlist = ChromosomeAllowlist::from_reader(Cursor::new(sizes)).unwrap();

        assert_eq!(allowlist.len(), 3);
        assert_eq!(allowlist.contains("chr1"), true);
        assert_eq!(allowlist.contains("chrX"), true);
        assert_eq!(allowlist.contains("chrM"), false);
    }

    #[rstest]
    fn test_from_iter() {
        let allowlist: ChromosomeAllowlist = ["chr1", "chr2"].into_iter().collect();
        assert_eq!(allowlist.contains("chr2"), true);
    }
}
