use std::collections::BTreeMap;
use std::io::BufRead;
use std::path::Path;
use std::sync::Arc;

use fxhash::FxHashMap;

use amulet_core::utils::get_dynamic_reader;

use crate::consts::SELECTED_CELL_FLAG;
use crate::errors::{CounterError, Result};

///
/// Lookup from read barcode to cell id, restricted to selected cells.
///
/// Built from a comma separated table (plain or gzip'd) such as a 10x
/// `singlecell.csv`. A row is kept only when its is-cell column holds the
/// literal `1`, which also skips a header row.
///
#[derive(Debug, Default)]
pub struct BarcodeRegistry {
    cells: FxHashMap<String, Arc<str>>,
    barcodes: BTreeMap<Arc<str>, String>,
}

impl BarcodeRegistry {
    ///
    /// Load the registry from a barcode table.
    ///
    /// # Arguments
    /// - path: path to the table
    /// - barcode_col: column holding the barcode
    /// - cellid_col: column holding the cell id
    /// - iscell_col: column holding the selected-cell flag
    ///
    pub fn from_file(
        path: &Path,
        barcode_col: usize,
        cellid_col: usize,
        iscell_col: usize,
    ) -> Result<Self> {
        let reader = get_dynamic_reader(path)
            .map_err(|e| CounterError::FileReadError(format!("{e:#}")))?;
        Self::from_reader(reader, barcode_col, cellid_col, iscell_col)
    }

    pub fn from_reader<R: BufRead>(
        reader: R,
        barcode_col: usize,
        cellid_col: usize,
        iscell_col: usize,
    ) -> Result<Self> {
        let mut registry = BarcodeRegistry::default();
        let needed = barcode_col.max(cellid_col).max(iscell_col) + 1;

        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }

            let fields: Vec<&str> = line.split(',').collect();
            if fields.len() < needed {
                return Err(CounterError::MalformedBarcodeRow {
                    line: index + 1,
                    reason: format!("expected at least {needed} columns, found {}", fields.len()),
                });
            }

            if fields[iscell_col].trim() != SELECTED_CELL_FLAG {
                continue;
            }

            registry.insert(fields[barcode_col].trim(), fields[cellid_col].trim());
        }

        Ok(registry)
    }

    ///
    /// Register a barcode. A barcode seen twice keeps its last cell id; a cell
    /// id seen twice reports its last barcode in the summary.
    ///
    pub fn insert(&mut self, barcode: &str, cell_id: &str) {
        let cell_id: Arc<str> = self
            .barcodes
            .get_key_value(cell_id)
            .map(|(k, _)| Arc::clone(k))
            .unwrap_or_else(|| Arc::from(cell_id));

        self.cells.insert(barcode.to_string(), Arc::clone(&cell_id));
        self.barcodes.insert(cell_id, barcode.to_string());
    }

    pub fn cell_id(&self, barcode: &str) -> Option<&Arc<str>> {
        self.cells.get(barcode)
    }

    pub fn barcode(&self, cell_id: &str) -> Option<&str> {
        self.barcodes.get(cell_id).map(String::as_str)
    }

    /// Selected cell ids in sorted order.
    pub fn cell_ids(&self) -> impl Iterator<Item = &Arc<str>> {
        self.barcodes.keys()
    }

    pub fn n_barcodes(&self) -> usize {
        self.cells.len()
    }

    pub fn n_cells(&self) -> usize {
        self.barcodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}
