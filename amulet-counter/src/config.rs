use std::fs::read_to_string;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Deserialize;
use thiserror::Error;

use amulet_core::utils::format_float;

use crate::consts::*;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value for {field}: {value:?}. Please use a number")]
    InvalidNumber { field: String, value: String },
    #[error("Invalid barcode tag {0:?}. It must be exactly two ASCII letters or digits")]
    InvalidBarcodeTag(String),
    #[error("Expected overlap must be zero or greater, got {0}")]
    NegativeExpectedOverlap(i64),
    #[error("Maximum insert size must be greater than zero")]
    ZeroMaxInsertSize,
    #[error("Column indexes must be zero or greater, got {field} = {value}")]
    NegativeColumn { field: String, value: i64 },
    #[error("{field} = {value} is out of range, it must lie within -{limit}..={limit}")]
    CorrectionOutOfRange {
        field: String,
        value: i64,
        limit: i64,
    },
    #[error("{field} must lie in (0, 1], got {value}")]
    InvalidProbability { field: String, value: f64 },
    #[error("Minimum overlap length must be zero or greater, got {0}")]
    NegativeMinOverlap(i64),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Toml(#[from] toml::de::Error),
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

///
/// Settings for one overlap counting run.
///
/// Every field has a default, so a TOML file only needs the values it
/// changes:
///
/// ```toml
/// barcode_tag = "CB"
/// min_mapq = 30
/// max_insert_size = 900
/// expected_overlap = 2
/// ```
///
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct OverlapConfig {
    /// Two-letter BAM tag holding the cell barcode.
    pub barcode_tag: String,
    pub barcode_col: i64,
    pub cellid_col: i64,
    /// Column whose value `1` marks a row as a selected cell.
    pub iscell_col: i64,
    /// Reads must have a mapping quality strictly above this.
    pub min_mapq: i64,
    pub max_insert_size: i64,
    pub expected_overlap: i64,
    /// Bases added to the fragment start (fragment trimming).
    pub start_bases: i64,
    /// Bases added to the fragment end.
    pub end_bases: i64,
    /// Skip the sort order checks.
    pub force_sorted: bool,
}

impl Default for OverlapConfig {
    fn default() -> Self {
        OverlapConfig {
            barcode_tag: DEFAULT_BARCODE_TAG.to_string(),
            barcode_col: DEFAULT_BARCODE_COL,
            cellid_col: DEFAULT_CELLID_COL,
            iscell_col: DEFAULT_ISCELL_COL,
            min_mapq: DEFAULT_MIN_MAPQ,
            max_insert_size: DEFAULT_MAX_INSERT_SIZE,
            expected_overlap: DEFAULT_EXPECTED_OVERLAP,
            start_bases: 0,
            end_bases: 0,
            force_sorted: false,
        }
    }
}

impl OverlapConfig {
    pub fn from_toml_file(path: &Path) -> ConfigResult<Self> {
        let toml_str = read_to_string(path)?;
        let config = toml::from_str(&toml_str)?;
        Ok(config)
    }

    ///
    /// Check the settings before any input is opened.
    ///
    pub fn validate(&self) -> ConfigResult<()> {
        let tag = self.barcode_tag.as_bytes();
        if tag.len() != 2 || !tag.iter().all(u8::is_ascii_alphanumeric) {
            return Err(ConfigError::InvalidBarcodeTag(self.barcode_tag.clone()));
        }

        for (field, value) in [
            ("barcode_col", self.barcode_col),
            ("cellid_col", self.cellid_col),
            ("iscell_col", self.iscell_col),
        ] {
            if value < 0 {
                return Err(ConfigError::NegativeColumn {
                    field: field.to_string(),
                    value,
                });
            }
        }

        if self.expected_overlap < 0 {
            return Err(ConfigError::NegativeExpectedOverlap(self.expected_overlap));
        }

        if self.max_insert_size <= 0 {
            return Err(ConfigError::ZeroMaxInsertSize);
        }

        // a correction larger than any kept fragment can only empty the interval
        for (field, value) in [
            ("start_bases", self.start_bases),
            ("end_bases", self.end_bases),
        ] {
            if value.checked_abs().is_none_or(|v| v > self.max_insert_size) {
                return Err(ConfigError::CorrectionOutOfRange {
                    field: field.to_string(),
                    value,
                    limit: self.max_insert_size,
                });
            }
        }

        Ok(())
    }

    /// Minimum coverage for a position to count as an overlap.
    pub fn threshold(&self) -> u32 {
        self.expected_overlap.clamp(0, i64::from(u32::MAX) - 1) as u32 + 1
    }

    pub fn barcode_tag_bytes(&self) -> ConfigResult<[u8; 2]> {
        match self.barcode_tag.as_bytes() {
            [a, b] if a.is_ascii_alphanumeric() && b.is_ascii_alphanumeric() => Ok([*a, *b]),
            _ => Err(ConfigError::InvalidBarcodeTag(self.barcode_tag.clone())),
        }
    }

    /// The barcode table columns as indexes; call after [`OverlapConfig::validate`].
    pub fn columns(&self) -> (usize, usize, usize) {
        (
            self.barcode_col.max(0) as usize,
            self.cellid_col.max(0) as usize,
            self.iscell_col.max(0) as usize,
        )
    }
}

///
/// Settings for multiplet detection over the overlap reports of a finished
/// counting run. Like [`OverlapConfig`] every field has a default, and the
/// two can share one TOML file:
///
/// ```toml
/// expected_overlap = 2
/// q = 0.01
/// q_repeat = 0.01
/// min_overlap = 1
/// repeat_filter = "blacklist.bed"
/// ```
///
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct MultipletConfig {
    /// Cells with an adjusted p-value below this are called multiplets.
    pub q: f64,
    /// Merged regions with an adjusted p-value below this are treated as repeats.
    pub q_repeat: f64,
    pub expected_overlap: i64,
    /// Overlap regions shorter than this many bases are dropped.
    pub min_overlap: i64,
    /// BED file of regions (e.g. known repeats) whose reads are ignored.
    pub repeat_filter: Option<PathBuf>,
}

impl Default for MultipletConfig {
    fn default() -> Self {
        MultipletConfig {
            q: DEFAULT_Q_THRESHOLD,
            q_repeat: DEFAULT_Q_REPEAT_THRESHOLD,
            expected_overlap: DEFAULT_EXPECTED_OVERLAP,
            min_overlap: DEFAULT_MIN_OVERLAP,
            repeat_filter: None,
        }
    }
}

impl MultipletConfig {
    pub fn from_toml_file(path: &Path) -> ConfigResult<Self> {
        let toml_str = read_to_string(path)?;
        let config = toml::from_str(&toml_str)?;
        Ok(config)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        for (field, value) in [("q", self.q), ("q_repeat", self.q_repeat)] {
            if !(value > 0.0 && value <= 1.0) {
                return Err(ConfigError::InvalidProbability {
                    field: field.to_string(),
                    value,
                });
            }
        }

        if self.expected_overlap < 0 {
            return Err(ConfigError::NegativeExpectedOverlap(self.expected_overlap));
        }

        if self.min_overlap < 0 {
            return Err(ConfigError::NegativeMinOverlap(self.min_overlap));
        }

        Ok(())
    }

    /// Minimum number of distinct reads for a position to count as an overlap.
    pub fn threshold(&self) -> u32 {
        self.expected_overlap.clamp(0, i64::from(u32::MAX) - 1) as u32 + 1
    }

    ///
    /// Suffix naming the multiplet call files: the digits after the decimal
    /// point of `q`, so `0.01` gives `MultipletCellIds_01.txt`.
    ///
    pub fn file_suffix(&self) -> String {
        let q = format_float(self.q);
        match q.split_once('.') {
            Some((_, fraction)) => fraction.to_string(),
            None => q,
        }
    }
}

///
/// Parse a numeric command line or config value, naming the offending field
/// on failure.
///
pub fn parse_numeric_option<T: FromStr>(field: &str, value: &str) -> ConfigResult<T> {
    value
        .trim()
        .parse::<T>()
        .map_err(|_| ConfigError::InvalidNumber {
            field: field.to_string(),
            value: value.to_string(),
        })
}
