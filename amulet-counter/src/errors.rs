use thiserror::Error;

use amulet_core::Position;

use crate::config::ConfigError;

#[derive(Error, Debug)]
pub enum CounterError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(
        "Input is not coordinate sorted: {chr}:{start} follows {chr}:{previous}. If the input is sorted, use --force-sorted"
    )]
    UnsortedInput {
        chr: String,
        start: Position,
        previous: Position,
    },

    #[error(
        "Input is not coordinate sorted: {chr} appears again after {current}. If the input is sorted, use --force-sorted"
    )]
    ChromosomeRevisited { chr: String, current: String },

    #[error(
        "The input BAM file must be coordinate sorted (found SO:{0}). If the file is sorted, use --force-sorted"
    )]
    UnsortedHeader(String),

    #[error("Malformed barcode table row at line {line}: {reason}")]
    MalformedBarcodeRow { line: usize, reason: String },

    #[error("Failed to parse fragments file at line {line}: {content}")]
    MalformedFragment { line: usize, content: String },

    #[error("Malformed row in {file} at line {line}: {reason}")]
    MalformedReportRow {
        file: String,
        line: usize,
        reason: String,
    },

    #[error("Malformed BAM record #{record}: {reason}")]
    MalformedRecord { record: u64, reason: String },

    #[error("Invalid progress bar template: {0}")]
    ProgressTemplate(#[from] indicatif::style::TemplateError),

    #[error("Can't read file: {0}")]
    FileReadError(String),
}

pub type Result<T> = std::result::Result<T, CounterError>;
