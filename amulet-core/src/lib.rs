//! Core types shared across the amulet crates.
//!
//! The overlap engine works on [`Interval`]s (one per accepted read pair) and
//! produces [`OverlapRegion`]s (maximal spans where enough intervals pile up,
//! together with the intervals that make them up).
pub mod models;
pub mod utils;

// re-exports
pub use models::{Interval, MappingQualityStats, OverlapRegion, Position};
