pub mod interval;
pub mod overlap_region;

// re-export for cleaner imports
pub use self::interval::{Interval, Position};
pub use self::overlap_region::{MappingQualityStats, OverlapRegion};
