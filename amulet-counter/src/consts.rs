pub const BAM_CMD: &str = "bam";
pub const FRAGMENTS_CMD: &str = "fragments";
pub const MULTIPLETS_CMD: &str = "multiplets";

pub const DEFAULT_BARCODE_TAG: &str = "CB";
pub const DEFAULT_BARCODE_COL: i64 = 0;
pub const DEFAULT_CELLID_COL: i64 = 0;
pub const DEFAULT_ISCELL_COL: i64 = 9;
pub const DEFAULT_MIN_MAPQ: i64 = 30;
pub const DEFAULT_MAX_INSERT_SIZE: i64 = 900;
pub const DEFAULT_EXPECTED_OVERLAP: i64 = 2;
pub const DEFAULT_Q_THRESHOLD: f64 = 0.01;
pub const DEFAULT_Q_REPEAT_THRESHOLD: f64 = 0.01;
pub const DEFAULT_MIN_OVERLAP: i64 = 1;

pub const SELECTED_CELL_FLAG: &str = "1";

pub const OVERLAPS_FILE: &str = "Overlaps.txt";
pub const OVERLAP_SUMMARY_FILE: &str = "OverlapSummary.txt";
pub const STAT_SUMMARY_FILE: &str = "StatSummary.txt";
pub const RUN_TIME_FILE: &str = "RunTime.txt";
pub const ERROR_FILE_PREFIX: &str = "Error";

pub const MULTIPLET_CELL_IDS_PREFIX: &str = "MultipletCellIds";
pub const MULTIPLET_BARCODES_PREFIX: &str = "MultipletBarcodes";
pub const MULTIPLET_PROBABILITIES_FILE: &str = "MultipletProbabilities.txt";
pub const MULTIPLET_SUMMARY_FILE: &str = "MultipletSummary.txt";

pub const PROGRESS_INTERVAL: u64 = 100_000;
