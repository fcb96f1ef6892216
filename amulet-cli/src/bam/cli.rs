use clap::{Arg, Command};

pub use amulet_counter::consts::BAM_CMD;

use crate::options::add_run_args;

pub fn create_bam_cli() -> Command {
    let cmd = Command::new(BAM_CMD)
        .about("Count per-cell overlaps in a coordinate sorted, cell barcoded BAM file.")
        .arg_required_else_help(true)
        .arg(
            Arg::new("bam")
                .required(true)
                .help("Coordinate sorted BAM file (e.g. possorted_bam.bam)"),
        );
    add_run_args(cmd)
}
