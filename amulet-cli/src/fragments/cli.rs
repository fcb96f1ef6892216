use clap::{Arg, Command};

pub use amulet_counter::consts::FRAGMENTS_CMD;

use crate::options::add_run_args;

pub fn create_fragments_cli() -> Command {
    let cmd = Command::new(FRAGMENTS_CMD)
        .about("Count per-cell overlaps in a coordinate sorted fragment file, gzip'd or not.")
        .arg_required_else_help(true)
        .arg(
            Arg::new("fragments")
                .required(true)
                .help("Fragment file (e.g. fragments.tsv.gz)"),
        );
    add_run_args(cmd)
}
