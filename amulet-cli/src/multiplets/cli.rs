use clap::{Arg, Command, arg};

pub use amulet_counter::consts::MULTIPLETS_CMD;

pub fn create_multiplets_cli() -> Command {
    Command::new(MULTIPLETS_CMD)
        .about("Call multiplets from the Overlaps.txt and OverlapSummary.txt of a counting run.")
        .arg_required_else_help(true)
        .arg(
            Arg::new("overlaps")
                .required(true)
                .help("Overlaps.txt written by the bam or fragments command"),
        )
        .arg(
            Arg::new("overlapsummary")
                .required(true)
                .help("OverlapSummary.txt written by the same run"),
        )
        .arg(
            Arg::new("outdir")
                .required(true)
                .help("Directory the multiplet reports are written to"),
        )
        .arg(arg!(--config <config> "TOML file with run settings; flags take precedence"))
        .arg(arg!(--rfilter <bed> "BED file of regions (e.g. known repeats) whose reads are ignored"))
        .arg(arg!(--q <q> "FDR threshold for calling a multiplet (default: 0.01)"))
        .arg(arg!(--qrep <q> "FDR threshold for inferring repetitive regions (default: 0.01)"))
        .arg(arg!(--"expected-overlap" <n> "Reads per position expected in one nucleus (default: 2)"))
        .arg(arg!(--"min-overlap" <bp> "Shortest overlap, in bases, to keep (default: 1)"))
}
