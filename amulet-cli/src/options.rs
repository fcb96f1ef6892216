use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Arg, ArgMatches, Command, arg};
use log::error;

use amulet_counter::report::write_error_file;
use amulet_counter::{CounterInputs, MultipletConfig, OverlapConfig, parse_numeric_option};

///
/// The three positional inputs every subcommand shares after its alignment
/// file, plus the tuning options.
///
pub fn add_run_args(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("barcodes")
            .required(true)
            .help("Comma separated single cell table (e.g. singlecell.csv)"),
    )
    .arg(
        Arg::new("chromosomes")
            .required(true)
            .help("Chromosomes to count overlaps on, one name per line"),
    )
    .arg(
        Arg::new("outdir")
            .required(true)
            .help("Directory the reports are written to"),
    )
    .arg(arg!(--config <config> "TOML file with run settings; flags take precedence"))
    .arg(arg!(--"barcode-tag" <tag> "BAM tag holding the cell barcode (default: CB)"))
    .arg(arg!(--"barcode-col" <col> "0-based barcode column of the single cell table"))
    .arg(arg!(--"cellid-col" <col> "0-based cell id column of the single cell table"))
    .arg(arg!(--"iscell-col" <col> "0-based column flagging selected cells with 1"))
    .arg(arg!(--"min-mapq" <mapq> "Reads need a mapping quality above this (default: 30)"))
    .arg(arg!(--"max-insert-size" <size> "Longest fragment to keep (default: 900)"))
    .arg(arg!(--"expected-overlap" <n> "Reads per position expected in one nucleus (default: 2)"))
    .arg(arg!(--"start-bases" <n> "Bases added to each fragment start").allow_hyphen_values(true))
    .arg(arg!(--"end-bases" <n> "Bases added to each fragment end").allow_hyphen_values(true))
    .arg(arg!(--"force-sorted" "Trust the input to be coordinate sorted"))
}

pub fn counter_inputs(matches: &ArgMatches) -> Result<CounterInputs> {
    let path = |name: &str| -> Result<PathBuf> {
        matches
            .get_one::<String>(name)
            .map(PathBuf::from)
            .with_context(|| format!("A path for <{name}> is required."))
    };

    Ok(CounterInputs {
        barcodes: path("barcodes")?,
        chromosomes: path("chromosomes")?,
        outdir: path("outdir")?,
    })
}

///
/// Build the run settings: the `--config` file (or the defaults), then every
/// flag given on the command line on top.
///
pub fn resolve_config(matches: &ArgMatches) -> Result<OverlapConfig> {
    let mut config = match matches.get_one::<String>("config") {
        Some(path) => OverlapConfig::from_toml_file(Path::new(path))
            .with_context(|| format!("Failed to read config file {path}"))?,
        None => OverlapConfig::default(),
    };

    if let Some(tag) = matches.get_one::<String>("barcode-tag") {
        config.barcode_tag = tag.clone();
    }

    let numeric_flags: [(&str, &mut i64); 8] = [
        ("barcode-col", &mut config.barcode_col),
        ("cellid-col", &mut config.cellid_col),
        ("iscell-col", &mut config.iscell_col),
        ("min-mapq", &mut config.min_mapq),
        ("max-insert-size", &mut config.max_insert_size),
        ("expected-overlap", &mut config.expected_overlap),
        ("start-bases", &mut config.start_bases),
        ("end-bases", &mut config.end_bases),
    ];
    for (flag, field) in numeric_flags {
        if let Some(value) = matches.get_one::<String>(flag) {
            *field = parse_numeric_option(flag, value)?;
        }
    }

    if matches.get_flag("force-sorted") {
        config.force_sorted = true;
    }

    config.validate()?;
    Ok(config)
}

///
/// Multiplet settings: the `--config` file (or the defaults), then the flags
/// of the `multiplets` command on top.
///
pub fn resolve_multiplet_config(matches: &ArgMatches) -> Result<MultipletConfig> {
    let mut config = match matches.get_one::<String>("config") {
        Some(path) => MultipletConfig::from_toml_file(Path::new(path))
            .with_context(|| format!("Failed to read config file {path}"))?,
        None => MultipletConfig::default(),
    };

    if let Some(path) = matches.get_one::<String>("rfilter") {
        config.repeat_filter = Some(PathBuf::from(path));
    }
    if let Some(value) = matches.get_one::<String>("q") {
        config.q = parse_numeric_option("q", value)?;
    }
    if let Some(value) = matches.get_one::<String>("qrep") {
        config.q_repeat = parse_numeric_option("qrep", value)?;
    }
    if let Some(value) = matches.get_one::<String>("expected-overlap") {
        config.expected_overlap = parse_numeric_option("expected-overlap", value)?;
    }
    if let Some(value) = matches.get_one::<String>("min-overlap") {
        config.min_overlap = parse_numeric_option("min-overlap", value)?;
    }

    config.validate()?;
    Ok(config)
}

///
/// Run `f`, and if it fails leave the error chain in an `Error_<timestamp>.txt`
/// file in `outdir` before handing the error back.
///
pub fn with_error_file<F>(outdir: &Path, f: F) -> Result<()>
where
    F: FnOnce() -> Result<()>,
{
    let Err(err) = f() else {
        return Ok(());
    };

    let written =
        fs::create_dir_all(outdir).and_then(|_| write_error_file(outdir, &format!("{err:?}")));
    match written {
        Ok(path) => error!("Run failed, details written to {}", path.display()),
        Err(e) => error!("Run failed and the error file could not be written: {e}"),
    }

    Err(err)
}
