mod bam;
mod fragments;
mod multiplets;
mod options;

use anyhow::Result;
use clap::Command;
use env_logger::Env;

pub mod consts {
    pub const VERSION: &str = env!("CARGO_PKG_VERSION");
    pub const BIN_NAME: &str = "amulet";
}

fn build_parser() -> Command {
    Command::new(consts::BIN_NAME)
        .bin_name(consts::BIN_NAME)
        .version(consts::VERSION)
        .about("Count per-cell read overlaps in single-nucleus ATAC-seq data and call multiplets.")
        .subcommand_required(true)
        .subcommand(bam::cli::create_bam_cli())
        .subcommand(fragments::cli::create_fragments_cli())
        .subcommand(multiplets::cli::create_multiplets_cli())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let app = build_parser();
    let matches = app.get_matches();

    match matches.subcommand() {
        //
        // BAM INPUT
        //
        Some((bam::cli::BAM_CMD, matches)) => {
            bam::handlers::run_bam(matches)?;
        }

        //
        // FRAGMENT FILE INPUT
        //
        Some((fragments::cli::FRAGMENTS_CMD, matches)) => {
            fragments::handlers::run_fragments(matches)?;
        }

        //
        // MULTIPLET DETECTION
        //
        Some((multiplets::cli::MULTIPLETS_CMD, matches)) => {
            multiplets::handlers::run_multiplets(matches)?;
        }

        _ => unreachable!("Subcommand not found"),
    };

    Ok(())
}
