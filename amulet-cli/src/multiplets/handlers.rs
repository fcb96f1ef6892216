use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::ArgMatches;
use log::info;

use amulet_counter::{MultipletInputs, detect_multiplets};

use crate::options::{resolve_multiplet_config, with_error_file};

pub fn run_multiplets(matches: &ArgMatches) -> Result<()> {
    let path = |name: &str| -> Result<PathBuf> {
        matches
            .get_one::<String>(name)
            .map(PathBuf::from)
            .with_context(|| format!("A path for <{name}> is required."))
    };
    let inputs = MultipletInputs {
        overlaps: path("overlaps")?,
        overlap_summary: path("overlapsummary")?,
        outdir: path("outdir")?,
    };

    with_error_file(&inputs.outdir, || {
        let config = resolve_multiplet_config(matches)?;
        let summary = detect_multiplets(&inputs, &config)?;
        info!(
            "{} of {} cells are multiplets, reports are in {}",
            summary.multiplets,
            summary.cells,
            inputs.outdir.display()
        );
        Ok(())
    })
}
