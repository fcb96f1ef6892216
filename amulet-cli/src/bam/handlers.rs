use std::path::Path;

use anyhow::{Context, Result};
use clap::ArgMatches;
use log::info;

use amulet_counter::count_bam_overlaps;

use crate::options::{counter_inputs, resolve_config, with_error_file};

pub fn run_bam(matches: &ArgMatches) -> Result<()> {
    let bam = matches
        .get_one::<String>("bam")
        .context("A path to a BAM file is required.")?;
    let inputs = counter_inputs(matches)?;

    with_error_file(&inputs.outdir, || {
        let config = resolve_config(matches)?;
        let summary = count_bam_overlaps(Path::new(bam), &inputs, &config)?;
        info!(
            "Found {} overlaps in {} cells, reports are in {}",
            summary.overlaps,
            summary.cells,
            inputs.outdir.display()
        );
        Ok(())
    })
}
