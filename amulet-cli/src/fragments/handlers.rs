use std::path::Path;

use anyhow::{Context, Result};
use clap::ArgMatches;
use log::info;

use amulet_counter::count_fragment_overlaps;

use crate::options::{counter_inputs, resolve_config, with_error_file};

pub fn run_fragments(matches: &ArgMatches) -> Result<()> {
    let fragments = matches
        .get_one::<String>("fragments")
        .context("A path to a fragment file is required.")?;
    let inputs = counter_inputs(matches)?;

    with_error_file(&inputs.outdir, || {
        let config = resolve_config(matches)?;
        let summary = count_fragment_overlaps(Path::new(fragments), &inputs, &config)?;
        info!(
            "Found {} overlaps in {} cells, reports are in {}",
            summary.overlaps,
            summary.cells,
            inputs.outdir.display()
        );
        Ok(())
    })
}
