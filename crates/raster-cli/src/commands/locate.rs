//! Sample address lookup command.

use crate::LocateArgs;
use anyhow::{Context, Result};

/// Prints where one sample, or every band of one pixel, lives in the buffer.
pub fn run(args: LocateArgs, verbose: bool) -> Result<()> {
    let sm = args.layout.build().context("Invalid layout")?;
    if verbose {
        super::print_layout(sm.as_ref(), verbose);
    }

    let bands: Vec<usize> = match args.band {
        Some(band) => vec![band],
        None => (0..sm.num_bands()).collect(),
    };
    println!("pixel ({}, {})", args.x, args.y);
    for band in bands {
        let loc = sm
            .sample_location(args.x, args.y, band)
            .with_context(|| format!("Cannot locate band {band} of ({}, {})", args.x, args.y))?;
        println!("  band {band}: {loc}");
    }
    Ok(())
}
