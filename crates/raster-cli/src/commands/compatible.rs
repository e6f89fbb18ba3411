//! Compatible layout command.

use crate::CompatibleArgs;
use anyhow::{Context, Result};

/// Prints the layout of the same family that a buffer of the new size would use.
pub fn run(args: CompatibleArgs, verbose: bool) -> Result<()> {
    let sm = args.layout.build().context("Invalid layout")?;
    let (width, height) = args.to;
    let compatible = sm
        .create_compatible_sample_model(width, height)
        .with_context(|| format!("No compatible layout at {width}x{height}"))?;

    if verbose {
        super::print_layout(sm.as_ref(), verbose);
        println!();
    }
    super::print_layout(compatible.as_ref(), verbose);
    Ok(())
}
