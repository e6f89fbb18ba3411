//! Band subset command.

use crate::SubsetArgs;
use anyhow::{Context, Result};

/// Prints the layout restricted to the selected bands.
pub fn run(args: SubsetArgs, verbose: bool) -> Result<()> {
    let sm = args.layout.build().context("Invalid layout")?;
    let subset = sm
        .create_subset_sample_model(&args.select)
        .with_context(|| format!("Cannot select bands {:?}", args.select))?;
    super::print_layout(subset.as_ref(), verbose);
    Ok(())
}
