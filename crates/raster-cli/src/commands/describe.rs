//! Layout description command.

use crate::DescribeArgs;
use anyhow::{Context, Result};

/// Builds the layout and prints its geometry and buffer requirements.
pub fn run(args: DescribeArgs, verbose: bool) -> Result<()> {
    let sm = args.layout.build().context("Invalid layout")?;
    super::print_layout(sm.as_ref(), verbose);
    Ok(())
}
