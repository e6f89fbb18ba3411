//! raster - Sample layout inspector
//!
//! Builds a sample model from command line flags and prints its geometry,
//! sample addresses, compatible layouts and band subsets.

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use raster_core::DataType;
use raster_model::{
    BandedSampleModel, ComponentSampleModel, MultiPixelPackedSampleModel, SampleModel,
    SinglePixelPackedSampleModel,
};
use tracing::debug;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "raster")]
#[command(author, version, about = "Inspect raster sample layouts")]
#[command(long_about = "
Builds a sample model from flags and reports how it addresses its buffer.

Examples:
  raster describe --width 4 --height 2 --bands 3
  raster describe -l banded --type ushort --width 640 --height 480 --bands 4
  raster locate -l packed-bits --width 10 --height 2 --bits 1 9 1
  raster locate -l packed --type int --width 8 --height 8 --masks 0xff0000,0xff00,0xff 3 3
  raster compatible --width 4 --height 4 --pixel-stride 4 --band-offsets 2,1,0 --to 8x2
  raster subset -l banded --width 4 --height 4 --bands 4 --select 3,1
")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output (debug logging, full layout dump)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Print a layout's geometry and buffer requirements
    #[command(visible_alias = "d")]
    Describe(DescribeArgs),

    /// Print the bank, element and bits holding a sample
    #[command(visible_alias = "loc")]
    Locate(LocateArgs),

    /// Print the compacted layout of the same kind for a new size
    Compatible(CompatibleArgs),

    /// Print the layout restricted to some bands
    Subset(SubsetArgs),
}

/// Layout family selected with `--layout`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LayoutKind {
    /// Per-band bank and offset with shared strides
    Component,
    /// One plane per band
    Banded,
    /// All bands in one element, selected by masks
    Packed,
    /// One band, several pixels per element
    PackedBits,
}

/// Flags shared by every subcommand that describe one layout.
#[derive(Args, Debug, Clone)]
struct LayoutArgs {
    /// Layout family
    #[arg(short, long, value_enum, default_value = "component")]
    layout: LayoutKind,

    /// Storage element type: byte, ushort, short, int, float, double
    #[arg(short = 't', long = "type", default_value = "byte")]
    data_type: DataType,

    /// Width in pixels
    #[arg(long)]
    width: i32,

    /// Height in pixels
    #[arg(long)]
    height: i32,

    /// Number of bands (component and banded layouts)
    #[arg(short, long, default_value = "1")]
    bands: usize,

    /// Elements between adjacent pixels (component layout)
    #[arg(long)]
    pixel_stride: Option<usize>,

    /// Elements between adjacent scanlines
    #[arg(long)]
    scanline_stride: Option<usize>,

    /// Comma separated offset of every band
    #[arg(long, value_delimiter = ',')]
    band_offsets: Vec<usize>,

    /// Comma separated bank of every band
    #[arg(long, value_delimiter = ',')]
    bank_indices: Vec<usize>,

    /// Bits per pixel (packed-bits layout)
    #[arg(long, default_value = "1")]
    bits: u32,

    /// Bit offset of the first pixel (packed-bits layout)
    #[arg(long, default_value = "0")]
    data_bit_offset: usize,

    /// Comma separated band masks, decimal or 0x hex (packed layout)
    #[arg(long, value_delimiter = ',', value_parser = parse_mask)]
    masks: Vec<u32>,
}

impl LayoutArgs {
    /// Builds the sample model these flags describe.
    fn build(&self) -> Result<Box<dyn SampleModel>> {
        let (dt, w, h) = (self.data_type, self.width, self.height);
        let sm: Box<dyn SampleModel> = match self.layout {
            LayoutKind::Component => {
                let n = if self.band_offsets.is_empty() {
                    self.bands
                } else {
                    self.band_offsets.len()
                };
                if self.pixel_stride.is_none()
                    && self.scanline_stride.is_none()
                    && self.band_offsets.is_empty()
                    && self.bank_indices.is_empty()
                {
                    Box::new(ComponentSampleModel::pixel_interleaved(dt, w, h, n)?)
                } else {
                    let pixel_stride = self.pixel_stride.unwrap_or(n);
                    let scanline_stride = self
                        .scanline_stride
                        .unwrap_or(w.max(0) as usize * pixel_stride);
                    let offsets = self.offsets_or(n, |band| band);
                    let banks = self.banks_or(n, |_| 0);
                    Box::new(ComponentSampleModel::with_banks(
                        dt,
                        w,
                        h,
                        pixel_stride,
                        scanline_stride,
                        &banks,
                        &offsets,
                    )?)
                }
            }
            LayoutKind::Banded => {
                let n = self.bands.max(self.band_offsets.len()).max(self.bank_indices.len());
                let scanline_stride = self.scanline_stride.unwrap_or(w.max(0) as usize);
                let offsets = self.offsets_or(n, |_| 0);
                let banks = self.banks_or(n, |band| band);
                Box::new(BandedSampleModel::with_layout(
                    dt,
                    w,
                    h,
                    scanline_stride,
                    &banks,
                    &offsets,
                )?)
            }
            LayoutKind::Packed => {
                if self.masks.is_empty() {
                    bail!("--masks is required for the packed layout");
                }
                let scanline_stride = self.scanline_stride.unwrap_or(w.max(0) as usize);
                Box::new(SinglePixelPackedSampleModel::with_stride(
                    dt,
                    w,
                    h,
                    scanline_stride,
                    &self.masks,
                )?)
            }
            LayoutKind::PackedBits => match self.scanline_stride {
                None if self.data_bit_offset == 0 => {
                    Box::new(MultiPixelPackedSampleModel::new(dt, w, h, self.bits)?)
                }
                stride => {
                    let Some(row_bits) = (w.max(0) as usize)
                        .checked_mul(self.bits as usize)
                        .and_then(|bits| bits.checked_add(self.data_bit_offset))
                    else {
                        bail!("--data-bit-offset {} overflows the row size", self.data_bit_offset);
                    };
                    let default = row_bits.div_ceil(dt.bits() as usize);
                    Box::new(MultiPixelPackedSampleModel::with_layout(
                        dt,
                        w,
                        h,
                        self.bits,
                        stride.unwrap_or(default),
                        self.data_bit_offset,
                    )?)
                }
            },
        };
        debug!(kind = %sm.kind(), width = w, height = h, bands = sm.num_bands(), "layout from flags");
        Ok(sm)
    }

    fn offsets_or(&self, n: usize, default: impl Fn(usize) -> usize) -> Vec<usize> {
        if self.band_offsets.is_empty() {
            (0..n).map(default).collect()
        } else {
            self.band_offsets.clone()
        }
    }

    fn banks_or(&self, n: usize, default: impl Fn(usize) -> usize) -> Vec<usize> {
        if self.bank_indices.is_empty() {
            (0..n).map(default).collect()
        } else {
            self.bank_indices.clone()
        }
    }
}

fn parse_mask(s: &str) -> std::result::Result<u32, String> {
    let s = s.trim();
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => s.parse(),
    };
    parsed.map_err(|e| format!("invalid mask '{s}': {e}"))
}

/// Parses `WIDTHxHEIGHT`.
fn parse_size(s: &str) -> std::result::Result<(i32, i32), String> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{s}'"))?;
    let w = w.trim().parse().map_err(|e| format!("invalid width '{w}': {e}"))?;
    let h = h.trim().parse().map_err(|e| format!("invalid height '{h}': {e}"))?;
    Ok((w, h))
}

/// Arguments for the `describe` command.
#[derive(Args)]
struct DescribeArgs {
    #[command(flatten)]
    layout: LayoutArgs,
}

/// Arguments for the `locate` command.
#[derive(Args)]
struct LocateArgs {
    #[command(flatten)]
    layout: LayoutArgs,

    /// Pixel column
    #[arg(allow_negative_numbers = true)]
    x: i32,

    /// Pixel row
    #[arg(allow_negative_numbers = true)]
    y: i32,

    /// Band to locate (all bands when omitted)
    #[arg(long)]
    band: Option<usize>,
}

/// Arguments for the `compatible` command.
#[derive(Args)]
struct CompatibleArgs {
    #[command(flatten)]
    layout: LayoutArgs,

    /// New size as WIDTHxHEIGHT
    #[arg(long, value_parser = parse_size)]
    to: (i32, i32),
}

/// Arguments for the `subset` command.
#[derive(Args)]
struct SubsetArgs {
    #[command(flatten)]
    layout: LayoutArgs,

    /// Comma separated bands to keep, in output order
    #[arg(long, value_delimiter = ',', required = true)]
    select: Vec<usize>,
}

fn init_logging(verbose: bool) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(if verbose { "debug" } else { "warn" })
            .context("Failed to build log filter")?,
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose)?;

    match cli.command {
        Commands::Describe(args) => commands::describe::run(args, cli.verbose),
        Commands::Locate(args) => commands::locate::run(args, cli.verbose),
        Commands::Compatible(args) => commands::compatible::run(args, cli.verbose),
        Commands::Subset(args) => commands::subset::run(args, cli.verbose),
    }
}
