//! # raster-core
//!
//! Core types for raster sample addressing.
//!
//! This crate provides the pieces every sample model builds on:
//!
//! - [`DataType`] - The six primitive element types and their bit widths
//! - [`DataBuffer`] - Typed, multi-bank backing store addressed by `(bank, index)`
//! - [`TransferData`] - Typed primitive vectors for raw pixel transfer
//! - [`Rect`] - Signed, half-open rectangles for regions and raster bounds
//! - [`Error`], [`Result`] - The failure taxonomy shared by all crates
//!
//! ## Crate Structure
//!
//! ```text
//! raster-core (this crate)
//!    ^
//!    |
//!    +-- raster-model (sample models, rasters)
//!    +-- raster-cli (layout inspector)
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod buffer;
pub mod error;
pub mod format;
pub mod rect;
pub mod transfer;

pub use buffer::{Banks, DataBuffer, Element, TrackState};
pub use error::{Error, Result};
pub use format::DataType;
pub use rect::Rect;
pub use transfer::TransferData;

/// Largest element count a single bank may address.
///
/// Sizes, strides and offsets are kept within the 32-bit signed range so
/// that layouts stay interchangeable with 32-bit indexing collaborators.
pub const MAX_ELEMENTS: usize = i32::MAX as usize;

/// Prelude module for convenient imports.
///
/// ```
/// use raster_core::prelude::*;
/// ```
pub mod prelude {
    pub use crate::buffer::{Banks, DataBuffer, TrackState};
    pub use crate::error::{Error, Result};
    pub use crate::format::DataType;
    pub use crate::rect::Rect;
    pub use crate::transfer::TransferData;
}
