//! # raster-model
//!
//! Sample models: the addressing layer between pixel coordinates and typed
//! data buffers.
//!
//! A sample model answers one question, "which bits of which element of which
//! bank hold band `b` of pixel `(x, y)`", for four layout families:
//!
//! - [`ComponentSampleModel`] - per-band bank and offset, shared pixel and scanline strides
//! - [`BandedSampleModel`] - component layout with pixel stride 1, one plane per band
//! - [`MultiPixelPackedSampleModel`] - one band, several pixels per element
//! - [`SinglePixelPackedSampleModel`] - all bands of a pixel in one element, selected by masks
//!
//! All four implement the [`SampleModel`] trait. [`Raster`] pairs a model with
//! a buffer and an origin, and hands out child views over sub-regions.
//!
//! # Example
//!
//! ```rust
//! use raster_core::{DataType, Rect};
//! use raster_model::{BandedSampleModel, SampleModel};
//!
//! let sm = BandedSampleModel::new(DataType::Byte, 4, 2, 3).unwrap();
//! let mut buf = sm.create_data_buffer().unwrap();
//!
//! sm.set_sample(2, 1, 1, 200, &mut buf).unwrap();
//! assert_eq!(sm.pixel(2, 1, &buf).unwrap(), vec![0, 200, 0]);
//! assert_eq!(sm.samples(Rect::new(0, 1, 4, 1), 1, &buf).unwrap(), vec![0, 0, 200, 0]);
//! ```
//!
//! # Logging
//!
//! Model construction is traced at `trace` level; derived layouts, buffer
//! allocation and raster assembly at `debug`. Per-sample accessors never log.

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod banded;
pub mod component;
pub mod model;
pub mod multi_packed;
pub mod raster;
pub mod single_packed;

pub use banded::BandedSampleModel;
pub use component::ComponentSampleModel;
pub use model::{SampleLocation, SampleModel, SampleModelKind};
pub use multi_packed::MultiPixelPackedSampleModel;
pub use raster::{Placement, Raster, RasterView, RasterViewMut, ReadRaster, WriteRaster};
pub use single_packed::SinglePixelPackedSampleModel;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::{
        BandedSampleModel, ComponentSampleModel, MultiPixelPackedSampleModel, Raster,
        ReadRaster, SampleModel, SinglePixelPackedSampleModel, WriteRaster,
    };
    pub use raster_core::prelude::*;
}
