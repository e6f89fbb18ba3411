//! Rasters: a sample model paired with a buffer and placed on the plane.
//!
//! A [`Raster`] owns its [`DataBuffer`] and addresses it through a shared
//! [`SampleModel`]. Its bounds may start anywhere, including negative
//! coordinates; every accessor takes raster coordinates and translates them
//! to model coordinates.
//!
//! Child rasters ([`RasterView`], [`RasterViewMut`]) borrow the parent's
//! buffer, cover a sub-rectangle of it, may select a subset of bands and may
//! be moved to a new origin. Reads go through [`ReadRaster`], writes through
//! [`WriteRaster`]; both are implemented by the owner and the views.
//!
//! # Example
//!
//! ```rust
//! use raster_core::{DataType, Rect};
//! use raster_model::{Raster, ReadRaster, WriteRaster};
//!
//! let mut raster = Raster::create_interleaved(DataType::Byte, 8, 8, 3, -4, -4).unwrap();
//! raster.set_pixel(-4, -4, &[1, 2, 3]).unwrap();
//!
//! let child = raster.child(Rect::new(-4, -4, 2, 2), 0, 0, Some(&[2])).unwrap();
//! assert_eq!(child.sample(0, 0, 0).unwrap(), 3);
//! ```

use crate::{MultiPixelPackedSampleModel, SampleModel, SinglePixelPackedSampleModel};
use crate::{BandedSampleModel, ComponentSampleModel};
use raster_core::{DataBuffer, DataType, Error, Rect, Result, TransferData};
use std::sync::Arc;
use tracing::debug;

/// Where a raster's bounds sit relative to its sample model.
///
/// `(bounds.x, bounds.y)` in raster coordinates is `(model_x, model_y)` in
/// model coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Placement {
    /// Raster bounds
    pub bounds: Rect,
    /// Model column of the left bound
    pub model_x: i32,
    /// Model row of the top bound
    pub model_y: i32,
}

impl Placement {
    /// Bounds at `(x, y)` mapped onto the model origin.
    fn at(x: i32, y: i32, width: i32, height: i32) -> Result<Self> {
        let bounds = Rect::new(x, y, width, height);
        if bounds.right() > i32::MAX as i64 || bounds.bottom() > i32::MAX as i64 {
            return Err(Error::overflow(format!("raster bounds {bounds}")));
        }
        Ok(Self {
            bounds,
            model_x: 0,
            model_y: 0,
        })
    }

    /// Model coordinates of raster point `(x, y)`.
    pub fn to_model(&self, x: i32, y: i32) -> Result<(i32, i32)> {
        if !self.bounds.contains(x, y) {
            return Err(Error::out_of_bounds(
                x,
                y,
                self.bounds.width,
                self.bounds.height,
            ));
        }
        Ok((
            (x as i64 - self.bounds.x as i64 + self.model_x as i64) as i32,
            (y as i64 - self.bounds.y as i64 + self.model_y as i64) as i32,
        ))
    }

    /// Model rectangle of a raster region that must lie inside the bounds.
    pub fn region_to_model(&self, region: Rect) -> Result<Rect> {
        if !self.bounds.contains_rect(&region) {
            return Err(Error::invalid_region(region, self.bounds));
        }
        Ok(Rect::new(
            (region.x as i64 - self.bounds.x as i64 + self.model_x as i64) as i32,
            (region.y as i64 - self.bounds.y as i64 + self.model_y as i64) as i32,
            region.width,
            region.height,
        ))
    }
}

/// Read access in raster coordinates.
pub trait ReadRaster {
    /// The shared sample model.
    fn sample_model(&self) -> &Arc<dyn SampleModel>;

    /// The addressed buffer.
    fn data_buffer(&self) -> &DataBuffer;

    /// Bounds and model origin.
    fn placement(&self) -> Placement;

    /// Raster bounds.
    fn bounds(&self) -> Rect {
        self.placement().bounds
    }

    /// Left edge.
    fn min_x(&self) -> i32 {
        self.bounds().x
    }

    /// Top edge.
    fn min_y(&self) -> i32 {
        self.bounds().y
    }

    /// Width in pixels.
    fn width(&self) -> i32 {
        self.bounds().width
    }

    /// Height in pixels.
    fn height(&self) -> i32 {
        self.bounds().height
    }

    /// Bands per pixel.
    fn num_bands(&self) -> usize {
        self.sample_model().num_bands()
    }

    /// One sample as an integer.
    fn sample(&self, x: i32, y: i32, band: usize) -> Result<i32> {
        let (mx, my) = self.placement().to_model(x, y)?;
        self.sample_model().sample(mx, my, band, self.data_buffer())
    }

    /// One sample as a double.
    fn sample_double(&self, x: i32, y: i32, band: usize) -> Result<f64> {
        let (mx, my) = self.placement().to_model(x, y)?;
        self.sample_model()
            .sample_double(mx, my, band, self.data_buffer())
    }

    /// All samples of one pixel.
    fn pixel(&self, x: i32, y: i32) -> Result<Vec<i32>> {
        let (mx, my) = self.placement().to_model(x, y)?;
        self.sample_model().pixel(mx, my, self.data_buffer())
    }

    /// The pixels of `region`, raster-scan order, bands interleaved.
    fn pixels(&self, region: Rect) -> Result<Vec<i32>> {
        let region = self.placement().region_to_model(region)?;
        self.sample_model().pixels(region, self.data_buffer())
    }

    /// The pixels of `region` as doubles.
    fn pixels_double(&self, region: Rect) -> Result<Vec<f64>> {
        let region = self.placement().region_to_model(region)?;
        self.sample_model().pixels_double(region, self.data_buffer())
    }

    /// One band of `region`.
    fn samples(&self, region: Rect, band: usize) -> Result<Vec<i32>> {
        let region = self.placement().region_to_model(region)?;
        self.sample_model().samples(region, band, self.data_buffer())
    }

    /// Raw transfer elements of one pixel.
    fn data_elements(&self, x: i32, y: i32) -> Result<TransferData> {
        let (mx, my) = self.placement().to_model(x, y)?;
        self.sample_model().data_elements(mx, my, self.data_buffer())
    }

    /// A read-only child over `region`, placed at `(child_x, child_y)`.
    ///
    /// `bands` selects and reorders bands; `None` keeps all of them.
    fn child(
        &self,
        region: Rect,
        child_x: i32,
        child_y: i32,
        bands: Option<&[usize]>,
    ) -> Result<RasterView<'_>> {
        let (model, placement) = child_parts(self, region, child_x, child_y, bands)?;
        Ok(RasterView {
            model,
            buffer: self.data_buffer(),
            placement,
        })
    }
}

/// Write access in raster coordinates.
pub trait WriteRaster: ReadRaster {
    /// The model and the buffer, the latter mutably.
    fn parts_mut(&mut self) -> (&Arc<dyn SampleModel>, &mut DataBuffer);

    /// Writes one sample from an integer.
    fn set_sample(&mut self, x: i32, y: i32, band: usize, value: i32) -> Result<()> {
        let (mx, my) = self.placement().to_model(x, y)?;
        let (model, data) = self.parts_mut();
        model.set_sample(mx, my, band, value, data)
    }

    /// Writes one sample from a double.
    fn set_sample_double(&mut self, x: i32, y: i32, band: usize, value: f64) -> Result<()> {
        let (mx, my) = self.placement().to_model(x, y)?;
        let (model, data) = self.parts_mut();
        model.set_sample_double(mx, my, band, value, data)
    }

    /// Writes all samples of one pixel.
    fn set_pixel(&mut self, x: i32, y: i32, pixel: &[i32]) -> Result<()> {
        let (mx, my) = self.placement().to_model(x, y)?;
        let (model, data) = self.parts_mut();
        model.set_pixel(mx, my, pixel, data)
    }

    /// Writes the pixels of `region`.
    fn set_pixels(&mut self, region: Rect, pixels: &[i32]) -> Result<()> {
        let region = self.placement().region_to_model(region)?;
        let (model, data) = self.parts_mut();
        model.set_pixels(region, pixels, data)
    }

    /// Writes the pixels of `region` from doubles.
    fn set_pixels_double(&mut self, region: Rect, pixels: &[f64]) -> Result<()> {
        let region = self.placement().region_to_model(region)?;
        let (model, data) = self.parts_mut();
        model.set_pixels_double(region, pixels, data)
    }

    /// Writes one band of `region`.
    fn set_samples(&mut self, region: Rect, band: usize, samples: &[i32]) -> Result<()> {
        let region = self.placement().region_to_model(region)?;
        let (model, data) = self.parts_mut();
        model.set_samples(region, band, samples, data)
    }

    /// Writes the raw transfer elements of one pixel.
    fn set_data_elements(&mut self, x: i32, y: i32, obj: &TransferData) -> Result<()> {
        let (mx, my) = self.placement().to_model(x, y)?;
        let (model, data) = self.parts_mut();
        model.set_data_elements(mx, my, obj, data)
    }

    /// Copies `src`, moved by `(dx, dy)`, into the overlapping part of this raster.
    ///
    /// Samples are copied as integers, or as doubles when either side stores
    /// floating point. A source that does not overlap copies nothing.
    fn set_rect(&mut self, dx: i32, dy: i32, src: &dyn ReadRaster) -> Result<()> {
        if src.num_bands() != self.num_bands() {
            return Err(Error::invalid_argument(format!(
                "source has {} bands, destination {}",
                src.num_bands(),
                self.num_bands()
            )));
        }
        let moved = src
            .bounds()
            .translate(dx, dy)
            .ok_or_else(|| Error::overflow("translated source bounds"))?;
        let Some(overlap) = self.bounds().intersect(&moved) else {
            return Ok(());
        };
        let float =
            self.sample_model().data_type().is_float() || src.sample_model().data_type().is_float();
        debug!(%overlap, dx, dy, float, "copying raster rect");

        for row in 0..overlap.height {
            let dst_row = Rect::new(overlap.x, overlap.y + row, overlap.width, 1);
            let src_row = Rect::new(overlap.x - dx, overlap.y + row - dy, overlap.width, 1);
            if float {
                let px = src.pixels_double(src_row)?;
                self.set_pixels_double(dst_row, &px)?;
            } else {
                let px = src.pixels(src_row)?;
                self.set_pixels(dst_row, &px)?;
            }
        }
        Ok(())
    }

    /// A writable child over `region`, placed at `(child_x, child_y)`.
    fn child_mut(
        &mut self,
        region: Rect,
        child_x: i32,
        child_y: i32,
        bands: Option<&[usize]>,
    ) -> Result<RasterViewMut<'_>> {
        let (model, placement) = child_parts(&*self, region, child_x, child_y, bands)?;
        let (_, buffer) = self.parts_mut();
        Ok(RasterViewMut {
            model,
            buffer,
            placement,
        })
    }
}

fn child_parts<R: ReadRaster + ?Sized>(
    parent: &R,
    region: Rect,
    child_x: i32,
    child_y: i32,
    bands: Option<&[usize]>,
) -> Result<(Arc<dyn SampleModel>, Placement)> {
    let parent_placement = parent.placement();
    let origin = parent_placement.region_to_model(region)?;
    if region.is_empty() {
        return Err(Error::invalid_region(region, parent_placement.bounds));
    }
    let model = match bands {
        Some(bands) => Arc::from(parent.sample_model().create_subset_sample_model(bands)?),
        None => Arc::clone(parent.sample_model()),
    };
    let mut placement = Placement::at(child_x, child_y, region.width, region.height)?;
    placement.model_x = origin.x;
    placement.model_y = origin.y;
    debug!(%region, child_x, child_y, bands = model.num_bands(), "child raster");
    Ok((model, placement))
}

/// A sample model, its buffer and its bounds.
#[derive(Debug, Clone)]
pub struct Raster {
    model: Arc<dyn SampleModel>,
    buffer: DataBuffer,
    placement: Placement,
}

impl Raster {
    /// Pairs `model` with `buffer`, placing the model origin at `(x, y)`.
    ///
    /// # Errors
    ///
    /// [`Error::IncompatibleBuffer`] if the buffer has another element type,
    /// fewer banks or fewer elements than the model needs.
    pub fn new(model: Arc<dyn SampleModel>, buffer: DataBuffer, x: i32, y: i32) -> Result<Self> {
        check_buffer(model.as_ref(), &buffer)?;
        let placement = Placement::at(x, y, model.width(), model.height())?;
        debug!(
            kind = %model.kind(), bounds = %placement.bounds, bands = model.num_bands(),
            "raster"
        );
        Ok(Self {
            model,
            buffer,
            placement,
        })
    }

    /// A raster with a fresh buffer for `model`.
    pub fn with_model<M: SampleModel + 'static>(model: M, x: i32, y: i32) -> Result<Self> {
        let buffer = model.create_data_buffer()?;
        Self::new(Arc::new(model), buffer, x, y)
    }

    /// Pixel-interleaved raster, all bands in one bank.
    pub fn create_interleaved(
        data_type: DataType,
        width: i32,
        height: i32,
        bands: usize,
        x: i32,
        y: i32,
    ) -> Result<Self> {
        let sm = ComponentSampleModel::pixel_interleaved(data_type, width, height, bands)?;
        Self::with_model(sm, x, y)
    }

    /// Banded raster, one bank per band.
    pub fn create_banded(
        data_type: DataType,
        width: i32,
        height: i32,
        bands: usize,
        x: i32,
        y: i32,
    ) -> Result<Self> {
        let sm = BandedSampleModel::new(data_type, width, height, bands)?;
        Self::with_model(sm, x, y)
    }

    /// Single-pixel packed raster with the given band masks.
    pub fn create_packed(
        data_type: DataType,
        width: i32,
        height: i32,
        masks: &[u32],
        x: i32,
        y: i32,
    ) -> Result<Self> {
        let sm = SinglePixelPackedSampleModel::new(data_type, width, height, masks)?;
        Self::with_model(sm, x, y)
    }

    /// Packed raster from a band count and bits per band.
    ///
    /// A single band of 1, 2 or 4 bits packs several pixels per element;
    /// anything else packs one pixel per element with the first band in the
    /// most significant bits.
    pub fn create_packed_bits(
        data_type: DataType,
        width: i32,
        height: i32,
        bands: usize,
        bits_per_band: u32,
        x: i32,
        y: i32,
    ) -> Result<Self> {
        if bands == 0 || bits_per_band == 0 {
            return Err(Error::invalid_argument(format!(
                "{bands} bands of {bits_per_band} bits"
            )));
        }
        if bands == 1 && matches!(bits_per_band, 1 | 2 | 4) {
            let sm = MultiPixelPackedSampleModel::new(data_type, width, height, bits_per_band)?;
            return Self::with_model(sm, x, y);
        }
        let total = bands as u64 * bits_per_band as u64;
        if total > data_type.bits() as u64 {
            return Err(Error::invalid_argument(format!(
                "{bands} bands of {bits_per_band} bits do not fit {data_type} storage"
            )));
        }
        let mask = ((1u64 << bits_per_band) - 1) as u32;
        let masks: Vec<u32> = (0..bands as u32)
            .rev()
            .map(|k| mask << (k * bits_per_band))
            .collect();
        let sm = SinglePixelPackedSampleModel::new(data_type, width, height, &masks)?;
        Self::with_model(sm, x, y)
    }

    /// An empty raster of the same layout family at `(0, 0)`.
    pub fn create_compatible(&self, width: i32, height: i32) -> Result<Self> {
        let sm = self.model.create_compatible_sample_model(width, height)?;
        let buffer = sm.create_data_buffer()?;
        Self::new(Arc::from(sm), buffer, 0, 0)
    }

    /// Swaps in another buffer for the same model and returns the old one.
    ///
    /// The new buffer is checked like in [`Raster::new`]; on error the raster
    /// keeps its current buffer.
    pub fn replace_buffer(&mut self, buffer: DataBuffer) -> Result<DataBuffer> {
        check_buffer(self.model.as_ref(), &buffer)?;
        Ok(std::mem::replace(&mut self.buffer, buffer))
    }

    /// Splits into the model and the buffer.
    pub fn into_parts(self) -> (Arc<dyn SampleModel>, DataBuffer) {
        (self.model, self.buffer)
    }
}

fn check_buffer(model: &dyn SampleModel, buffer: &DataBuffer) -> Result<()> {
    if buffer.data_type() != model.data_type() {
        return Err(Error::incompatible_buffer(format!(
            "{} buffer for a {} model",
            buffer.data_type(),
            model.data_type()
        )));
    }
    if buffer.num_banks() < model.num_banks() {
        return Err(Error::incompatible_buffer(format!(
            "{} banks, model needs {}",
            buffer.num_banks(),
            model.num_banks()
        )));
    }
    if buffer.size() < model.buffer_size() {
        return Err(Error::incompatible_buffer(format!(
            "{} elements per bank, model needs {}",
            buffer.size(),
            model.buffer_size()
        )));
    }
    Ok(())
}

impl ReadRaster for Raster {
    fn sample_model(&self) -> &Arc<dyn SampleModel> {
        &self.model
    }

    fn data_buffer(&self) -> &DataBuffer {
        &self.buffer
    }

    fn placement(&self) -> Placement {
        self.placement
    }
}

impl WriteRaster for Raster {
    fn parts_mut(&mut self) -> (&Arc<dyn SampleModel>, &mut DataBuffer) {
        (&self.model, &mut self.buffer)
    }
}

/// Read-only child raster borrowing its parent's buffer.
#[derive(Debug, Clone)]
pub struct RasterView<'a> {
    model: Arc<dyn SampleModel>,
    buffer: &'a DataBuffer,
    placement: Placement,
}

impl ReadRaster for RasterView<'_> {
    fn sample_model(&self) -> &Arc<dyn SampleModel> {
        &self.model
    }

    fn data_buffer(&self) -> &DataBuffer {
        self.buffer
    }

    fn placement(&self) -> Placement {
        self.placement
    }
}

/// Writable child raster mutably borrowing its parent's buffer.
#[derive(Debug)]
pub struct RasterViewMut<'a> {
    model: Arc<dyn SampleModel>,
    buffer: &'a mut DataBuffer,
    placement: Placement,
}

impl ReadRaster for RasterViewMut<'_> {
    fn sample_model(&self) -> &Arc<dyn SampleModel> {
        &self.model
    }

    fn data_buffer(&self) -> &DataBuffer {
        self.buffer
    }

    fn placement(&self) -> Placement {
        self.placement
    }
}

impl WriteRaster for RasterViewMut<'_> {
    fn parts_mut(&mut self) -> (&Arc<dyn SampleModel>, &mut DataBuffer) {
        (&self.model, self.buffer)
    }
}
