//! The sample model contract.
//!
//! A [`SampleModel`] translates a pixel coordinate `(x, y[, band])` into
//! `(bank, index)` lookups on a [`DataBuffer`]. It never stores pixel data:
//! every accessor takes the buffer as an argument, so one buffer can be read
//! through several models (band subsets, child rasters) without copying.
//!
//! # Bounds
//!
//! All accessors use the half-open convention: a coordinate must lie in
//! `[0, width) x [0, height)`, a region must lie fully inside that area and a
//! band must be below [`SampleModel::num_bands`]. Violations return an error
//! before the buffer is touched.
//!
//! A buffer that is smaller than [`SampleModel::buffer_size`] or has fewer
//! than [`SampleModel::num_banks`] banks is the caller's mistake and panics on
//! access the way slice indexing does. [`crate::Raster`] verifies this once
//! when it pairs a model with a buffer.
//!
//! # Provided Methods
//!
//! Only the single-sample and single-pixel transfer operations are required.
//! Pixel, region and float/double forms are provided on top of them; layouts
//! override them where a direct address computation is cheaper.

use raster_core::{DataBuffer, DataType, Error, Rect, Result, TransferData, MAX_ELEMENTS};

/// Concrete layout family of a sample model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SampleModelKind {
    /// Per-band bank and offset with shared pixel and scanline strides.
    Component,
    /// Component layout with pixel stride 1, typically one bank per band.
    Banded,
    /// One band, several sub-element pixels packed per storage element.
    MultiPixelPacked,
    /// All bands of one pixel packed into one storage element by bit masks.
    SinglePixelPacked,
}

impl SampleModelKind {
    /// Short name for display.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Component => "component",
            Self::Banded => "banded",
            Self::MultiPixelPacked => "multi-pixel-packed",
            Self::SinglePixelPacked => "single-pixel-packed",
        }
    }
}

impl std::fmt::Display for SampleModelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Physical address of one sample.
///
/// The sample is `(buffer.bank_elem(bank, index) >> shift) & ((1 << bits) - 1)`
/// for the packed layouts; for component layouts `shift` is 0 and `bits` is
/// the element width, i.e. the whole element is the sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SampleLocation {
    /// Bank holding the sample
    pub bank: usize,
    /// Logical element index inside the bank
    pub index: usize,
    /// Right shift that moves the sample to bit 0
    pub shift: u32,
    /// Width of the sample in bits
    pub bits: u32,
}

impl std::fmt::Display for SampleLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "bank {} index {} shift {} bits {}",
            self.bank, self.index, self.shift, self.bits
        )
    }
}

/// Maps pixel coordinates onto a data buffer.
pub trait SampleModel: std::fmt::Debug + Send + Sync {
    /// Layout family.
    fn kind(&self) -> SampleModelKind;

    /// Width in pixels.
    fn width(&self) -> i32;

    /// Height in pixels.
    fn height(&self) -> i32;

    /// Number of bands per pixel.
    fn num_bands(&self) -> usize;

    /// Storage element type of the buffer this model addresses.
    fn data_type(&self) -> DataType;

    /// Element type of [`SampleModel::data_elements`] transfers.
    fn transfer_type(&self) -> DataType;

    /// Number of transfer elements per pixel.
    fn num_data_elements(&self) -> usize;

    /// Bits per sample for every band.
    fn sample_sizes(&self) -> Vec<u32>;

    /// Number of banks a buffer must have.
    fn num_banks(&self) -> usize;

    /// Number of elements each bank must expose.
    fn buffer_size(&self) -> usize;

    /// Address of one sample.
    fn sample_location(&self, x: i32, y: i32, band: usize) -> Result<SampleLocation>;

    /// Reads one sample as an integer.
    fn sample(&self, x: i32, y: i32, band: usize, data: &DataBuffer) -> Result<i32>;

    /// Writes one sample from an integer.
    fn set_sample(&self, x: i32, y: i32, band: usize, value: i32, data: &mut DataBuffer)
    -> Result<()>;

    /// Reads the raw elements of one pixel as [`SampleModel::transfer_type`] values.
    fn data_elements(&self, x: i32, y: i32, data: &DataBuffer) -> Result<TransferData>;

    /// Writes the raw elements of one pixel.
    ///
    /// `obj` must carry [`SampleModel::transfer_type`] elements and at least
    /// [`SampleModel::num_data_elements`] of them.
    fn set_data_elements(&self, x: i32, y: i32, obj: &TransferData, data: &mut DataBuffer)
    -> Result<()>;

    /// A model of the same kind and bands for a new size.
    fn create_compatible_sample_model(&self, width: i32, height: i32)
    -> Result<Box<dyn SampleModel>>;

    /// A model restricted to `bands`, in the given order, over the same buffer layout.
    fn create_subset_sample_model(&self, bands: &[usize]) -> Result<Box<dyn SampleModel>>;

    /// A zeroed buffer that exactly fits this model.
    fn create_data_buffer(&self) -> Result<DataBuffer>;

    /// Boxed copy of this model.
    fn clone_box(&self) -> Box<dyn SampleModel>;

    /// The model's area at the origin.
    fn bounds(&self) -> Rect {
        Rect::from_size(self.width(), self.height())
    }

    /// Bits per sample of `band`.
    fn sample_size(&self, band: usize) -> Result<u32> {
        check_band(band, self.num_bands())?;
        Ok(self.sample_sizes()[band])
    }

    /// Reads one sample as a float.
    fn sample_float(&self, x: i32, y: i32, band: usize, data: &DataBuffer) -> Result<f32> {
        Ok(self.sample(x, y, band, data)? as f32)
    }

    /// Writes one sample from a float through the integer path.
    fn set_sample_float(
        &self,
        x: i32,
        y: i32,
        band: usize,
        value: f32,
        data: &mut DataBuffer,
    ) -> Result<()> {
        self.set_sample(x, y, band, value as i32, data)
    }

    /// Reads one sample as a double.
    fn sample_double(&self, x: i32, y: i32, band: usize, data: &DataBuffer) -> Result<f64> {
        Ok(self.sample(x, y, band, data)? as f64)
    }

    /// Writes one sample from a double through the integer path.
    fn set_sample_double(
        &self,
        x: i32,
        y: i32,
        band: usize,
        value: f64,
        data: &mut DataBuffer,
    ) -> Result<()> {
        self.set_sample(x, y, band, value as i32, data)
    }

    /// Fills `out[..num_bands]` with all samples of one pixel in band order.
    fn pixel_into(&self, x: i32, y: i32, out: &mut [i32], data: &DataBuffer) -> Result<()> {
        let n = self.num_bands();
        check_len(n, out.len())?;
        for (band, slot) in out[..n].iter_mut().enumerate() {
            *slot = self.sample(x, y, band, data)?;
        }
        Ok(())
    }

    /// All samples of one pixel in band order.
    fn pixel(&self, x: i32, y: i32, data: &DataBuffer) -> Result<Vec<i32>> {
        let mut out = vec![0; self.num_bands()];
        self.pixel_into(x, y, &mut out, data)?;
        Ok(out)
    }

    /// All samples of one pixel as floats.
    fn pixel_float(&self, x: i32, y: i32, data: &DataBuffer) -> Result<Vec<f32>> {
        (0..self.num_bands())
            .map(|band| self.sample_float(x, y, band, data))
            .collect()
    }

    /// All samples of one pixel as doubles.
    fn pixel_double(&self, x: i32, y: i32, data: &DataBuffer) -> Result<Vec<f64>> {
        (0..self.num_bands())
            .map(|band| self.sample_double(x, y, band, data))
            .collect()
    }

    /// Writes all samples of one pixel from `pixel[..num_bands]`.
    fn set_pixel(&self, x: i32, y: i32, pixel: &[i32], data: &mut DataBuffer) -> Result<()> {
        let n = self.num_bands();
        check_len(n, pixel.len())?;
        check_coords(x, y, self.width(), self.height())?;
        for (band, &value) in pixel[..n].iter().enumerate() {
            self.set_sample(x, y, band, value, data)?;
        }
        Ok(())
    }

    /// Writes all samples of one pixel from doubles.
    fn set_pixel_double(&self, x: i32, y: i32, pixel: &[f64], data: &mut DataBuffer) -> Result<()> {
        let n = self.num_bands();
        check_len(n, pixel.len())?;
        check_coords(x, y, self.width(), self.height())?;
        for (band, &value) in pixel[..n].iter().enumerate() {
            self.set_sample_double(x, y, band, value, data)?;
        }
        Ok(())
    }

    /// Fills `out` with the pixels of `region` in raster-scan order, bands interleaved.
    fn pixels_into(&self, region: Rect, out: &mut [i32], data: &DataBuffer) -> Result<()> {
        check_region(region, self.width(), self.height())?;
        let n = self.num_bands();
        check_len(region.area() as usize * n, out.len())?;
        for ((x, y), chunk) in region.iter_coords().zip(out.chunks_exact_mut(n)) {
            self.pixel_into(x, y, chunk, data)?;
        }
        Ok(())
    }

    /// The pixels of `region` in raster-scan order, bands interleaved.
    fn pixels(&self, region: Rect, data: &DataBuffer) -> Result<Vec<i32>> {
        check_region(region, self.width(), self.height())?;
        let mut out = vec![0; region.area() as usize * self.num_bands()];
        self.pixels_into(region, &mut out, data)?;
        Ok(out)
    }

    /// The pixels of `region` as doubles.
    fn pixels_double(&self, region: Rect, data: &DataBuffer) -> Result<Vec<f64>> {
        check_region(region, self.width(), self.height())?;
        let n = self.num_bands();
        let mut out = Vec::with_capacity(region.area() as usize * n);
        for (x, y) in region.iter_coords() {
            for band in 0..n {
                out.push(self.sample_double(x, y, band, data)?);
            }
        }
        Ok(out)
    }

    /// Writes the pixels of `region` from raster-scan, band-interleaved `pixels`.
    fn set_pixels(&self, region: Rect, pixels: &[i32], data: &mut DataBuffer) -> Result<()> {
        check_region(region, self.width(), self.height())?;
        let n = self.num_bands();
        check_len(region.area() as usize * n, pixels.len())?;
        for ((x, y), chunk) in region.iter_coords().zip(pixels.chunks_exact(n)) {
            self.set_pixel(x, y, chunk, data)?;
        }
        Ok(())
    }

    /// Writes the pixels of `region` from doubles.
    fn set_pixels_double(&self, region: Rect, pixels: &[f64], data: &mut DataBuffer) -> Result<()> {
        check_region(region, self.width(), self.height())?;
        let n = self.num_bands();
        check_len(region.area() as usize * n, pixels.len())?;
        for ((x, y), chunk) in region.iter_coords().zip(pixels.chunks_exact(n)) {
            self.set_pixel_double(x, y, chunk, data)?;
        }
        Ok(())
    }

    /// Fills `out` with one band of `region` in raster-scan order.
    fn samples_into(
        &self,
        region: Rect,
        band: usize,
        out: &mut [i32],
        data: &DataBuffer,
    ) -> Result<()> {
        check_region(region, self.width(), self.height())?;
        check_band(band, self.num_bands())?;
        check_len(region.area() as usize, out.len())?;
        for ((x, y), slot) in region.iter_coords().zip(out.iter_mut()) {
            *slot = self.sample(x, y, band, data)?;
        }
        Ok(())
    }

    /// One band of `region` in raster-scan order.
    fn samples(&self, region: Rect, band: usize, data: &DataBuffer) -> Result<Vec<i32>> {
        check_region(region, self.width(), self.height())?;
        let mut out = vec![0; region.area() as usize];
        self.samples_into(region, band, &mut out, data)?;
        Ok(out)
    }

    /// Writes one band of `region` from raster-scan `samples`.
    fn set_samples(
        &self,
        region: Rect,
        band: usize,
        samples: &[i32],
        data: &mut DataBuffer,
    ) -> Result<()> {
        check_region(region, self.width(), self.height())?;
        check_band(band, self.num_bands())?;
        check_len(region.area() as usize, samples.len())?;
        for ((x, y), &value) in region.iter_coords().zip(samples) {
            self.set_sample(x, y, band, value, data)?;
        }
        Ok(())
    }

    /// Raw elements of every pixel in `region`, concatenated in raster-scan order.
    fn data_elements_rect(&self, region: Rect, data: &DataBuffer) -> Result<TransferData> {
        check_region(region, self.width(), self.height())?;
        let mut out = TransferData::zeroed(self.transfer_type(), 0);
        for (x, y) in region.iter_coords() {
            out.extend_from(&self.data_elements(x, y, data)?)?;
        }
        Ok(out)
    }

    /// Writes raw elements for every pixel in `region` from a concatenated vector.
    fn set_data_elements_rect(
        &self,
        region: Rect,
        obj: &TransferData,
        data: &mut DataBuffer,
    ) -> Result<()> {
        check_region(region, self.width(), self.height())?;
        let n = self.num_data_elements();
        obj.check(self.transfer_type(), region.area() as usize * n)?;
        for (k, (x, y)) in region.iter_coords().enumerate() {
            self.set_data_elements(x, y, &obj.slice(k * n, n), data)?;
        }
        Ok(())
    }
}

impl Clone for Box<dyn SampleModel> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// Rejects non-positive sizes and sizes whose pixel count leaves the 32-bit range.
pub(crate) fn check_dimensions(width: i32, height: i32) -> Result<()> {
    if width <= 0 || height <= 0 {
        return Err(Error::invalid_dimensions(
            width,
            height,
            "width and height must be > 0",
        ));
    }
    if width as u64 * height as u64 >= MAX_ELEMENTS as u64 {
        return Err(Error::invalid_dimensions(
            width,
            height,
            "pixel count exceeds the 32-bit element range",
        ));
    }
    Ok(())
}

#[inline]
pub(crate) fn check_coords(x: i32, y: i32, width: i32, height: i32) -> Result<()> {
    if x < 0 || y < 0 || x >= width || y >= height {
        return Err(Error::out_of_bounds(x, y, width, height));
    }
    Ok(())
}

#[inline]
pub(crate) fn check_region(region: Rect, width: i32, height: i32) -> Result<()> {
    let bounds = Rect::from_size(width, height);
    if !bounds.contains_rect(&region) {
        return Err(Error::invalid_region(region, bounds));
    }
    Ok(())
}

#[inline]
pub(crate) fn check_band(band: usize, num_bands: usize) -> Result<()> {
    if band >= num_bands {
        return Err(Error::band_out_of_range(band, num_bands));
    }
    Ok(())
}

#[inline]
pub(crate) fn check_len(needed: usize, got: usize) -> Result<()> {
    if got < needed {
        return Err(Error::array_too_small(needed, got));
    }
    Ok(())
}

/// Checked `a * b` within the element range.
#[inline]
pub(crate) fn mul_elements(a: usize, b: usize, what: &str) -> Result<usize> {
    a.checked_mul(b)
        .filter(|&v| v <= MAX_ELEMENTS)
        .ok_or_else(|| Error::overflow(format!("{what} exceeds the 32-bit element range")))
}

/// Checked `a + b` within the element range.
#[inline]
pub(crate) fn add_elements(a: usize, b: usize, what: &str) -> Result<usize> {
    a.checked_add(b)
        .filter(|&v| v <= MAX_ELEMENTS)
        .ok_or_else(|| Error::overflow(format!("{what} exceeds the 32-bit element range")))
}
