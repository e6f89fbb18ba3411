//! Component-interleaved layout.
//!
//! Each band has its own bank index and band offset; all bands share a pixel
//! stride and a scanline stride. The element holding sample `band` of pixel
//! `(x, y)` is
//!
//! ```text
//! bank  = bank_indices[band]
//! index = y * scanline_stride + x * pixel_stride + band_offsets[band]
//! ```
//!
//! This covers pixel-interleaved RGB (`pixel_stride = 3`, offsets `0, 1, 2`),
//! planar layouts in one bank (`pixel_stride = 1`, offsets `w*h` apart) and
//! one-bank-per-band layouts alike.
//!
//! # Example
//!
//! ```rust
//! use raster_core::DataType;
//! use raster_model::{ComponentSampleModel, SampleModel};
//!
//! let sm = ComponentSampleModel::pixel_interleaved(DataType::Byte, 4, 2, 3).unwrap();
//! let mut buf = sm.create_data_buffer().unwrap();
//! sm.set_pixel(1, 1, &[10, 20, 30], &mut buf).unwrap();
//! assert_eq!(buf.elem(12 + 3 + 1), 20);
//! ```

use crate::model::{
    add_elements, check_band, check_coords, check_dimensions, check_len, check_region,
    mul_elements, SampleLocation, SampleModel, SampleModelKind,
};
use raster_core::{DataBuffer, DataType, Error, Rect, Result, TransferData, MAX_ELEMENTS};
use tracing::{debug, trace};

/// Sample model with per-band bank/offset and shared strides.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ComponentSampleModel {
    data_type: DataType,
    width: i32,
    height: i32,
    pixel_stride: usize,
    scanline_stride: usize,
    bank_indices: Vec<usize>,
    band_offsets: Vec<usize>,
    num_banks: usize,
    buffer_size: usize,
}

impl ComponentSampleModel {
    /// All bands in bank 0 at the given offsets.
    pub fn new(
        data_type: DataType,
        width: i32,
        height: i32,
        pixel_stride: usize,
        scanline_stride: usize,
        band_offsets: &[usize],
    ) -> Result<Self> {
        let bank_indices = vec![0; band_offsets.len()];
        Self::with_banks(
            data_type,
            width,
            height,
            pixel_stride,
            scanline_stride,
            &bank_indices,
            band_offsets,
        )
    }

    /// Full constructor with a bank index and an offset per band.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidDimensions`] for a non-positive or oversized area
    /// - [`Error::InvalidArgument`] for zero bands or mismatched array lengths
    /// - [`Error::Overflow`] if the required buffer size leaves the 32-bit range
    pub fn with_banks(
        data_type: DataType,
        width: i32,
        height: i32,
        pixel_stride: usize,
        scanline_stride: usize,
        bank_indices: &[usize],
        band_offsets: &[usize],
    ) -> Result<Self> {
        check_dimensions(width, height)?;
        if band_offsets.is_empty() {
            return Err(Error::invalid_argument("must have at least one band"));
        }
        if bank_indices.len() != band_offsets.len() {
            return Err(Error::invalid_argument(format!(
                "{} bank indices for {} band offsets",
                bank_indices.len(),
                band_offsets.len()
            )));
        }
        let buffer_size =
            component_buffer_size(width, height, pixel_stride, scanline_stride, band_offsets)?;
        let num_banks = bank_indices.iter().max().copied().unwrap_or(0) + 1;
        trace!(
            %data_type, width, height, pixel_stride, scanline_stride, bands = band_offsets.len(),
            "component sample model"
        );
        Ok(Self {
            data_type,
            width,
            height,
            pixel_stride,
            scanline_stride,
            bank_indices: bank_indices.to_vec(),
            band_offsets: band_offsets.to_vec(),
            num_banks,
            buffer_size,
        })
    }

    /// Pixel-interleaved layout: one bank, band `i` at offset `i`, pixel stride `bands`.
    pub fn pixel_interleaved(
        data_type: DataType,
        width: i32,
        height: i32,
        bands: usize,
    ) -> Result<Self> {
        check_dimensions(width, height)?;
        let scanline_stride = mul_elements(width as usize, bands, "scanline stride")?;
        let band_offsets: Vec<usize> = (0..bands).collect();
        Self::new(data_type, width, height, bands, scanline_stride, &band_offsets)
    }

    /// Element distance between samples of one band in adjacent pixels.
    #[inline]
    pub fn pixel_stride(&self) -> usize {
        self.pixel_stride
    }

    /// Element distance between samples of one band in adjacent scanlines.
    #[inline]
    pub fn scanline_stride(&self) -> usize {
        self.scanline_stride
    }

    /// Bank index of every band.
    #[inline]
    pub fn bank_indices(&self) -> &[usize] {
        &self.bank_indices
    }

    /// Offset of every band's first sample inside its bank.
    #[inline]
    pub fn band_offsets(&self) -> &[usize] {
        &self.band_offsets
    }

    /// Element offset of pixel `(x, y)` before adding a band offset.
    ///
    /// Not bounds checked; coordinates must be non-negative.
    #[inline]
    pub fn offset(&self, x: i32, y: i32) -> usize {
        y as usize * self.scanline_stride + x as usize * self.pixel_stride
    }

    /// Same kind and bands for a new size, band offsets compacted.
    ///
    /// The strides of the new layout follow the ordering of the old pixel
    /// stride, scanline stride and band spread, so a pixel-interleaved model
    /// stays pixel-interleaved and a planar one stays planar. Band order in
    /// memory is preserved, equal offsets keep their original order.
    pub fn compatible(&self, width: i32, height: i32) -> Result<Self> {
        check_dimensions(width, height)?;
        let (w, h) = (width as usize, height as usize);
        let bands = self.band_offsets.len();
        let min_offset = self.band_offsets.iter().min().copied().unwrap_or(0);
        let max_offset = self.band_offsets.iter().max().copied().unwrap_or(0);
        let band_stride = max_offset - min_offset;
        let rebased = || -> Vec<usize> {
            self.band_offsets.iter().map(|o| o - min_offset).collect()
        };

        let mut pixel_stride = self.pixel_stride;
        let mut line_stride = self.scanline_stride;
        let band_offsets;
        if pixel_stride > line_stride {
            if pixel_stride > band_stride {
                if line_stride > band_stride {
                    // pixel > line > band
                    band_offsets = rebased();
                    line_stride = band_stride + 1;
                    pixel_stride = mul_elements(line_stride, h, "pixel stride")?;
                } else {
                    // pixel > band > line
                    let step = mul_elements(line_stride, h, "band step")?;
                    band_offsets = order_bands(&self.band_offsets, step)?;
                    pixel_stride = mul_elements(bands, step, "pixel stride")?;
                }
            } else {
                // band > pixel > line
                pixel_stride = mul_elements(line_stride, h, "pixel stride")?;
                let step = mul_elements(pixel_stride, w, "band step")?;
                band_offsets = order_bands(&self.band_offsets, step)?;
            }
        } else if pixel_stride > band_stride {
            // line > pixel > band
            band_offsets = rebased();
            pixel_stride = band_stride + 1;
            line_stride = mul_elements(pixel_stride, w, "scanline stride")?;
        } else if line_stride > band_stride {
            // line > band > pixel
            band_offsets = order_bands(&self.band_offsets, w)?;
            pixel_stride = 1;
            line_stride = mul_elements(bands, w, "scanline stride")?;
        } else {
            // band > line > pixel
            pixel_stride = 1;
            line_stride = w;
            let step = mul_elements(line_stride, h, "band step")?;
            band_offsets = order_bands(&self.band_offsets, step)?;
        }

        debug!(
            width, height, pixel_stride, line_stride, ?band_offsets,
            "compatible component layout"
        );
        Self::with_banks(
            self.data_type,
            width,
            height,
            pixel_stride,
            line_stride,
            &self.bank_indices,
            &band_offsets,
        )
    }

    /// The named bands, in the given order, keeping their banks and offsets.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidArgument`] if more bands are requested than exist,
    /// [`Error::BandOutOfRange`] for an unknown band.
    pub fn subset(&self, bands: &[usize]) -> Result<Self> {
        let (bank_indices, band_offsets) = self.subset_arrays(bands)?;
        Self::with_banks(
            self.data_type,
            self.width,
            self.height,
            self.pixel_stride,
            self.scanline_stride,
            &bank_indices,
            &band_offsets,
        )
    }

    pub(crate) fn subset_arrays(&self, bands: &[usize]) -> Result<(Vec<usize>, Vec<usize>)> {
        let num_bands = self.band_offsets.len();
        if bands.len() > num_bands {
            return Err(Error::invalid_argument(format!(
                "there are only {num_bands} bands"
            )));
        }
        let mut bank_indices = Vec::with_capacity(bands.len());
        let mut band_offsets = Vec::with_capacity(bands.len());
        for &band in bands {
            check_band(band, num_bands)?;
            bank_indices.push(self.bank_indices[band]);
            band_offsets.push(self.band_offsets[band]);
        }
        Ok((bank_indices, band_offsets))
    }

    #[inline]
    fn locate(&self, x: i32, y: i32, band: usize) -> Result<(usize, usize)> {
        check_coords(x, y, self.width, self.height)?;
        check_band(band, self.band_offsets.len())?;
        Ok((
            self.bank_indices[band],
            self.offset(x, y) + self.band_offsets[band],
        ))
    }
}

impl SampleModel for ComponentSampleModel {
    fn kind(&self) -> SampleModelKind {
        SampleModelKind::Component
    }

    fn width(&self) -> i32 {
        self.width
    }

    fn height(&self) -> i32 {
        self.height
    }

    fn num_bands(&self) -> usize {
        self.band_offsets.len()
    }

    fn data_type(&self) -> DataType {
        self.data_type
    }

    fn transfer_type(&self) -> DataType {
        self.data_type
    }

    fn num_data_elements(&self) -> usize {
        self.band_offsets.len()
    }

    fn sample_sizes(&self) -> Vec<u32> {
        vec![self.data_type.bits(); self.band_offsets.len()]
    }

    fn num_banks(&self) -> usize {
        self.num_banks
    }

    fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    fn sample_location(&self, x: i32, y: i32, band: usize) -> Result<SampleLocation> {
        let (bank, index) = self.locate(x, y, band)?;
        Ok(SampleLocation {
            bank,
            index,
            shift: 0,
            bits: self.data_type.bits(),
        })
    }

    fn sample(&self, x: i32, y: i32, band: usize, data: &DataBuffer) -> Result<i32> {
        let (bank, index) = self.locate(x, y, band)?;
        Ok(data.bank_elem(bank, index))
    }

    fn set_sample(
        &self,
        x: i32,
        y: i32,
        band: usize,
        value: i32,
        data: &mut DataBuffer,
    ) -> Result<()> {
        let (bank, index) = self.locate(x, y, band)?;
        data.set_bank_elem(bank, index, value);
        Ok(())
    }

    fn sample_float(&self, x: i32, y: i32, band: usize, data: &DataBuffer) -> Result<f32> {
        let (bank, index) = self.locate(x, y, band)?;
        Ok(data.bank_elem_float(bank, index))
    }

    fn set_sample_float(
        &self,
        x: i32,
        y: i32,
        band: usize,
        value: f32,
        data: &mut DataBuffer,
    ) -> Result<()> {
        let (bank, index) = self.locate(x, y, band)?;
        data.set_bank_elem_float(bank, index, value);
        Ok(())
    }

    fn sample_double(&self, x: i32, y: i32, band: usize, data: &DataBuffer) -> Result<f64> {
        let (bank, index) = self.locate(x, y, band)?;
        Ok(data.bank_elem_double(bank, index))
    }

    fn set_sample_double(
        &self,
        x: i32,
        y: i32,
        band: usize,
        value: f64,
        data: &mut DataBuffer,
    ) -> Result<()> {
        let (bank, index) = self.locate(x, y, band)?;
        data.set_bank_elem_double(bank, index, value);
        Ok(())
    }

    fn pixels_into(&self, region: Rect, out: &mut [i32], data: &DataBuffer) -> Result<()> {
        check_region(region, self.width, self.height)?;
        let n = self.band_offsets.len();
        check_len(region.area() as usize * n, out.len())?;
        let mut k = 0;
        for (x, y) in region.iter_coords() {
            let base = self.offset(x, y);
            for (bank, off) in self.bank_indices.iter().zip(&self.band_offsets) {
                out[k] = data.bank_elem(*bank, base + off);
                k += 1;
            }
        }
        Ok(())
    }

    fn set_pixels(&self, region: Rect, pixels: &[i32], data: &mut DataBuffer) -> Result<()> {
        check_region(region, self.width, self.height)?;
        let n = self.band_offsets.len();
        check_len(region.area() as usize * n, pixels.len())?;
        let mut k = 0;
        for (x, y) in region.iter_coords() {
            let base = self.offset(x, y);
            for (bank, off) in self.bank_indices.iter().zip(&self.band_offsets) {
                data.set_bank_elem(*bank, base + off, pixels[k]);
                k += 1;
            }
        }
        Ok(())
    }

    fn samples_into(
        &self,
        region: Rect,
        band: usize,
        out: &mut [i32],
        data: &DataBuffer,
    ) -> Result<()> {
        check_region(region, self.width, self.height)?;
        check_band(band, self.band_offsets.len())?;
        check_len(region.area() as usize, out.len())?;
        let (bank, off) = (self.bank_indices[band], self.band_offsets[band]);
        for ((x, y), slot) in region.iter_coords().zip(out.iter_mut()) {
            *slot = data.bank_elem(bank, self.offset(x, y) + off);
        }
        Ok(())
    }

    fn set_samples(
        &self,
        region: Rect,
        band: usize,
        samples: &[i32],
        data: &mut DataBuffer,
    ) -> Result<()> {
        check_region(region, self.width, self.height)?;
        check_band(band, self.band_offsets.len())?;
        check_len(region.area() as usize, samples.len())?;
        let (bank, off) = (self.bank_indices[band], self.band_offsets[band]);
        for ((x, y), &value) in region.iter_coords().zip(samples) {
            data.set_bank_elem(bank, self.offset(x, y) + off, value);
        }
        Ok(())
    }

    fn data_elements(&self, x: i32, y: i32, data: &DataBuffer) -> Result<TransferData> {
        check_coords(x, y, self.width, self.height)?;
        let base = self.offset(x, y);
        let mut out = TransferData::zeroed(self.data_type, self.band_offsets.len());
        for (k, (bank, off)) in self.bank_indices.iter().zip(&self.band_offsets).enumerate() {
            out.load(k, data, *bank, base + off);
        }
        Ok(out)
    }

    fn set_data_elements(
        &self,
        x: i32,
        y: i32,
        obj: &TransferData,
        data: &mut DataBuffer,
    ) -> Result<()> {
        check_coords(x, y, self.width, self.height)?;
        obj.check(self.data_type, self.band_offsets.len())?;
        let base = self.offset(x, y);
        for (k, (bank, off)) in self.bank_indices.iter().zip(&self.band_offsets).enumerate() {
            obj.store(k, data, *bank, base + off);
        }
        Ok(())
    }

    fn create_compatible_sample_model(
        &self,
        width: i32,
        height: i32,
    ) -> Result<Box<dyn SampleModel>> {
        Ok(Box::new(self.compatible(width, height)?))
    }

    fn create_subset_sample_model(&self, bands: &[usize]) -> Result<Box<dyn SampleModel>> {
        Ok(Box::new(self.subset(bands)?))
    }

    fn create_data_buffer(&self) -> Result<DataBuffer> {
        debug!(
            data_type = %self.data_type, size = self.buffer_size, banks = self.num_banks,
            "allocating component buffer"
        );
        DataBuffer::with_banks(self.data_type, self.buffer_size, self.num_banks)
    }

    fn clone_box(&self) -> Box<dyn SampleModel> {
        Box::new(self.clone())
    }
}

/// Elements needed per bank: the largest band offset plus the span of the
/// last pixel of the last scanline.
pub(crate) fn component_buffer_size(
    width: i32,
    height: i32,
    pixel_stride: usize,
    scanline_stride: usize,
    band_offsets: &[usize],
) -> Result<usize> {
    let max_offset = band_offsets.iter().max().copied().unwrap_or(0);
    if max_offset >= MAX_ELEMENTS {
        return Err(Error::overflow(format!("band offset {max_offset}")));
    }
    let size = max_offset + 1;
    let pixel_span = mul_elements(pixel_stride, (width - 1) as usize, "pixel stride span")?;
    let size = add_elements(size, pixel_span, "pixel stride span")?;
    let line_span = mul_elements(scanline_stride, (height - 1) as usize, "scanline stride span")?;
    add_elements(size, line_span, "scanline stride span")
}

/// Assigns `rank * step` to every band, ranked by original offset.
///
/// The sort is stable, so equal offsets keep their band order.
pub(crate) fn order_bands(offsets: &[usize], step: usize) -> Result<Vec<usize>> {
    let mut order: Vec<usize> = (0..offsets.len()).collect();
    order.sort_by_key(|&band| offsets[band]);
    let mut out = vec![0; offsets.len()];
    for (rank, &band) in order.iter().enumerate() {
        out[band] = mul_elements(rank, step, "band offset")?;
    }
    Ok(out)
}
