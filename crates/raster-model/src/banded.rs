//! Banded layout: pixel stride 1, each band in its own plane.
//!
//! A banded model is a [`ComponentSampleModel`] with pixel stride fixed at 1.
//! By default band `i` lives in bank `i` at offset 0; several bands may also
//! share one bank at different offsets.

use crate::component::{order_bands, ComponentSampleModel};
use crate::model::{check_dimensions, mul_elements, SampleLocation, SampleModel, SampleModelKind};
use raster_core::{DataBuffer, DataType, Rect, Result, TransferData};
use tracing::debug;

/// Component layout with unit pixel stride.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BandedSampleModel {
    inner: ComponentSampleModel,
}

impl BandedSampleModel {
    /// `bands` bands, band `i` in bank `i` at offset 0, scanline stride `width`.
    pub fn new(data_type: DataType, width: i32, height: i32, bands: usize) -> Result<Self> {
        let bank_indices: Vec<usize> = (0..bands).collect();
        let band_offsets = vec![0; bands];
        Self::with_layout(
            data_type,
            width,
            height,
            width.max(0) as usize,
            &bank_indices,
            &band_offsets,
        )
    }

    /// Explicit scanline stride, bank indices and band offsets.
    pub fn with_layout(
        data_type: DataType,
        width: i32,
        height: i32,
        scanline_stride: usize,
        bank_indices: &[usize],
        band_offsets: &[usize],
    ) -> Result<Self> {
        let inner = ComponentSampleModel::with_banks(
            data_type,
            width,
            height,
            1,
            scanline_stride,
            bank_indices,
            band_offsets,
        )?;
        Ok(Self { inner })
    }

    /// Element distance between adjacent scanlines of one band.
    #[inline]
    pub fn scanline_stride(&self) -> usize {
        self.inner.scanline_stride()
    }

    /// Bank index of every band.
    #[inline]
    pub fn bank_indices(&self) -> &[usize] {
        self.inner.bank_indices()
    }

    /// Offset of every band's plane inside its bank.
    #[inline]
    pub fn band_offsets(&self) -> &[usize] {
        self.inner.band_offsets()
    }

    /// The underlying component layout.
    pub fn as_component(&self) -> &ComponentSampleModel {
        &self.inner
    }

    /// Same bands and banks at a new size with scanline stride `width`.
    ///
    /// Bands sharing a bank are laid out as consecutive planes in their
    /// original memory order; a band alone in its bank starts at 0.
    pub fn compatible(&self, width: i32, height: i32) -> Result<Self> {
        check_dimensions(width, height)?;
        let plane = mul_elements(width as usize, height as usize, "band plane")?;
        let banks = self.inner.bank_indices();
        let offsets = self.inner.band_offsets();
        let mut band_offsets = vec![0; banks.len()];
        for bank in 0..self.inner.num_banks() {
            let members: Vec<usize> = (0..banks.len()).filter(|&b| banks[b] == bank).collect();
            let shared: Vec<usize> = members.iter().map(|&b| offsets[b]).collect();
            for (&band, offset) in members.iter().zip(order_bands(&shared, plane)?) {
                band_offsets[band] = offset;
            }
        }
        debug!(width, height, ?band_offsets, "compatible banded layout");
        Self::with_layout(
            self.inner.data_type(),
            width,
            height,
            width as usize,
            self.inner.bank_indices(),
            &band_offsets,
        )
    }

    /// The named bands, still banded over the same buffer.
    pub fn subset(&self, bands: &[usize]) -> Result<Self> {
        let (bank_indices, band_offsets) = self.inner.subset_arrays(bands)?;
        Self::with_layout(
            self.inner.data_type(),
            self.inner.width(),
            self.inner.height(),
            self.inner.scanline_stride(),
            &bank_indices,
            &band_offsets,
        )
    }
}

impl SampleModel for BandedSampleModel {
    fn kind(&self) -> SampleModelKind {
        SampleModelKind::Banded
    }

    fn width(&self) -> i32 {
        self.inner.width()
    }

    fn height(&self) -> i32 {
        self.inner.height()
    }

    fn num_bands(&self) -> usize {
        self.inner.num_bands()
    }

    fn data_type(&self) -> DataType {
        self.inner.data_type()
    }

    fn transfer_type(&self) -> DataType {
        self.inner.transfer_type()
    }

    fn num_data_elements(&self) -> usize {
        self.inner.num_data_elements()
    }

    fn sample_sizes(&self) -> Vec<u32> {
        self.inner.sample_sizes()
    }

    fn num_banks(&self) -> usize {
        self.inner.num_banks()
    }

    fn buffer_size(&self) -> usize {
        self.inner.buffer_size()
    }

    fn sample_location(&self, x: i32, y: i32, band: usize) -> Result<SampleLocation> {
        self.inner.sample_location(x, y, band)
    }

    fn sample(&self, x: i32, y: i32, band: usize, data: &DataBuffer) -> Result<i32> {
        self.inner.sample(x, y, band, data)
    }

    fn set_sample(
        &self,
        x: i32,
        y: i32,
        band: usize,
        value: i32,
        data: &mut DataBuffer,
    ) -> Result<()> {
        self.inner.set_sample(x, y, band, value, data)
    }

    fn sample_float(&self, x: i32, y: i32, band: usize, data: &DataBuffer) -> Result<f32> {
        self.inner.sample_float(x, y, band, data)
    }

    fn set_sample_float(
        &self,
        x: i32,
        y: i32,
        band: usize,
        value: f32,
        data: &mut DataBuffer,
    ) -> Result<()> {
        self.inner.set_sample_float(x, y, band, value, data)
    }

    fn sample_double(&self, x: i32, y: i32, band: usize, data: &DataBuffer) -> Result<f64> {
        self.inner.sample_double(x, y, band, data)
    }

    fn set_sample_double(
        &self,
        x: i32,
        y: i32,
        band: usize,
        value: f64,
        data: &mut DataBuffer,
    ) -> Result<()> {
        self.inner.set_sample_double(x, y, band, value, data)
    }

    fn pixels_into(&self, region: Rect, out: &mut [i32], data: &DataBuffer) -> Result<()> {
        self.inner.pixels_into(region, out, data)
    }

    fn set_pixels(&self, region: Rect, pixels: &[i32], data: &mut DataBuffer) -> Result<()> {
        self.inner.set_pixels(region, pixels, data)
    }

    fn samples_into(
        &self,
        region: Rect,
        band: usize,
        out: &mut [i32],
        data: &DataBuffer,
    ) -> Result<()> {
        self.inner.samples_into(region, band, out, data)
    }

    fn set_samples(
        &self,
        region: Rect,
        band: usize,
        samples: &[i32],
        data: &mut DataBuffer,
    ) -> Result<()> {
        self.inner.set_samples(region, band, samples, data)
    }

    fn data_elements(&self, x: i32, y: i32, data: &DataBuffer) -> Result<TransferData> {
        self.inner.data_elements(x, y, data)
    }

    fn set_data_elements(
        &self,
        x: i32,
        y: i32,
        obj: &TransferData,
        data: &mut DataBuffer,
    ) -> Result<()> {
        self.inner.set_data_elements(x, y, obj, data)
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
        self.inner.create_data_buffer()
    }

    fn clone_box(&self) -> Box<dyn SampleModel> {
        Box::new(self.clone())
    }
}
