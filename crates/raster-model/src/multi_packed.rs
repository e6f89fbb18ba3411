//! Single-band layout with several pixels packed into each storage element.
//!
//! Pixels are packed most significant bits first. With 1-bit pixels in byte
//! storage, pixel `x = 0` is bit 7 of element 0 and pixel `x = 8` is bit 7 of
//! element 1. The bits per pixel must divide the element width, so a pixel
//! never straddles two elements.

use crate::model::{
    add_elements, check_band, check_coords, check_dimensions, mul_elements, SampleLocation,
    SampleModel, SampleModelKind,
};
use raster_core::{DataBuffer, DataType, Error, Result, TransferData};
use tracing::{debug, trace};

/// One band packed at a fixed number of bits per pixel.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MultiPixelPackedSampleModel {
    data_type: DataType,
    width: i32,
    height: i32,
    pixel_bit_stride: u32,
    scanline_stride: usize,
    data_bit_offset: usize,
    element_bits: u32,
    bit_mask: u32,
    transfer_type: DataType,
    buffer_size: usize,
}

impl MultiPixelPackedSampleModel {
    /// Tightly packed rows with no leading bit offset.
    pub fn new(data_type: DataType, width: i32, height: i32, bits: u32) -> Result<Self> {
        check_dimensions(width, height)?;
        check_packing(data_type, bits)?;
        let element_bits = data_type.bits() as usize;
        let row_bits = mul_elements(width as usize, bits as usize, "row bits")?;
        let scanline_stride = row_bits.div_ceil(element_bits);
        Self::with_layout(data_type, width, height, bits, scanline_stride, 0)
    }

    /// Explicit scanline stride (in elements) and bit offset of pixel `(0, 0)`.
    ///
    /// # Errors
    ///
    /// - [`Error::UnsupportedDataType`] unless storage is byte, ushort or int
    /// - [`Error::InvalidBitsPerPixel`] unless `bits` divides the element width
    /// - [`Error::InvalidArgument`] if `data_bit_offset` is not pixel aligned
    pub fn with_layout(
        data_type: DataType,
        width: i32,
        height: i32,
        bits: u32,
        scanline_stride: usize,
        data_bit_offset: usize,
    ) -> Result<Self> {
        check_dimensions(width, height)?;
        check_packing(data_type, bits)?;
        if data_bit_offset % bits as usize != 0 {
            return Err(Error::invalid_argument(format!(
                "data bit offset {data_bit_offset} is not a multiple of {bits} bits per pixel"
            )));
        }
        let element_bits = data_type.bits();
        let bit_mask = ((1u64 << bits) - 1) as u32;

        let eb = element_bits as usize;
        let size = mul_elements(scanline_stride, height as usize, "scanline stride")?;
        let size = add_elements(size, data_bit_offset.div_ceil(eb), "data bit offset")?;
        // last element actually touched, in case the stride is narrower than a row
        let last_bit = data_bit_offset as u64 + (width as u64 - 1) * bits as u64;
        let last_index = (height as u64 - 1) * scanline_stride as u64 + last_bit / eb as u64;
        let buffer_size = size.max(
            usize::try_from(last_index + 1)
                .map_err(|_| Error::overflow("packed layout exceeds the element range"))?,
        );
        if buffer_size > raster_core::MAX_ELEMENTS {
            return Err(Error::overflow("packed layout exceeds the element range"));
        }

        trace!(%data_type, width, height, bits, scanline_stride, data_bit_offset, "multi-pixel packed model");
        Ok(Self {
            data_type,
            width,
            height,
            pixel_bit_stride: bits,
            scanline_stride,
            data_bit_offset,
            element_bits,
            bit_mask,
            transfer_type: DataType::smallest_for_bits(bits),
            buffer_size,
        })
    }

    /// Bits per pixel.
    #[inline]
    pub fn pixel_bit_stride(&self) -> u32 {
        self.pixel_bit_stride
    }

    /// Bit offset of pixel `(0, 0)` from the start of the bank.
    #[inline]
    pub fn data_bit_offset(&self) -> usize {
        self.data_bit_offset
    }

    /// Elements per scanline.
    #[inline]
    pub fn scanline_stride(&self) -> usize {
        self.scanline_stride
    }

    /// Index of the element holding pixel `(x, y)`. Not bounds checked.
    #[inline]
    pub fn offset(&self, x: i32, y: i32) -> usize {
        y as usize * self.scanline_stride
            + (self.data_bit_offset + x as usize * self.pixel_bit_stride as usize)
                / self.element_bits as usize
    }

    /// Bit position of pixel `x` inside its element, counted from the most
    /// significant bit.
    #[inline]
    pub fn bit_offset(&self, x: i32) -> u32 {
        ((self.data_bit_offset + x as usize * self.pixel_bit_stride as usize)
            % self.element_bits as usize) as u32
    }

    /// Same bits per pixel and storage at a new size, tightly packed.
    pub fn compatible(&self, width: i32, height: i32) -> Result<Self> {
        let sm = Self::new(self.data_type, width, height, self.pixel_bit_stride)?;
        debug!(width, height, scanline_stride = sm.scanline_stride, "compatible packed layout");
        Ok(sm)
    }

    #[inline]
    fn shift(&self, x: i32) -> u32 {
        self.element_bits - self.bit_offset(x) - self.pixel_bit_stride
    }

    #[inline]
    fn read(&self, x: i32, y: i32, data: &DataBuffer) -> i32 {
        let elem = data.elem(self.offset(x, y)) as u32;
        ((elem >> self.shift(x)) & self.bit_mask) as i32
    }

    #[inline]
    fn write(&self, x: i32, y: i32, value: i32, data: &mut DataBuffer) {
        let index = self.offset(x, y);
        let shift = self.shift(x);
        let elem = data.elem(index) as u32;
        let cleared = elem & !(self.bit_mask << shift);
        let packed = cleared | ((value as u32 & self.bit_mask) << shift);
        data.set_elem(index, packed as i32);
    }
}

fn check_packing(data_type: DataType, bits: u32) -> Result<()> {
    if !data_type.is_packable() {
        return Err(Error::unsupported_data_type(format!(
            "{data_type} storage for packed pixels"
        )));
    }
    if bits == 0 || data_type.bits() % bits != 0 {
        return Err(Error::InvalidBitsPerPixel { bits, data_type });
    }
    Ok(())
}

impl SampleModel for MultiPixelPackedSampleModel {
    fn kind(&self) -> SampleModelKind {
        SampleModelKind::MultiPixelPacked
    }

    fn width(&self) -> i32 {
        self.width
    }

    fn height(&self) -> i32 {
        self.height
    }

    fn num_bands(&self) -> usize {
        1
    }

    fn data_type(&self) -> DataType {
        self.data_type
    }

    fn transfer_type(&self) -> DataType {
        self.transfer_type
    }

    fn num_data_elements(&self) -> usize {
        1
    }

    fn sample_sizes(&self) -> Vec<u32> {
        vec![self.pixel_bit_stride]
    }

    fn num_banks(&self) -> usize {
        1
    }

    fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    fn sample_location(&self, x: i32, y: i32, band: usize) -> Result<SampleLocation> {
        check_coords(x, y, self.width, self.height)?;
        check_band(band, 1)?;
        Ok(SampleLocation {
            bank: 0,
            index: self.offset(x, y),
            shift: self.shift(x),
            bits: self.pixel_bit_stride,
        })
    }

    fn sample(&self, x: i32, y: i32, band: usize, data: &DataBuffer) -> Result<i32> {
        check_coords(x, y, self.width, self.height)?;
        check_band(band, 1)?;
        Ok(self.read(x, y, data))
    }

    fn set_sample(
        &self,
        x: i32,
        y: i32,
        band: usize,
        value: i32,
        data: &mut DataBuffer,
    ) -> Result<()> {
        check_coords(x, y, self.width, self.height)?;
        check_band(band, 1)?;
        self.write(x, y, value, data);
        Ok(())
    }

    fn data_elements(&self, x: i32, y: i32, data: &DataBuffer) -> Result<TransferData> {
        check_coords(x, y, self.width, self.height)?;
        let mut out = TransferData::zeroed(self.transfer_type, 1);
        out.set_int_at(0, self.read(x, y, data));
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
        obj.check(self.transfer_type, 1)?;
        self.write(x, y, obj.int_at(0), data);
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
        match bands {
            [0] => Ok(Box::new(self.clone())),
            [band] => Err(Error::band_out_of_range(*band, 1)),
            _ => Err(Error::invalid_argument(format!(
                "packed model has one band, {} requested",
                bands.len()
            ))),
        }
    }

    fn create_data_buffer(&self) -> Result<DataBuffer> {
        debug!(
            data_type = %self.data_type, size = self.buffer_size,
            "allocating multi-pixel packed buffer"
        );
        Ok(DataBuffer::new(self.data_type, self.buffer_size))
    }

    fn clone_box(&self) -> Box<dyn SampleModel> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use raster_core::Rect;

    #[test]
    fn test_one_bit_msb_first() {
        let sm = MultiPixelPackedSampleModel::new(DataType::Byte, 10, 2, 1).unwrap();
        assert_eq!(sm.scanline_stride(), 2);
        assert_eq!(sm.buffer_size(), 4);
        assert_eq!(sm.transfer_type(), DataType::Byte);

        let mut buf = sm.create_data_buffer().unwrap();
        sm.set_sample(0, 0, 0, 1, &mut buf).unwrap();
        sm.set_sample(9, 1, 0, 1, &mut buf).unwrap();
        assert_eq!(buf.elem(0), 0x80);
        assert_eq!(buf.elem(3), 0x40);
        assert_eq!(sm.sample(9, 1, 0, &buf).unwrap(), 1);
        assert_eq!(sm.sample(8, 1, 0, &buf).unwrap(), 0);
    }

    #[test]
    fn test_set_sample_keeps_neighbours() {
        let sm = MultiPixelPackedSampleModel::new(DataType::UShort, 4, 1, 4).unwrap();
        let mut buf = sm.create_data_buffer().unwrap();
        sm.set_pixels(Rect::new(0, 0, 4, 1), &[1, 2, 3, 4], &mut buf).unwrap();
        assert_eq!(buf.elem(0), 0x1234);
        sm.set_sample(2, 0, 0, 0xff, &mut buf).unwrap();
        assert_eq!(buf.elem(0), 0x12f4);
        assert_eq!(sm.samples(Rect::new(0, 0, 4, 1), 0, &buf).unwrap(), vec![1, 2, 15, 4]);
    }

    #[test]
    fn test_full_width_int_pixels() {
        let sm = MultiPixelPackedSampleModel::new(DataType::Int, 2, 1, 32).unwrap();
        assert_eq!(sm.transfer_type(), DataType::Int);
        let mut buf = sm.create_data_buffer().unwrap();
        sm.set_sample(1, 0, 0, -1, &mut buf).unwrap();
        assert_eq!(sm.sample(1, 0, 0, &buf).unwrap(), -1);
        assert_eq!(sm.sample(0, 0, 0, &buf).unwrap(), 0);
    }

    #[test]
    fn test_data_bit_offset() {
        let sm = MultiPixelPackedSampleModel::with_layout(DataType::Byte, 4, 1, 2, 2, 6).unwrap();
        assert_eq!(sm.offset(0, 0), 0);
        assert_eq!(sm.bit_offset(0), 6);
        assert_eq!(sm.offset(1, 0), 1);
        assert_eq!(sm.bit_offset(1), 0);
        let loc = sm.sample_location(0, 0, 0).unwrap();
        assert_eq!((loc.index, loc.shift, loc.bits), (0, 0, 2));
        assert_eq!(sm.buffer_size(), 3);
    }

    #[test]
    fn test_rejects_bad_packing() {
        assert!(matches!(
            MultiPixelPackedSampleModel::new(DataType::Byte, 4, 4, 3),
            Err(Error::InvalidBitsPerPixel { bits: 3, .. })
        ));
        assert!(MultiPixelPackedSampleModel::new(DataType::Byte, 4, 4, 0).is_err());
        assert!(MultiPixelPackedSampleModel::new(DataType::Byte, 4, 4, 16).is_err());
        assert!(matches!(
            MultiPixelPackedSampleModel::new(DataType::Float, 4, 4, 1),
            Err(Error::UnsupportedDataType(_))
        ));
        assert!(MultiPixelPackedSampleModel::with_layout(DataType::Byte, 4, 4, 2, 1, 3).is_err());
    }

    #[test]
    fn test_data_elements_use_transfer_type() {
        let sm = MultiPixelPackedSampleModel::new(DataType::Int, 8, 1, 4).unwrap();
        assert_eq!(sm.transfer_type(), DataType::Byte);
        let mut buf = sm.create_data_buffer().unwrap();
        sm.set_data_elements(3, 0, &TransferData::from(vec![9u8]), &mut buf).unwrap();
        assert_eq!(sm.data_elements(3, 0, &buf).unwrap(), TransferData::Byte(vec![9]));
        assert_eq!(sm.sample(3, 0, 0, &buf).unwrap(), 9);
        assert!(sm
            .set_data_elements(0, 0, &TransferData::from(vec![1i32]), &mut buf)
            .is_err());
    }

    #[test]
    fn test_single_band_only() {
        let sm = MultiPixelPackedSampleModel::new(DataType::Byte, 4, 4, 2).unwrap();
        let buf = sm.create_data_buffer().unwrap();
        assert!(sm.sample(0, 0, 1, &buf).unwrap_err().is_bounds_error());
        assert!(sm.create_subset_sample_model(&[0]).is_ok());
        assert!(sm.create_subset_sample_model(&[1]).is_err());
        assert!(sm.create_subset_sample_model(&[0, 0]).is_err());
    }

    #[test]
    fn test_compatible_resets_layout() {
        let sm = MultiPixelPackedSampleModel::with_layout(DataType::Byte, 4, 1, 2, 4, 8).unwrap();
        let c = sm.compatible(13, 2).unwrap();
        assert_eq!(c.pixel_bit_stride(), 2);
        assert_eq!(c.data_bit_offset(), 0);
        assert_eq!(c.scanline_stride(), 4);
    }
}
