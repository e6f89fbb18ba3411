//! All bands of a pixel packed into one storage element.
//!
//! Each band is selected by a contiguous bit mask, e.g. `0xff0000`,
//! `0x00ff00`, `0x0000ff` for RGB in int storage or `0xf800`, `0x07e0`,
//! `0x001f` for 565 in ushort storage.

use crate::model::{
    add_elements, check_band, check_coords, check_dimensions, check_len, mul_elements,
    SampleLocation, SampleModel, SampleModelKind,
};
use raster_core::{DataBuffer, DataType, Error, Result, TransferData};
use tracing::{debug, trace};

/// Per-band bit masks over one element per pixel.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SinglePixelPackedSampleModel {
    data_type: DataType,
    width: i32,
    height: i32,
    scanline_stride: usize,
    bit_masks: Vec<u32>,
    bit_offsets: Vec<u32>,
    bit_sizes: Vec<u32>,
    buffer_size: usize,
}

impl SinglePixelPackedSampleModel {
    /// Scanline stride equal to `width`.
    pub fn new(data_type: DataType, width: i32, height: i32, bit_masks: &[u32]) -> Result<Self> {
        Self::with_stride(data_type, width, height, width.max(0) as usize, bit_masks)
    }

    /// Explicit scanline stride in elements.
    ///
    /// Masks are truncated to the storage width first.
    ///
    /// # Errors
    ///
    /// - [`Error::UnsupportedDataType`] unless storage is byte, ushort or int
    /// - [`Error::NonContiguousMask`] for a mask with a gap
    /// - [`Error::InvalidArgument`] without bands or when every mask is zero
    pub fn with_stride(
        data_type: DataType,
        width: i32,
        height: i32,
        scanline_stride: usize,
        bit_masks: &[u32],
    ) -> Result<Self> {
        check_dimensions(width, height)?;
        if !data_type.is_packable() {
            return Err(Error::unsupported_data_type(format!(
                "{data_type} storage for packed pixels"
            )));
        }
        if bit_masks.is_empty() {
            return Err(Error::invalid_argument("must have at least one band"));
        }

        let storage = if data_type.bits() >= 32 {
            u32::MAX
        } else {
            (1u32 << data_type.bits()) - 1
        };
        let bit_masks: Vec<u32> = bit_masks.iter().map(|m| m & storage).collect();
        let mut bit_offsets = Vec::with_capacity(bit_masks.len());
        let mut bit_sizes = Vec::with_capacity(bit_masks.len());
        for (band, &mask) in bit_masks.iter().enumerate() {
            let (offset, size) = mask_run(mask).ok_or(Error::NonContiguousMask { band, mask })?;
            bit_offsets.push(offset);
            bit_sizes.push(size);
        }

        let pixel_bits = 32 - bit_masks.iter().fold(0, |acc, m| acc | m).leading_zeros();
        if pixel_bits == 0 {
            return Err(Error::invalid_argument("all bit masks are zero"));
        }

        let buffer_size = mul_elements(scanline_stride, (height - 1) as usize, "scanline stride")?;
        let buffer_size = add_elements(buffer_size, width as usize, "scanline stride")?;

        trace!(%data_type, width, height, scanline_stride, ?bit_masks, "single-pixel packed model");
        Ok(Self {
            data_type,
            width,
            height,
            scanline_stride,
            bit_masks,
            bit_offsets,
            bit_sizes,
            buffer_size,
        })
    }

    /// Mask of every band.
    #[inline]
    pub fn bit_masks(&self) -> &[u32] {
        &self.bit_masks
    }

    /// Position of the lowest set bit of every band's mask.
    #[inline]
    pub fn bit_offsets(&self) -> &[u32] {
        &self.bit_offsets
    }

    /// Width in bits of every band.
    #[inline]
    pub fn bit_sizes(&self) -> &[u32] {
        &self.bit_sizes
    }

    /// Elements per scanline.
    #[inline]
    pub fn scanline_stride(&self) -> usize {
        self.scanline_stride
    }

    /// Index of the element holding pixel `(x, y)`. Not bounds checked.
    #[inline]
    pub fn offset(&self, x: i32, y: i32) -> usize {
        y as usize * self.scanline_stride + x as usize
    }

    /// Same masks at a new size with scanline stride `width`.
    pub fn compatible(&self, width: i32, height: i32) -> Result<Self> {
        debug!(width, height, "compatible single-pixel packed layout");
        Self::new(self.data_type, width, height, &self.bit_masks)
    }

    /// The named bands' masks, in the given order, over the same elements.
    pub fn subset(&self, bands: &[usize]) -> Result<Self> {
        let num_bands = self.bit_masks.len();
        if bands.len() > num_bands {
            return Err(Error::invalid_argument(format!(
                "there are only {num_bands} bands"
            )));
        }
        let masks = bands
            .iter()
            .map(|&band| {
                check_band(band, num_bands)?;
                Ok(self.bit_masks[band])
            })
            .collect::<Result<Vec<_>>>()?;
        Self::with_stride(
            self.data_type,
            self.width,
            self.height,
            self.scanline_stride,
            &masks,
        )
    }

    #[inline]
    fn locate(&self, x: i32, y: i32, band: usize) -> Result<usize> {
        check_coords(x, y, self.width, self.height)?;
        check_band(band, self.bit_masks.len())?;
        Ok(self.offset(x, y))
    }
}

/// `(lowest bit, run length)` of a contiguous mask; zero masks are empty runs at 0.
fn mask_run(mask: u32) -> Option<(u32, u32)> {
    if mask == 0 {
        return Some((0, 0));
    }
    let offset = mask.trailing_zeros();
    let size = (mask >> offset).trailing_ones();
    (size == mask.count_ones()).then_some((offset, size))
}

impl SampleModel for SinglePixelPackedSampleModel {
    fn kind(&self) -> SampleModelKind {
        SampleModelKind::SinglePixelPacked
    }

    fn width(&self) -> i32 {
        self.width
    }

    fn height(&self) -> i32 {
        self.height
    }

    fn num_bands(&self) -> usize {
        self.bit_masks.len()
    }

    fn data_type(&self) -> DataType {
        self.data_type
    }

    fn transfer_type(&self) -> DataType {
        self.data_type
    }

    fn num_data_elements(&self) -> usize {
        1
    }

    fn sample_sizes(&self) -> Vec<u32> {
        self.bit_sizes.clone()
    }

    fn num_banks(&self) -> usize {
        1
    }

    fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    fn sample_location(&self, x: i32, y: i32, band: usize) -> Result<SampleLocation> {
        let index = self.locate(x, y, band)?;
        Ok(SampleLocation {
            bank: 0,
            index,
            shift: self.bit_offsets[band],
            bits: self.bit_sizes[band],
        })
    }

    fn sample(&self, x: i32, y: i32, band: usize, data: &DataBuffer) -> Result<i32> {
        let index = self.locate(x, y, band)?;
        let elem = data.elem(index) as u32;
        Ok(((elem & self.bit_masks[band]) >> self.bit_offsets[band]) as i32)
    }

    fn set_sample(
        &self,
        x: i32,
        y: i32,
        band: usize,
        value: i32,
        data: &mut DataBuffer,
    ) -> Result<()> {
        let index = self.locate(x, y, band)?;
        let mask = self.bit_masks[band];
        let elem = data.elem(index) as u32;
        let packed = (elem & !mask) | (((value as u32) << self.bit_offsets[band]) & mask);
        data.set_elem(index, packed as i32);
        Ok(())
    }

    fn pixel_into(&self, x: i32, y: i32, out: &mut [i32], data: &DataBuffer) -> Result<()> {
        let n = self.bit_masks.len();
        check_len(n, out.len())?;
        check_coords(x, y, self.width, self.height)?;
        let elem = data.elem(self.offset(x, y)) as u32;
        for ((slot, mask), off) in out.iter_mut().zip(&self.bit_masks).zip(&self.bit_offsets) {
            *slot = ((elem & mask) >> off) as i32;
        }
        Ok(())
    }

    fn data_elements(&self, x: i32, y: i32, data: &DataBuffer) -> Result<TransferData> {
        check_coords(x, y, self.width, self.height)?;
        let mut out = TransferData::zeroed(self.data_type, 1);
        out.load(0, data, 0, self.offset(x, y));
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
        obj.check(self.data_type, 1)?;
        obj.store(0, data, 0, self.offset(x, y));
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
            data_type = %self.data_type, size = self.buffer_size,
            "allocating single-pixel packed buffer"
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

    const RGB: [u32; 3] = [0xff0000, 0x00ff00, 0x0000ff];

    #[test]
    fn test_rgb_int() {
        let sm = SinglePixelPackedSampleModel::new(DataType::Int, 3, 2, &RGB).unwrap();
        assert_eq!(sm.bit_offsets(), &[16, 8, 0]);
        assert_eq!(sm.sample_sizes(), vec![8, 8, 8]);
        assert_eq!(sm.buffer_size(), 6);

        let mut buf = sm.create_data_buffer().unwrap();
        sm.set_pixel(2, 1, &[0x12, 0x34, 0x56], &mut buf).unwrap();
        assert_eq!(buf.elem(5), 0x123456);
        assert_eq!(sm.pixel(2, 1, &buf).unwrap(), vec![0x12, 0x34, 0x56]);
        sm.set_sample(2, 1, 1, 0x1ff, &mut buf).unwrap();
        assert_eq!(buf.elem(5), 0x12ff56);
    }

    #[test]
    fn test_565_ushort() {
        let sm =
            SinglePixelPackedSampleModel::new(DataType::UShort, 2, 2, &[0xf800, 0x07e0, 0x001f])
                .unwrap();
        assert_eq!(sm.bit_sizes(), &[5, 6, 5]);
        let mut buf = sm.create_data_buffer().unwrap();
        sm.set_pixel(1, 0, &[31, 63, 31], &mut buf).unwrap();
        assert_eq!(buf.elem(1), 0xffff);
        sm.set_sample(1, 0, 0, 0, &mut buf).unwrap();
        assert_eq!(sm.pixel(1, 0, &buf).unwrap(), vec![0, 63, 31]);
    }

    #[test]
    fn test_mask_validation() {
        assert!(matches!(
            SinglePixelPackedSampleModel::new(DataType::Int, 2, 2, &[0xff, 0x101]),
            Err(Error::NonContiguousMask { band: 1, mask: 0x101 })
        ));
        // truncated to the storage width before validation
        let sm = SinglePixelPackedSampleModel::new(DataType::Byte, 2, 2, &[0x1f0, 0x0f]).unwrap();
        assert_eq!(sm.bit_masks(), &[0xf0, 0x0f]);
        assert!(SinglePixelPackedSampleModel::new(DataType::Byte, 2, 2, &[0x100]).is_err());
        assert!(SinglePixelPackedSampleModel::new(DataType::Byte, 2, 2, &[]).is_err());
        assert!(SinglePixelPackedSampleModel::new(DataType::Double, 2, 2, &[1]).is_err());
        assert!(SinglePixelPackedSampleModel::new(DataType::Int, 1, 1, &[u32::MAX]).is_ok());
    }

    #[test]
    fn test_zero_mask_band() {
        let sm = SinglePixelPackedSampleModel::new(DataType::Byte, 1, 1, &[0xff, 0]).unwrap();
        let mut buf = sm.create_data_buffer().unwrap();
        sm.set_sample(0, 0, 1, 7, &mut buf).unwrap();
        assert_eq!(sm.sample(0, 0, 1, &buf).unwrap(), 0);
        assert_eq!(buf.elem(0), 0);
    }

    #[test]
    fn test_data_elements_whole_element() {
        let sm = SinglePixelPackedSampleModel::new(DataType::Int, 2, 1, &RGB).unwrap();
        let mut buf = sm.create_data_buffer().unwrap();
        sm.set_data_elements(1, 0, &TransferData::from(vec![0x7f_0a0b0c_i32]), &mut buf)
            .unwrap();
        assert_eq!(
            sm.data_elements(1, 0, &buf).unwrap(),
            TransferData::Int(vec![0x7f_0a0b0c])
        );
        assert_eq!(sm.pixel(1, 0, &buf).unwrap(), vec![0x0a, 0x0b, 0x0c]);
    }

    #[test]
    fn test_stride_and_compatible() {
        let sm = SinglePixelPackedSampleModel::with_stride(DataType::Byte, 3, 3, 5, &[0x0f]).unwrap();
        assert_eq!(sm.buffer_size(), 13);
        assert_eq!(sm.offset(2, 2), 12);
        let c = sm.compatible(4, 4).unwrap();
        assert_eq!(c.scanline_stride(), 4);
        assert_eq!(c.bit_masks(), sm.bit_masks());
    }

    #[test]
    fn test_subset_reads_same_elements() {
        let sm = SinglePixelPackedSampleModel::new(DataType::Int, 2, 2, &RGB).unwrap();
        let mut buf = sm.create_data_buffer().unwrap();
        sm.set_pixels(Rect::new(0, 0, 2, 1), &[1, 2, 3, 4, 5, 6], &mut buf).unwrap();
        let sub = sm.subset(&[2, 0]).unwrap();
        assert_eq!(sub.pixel(1, 0, &buf).unwrap(), vec![6, 4]);
        assert!(sm.subset(&[0, 1, 2, 0]).is_err());
        assert!(sm.subset(&[5]).is_err());
    }
}
