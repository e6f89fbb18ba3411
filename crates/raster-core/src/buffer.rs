//! Typed, multi-bank backing store for sample values.
//!
//! A [`DataBuffer`] holds numbers and nothing else: it knows its element
//! [`DataType`], how many banks it has, how many elements each bank exposes
//! and where logical element 0 sits inside each bank. It does not know about
//! pixels; a sample model computes `(bank, index)` addresses and the buffer
//! answers them.
//!
//! # Memory Layout
//!
//! ```text
//! bank 0: [ .. offset[0] .. | elem 0 | elem 1 | ... | elem size-1 | .. ]
//! bank 1: [ .. offset[1] .. | elem 0 | elem 1 | ... | elem size-1 | .. ]
//! ```
//!
//! Every bank satisfies `offset[bank] + size <= bank.len()`; constructors that
//! take caller storage verify this.
//!
//! # Value Conversions
//!
//! The integer accessors are the primitive path. Float and double accessors
//! narrow or widen through it for integer buffers; float and double buffers
//! answer them natively so no precision is lost in a round trip.
//!
//! Byte and ushort elements are unsigned: a write keeps the low 8/16 bits of
//! the integer and a read zero-extends. Short elements are sign-extended.
//!
//! # Usage
//!
//! ```rust
//! use raster_core::{DataBuffer, DataType};
//!
//! let mut buf = DataBuffer::with_banks(DataType::Byte, 16, 3).unwrap();
//! buf.set_bank_elem(2, 5, 300);
//! assert_eq!(buf.bank_elem(2, 5), 300 & 0xff);
//! assert_eq!(buf.num_banks(), 3);
//! ```

use crate::{DataType, Error, Result};

/// Primitive element stored in a data buffer bank.
///
/// The integer conversions define the buffer semantics; the float and double
/// conversions default to going through them and are overridden by the
/// floating-point element types.
pub trait Element: Copy + Default + PartialEq + Send + Sync + std::fmt::Debug + 'static {
    /// Data type tag of this element.
    const DATA_TYPE: DataType;

    /// Integer view of the element (zero-extended for unsigned types).
    fn to_int(self) -> i32;

    /// Stores an integer, truncating to the element width.
    fn from_int(v: i32) -> Self;

    /// Float view of the element.
    #[inline]
    fn to_float(self) -> f32 {
        self.to_int() as f32
    }

    /// Stores a float through the integer path.
    #[inline]
    fn from_float(v: f32) -> Self {
        Self::from_int(v as i32)
    }

    /// Double view of the element.
    #[inline]
    fn to_double(self) -> f64 {
        self.to_int() as f64
    }

    /// Stores a double through the integer path.
    #[inline]
    fn from_double(v: f64) -> Self {
        Self::from_int(v as i32)
    }
}

impl Element for u8 {
    const DATA_TYPE: DataType = DataType::Byte;

    #[inline]
    fn to_int(self) -> i32 {
        self as i32
    }

    #[inline]
    fn from_int(v: i32) -> Self {
        v as u8
    }
}

impl Element for u16 {
    const DATA_TYPE: DataType = DataType::UShort;

    #[inline]
    fn to_int(self) -> i32 {
        self as i32
    }

    #[inline]
    fn from_int(v: i32) -> Self {
        v as u16
    }
}

impl Element for i16 {
    const DATA_TYPE: DataType = DataType::Short;

    #[inline]
    fn to_int(self) -> i32 {
        self as i32
    }

    #[inline]
    fn from_int(v: i32) -> Self {
        v as i16
    }
}

impl Element for i32 {
    const DATA_TYPE: DataType = DataType::Int;

    #[inline]
    fn to_int(self) -> i32 {
        self
    }

    #[inline]
    fn from_int(v: i32) -> Self {
        v
    }
}

impl Element for f32 {
    const DATA_TYPE: DataType = DataType::Float;

    #[inline]
    fn to_int(self) -> i32 {
        self as i32
    }

    #[inline]
    fn from_int(v: i32) -> Self {
        v as f32
    }

    #[inline]
    fn to_float(self) -> f32 {
        self
    }

    #[inline]
    fn from_float(v: f32) -> Self {
        v
    }

    #[inline]
    fn to_double(self) -> f64 {
        self as f64
    }

    #[inline]
    fn from_double(v: f64) -> Self {
        v as f32
    }
}

impl Element for f64 {
    const DATA_TYPE: DataType = DataType::Double;

    #[inline]
    fn to_int(self) -> i32 {
        self as i32
    }

    #[inline]
    fn from_int(v: i32) -> Self {
        v as f64
    }

    #[inline]
    fn to_float(self) -> f32 {
        self as f32
    }

    #[inline]
    fn from_float(v: f32) -> Self {
        v as f64
    }

    #[inline]
    fn to_double(self) -> f64 {
        self
    }

    #[inline]
    fn from_double(v: f64) -> Self {
        v
    }
}

/// Mutation tracking state of a buffer.
///
/// A caching collaborator may snapshot derived data while a buffer is
/// `Stable` and call [`DataBuffer::mark_stable`] afterwards. Once raw mutable
/// storage has been handed out the buffer can no longer observe writes and
/// stays `Untrackable`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TrackState {
    /// No mutation since the last [`Banks::mark_stable`].
    #[default]
    Stable,
    /// Written through a setter since the last [`Banks::mark_stable`].
    Modified,
    /// Raw mutable storage was borrowed; writes can no longer be tracked.
    Untrackable,
}

/// Banked storage of one element type.
///
/// This is the typed body of every [`DataBuffer`] variant.
#[derive(Debug, Clone, PartialEq)]
pub struct Banks<T: Element> {
    banks: Vec<Vec<T>>,
    size: usize,
    offsets: Vec<usize>,
    state: TrackState,
}

impl<T: Element> Banks<T> {
    /// Creates a single zeroed bank of `size` elements.
    pub fn new(size: usize) -> Self {
        Self {
            banks: vec![vec![T::default(); size]],
            size,
            offsets: vec![0],
            state: TrackState::Stable,
        }
    }

    /// Creates `num_banks` zeroed banks of `size` elements each.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `num_banks` is zero.
    pub fn with_banks(size: usize, num_banks: usize) -> Result<Self> {
        if num_banks == 0 {
            return Err(Error::invalid_argument("a data buffer needs at least one bank"));
        }
        Ok(Self {
            banks: vec![vec![T::default(); size]; num_banks],
            size,
            offsets: vec![0; num_banks],
            state: TrackState::Stable,
        })
    }

    /// Wraps caller storage as a single bank exposing its first `size` elements.
    pub fn from_vec(data: Vec<T>, size: usize) -> Result<Self> {
        Self::from_vec_with_offset(data, size, 0)
    }

    /// Wraps caller storage as a single bank whose element 0 sits at `offset`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `offset + size` exceeds the storage length.
    pub fn from_vec_with_offset(data: Vec<T>, size: usize, offset: usize) -> Result<Self> {
        Self::from_banks_with_offsets(vec![data], size, vec![offset])
    }

    /// Wraps caller storage as multiple banks, all starting at offset 0.
    pub fn from_banks(banks: Vec<Vec<T>>, size: usize) -> Result<Self> {
        let offsets = vec![0; banks.len()];
        Self::from_banks_with_offsets(banks, size, offsets)
    }

    /// Wraps caller storage as multiple banks with per-bank offsets.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if there are no banks, if the number
    /// of offsets differs from the number of banks, or if any bank is shorter
    /// than `offset + size`.
    pub fn from_banks_with_offsets(
        banks: Vec<Vec<T>>,
        size: usize,
        offsets: Vec<usize>,
    ) -> Result<Self> {
        if banks.is_empty() {
            return Err(Error::invalid_argument("a data buffer needs at least one bank"));
        }
        if banks.len() != offsets.len() {
            return Err(Error::invalid_argument(format!(
                "{} banks but {} offsets",
                banks.len(),
                offsets.len()
            )));
        }
        for (bank, (data, &offset)) in banks.iter().zip(&offsets).enumerate() {
            let end = offset
                .checked_add(size)
                .ok_or_else(|| Error::overflow("bank offset plus size"))?;
            if end > data.len() {
                return Err(Error::invalid_argument(format!(
                    "bank {bank} holds {} elements, needs offset {offset} + size {size}",
                    data.len()
                )));
            }
        }
        Ok(Self {
            banks,
            size,
            offsets,
            state: TrackState::Stable,
        })
    }

    /// Logical element count of every bank.
    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of banks.
    #[inline]
    pub fn num_banks(&self) -> usize {
        self.banks.len()
    }

    /// Offset of bank 0.
    #[inline]
    pub fn offset(&self) -> usize {
        self.offsets[0]
    }

    /// Offsets of all banks.
    #[inline]
    pub fn offsets(&self) -> &[usize] {
        &self.offsets
    }

    /// Current mutation tracking state.
    #[inline]
    pub fn state(&self) -> TrackState {
        self.state
    }

    /// Resets a `Modified` buffer to `Stable`. `Untrackable` is permanent.
    #[inline]
    pub fn mark_stable(&mut self) {
        if self.state == TrackState::Modified {
            self.state = TrackState::Stable;
        }
    }

    /// Reads logical element `i` of `bank`.
    ///
    /// # Panics
    ///
    /// Panics if `bank` or the physical index is out of range, as slice indexing does.
    #[inline]
    pub fn get(&self, bank: usize, i: usize) -> T {
        self.banks[bank][i + self.offsets[bank]]
    }

    /// Reads logical element `i` of `bank`, `None` if outside the bank's logical size.
    #[inline]
    pub fn try_get(&self, bank: usize, i: usize) -> Option<T> {
        if i >= self.size {
            return None;
        }
        let offset = *self.offsets.get(bank)?;
        self.banks.get(bank)?.get(i + offset).copied()
    }

    /// Writes logical element `i` of `bank`.
    ///
    /// # Panics
    ///
    /// Panics if `bank` or the physical index is out of range.
    #[inline]
    pub fn set(&mut self, bank: usize, i: usize, value: T) {
        let offset = self.offsets[bank];
        self.banks[bank][i + offset] = value;
        self.touch();
    }

    /// Whole storage of bank 0, including elements before its offset.
    #[inline]
    pub fn data(&self) -> &[T] {
        &self.banks[0]
    }

    /// Whole storage of `bank`.
    ///
    /// # Panics
    ///
    /// Panics if `bank` is out of range.
    #[inline]
    pub fn bank_data(&self, bank: usize) -> &[T] {
        &self.banks[bank]
    }

    /// Mutable storage of bank 0. The buffer becomes [`TrackState::Untrackable`].
    #[inline]
    pub fn data_mut(&mut self) -> &mut [T] {
        self.bank_data_mut(0)
    }

    /// Mutable storage of `bank`. The buffer becomes [`TrackState::Untrackable`].
    #[inline]
    pub fn bank_data_mut(&mut self, bank: usize) -> &mut [T] {
        self.state = TrackState::Untrackable;
        &mut self.banks[bank]
    }

    /// Consumes the buffer, returning its banks.
    pub fn into_banks(self) -> Vec<Vec<T>> {
        self.banks
    }

    #[inline]
    fn touch(&mut self) {
        if self.state == TrackState::Stable {
            self.state = TrackState::Modified;
        }
    }
}

/// A data buffer of one of the six element types.
#[derive(Debug, Clone, PartialEq)]
pub enum DataBuffer {
    /// Unsigned 8-bit banks.
    Byte(Banks<u8>),
    /// Unsigned 16-bit banks.
    UShort(Banks<u16>),
    /// Signed 16-bit banks.
    Short(Banks<i16>),
    /// Signed 32-bit banks.
    Int(Banks<i32>),
    /// 32-bit float banks.
    Float(Banks<f32>),
    /// 64-bit float banks.
    Double(Banks<f64>),
}

macro_rules! dispatch {
    ($self:expr, $b:ident => $body:expr) => {
        match $self {
            DataBuffer::Byte($b) => $body,
            DataBuffer::UShort($b) => $body,
            DataBuffer::Short($b) => $body,
            DataBuffer::Int($b) => $body,
            DataBuffer::Float($b) => $body,
            DataBuffer::Double($b) => $body,
        }
    };
}

macro_rules! typed_access {
    ($get:ident, $get_mut:ident, $variant:ident, $t:ty) => {
        #[doc = concat!("Typed banks if this is a `", stringify!($variant), "` buffer.")]
        #[inline]
        pub fn $get(&self) -> Option<&Banks<$t>> {
            match self {
                DataBuffer::$variant(b) => Some(b),
                _ => None,
            }
        }

        #[doc = concat!("Mutable typed banks if this is a `", stringify!($variant), "` buffer.")]
        #[inline]
        pub fn $get_mut(&mut self) -> Option<&mut Banks<$t>> {
            match self {
                DataBuffer::$variant(b) => Some(b),
                _ => None,
            }
        }
    };
}

impl DataBuffer {
    /// Creates a single zeroed bank of `size` elements.
    pub fn new(data_type: DataType, size: usize) -> Self {
        match data_type {
            DataType::Byte => Self::Byte(Banks::new(size)),
            DataType::UShort => Self::UShort(Banks::new(size)),
            DataType::Short => Self::Short(Banks::new(size)),
            DataType::Int => Self::Int(Banks::new(size)),
            DataType::Float => Self::Float(Banks::new(size)),
            DataType::Double => Self::Double(Banks::new(size)),
        }
    }

    /// Creates `num_banks` zeroed banks of `size` elements each.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `num_banks` is zero.
    pub fn with_banks(data_type: DataType, size: usize, num_banks: usize) -> Result<Self> {
        Ok(match data_type {
            DataType::Byte => Self::Byte(Banks::with_banks(size, num_banks)?),
            DataType::UShort => Self::UShort(Banks::with_banks(size, num_banks)?),
            DataType::Short => Self::Short(Banks::with_banks(size, num_banks)?),
            DataType::Int => Self::Int(Banks::with_banks(size, num_banks)?),
            DataType::Float => Self::Float(Banks::with_banks(size, num_banks)?),
            DataType::Double => Self::Double(Banks::with_banks(size, num_banks)?),
        })
    }

    /// Element type.
    #[inline]
    pub fn data_type(&self) -> DataType {
        match self {
            Self::Byte(_) => DataType::Byte,
            Self::UShort(_) => DataType::UShort,
            Self::Short(_) => DataType::Short,
            Self::Int(_) => DataType::Int,
            Self::Float(_) => DataType::Float,
            Self::Double(_) => DataType::Double,
        }
    }

    /// Logical element count of every bank.
    #[inline]
    pub fn size(&self) -> usize {
        dispatch!(self, b => b.size())
    }

    /// Number of banks.
    #[inline]
    pub fn num_banks(&self) -> usize {
        dispatch!(self, b => b.num_banks())
    }

    /// Offset of bank 0.
    #[inline]
    pub fn offset(&self) -> usize {
        dispatch!(self, b => b.offset())
    }

    /// Offsets of all banks.
    #[inline]
    pub fn offsets(&self) -> &[usize] {
        dispatch!(self, b => b.offsets())
    }

    /// Current mutation tracking state.
    #[inline]
    pub fn state(&self) -> TrackState {
        dispatch!(self, b => b.state())
    }

    /// Resets a `Modified` buffer to `Stable`.
    #[inline]
    pub fn mark_stable(&mut self) {
        dispatch!(self, b => b.mark_stable())
    }

    /// Integer value of element `i` in bank 0.
    ///
    /// # Panics
    ///
    /// Panics if the index falls outside the bank storage.
    #[inline]
    pub fn elem(&self, i: usize) -> i32 {
        self.bank_elem(0, i)
    }

    /// Integer value of element `i` in `bank`.
    ///
    /// # Panics
    ///
    /// Panics if `bank` or the index falls outside the buffer storage.
    #[inline]
    pub fn bank_elem(&self, bank: usize, i: usize) -> i32 {
        dispatch!(self, b => b.get(bank, i).to_int())
    }

    /// Checked integer read, `None` outside the bank's logical size.
    #[inline]
    pub fn get_bank_elem(&self, bank: usize, i: usize) -> Option<i32> {
        dispatch!(self, b => b.try_get(bank, i).map(Element::to_int))
    }

    /// Writes an integer to element `i` in bank 0.
    #[inline]
    pub fn set_elem(&mut self, i: usize, value: i32) {
        self.set_bank_elem(0, i, value)
    }

    /// Writes an integer to element `i` in `bank`, truncating to the element width.
    #[inline]
    pub fn set_bank_elem(&mut self, bank: usize, i: usize, value: i32) {
        dispatch!(self, b => b.set(bank, i, Element::from_int(value)))
    }

    /// Float value of element `i` in bank 0.
    #[inline]
    pub fn elem_float(&self, i: usize) -> f32 {
        self.bank_elem_float(0, i)
    }

    /// Float value of element `i` in `bank`.
    #[inline]
    pub fn bank_elem_float(&self, bank: usize, i: usize) -> f32 {
        dispatch!(self, b => b.get(bank, i).to_float())
    }

    /// Writes a float to element `i` in bank 0.
    #[inline]
    pub fn set_elem_float(&mut self, i: usize, value: f32) {
        self.set_bank_elem_float(0, i, value)
    }

    /// Writes a float to element `i` in `bank`.
    #[inline]
    pub fn set_bank_elem_float(&mut self, bank: usize, i: usize, value: f32) {
        dispatch!(self, b => b.set(bank, i, Element::from_float(value)))
    }

    /// Double value of element `i` in bank 0.
    #[inline]
    pub fn elem_double(&self, i: usize) -> f64 {
        self.bank_elem_double(0, i)
    }

    /// Double value of element `i` in `bank`.
    #[inline]
    pub fn bank_elem_double(&self, bank: usize, i: usize) -> f64 {
        dispatch!(self, b => b.get(bank, i).to_double())
    }

    /// Writes a double to element `i` in bank 0.
    #[inline]
    pub fn set_elem_double(&mut self, i: usize, value: f64) {
        self.set_bank_elem_double(0, i, value)
    }

    /// Writes a double to element `i` in `bank`.
    #[inline]
    pub fn set_bank_elem_double(&mut self, bank: usize, i: usize, value: f64) {
        dispatch!(self, b => b.set(bank, i, Element::from_double(value)))
    }

    typed_access!(as_byte, as_byte_mut, Byte, u8);
    typed_access!(as_ushort, as_ushort_mut, UShort, u16);
    typed_access!(as_short, as_short_mut, Short, i16);
    typed_access!(as_int, as_int_mut, Int, i32);
    typed_access!(as_float, as_float_mut, Float, f32);
    typed_access!(as_double, as_double_mut, Double, f64);
}

macro_rules! from_banks {
    ($variant:ident, $t:ty) => {
        impl From<Banks<$t>> for DataBuffer {
            fn from(banks: Banks<$t>) -> Self {
                DataBuffer::$variant(banks)
            }
        }
    };
}

from_banks!(Byte, u8);
from_banks!(UShort, u16);
from_banks!(Short, i16);
from_banks!(Int, i32);
from_banks!(Float, f32);
from_banks!(Double, f64);

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_unsigned_presentation() {
        let mut buf = DataBuffer::new(DataType::Byte, 4);
        buf.set_elem(0, -1);
        assert_eq!(buf.elem(0), 255);
        buf.set_elem(1, 0x1ff);
        assert_eq!(buf.elem(1), 0xff);

        let mut buf = DataBuffer::new(DataType::UShort, 4);
        buf.set_elem(0, -2);
        assert_eq!(buf.elem(0), 0xfffe);
    }

    #[test]
    fn test_short_sign_extends() {
        let mut buf = DataBuffer::new(DataType::Short, 2);
        buf.set_elem(0, 0xffff);
        assert_eq!(buf.elem(0), -1);
        buf.set_elem(1, 0x18000);
        assert_eq!(buf.elem(1), -32768);
    }

    #[test]
    fn test_float_paths() {
        let mut ints = DataBuffer::new(DataType::Int, 1);
        ints.set_elem_float(0, 2.75);
        assert_eq!(ints.elem(0), 2);
        assert_relative_eq!(ints.elem_double(0), 2.0);

        let mut floats = DataBuffer::new(DataType::Float, 1);
        floats.set_elem_float(0, 2.75);
        assert_relative_eq!(floats.elem_float(0), 2.75);
        assert_eq!(floats.elem(0), 2);

        let mut doubles = DataBuffer::new(DataType::Double, 1);
        doubles.set_elem_double(0, 1.0e-12);
        assert_relative_eq!(doubles.elem_double(0), 1.0e-12);
    }

    #[test]
    fn test_offsets_shift_logical_index() {
        let banks = Banks::from_banks_with_offsets(
            vec![vec![1i32, 2, 3, 4], vec![10, 20, 30, 40]],
            2,
            vec![1, 2],
        )
        .unwrap();
        let buf = DataBuffer::from(banks);
        assert_eq!(buf.elem(0), 2);
        assert_eq!(buf.bank_elem(1, 1), 40);
        assert_eq!(buf.get_bank_elem(1, 2), None);
        assert_eq!(buf.get_bank_elem(3, 0), None);
    }

    #[test]
    fn test_storage_must_fit() {
        assert!(Banks::from_vec_with_offset(vec![0u8; 4], 3, 2).is_err());
        assert!(Banks::from_vec_with_offset(vec![0u8; 5], 3, 2).is_ok());
        assert!(Banks::<u8>::from_banks(vec![], 0).is_err());
        assert!(Banks::from_banks_with_offsets(vec![vec![0u8; 4]], 2, vec![0, 0]).is_err());
        assert!(DataBuffer::with_banks(DataType::Int, 4, 0).is_err());
    }

    #[test]
    #[should_panic]
    fn test_unchecked_index_panics() {
        let buf = DataBuffer::new(DataType::Int, 2);
        buf.elem(2);
    }

    #[test]
    fn test_track_state() {
        let mut buf = DataBuffer::new(DataType::Int, 2);
        assert_eq!(buf.state(), TrackState::Stable);
        buf.set_elem(0, 1);
        assert_eq!(buf.state(), TrackState::Modified);
        buf.mark_stable();
        assert_eq!(buf.state(), TrackState::Stable);

        buf.as_int_mut().unwrap().data_mut()[1] = 7;
        assert_eq!(buf.state(), TrackState::Untrackable);
        buf.mark_stable();
        assert_eq!(buf.state(), TrackState::Untrackable);
        assert_eq!(buf.elem(1), 7);
    }

    #[test]
    fn test_typed_access() {
        let buf = DataBuffer::new(DataType::Float, 3);
        assert!(buf.as_float().is_some());
        assert!(buf.as_int().is_none());
        assert_eq!(buf.as_float().unwrap().data().len(), 3);
    }
}
