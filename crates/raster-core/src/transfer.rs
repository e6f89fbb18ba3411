//! Primitive arrays used for raw pixel transfer.
//!
//! `data_elements`/`set_data_elements` move one pixel's storage elements (or
//! a packed pixel's bits) between a buffer and a caller as a typed vector.
//! The element type is the sample model's *transfer type*, which can be
//! narrower than the storage type for packed layouts.

use crate::{DataBuffer, DataType, Error, Result};

/// A typed primitive vector tagged with its [`DataType`].
#[derive(Debug, Clone, PartialEq)]
pub enum TransferData {
    /// Unsigned bytes.
    Byte(Vec<u8>),
    /// Unsigned shorts.
    UShort(Vec<u16>),
    /// Signed shorts.
    Short(Vec<i16>),
    /// Signed ints.
    Int(Vec<i32>),
    /// Floats.
    Float(Vec<f32>),
    /// Doubles.
    Double(Vec<f64>),
}

macro_rules! each {
    ($self:expr, $v:ident => $body:expr) => {
        match $self {
            TransferData::Byte($v) => $body,
            TransferData::UShort($v) => $body,
            TransferData::Short($v) => $body,
            TransferData::Int($v) => $body,
            TransferData::Float($v) => $body,
            TransferData::Double($v) => $body,
        }
    };
}

impl TransferData {
    /// A zero-filled vector of `len` elements of `data_type`.
    pub fn zeroed(data_type: DataType, len: usize) -> Self {
        match data_type {
            DataType::Byte => Self::Byte(vec![0; len]),
            DataType::UShort => Self::UShort(vec![0; len]),
            DataType::Short => Self::Short(vec![0; len]),
            DataType::Int => Self::Int(vec![0; len]),
            DataType::Float => Self::Float(vec![0.0; len]),
            DataType::Double => Self::Double(vec![0.0; len]),
        }
    }

    /// Element type.
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

    /// Number of elements.
    #[inline]
    pub fn len(&self) -> usize {
        each!(self, v => v.len())
    }

    /// Returns `true` if there are no elements.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Integer view of element `idx`, zero-extended for unsigned types.
    ///
    /// # Panics
    ///
    /// Panics if `idx` is out of range.
    pub fn int_at(&self, idx: usize) -> i32 {
        match self {
            Self::Byte(v) => v[idx] as i32,
            Self::UShort(v) => v[idx] as i32,
            Self::Short(v) => v[idx] as i32,
            Self::Int(v) => v[idx],
            Self::Float(v) => v[idx] as i32,
            Self::Double(v) => v[idx] as i32,
        }
    }

    /// Stores an integer into element `idx`, truncating to the element width.
    ///
    /// # Panics
    ///
    /// Panics if `idx` is out of range.
    pub fn set_int_at(&mut self, idx: usize, value: i32) {
        match self {
            Self::Byte(v) => v[idx] = value as u8,
            Self::UShort(v) => v[idx] = value as u16,
            Self::Short(v) => v[idx] = value as i16,
            Self::Int(v) => v[idx] = value,
            Self::Float(v) => v[idx] = value as f32,
            Self::Double(v) => v[idx] = value as f64,
        }
    }

    /// Loads buffer element `(bank, i)` into slot `idx`.
    ///
    /// Integer transfer types take the buffer's integer view, float and double
    /// transfer types take its float/double view.
    pub fn load(&mut self, idx: usize, buffer: &DataBuffer, bank: usize, i: usize) {
        match self {
            Self::Float(v) => v[idx] = buffer.bank_elem_float(bank, i),
            Self::Double(v) => v[idx] = buffer.bank_elem_double(bank, i),
            _ => self.set_int_at(idx, buffer.bank_elem(bank, i)),
        }
    }

    /// Stores slot `idx` into buffer element `(bank, i)`.
    pub fn store(&self, idx: usize, buffer: &mut DataBuffer, bank: usize, i: usize) {
        match self {
            Self::Float(v) => buffer.set_bank_elem_float(bank, i, v[idx]),
            Self::Double(v) => buffer.set_bank_elem_double(bank, i, v[idx]),
            _ => buffer.set_bank_elem(bank, i, self.int_at(idx)),
        }
    }

    /// Appends all elements of `other`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TransferTypeMismatch`] if the element types differ.
    pub fn extend_from(&mut self, other: &TransferData) -> Result<()> {
        match (self, other) {
            (Self::Byte(a), Self::Byte(b)) => a.extend_from_slice(b),
            (Self::UShort(a), Self::UShort(b)) => a.extend_from_slice(b),
            (Self::Short(a), Self::Short(b)) => a.extend_from_slice(b),
            (Self::Int(a), Self::Int(b)) => a.extend_from_slice(b),
            (Self::Float(a), Self::Float(b)) => a.extend_from_slice(b),
            (Self::Double(a), Self::Double(b)) => a.extend_from_slice(b),
            (a, b) => {
                return Err(Error::TransferTypeMismatch {
                    expected: a.data_type(),
                    got: b.data_type(),
                });
            }
        }
        Ok(())
    }

    /// Copies `len` elements starting at `start` into a new vector.
    ///
    /// # Panics
    ///
    /// Panics if the range is out of bounds.
    pub fn slice(&self, start: usize, len: usize) -> TransferData {
        let range = start..start + len;
        match self {
            Self::Byte(v) => Self::Byte(v[range].to_vec()),
            Self::UShort(v) => Self::UShort(v[range].to_vec()),
            Self::Short(v) => Self::Short(v[range].to_vec()),
            Self::Int(v) => Self::Int(v[range].to_vec()),
            Self::Float(v) => Self::Float(v[range].to_vec()),
            Self::Double(v) => Self::Double(v[range].to_vec()),
        }
    }

    /// Verifies the element type and that at least `needed` elements are present.
    ///
    /// # Errors
    ///
    /// [`Error::TransferTypeMismatch`] or [`Error::ArrayTooSmall`].
    pub fn check(&self, expected: DataType, needed: usize) -> Result<()> {
        if self.data_type() != expected {
            return Err(Error::TransferTypeMismatch {
                expected,
                got: self.data_type(),
            });
        }
        if self.len() < needed {
            return Err(Error::array_too_small(needed, self.len()));
        }
        Ok(())
    }
}

macro_rules! from_vec {
    ($variant:ident, $t:ty) => {
        impl From<Vec<$t>> for TransferData {
            fn from(v: Vec<$t>) -> Self {
                TransferData::$variant(v)
            }
        }
    };
}

from_vec!(Byte, u8);
from_vec!(UShort, u16);
from_vec!(Short, i16);
from_vec!(Int, i32);
from_vec!(Float, f32);
from_vec!(Double, f64);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_int_view() {
        let mut t = TransferData::zeroed(DataType::Byte, 2);
        t.set_int_at(0, 0x1ab);
        assert_eq!(t.int_at(0), 0xab);

        let mut t = TransferData::zeroed(DataType::Short, 1);
        t.set_int_at(0, 0xffff);
        assert_eq!(t.int_at(0), -1);
    }

    #[test]
    fn test_load_store_through_buffer() {
        let mut buf = DataBuffer::with_banks(DataType::Short, 4, 2).unwrap();
        buf.set_bank_elem(1, 3, -7);

        let mut t = TransferData::zeroed(DataType::Short, 1);
        t.load(0, &buf, 1, 3);
        assert_eq!(t, TransferData::Short(vec![-7]));

        t.store(0, &mut buf, 0, 0);
        assert_eq!(buf.bank_elem(0, 0), -7);
    }

    #[test]
    fn test_float_load_keeps_precision() {
        let mut buf = DataBuffer::new(DataType::Float, 1);
        buf.set_elem_float(0, 0.25);
        let mut t = TransferData::zeroed(DataType::Float, 1);
        t.load(0, &buf, 0, 0);
        assert_eq!(t, TransferData::Float(vec![0.25]));
    }

    #[test]
    fn test_extend_and_slice() {
        let mut a = TransferData::from(vec![1u16, 2]);
        a.extend_from(&TransferData::from(vec![3u16])).unwrap();
        assert_eq!(a.slice(1, 2), TransferData::UShort(vec![2, 3]));
        assert!(a.extend_from(&TransferData::from(vec![1u8])).is_err());
    }

    #[test]
    fn test_check() {
        let t = TransferData::from(vec![1i32]);
        assert!(t.check(DataType::Int, 1).is_ok());
        assert!(matches!(
            t.check(DataType::Byte, 1),
            Err(Error::TransferTypeMismatch { .. })
        ));
        assert!(matches!(
            t.check(DataType::Int, 2),
            Err(Error::ArrayTooSmall { needed: 2, got: 1 })
        ));
    }
}
