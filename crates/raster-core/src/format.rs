//! Storage element types.
//!
//! [`DataType`] names the six primitive element types a data buffer can hold.
//! Each has a fixed bit width that the packed sample models rely on:
//!
//! | type     | bits | presented as      |
//! |----------|------|-------------------|
//! | `Byte`   | 8    | unsigned 0..=255  |
//! | `UShort` | 16   | unsigned 0..=65535|
//! | `Short`  | 16   | signed            |
//! | `Int`    | 32   | signed            |
//! | `Float`  | 32   | IEEE 754 single   |
//! | `Double` | 64   | IEEE 754 double   |
//!
//! # Usage
//!
//! ```rust
//! use raster_core::DataType;
//!
//! assert_eq!(DataType::UShort.bits(), 16);
//! assert_eq!(DataType::from_tag(3).unwrap(), DataType::Int);
//! assert!(DataType::from_tag(7).is_err());
//! ```

use crate::{Error, Result};

/// Primitive element type of a data buffer or transfer array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DataType {
    /// Unsigned 8-bit elements.
    #[default]
    Byte,
    /// Unsigned 16-bit elements.
    UShort,
    /// Signed 16-bit elements.
    Short,
    /// Signed 32-bit elements.
    Int,
    /// 32-bit floats.
    Float,
    /// 64-bit floats.
    Double,
}

impl DataType {
    /// All data types in tag order.
    pub const ALL: [DataType; 6] = [
        Self::Byte,
        Self::UShort,
        Self::Short,
        Self::Int,
        Self::Float,
        Self::Double,
    ];

    /// Number of bits per element.
    #[inline]
    pub const fn bits(&self) -> u32 {
        match self {
            Self::Byte => 8,
            Self::UShort | Self::Short => 16,
            Self::Int | Self::Float => 32,
            Self::Double => 64,
        }
    }

    /// Number of bytes per element.
    #[inline]
    pub const fn bytes(&self) -> usize {
        (self.bits() / 8) as usize
    }

    /// Whether this is a floating-point type.
    #[inline]
    pub const fn is_float(&self) -> bool {
        matches!(self, Self::Float | Self::Double)
    }

    /// Whether the packed sample models may store pixels in this type.
    ///
    /// Packing uses bit operations on the element, so only the unsigned
    /// byte/ushort and the int types qualify.
    #[inline]
    pub const fn is_packable(&self) -> bool {
        matches!(self, Self::Byte | Self::UShort | Self::Int)
    }

    /// Numeric tag, `0` for `Byte` through `5` for `Double`.
    #[inline]
    pub const fn tag(&self) -> i32 {
        match self {
            Self::Byte => 0,
            Self::UShort => 1,
            Self::Short => 2,
            Self::Int => 3,
            Self::Float => 4,
            Self::Double => 5,
        }
    }

    /// Resolves a numeric tag.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedDataType`] for any tag outside `0..=5`.
    pub fn from_tag(tag: i32) -> Result<Self> {
        match tag {
            0 => Ok(Self::Byte),
            1 => Ok(Self::UShort),
            2 => Ok(Self::Short),
            3 => Ok(Self::Int),
            4 => Ok(Self::Float),
            5 => Ok(Self::Double),
            _ => Err(Error::unsupported_data_type(format!("tag {tag}"))),
        }
    }

    /// Smallest unsigned integer type able to hold `bits` bits.
    ///
    /// Used to pick the transfer type of packed layouts.
    #[inline]
    pub const fn smallest_for_bits(bits: u32) -> DataType {
        if bits > 16 {
            Self::Int
        } else if bits > 8 {
            Self::UShort
        } else {
            Self::Byte
        }
    }

    /// Short name for display and parsing.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Byte => "byte",
            Self::UShort => "ushort",
            Self::Short => "short",
            Self::Int => "int",
            Self::Float => "float",
            Self::Double => "double",
        }
    }
}

impl std::fmt::Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for DataType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "byte" | "u8" => Ok(Self::Byte),
            "ushort" | "u16" => Ok(Self::UShort),
            "short" | "i16" => Ok(Self::Short),
            "int" | "i32" => Ok(Self::Int),
            "float" | "f32" => Ok(Self::Float),
            "double" | "f64" => Ok(Self::Double),
            _ => Err(Error::unsupported_data_type(s)),
        }
    }
}
