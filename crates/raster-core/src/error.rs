//! Error types for raster addressing operations.
//!
//! Every failure in this layer is immediate and local: a construction-time
//! shape error, a call-time bounds error, or a capacity overflow. Nothing is
//! retried and nothing is softened into a warning.
//!
//! # Usage
//!
//! ```rust
//! use raster_core::{Error, Result};
//!
//! fn check(x: i32, y: i32, width: i32, height: i32) -> Result<()> {
//!     if x < 0 || y < 0 || x >= width || y >= height {
//!         return Err(Error::out_of_bounds(x, y, width, height));
//!     }
//!     Ok(())
//! }
//!
//! assert!(check(4, 0, 4, 4).unwrap_err().is_bounds_error());
//! ```

use crate::DataType;
use thiserror::Error;

/// Result type alias using [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by data buffers, sample models and rasters.
///
/// # Categories
///
/// - **Shape errors** (construction time): [`InvalidArgument`](Error::InvalidArgument),
///   [`InvalidDimensions`](Error::InvalidDimensions),
///   [`InvalidBitsPerPixel`](Error::InvalidBitsPerPixel),
///   [`NonContiguousMask`](Error::NonContiguousMask),
///   [`UnsupportedDataType`](Error::UnsupportedDataType),
///   [`Overflow`](Error::Overflow)
/// - **Bounds errors** (call time): [`OutOfBounds`](Error::OutOfBounds),
///   [`InvalidRegion`](Error::InvalidRegion), [`BandOutOfRange`](Error::BandOutOfRange),
///   [`ArrayTooSmall`](Error::ArrayTooSmall)
/// - **Compatibility errors**: [`TransferTypeMismatch`](Error::TransferTypeMismatch),
///   [`IncompatibleBuffer`](Error::IncompatibleBuffer)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Pixel coordinates lie outside `[0, width) x [0, height)`.
    #[error("coordinate ({x}, {y}) out of bounds for {width}x{height}")]
    OutOfBounds {
        /// X coordinate that was accessed
        x: i32,
        /// Y coordinate that was accessed
        y: i32,
        /// Width of the addressed area
        width: i32,
        /// Height of the addressed area
        height: i32,
    },

    /// A rectangular region does not lie fully inside the addressed area.
    #[error("region ({rx}, {ry}, {rw}x{rh}) exceeds bounds ({x}, {y}, {width}x{height})")]
    InvalidRegion {
        /// Region X origin
        rx: i32,
        /// Region Y origin
        ry: i32,
        /// Region width
        rw: i32,
        /// Region height
        rh: i32,
        /// Bounds X origin
        x: i32,
        /// Bounds Y origin
        y: i32,
        /// Bounds width
        width: i32,
        /// Bounds height
        height: i32,
    },

    /// Band index is not below the number of bands.
    #[error("band {band} out of range, model has {num_bands} band(s)")]
    BandOutOfRange {
        /// Requested band
        band: usize,
        /// Number of bands available
        num_bands: usize,
    },

    /// Caller supplied output or input array is shorter than required.
    #[error("array too small: need {needed} elements, got {got}")]
    ArrayTooSmall {
        /// Required element count
        needed: usize,
        /// Supplied element count
        got: usize,
    },

    /// Width or height is not positive, or their product does not fit.
    #[error("invalid dimensions: {width}x{height} ({reason})")]
    InvalidDimensions {
        /// Requested width
        width: i32,
        /// Requested height
        height: i32,
        /// Why the dimensions are rejected
        reason: String,
    },

    /// Bits per pixel would make a pixel straddle a storage element.
    #[error("{bits} bits per pixel does not divide {data_type} elements evenly")]
    InvalidBitsPerPixel {
        /// Requested bits per pixel
        bits: u32,
        /// Storage data type
        data_type: DataType,
    },

    /// A band mask is not a single run of set bits.
    #[error("mask {mask:#x} of band {band} must be contiguous")]
    NonContiguousMask {
        /// Band whose mask was rejected
        band: usize,
        /// The mask after truncation to the storage width
        mask: u32,
    },

    /// Data type tag or data type is not accepted here.
    #[error("unsupported data type: {0}")]
    UnsupportedDataType(String),

    /// Transfer data carries a different element type than the model expects.
    #[error("transfer type mismatch: expected {expected}, got {got}")]
    TransferTypeMismatch {
        /// Transfer type of the model
        expected: DataType,
        /// Element type of the supplied data
        got: DataType,
    },

    /// A data buffer cannot back the given sample model.
    #[error("incompatible data buffer: {0}")]
    IncompatibleBuffer(String),

    /// Stride, offset or size arithmetic exceeds the 32-bit element range.
    #[error("overflow: {0}")]
    Overflow(String),

    /// Any other illegal argument.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl Error {
    /// Creates an [`Error::OutOfBounds`] error.
    #[inline]
    pub fn out_of_bounds(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self::OutOfBounds {
            x,
            y,
            width,
            height,
        }
    }

    /// Creates an [`Error::InvalidRegion`] error for `region` checked against `bounds`.
    #[inline]
    pub fn invalid_region(region: crate::Rect, bounds: crate::Rect) -> Self {
        Self::InvalidRegion {
            rx: region.x,
            ry: region.y,
            rw: region.width,
            rh: region.height,
            x: bounds.x,
            y: bounds.y,
            width: bounds.width,
            height: bounds.height,
        }
    }

    /// Creates an [`Error::BandOutOfRange`] error.
    #[inline]
    pub fn band_out_of_range(band: usize, num_bands: usize) -> Self {
        Self::BandOutOfRange { band, num_bands }
    }

    /// Creates an [`Error::ArrayTooSmall`] error.
    #[inline]
    pub fn array_too_small(needed: usize, got: usize) -> Self {
        Self::ArrayTooSmall { needed, got }
    }

    /// Creates an [`Error::InvalidDimensions`] error.
    #[inline]
    pub fn invalid_dimensions(width: i32, height: i32, reason: impl Into<String>) -> Self {
        Self::InvalidDimensions {
            width,
            height,
            reason: reason.into(),
        }
    }

    /// Creates an [`Error::UnsupportedDataType`] error.
    #[inline]
    pub fn unsupported_data_type(what: impl Into<String>) -> Self {
        Self::UnsupportedDataType(what.into())
    }

    /// Creates an [`Error::IncompatibleBuffer`] error.
    #[inline]
    pub fn incompatible_buffer(msg: impl Into<String>) -> Self {
        Self::IncompatibleBuffer(msg.into())
    }

    /// Creates an [`Error::Overflow`] error.
    #[inline]
    pub fn overflow(msg: impl Into<String>) -> Self {
        Self::Overflow(msg.into())
    }

    /// Creates an [`Error::InvalidArgument`] error.
    #[inline]
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Returns `true` for call-time index and region failures.
    #[inline]
    pub fn is_bounds_error(&self) -> bool {
        matches!(
            self,
            Self::OutOfBounds { .. }
                | Self::InvalidRegion { .. }
                | Self::BandOutOfRange { .. }
                | Self::ArrayTooSmall { .. }
        )
    }

    /// Returns `true` for construction-time shape failures.
    #[inline]
    pub fn is_shape_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidArgument(_)
                | Self::InvalidDimensions { .. }
                | Self::InvalidBitsPerPixel { .. }
                | Self::NonContiguousMask { .. }
                | Self::UnsupportedDataType(_)
                | Self::Overflow(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Rect;

    #[test]
    fn test_out_of_bounds() {
        let err = Error::out_of_bounds(-1, 3, 8, 4);
        let msg = err.to_string();
        assert!(msg.contains("(-1, 3)"));
        assert!(msg.contains("8x4"));
        assert!(err.is_bounds_error());
        assert!(!err.is_shape_error());
    }

    #[test]
    fn test_invalid_region() {
        let err = Error::invalid_region(Rect::new(2, 2, 4, 4), Rect::new(0, 0, 4, 4));
        assert!(err.to_string().contains("(2, 2, 4x4)"));
        assert!(err.is_bounds_error());
    }

    #[test]
    fn test_mask_message_is_hex() {
        let err = Error::NonContiguousMask { band: 1, mask: 0xf0f };
        assert!(err.to_string().contains("0xf0f"));
        assert!(err.is_shape_error());
    }

    #[test]
    fn test_bits_per_pixel_message() {
        let err = Error::InvalidBitsPerPixel {
            bits: 3,
            data_type: DataType::Byte,
        };
        assert_eq!(
            err.to_string(),
            "3 bits per pixel does not divide byte elements evenly"
        );
    }
}
