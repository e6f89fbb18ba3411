//! Rectangles for region accessors and raster bounds.
//!
//! # Coordinate System
//!
//! - Origin (0, 0) is the **top-left** corner
//! - X increases to the right, Y increases downward
//! - Rectangles are half-open: `[x, x + width) x [y, y + height)`
//!
//! Coordinates are signed: a raster may sit anywhere on the plane, and a
//! caller may hand in `-1` which must be rejected rather than wrap around.
//! Edge arithmetic is done in `i64` so that `x + width` never overflows.
//!
//! # Usage
//!
//! ```rust
//! use raster_core::Rect;
//!
//! let rect = Rect::new(10, 20, 100, 50);
//! assert!(rect.contains(15, 25));
//! assert!(!rect.contains(110, 25));
//!
//! let other = Rect::new(50, 40, 100, 50);
//! assert_eq!(rect.intersect(&other), Some(Rect::new(50, 40, 60, 30)));
//! ```

/// A rectangle defined by origin (x, y) and dimensions (width, height).
///
/// A rectangle with a non-positive width or height is empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rect {
    /// X coordinate of the left edge (inclusive)
    pub x: i32,
    /// Y coordinate of the top edge (inclusive)
    pub y: i32,
    /// Width in pixels
    pub width: i32,
    /// Height in pixels
    pub height: i32,
}

impl Rect {
    /// Creates a new rectangle with the given origin and dimensions.
    #[inline]
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Creates a rectangle at the origin with the given dimensions.
    #[inline]
    pub const fn from_size(width: i32, height: i32) -> Self {
        Self::new(0, 0, width, height)
    }

    /// X coordinate of the right edge (exclusive).
    #[inline]
    pub const fn right(&self) -> i64 {
        self.x as i64 + self.width as i64
    }

    /// Y coordinate of the bottom edge (exclusive).
    #[inline]
    pub const fn bottom(&self) -> i64 {
        self.y as i64 + self.height as i64
    }

    /// Area in pixels, zero when empty.
    #[inline]
    pub const fn area(&self) -> u64 {
        if self.is_empty() {
            0
        } else {
            self.width as u64 * self.height as u64
        }
    }

    /// Returns `true` if either dimension is not positive.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    /// Returns `true` if the point lies inside this rectangle.
    ///
    /// ```rust
    /// use raster_core::Rect;
    ///
    /// let rect = Rect::new(0, 0, 4, 2);
    /// assert!(rect.contains(3, 1));
    /// assert!(!rect.contains(4, 1));
    /// assert!(!rect.contains(-1, 0));
    /// ```
    #[inline]
    pub const fn contains(&self, px: i32, py: i32) -> bool {
        px >= self.x
            && (px as i64) < self.right()
            && py >= self.y
            && (py as i64) < self.bottom()
    }

    /// Returns `true` if `other` has non-negative dimensions and lies fully inside.
    ///
    /// Empty rectangles with an origin inside (or on the far edge of) this
    /// rectangle are contained; rectangles with negative dimensions never are.
    #[inline]
    pub const fn contains_rect(&self, other: &Rect) -> bool {
        other.width >= 0
            && other.height >= 0
            && other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }

    /// Returns the intersection with another rectangle, `None` if they don't overlap.
    pub fn intersect(&self, other: &Rect) -> Option<Rect> {
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());

        if (x as i64) < right && (y as i64) < bottom {
            Some(Rect::new(
                x,
                y,
                (right - x as i64) as i32,
                (bottom - y as i64) as i32,
            ))
        } else {
            None
        }
    }

    /// Returns this rectangle moved by (dx, dy), `None` if the origin would overflow.
    #[inline]
    pub fn translate(&self, dx: i32, dy: i32) -> Option<Rect> {
        Some(Rect::new(
            self.x.checked_add(dx)?,
            self.y.checked_add(dy)?,
            self.width,
            self.height,
        ))
    }

    /// Iterates all (x, y) coordinates in raster-scan order.
    ///
    /// ```rust
    /// use raster_core::Rect;
    ///
    /// let coords: Vec<_> = Rect::new(0, 0, 2, 2).iter_coords().collect();
    /// assert_eq!(coords, vec![(0, 0), (1, 0), (0, 1), (1, 1)]);
    /// ```
    pub fn iter_coords(&self) -> impl Iterator<Item = (i32, i32)> + '_ {
        let (w, h) = (self.width.max(0), self.height.max(0));
        (0..h).flat_map(move |j| (0..w).map(move |i| (self.x + i, self.y + j)))
    }
}

impl std::fmt::Display for Rect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Rect({}, {}, {}x{})", self.x, self.y, self.width, self.height)
    }
}
