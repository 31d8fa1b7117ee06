//! Integer pixel geometry: points, extents and inclusive boxes.
//!
//! Coordinates are signed because a frame's origin (`xy0`) may sit anywhere,
//! including at negative positions (a centered PSF image, for example).

use std::fmt;
use std::ops::{Add, Neg, Sub};

use serde::{Deserialize, Serialize};

/// Integer pixel position.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PointI {
    pub x: i32,
    pub y: i32,
}

impl PointI {
    #[inline]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Move this point by `offset` **in place**.
    ///
    /// Returns nothing. Use [`PointI::shifted`] to get a moved copy.
    #[inline]
    pub fn shift(&mut self, offset: ExtentI) {
        self.x += offset.width;
        self.y += offset.height;
    }

    /// Copy of this point moved by `offset`. `self` is unchanged.
    #[inline]
    #[must_use]
    pub const fn shifted(self, offset: ExtentI) -> Self {
        Self {
            x: self.x + offset.width,
            y: self.y + offset.height,
        }
    }

    /// [`PointI::shifted`], or `None` if a coordinate leaves `i32`.
    #[inline]
    pub fn checked_shifted(self, offset: ExtentI) -> Option<Self> {
        Some(Self::new(
            self.x.checked_add(offset.width)?,
            self.y.checked_add(offset.height)?,
        ))
    }
}

impl fmt::Display for PointI {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Integer size or offset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExtentI {
    pub width: i32,
    pub height: i32,
}

impl ExtentI {
    #[inline]
    pub const fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }
}

impl fmt::Display for ExtentI {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl Add<ExtentI> for PointI {
    type Output = PointI;

    #[inline]
    fn add(self, rhs: ExtentI) -> PointI {
        self.shifted(rhs)
    }
}

impl Sub<ExtentI> for PointI {
    type Output = PointI;

    #[inline]
    fn sub(self, rhs: ExtentI) -> PointI {
        self.shifted(-rhs)
    }
}

impl Sub<PointI> for PointI {
    type Output = ExtentI;

    #[inline]
    fn sub(self, rhs: PointI) -> ExtentI {
        ExtentI::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Neg for ExtentI {
    type Output = ExtentI;

    #[inline]
    fn neg(self) -> ExtentI {
        ExtentI::new(-self.width, -self.height)
    }
}

/// Axis-aligned integer box with inclusive bounds.
///
/// A pixel `(x, y)` is inside if `min.x <= x <= max.x` and `min.y <= y <= max.y`.
/// A box built from a non-positive extent is empty.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct BoxI {
    min: PointI,
    dimensions: ExtentI,
}

impl BoxI {
    /// Box with corner `min` and size `extent`.
    #[inline]
    pub const fn new(min: PointI, extent: ExtentI) -> Self {
        if extent.width <= 0 || extent.height <= 0 {
            return Self::empty();
        }
        Self {
            min,
            dimensions: extent,
        }
    }

    /// Box spanning two inclusive corners, in any order.
    pub fn from_corners(a: PointI, b: PointI) -> Self {
        let min = PointI::new(a.x.min(b.x), a.y.min(b.y));
        let max = PointI::new(a.x.max(b.x), a.y.max(b.y));
        Self::new(min, ExtentI::new(max.x - min.x + 1, max.y - min.y + 1))
    }

    #[inline]
    pub const fn empty() -> Self {
        Self {
            min: PointI::new(0, 0),
            dimensions: ExtentI::new(0, 0),
        }
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.dimensions.width == 0 || self.dimensions.height == 0
    }

    #[inline]
    pub const fn min(&self) -> PointI {
        self.min
    }

    /// Inclusive maximum corner. Meaningless for an empty box.
    ///
    /// The corner must fit in `i32`; see [`BoxI::checked_max`] for boxes
    /// built from untrusted input.
    #[inline]
    pub const fn max(&self) -> PointI {
        PointI::new(
            self.min.x + self.dimensions.width - 1,
            self.min.y + self.dimensions.height - 1,
        )
    }

    pub fn checked_max(&self) -> Option<PointI> {
        let (x, y) = self.wide_max();
        Some(PointI::new(i32::try_from(x).ok()?, i32::try_from(y).ok()?))
    }

    /// Inclusive maximum corner, widened so it never overflows.
    #[inline]
    const fn wide_max(&self) -> (i64, i64) {
        (
            self.min.x as i64 + self.dimensions.width as i64 - 1,
            self.min.y as i64 + self.dimensions.height as i64 - 1,
        )
    }

    #[inline]
    pub const fn dimensions(&self) -> ExtentI {
        self.dimensions
    }

    #[inline]
    pub const fn width(&self) -> i32 {
        self.dimensions.width
    }

    #[inline]
    pub const fn height(&self) -> i32 {
        self.dimensions.height
    }

    #[inline]
    pub const fn area(&self) -> usize {
        self.dimensions.width as usize * self.dimensions.height as usize
    }

    #[inline]
    pub const fn contains_point(&self, p: PointI) -> bool {
        let (max_x, max_y) = self.wide_max();
        !self.is_empty()
            && p.x >= self.min.x
            && p.y >= self.min.y
            && p.x as i64 <= max_x
            && p.y as i64 <= max_y
    }

    /// True if every pixel of `other` is inside `self`. An empty `other` is contained.
    #[inline]
    pub fn contains(&self, other: &BoxI) -> bool {
        if other.is_empty() {
            return true;
        }
        let (max_x, max_y) = self.wide_max();
        let (other_x, other_y) = other.wide_max();
        self.contains_point(other.min) && other_x <= max_x && other_y <= max_y
    }

    /// Same box moved by `offset`.
    #[inline]
    #[must_use]
    pub fn shifted(&self, offset: ExtentI) -> Self {
        if self.is_empty() {
            return *self;
        }
        Self::new(self.min.shifted(offset), self.dimensions)
    }

    /// Overlap of two boxes, empty if they are disjoint.
    pub fn intersection(&self, other: &BoxI) -> Self {
        if self.is_empty() || other.is_empty() {
            return Self::empty();
        }
        let min = PointI::new(self.min.x.max(other.min.x), self.min.y.max(other.min.y));
        let max = PointI::new(
            self.max().x.min(other.max().x),
            self.max().y.min(other.max().y),
        );
        if max.x < min.x || max.y < min.y {
            return Self::empty();
        }
        Self::from_corners(min, max)
    }

    /// Grow to include `p`.
    pub fn include(&mut self, p: PointI) {
        if self.is_empty() {
            *self = Self::new(p, ExtentI::new(1, 1));
            return;
        }
        let max = self.max();
        *self = Self::from_corners(
            PointI::new(self.min.x.min(p.x), self.min.y.min(p.y)),
            PointI::new(max.x.max(p.x), max.y.max(p.y)),
        );
    }
}

impl fmt::Display for BoxI {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "BoxI(empty)");
        }
        let (max_x, max_y) = self.wide_max();
        write!(
            f,
            "BoxI(minimum={}, maximum=({max_x}, {max_y}))",
            self.min
        )
    }
}
