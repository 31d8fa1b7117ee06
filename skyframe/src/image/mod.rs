//! Pixel planes with an origin.
//!
//! An [`Image`] owns a row-major [`Buffer2`] and remembers `xy0`, the PARENT
//! coordinate of its first pixel. Sub-regions are addressed through
//! [`ImageView`] / [`ImageViewMut`], which borrow the owner's storage: writes
//! through a mutable view land in the parent image, nothing is copied.
//!
//! Every sub-region request names its coordinate convention with
//! [`ImageOrigin`]. A box that does not fit under the declared convention is
//! an [`ImageError::Length`]; the two conventions are never guessed.

mod dynamic;
pub mod error;
mod view;

#[cfg(test)]
mod tests;

use std::fmt;
use std::ops::{DivAssign, MulAssign};

use common::Buffer2;
use num_traits::{Num, NumCast};
use strum_macros::Display;

use crate::geom::{BoxI, ExtentI, PointI};

pub use dynamic::DynImage;
pub use error::ImageError;
pub use view::{ImageView, ImageViewMut};

/// Coordinate convention for a sub-region box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "UPPERCASE")]
pub enum ImageOrigin {
    /// Box is in the same frame as the parent's `xy0`.
    Parent,
    /// Box is relative to the image's first pixel, `(0, 0)`.
    Local,
}

/// Storage precision of a pixel plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum Precision {
    U16,
    F32,
    F64,
}

/// Scalar types a pixel plane can hold.
pub trait Pixel:
    Copy + Default + PartialOrd + NumCast + Send + Sync + fmt::Debug + 'static
{
    const PRECISION: Precision;

    /// Borrow `image` as an `Image<Self>` if it has this precision.
    fn downcast(image: &DynImage) -> Option<&Image<Self>>;
}

impl Pixel for u16 {
    const PRECISION: Precision = Precision::U16;

    fn downcast(_image: &DynImage) -> Option<&Image<Self>> {
        None
    }
}

impl Pixel for f32 {
    const PRECISION: Precision = Precision::F32;

    fn downcast(image: &DynImage) -> Option<&Image<Self>> {
        match image {
            DynImage::F32(image) => Some(image),
            _ => None,
        }
    }
}

impl Pixel for f64 {
    const PRECISION: Precision = Precision::F64;

    fn downcast(image: &DynImage) -> Option<&Image<Self>> {
        match image {
            DynImage::F64(image) => Some(image),
            _ => None,
        }
    }
}

/// Single-precision image.
pub type ImageF = Image<f32>;
/// Double-precision image.
pub type ImageD = Image<f64>;

/// Pixel plane anchored at `xy0`.
#[derive(Debug, Clone, PartialEq)]
pub struct Image<T> {
    pixels: Buffer2<T>,
    xy0: PointI,
}

impl<T: Pixel> Image<T> {
    /// Zero-filled image covering `bbox`.
    pub fn new(bbox: BoxI) -> Self {
        Self::filled(bbox, T::default())
    }

    pub fn filled(bbox: BoxI, value: T) -> Self {
        Self {
            pixels: Buffer2::new_filled(bbox.width() as usize, bbox.height() as usize, value),
            xy0: bbox.min(),
        }
    }

    /// Zero-filled `width × height` image whose first pixel sits at `xy0`.
    pub fn from_dimensions(width: usize, height: usize, xy0: PointI) -> Self {
        Self {
            pixels: Buffer2::new_default(width, height),
            xy0,
        }
    }

    pub fn from_buffer(pixels: Buffer2<T>, xy0: PointI) -> Self {
        Self { pixels, xy0 }
    }

    #[inline]
    pub fn xy0(&self) -> PointI {
        self.xy0
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.pixels.width()
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.pixels.height()
    }

    #[inline]
    pub fn dimensions(&self) -> ExtentI {
        ExtentI::new(self.width() as i32, self.height() as i32)
    }

    /// Bounding box in PARENT coordinates.
    #[inline]
    pub fn bbox(&self) -> BoxI {
        BoxI::new(self.xy0, self.dimensions())
    }

    /// The whole pixel plane. Shares storage with the image.
    #[inline]
    pub fn array(&self) -> &Buffer2<T> {
        &self.pixels
    }

    /// Mutable access to the whole pixel plane. Writes change the image.
    #[inline]
    pub fn array_mut(&mut self) -> &mut Buffer2<T> {
        &mut self.pixels
    }

    /// Pixel at LOCAL `(x, y)`.
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> T {
        self.pixels[(x, y)]
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, value: T) {
        self.pixels[(x, y)] = value;
    }

    /// Pixel at a PARENT position, `None` outside the bbox.
    pub fn get_parent(&self, p: PointI) -> Option<T> {
        if !self.bbox().contains_point(p) {
            return None;
        }
        let local = p - self.xy0;
        Some(self.get(local.width as usize, local.height as usize))
    }

    /// Set every pixel to `value`.
    pub fn fill(&mut self, value: T) {
        self.pixels.fill(value);
    }

    /// Translate `bbox` into LOCAL coordinates and check it fits.
    pub(crate) fn local_box(&self, bbox: BoxI, origin: ImageOrigin) -> Result<BoxI, ImageError> {
        let out_of_bounds = || ImageError::Length {
            bbox,
            parent: self.bbox(),
            origin,
        };
        let shift = match origin {
            ImageOrigin::Parent => self.xy0,
            ImageOrigin::Local => PointI::new(0, 0),
        };
        // Widened so far-away boxes fail the bounds check instead of overflowing.
        let min_x = i32::try_from(<i64 as From<i32>>::from(bbox.min().x) - <i64 as From<i32>>::from(shift.x));
        let min_y = i32::try_from(<i64 as From<i32>>::from(bbox.min().y) - <i64 as From<i32>>::from(shift.y));
        let (Ok(min_x), Ok(min_y)) = (min_x, min_y) else {
            return Err(out_of_bounds());
        };
        let local = BoxI::new(PointI::new(min_x, min_y), bbox.dimensions());
        let frame = BoxI::new(PointI::new(0, 0), self.dimensions());
        if bbox.is_empty() || !frame.contains(&local) {
            return Err(out_of_bounds());
        }
        Ok(local)
    }

    /// Read-only view of a sub-region.
    pub fn view(&self, bbox: BoxI, origin: ImageOrigin) -> Result<ImageView<'_, T>, ImageError> {
        let local = self.local_box(bbox, origin)?;
        Ok(ImageView::new(&self.pixels, local, self.xy0))
    }

    /// Mutable view of a sub-region. Writes go straight into this image.
    pub fn view_mut(
        &mut self,
        bbox: BoxI,
        origin: ImageOrigin,
    ) -> Result<ImageViewMut<'_, T>, ImageError> {
        let local = self.local_box(bbox, origin)?;
        let xy0 = self.xy0;
        Ok(ImageViewMut::new(&mut self.pixels, local, xy0))
    }

    /// View of the whole image.
    pub fn as_view(&self) -> ImageView<'_, T> {
        let local = BoxI::new(PointI::new(0, 0), self.dimensions());
        ImageView::new(&self.pixels, local, self.xy0)
    }

    pub fn as_view_mut(&mut self) -> ImageViewMut<'_, T> {
        let local = BoxI::new(PointI::new(0, 0), self.dimensions());
        let xy0 = self.xy0;
        ImageViewMut::new(&mut self.pixels, local, xy0)
    }

    /// Deep copy of a sub-region, keeping its PARENT origin.
    pub fn crop(&self, bbox: BoxI, origin: ImageOrigin) -> Result<Image<T>, ImageError> {
        Ok(self.view(bbox, origin)?.to_image())
    }

    /// Copy with every pixel cast to `U`. Unrepresentable values become `U::default()`.
    pub fn convert<U: Pixel>(&self) -> Image<U> {
        Image {
            pixels: self
                .pixels
                .map(|&v| num_traits::cast(v).unwrap_or_default()),
            xy0: self.xy0,
        }
    }

    /// Largest pixel, ignoring NaN. `None` for an empty image.
    pub fn max(&self) -> Option<T> {
        self.as_view().max()
    }

    pub fn min(&self) -> Option<T> {
        self.as_view().min()
    }
}

impl<T: Pixel + Num> Image<T> {
    /// `self += rhs`, pixel by pixel. Extents must match; origins are ignored.
    pub fn add_assign_image(&mut self, rhs: &Image<T>) -> Result<(), ImageError> {
        self.as_view_mut().add_assign(&rhs.as_view())
    }

    /// `self -= rhs`, pixel by pixel.
    pub fn sub_assign_image(&mut self, rhs: &Image<T>) -> Result<(), ImageError> {
        self.as_view_mut().sub_assign(&rhs.as_view())
    }

    /// `self += rhs` where `rhs` carries its precision at runtime.
    pub fn try_add_dyn(&mut self, rhs: &DynImage) -> Result<(), ImageError> {
        self.as_view_mut().try_add_dyn(rhs)
    }
}

impl<T: Pixel + Num> MulAssign<T> for Image<T> {
    fn mul_assign(&mut self, rhs: T) {
        self.as_view_mut().scale(rhs);
    }
}

impl<T: Pixel + Num> DivAssign<T> for Image<T> {
    fn div_assign(&mut self, rhs: T) {
        self.pixels.iter_mut().for_each(|v| *v = *v / rhs);
    }
}
