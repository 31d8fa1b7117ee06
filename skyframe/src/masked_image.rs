//! Image, mask and variance planes sharing one origin.

use crate::geom::{BoxI, PointI};
use crate::image::{Image, ImageError, ImageOrigin, ImageView, ImageViewMut};
use crate::mask::{Mask, MaskPixel};

/// Pixel, mask and variance planes over the same bbox.
#[derive(Debug, Clone, PartialEq)]
pub struct MaskedImage {
    image: Image<f32>,
    mask: Mask,
    variance: Image<f32>,
}

/// Borrowed pixel arrays of all three planes, in row-major order.
#[derive(Debug, Clone, Copy)]
pub struct MaskedArrays<'a> {
    pub image: &'a [f32],
    pub mask: &'a [MaskPixel],
    pub variance: &'a [f32],
    pub width: usize,
    pub height: usize,
}

impl MaskedImage {
    /// Combine three planes. All must share the image's bbox.
    pub fn new(image: Image<f32>, mask: Mask, variance: Image<f32>) -> Result<Self, ImageError> {
        let expected = image.bbox();
        for actual in [mask.bbox(), variance.bbox()] {
            if actual != expected {
                return Err(ImageError::BBoxMismatch { expected, actual });
            }
        }
        Ok(Self {
            image,
            mask,
            variance,
        })
    }

    /// Blank planes covering `bbox`.
    pub fn from_bbox(bbox: BoxI) -> Self {
        Self {
            image: Image::new(bbox),
            mask: Mask::new(bbox),
            variance: Image::new(bbox),
        }
    }

    #[inline]
    pub fn bbox(&self) -> BoxI {
        self.image.bbox()
    }

    /// PARENT coordinate of the first pixel. Returned by value.
    #[inline]
    pub fn xy0(&self) -> PointI {
        self.image.xy0()
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.image.width()
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.image.height()
    }

    pub fn image(&self) -> &Image<f32> {
        &self.image
    }

    pub fn mask(&self) -> &Mask {
        &self.mask
    }

    pub fn mask_mut(&mut self) -> &mut Mask {
        &mut self.mask
    }

    pub fn variance(&self) -> &Image<f32> {
        &self.variance
    }

    /// Row-major arrays over all three planes. They alias the planes.
    pub fn arrays(&self) -> MaskedArrays<'_> {
        MaskedArrays {
            image: self.image.array().pixels(),
            mask: self.mask.image().array().pixels(),
            variance: self.variance.array().pixels(),
            width: self.width(),
            height: self.height(),
        }
    }

    /// View of a sub-region of the image plane.
    pub fn image_view(
        &self,
        bbox: BoxI,
        origin: ImageOrigin,
    ) -> Result<ImageView<'_, f32>, ImageError> {
        self.image.view(bbox, origin)
    }

    /// Mutable view of a sub-region of the image plane.
    pub fn image_view_mut(
        &mut self,
        bbox: BoxI,
        origin: ImageOrigin,
    ) -> Result<ImageViewMut<'_, f32>, ImageError> {
        self.image.view_mut(bbox, origin)
    }

    /// Subtract `rhs` from the image plane only. Mask and variance are untouched.
    pub fn sub_assign_image(&mut self, rhs: &Image<f32>) -> Result<(), ImageError> {
        self.image.sub_assign_image(rhs)
    }
}
