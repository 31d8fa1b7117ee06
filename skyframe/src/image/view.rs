//! Borrowed sub-regions of an [`Image`](super::Image).
//!
//! A view is the owner's buffer plus a LOCAL box into it. Row accessors hand
//! out slices of the owner's storage, so a mutable view aliases its parent:
//! writing a constant into the view and reading the parent at the same
//! coordinates returns that constant. Borrowing rules keep at most one mutable
//! view of an image alive at a time.

use common::Buffer2;
use num_traits::{Num, Signed};

use super::{DynImage, Image, ImageError, Pixel};
use crate::geom::{BoxI, ExtentI, PointI};

/// Read-only window onto an image's pixels.
#[derive(Debug, Clone, Copy)]
pub struct ImageView<'a, T> {
    pixels: &'a Buffer2<T>,
    local: BoxI,
    parent_xy0: PointI,
}

/// Mutable window onto an image's pixels.
#[derive(Debug)]
pub struct ImageViewMut<'a, T> {
    pixels: &'a mut Buffer2<T>,
    local: BoxI,
    parent_xy0: PointI,
}

impl<'a, T: Pixel> ImageView<'a, T> {
    pub(super) fn new(pixels: &'a Buffer2<T>, local: BoxI, parent_xy0: PointI) -> Self {
        Self {
            pixels,
            local,
            parent_xy0,
        }
    }

    /// PARENT coordinate of the view's first pixel.
    #[inline]
    pub fn xy0(&self) -> PointI {
        self.parent_xy0 + (self.local.min() - PointI::new(0, 0))
    }

    #[inline]
    pub fn bbox(&self) -> BoxI {
        BoxI::new(self.xy0(), self.local.dimensions())
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.local.width() as usize
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.local.height() as usize
    }

    #[inline]
    pub fn dimensions(&self) -> ExtentI {
        self.local.dimensions()
    }

    /// Pixel at view-relative `(x, y)`.
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> T {
        debug_assert!(x < self.width() && y < self.height());
        let min = self.local.min();
        self.pixels[(min.x as usize + x, min.y as usize + y)]
    }

    /// Row `y` of the view, borrowed from the parent's storage.
    #[inline]
    pub fn row(&self, y: usize) -> &'a [T] {
        let min = self.local.min();
        let x0 = min.x as usize;
        let pixels: &'a Buffer2<T> = self.pixels;
        pixels.row_segment(min.y as usize + y, x0..x0 + self.width())
    }

    pub fn rows(&self) -> impl Iterator<Item = &'a [T]> + '_ {
        (0..self.height()).map(move |y| self.row(y))
    }

    pub fn iter(&self) -> impl Iterator<Item = T> + '_ {
        self.rows().flat_map(|row| row.iter().copied())
    }

    /// Deep copy with the view's PARENT origin.
    pub fn to_image(&self) -> Image<T> {
        let pixels: Vec<T> = self.iter().collect();
        Image::from_buffer(
            Buffer2::new(self.width(), self.height(), pixels),
            self.xy0(),
        )
    }

    /// Largest pixel, skipping NaN.
    pub fn max(&self) -> Option<T> {
        self.extreme(|v, m| v > m)
    }

    /// Smallest pixel, skipping NaN.
    pub fn min(&self) -> Option<T> {
        self.extreme(|v, m| v < m)
    }

    fn extreme(&self, better: impl Fn(T, T) -> bool) -> Option<T> {
        self.iter()
            .filter(|v| v.partial_cmp(v).is_some())
            .fold(None, |acc, v| match acc {
                Some(m) if !better(v, m) => Some(m),
                _ => Some(v),
            })
    }
}

impl<'a, T: Pixel> ImageViewMut<'a, T> {
    pub(super) fn new(pixels: &'a mut Buffer2<T>, local: BoxI, parent_xy0: PointI) -> Self {
        Self {
            pixels,
            local,
            parent_xy0,
        }
    }

    /// Reborrow as a read-only view.
    pub fn as_view(&self) -> ImageView<'_, T> {
        ImageView::new(&*self.pixels, self.local, self.parent_xy0)
    }

    #[inline]
    pub fn xy0(&self) -> PointI {
        self.as_view().xy0()
    }

    #[inline]
    pub fn bbox(&self) -> BoxI {
        self.as_view().bbox()
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.local.width() as usize
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.local.height() as usize
    }

    #[inline]
    pub fn dimensions(&self) -> ExtentI {
        self.local.dimensions()
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> T {
        self.as_view().get(x, y)
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, value: T) {
        debug_assert!(x < self.width() && y < self.height());
        let min = self.local.min();
        self.pixels[(min.x as usize + x, min.y as usize + y)] = value;
    }

    /// Row `y` of the view. Writes land in the parent image.
    #[inline]
    pub fn row_mut(&mut self, y: usize) -> &mut [T] {
        let min = self.local.min();
        let x0 = min.x as usize;
        let width = self.width();
        self.pixels
            .row_segment_mut(min.y as usize + y, x0..x0 + width)
    }

    /// Apply `f` to every pixel in place.
    pub fn for_each_mut(&mut self, mut f: impl FnMut(&mut T)) {
        for y in 0..self.height() {
            self.row_mut(y).iter_mut().for_each(&mut f);
        }
    }

    pub fn fill(&mut self, value: T) {
        for y in 0..self.height() {
            self.row_mut(y).fill(value);
        }
    }

    /// Overwrite this region with `src`, pixel for pixel.
    ///
    /// Extents must match; origins are ignored. This copies, it does not add.
    pub fn assign(&mut self, src: &ImageView<'_, T>) -> Result<(), ImageError> {
        self.check_extent(src.dimensions())?;
        for y in 0..self.height() {
            self.row_mut(y).copy_from_slice(src.row(y));
        }
        Ok(())
    }

    /// Combine `src` into this region row by row with `op(dst, src)`.
    fn zip_with(
        &mut self,
        src: &ImageView<'_, T>,
        op: impl Fn(&mut T, T),
    ) -> Result<(), ImageError> {
        self.check_extent(src.dimensions())?;
        for y in 0..self.height() {
            let src_row = src.row(y);
            for (dst, &s) in self.row_mut(y).iter_mut().zip(src_row) {
                op(dst, s);
            }
        }
        Ok(())
    }

    fn check_extent(&self, rhs: ExtentI) -> Result<(), ImageError> {
        if self.dimensions() != rhs {
            return Err(ImageError::ExtentMismatch {
                lhs: self.dimensions(),
                rhs,
            });
        }
        Ok(())
    }
}

impl<T: Pixel + Num> ImageViewMut<'_, T> {
    pub fn add_assign(&mut self, rhs: &ImageView<'_, T>) -> Result<(), ImageError> {
        self.zip_with(rhs, |d, s| *d = *d + s)
    }

    pub fn sub_assign(&mut self, rhs: &ImageView<'_, T>) -> Result<(), ImageError> {
        self.zip_with(rhs, |d, s| *d = *d - s)
    }

    /// Add an image whose precision is only known at runtime.
    ///
    /// Fails with [`ImageError::PrecisionMismatch`] unless `rhs` holds `T` pixels.
    pub fn try_add_dyn(&mut self, rhs: &DynImage) -> Result<(), ImageError> {
        let rhs_image = T::downcast(rhs).ok_or(ImageError::PrecisionMismatch {
            lhs: T::PRECISION,
            rhs: rhs.precision(),
        })?;
        self.add_assign(&rhs_image.as_view())
    }

    pub fn scale(&mut self, factor: T) {
        self.for_each_mut(|v| *v = *v * factor);
    }
}

impl<T: Pixel + Signed> ImageViewMut<'_, T> {
    /// Flip the sign of every pixel in place.
    pub fn negate(&mut self) {
        self.for_each_mut(|v| *v = -*v);
    }
}
