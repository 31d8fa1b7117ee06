use std::ops::{DivAssign, MulAssign};

use super::{Image, Precision};
use crate::geom::{BoxI, PointI};

/// An image whose pixel precision is chosen at runtime.
///
/// Producers that pick their own precision (the PSF renders in `f64`) return
/// this. Adding it to a plane of another precision fails with
/// [`ImageError::PrecisionMismatch`](super::ImageError::PrecisionMismatch)
/// until it is converted explicitly.
#[derive(Debug, Clone, PartialEq)]
pub enum DynImage {
    F32(Image<f32>),
    F64(Image<f64>),
}

impl DynImage {
    pub fn precision(&self) -> Precision {
        match self {
            DynImage::F32(_) => Precision::F32,
            DynImage::F64(_) => Precision::F64,
        }
    }

    pub fn bbox(&self) -> BoxI {
        match self {
            DynImage::F32(image) => image.bbox(),
            DynImage::F64(image) => image.bbox(),
        }
    }

    pub fn xy0(&self) -> PointI {
        self.bbox().min()
    }

    /// Largest pixel widened to `f64`.
    pub fn max(&self) -> Option<f64> {
        match self {
            DynImage::F32(image) => image.max().map(f64::from),
            DynImage::F64(image) => image.max(),
        }
    }

    /// Pixel at LOCAL `(x, y)` widened to `f64`.
    pub fn get(&self, x: usize, y: usize) -> f64 {
        match self {
            DynImage::F32(image) => f64::from(image.get(x, y)),
            DynImage::F64(image) => image.get(x, y),
        }
    }

    /// Single-precision copy.
    pub fn convert_f32(&self) -> Image<f32> {
        match self {
            DynImage::F32(image) => image.clone(),
            DynImage::F64(image) => image.convert(),
        }
    }

    /// Same image, single precision, as a `DynImage`.
    pub fn into_f32(self) -> DynImage {
        match self {
            DynImage::F64(image) => DynImage::F32(image.convert()),
            same => same,
        }
    }
}

impl From<Image<f32>> for DynImage {
    fn from(image: Image<f32>) -> Self {
        DynImage::F32(image)
    }
}

impl From<Image<f64>> for DynImage {
    fn from(image: Image<f64>) -> Self {
        DynImage::F64(image)
    }
}

impl MulAssign<f64> for DynImage {
    fn mul_assign(&mut self, rhs: f64) {
        match self {
            DynImage::F32(image) => *image *= rhs as f32,
            DynImage::F64(image) => *image *= rhs,
        }
    }
}

impl DivAssign<f64> for DynImage {
    fn div_assign(&mut self, rhs: f64) {
        match self {
            DynImage::F32(image) => *image /= rhs as f32,
            DynImage::F64(image) => *image /= rhs,
        }
    }
}
