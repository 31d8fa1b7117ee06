//! Circular Gaussian point-spread function.

use common::Buffer2;
use thiserror::Error;

use crate::geom::{ExtentI, PointI};
use crate::image::{DynImage, Image};

/// FWHM to Gaussian sigma conversion factor, 2√(2 ln 2).
pub const FWHM_TO_SIGMA: f64 = 2.354_820_045;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PsfError {
    #[error("PSF dimensions must be odd and positive, got {width}x{height}")]
    EvenSize { width: usize, height: usize },
    #[error("PSF sigma must be positive and finite, got {0}")]
    InvalidSigma(f64),
}

/// Gaussian PSF rendered on an odd-sized pixel grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GaussianPsf {
    width: usize,
    height: usize,
    sigma: f64,
}

impl GaussianPsf {
    pub fn new(width: usize, height: usize, sigma: f64) -> Result<Self, PsfError> {
        if width % 2 == 0 || height % 2 == 0 {
            return Err(PsfError::EvenSize { width, height });
        }
        if !(sigma > 0.0 && sigma.is_finite()) {
            return Err(PsfError::InvalidSigma(sigma));
        }
        Ok(Self {
            width,
            height,
            sigma,
        })
    }

    /// Square PSF whose sigma is the seeing expressed in pixels.
    pub fn from_seeing(
        size: usize,
        seeing_arcsec: f64,
        pixel_scale_arcsec: f64,
    ) -> Result<Self, PsfError> {
        Self::new(size, size, seeing_arcsec / pixel_scale_arcsec)
    }

    pub fn sigma(&self) -> f64 {
        self.sigma
    }

    pub fn fwhm(&self) -> f64 {
        self.sigma * FWHM_TO_SIGMA
    }

    pub fn dimensions(&self) -> ExtentI {
        ExtentI::new(self.width as i32, self.height as i32)
    }

    /// Render the kernel in double precision with unit sum.
    ///
    /// The image is centered on the origin: `xy0 = (-(w-1)/2, -(h-1)/2)`, so
    /// the brightest pixel sits at PARENT `(0, 0)`.
    pub fn compute_image(&self) -> DynImage {
        let cx = ((self.width - 1) / 2) as f64;
        let cy = ((self.height - 1) / 2) as f64;
        let two_sigma_sq = 2.0 * self.sigma * self.sigma;

        let mut pixels = Vec::with_capacity(self.width * self.height);
        for y in 0..self.height {
            for x in 0..self.width {
                let dx = x as f64 - cx;
                let dy = y as f64 - cy;
                pixels.push((-(dx * dx + dy * dy) / two_sigma_sq).exp());
            }
        }
        let sum: f64 = pixels.iter().sum();
        pixels.iter_mut().for_each(|v| *v /= sum);

        let xy0 = PointI::new(-(cx as i32), -(cy as i32));
        DynImage::F64(Image::from_buffer(
            Buffer2::new(self.width, self.height, pixels),
            xy0,
        ))
    }
}
