//! Sky background estimation.
//!
//! The image is split into an `nx × ny` grid of cells. Each cell gets a
//! sigma-clipped median and MAD sigma, the grid is smoothed with a 3x3 median
//! filter, and the result is bilinearly interpolated between cell centers to
//! produce a smooth plane the size of the image.

mod grid;

use common::Buffer2;
use rayon::prelude::*;
use thiserror::Error;

use crate::geom::BoxI;
use crate::image::{Image, Pixel};
use crate::mask::MaskError;
use crate::masked_image::MaskedImage;

pub use grid::CellStats;
use grid::{CellGrid, GridInput};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum BackgroundError {
    #[error("Background grid needs at least one cell per axis, got {nx}x{ny}")]
    ZeroCells { nx: usize, ny: usize },
    #[error("Background grid {nx}x{ny} is finer than the {width}x{height} image")]
    GridTooFine {
        nx: usize,
        ny: usize,
        width: usize,
        height: usize,
    },
    #[error(transparent)]
    Mask(#[from] MaskError),
}

/// Settings for [`make_background`].
#[derive(Debug, Clone, PartialEq)]
pub struct BackgroundControl {
    /// Cells along x.
    pub nx: usize,
    /// Cells along y.
    pub ny: usize,
    pub num_sigma_clip: f32,
    pub num_iter: usize,
    /// Pixels with any of these planes set are left out of the cell statistics.
    pub ignored_planes: Vec<String>,
    /// Smooth the cell grid with a 3x3 median before interpolating.
    pub median_filter: bool,
}

impl Default for BackgroundControl {
    fn default() -> Self {
        Self::new(11, 11)
    }
}

impl BackgroundControl {
    pub fn new(nx: usize, ny: usize) -> Self {
        Self {
            nx,
            ny,
            num_sigma_clip: 3.0,
            num_iter: 3,
            ignored_planes: Vec::new(),
            median_filter: true,
        }
    }

    #[must_use]
    pub fn with_ignored_planes<S: AsRef<str>>(mut self, planes: &[S]) -> Self {
        self.ignored_planes = planes.iter().map(|p| p.as_ref().to_string()).collect();
        self
    }

    pub fn validate(&self) {
        assert!(
            self.num_sigma_clip > 0.0,
            "num_sigma_clip must be positive, got {}",
            self.num_sigma_clip
        );
        assert!(self.num_iter > 0, "num_iter must be at least 1");
    }
}

/// Fitted background model of one image.
#[derive(Debug, Clone)]
pub struct Background {
    grid: CellGrid,
    bbox: BoxI,
}

/// Fit a background model to the image plane of `masked`.
pub fn make_background(
    masked: &MaskedImage,
    ctrl: &BackgroundControl,
) -> Result<Background, BackgroundError> {
    ctrl.validate();
    let (nx, ny) = (ctrl.nx, ctrl.ny);
    let (width, height) = (masked.width(), masked.height());
    if nx == 0 || ny == 0 {
        return Err(BackgroundError::ZeroCells { nx, ny });
    }
    if nx > width || ny > height {
        return Err(BackgroundError::GridTooFine {
            nx,
            ny,
            width,
            height,
        });
    }

    let ignore = masked.mask().planes_bit_mask(ctrl.ignored_planes.as_slice())?;
    let arrays = masked.arrays();
    let input = GridInput {
        pixels: arrays.image,
        mask: arrays.mask,
        width,
        height,
        ignore,
        kappa: ctrl.num_sigma_clip,
        iterations: ctrl.num_iter,
    };
    let grid = CellGrid::new(&input, nx, ny, ctrl.median_filter);

    tracing::debug!(nx, ny, width, height, ignore, "Background grid fitted");

    Ok(Background {
        grid,
        bbox: masked.bbox(),
    })
}

impl Background {
    /// Cells along x.
    pub fn nx(&self) -> usize {
        self.grid.nx()
    }

    /// Cells along y.
    pub fn ny(&self) -> usize {
        self.grid.ny()
    }

    /// PARENT bbox of the image the model was fitted to.
    pub fn bbox(&self) -> BoxI {
        self.bbox
    }

    /// Statistics of cell `(tx, ty)` after filtering.
    pub fn cell(&self, tx: usize, ty: usize) -> CellStats {
        self.grid.get(tx, ty)
    }

    /// Smooth background plane with the fitted image's bbox.
    pub fn render<T: Pixel>(&self) -> Image<T> {
        let plane = self.render_rows(|grid, row, y| grid.interpolate_row(row, y));
        self.to_image(plane)
    }

    /// Smooth plane of the per-cell clipped sigma.
    pub fn render_noise(&self) -> Image<f32> {
        let plane = self.render_rows(|grid, row, y| grid.interpolate_noise_row(row, y));
        self.to_image(plane)
    }

    fn render_rows(&self, fill: impl Fn(&CellGrid, &mut [f32], usize) + Sync) -> Buffer2<f32> {
        let width = self.bbox.width() as usize;
        let height = self.bbox.height() as usize;
        let mut plane = Buffer2::new_default(width, height);
        plane
            .pixels_mut()
            .par_chunks_mut(width)
            .enumerate()
            .for_each(|(y, row)| fill(&self.grid, row, y));
        plane
    }

    fn to_image<T: Pixel>(&self, plane: Buffer2<f32>) -> Image<T> {
        let pixels = plane.map(|&v| num_traits::cast(v).unwrap_or_default());
        Image::from_buffer(pixels, self.bbox.min())
    }
}
