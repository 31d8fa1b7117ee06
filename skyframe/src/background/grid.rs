//! Cell grid of clipped statistics and its bilinear interpolation.

use common::Buffer2;
use rayon::prelude::*;

use crate::mask::MaskPixel;
use crate::stats::{median_f32_mut, sigma_clipped_stats};

/// Cells larger than this are subsampled with a regular stride.
const MAX_CELL_SAMPLES: usize = 4096;

/// Below this many unmasked pixels a cell falls back to all of its pixels.
const MIN_UNMASKED_PIXELS: usize = 16;

/// Clipped statistics of one grid cell.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CellStats {
    pub median: f32,
    pub sigma: f32,
    /// Pixels that went into the estimate, before clipping.
    pub npoints: usize,
}

/// Borrowed input planes for building a [`CellGrid`].
#[derive(Clone, Copy, Debug)]
pub(super) struct GridInput<'a> {
    pub pixels: &'a [f32],
    pub mask: &'a [MaskPixel],
    pub width: usize,
    pub height: usize,
    pub ignore: MaskPixel,
    pub kappa: f32,
    pub iterations: usize,
}

/// `nx × ny` cells covering the image, with precomputed cell centers.
#[derive(Debug, Clone)]
pub(super) struct CellGrid {
    stats: Buffer2<CellStats>,
    centers_x: Vec<f32>,
    centers_y: Vec<f32>,
}

/// Pixel range `[start, end)` of cell `index` out of `count` along `len`.
#[inline]
fn cell_range(index: usize, count: usize, len: usize) -> (usize, usize) {
    (index * len / count, (index + 1) * len / count)
}

fn cell_centers(count: usize, len: usize) -> Vec<f32> {
    (0..count)
        .map(|i| {
            let (start, end) = cell_range(i, count, len);
            (start + end - 1) as f32 * 0.5
        })
        .collect()
}

impl CellGrid {
    /// Caller guarantees `1 <= nx <= width` and `1 <= ny <= height`.
    pub fn new(input: &GridInput<'_>, nx: usize, ny: usize, median_filter: bool) -> Self {
        let mut grid = Self {
            stats: Buffer2::new_default(nx, ny),
            centers_x: cell_centers(nx, input.width),
            centers_y: cell_centers(ny, input.height),
        };
        grid.fill_cell_stats(input);
        if median_filter {
            grid.apply_median_filter();
        }
        grid
    }

    #[inline]
    pub fn get(&self, tx: usize, ty: usize) -> CellStats {
        self.stats[(tx, ty)]
    }

    #[inline]
    pub fn nx(&self) -> usize {
        self.stats.width()
    }

    #[inline]
    pub fn ny(&self) -> usize {
        self.stats.height()
    }

    fn fill_cell_stats(&mut self, input: &GridInput<'_>) {
        let nx = self.nx();
        let ny = self.ny();

        self.stats
            .pixels_mut()
            .par_iter_mut()
            .enumerate()
            .for_each_init(
                || (Vec::new(), Vec::new()),
                |(values, deviations), (idx, out)| {
                    let (x_start, x_end) = cell_range(idx % nx, nx, input.width);
                    let (y_start, y_end) = cell_range(idx / nx, ny, input.height);
                    *out = compute_cell_stats(
                        input,
                        (x_start, x_end),
                        (y_start, y_end),
                        values,
                        deviations,
                    );
                },
            );
    }

    /// Replace each cell by the median of its 3x3 neighborhood so a single
    /// cell dominated by a bright source does not leave a bump.
    fn apply_median_filter(&mut self) {
        let nx = self.nx();
        let ny = self.ny();

        if nx < 3 || ny < 3 {
            return;
        }

        let src = self.stats.pixels();
        let mut dst: Buffer2<CellStats> = Buffer2::new_default(nx, ny);

        dst.pixels_mut()
            .par_iter_mut()
            .enumerate()
            .for_each(|(idx, out)| {
                let tx = idx % nx;
                let ty = idx / nx;

                let mut medians = [0.0f32; 9];
                let mut sigmas = [0.0f32; 9];
                let mut count = 0;

                for dy in -1i32..=1 {
                    for dx in -1i32..=1 {
                        let cx = tx as i32 + dx;
                        let cy = ty as i32 + dy;
                        if cx >= 0 && cx < nx as i32 && cy >= 0 && cy < ny as i32 {
                            let neighbor = src[cy as usize * nx + cx as usize];
                            medians[count] = neighbor.median;
                            sigmas[count] = neighbor.sigma;
                            count += 1;
                        }
                    }
                }

                *out = CellStats {
                    median: median_f32_mut(&mut medians[..count]),
                    sigma: median_f32_mut(&mut sigmas[..count]),
                    npoints: src[idx].npoints,
                };
            });

        std::mem::swap(&mut self.stats, &mut dst);
    }

    /// Evaluate the median surface along row `y` into `row`.
    ///
    /// Between cell centers the surface is bilinear. Beyond the outermost
    /// centers it is held constant.
    pub fn interpolate_row(&self, row: &mut [f32], y: usize) {
        self.interpolate_row_with(row, y, |c| c.median);
    }

    /// Same as [`interpolate_row`](Self::interpolate_row) for the sigma surface.
    pub fn interpolate_noise_row(&self, row: &mut [f32], y: usize) {
        self.interpolate_row_with(row, y, |c| c.sigma);
    }

    fn interpolate_row_with(&self, row: &mut [f32], y: usize, value: impl Fn(CellStats) -> f32) {
        let fy = y as f32;
        let width = row.len();
        let nx = self.nx();

        let ty0 = find_lower_cell(fy, &self.centers_y);
        let ty1 = (ty0 + 1).min(self.ny() - 1);
        let wy = if ty1 != ty0 {
            ((fy - self.centers_y[ty0]) / (self.centers_y[ty1] - self.centers_y[ty0]))
                .clamp(0.0, 1.0)
        } else {
            0.0
        };
        let wy_inv = 1.0 - wy;

        // Walk the row in segments that share the same four corner cells.
        let mut x = 0usize;
        for tx0 in 0..nx {
            let tx1 = (tx0 + 1).min(nx - 1);
            let segment_end = if tx0 + 1 < nx {
                (self.centers_x[tx0 + 1].ceil() as usize).min(width)
            } else {
                width
            };
            if segment_end <= x {
                continue;
            }

            let left = wy_inv * value(self.get(tx0, ty0)) + wy * value(self.get(tx0, ty1));
            let right = wy_inv * value(self.get(tx1, ty0)) + wy * value(self.get(tx1, ty1));

            let (x_scale, x_offset) = if tx1 != tx0 {
                (
                    1.0 / (self.centers_x[tx1] - self.centers_x[tx0]),
                    self.centers_x[tx0],
                )
            } else {
                (0.0, 0.0)
            };

            for (px, out) in row.iter_mut().enumerate().take(segment_end).skip(x) {
                let wx = if tx1 != tx0 {
                    ((px as f32 - x_offset) * x_scale).clamp(0.0, 1.0)
                } else {
                    0.0
                };
                *out = (1.0 - wx) * left + wx * right;
            }

            x = segment_end;
            if x >= width {
                break;
            }
        }
    }
}

fn compute_cell_stats(
    input: &GridInput<'_>,
    (x_start, x_end): (usize, usize),
    (y_start, y_end): (usize, usize),
    values: &mut Vec<f32>,
    deviations: &mut Vec<f32>,
) -> CellStats {
    values.clear();
    let width = input.width;

    if input.ignore != 0 {
        for y in y_start..y_end {
            let row = y * width;
            values.extend(
                (x_start..x_end)
                    .filter(|&x| input.mask[row + x] & input.ignore == 0)
                    .map(|x| input.pixels[row + x]),
            );
        }
        if values.len() < MIN_UNMASKED_PIXELS {
            values.clear();
        }
    }

    if values.is_empty() {
        collect_sampled_pixels(input.pixels, width, (x_start, x_end), (y_start, y_end), values);
    }

    values.retain(|v| v.is_finite());
    let npoints = values.len();
    let clipped = sigma_clipped_stats(values, deviations, input.kappa, input.iterations);
    CellStats {
        median: clipped.median,
        sigma: clipped.sigma,
        npoints,
    }
}

/// Collect about [`MAX_CELL_SAMPLES`] pixels with a regular stride.
fn collect_sampled_pixels(
    pixels: &[f32],
    width: usize,
    (x_start, x_end): (usize, usize),
    (y_start, y_end): (usize, usize),
    values: &mut Vec<f32>,
) {
    let cell_pixels = (x_end - x_start) * (y_end - y_start);
    let stride = ((cell_pixels / MAX_CELL_SAMPLES).max(1) as f32)
        .sqrt()
        .ceil() as usize;

    for y in (y_start..y_end).step_by(stride) {
        let row = y * width;
        values.extend((x_start..x_end).step_by(stride).map(|x| pixels[row + x]));
    }
}

/// Index of the last cell whose center is at or before `pos`, or 0.
#[inline]
fn find_lower_cell(pos: f32, centers: &[f32]) -> usize {
    centers.iter().rposition(|&c| c <= pos).unwrap_or(0)
}
