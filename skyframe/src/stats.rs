//! Robust pixel statistics.
//!
//! Clipping uses the median and MAD: values further than `kappa × σ` from the
//! median are dropped, with `σ = 1.4826 × MAD`, until nothing changes or the
//! iteration budget runs out.

use crate::image::Image;
use crate::mask::MaskPixel;
use crate::masked_image::MaskedImage;

/// MAD to standard deviation conversion factor for a normal distribution.
pub const MAD_TO_SIGMA: f32 = 1.482_602_2;

/// Parameters for [`make_statistics`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatisticsControl {
    /// Clip threshold in sigmas.
    pub num_sigma_clip: f32,
    /// Maximum clipping passes.
    pub num_iter: usize,
    /// Pixels with any of these mask bits set are ignored.
    pub and_mask: MaskPixel,
}

impl Default for StatisticsControl {
    fn default() -> Self {
        Self {
            num_sigma_clip: 3.0,
            num_iter: 3,
            and_mask: 0,
        }
    }
}

impl StatisticsControl {
    pub fn validate(&self) {
        assert!(
            self.num_sigma_clip > 0.0,
            "num_sigma_clip must be positive, got {}",
            self.num_sigma_clip
        );
        assert!(self.num_iter > 0, "num_iter must be at least 1");
    }
}

/// Summary statistics of a set of pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Statistics {
    /// Number of pixels used (after masking, before clipping).
    pub npoint: usize,
    pub mean: f64,
    pub stdev: f64,
    pub min: f32,
    pub max: f32,
    pub median: f32,
    /// Median of the clipped set.
    pub median_clip: f32,
    /// Mean of the clipped set.
    pub mean_clip: f64,
    /// MAD-based sigma of the clipped set.
    pub stdev_clip: f32,
}

/// Clipped median and sigma.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ClippedStats {
    pub median: f32,
    pub sigma: f32,
    pub mean: f64,
    /// Values surviving the clip.
    pub count: usize,
}

/// Statistics over every pixel of an image.
pub fn make_statistics(image: &Image<f32>, ctrl: &StatisticsControl) -> Statistics {
    let mut values: Vec<f32> = image
        .array()
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .collect();
    compute(&mut values, ctrl)
}

/// Statistics over the image plane, skipping pixels flagged in `ctrl.and_mask`.
pub fn make_masked_statistics(masked: &MaskedImage, ctrl: &StatisticsControl) -> Statistics {
    let arrays = masked.arrays();
    let mut values: Vec<f32> = arrays
        .image
        .iter()
        .zip(arrays.mask)
        .filter(|&(v, &m)| m & ctrl.and_mask == 0 && v.is_finite())
        .map(|(&v, _)| v)
        .collect();
    compute(&mut values, ctrl)
}

fn compute(values: &mut [f32], ctrl: &StatisticsControl) -> Statistics {
    ctrl.validate();
    if values.is_empty() {
        return Statistics::default();
    }

    let n = values.len() as f64;
    let mean = values.iter().map(|&v| v as f64).sum::<f64>() / n;
    let variance = if values.len() > 1 {
        values
            .iter()
            .map(|&v| (v as f64 - mean).powi(2))
            .sum::<f64>()
            / (n - 1.0)
    } else {
        0.0
    };
    let (min, max) = values
        .iter()
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    let median = median_f32_mut(values);

    let mut deviations = Vec::with_capacity(values.len());
    let clipped = sigma_clipped_stats(values, &mut deviations, ctrl.num_sigma_clip, ctrl.num_iter);

    Statistics {
        npoint: values.len(),
        mean,
        stdev: variance.sqrt(),
        min,
        max,
        median,
        median_clip: clipped.median,
        mean_clip: clipped.mean,
        stdev_clip: clipped.sigma,
    }
}

/// Median of `data` using quickselect. Reorders `data`.
pub fn median_f32_mut(data: &mut [f32]) -> f32 {
    debug_assert!(!data.is_empty());

    let len = data.len();
    let mid = len / 2;

    if len % 2 == 0 {
        let (_, right_median, _) = data.select_nth_unstable_by(mid, f32::total_cmp);
        let right = *right_median;
        // Left median is max of left partition
        let left = data[..mid]
            .iter()
            .copied()
            .fold(f32::NEG_INFINITY, f32::max);
        (left + right) / 2.0
    } else {
        let (_, median, _) = data.select_nth_unstable_by(mid, f32::total_cmp);
        *median
    }
}

/// Clipped median and MAD sigma. Reorders `values`; `deviations` is scratch.
pub fn sigma_clipped_stats(
    values: &mut [f32],
    deviations: &mut Vec<f32>,
    kappa: f32,
    iterations: usize,
) -> ClippedStats {
    if values.is_empty() {
        return ClippedStats::default();
    }

    let mut len = values.len();

    for _ in 0..iterations {
        if len < 3 {
            break;
        }

        let active = &mut values[..len];
        let median = median_f32_mut(active);
        let sigma = mad_sigma(active, median, deviations);

        if sigma < f32::EPSILON {
            break;
        }

        let threshold = kappa * sigma;
        let mut write_idx = 0;
        for i in 0..len {
            if (values[i] - median).abs() <= threshold {
                values[write_idx] = values[i];
                write_idx += 1;
            }
        }

        if write_idx == len {
            break;
        }
        len = write_idx;
    }

    let active = &mut values[..len];
    if active.is_empty() {
        return ClippedStats::default();
    }

    let median = median_f32_mut(active);
    let sigma = mad_sigma(active, median, deviations);
    let mean = active.iter().map(|&v| v as f64).sum::<f64>() / len as f64;

    ClippedStats {
        median,
        sigma,
        mean,
        count: len,
    }
}

fn mad_sigma(values: &[f32], median: f32, deviations: &mut Vec<f32>) -> f32 {
    deviations.clear();
    deviations.extend(values.iter().map(|v| (v - median).abs()));
    median_f32_mut(deviations) * MAD_TO_SIGMA
}
