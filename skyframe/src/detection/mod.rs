//! Threshold detection of connected pixel regions.
//!
//! A [`Threshold`] is resolved against a [`MaskedImage`] into a pixel level,
//! pixels at or beyond that level are grouped into 4- or 8-connected
//! [`Footprint`]s, and every footprint pixel gets the requested mask plane.

mod footprint;
mod labeling;
#[cfg(test)]
mod tests;

use std::str::FromStr;

use strum_macros::{Display, EnumString};
use thiserror::Error;

use crate::geom::{BoxI, PointI};
use crate::mask::{Mask, MaskError, MaskPixel};
use crate::masked_image::MaskedImage;
use crate::stats::{make_statistics, StatisticsControl};

pub use footprint::{Footprint, Peak, Span};
pub use labeling::Connectivity;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DetectionError {
    #[error("Unknown threshold type '{0}', expected value, stdev, variance or pixel_stdev")]
    UnknownThresholdType(String),
    #[error("Threshold value must be finite, got {0}")]
    NonFiniteThreshold(f64),
    #[error(transparent)]
    Mask(#[from] MaskError),
}

/// How a threshold value is turned into a pixel level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum ThresholdType {
    /// The value is the pixel level.
    #[default]
    Value,
    /// Multiple of the clipped standard deviation of the image plane.
    Stdev,
    /// Multiple of the mean of the variance plane.
    Variance,
    /// Multiple of each pixel's own `sqrt(variance)`.
    PixelStdev,
}

/// Which side of the threshold is detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display)]
#[strum(serialize_all = "lowercase")]
pub enum Polarity {
    /// Pixels `>= level`.
    #[default]
    Positive,
    /// Pixels `<= -level`.
    Negative,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Threshold {
    value: f64,
    kind: ThresholdType,
    polarity: Polarity,
    include_multiplier: f64,
}

impl Threshold {
    pub fn new(value: f64, kind: ThresholdType) -> Result<Self, DetectionError> {
        if !value.is_finite() {
            return Err(DetectionError::NonFiniteThreshold(value));
        }
        Ok(Self {
            value,
            kind,
            polarity: Polarity::Positive,
            include_multiplier: 1.0,
        })
    }

    /// Threshold from a type name such as `"stdev"` or `"pixel_stdev"`.
    pub fn create(value: f64, kind: &str) -> Result<Self, DetectionError> {
        let kind = ThresholdType::from_str(kind)
            .map_err(|_| DetectionError::UnknownThresholdType(kind.to_string()))?;
        Self::new(value, kind)
    }

    #[must_use]
    pub fn with_polarity(mut self, polarity: Polarity) -> Self {
        self.polarity = polarity;
        self
    }

    /// Extra factor applied on top of the resolved level.
    #[must_use]
    pub fn with_include_multiplier(mut self, multiplier: f64) -> Self {
        self.include_multiplier = multiplier;
        self
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn kind(&self) -> ThresholdType {
        self.kind
    }

    pub fn polarity(&self) -> Polarity {
        self.polarity
    }

    pub fn include_multiplier(&self) -> f64 {
        self.include_multiplier
    }

    fn resolve(&self, masked: &MaskedImage) -> Level {
        let factor = (self.value * self.include_multiplier) as f32;
        match self.kind {
            ThresholdType::Value => Level::Uniform(factor),
            ThresholdType::Stdev => {
                let stats = make_statistics(masked.image(), &StatisticsControl::default());
                Level::Uniform(factor * stats.stdev_clip)
            }
            ThresholdType::Variance => {
                let variance = masked.variance().array();
                let mean = if variance.is_empty() {
                    0.0
                } else {
                    variance.iter().map(|&v| v as f64).sum::<f64>() / variance.len() as f64
                };
                Level::Uniform(factor * mean as f32)
            }
            ThresholdType::PixelStdev => Level::PerPixel(factor),
        }
    }
}

/// A threshold resolved for one image.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Level {
    Uniform(f32),
    /// Multiplier on each pixel's `sqrt(variance)`.
    PerPixel(f32),
}

/// Detection tuning beyond the threshold itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetectionConfig {
    /// Footprints with fewer pixels are dropped.
    pub npix_min: usize,
    pub connectivity: Connectivity,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            npix_min: 1,
            connectivity: Connectivity::Four,
        }
    }
}

impl DetectionConfig {
    pub fn validate(&self) {
        assert!(self.npix_min >= 1, "npix_min must be at least 1");
    }
}

/// Footprints found in one image, plus the region searched and the level used.
#[derive(Debug, Clone, PartialEq)]
pub struct FootprintSet {
    footprints: Vec<Footprint>,
    region: BoxI,
    level: Option<f32>,
}

impl FootprintSet {
    /// Detect with default settings and set `plane` on every detected pixel.
    ///
    /// Existing mask bits are kept; clear the mask first to start fresh.
    pub fn new(
        masked: &mut MaskedImage,
        threshold: &Threshold,
        plane: &str,
    ) -> Result<Self, DetectionError> {
        Self::with_config(masked, threshold, plane, &DetectionConfig::default())
    }

    pub fn with_config(
        masked: &mut MaskedImage,
        threshold: &Threshold,
        plane: &str,
        config: &DetectionConfig,
    ) -> Result<Self, DetectionError> {
        let bits = masked.mask().plane_bit_mask(plane)?;
        let set = Self::detect(masked, threshold, config);
        set.set_mask(masked.mask_mut(), bits);

        tracing::debug!(
            footprints = set.len(),
            pixels = set.total_area(),
            level = ?set.level,
            plane,
            "Detection finished"
        );
        Ok(set)
    }

    /// Detect without touching the mask.
    pub fn detect(masked: &MaskedImage, threshold: &Threshold, config: &DetectionConfig) -> Self {
        config.validate();
        let level = threshold.resolve(masked);
        let arrays = masked.arrays();
        let (width, height) = (arrays.width, arrays.height);
        let sign = match threshold.polarity() {
            Polarity::Positive => 1.0f32,
            Polarity::Negative => -1.0f32,
        };

        let above = |x: usize, y: usize| -> bool {
            let idx = y * width + x;
            let t = match level {
                Level::Uniform(t) => t,
                Level::PerPixel(k) => k * arrays.variance[idx].max(0.0).sqrt(),
            };
            sign * arrays.image[idx] >= t
        };

        let xy0 = masked.xy0();
        let components = labeling::label_components(width, height, config.connectivity, above);
        let footprints = components
            .into_iter()
            .map(|runs| {
                let mut peak: Option<(PointI, f32)> = None;
                let spans = runs
                    .iter()
                    .map(|run| {
                        let row = run.y as usize * width;
                        for x in run.start..run.end {
                            let v = sign * arrays.image[row + x as usize];
                            if peak.map_or(true, |(_, best)| v > best) {
                                peak = Some((PointI::new(x as i32, run.y as i32), v));
                            }
                        }
                        Span::new(
                            run.y as i32 + xy0.y,
                            run.start as i32 + xy0.x,
                            run.end as i32 - 1 + xy0.x,
                        )
                    })
                    .collect::<Vec<_>>();
                // components never come back empty
                let (local, v) = peak.unwrap_or_default();
                let peak = Peak {
                    position: PointI::new(local.x + xy0.x, local.y + xy0.y),
                    value: sign * v,
                };
                Footprint::new(spans, peak)
            })
            .filter(|fp| fp.area() >= config.npix_min)
            .collect();

        Self {
            footprints,
            region: masked.bbox(),
            level: match level {
                Level::Uniform(t) => Some(t),
                Level::PerPixel(_) => None,
            },
        }
    }

    /// OR `bits` into every footprint pixel.
    pub fn set_mask(&self, mask: &mut Mask, bits: MaskPixel) {
        for fp in &self.footprints {
            fp.set_mask(mask, bits);
        }
    }

    pub fn footprints(&self) -> &[Footprint] {
        &self.footprints
    }

    pub fn len(&self) -> usize {
        self.footprints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.footprints.is_empty()
    }

    /// PARENT bbox of the image that was searched.
    pub fn region(&self) -> BoxI {
        self.region
    }

    /// Pixel level used, or `None` for a per-pixel threshold.
    pub fn threshold_level(&self) -> Option<f32> {
        self.level
    }

    /// Total number of detected pixels.
    pub fn total_area(&self) -> usize {
        self.footprints.iter().map(Footprint::area).sum()
    }
}
