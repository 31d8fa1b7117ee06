//! Tour parameters.

use std::env::{self, VarError};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geom::{BoxI, ExtentI, PointI};

/// Environment variable naming an optional YAML config file.
pub const CONFIG_ENV: &str = "SKYFRAME_CONFIG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {name}: {source}")]
    Env {
        name: &'static str,
        source: VarError,
    },
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_yml::Error),
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Every constant the tour uses.
///
/// Missing YAML fields take their default, so a config file only needs the
/// values it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TourConfig {
    /// PARENT coordinate of the frame's first pixel.
    pub origin: PointI,
    pub extent: ExtentI,
    /// Number of synthetic sources.
    pub n_objects: usize,
    /// Sources are kept this many pixels away from every edge.
    pub edge_margin: usize,
    /// Side of the square PSF image. Must be odd.
    pub psf_size: usize,
    pub seeing_arcsec: f64,
    pub pixel_scale_arcsec: f64,
    /// Brightest pixel of each source.
    pub peak_value: f64,
    /// Mean of the Poisson sky.
    pub background_mean: f64,
    /// Detection threshold in units of the clipped standard deviation.
    pub detection_sigma: f64,
    /// Background grid cells along x and y.
    pub background_cells: (usize, usize),
    /// Mask overlay opacity in percent.
    pub mask_transparency: u8,
    pub seed: u64,
    /// Sub-region first requested in PARENT coordinates.
    pub sub_origin: PointI,
    pub sub_extent: ExtentI,
    /// Offset from the frame origin to the filled corner box.
    pub fill_offset: ExtentI,
    pub fill_extent: ExtentI,
}

impl Default for TourConfig {
    fn default() -> Self {
        Self {
            origin: PointI::new(300, 500),
            extent: ExtentI::new(2000, 2048),
            n_objects: 1000,
            edge_margin: 150,
            psf_size: 121,
            seeing_arcsec: 0.7,
            pixel_scale_arcsec: 0.2,
            peak_value: 6000.0,
            background_mean: 1000.0,
            detection_sigma: 5.0,
            background_cells: (11, 11),
            mask_transparency: 50,
            seed: 1,
            sub_origin: PointI::new(10, 10),
            sub_extent: ExtentI::new(100, 100),
            fill_offset: ExtentI::new(100, 120),
            fill_extent: ExtentI::new(100, 100),
        }
    }
}

impl TourConfig {
    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yml::from_str(text)?;
        config.check()?;
        Ok(config)
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&text)
    }

    /// Config from the file named by [`CONFIG_ENV`], or the default when it is unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_value(env::var(CONFIG_ENV))
    }

    fn from_env_value(value: Result<String, VarError>) -> Result<Self, ConfigError> {
        match value {
            Ok(path) => Self::from_yaml_file(path),
            Err(VarError::NotPresent) => Ok(Self::default()),
            Err(source) => Err(ConfigError::Env {
                name: CONFIG_ENV,
                source,
            }),
        }
    }

    /// PARENT bbox of the frame.
    pub fn frame_box(&self) -> BoxI {
        BoxI::new(self.origin, self.extent)
    }

    /// Gaussian sigma in pixels.
    pub fn psf_sigma(&self) -> f64 {
        self.seeing_arcsec / self.pixel_scale_arcsec
    }

    /// Panics on an invalid config.
    pub fn validate(&self) {
        if let Err(err) = self.check() {
            panic!("{err}");
        }
    }

    pub fn check(&self) -> Result<(), ConfigError> {
        let invalid = |msg: String| Err(ConfigError::Invalid(msg));

        if self.extent.width <= 0 || self.extent.height <= 0 {
            return invalid(format!("frame extent must be positive, got {}", self.extent));
        }
        if self.frame_box().checked_max().is_none() {
            return invalid(format!(
                "frame at {} with extent {} does not fit in 32-bit coordinates",
                self.origin, self.extent
            ));
        }
        if self.psf_size % 2 == 0 {
            return invalid(format!("psf_size must be odd, got {}", self.psf_size));
        }
        let half_psf = (self.psf_size - 1) / 2;
        if self.edge_margin < half_psf {
            return invalid(format!(
                "edge_margin {} is smaller than half the PSF ({half_psf}), stamps would leave the frame",
                self.edge_margin
            ));
        }
        let (width, height) = (self.extent.width as usize, self.extent.height as usize);
        if width <= 2 * self.edge_margin || height <= 2 * self.edge_margin {
            return invalid(format!(
                "frame {} leaves no room inside a {} pixel margin",
                self.extent, self.edge_margin
            ));
        }
        for (name, value) in [
            ("seeing_arcsec", self.seeing_arcsec),
            ("pixel_scale_arcsec", self.pixel_scale_arcsec),
            ("peak_value", self.peak_value),
            ("background_mean", self.background_mean),
            ("detection_sigma", self.detection_sigma),
        ] {
            if !(value > 0.0 && value.is_finite()) {
                return invalid(format!("{name} must be positive, got {value}"));
            }
        }
        let (nx, ny) = self.background_cells;
        if nx == 0 || ny == 0 || nx > width || ny > height {
            return invalid(format!(
                "background_cells {nx}x{ny} do not fit a {} frame",
                self.extent
            ));
        }
        if self.mask_transparency > 100 {
            return invalid(format!(
                "mask_transparency is a percentage, got {}",
                self.mask_transparency
            ));
        }
        if self.sub_extent.width <= 0 || self.sub_extent.height <= 0 {
            return invalid(format!("sub_extent must be positive, got {}", self.sub_extent));
        }
        let local = BoxI::new(PointI::new(0, 0), self.extent);
        if !local.contains(&BoxI::new(self.sub_origin, self.sub_extent)) {
            return invalid("sub-region must fit inside the frame in LOCAL coordinates".into());
        }
        let fill = BoxI::new(PointI::new(0, 0).shifted(self.fill_offset), self.fill_extent);
        if fill.is_empty() || !local.contains(&fill) {
            return invalid("fill box must be non-empty and inside the frame".into());
        }
        Ok(())
    }
}
