//! Skyframe - synthetic astronomical frames.
//!
//! Images carry their position on the sky (`xy0`) so sub-regions can be
//! addressed in PARENT or LOCAL coordinates. On top of that sit a Gaussian
//! PSF, Poisson noise, bitmask planes, threshold detection of footprints and
//! tiled background estimation. [`run_tour`] strings them together.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use skyframe::{run_tour, RecordingDisplay, Random, TourConfig};
//!
//! let config = TourConfig::default();
//! let mut display = RecordingDisplay::new();
//! let report = run_tour(&config, &mut Random::new(config.seed), &mut display)?;
//!
//! for gotcha in &report.gotchas {
//!     println!("{gotcha}");
//! }
//! ```

pub mod background;
pub mod config;
pub mod detection;
pub mod display;
pub mod geom;
pub mod image;
pub mod mask;
pub mod masked_image;
pub mod psf;
pub mod random;
pub mod stats;
pub mod synthetic;
pub mod tour;

// ============================================================================
// Core types
// ============================================================================

pub use geom::{BoxI, ExtentI, PointI};
pub use image::{DynImage, Image, ImageD, ImageError, ImageF, ImageOrigin, Precision};
pub use mask::{Mask, MaskError, MaskPixel, DETECTED, DETECTED_NEGATIVE};
pub use masked_image::MaskedImage;

// ============================================================================
// Synthesis
// ============================================================================

pub use psf::{GaussianPsf, PsfError};
pub use random::{random_poisson_image, Random, RandomError};

// ============================================================================
// Measurement
// ============================================================================

pub use background::{make_background, Background, BackgroundControl, BackgroundError};
pub use detection::{
    Connectivity, DetectionConfig, DetectionError, Footprint, FootprintSet, Polarity, Threshold,
    ThresholdType,
};
pub use stats::{make_masked_statistics, make_statistics, Statistics, StatisticsControl};

// ============================================================================
// Tour
// ============================================================================

pub use config::{ConfigError, TourConfig, CONFIG_ENV};
pub use display::{DisplaySink, Frame, LogDisplay, RecordingDisplay};
pub use tour::{run_tour, Gotcha, TourReport};
