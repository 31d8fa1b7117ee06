//! A guided walk through building and measuring a synthetic frame.
//!
//! The tour allocates a frame with a non-zero origin, stamps Gaussian
//! sources on it, adds a Poisson sky, detects sources before and after
//! background subtraction, and finishes with two aliasing demonstrations.
//! Each classic pitfall it runs into is logged at `warn` and recorded as a
//! [`Gotcha`] in the returned [`TourReport`], then worked around.

use std::fmt;

use anyhow::Context;
use tracing::{info, warn};

use crate::background::{make_background, BackgroundControl};
use crate::config::TourConfig;
use crate::detection::{FootprintSet, Threshold};
use crate::display::{DisplaySink, Frame};
use crate::geom::{BoxI, ExtentI, PointI};
use crate::image::{Image, ImageError, ImageOrigin};
use crate::mask::{Mask, DETECTED};
use crate::masked_image::MaskedImage;
use crate::psf::GaussianPsf;
use crate::random::{random_poisson_image, Random};
use crate::stats::{make_masked_statistics, Statistics, StatisticsControl};
use crate::synthetic::{random_positions, scale_to_peak, stamp_box};

/// Coverage above which a detection pass is flagged as seeing the sky itself.
const SKY_DETECTED_COVERAGE: f64 = 0.5;

/// A pitfall the tour ran into and recovered from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gotcha {
    /// A sub-box was given in LOCAL coordinates but requested as PARENT.
    ParentVsLocal,
    /// A double-precision kernel was added to a single-precision frame.
    PrecisionMismatch,
    /// Detection ran on a frame that still had its sky in it.
    BackgroundNotSubtracted,
    /// `PointI::shift` changed the point in place instead of returning a new one.
    InPlaceShift,
}

impl Gotcha {
    pub fn message(&self) -> &'static str {
        match self {
            Gotcha::ParentVsLocal => {
                "PARENT vs. LOCAL: a box in PARENT coordinates has to account for xy0"
            }
            Gotcha::PrecisionMismatch => {
                "The PSF image is double precision. Convert it before adding it to a single-precision frame"
            }
            Gotcha::BackgroundNotSubtracted => {
                "Everything is detected because the background has not been subtracted"
            }
            Gotcha::InPlaceShift => {
                "PointI::shift operates in place and returns nothing. Shift a copy, then use it"
            }
        }
    }
}

impl fmt::Display for Gotcha {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Outcome of one detection pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectionSummary {
    pub footprints: usize,
    pub detected_pixels: usize,
    /// Fraction of the frame with the DETECTED bit.
    pub coverage: f64,
    pub threshold_level: Option<f32>,
}

impl DetectionSummary {
    fn new(set: &FootprintSet, masked: &MaskedImage) -> anyhow::Result<Self> {
        let bit = masked.mask().plane_bit_mask(DETECTED)?;
        Ok(Self {
            footprints: set.len(),
            detected_pixels: masked.mask().count(bit),
            coverage: masked.mask().coverage(bit),
            threshold_level: set.threshold_level(),
        })
    }
}

/// Everything the tour measured, plus the final planes.
#[derive(Debug, Clone)]
pub struct TourReport {
    pub gotchas: Vec<Gotcha>,
    pub frame_bbox: BoxI,
    /// PARENT bbox of the sub-region view from the first step.
    pub sub_region: BoxI,
    pub sources: Vec<PointI>,
    pub psf_sigma: f64,
    pub before_subtraction: DetectionSummary,
    pub after_subtraction: DetectionSummary,
    /// Clipped sky statistics of the subtracted frame, ignoring detections.
    pub residual_sky: Statistics,
    /// PARENT box filled through a view.
    pub fill_box: BoxI,
    pub fill_value: f32,
    /// The parent frame saw the fill written through the view.
    pub fill_visible: bool,
    /// The combined image equals the frame with its left half negated.
    pub halves_match: bool,
    pub masked: MaskedImage,
    pub combined: Image<f32>,
}

fn note(gotchas: &mut Vec<Gotcha>, gotcha: Gotcha) {
    warn!(?gotcha, "GOTCHA: {}", gotcha.message());
    gotchas.push(gotcha);
}

/// Run the tour with the given parameters, random source and display.
pub fn run_tour(
    config: &TourConfig,
    rng: &mut Random,
    display: &mut dyn DisplaySink,
) -> anyhow::Result<TourReport> {
    config.validate();
    let mut gotchas = Vec::new();

    let mut frame = Image::<f32>::new(config.frame_box());
    info!(bbox = %frame.bbox(), xy0 = %frame.xy0(), "Allocated frame");

    // A box near (0, 0) is LOCAL to this frame, so asking for it as PARENT fails.
    let sub_box = BoxI::new(config.sub_origin, config.sub_extent);
    let sub_region = match frame.view(sub_box, ImageOrigin::Parent) {
        Ok(view) => view.bbox(),
        Err(err @ ImageError::Length { .. }) => {
            info!(%err, "PARENT sub-region rejected");
            note(&mut gotchas, Gotcha::ParentVsLocal);
            frame.view(sub_box, ImageOrigin::Local)?.bbox()
        }
        Err(err) => return Err(err.into()),
    };
    info!(bbox = %sub_region, "Sub-region view");

    let sources = random_positions(
        rng,
        config.n_objects,
        frame.width(),
        frame.height(),
        config.edge_margin,
    );

    display.set_mask_transparency(config.mask_transparency, None);

    let psf = GaussianPsf::new(config.psf_size, config.psf_size, config.psf_sigma())?;
    let mut kernel = psf.compute_image();
    scale_to_peak(&mut kernel, config.peak_value)?;
    info!(
        size = config.psf_size,
        sigma = psf.sigma(),
        fwhm = psf.fwhm(),
        precision = %kernel.precision(),
        "PSF kernel ready"
    );

    let stamp_size = kernel.bbox().dimensions();
    for &pos in &sources {
        let mut stamp = frame.view_mut(stamp_box(pos, stamp_size), ImageOrigin::Local)?;
        match stamp.try_add_dyn(&kernel) {
            Ok(()) => {}
            Err(err @ ImageError::PrecisionMismatch { .. }) => {
                info!(%err, "Stamp rejected");
                note(&mut gotchas, Gotcha::PrecisionMismatch);
                kernel = kernel.into_f32();
                stamp.try_add_dyn(&kernel)?;
            }
            Err(err) => return Err(err.into()),
        }
    }
    info!(count = sources.len(), "Stamped sources");

    let mut sky = Image::<f32>::new(frame.bbox());
    random_poisson_image(&mut sky, rng, config.background_mean)?;
    frame.add_assign_image(&sky)?;
    display.mtv(Frame::Image(&frame), "sources + sky");
    display.incr_default_frame();

    let mask = Mask::new(frame.bbox());
    let variance = frame.clone();
    let mut masked = MaskedImage::new(frame, mask, variance)?;

    let threshold = Threshold::create(config.detection_sigma, "stdev")?;
    let set = FootprintSet::new(&mut masked, &threshold, DETECTED)?;
    let before_subtraction = DetectionSummary::new(&set, &masked)?;
    info!(
        footprints = before_subtraction.footprints,
        coverage = before_subtraction.coverage,
        level = ?before_subtraction.threshold_level,
        "Detected without background subtraction"
    );
    display.mtv(Frame::Masked(&masked), "detections, sky included");
    display.incr_default_frame();
    if before_subtraction.coverage > SKY_DETECTED_COVERAGE {
        note(&mut gotchas, Gotcha::BackgroundNotSubtracted);
    }

    let (nx, ny) = config.background_cells;
    let background = make_background(&masked, &BackgroundControl::new(nx, ny))
        .context("background estimation failed")?;
    masked.sub_assign_image(&background.render::<f32>())?;

    masked.mask_mut().set(0);
    let set = FootprintSet::new(&mut masked, &threshold, DETECTED)?;
    let after_subtraction = DetectionSummary::new(&set, &masked)?;
    info!(
        footprints = after_subtraction.footprints,
        coverage = after_subtraction.coverage,
        level = ?after_subtraction.threshold_level,
        sources = sources.len(),
        "Detected after background subtraction"
    );
    display.mtv(Frame::Masked(&masked), "detections, sky subtracted");
    display.incr_default_frame();

    let residual_sky = make_masked_statistics(
        &masked,
        &StatisticsControl {
            and_mask: masked.mask().plane_bit_mask(DETECTED)?,
            ..Default::default()
        },
    );
    info!(
        npoint = residual_sky.npoint,
        median = residual_sky.median_clip,
        sigma = residual_sky.stdev_clip,
        "Residual sky"
    );

    let arrays = masked.arrays();
    info!(
        dtype = std::any::type_name::<f32>(),
        width = arrays.width,
        height = arrays.height,
        "Plane arrays"
    );
    let fill_value = masked.image().max().unwrap_or_default();

    let xy0 = masked.xy0();
    let mut corner = xy0;
    corner.shift(config.fill_offset);
    if corner != xy0 {
        note(&mut gotchas, Gotcha::InPlaceShift);
    }
    let fill_box = BoxI::new(corner, config.fill_extent);
    masked
        .image_view_mut(fill_box, ImageOrigin::Parent)?
        .fill(fill_value);
    let fill_visible = masked.image().get_parent(fill_box.min()) == Some(fill_value)
        && masked.image().get_parent(fill_box.max()) == Some(fill_value);
    display.mtv(Frame::Masked(&masked), "corner filled through a view");
    display.incr_default_frame();

    let (width, height) = (masked.width() as i32, masked.height() as i32);
    let left_box = BoxI::new(PointI::new(0, 0), ExtentI::new(width / 2, height));
    let right_box = BoxI::new(
        PointI::new(width / 2, 0),
        ExtentI::new(width - width / 2, height),
    );

    let original = masked.image().clone();
    masked
        .image_view_mut(left_box, ImageOrigin::Local)?
        .negate();

    let mut combined = Image::<f32>::new(masked.bbox());
    for half in [left_box, right_box] {
        combined
            .view_mut(half, ImageOrigin::Local)?
            .assign(&masked.image_view(half, ImageOrigin::Local)?)?;
    }
    let halves_match = is_left_negated(&original, &combined, width as usize / 2);
    info!(halves_match, "Combined halves");
    display.mtv(Frame::Image(&combined), "left half negated");
    display.incr_default_frame();

    Ok(TourReport {
        gotchas,
        frame_bbox: masked.bbox(),
        sub_region,
        sources,
        psf_sigma: psf.sigma(),
        before_subtraction,
        after_subtraction,
        residual_sky,
        fill_box,
        fill_value,
        fill_visible,
        halves_match,
        masked,
        combined,
    })
}

/// `combined` is `original` with columns `< split` negated, bit for bit.
fn is_left_negated(original: &Image<f32>, combined: &Image<f32>, split: usize) -> bool {
    if original.bbox() != combined.bbox() {
        return false;
    }
    (0..original.height()).all(|y| {
        let (a, b) = (original.array().row(y), combined.array().row(y));
        a.iter().zip(b).enumerate().all(|(x, (&o, &c))| {
            let expected = if x < split { -o } else { o };
            expected.to_bits() == c.to_bits()
        })
    })
}
