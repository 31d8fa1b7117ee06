//! Where the tour shows its frames.
//!
//! A [`DisplaySink`] receives each frame as it is produced. Nothing is read
//! back from it, so a sink can log, record or ignore what it is given.

use crate::geom::BoxI;
use crate::image::Image;
use crate::mask::DETECTED;
use crate::masked_image::MaskedImage;

/// Something that can be shown.
#[derive(Debug, Clone, Copy)]
pub enum Frame<'a> {
    Image(&'a Image<f32>),
    Masked(&'a MaskedImage),
}

impl Frame<'_> {
    pub fn image(&self) -> &Image<f32> {
        match *self {
            Frame::Image(image) => image,
            Frame::Masked(masked) => masked.image(),
        }
    }

    pub fn summary(&self) -> FrameSummary {
        let image = self.image();
        let pixels = image.array();
        let mean = if pixels.is_empty() {
            0.0
        } else {
            pixels.iter().map(|&v| v as f64).sum::<f64>() / pixels.len() as f64
        };
        let detected = match self {
            Frame::Image(_) => None,
            Frame::Masked(masked) => masked
                .mask()
                .plane_bit_mask(DETECTED)
                .ok()
                .map(|bit| masked.mask().coverage(bit)),
        };
        FrameSummary {
            bbox: image.bbox(),
            min: image.min().unwrap_or(f32::NAN),
            max: image.max().unwrap_or(f32::NAN),
            mean,
            detected,
        }
    }
}

/// What a sink can cheaply say about a frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameSummary {
    pub bbox: BoxI,
    pub min: f32,
    pub max: f32,
    pub mean: f64,
    /// Fraction of DETECTED pixels, for masked frames.
    pub detected: Option<f64>,
}

pub trait DisplaySink {
    /// Show `frame` in the current display frame.
    fn mtv(&mut self, frame: Frame<'_>, title: &str);

    /// Move on to the next display frame.
    fn incr_default_frame(&mut self);

    /// Mask overlay opacity in percent, for one plane or all of them.
    fn set_mask_transparency(&mut self, percent: u8, plane: Option<&str>);
}

/// Logs a one-line summary of each frame.
#[derive(Debug, Default)]
pub struct LogDisplay {
    frame: u32,
    transparency: Option<u8>,
}

impl LogDisplay {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DisplaySink for LogDisplay {
    fn mtv(&mut self, frame: Frame<'_>, title: &str) {
        let summary = frame.summary();
        tracing::info!(
            frame = self.frame,
            title,
            bbox = %summary.bbox,
            min = summary.min,
            max = summary.max,
            mean = summary.mean,
            detected = ?summary.detected,
            mask_transparency = ?self.transparency,
            "Display"
        );
    }

    fn incr_default_frame(&mut self) {
        self.frame += 1;
    }

    fn set_mask_transparency(&mut self, percent: u8, plane: Option<&str>) {
        tracing::debug!(percent, plane = ?plane, "Mask transparency");
        self.transparency = Some(percent);
    }
}

/// One frame kept by [`RecordingDisplay`].
#[derive(Debug, Clone)]
pub struct ShownFrame {
    pub frame: u32,
    pub title: String,
    pub summary: FrameSummary,
    pub pixels: Image<f32>,
}

/// Keeps a copy of everything shown. Meant for tests.
#[derive(Debug, Default)]
pub struct RecordingDisplay {
    pub shown: Vec<ShownFrame>,
    pub transparency: Option<u8>,
    frame: u32,
}

impl RecordingDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current display frame number.
    pub fn frame(&self) -> u32 {
        self.frame
    }
}

impl DisplaySink for RecordingDisplay {
    fn mtv(&mut self, frame: Frame<'_>, title: &str) {
        self.shown.push(ShownFrame {
            frame: self.frame,
            title: title.to_string(),
            summary: frame.summary(),
            pixels: frame.image().clone(),
        });
    }

    fn incr_default_frame(&mut self) {
        self.frame += 1;
    }

    fn set_mask_transparency(&mut self, percent: u8, _plane: Option<&str>) {
        self.transparency = Some(percent);
    }
}
