//! Bitmask planes with named flags.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::geom::{BoxI, PointI};
use crate::image::Image;

/// Storage type of one mask pixel; one bit per named plane.
pub type MaskPixel = u16;

/// Number of planes a [`MaskPixel`] can hold.
pub const MAX_MASK_PLANES: u8 = MaskPixel::BITS as u8;

/// Plane set on pixels above a positive detection threshold.
pub const DETECTED: &str = "DETECTED";
pub const DETECTED_NEGATIVE: &str = "DETECTED_NEGATIVE";

/// Planes every new mask starts with, in bit order.
pub const DEFAULT_PLANES: [&str; 9] = [
    "BAD",
    "SAT",
    "INTRP",
    "CR",
    "EDGE",
    DETECTED,
    DETECTED_NEGATIVE,
    "SUSPECT",
    "NO_DATA",
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MaskError {
    #[error("Mask plane '{0}' is not defined")]
    UnknownPlane(String),
    #[error("No free mask bit for plane '{0}' ({MAX_MASK_PLANES} planes max)")]
    PlanesExhausted(String),
}

/// Mapping from plane name to bit index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaskPlaneDict {
    planes: BTreeMap<String, u8>,
}

impl Default for MaskPlaneDict {
    fn default() -> Self {
        Self {
            planes: DEFAULT_PLANES
                .iter()
                .enumerate()
                .map(|(bit, name)| (name.to_string(), bit as u8))
                .collect(),
        }
    }
}

impl MaskPlaneDict {
    pub fn bit(&self, name: &str) -> Result<u8, MaskError> {
        self.planes
            .get(name)
            .copied()
            .ok_or_else(|| MaskError::UnknownPlane(name.to_string()))
    }

    /// Add `name` at the lowest free bit, or return its existing bit.
    pub fn add(&mut self, name: &str) -> Result<u8, MaskError> {
        if let Some(&bit) = self.planes.get(name) {
            return Ok(bit);
        }
        let bit = (0..MAX_MASK_PLANES)
            .find(|b| !self.planes.values().any(|used| used == b))
            .ok_or_else(|| MaskError::PlanesExhausted(name.to_string()))?;
        self.planes.insert(name.to_string(), bit);
        Ok(bit)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.planes.keys().map(String::as_str)
    }
}

/// Image of [`MaskPixel`] flags plus the plane dictionary naming its bits.
#[derive(Debug, Clone, PartialEq)]
pub struct Mask {
    image: Image<MaskPixel>,
    planes: MaskPlaneDict,
}

impl Mask {
    /// All-clear mask covering `bbox`.
    pub fn new(bbox: BoxI) -> Self {
        Self {
            image: Image::new(bbox),
            planes: MaskPlaneDict::default(),
        }
    }

    #[inline]
    pub fn bbox(&self) -> BoxI {
        self.image.bbox()
    }

    #[inline]
    pub fn xy0(&self) -> PointI {
        self.image.xy0()
    }

    #[inline]
    pub fn image(&self) -> &Image<MaskPixel> {
        &self.image
    }

    pub fn planes(&self) -> &MaskPlaneDict {
        &self.planes
    }

    /// Bit value of a named plane.
    pub fn plane_bit_mask(&self, name: &str) -> Result<MaskPixel, MaskError> {
        Ok(1 << self.planes.bit(name)?)
    }

    /// OR of the bit values of several planes.
    pub fn planes_bit_mask<S: AsRef<str>>(&self, names: &[S]) -> Result<MaskPixel, MaskError> {
        names.iter().try_fold(0, |acc, name| {
            Ok(acc | self.plane_bit_mask(name.as_ref())?)
        })
    }

    /// Register a plane and return its bit value.
    pub fn add_mask_plane(&mut self, name: &str) -> Result<MaskPixel, MaskError> {
        Ok(1 << self.planes.add(name)?)
    }

    /// Overwrite every pixel with `value`. `set(0)` clears all planes.
    pub fn set(&mut self, value: MaskPixel) {
        self.image.fill(value);
    }

    /// OR `bits` into LOCAL `(x, y)`.
    #[inline]
    pub fn set_bits(&mut self, x: usize, y: usize, bits: MaskPixel) {
        let value = self.image.get(x, y) | bits;
        self.image.set(x, y, value);
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> MaskPixel {
        self.image.get(x, y)
    }

    /// Number of pixels with any of `bits` set.
    pub fn count(&self, bits: MaskPixel) -> usize {
        self.image.array().iter().filter(|&&v| v & bits != 0).count()
    }

    /// Fraction of pixels with any of `bits` set.
    pub fn coverage(&self, bits: MaskPixel) -> f64 {
        let total = self.image.array().len();
        if total == 0 {
            return 0.0;
        }
        self.count(bits) as f64 / total as f64
    }
}
