use thiserror::Error;

use super::{ImageOrigin, Precision};
use crate::geom::{BoxI, ExtentI};

/// Errors raised by image construction and pixel arithmetic.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImageError {
    /// The requested box does not fit inside the image under the declared
    /// coordinate convention.
    #[error("Box {bbox} is not contained in image {parent} ({origin} coordinates)")]
    Length {
        bbox: BoxI,
        parent: BoxI,
        origin: ImageOrigin,
    },

    /// Arithmetic between pixel planes of different precision.
    #[error("Operation not implemented between {lhs} and {rhs} images; convert one of them first")]
    PrecisionMismatch { lhs: Precision, rhs: Precision },

    #[error("Image extents differ: {lhs} vs {rhs}")]
    ExtentMismatch { lhs: ExtentI, rhs: ExtentI },

    #[error("Image planes must share one bbox: expected {expected}, got {actual}")]
    BBoxMismatch { expected: BoxI, actual: BoxI },
}
