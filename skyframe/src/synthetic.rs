//! Synthetic source placement and kernel stamping.

use thiserror::Error;

use crate::geom::{BoxI, ExtentI, PointI};
use crate::image::{DynImage, Image, ImageError, ImageOrigin};
use crate::random::Random;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SyntheticError {
    #[error("Kernel has no positive pixel to normalize by (max = {0:?})")]
    FlatKernel(Option<f64>),
}

/// Draw `n` source positions, LOCAL to a `width × height` frame, with each
/// coordinate in `[margin, dim - margin)`.
///
/// All x values are drawn before any y value.
pub fn random_positions(
    rng: &mut Random,
    n: usize,
    width: usize,
    height: usize,
    margin: usize,
) -> Vec<PointI> {
    assert!(
        width > 2 * margin && height > 2 * margin,
        "Frame {}x{} leaves no room inside a {} pixel margin",
        width,
        height,
        margin
    );
    let mut draw = |dim: usize| -> Vec<i32> {
        (0..n)
            .map(|_| (rng.uniform_int((dim - 2 * margin) as u32) as usize + margin) as i32)
            .collect()
    };
    let xs = draw(width);
    let ys = draw(height);
    xs.into_iter()
        .zip(ys)
        .map(|(x, y)| PointI::new(x, y))
        .collect()
}

/// Divide by the kernel's maximum, then multiply by `peak`.
pub fn scale_to_peak(kernel: &mut DynImage, peak: f64) -> Result<(), SyntheticError> {
    let max = kernel.max();
    match max {
        Some(m) if m > 0.0 => {
            *kernel /= m;
            *kernel *= peak;
            Ok(())
        }
        _ => Err(SyntheticError::FlatKernel(max)),
    }
}

/// LOCAL box of a `size` kernel centered on `center`.
pub fn stamp_box(center: PointI, size: ExtentI) -> BoxI {
    let corner = PointI::new(
        center.x - (size.width - 1) / 2,
        center.y - (size.height - 1) / 2,
    );
    BoxI::new(corner, size)
}

/// Add `kernel` centered on each LOCAL position. Overlaps accumulate.
pub fn stamp_sources(
    frame: &mut Image<f32>,
    kernel: &Image<f32>,
    positions: &[PointI],
) -> Result<(), ImageError> {
    let size = kernel.dimensions();
    for &pos in positions {
        frame
            .view_mut(stamp_box(pos, size), ImageOrigin::Local)?
            .add_assign(&kernel.as_view())?;
    }
    tracing::debug!(count = positions.len(), "Stamped sources");
    Ok(())
}
