use std::fmt;

use crate::geom::{BoxI, PointI};
use crate::mask::{Mask, MaskPixel};

/// A horizontal run of pixels `x0..=x1` on row `y`, in PARENT coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub y: i32,
    pub x0: i32,
    pub x1: i32,
}

impl Span {
    pub fn new(y: i32, x0: i32, x1: i32) -> Self {
        debug_assert!(x0 <= x1, "span must be non-empty");
        Self { y, x0, x1 }
    }

    /// Pixels covered, `x1 - x0 + 1`.
    #[inline]
    pub fn pixel_count(&self) -> usize {
        (self.x1 - self.x0 + 1) as usize
    }

    #[inline]
    pub fn contains(&self, p: PointI) -> bool {
        p.y == self.y && p.x >= self.x0 && p.x <= self.x1
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}..{}", self.y, self.x0, self.x1)
    }
}

/// Most significant pixel of a footprint, in PARENT coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Peak {
    pub position: PointI,
    pub value: f32,
}

/// A connected set of pixels that passed a threshold.
#[derive(Debug, Clone, PartialEq)]
pub struct Footprint {
    spans: Vec<Span>,
    bbox: BoxI,
    area: usize,
    peak: Peak,
}

impl Footprint {
    /// Build from spans in raster order. Panics if `spans` is empty.
    pub fn new(spans: Vec<Span>, peak: Peak) -> Self {
        assert!(!spans.is_empty(), "footprint needs at least one span");
        let mut bbox = BoxI::empty();
        let mut area = 0;
        for span in &spans {
            bbox.include(PointI::new(span.x0, span.y));
            bbox.include(PointI::new(span.x1, span.y));
            area += span.pixel_count();
        }
        Self {
            spans,
            bbox,
            area,
            peak,
        }
    }

    pub fn spans(&self) -> &[Span] {
        &self.spans
    }

    pub fn bbox(&self) -> BoxI {
        self.bbox
    }

    /// Number of pixels.
    pub fn area(&self) -> usize {
        self.area
    }

    pub fn peak(&self) -> Peak {
        self.peak
    }

    pub fn contains(&self, p: PointI) -> bool {
        self.bbox.contains_point(p) && self.spans.iter().any(|s| s.contains(p))
    }

    /// OR `bits` into every pixel of the footprint that lies on `mask`.
    pub fn set_mask(&self, mask: &mut Mask, bits: MaskPixel) {
        let clipped = self.bbox.intersection(&mask.bbox());
        if clipped.is_empty() {
            return;
        }
        let xy0 = mask.xy0();
        let (min, max) = (clipped.min(), clipped.max());
        for span in &self.spans {
            if span.y < min.y || span.y > max.y {
                continue;
            }
            let y = (span.y - xy0.y) as usize;
            for x in span.x0.max(min.x)..=span.x1.min(max.x) {
                mask.set_bits((x - xy0.x) as usize, y, bits);
            }
        }
    }
}
