use std::ops::{Index, IndexMut, Range};
use std::slice;

/// Row-major 2D storage. Pixel `(x, y)` lives at `y * width + x`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Buffer2<T> {
    pixels: Vec<T>,
    width: usize,
    height: usize,
}

impl<T> Buffer2<T> {
    pub fn new(width: usize, height: usize, pixels: Vec<T>) -> Self {
        assert_eq!(
            pixels.len(),
            width * height,
            "pixels length must equal width * height"
        );
        Self {
            pixels,
            width,
            height,
        }
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> &T {
        debug_assert!(x < self.width && y < self.height);
        &self.pixels[y * self.width + x]
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn pixels(&self) -> &[T] {
        &self.pixels
    }

    #[inline]
    pub fn pixels_mut(&mut self) -> &mut [T] {
        &mut self.pixels
    }

    #[inline]
    pub fn iter(&self) -> slice::Iter<'_, T> {
        self.pixels.iter()
    }

    #[inline]
    pub fn iter_mut(&mut self) -> slice::IterMut<'_, T> {
        self.pixels.iter_mut()
    }

    /// Full row `y`.
    #[inline]
    pub fn row(&self, y: usize) -> &[T] {
        let start = y * self.width;
        &self.pixels[start..start + self.width]
    }

    #[inline]
    pub fn row_mut(&mut self, y: usize) -> &mut [T] {
        let start = y * self.width;
        &mut self.pixels[start..start + self.width]
    }

    /// Columns `xs` of row `y`.
    #[inline]
    pub fn row_segment(&self, y: usize, xs: Range<usize>) -> &[T] {
        debug_assert!(xs.end <= self.width);
        let start = y * self.width;
        &self.pixels[start + xs.start..start + xs.end]
    }

    #[inline]
    pub fn row_segment_mut(&mut self, y: usize, xs: Range<usize>) -> &mut [T] {
        debug_assert!(xs.end <= self.width);
        let start = y * self.width;
        &mut self.pixels[start + xs.start..start + xs.end]
    }

    /// Build a same-shaped buffer by applying `f` to every element.
    pub fn map<U>(&self, f: impl FnMut(&T) -> U) -> Buffer2<U> {
        Buffer2 {
            pixels: self.pixels.iter().map(f).collect(),
            width: self.width,
            height: self.height,
        }
    }
}

impl<T: Default + Clone> Buffer2<T> {
    pub fn new_default(width: usize, height: usize) -> Self {
        Self {
            pixels: vec![T::default(); width * height],
            width,
            height,
        }
    }
}

impl<T: Clone> Buffer2<T> {
    pub fn new_filled(width: usize, height: usize, value: T) -> Self {
        Self {
            pixels: vec![value; width * height],
            width,
            height,
        }
    }

    #[inline]
    pub fn fill(&mut self, value: T) {
        self.pixels.fill(value);
    }
}

impl<T> Index<(usize, usize)> for Buffer2<T> {
    type Output = T;

    #[inline]
    fn index(&self, (x, y): (usize, usize)) -> &Self::Output {
        &self.pixels[y * self.width + x]
    }
}

impl<T> IndexMut<(usize, usize)> for Buffer2<T> {
    #[inline]
    fn index_mut(&mut self, (x, y): (usize, usize)) -> &mut Self::Output {
        &mut self.pixels[y * self.width + x]
    }
}

impl<T> Index<usize> for Buffer2<T> {
    type Output = T;

    #[inline]
    fn index(&self, idx: usize) -> &Self::Output {
        &self.pixels[idx]
    }
}

impl<T> IndexMut<usize> for Buffer2<T> {
    #[inline]
    fn index_mut(&mut self, idx: usize) -> &mut Self::Output {
        &mut self.pixels[idx]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_stores_dimensions() {
        let buf = Buffer2::new(3, 2, vec![10, 20, 30, 40, 50, 60]);
        assert_eq!(buf.width(), 3);
        assert_eq!(buf.height(), 2);
        assert_eq!(buf.len(), 6);
        assert!(!buf.is_empty());
    }

    #[test]
    #[should_panic(expected = "pixels length must equal width * height")]
    fn test_new_panics_on_size_mismatch() {
        Buffer2::new(3, 2, vec![1, 2, 3]);
    }

    #[test]
    fn test_get_2d() {
        // row 0 = [10, 20, 30], row 1 = [40, 50, 60]
        let buf = Buffer2::new(3, 2, vec![10, 20, 30, 40, 50, 60]);
        assert_eq!(*buf.get(0, 0), 10);
        assert_eq!(*buf.get(2, 0), 30);
        assert_eq!(*buf.get(0, 1), 40);
        assert_eq!(buf[(2, 1)], 60);
    }

    #[test]
    fn test_rows() {
        let mut buf = Buffer2::new(3, 2, vec![10, 20, 30, 40, 50, 60]);
        assert_eq!(buf.row(1), &[40, 50, 60]);
        assert_eq!(buf.row_segment(0, 1..3), &[20, 30]);

        buf.row_segment_mut(1, 0..2).fill(0);
        assert_eq!(buf.pixels(), &[10, 20, 30, 0, 0, 60]);

        buf.row_mut(0).fill(7);
        assert_eq!(buf.row(0), &[7, 7, 7]);
    }

    #[test]
    fn test_map_preserves_shape() {
        let buf = Buffer2::new(2, 2, vec![1.5f64, 2.0, 3.0, 4.0]);
        let mapped = buf.map(|&v| v as f32 * 2.0);
        assert_eq!(mapped.width(), 2);
        assert_eq!(mapped.height(), 2);
        assert_eq!(mapped.pixels(), &[3.0f32, 4.0, 6.0, 8.0]);
    }

    #[test]
    fn test_fill_and_new_filled() {
        let mut buf = Buffer2::new_filled(2, 3, 42u16);
        assert!(buf.iter().all(|&v| v == 42));
        buf.fill(0);
        assert!(buf.iter().all(|&v| v == 0));
    }
}
