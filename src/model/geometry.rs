//! Normalized bounding boxes, containment math and reading order.
//!
//! Every detected region is described by a [`BBox`] whose coordinates are
//! fractions of the page raster's width and height. A `BBox` is immutable
//! once built; the only way to obtain one is through a validating factory.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default percentage of a box that must be covered for it to count as inside another.
pub const DEFAULT_INTERSECTION_THRESHOLD: f64 = 90.0;

/// An axis-aligned box with coordinates normalized to `[0, 1]`.
///
/// Invariant: `0 <= x_min < x_max <= 1` and `0 <= y_min < y_max <= 1`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawBBox")]
pub struct BBox {
    x_min: f64,
    y_min: f64,
    x_max: f64,
    y_max: f64,
}

#[derive(Deserialize)]
struct RawBBox {
    x_min: f64,
    y_min: f64,
    x_max: f64,
    y_max: f64,
}

impl TryFrom<RawBBox> for BBox {
    type Error = Error;

    fn try_from(raw: RawBBox) -> Result<Self> {
        BBox::new(raw.x_min, raw.y_min, raw.x_max, raw.y_max)
    }
}

impl BBox {
    /// Create a box from normalized coordinates.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidGeometry`] if a coordinate is not finite, lies
    /// outside `[0, 1]`, or if a minimum is not strictly below its maximum.
    pub fn new(x_min: f64, y_min: f64, x_max: f64, y_max: f64) -> Result<Self> {
        for (name, value) in [
            ("x_min", x_min),
            ("y_min", y_min),
            ("x_max", x_max),
            ("y_max", y_max),
        ] {
            if !value.is_finite() {
                return Err(Error::InvalidGeometry(format!(
                    "{} must be a finite number, got {}",
                    name, value
                )));
            }
            if !(0.0..=1.0).contains(&value) {
                return Err(Error::InvalidGeometry(format!(
                    "{} must be in the range [0, 1], got {}",
                    name, value
                )));
            }
        }
        if x_min >= x_max {
            return Err(Error::InvalidGeometry(format!(
                "x_min ({}) must be less than x_max ({})",
                x_min, x_max
            )));
        }
        if y_min >= y_max {
            return Err(Error::InvalidGeometry(format!(
                "y_min ({}) must be less than y_max ({})",
                y_min, y_max
            )));
        }

        Ok(Self {
            x_min,
            y_min,
            x_max,
            y_max,
        })
    }

    /// Create a box from pixel coordinates on a raster of the given size.
    pub fn from_pixels(
        x_min: f64,
        y_min: f64,
        x_max: f64,
        y_max: f64,
        width: u32,
        height: u32,
    ) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidGeometry(format!(
                "cannot normalize against an empty {}x{} raster",
                width, height
            )));
        }
        let (w, h) = (width as f64, height as f64);
        Self::new(x_min / w, y_min / h, x_max / w, y_max / h)
    }

    pub fn x_min(&self) -> f64 {
        self.x_min
    }

    pub fn y_min(&self) -> f64 {
        self.y_min
    }

    pub fn x_max(&self) -> f64 {
        self.x_max
    }

    pub fn y_max(&self) -> f64 {
        self.y_max
    }

    pub fn width(&self) -> f64 {
        self.x_max - self.x_min
    }

    pub fn height(&self) -> f64 {
        self.y_max - self.y_min
    }

    pub fn x_center(&self) -> f64 {
        (self.x_min + self.x_max) / 2.0
    }

    pub fn y_center(&self) -> f64 {
        (self.y_min + self.y_max) / 2.0
    }

    pub fn area(&self) -> f64 {
        (self.x_max - self.x_min) * (self.y_max - self.y_min)
    }

    /// Area of the overlap rectangle, `0.0` when the boxes are disjoint.
    pub fn intersection_area(&self, other: &BBox) -> f64 {
        let x_min = self.x_min.max(other.x_min);
        let x_max = self.x_max.min(other.x_max);
        let y_min = self.y_min.max(other.y_min);
        let y_max = self.y_max.min(other.y_max);

        if x_max < x_min || y_max < y_min {
            return 0.0;
        }
        (x_max - x_min) * (y_max - y_min)
    }

    /// Percentage of `self` covered by `other`.
    ///
    /// Asymmetric: a small box inside a large one is 100% covered, while the
    /// large box is only partially covered by the small one.
    pub fn intersection_percentage(&self, other: &BBox) -> f64 {
        self.intersection_area(other) / self.area() * 100.0
    }

    /// Whether more than `threshold` percent of `self` lies inside `other`.
    pub fn is_in(&self, other: &BBox, threshold: f64) -> bool {
        self.intersection_percentage(other) > threshold
    }

    /// Whether `self` sits in a column to the left of `other`.
    ///
    /// The tolerance is half the wider of the two boxes.
    pub fn column_before(&self, other: &BBox) -> bool {
        let max_width = self.width().max(other.width());
        self.x_min < other.x_min - max_width / 2.0
    }

    /// Whether the left edges are within half the wider box's width.
    pub fn same_column(&self, other: &BBox) -> bool {
        let max_width = self.width().max(other.width());
        (self.x_min - other.x_min).abs() < max_width / 2.0
    }

    /// Column-aware reading order: left column first, then top to bottom.
    ///
    /// This relation is asymmetric but not transitive. Boxes of very
    /// different widths can form cycles, so it must not be handed to
    /// `slice::sort_by`; use [`sort_by_reading_order`] instead.
    pub fn reads_before(&self, other: &BBox) -> bool {
        self.column_before(other) || (self.same_column(other) && self.y_min < other.y_min)
    }

    /// Pixel rectangle covering this box on a `width` x `height` raster.
    ///
    /// Minimum edges are floored and maximum edges ceiled, then clamped to
    /// the raster. The result is at least one pixel wide and high.
    pub fn to_pixels(&self, width: u32, height: u32) -> PixelRect {
        let (w, h) = (width as f64, height as f64);
        let x0 = (self.x_min * w).floor().clamp(0.0, w) as u32;
        let y0 = (self.y_min * h).floor().clamp(0.0, h) as u32;
        let x1 = (self.x_max * w).ceil().clamp(0.0, w) as u32;
        let y1 = (self.y_max * h).ceil().clamp(0.0, h) as u32;

        let x = x0.min(width.saturating_sub(1));
        let y = y0.min(height.saturating_sub(1));
        PixelRect {
            x,
            y,
            width: x1.saturating_sub(x).max(1),
            height: y1.saturating_sub(y).max(1),
        }
    }
}

/// An integer pixel rectangle on a raster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Stable insertion sort driven only by [`BBox::reads_before`].
///
/// Each item moves left past every neighbour it reads before, and stops at
/// the first one it does not. Cyclic inputs still terminate and produce a
/// deterministic permutation.
pub fn sort_by_reading_order<T, F>(items: &mut [T], bbox_of: F)
where
    F: Fn(&T) -> &BBox,
{
    for i in 1..items.len() {
        let mut j = i;
        while j > 0 && bbox_of(&items[j]).reads_before(bbox_of(&items[j - 1])) {
            items.swap(j, j - 1);
            j -= 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bbox(x_min: f64, y_min: f64, x_max: f64, y_max: f64) -> BBox {
        BBox::new(x_min, y_min, x_max, y_max).unwrap()
    }

    #[test]
    fn test_rejects_inverted_and_out_of_range() {
        assert!(matches!(
            BBox::new(0.5, 0.1, 0.5, 0.2),
            Err(Error::InvalidGeometry(_))
        ));
        assert!(BBox::new(0.1, 0.3, 0.2, 0.2).is_err());
        assert!(BBox::new(-0.1, 0.1, 0.2, 0.2).is_err());
        assert!(BBox::new(0.1, 0.1, 1.2, 0.2).is_err());
        assert!(BBox::new(f64::NAN, 0.1, 0.2, 0.2).is_err());
        assert!(BBox::new(0.0, 0.0, 1.0, 1.0).is_ok());
    }

    #[test]
    fn test_derived_fields() {
        let b = bbox(0.2, 0.4, 0.6, 0.5);
        assert!((b.width() - 0.4).abs() < 1e-12);
        assert!((b.height() - 0.1).abs() < 1e-12);
        assert!((b.x_center() - 0.4).abs() < 1e-12);
        assert!((b.y_center() - 0.45).abs() < 1e-12);
    }

    #[test]
    fn test_from_pixels() {
        let b = BBox::from_pixels(100.0, 50.0, 300.0, 150.0, 1000, 500).unwrap();
        assert!((b.x_min() - 0.1).abs() < 1e-12);
        assert!((b.y_max() - 0.3).abs() < 1e-12);
        assert!(BBox::from_pixels(0.0, 0.0, 10.0, 10.0, 0, 10).is_err());
        assert!(BBox::from_pixels(0.0, 0.0, 1200.0, 10.0, 1000, 10).is_err());
    }

    #[test]
    fn test_intersection_area_symmetric() {
        let a = bbox(0.0, 0.0, 0.5, 0.5);
        let b = bbox(0.25, 0.25, 0.75, 0.75);
        assert!((a.intersection_area(&b) - 0.0625).abs() < 1e-12);
        assert_eq!(a.intersection_area(&b), b.intersection_area(&a));

        let far = bbox(0.8, 0.8, 0.9, 0.9);
        assert_eq!(a.intersection_area(&far), 0.0);
    }

    #[test]
    fn test_containment_is_asymmetric() {
        let inner = bbox(0.2, 0.2, 0.3, 0.3);
        let outer = bbox(0.1, 0.1, 0.9, 0.9);
        assert!(inner.is_in(&outer, DEFAULT_INTERSECTION_THRESHOLD));
        assert!(!outer.is_in(&inner, DEFAULT_INTERSECTION_THRESHOLD));
        assert!((inner.intersection_percentage(&outer) - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_self_containment() {
        let b = bbox(0.13, 0.27, 0.71, 0.33);
        assert!(b.is_in(&b, DEFAULT_INTERSECTION_THRESHOLD));
        assert!(b.is_in(&b, 99.9));
    }

    #[test]
    fn test_reading_order_two_columns() {
        let left_low = bbox(0.05, 0.8, 0.45, 0.9);
        let right_top = bbox(0.55, 0.1, 0.95, 0.2);
        let left_top = bbox(0.05, 0.1, 0.45, 0.2);

        assert!(left_low.reads_before(&right_top));
        assert!(left_top.reads_before(&left_low));
        assert!(!right_top.reads_before(&left_low));
    }

    #[test]
    fn test_reading_order_is_asymmetric() {
        let boxes = [
            bbox(0.05, 0.1, 0.45, 0.2),
            bbox(0.06, 0.3, 0.44, 0.4),
            bbox(0.55, 0.05, 0.95, 0.15),
            bbox(0.05, 0.5, 0.95, 0.7),
        ];
        for a in &boxes {
            for b in &boxes {
                assert!(!(a.reads_before(b) && b.reads_before(a)));
            }
        }
    }

    #[test]
    fn test_reading_order_cycle_sorts_without_panic() {
        // Two narrow boxes a column apart, both inside the band of one wide
        // box: a < b by column, b < c and c < a by height.
        let a = bbox(0.10, 0.50, 0.15, 0.60);
        let b = bbox(0.20, 0.10, 0.25, 0.20);
        let c = bbox(0.15, 0.30, 0.75, 0.40);
        assert!(a.reads_before(&b));
        assert!(b.reads_before(&c));
        assert!(c.reads_before(&a));

        let mut items = vec![a, b, c];
        sort_by_reading_order(&mut items, |bb| bb);
        assert_eq!(items.len(), 3);

        let mut again = vec![a, b, c];
        sort_by_reading_order(&mut again, |bb| bb);
        assert_eq!(items, again);
        // No adjacent pair is out of order, so the input order survives.
        assert_eq!(items, vec![a, b, c]);
    }

    #[test]
    fn test_to_pixels_floor_ceil() {
        let b = bbox(0.1234, 0.2, 0.5, 0.25);
        let rect = b.to_pixels(1000, 100);
        assert_eq!(rect.x, 123);
        assert_eq!(rect.y, 20);
        assert_eq!(rect.width, 500 - 123);
        assert_eq!(rect.height, 5);
    }
}
