// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use strict_num::ApproxEqUlps;
pub use tiny_skia_path::{NonZeroRect, Point, Rect, Size, Transform};

/// Approximate zero equality comparisons.
pub trait ApproxZeroUlps: ApproxEqUlps {
    /// Checks if the number is approximately zero.
    fn approx_zero_ulps(&self, ulps: <Self::Flt as strict_num::Ulps>::U) -> bool;
}

impl ApproxZeroUlps for f32 {
    fn approx_zero_ulps(&self, ulps: i32) -> bool {
        self.approx_eq_ulps(&0.0, ulps)
    }
}

impl ApproxZeroUlps for f64 {
    fn approx_zero_ulps(&self, ulps: i64) -> bool {
        self.approx_eq_ulps(&0.0, ulps)
    }
}

/// Checks that the current number is > 0.
pub trait IsValidLength {
    /// Checks that the current number is > 0.
    fn is_valid_length(&self) -> bool;
}

impl IsValidLength for f32 {
    #[inline]
    fn is_valid_length(&self) -> bool {
        *self > 0.0 && self.is_finite()
    }
}

/// A fuzzy points comparison.
pub trait FuzzyEqPoint {
    /// Checks that two points are approximately equal.
    fn fuzzy_eq(&self, other: &Self) -> bool;
}

impl FuzzyEqPoint for Point {
    #[inline]
    fn fuzzy_eq(&self, other: &Self) -> bool {
        self.x.approx_eq_ulps(&other.x, 4) && self.y.approx_eq_ulps(&other.y, 4)
    }
}

/// A bounding box calculator.
#[derive(Clone, Copy, Debug)]
pub struct BBox {
    left: f32,
    top: f32,
    right: f32,
    bottom: f32,
}

impl From<Rect> for BBox {
    fn from(r: Rect) -> Self {
        Self {
            left: r.left(),
            top: r.top(),
            right: r.right(),
            bottom: r.bottom(),
        }
    }
}

impl From<NonZeroRect> for BBox {
    fn from(r: NonZeroRect) -> Self {
        Self {
            left: r.left(),
            top: r.top(),
            right: r.right(),
            bottom: r.bottom(),
        }
    }
}

impl Default for BBox {
    fn default() -> Self {
        Self {
            left: f32::MAX,
            top: f32::MAX,
            right: f32::MIN,
            bottom: f32::MIN,
        }
    }
}

impl BBox {
    /// Checks if the bounding box is default, i.e. invalid.
    pub fn is_default(&self) -> bool {
        self.left == f32::MAX
            && self.top == f32::MAX
            && self.right == f32::MIN
            && self.bottom == f32::MIN
    }

    /// Expand the bounding box to the specified bounds.
    #[must_use]
    pub fn expand(&self, r: impl Into<Self>) -> Self {
        self.expand_impl(r.into())
    }

    fn expand_impl(&self, r: Self) -> Self {
        Self {
            left: self.left.min(r.left),
            top: self.top.min(r.top),
            right: self.right.max(r.right),
            bottom: self.bottom.max(r.bottom),
        }
    }

    /// Converts a bounding box into [`Rect`].
    pub fn to_rect(&self) -> Option<Rect> {
        if !self.is_default() {
            Rect::from_ltrb(self.left, self.top, self.right, self.bottom)
        } else {
            None
        }
    }

    /// Converts a bounding box into [`NonZeroRect`].
    pub fn to_non_zero_rect(&self) -> Option<NonZeroRect> {
        if !self.is_default() {
            NonZeroRect::from_ltrb(self.left, self.top, self.right, self.bottom)
        } else {
            None
        }
    }
}

/// Maps a logical source rectangle onto a device target rectangle.
///
/// Both axes are scaled independently and the source origin is translated
/// onto the target origin. Returns the transform that performs the mapping.
pub fn map_rect_to_rect(source: NonZeroRect, target: NonZeroRect) -> Transform {
    let sx = target.width() / source.width();
    let sy = target.height() / source.height();
    Transform::from_translate(target.x(), target.y())
        .pre_scale(sx, sy)
        .pre_translate(-source.x(), -source.y())
}

/// Returns the united rectangle of two rectangles.
pub fn join_rects(a: Rect, b: Rect) -> Rect {
    BBox::from(a).expand(b).to_rect().unwrap_or(a)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn map_origin_and_scale() {
        let source = NonZeroRect::from_xywh(10.0, 20.0, 100.0, 50.0).unwrap();
        let target = NonZeroRect::from_xywh(0.0, 0.0, 200.0, 200.0).unwrap();
        let ts = map_rect_to_rect(source, target);

        let mut p = Point::from_xy(10.0, 20.0);
        ts.map_point(&mut p);
        assert!(p.fuzzy_eq(&Point::from_xy(0.0, 0.0)));

        let mut p = Point::from_xy(110.0, 70.0);
        ts.map_point(&mut p);
        assert!(p.fuzzy_eq(&Point::from_xy(200.0, 200.0)));
    }

    #[test]
    fn bbox_expand() {
        let a = Rect::from_xywh(0.0, 0.0, 10.0, 10.0).unwrap();
        let b = Rect::from_xywh(5.0, 5.0, 10.0, 10.0).unwrap();
        let r = BBox::default().expand(a).expand(b).to_rect().unwrap();
        assert_eq!(r, Rect::from_ltrb(0.0, 0.0, 15.0, 15.0).unwrap());
    }
}
