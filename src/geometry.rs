// src/geometry.rs
//
// Integer pixel rectangles and the directional overlap metric used by every
// occupancy decision. The metric is containment of the FIRST rectangle by the
// second, not IoU: swapping the arguments changes the answer.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Axis-aligned rectangle in pixel coordinates, `(x, y)` is the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Area in square pixels. Negative extents count as zero.
    pub fn area(&self) -> i64 {
        self.width.max(0) as i64 * self.height.max(0) as i64
    }

    /// Saturates at `i32::MAX`.
    pub fn right(&self) -> i32 {
        self.x.saturating_add(self.width)
    }

    pub fn bottom(&self) -> i32 {
        self.y.saturating_add(self.height)
    }

    /// Area shared with `other`, zero when they don't touch.
    pub fn intersection_area(&self, other: &Rect) -> i64 {
        let left = self.x.max(other.x);
        let top = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());

        let w = (right as i64 - left as i64).max(0);
        let h = (bottom as i64 - top as i64).max(0);
        w * h
    }

    pub fn translated(&self, dx: i32, dy: i32) -> Rect {
        Rect::new(self.x + dx, self.y + dy, self.width, self.height)
    }

    /// Grow by `pad_x` left and right, `pad_y` top and bottom.
    pub fn padded(&self, pad_x: i32, pad_y: i32) -> Rect {
        Rect::new(
            self.x - pad_x,
            self.y - pad_y,
            self.width + 2 * pad_x,
            self.height + 2 * pad_y,
        )
    }

    /// Clip to a `width x height` image. Returns `None` if nothing is left.
    pub fn clamp_to(&self, width: i32, height: i32) -> Option<Rect> {
        let left = self.x.max(0);
        let top = self.y.max(0);
        let right = self.right().min(width);
        let bottom = self.bottom().min(height);

        if right <= left || bottom <= top {
            return None;
        }
        Some(Rect::new(left, top, right - left, bottom - top))
    }
}

impl fmt::Display for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, {}, {}, {})",
            self.x, self.y, self.width, self.height
        )
    }
}

impl From<Rect> for opencv::core::Rect {
    fn from(r: Rect) -> Self {
        opencv::core::Rect::new(r.x, r.y, r.width, r.height)
    }
}

impl From<opencv::core::Rect> for Rect {
    fn from(r: opencv::core::Rect) -> Self {
        Rect::new(r.x, r.y, r.width, r.height)
    }
}

/// Fraction of `a` covered by `b`, in [0, 1].
///
/// Returns 0 when `a` has no area.
pub fn overlap_ratio(a: &Rect, b: &Rect) -> f32 {
    let a_area = a.area();
    if a_area == 0 {
        return 0.0;
    }
    (a.intersection_area(b) as f64 / a_area as f64) as f32
}
