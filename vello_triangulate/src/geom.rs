// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Points, implicit lines and the sweep comparator.

use peniko::kurbo;

/// A point.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct Point {
    /// The x coordinate of the point.
    pub x: f32,
    /// The y coordinate of the point.
    pub y: f32,
}

impl Point {
    /// The point `(0, 0)`.
    pub const ZERO: Self = Self::new(0., 0.);

    /// Create a new point.
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Whether both coordinates are finite.
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// The dot product of two vectors.
    pub fn dot(self, other: Self) -> f32 {
        self.x * other.x + self.y * other.y
    }

    /// The z component of the cross product of two vectors.
    pub fn cross(self, other: Self) -> f32 {
        self.x * other.y - self.y * other.x
    }

    /// The squared length of the vector.
    pub fn length_squared(self) -> f32 {
        self.dot(self)
    }

    /// The squared distance between two points.
    pub fn distance_squared(self, other: Self) -> f32 {
        (other - self).length_squared()
    }

    /// The vector scaled to unit length, or zero if it has no length (or can't be scaled).
    pub fn normalize(self) -> Self {
        let len = (self.x as f64).hypot(self.y as f64);
        if len > 0.0 && len.is_finite() {
            let scaled = Self::new((self.x as f64 / len) as f32, (self.y as f64 / len) as f32);
            if scaled.is_finite() {
                return scaled;
            }
        }
        Self::ZERO
    }
}

impl core::ops::Add for Point {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl core::ops::Sub for Point {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl core::ops::Mul<f32> for Point {
    type Output = Self;

    fn mul(self, rhs: f32) -> Self {
        Self::new(self.x * rhs, self.y * rhs)
    }
}

impl From<kurbo::Point> for Point {
    fn from(value: kurbo::Point) -> Self {
        Self::new(value.x as f32, value.y as f32)
    }
}

impl From<Point> for kurbo::Point {
    fn from(value: Point) -> Self {
        Self::new(value.x as f64, value.y as f64)
    }
}

impl From<(f32, f32)> for Point {
    fn from((x, y): (f32, f32)) -> Self {
        Self::new(x, y)
    }
}

/// Round to the nearest quarter pixel.
pub(crate) fn round_to_quarter_pixel(v: f32) -> f32 {
    (v * 4.0 + 0.5).floor() * 0.25
}

/// Convert to `f32`, saturating at the finite range and flushing values too small to matter.
pub(crate) fn double_to_clamped_f32(d: f64) -> f32 {
    // Anything closer to zero than this would lose most of its precision through later math.
    const NEAR_ZERO: f64 = 16.0 * f32::MIN_POSITIVE as f64;
    if d.abs() < NEAR_ZERO {
        0.0
    } else if d > f32::MAX as f64 {
        f32::MAX
    } else if d < f32::MIN as f64 {
        f32::MIN
    } else {
        d as f32
    }
}

/// Clamp without panicking on an empty range.
pub(crate) fn pin(v: f32, lo: f32, hi: f32) -> f32 {
    lo.max(v.min(hi))
}

/// A line in implicit form, `a * x + b * y + c = 0`.
///
/// For the line from `p` to `q` with `p` above `q` on the page, points further right have
/// positive distance.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Line {
    pub a: f64,
    pub b: f64,
    pub c: f64,
}

impl Line {
    pub(crate) fn new(a: f64, b: f64, c: f64) -> Self {
        Self { a, b, c }
    }

    pub(crate) fn from_points(p: Point, q: Point) -> Self {
        let (px, py) = (p.x as f64, p.y as f64);
        let (qx, qy) = (q.x as f64, q.y as f64);
        Self::new(qy - py, px - qx, (py - qy) * px + (qx - px) * py)
    }

    /// Scaled signed distance from the line.
    pub(crate) fn dist(&self, p: Point) -> f64 {
        self.a * p.x as f64 + self.b * p.y as f64 + self.c
    }

    pub(crate) fn scaled(&self, s: f64) -> Self {
        Self::new(self.a * s, self.b * s, self.c * s)
    }

    pub(crate) fn mag_sq(&self) -> f64 {
        self.a * self.a + self.b * self.b
    }

    pub(crate) fn normalize(&mut self) {
        let len = self.mag_sq().sqrt();
        if len == 0.0 {
            return;
        }
        let scale = 1.0 / len;
        self.a *= scale;
        self.b *= scale;
        self.c *= scale;
    }

    pub(crate) fn near_parallel(&self, other: &Self, epsilon: f64) -> bool {
        (other.a - self.a).abs() < epsilon && (other.b - self.b).abs() < epsilon
    }

    /// Compute the intersection of two (infinite) lines, snapped to a quarter pixel.
    pub(crate) fn intersect(&self, other: &Self) -> Option<Point> {
        let denom = self.a * other.b - self.b * other.a;
        if denom == 0.0 {
            return None;
        }
        let scale = 1.0 / denom;
        let x = double_to_clamped_f32((self.b * other.c - other.b * self.c) * scale);
        let y = double_to_clamped_f32((other.a * self.c - self.a * other.c) * scale);
        let p = Point::new(round_to_quarter_pixel(x), round_to_quarter_pixel(y));
        p.is_finite().then_some(p)
    }
}

/// The primary axis of the sweep.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    /// Sweep from left to right, breaking ties bottom to top.
    Horizontal,
    /// Sweep from top to bottom, breaking ties left to right.
    Vertical,
}

/// Total order on points along the sweep.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Comparator {
    pub direction: Direction,
}

impl Comparator {
    /// Sweep along the longer side of the bounding box.
    pub(crate) fn for_extent(width: f64, height: f64) -> Self {
        let direction = if width > height {
            Direction::Horizontal
        } else {
            Direction::Vertical
        };
        Self { direction }
    }

    pub(crate) fn sweep_lt(&self, a: Point, b: Point) -> bool {
        match self.direction {
            Direction::Horizontal => a.x < b.x || (a.x == b.x && a.y > b.y),
            Direction::Vertical => a.y < b.y || (a.y == b.y && a.x < b.x),
        }
    }

    /// Clamp `p` into the sweep box between `min` and `max`.
    ///
    /// The primary coordinate of `min` never exceeds that of `max`; the secondary one may.
    pub(crate) fn clamp(&self, p: &mut Point, min: Point, max: Point) {
        match self.direction {
            Direction::Horizontal => {
                let (lo, hi) = if min.y > max.y { (max.y, min.y) } else { (min.y, max.y) };
                p.x = pin(p.x, min.x, max.x);
                p.y = pin(p.y, lo, hi);
            }
            Direction::Vertical => {
                let (lo, hi) = if min.x > max.x { (max.x, min.x) } else { (min.x, max.x) };
                p.x = pin(p.x, lo, hi);
                p.y = pin(p.y, min.y, max.y);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{round_to_quarter_pixel, Comparator, Direction, Line, Point};

    #[test]
    fn line_distance_sign() {
        let line = Line::from_points(Point::new(0.0, 0.0), Point::new(0.0, 10.0));
        assert!(line.dist(Point::new(1.0, 5.0)) > 0.0);
        assert!(line.dist(Point::new(-1.0, 5.0)) < 0.0);
        assert_eq!(line.dist(Point::new(0.0, 5.0)), 0.0);
    }

    #[test]
    fn lines_intersect_on_quarter_pixels() {
        let a = Line::from_points(Point::new(0.0, 0.0), Point::new(10.0, 10.0));
        let b = Line::from_points(Point::new(0.0, 10.0), Point::new(10.0, 0.0));
        assert_eq!(a.intersect(&b), Some(Point::new(5.0, 5.0)));

        let c = Line::from_points(Point::new(0.0, 0.1), Point::new(10.0, 0.1));
        let d = Line::from_points(Point::new(0.1, 0.0), Point::new(0.1, 10.0));
        assert_eq!(c.intersect(&d), Some(Point::new(0.0, 0.0)));
    }

    #[test]
    fn parallel_lines_do_not_intersect() {
        let a = Line::from_points(Point::new(0.0, 0.0), Point::new(10.0, 0.0));
        let b = Line::from_points(Point::new(0.0, 5.0), Point::new(10.0, 5.0));
        assert_eq!(a.intersect(&b), None);
        let mut na = a;
        let mut nb = b;
        na.normalize();
        nb.normalize();
        assert!(na.near_parallel(&nb, 1e-5));
    }

    #[test]
    fn quarter_pixel_rounding() {
        assert_eq!(round_to_quarter_pixel(1.1), 1.0);
        assert_eq!(round_to_quarter_pixel(1.2), 1.25);
        assert_eq!(round_to_quarter_pixel(-0.3), -0.25);
    }

    #[test]
    fn sweep_order_follows_direction() {
        let vertical = Comparator::for_extent(10.0, 20.0);
        assert_eq!(vertical.direction, Direction::Vertical);
        assert!(vertical.sweep_lt(Point::new(5.0, 0.0), Point::new(0.0, 1.0)));
        assert!(vertical.sweep_lt(Point::new(0.0, 1.0), Point::new(5.0, 1.0)));

        let horizontal = Comparator::for_extent(20.0, 10.0);
        assert_eq!(horizontal.direction, Direction::Horizontal);
        assert!(horizontal.sweep_lt(Point::new(0.0, 5.0), Point::new(1.0, 0.0)));
        assert!(horizontal.sweep_lt(Point::new(1.0, 5.0), Point::new(1.0, 0.0)));
    }
}
