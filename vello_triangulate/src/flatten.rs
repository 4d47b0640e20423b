// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Flattening a path into closed polyline contours.

use log::{debug, warn};
use peniko::kurbo::Rect;
use smallvec::{smallvec, SmallVec};

use crate::geom::Point;
use crate::mesh::VertexList;
use crate::path::{Path, Segment, Verb};
use crate::triangulator::Triangulator;

/// Squared distance from `p` to the segment `a..b`.
fn distance_to_segment_sq(p: Point, a: Point, b: Point) -> f32 {
    let v = b - a;
    let w = p - a;
    let t = v.dot(w);
    if t <= 0.0 {
        return w.length_squared();
    }
    let len_sq = v.length_squared();
    if t >= len_sq {
        return p.distance_squared(b);
    }
    let det = v.cross(w);
    det * det / len_sq
}

fn midpoint(a: Point, b: Point) -> Point {
    (a + b) * 0.5
}

/// Evaluate the quadratic through `p` at `t`, in power basis.
fn eval_quad([p0, p1, p2]: [Point; 3], t: f32) -> Point {
    let a = p2 - p1 * 2.0 + p0;
    let b = (p1 - p0) * 2.0;
    (a * t + b) * t + p0
}

/// Flatness of the quadratic over `t - u/2..t + u/2`.
fn quad_error_at(pts: [Point; 3], t: f32, u: f32) -> f32 {
    let p0 = eval_quad(pts, t - 0.5 * u);
    let mid = eval_quad(pts, t);
    let p1 = eval_quad(pts, t + 0.5 * u);
    if !p0.is_finite() || !mid.is_finite() || !p1.is_finite() {
        return 0.0;
    }
    distance_to_segment_sq(mid, p0, p1)
}

/// A power-of-two point budget for a cubic, from the distance of its control points to the chord.
fn cubic_point_count([p0, p1, p2, p3]: [Point; 4], tolerance: f32, max_points: u32) -> u32 {
    let tolerance = tolerance.max(1e-4);
    let d = distance_to_segment_sq(p1, p0, p3)
        .max(distance_to_segment_sq(p2, p0, p3))
        .sqrt();
    if !d.is_finite() {
        return max_points;
    }
    if d <= tolerance {
        return 1;
    }
    let div = (d / tolerance).sqrt();
    if div >= i32::MAX as f32 {
        return max_points;
    }
    (div.ceil() as u32).next_power_of_two().clamp(1, max_points)
}

/// The base 2 logarithm of the number of quadratics needed to approximate a conic.
fn conic_quad_pow2([p0, p1, p2]: [Point; 3], weight: f32, tolerance: f32, max_pow2: u32) -> u32 {
    if !(p0.is_finite() && p1.is_finite() && p2.is_finite() && weight.is_finite()) {
        return 0;
    }
    if tolerance.is_nan() || tolerance <= 0.0 {
        return max_pow2;
    }
    let a = weight - 1.0;
    let k = a / (4.0 * (2.0 + a));
    let x = k * (p0.x - 2.0 * p1.x + p2.x);
    let y = k * (p0.y - 2.0 * p1.y + p2.y);
    let mut error = (x * x + y * y).sqrt();
    let mut pow2 = 0;
    while pow2 < max_pow2 && error > tolerance {
        error *= 0.25;
        pow2 += 1;
    }
    pow2
}

/// Split a conic at `t = 0.5`.
fn chop_conic(([p0, p1, p2], w): ([Point; 3], f32)) -> [([Point; 3], f32); 2] {
    let scale = 1.0 / (1.0 + w);
    let new_w = (0.5 + 0.5 * w).sqrt();
    let wp1 = p1 * w;
    let m = (p0 + wp1 * 2.0 + p2) * (scale * 0.5);
    [
        ([p0, (p0 + wp1) * scale, m], new_w),
        ([m, (wp1 + p2) * scale, p2], new_w),
    ]
}

impl Triangulator {
    fn append_point(&mut self, p: Point, contour: &mut VertexList) {
        let v = self.arena.add_vertex(p, 255);
        self.arena.vertex_list_append(contour, v);
    }

    fn append_quad(&mut self, pts: [Point; 3], tol_sq: f32, contour: &mut VertexList) {
        let a = pts[2] - pts[1] * 2.0 + pts[0];
        let b = (pts[1] - pts[0]) * 2.0;
        let denom = 2.0 * a.length_squared();
        // Only the point of maximum curvature is tested; flat enough there means flat enough
        // everywhere.
        let t = if denom != 0.0 { -a.dot(b) / denom } else { 0.0 };
        let max_points = self.config.max_points_per_curve.max(1);
        let mut n = 1;
        while n < max_points {
            if quad_error_at(pts, t, 1.0 / n as f32) < tol_sq {
                break;
            }
            n += 1;
        }
        let u = 1.0 / n as f32;
        for j in 1..n {
            self.append_point(eval_quad(pts, j as f32 * u), contour);
        }
        self.append_point(pts[2], contour);
    }

    fn append_cubic(&mut self, pts: [Point; 4], tolerance: f32, contour: &mut VertexList) {
        let max_points = self.config.max_points_per_curve.max(1);
        let (budget, tol_sq) = if tolerance > 0.0 {
            (
                cubic_point_count(pts, tolerance, max_points),
                tolerance * tolerance,
            )
        } else {
            (max_points, 0.0)
        };
        let mut stack: SmallVec<[([Point; 4], u32); 16]> = smallvec![(pts, budget)];
        while let Some(([p0, p1, p2, p3], points_left)) = stack.pop() {
            let d1 = distance_to_segment_sq(p1, p0, p3);
            let d2 = distance_to_segment_sq(p2, p0, p3);
            if points_left < 2
                || (d1 < tol_sq && d2 < tol_sq)
                || !d1.is_finite()
                || !d2.is_finite()
            {
                self.append_point(p3, contour);
                continue;
            }
            let q = [midpoint(p0, p1), midpoint(p1, p2), midpoint(p2, p3)];
            let r = [midpoint(q[0], q[1]), midpoint(q[1], q[2])];
            let s = midpoint(r[0], r[1]);
            let points_left = points_left >> 1;
            stack.push(([s, r[1], q[2], p3], points_left));
            stack.push(([p0, q[0], r[0], s], points_left));
        }
    }

    fn append_conic(
        &mut self,
        pts: [Point; 3],
        weight: f32,
        tolerance: f32,
        contour: &mut VertexList,
    ) {
        let pow2 = conic_quad_pow2(pts, weight, tolerance, self.config.max_conic_quads_pow2);
        let mut conics: SmallVec<[([Point; 3], f32); 32]> = smallvec![(pts, weight)];
        for _ in 0..pow2 {
            conics = conics.into_iter().flat_map(chop_conic).collect();
        }
        let tol_sq = if tolerance > 0.0 {
            tolerance * tolerance
        } else {
            0.0
        };
        for (quad, _) in conics {
            self.append_quad(quad, tol_sq, contour);
        }
    }

    /// An upper bound on the number of vertices [`path_to_contours`](Self::path_to_contours)
    /// creates for `path`, including the clip contour.
    pub(crate) fn flattened_point_bound(&self, path: &Path) -> usize {
        let per_curve = self.config.max_points_per_curve.max(1) as usize;
        let quads_per_conic = 1_usize
            .checked_shl(self.config.max_conic_quads_pow2)
            .unwrap_or(usize::MAX);
        let per_conic = per_curve.saturating_mul(quads_per_conic);
        path.verbs().iter().fold(4_usize, |bound, verb| {
            bound.saturating_add(match verb {
                Verb::Move | Verb::Line => 1,
                Verb::Quad | Verb::Cubic => per_curve,
                Verb::Conic => per_conic,
                Verb::Close => 0,
            })
        })
    }

    /// Flatten `path` into contours of vertices.
    ///
    /// Inverse fill rules get an extra first contour around `clip_bounds`. Also returns whether
    /// the path had no curves.
    pub(crate) fn path_to_contours(
        &mut self,
        path: &Path,
        tolerance: f32,
        clip_bounds: Rect,
    ) -> (Vec<VertexList>, bool) {
        let mut contours = Vec::new();
        let mut is_linear = true;
        if path.fill_rule().is_inverse() {
            let mut contour = VertexList::EMPTY;
            let (l, t, r, b) = (
                clip_bounds.x0 as f32,
                clip_bounds.y0 as f32,
                clip_bounds.x1 as f32,
                clip_bounds.y1 as f32,
            );
            for p in [(l, b), (r, b), (r, t), (l, t)] {
                self.append_point(p.into(), &mut contour);
            }
            contours.push(contour);
        }
        let tol_sq = if tolerance > 0.0 {
            tolerance * tolerance
        } else {
            0.0
        };
        let mut contour = VertexList::EMPTY;
        for segment in path.segments() {
            match segment {
                Segment::Move(p) => {
                    if !contour.is_empty() {
                        contours.push(core::mem::take(&mut contour));
                    }
                    self.append_point(p, &mut contour);
                }
                Segment::Line([_, p]) => self.append_point(p, &mut contour),
                Segment::Quad(pts) => {
                    is_linear = false;
                    self.append_quad(pts, tol_sq, &mut contour);
                }
                Segment::Conic(pts, weight) => {
                    is_linear = false;
                    if !weight.is_finite() {
                        warn!("ignoring non-finite conic weight");
                        self.append_point(pts[2], &mut contour);
                    } else {
                        self.append_conic(pts, weight, tolerance, &mut contour);
                    }
                }
                Segment::Cubic(pts) => {
                    is_linear = false;
                    self.append_cubic(pts, tolerance, &mut contour);
                }
                Segment::Close => {}
            }
        }
        if !contour.is_empty() {
            contours.push(contour);
        }
        debug!(
            "flattened path into {} contours, {} vertices",
            contours.len(),
            self.arena.vertices.len()
        );
        (contours, is_linear)
    }
}

#[cfg(test)]
mod tests {
    use super::{
        conic_quad_pow2, cubic_point_count, distance_to_segment_sq, eval_quad, Triangulator,
    };
    use crate::config::Options;
    use crate::geom::Point;
    use crate::mesh::VertexList;
    use crate::path::{FillRule, Path};
    use peniko::kurbo::Rect;

    #[test]
    fn point_bound_counts_curves_at_the_cap() {
        let mut path = Path::new(FillRule::NonZero);
        path.move_to((0., 0.));
        path.line_to((10., 0.));
        path.cubic_to((10., 10.), (0., 10.), (0., 0.));
        path.conic_to((5., 5.), (0., 10.), 0.5);
        path.close();
        let t = Triangulator::new(&Options::default(), FillRule::NonZero);
        let per_curve = t.config.max_points_per_curve as usize;
        let per_conic = per_curve << t.config.max_conic_quads_pow2;
        assert_eq!(t.flattened_point_bound(&path), 4 + 2 + per_curve + per_conic);
    }

    fn points(t: &Triangulator, list: &VertexList) -> Vec<Point> {
        t.arena
            .collect_vertices(list)
            .into_iter()
            .map(|v| t.arena.point(v))
            .collect()
    }

    #[test]
    fn segment_distance() {
        let (a, b) = (Point::new(0., 0.), Point::new(10., 0.));
        assert_eq!(distance_to_segment_sq(Point::new(5., 3.), a, b), 9.0);
        assert_eq!(distance_to_segment_sq(Point::new(-3., 4.), a, b), 25.0);
        assert_eq!(distance_to_segment_sq(Point::new(13., 4.), a, b), 25.0);
    }

    #[test]
    fn cubic_budget_is_power_of_two() {
        let flat = [
            Point::new(0., 0.),
            Point::new(1., 0.),
            Point::new(2., 0.),
            Point::new(3., 0.),
        ];
        assert_eq!(cubic_point_count(flat, 0.25, 1024), 1);
        let curved = [
            Point::new(0., 0.),
            Point::new(0., 100.),
            Point::new(100., 100.),
            Point::new(100., 0.),
        ];
        let n = cubic_point_count(curved, 0.25, 1024);
        assert!(n.is_power_of_two() && n > 1);
        assert_eq!(cubic_point_count(curved, 0.25, 8), 8);
    }

    #[test]
    fn conic_subdivision_is_capped() {
        let pts = [Point::new(0., 0.), Point::new(100., 0.), Point::new(100., 100.)];
        let w = core::f32::consts::FRAC_1_SQRT_2;
        let pow2 = conic_quad_pow2(pts, w, 0.25, 5);
        assert!(pow2 > 0 && pow2 <= 5);
        assert_eq!(conic_quad_pow2(pts, w, 0.0, 5), 5);
        assert_eq!(conic_quad_pow2(pts, 1.0, 0.25, 5), 0);
    }

    #[test]
    fn moves_start_new_contours() {
        let mut path = Path::new(FillRule::NonZero);
        path.move_to((0., 0.));
        path.move_to((1., 1.));
        path.line_to((2., 1.));
        path.line_to((1., 2.));
        path.close();
        path.move_to((5., 5.));
        path.line_to((6., 5.));
        let mut t = Triangulator::new(&Options::default(), FillRule::NonZero);
        let (contours, is_linear) = t.path_to_contours(&path, 0.25, Rect::ZERO);
        assert!(is_linear);
        assert_eq!(contours.len(), 3);
        assert_eq!(points(&t, &contours[0]), vec![Point::new(0., 0.)]);
        assert_eq!(points(&t, &contours[1]).len(), 3);
        assert_eq!(
            points(&t, &contours[2]),
            vec![Point::new(5., 5.), Point::new(6., 5.)]
        );
    }

    #[test]
    fn inverse_fill_adds_clip_contour() {
        let mut path = Path::new(FillRule::InverseNonZero);
        path.move_to((1., 1.));
        path.line_to((2., 1.));
        path.line_to((1., 2.));
        let mut t = Triangulator::new(&Options::default(), FillRule::InverseNonZero);
        let clip = Rect::new(0., 0., 10., 20.);
        let (contours, _) = t.path_to_contours(&path, 0.25, clip);
        assert_eq!(contours.len(), 2);
        assert_eq!(
            points(&t, &contours[0]),
            vec![
                Point::new(0., 20.),
                Point::new(10., 20.),
                Point::new(10., 0.),
                Point::new(0., 0.)
            ]
        );
    }

    #[test]
    fn quads_stay_within_tolerance() {
        let pts = [Point::new(0., 0.), Point::new(50., 100.), Point::new(100., 0.)];
        let mut path = Path::new(FillRule::NonZero);
        path.move_to((0., 0.));
        path.quad_to((50., 100.), (100., 0.));
        let mut t = Triangulator::new(&Options::default(), FillRule::NonZero);
        let (contours, is_linear) = t.path_to_contours(&path, 0.25, Rect::ZERO);
        assert!(!is_linear);
        let flattened = points(&t, &contours[0]);
        assert_eq!(*flattened.last().unwrap(), pts[2]);
        // Check the midpoint of every chord against the curve at the matching parameter.
        let n = flattened.len() - 1;
        for i in 0..n {
            let t_mid = (i as f32 + 0.5) / n as f32;
            let chord_mid = (flattened[i] + flattened[i + 1]) * 0.5;
            let curve = eval_quad(pts, t_mid);
            assert!(chord_mid.distance_squared(curve) <= 0.25 * 0.25 + 1e-3);
        }
    }

    #[test]
    fn cubics_end_at_their_end_point() {
        let mut path = Path::new(FillRule::NonZero);
        path.move_to((0., 0.));
        path.cubic_to((0., 100.), (100., 100.), (100., 0.));
        for tolerance in [0.25, 0.0, f32::NAN] {
            let mut t = Triangulator::new(&Options::default(), FillRule::NonZero);
            let (contours, _) = t.path_to_contours(&path, tolerance, Rect::ZERO);
            let flattened = points(&t, &contours[0]);
            assert_eq!(*flattened.last().unwrap(), Point::new(100., 0.));
            assert!(flattened.len() > 2 && flattened.len() <= 1025);
        }
    }
}
