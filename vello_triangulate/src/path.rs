// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The input path model.

use crate::geom::Point;
use peniko::kurbo::{self, PathEl};
use peniko::Fill;

/// How winding numbers map to filled regions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum FillRule {
    /// Regions with a non-zero winding number are filled.
    #[default]
    NonZero,
    /// Regions with an odd winding number are filled.
    EvenOdd,
    /// Regions with a zero winding number are filled, out to the clip bounds.
    InverseNonZero,
    /// Regions with an even winding number are filled, out to the clip bounds.
    InverseEvenOdd,
}

impl FillRule {
    /// Whether this rule fills the outside of the path.
    pub fn is_inverse(self) -> bool {
        matches!(self, Self::InverseNonZero | Self::InverseEvenOdd)
    }

    /// Whether a region with the given winding is filled.
    ///
    /// For inverse rules the winding includes the clip bounds contour added while building
    /// contours, which contributes exactly one.
    pub fn contains(self, winding: i32) -> bool {
        match self {
            Self::NonZero => winding != 0,
            Self::EvenOdd => winding & 1 != 0,
            Self::InverseNonZero => winding == 1,
            Self::InverseEvenOdd => winding & 1 == 1,
        }
    }
}

impl From<Fill> for FillRule {
    fn from(value: Fill) -> Self {
        match value {
            Fill::NonZero => Self::NonZero,
            Fill::EvenOdd => Self::EvenOdd,
        }
    }
}

/// A path verb.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verb {
    /// Start a new contour. Consumes one point.
    Move,
    /// A line. Consumes one point.
    Line,
    /// A quadratic Bézier. Consumes two points.
    Quad,
    /// A rational quadratic with a weight. Consumes two points and one weight.
    Conic,
    /// A cubic Bézier. Consumes three points.
    Cubic,
    /// Close the current contour.
    Close,
}

impl Verb {
    fn point_count(self) -> usize {
        match self {
            Self::Move | Self::Line => 1,
            Self::Quad | Self::Conic => 2,
            Self::Cubic => 3,
            Self::Close => 0,
        }
    }
}

/// A segment of a path, with absolute points including the current point.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Segment {
    /// Start of a contour.
    Move(Point),
    /// A line from the current point.
    Line([Point; 2]),
    /// A quadratic Bézier from the current point.
    Quad([Point; 3]),
    /// A conic from the current point, with its weight.
    Conic([Point; 3], f32),
    /// A cubic Bézier from the current point.
    Cubic([Point; 4]),
    /// End of a closed contour.
    Close,
}

/// A filled path.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Path {
    verbs: Vec<Verb>,
    points: Vec<Point>,
    weights: Vec<f32>,
    fill_rule: FillRule,
}

impl Path {
    /// Create an empty path with the given fill rule.
    pub fn new(fill_rule: FillRule) -> Self {
        Self {
            fill_rule,
            ..Self::default()
        }
    }

    /// Build a path from kurbo path elements.
    pub fn from_path_elements(
        elements: impl IntoIterator<Item = PathEl>,
        fill_rule: impl Into<FillRule>,
    ) -> Self {
        let mut path = Self::new(fill_rule.into());
        for el in elements {
            match el {
                PathEl::MoveTo(p) => path.move_to(p),
                PathEl::LineTo(p) => path.line_to(p),
                PathEl::QuadTo(p1, p2) => path.quad_to(p1, p2),
                PathEl::CurveTo(p1, p2, p3) => path.cubic_to(p1, p2, p3),
                PathEl::ClosePath => path.close(),
            }
        }
        path
    }

    /// The fill rule.
    pub fn fill_rule(&self) -> FillRule {
        self.fill_rule
    }

    /// Replace the fill rule.
    pub fn set_fill_rule(&mut self, fill_rule: FillRule) {
        self.fill_rule = fill_rule;
    }

    /// The verbs of the path.
    pub fn verbs(&self) -> &[Verb] {
        &self.verbs
    }

    /// Whether the path has no verbs.
    pub fn is_empty(&self) -> bool {
        self.verbs.is_empty()
    }

    /// Start a new contour.
    pub fn move_to(&mut self, p: impl Into<kurbo::Point>) {
        self.verbs.push(Verb::Move);
        self.points.push(p.into().into());
    }

    /// Add a line to the current contour.
    pub fn line_to(&mut self, p: impl Into<kurbo::Point>) {
        self.ensure_move();
        self.verbs.push(Verb::Line);
        self.points.push(p.into().into());
    }

    /// Add a quadratic Bézier to the current contour.
    pub fn quad_to(&mut self, p1: impl Into<kurbo::Point>, p2: impl Into<kurbo::Point>) {
        self.ensure_move();
        self.verbs.push(Verb::Quad);
        self.points.push(p1.into().into());
        self.points.push(p2.into().into());
    }

    /// Add a conic section to the current contour.
    pub fn conic_to(
        &mut self,
        p1: impl Into<kurbo::Point>,
        p2: impl Into<kurbo::Point>,
        weight: f32,
    ) {
        self.ensure_move();
        self.verbs.push(Verb::Conic);
        self.points.push(p1.into().into());
        self.points.push(p2.into().into());
        self.weights.push(weight);
    }

    /// Add a cubic Bézier to the current contour.
    pub fn cubic_to(
        &mut self,
        p1: impl Into<kurbo::Point>,
        p2: impl Into<kurbo::Point>,
        p3: impl Into<kurbo::Point>,
    ) {
        self.ensure_move();
        self.verbs.push(Verb::Cubic);
        self.points.push(p1.into().into());
        self.points.push(p2.into().into());
        self.points.push(p3.into().into());
    }

    /// Close the current contour.
    pub fn close(&mut self) {
        if matches!(self.verbs.last(), Some(v) if *v != Verb::Close) {
            self.verbs.push(Verb::Close);
        }
    }

    /// The bounding box of every point, control points included.
    pub fn bounds(&self) -> Option<kurbo::Rect> {
        let (first, rest) = self.points.split_first()?;
        let first = kurbo::Point::from(*first);
        let rect = kurbo::Rect::from_points(first, first);
        Some(
            rest.iter()
                .fold(rect, |r, p| r.union_pt(kurbo::Point::from(*p))),
        )
    }

    /// Whether the path has any curve verbs.
    pub fn is_linear(&self) -> bool {
        !self
            .verbs
            .iter()
            .any(|v| matches!(v, Verb::Quad | Verb::Conic | Verb::Cubic))
    }

    /// Iterate over the segments of the path.
    pub fn segments(&self) -> Segments<'_> {
        Segments {
            path: self,
            verb: 0,
            point: 0,
            weight: 0,
            last: Point::ZERO,
        }
    }

    // A drawing verb without a preceding move starts at the last contour's start, or the origin.
    fn ensure_move(&mut self) {
        if self.verbs.is_empty() {
            self.move_to(kurbo::Point::ZERO);
        } else if self.verbs.last() == Some(&Verb::Close) {
            let start = self.contour_start();
            self.verbs.push(Verb::Move);
            self.points.push(start);
        }
    }

    fn contour_start(&self) -> Point {
        let mut point = 0;
        let mut start = Point::ZERO;
        for verb in &self.verbs {
            if *verb == Verb::Move {
                start = self.points[point];
            }
            point += verb.point_count();
        }
        start
    }
}

/// Iterator over the segments of a [`Path`].
#[derive(Clone, Debug)]
pub struct Segments<'a> {
    path: &'a Path,
    verb: usize,
    point: usize,
    weight: usize,
    last: Point,
}

impl Iterator for Segments<'_> {
    type Item = Segment;

    fn next(&mut self) -> Option<Segment> {
        let verb = *self.path.verbs.get(self.verb)?;
        self.verb += 1;
        let pts = &self.path.points[self.point..self.point + verb.point_count()];
        self.point += verb.point_count();
        let last = self.last;
        let segment = match verb {
            Verb::Move => Segment::Move(pts[0]),
            Verb::Line => Segment::Line([last, pts[0]]),
            Verb::Quad => Segment::Quad([last, pts[0], pts[1]]),
            Verb::Conic => {
                let weight = self.path.weights[self.weight];
                self.weight += 1;
                Segment::Conic([last, pts[0], pts[1]], weight)
            }
            Verb::Cubic => Segment::Cubic([last, pts[0], pts[1], pts[2]]),
            Verb::Close => Segment::Close,
        };
        if let Some(p) = pts.last() {
            self.last = *p;
        }
        Some(segment)
    }
}

impl From<&kurbo::BezPath> for Path {
    fn from(value: &kurbo::BezPath) -> Self {
        Self::from_path_elements(value.elements().iter().copied(), FillRule::NonZero)
    }
}
