// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tuning constants and per-call options.

use crate::path::FillRule;
use peniko::kurbo::Rect;

/// The default flattening tolerance, in device pixels.
pub const DEFAULT_TOLERANCE: f32 = 0.25;

/// Empirically tuned constants.
///
/// The defaults reproduce the reference output; changing them changes the geometry of the
/// antialiasing ring and the point at which intersection resolution gives up.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Config {
    /// Distance of the antialiasing rings from the path boundary.
    pub offset_radius: f64,
    /// Squared distance under which a vertex between two opposing boundary edges is elided.
    pub pointy_vertex_dist_sq: f64,
    /// Joins whose normals have a cosine below the negation of this value are mitered.
    pub miter_cos: f64,
    /// Intersections whose edge lines have a cosine above this value get no bisector partner.
    pub bisector_parallel_cos: f64,
    /// Normalized lines whose coefficients differ by less than this are treated as parallel.
    pub near_parallel_epsilon: f64,
    /// Simplification fails once the edge count exceeds this multiple of the initial count.
    pub max_edge_growth: usize,
    /// Upper bound on the number of points a single curve flattens to.
    ///
    /// Paths that could flatten to more than about 2^29 points at this bound produce no output.
    pub max_points_per_curve: u32,
    /// Upper bound on the base 2 logarithm of the number of quadratics per conic.
    pub max_conic_quads_pow2: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            offset_radius: 0.5,
            pointy_vertex_dist_sq: 0.25 * 0.25,
            miter_cos: 0.97,
            bisector_parallel_cos: 0.999,
            near_parallel_epsilon: 1e-5,
            max_edge_growth: 170,
            max_points_per_curve: 1 << 10,
            max_conic_quads_pow2: 5,
        }
    }
}

/// How the path is turned into triangles.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    /// Strictly simple input only.
    ///
    /// Collinear vertices are preserved, and any self-intersection aborts with
    /// [`Error::SelfIntersection`](crate::Error::SelfIntersection).
    SimpleFan {
        /// Collect breadcrumb triangles for windings the fan alone does not express.
        collect_breadcrumbs: bool,
    },
    /// General fill of arbitrary paths, resolving all self-intersections.
    Fill {
        /// Write the winding number of each triangle into its vertices.
        emit_winding: bool,
    },
    /// Fill plus a coverage ramp half a pixel to either side of the boundary.
    Antialiased,
}

impl Default for Mode {
    fn default() -> Self {
        Self::Fill {
            emit_winding: false,
        }
    }
}

/// Options for a single triangulation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Options {
    /// Maximum distance between a curve and its flattened polyline. Values `<= 0` subdivide
    /// every curve to the limit.
    pub tolerance: f32,
    /// Device-space clip bounds, which inverse fill rules fill out to.
    pub clip_bounds: Rect,
    /// The triangulation mode.
    pub mode: Mode,
    /// Tuning constants.
    pub config: Config,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
            clip_bounds: Rect::ZERO,
            mode: Mode::default(),
            config: Config::default(),
        }
    }
}

impl Options {
    /// Options for the given mode, with default tolerance and constants.
    pub fn new(mode: Mode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    /// Set the flattening tolerance.
    pub fn with_tolerance(mut self, tolerance: f32) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Set the clip bounds.
    pub fn with_clip_bounds(mut self, clip_bounds: Rect) -> Self {
        self.clip_bounds = clip_bounds;
        self
    }

    /// The fill rule triangles are emitted with.
    ///
    /// Antialiased output has already been reduced to boundary rings, so it is always filtered
    /// with the nonzero rule.
    pub(crate) fn emit_rule(&self, path_rule: FillRule) -> FillRule {
        match self.mode {
            Mode::Antialiased => FillRule::NonZero,
            _ => path_rule,
        }
    }
}
