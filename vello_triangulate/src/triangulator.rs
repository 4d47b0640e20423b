// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The per-call triangulation state and the pass driver.

use log::{debug, warn};

use crate::arena::MAX_ITEMS;
use crate::config::{Config, Mode, Options};
use crate::geom::{Comparator, Direction, Point};
use crate::mesh::{Arena, VertexList};
use crate::monotone::PolyId;
use crate::path::{FillRule, Path};
use crate::simplify::SimplifyResult;
use crate::writer::{write_vertices, VertexAllocator, VertexFormat};
use crate::Error;

/// The most vertices a path may flatten to. Intersections and antialiasing rings add more.
const MAX_FLATTENED_POINTS: usize = MAX_ITEMS / 8;

/// A triangle that a stencil based consumer adds on top of the fan to reproduce the exact
/// winding of the path.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BreadcrumbTriangle {
    /// The corners of the triangle.
    pub points: [Point; 3],
    /// The winding the triangle contributes.
    pub winding: i32,
}

/// The result of a successful triangulation.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Triangulation {
    /// The number of vertices written to the allocator, three per triangle.
    pub vertex_count: usize,
    /// Whether the path consisted of lines only.
    pub is_linear: bool,
    /// Breadcrumb triangles, collected in [`Mode::SimpleFan`] with the nonzero fill rule.
    pub breadcrumbs: Vec<BreadcrumbTriangle>,
}

/// Working state that only one mode needs.
#[derive(Debug)]
pub(crate) enum ModeState {
    SimpleFan {
        breadcrumbs: Option<Vec<BreadcrumbTriangle>>,
    },
    Fill,
    Antialiased {
        /// The outer ring, kept for the coverage ribbon on the fast path.
        outer_mesh: VertexList,
    },
}

/// Everything one triangulation call owns.
pub(crate) struct Triangulator {
    pub arena: Arena,
    pub config: Config,
    pub c: Comparator,
    /// The fill rule of the path, used when classifying boundaries.
    pub path_rule: FillRule,
    /// The fill rule polygons are emitted with.
    pub fill_rule: FillRule,
    pub state: ModeState,
}

impl Triangulator {
    pub(crate) fn new(options: &Options, path_rule: FillRule) -> Self {
        let state = match options.mode {
            Mode::SimpleFan {
                collect_breadcrumbs,
            } => ModeState::SimpleFan {
                breadcrumbs: (collect_breadcrumbs && path_rule == FillRule::NonZero)
                    .then(Vec::new),
            },
            Mode::Fill { .. } => ModeState::Fill,
            Mode::Antialiased => ModeState::Antialiased {
                outer_mesh: VertexList::EMPTY,
            },
        };
        Self {
            arena: Arena::default(),
            config: options.config,
            c: Comparator {
                direction: Direction::Vertical,
            },
            path_rule,
            fill_rule: options.emit_rule(path_rule),
            state,
        }
    }

    pub(crate) fn rounds_to_quarter_pixel(&self) -> bool {
        matches!(self.state, ModeState::Antialiased { .. })
    }

    pub(crate) fn preserves_collinear_vertices(&self) -> bool {
        matches!(self.state, ModeState::SimpleFan { .. })
    }

    pub(crate) fn disallows_self_intersection(&self) -> bool {
        matches!(self.state, ModeState::SimpleFan { .. })
    }

    pub(crate) fn breadcrumbs_mut(&mut self) -> Option<&mut Vec<BreadcrumbTriangle>> {
        match &mut self.state {
            ModeState::SimpleFan { breadcrumbs } => breadcrumbs.as_mut(),
            _ => None,
        }
    }

    pub(crate) fn take_breadcrumbs(&mut self) -> Vec<BreadcrumbTriangle> {
        self.breadcrumbs_mut().map(core::mem::take).unwrap_or_default()
    }

    /// Run every pass from contours to monotone polygons.
    ///
    /// Returns `None` if a crossing was found while self-intersections are disallowed.
    pub(crate) fn contours_to_polys(
        &mut self,
        contours: &mut [VertexList],
    ) -> Result<Option<Vec<PolyId>>, Error> {
        let mut mesh = self.contours_to_mesh(contours);
        self.sort_mesh(&mut mesh);
        self.merge_coincident_vertices(&mut mesh);
        let result = self.simplify(&mut mesh)?;
        debug!(
            "simplified mesh: {result:?}, {} vertices, {} edges",
            self.arena.vertices.len(),
            self.arena.edges.len()
        );
        match result {
            SimplifyResult::Abort => Ok(None),
            _ if self.rounds_to_quarter_pixel() => self.tessellate_antialiased(mesh).map(Some),
            _ => Ok(Some(self.tessellate(&mesh))),
        }
    }

    /// Write the triangles of `polys`, and of the coverage ribbon if there is one.
    fn polys_to_triangles<A: VertexAllocator + ?Sized>(
        &mut self,
        polys: &[PolyId],
        format: VertexFormat,
        allocator: &mut A,
    ) -> usize {
        let ribbons = self.ribbon_edges();
        let count = self.count_points(polys) + 6 * ribbons.len();
        if count > i32::MAX as usize {
            warn!("triangulation needs {count} vertices, which is too many");
            return 0;
        }
        debug!("emitting {count} vertices from {} polys", polys.len());
        write_vertices(allocator, format, count, |writer| {
            self.emit_polys(polys, writer);
            self.emit_ribbons(&ribbons, writer);
        })
    }

    /// Triangulate `path` into `allocator`.
    pub(crate) fn run<A: VertexAllocator + ?Sized>(
        mut self,
        path: &Path,
        options: &Options,
        allocator: &mut A,
    ) -> Result<Triangulation, Error> {
        let bound = self.flattened_point_bound(path);
        if bound > MAX_FLATTENED_POINTS {
            warn!("path may flatten to {bound} vertices, which is too many");
            return Ok(Triangulation {
                vertex_count: 0,
                is_linear: path.is_linear(),
                breadcrumbs: Vec::new(),
            });
        }
        let (mut contours, is_linear) =
            self.path_to_contours(path, options.tolerance, options.clip_bounds);
        if contours.is_empty() {
            return Ok(Triangulation {
                vertex_count: 0,
                is_linear: true,
                breadcrumbs: Vec::new(),
            });
        }
        if let Some(bounds) = path.bounds() {
            self.c = Comparator::for_extent(bounds.width(), bounds.height());
        }
        let Some(polys) = self.contours_to_polys(&mut contours)? else {
            debug!("self-intersection in strict mode; aborting");
            return Err(Error::SelfIntersection);
        };
        let format = crate::vertex_format(options.mode);
        let vertex_count = self.polys_to_triangles(&polys, format, allocator);
        Ok(Triangulation {
            vertex_count,
            is_linear,
            breadcrumbs: self.take_breadcrumbs(),
        })
    }
}
