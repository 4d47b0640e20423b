// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Vello Triangulate turns filled 2D paths into triangles for GPU rasterization.
//!
//! A [`Path`] is flattened into polylines, its self-intersections are resolved with a sweep, and
//! the resulting simple polygons are split into monotone pieces and fanned into triangles. The
//! triangles are written into memory supplied by a [`VertexAllocator`], which is usually a mapped
//! GPU buffer.
//!
//! Three [`Mode`]s are supported:
//!
//! - [`Mode::Fill`] handles arbitrary paths under any [`FillRule`], optionally tagging each
//!   vertex with the winding number of its triangle.
//! - [`Mode::SimpleFan`] is a fast path for paths known to be simple. It keeps collinear vertices,
//!   fails with [`Error::SelfIntersection`] at the first crossing, and can collect
//!   [`BreadcrumbTriangle`]s for stencil based consumers.
//! - [`Mode::Antialiased`] additionally offsets the boundary half a pixel to either side and
//!   writes a coverage value with each vertex, ramping from opaque inside to transparent outside.
//!
//! ```
//! use vello_triangulate::{triangulate, FillRule, FillVertex, Options, Path, VecVertexAllocator};
//!
//! let mut path = Path::new(FillRule::NonZero);
//! path.move_to((0.0, 0.0));
//! path.line_to((100.0, 0.0));
//! path.line_to((50.0, 80.0));
//! path.close();
//!
//! let mut allocator = VecVertexAllocator::new();
//! let result = triangulate(&path, &Options::default(), &mut allocator)?;
//! assert_eq!(result.vertex_count, 3);
//! assert_eq!(allocator.vertices::<FillVertex>().len(), 3);
//! # Ok::<(), vello_triangulate::Error>(())
//! ```
//!
//! Paths can also be built from [`kurbo`] shapes, see [`Path::from_path_elements`].

// LINEBENDER LINT SET - lib.rs - v2
// See https://linebender.org/wiki/canonical-lints/
// These lints aren't included in Cargo.toml because they
// shouldn't apply to examples and tests
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![warn(clippy::print_stdout, clippy::print_stderr)]
// Targeting e.g. 32-bit means structs containing usize can give false positives for 64-bit.
#![cfg_attr(target_pointer_width = "64", warn(clippy::trivially_copy_pass_by_ref))]
// END LINEBENDER LINT SET
#![cfg_attr(docsrs, feature(doc_auto_cfg))]
#![forbid(unsafe_code)]

mod aa;
mod arena;
mod boundary;
mod collapse;
mod config;
mod flatten;
mod geom;
mod mesh;
mod monotone;
mod path;
mod simplify;
mod stroke;
mod triangulator;
mod writer;

use thiserror::Error;

pub use peniko::kurbo;

pub use config::{Config, Mode, Options, DEFAULT_TOLERANCE};
pub use geom::{Direction, Point};
pub use path::{FillRule, Path, Segment, Segments, Verb};
pub use triangulator::{BreadcrumbTriangle, Triangulation};
pub use writer::{
    CoverageVertex, FillVertex, VecVertexAllocator, VertexAllocator, VertexFormat, WindingVertex,
};

use triangulator::Triangulator;

/// Errors that can occur while triangulating.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// The path crossed itself in [`Mode::SimpleFan`].
    ///
    /// Nothing was written. Retry with [`Mode::Fill`].
    #[error("Path is not simple")]
    SelfIntersection,
    /// Resolving intersections produced more edges than the configured growth limit allows.
    ///
    /// See [`Config::max_edge_growth`].
    #[error("Intersection resolution grew {initial} edges past the limit of {limit}")]
    EdgeExplosion {
        /// The number of edges before simplification.
        initial: usize,
        /// The maximum number of edges allowed.
        limit: usize,
    },
    /// An edge was missing from the active edge list during a sweep.
    ///
    /// This indicates numerical trouble that the sweep could not recover from.
    #[error("Active edge list is inconsistent")]
    InconsistentActiveEdges,
}

/// Triangulate `path` into vertices allocated from `allocator`.
///
/// The vertex layout depends on [`Options::mode`], see [`VertexFormat`]. Paths without area
/// produce zero vertices, as does a failed allocation (which is logged as a warning).
pub fn triangulate<A: VertexAllocator + ?Sized>(
    path: &Path,
    options: &Options,
    allocator: &mut A,
) -> Result<Triangulation, Error> {
    Triangulator::new(options, path.fill_rule()).run(path, options, allocator)
}

/// The vertex layout [`triangulate`] writes for `mode`.
pub fn vertex_format(mode: Mode) -> VertexFormat {
    match mode {
        Mode::SimpleFan { .. } | Mode::Fill { emit_winding: false } => VertexFormat::Fill,
        Mode::Fill { emit_winding: true } => VertexFormat::Winding,
        Mode::Antialiased => VertexFormat::Coverage,
    }
}
