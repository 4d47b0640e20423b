// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The vertex/edge mesh and the stage that builds it from flattened contours.
//!
//! A mesh is a list of vertices in sweep order. Each vertex keeps the edges ending at it ("above")
//! and starting at it ("below"), each list ordered left to right.

use crate::arena::{define_id, list_insert, list_remove, Links, List, Pool};
use crate::geom::{double_to_clamped_f32, round_to_quarter_pixel, Comparator, Line, Point};
use crate::monotone::{ChainId, MonotonePoly, Poly, PolyId};
use crate::triangulator::Triangulator;
use log::{log_enabled, trace, warn, Level};

define_id!(
    /// Index of a [`Vertex`].
    VertexId
);
define_id!(
    /// Index of an [`Edge`].
    EdgeId
);

/// A list of vertices, linked through [`Vertex::links`].
pub(crate) type VertexList = List<VertexId>;

/// A list of edges, linked through [`Edge::active`].
///
/// Used for the active edge list during sweeps, and for boundary loops.
pub(crate) type EdgeList = List<EdgeId>;

/// Which ring of the antialiasing geometry an edge belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum EdgeType {
    /// A path edge, or an edge of the inner (opaque) ring.
    Inner,
    /// An edge of the outer (transparent) ring.
    Outer,
    /// An edge joining the rings, carrying no winding.
    Connector,
}

#[derive(Clone, Debug)]
pub(crate) struct Vertex {
    pub point: Point,
    /// Position in the containing vertex list.
    pub links: Links<VertexId>,
    /// Edges ending at this vertex, left to right.
    pub above: List<EdgeId>,
    /// Edges starting at this vertex, left to right.
    pub below: List<EdgeId>,
    pub left_enclosing: Option<EdgeId>,
    pub right_enclosing: Option<EdgeId>,
    /// The matching vertex on the other antialiasing ring.
    pub partner: Option<VertexId>,
    pub alpha: u8,
    /// Created by merging or collapsing rather than taken from the input.
    pub synthetic: bool,
}

impl Vertex {
    fn new(point: Point, alpha: u8) -> Self {
        Self {
            point,
            links: Links::NONE,
            above: List::EMPTY,
            below: List::EMPTY,
            left_enclosing: None,
            right_enclosing: None,
            partner: None,
            alpha,
            synthetic: false,
        }
    }

    pub(crate) fn is_connected(&self) -> bool {
        !self.above.is_empty() || !self.below.is_empty()
    }

    pub(crate) fn links(v: &mut Self) -> &mut Links<VertexId> {
        &mut v.links
    }
}

/// An edge from `top` to `bottom`, which always sweep-precede each other in that order.
///
/// `winding` is +1 if the original path ran from top to bottom, -1 if the reverse, and sums when
/// edges merge.
#[derive(Clone, Debug)]
pub(crate) struct Edge {
    pub winding: i32,
    pub top: VertexId,
    pub bottom: VertexId,
    pub kind: EdgeType,
    /// Merged into another edge; no longer part of the mesh.
    pub removed: bool,
    /// Position in the active edge list, or in a boundary loop.
    pub active: Links<EdgeId>,
    /// Position in `bottom.above`.
    pub above: Links<EdgeId>,
    /// Position in `top.below`.
    pub below: Links<EdgeId>,
    pub left_poly: Option<PolyId>,
    pub right_poly: Option<PolyId>,
    pub left_chain: Links<EdgeId>,
    pub right_chain: Links<EdgeId>,
    pub used_in_left_poly: bool,
    pub used_in_right_poly: bool,
    pub line: Line,
}

impl Edge {
    pub(crate) fn active_links(e: &mut Self) -> &mut Links<EdgeId> {
        &mut e.active
    }

    pub(crate) fn above_links(e: &mut Self) -> &mut Links<EdgeId> {
        &mut e.above
    }

    pub(crate) fn below_links(e: &mut Self) -> &mut Links<EdgeId> {
        &mut e.below
    }

    pub(crate) fn left_chain_links(e: &mut Self) -> &mut Links<EdgeId> {
        &mut e.left_chain
    }

    pub(crate) fn right_chain_links(e: &mut Self) -> &mut Links<EdgeId> {
        &mut e.right_chain
    }
}

/// Storage for one triangulation.
#[derive(Debug, Default)]
pub(crate) struct Arena {
    pub vertices: Pool<VertexId, Vertex>,
    pub edges: Pool<EdgeId, Edge>,
    pub polys: Pool<PolyId, Poly>,
    pub chains: Pool<ChainId, MonotonePoly>,
}

impl Arena {
    pub(crate) fn add_vertex(&mut self, point: Point, alpha: u8) -> VertexId {
        self.vertices.push(Vertex::new(point, alpha))
    }

    /// Allocate an edge without connecting it to its vertices.
    pub(crate) fn add_edge(
        &mut self,
        top: VertexId,
        bottom: VertexId,
        winding: i32,
        kind: EdgeType,
    ) -> EdgeId {
        let line = Line::from_points(self.vertices[top].point, self.vertices[bottom].point);
        self.edges.push(Edge {
            winding,
            top,
            bottom,
            kind,
            removed: false,
            active: Links::NONE,
            above: Links::NONE,
            below: Links::NONE,
            left_poly: None,
            right_poly: None,
            left_chain: Links::NONE,
            right_chain: Links::NONE,
            used_in_left_poly: false,
            used_in_right_poly: false,
            line,
        })
    }

    #[inline(always)]
    pub(crate) fn point(&self, v: VertexId) -> Point {
        self.vertices[v].point
    }

    pub(crate) fn recompute_line(&mut self, e: EdgeId) {
        let edge = &self.edges[e];
        let line = Line::from_points(self.point(edge.top), self.point(edge.bottom));
        self.edges[e].line = line;
    }

    /// Signed distance of `p` from the edge's line; exactly zero at the endpoints.
    pub(crate) fn dist(&self, e: EdgeId, p: Point) -> f64 {
        let edge = &self.edges[e];
        if p == self.point(edge.top) || p == self.point(edge.bottom) {
            0.0
        } else {
            edge.line.dist(p)
        }
    }

    pub(crate) fn is_left_of(&self, e: EdgeId, v: VertexId) -> bool {
        self.dist(e, self.point(v)) > 0.0
    }

    pub(crate) fn is_right_of(&self, e: EdgeId, v: VertexId) -> bool {
        self.dist(e, self.point(v)) < 0.0
    }

    /// Insert `e` into `v`'s list of edges above, keeping the list ordered left to right.
    pub(crate) fn insert_above(&mut self, e: EdgeId, v: VertexId, c: &Comparator) {
        let (top, bottom) = (self.edges[e].top, self.edges[e].bottom);
        if self.point(top) == self.point(bottom) || c.sweep_lt(self.point(bottom), self.point(top))
        {
            return;
        }
        let mut prev = None;
        let mut next = self.vertices[v].above.head;
        while let Some(n) = next {
            if self.is_right_of(n, top) {
                break;
            }
            prev = Some(n);
            next = self.edges[n].above.next;
        }
        let mut list = self.vertices[v].above;
        list_insert(&mut self.edges, Edge::above_links, e, prev, next, &mut list);
        self.vertices[v].above = list;
    }

    /// Insert `e` into `v`'s list of edges below, keeping the list ordered left to right.
    pub(crate) fn insert_below(&mut self, e: EdgeId, v: VertexId, c: &Comparator) {
        let (top, bottom) = (self.edges[e].top, self.edges[e].bottom);
        if self.point(top) == self.point(bottom) || c.sweep_lt(self.point(bottom), self.point(top))
        {
            return;
        }
        let mut prev = None;
        let mut next = self.vertices[v].below.head;
        while let Some(n) = next {
            if self.is_right_of(n, bottom) {
                break;
            }
            prev = Some(n);
            next = self.edges[n].below.next;
        }
        let mut list = self.vertices[v].below;
        list_insert(&mut self.edges, Edge::below_links, e, prev, next, &mut list);
        self.vertices[v].below = list;
    }

    pub(crate) fn remove_above(&mut self, e: EdgeId) {
        let v = self.edges[e].bottom;
        let mut list = self.vertices[v].above;
        list_remove(&mut self.edges, Edge::above_links, e, &mut list);
        self.vertices[v].above = list;
    }

    pub(crate) fn remove_below(&mut self, e: EdgeId) {
        let v = self.edges[e].top;
        let mut list = self.vertices[v].below;
        list_remove(&mut self.edges, Edge::below_links, e, &mut list);
        self.vertices[v].below = list;
    }

    /// Detach `e` from both of its vertices.
    pub(crate) fn disconnect(&mut self, e: EdgeId) {
        self.remove_above(e);
        self.remove_below(e);
    }

    pub(crate) fn edge_list_contains(&self, list: &EdgeList, e: EdgeId) -> bool {
        let links = &self.edges[e].active;
        links.prev.is_some() || links.next.is_some() || list.head == Some(e)
    }

    /// Insert `e` after `prev` (or at the head). Returns `false` if it was already present.
    pub(crate) fn edge_list_insert(
        &mut self,
        list: &mut EdgeList,
        e: EdgeId,
        prev: Option<EdgeId>,
    ) -> bool {
        if self.edge_list_contains(list, e) {
            return false;
        }
        let next = match prev {
            Some(p) => self.edges[p].active.next,
            None => list.head,
        };
        list_insert(&mut self.edges, Edge::active_links, e, prev, next, list);
        true
    }

    pub(crate) fn edge_list_append(&mut self, list: &mut EdgeList, e: EdgeId) -> bool {
        let tail = list.tail;
        self.edge_list_insert(list, e, tail)
    }

    /// Remove `e`. Returns `false` if it wasn't present.
    pub(crate) fn edge_list_remove(&mut self, list: &mut EdgeList, e: EdgeId) -> bool {
        if !self.edge_list_contains(list, e) {
            return false;
        }
        list_remove(&mut self.edges, Edge::active_links, e, list);
        true
    }

    pub(crate) fn vertex_list_insert(
        &mut self,
        list: &mut VertexList,
        v: VertexId,
        prev: Option<VertexId>,
        next: Option<VertexId>,
    ) {
        list_insert(&mut self.vertices, Vertex::links, v, prev, next, list);
    }

    pub(crate) fn vertex_list_append(&mut self, list: &mut VertexList, v: VertexId) {
        let tail = list.tail;
        self.vertex_list_insert(list, v, tail, None);
    }

    pub(crate) fn vertex_list_remove(&mut self, list: &mut VertexList, v: VertexId) {
        list_remove(&mut self.vertices, Vertex::links, v, list);
    }

    /// Move every vertex of `other` to the end of `list`.
    pub(crate) fn vertex_list_append_list(&mut self, list: &mut VertexList, other: VertexList) {
        let Some(head) = other.head else {
            return;
        };
        match list.tail {
            Some(tail) => {
                self.vertices[tail].links.next = Some(head);
                self.vertices[head].links.prev = Some(tail);
            }
            None => list.head = Some(head),
        }
        list.tail = other.tail;
    }

    /// Collect the vertices of a list in order.
    pub(crate) fn collect_vertices(&self, list: &VertexList) -> Vec<VertexId> {
        let mut out = Vec::new();
        let mut cursor = list.head;
        while let Some(v) = cursor {
            out.push(v);
            cursor = self.vertices[v].links.next;
        }
        out
    }

    /// Log every vertex of the mesh with its edges.
    pub(crate) fn dump(&self, label: &str, list: &VertexList) {
        if !log_enabled!(Level::Trace) {
            return;
        }
        trace!("{label}:");
        for v in self.collect_vertices(list) {
            let vertex = &self.vertices[v];
            let partner = vertex.partner.map(|p| self.point(p));
            trace!(
                "vertex {v:?} ({}, {}) alpha {}{} partner {partner:?}",
                vertex.point.x,
                vertex.point.y,
                vertex.alpha,
                if vertex.synthetic { " synthetic" } else { "" }
            );
            let mut cursor = vertex.above.head;
            while let Some(e) = cursor {
                self.dump_edge(e);
                cursor = self.edges[e].above.next;
            }
            let mut cursor = vertex.below.head;
            while let Some(e) = cursor {
                self.dump_edge(e);
                cursor = self.edges[e].below.next;
            }
        }
    }

    fn dump_edge(&self, e: EdgeId) {
        let edge = &self.edges[e];
        trace!(
            "  edge {:?} -> {:?}, winding {}",
            edge.top,
            edge.bottom,
            edge.winding
        );
    }
}

impl Triangulator {
    /// Allocate an unconnected edge between two distinct vertices, oriented along the sweep.
    pub(crate) fn make_edge(&mut self, prev: VertexId, next: VertexId, kind: EdgeType) -> EdgeId {
        let a = &self.arena;
        let winding = if self.c.sweep_lt(a.point(prev), a.point(next)) {
            1
        } else {
            -1
        };
        let (top, bottom) = if winding < 0 { (next, prev) } else { (prev, next) };
        self.arena.add_edge(top, bottom, winding, kind)
    }

    /// Create an edge between two vertices and link it into the mesh.
    ///
    /// Returns `None` if either vertex is missing or they coincide.
    pub(crate) fn make_connecting_edge(
        &mut self,
        prev: Option<VertexId>,
        next: Option<VertexId>,
        kind: EdgeType,
        winding_scale: i32,
    ) -> Option<EdgeId> {
        let (prev, next) = (prev?, next?);
        if self.arena.point(prev) == self.arena.point(next) {
            return None;
        }
        let e = self.make_edge(prev, next, kind);
        let (top, bottom) = (self.arena.edges[e].top, self.arena.edges[e].bottom);
        self.arena.insert_below(e, top, &self.c);
        self.arena.insert_above(e, bottom, &self.c);
        self.arena.edges[e].winding *= winding_scale;
        // Without a sweep in progress there is no active edge list that can become inconsistent.
        let _ = self.merge_collinear_edges(e, None);
        Some(e)
    }

    /// Clean up each contour in place.
    ///
    /// Coordinates are clamped to the finite range (and rounded to quarter pixels for
    /// antialiasing). Vertices coincident with their predecessor, non-finite vertices and, unless
    /// collinear vertices are preserved, vertices on the line through their neighbours are
    /// removed.
    pub(crate) fn sanitize_contours(&mut self, contours: &mut [VertexList]) {
        let round = self.rounds_to_quarter_pixel();
        let preserve_collinear = self.preserves_collinear_vertices();
        let sanitize = |p: Point| {
            let p = Point::new(
                double_to_clamped_f32(p.x as f64),
                double_to_clamped_f32(p.y as f64),
            );
            if round {
                Point::new(round_to_quarter_pixel(p.x), round_to_quarter_pixel(p.y))
            } else {
                p
            }
        };
        for contour in contours.iter_mut() {
            let (Some(head), Some(tail)) = (contour.head, contour.tail) else {
                continue;
            };
            let mut prev = tail;
            self.arena.vertices[prev].point = sanitize(self.arena.point(prev));
            let mut cursor = Some(head);
            while let Some(v) = cursor {
                let p = sanitize(self.arena.point(v));
                self.arena.vertices[v].point = p;
                let next = self.arena.vertices[v].links.next;
                let next_wrap = next.or(contour.head).unwrap_or(v);
                let prev_point = self.arena.point(prev);
                if prev_point == p {
                    trace!("vertex {},{} coincident; removing", p.x, p.y);
                    self.arena.vertex_list_remove(contour, v);
                } else if !p.is_finite() {
                    warn!("ignoring non-finite vertex ({}, {})", p.x, p.y);
                    self.arena.vertex_list_remove(contour, v);
                } else if !preserve_collinear
                    && Line::from_points(prev_point, self.arena.point(next_wrap)).dist(p) == 0.0
                {
                    trace!("vertex {},{} collinear; removing", p.x, p.y);
                    self.arena.vertex_list_remove(contour, v);
                } else {
                    prev = v;
                }
                cursor = next;
            }
        }
    }

    /// Connect each contour's consecutive vertices with edges and gather them into one list.
    pub(crate) fn build_edges(&mut self, contours: &[VertexList]) -> VertexList {
        let mut mesh = VertexList::EMPTY;
        for contour in contours {
            let mut prev = contour.tail;
            let mut cursor = contour.head;
            while let Some(v) = cursor {
                let next = self.arena.vertices[v].links.next;
                self.make_connecting_edge(prev, Some(v), EdgeType::Inner, 1);
                self.arena.vertex_list_append(&mut mesh, v);
                prev = Some(v);
                cursor = next;
            }
        }
        mesh
    }

    /// Sanitize the contours, then build the edge mesh from them.
    pub(crate) fn contours_to_mesh(&mut self, contours: &mut [VertexList]) -> VertexList {
        if log_enabled!(Level::Trace) {
            for contour in contours.iter() {
                self.arena.dump("contour", contour);
            }
        }
        self.sanitize_contours(contours);
        self.build_edges(contours)
    }

    /// Stable sort of the mesh along the sweep.
    pub(crate) fn sort_mesh(&mut self, mesh: &mut VertexList) {
        let mut order = self.arena.collect_vertices(mesh);
        let c = self.c;
        let vertices = &self.arena.vertices;
        order.sort_by(|&a, &b| {
            let (pa, pb) = (vertices[a].point, vertices[b].point);
            if c.sweep_lt(pa, pb) {
                core::cmp::Ordering::Less
            } else if c.sweep_lt(pb, pa) {
                core::cmp::Ordering::Greater
            } else {
                core::cmp::Ordering::Equal
            }
        });
        *mesh = VertexList::EMPTY;
        for v in order {
            self.arena.vertex_list_append(mesh, v);
        }
    }

    /// Merge two lists that are each in sweep order into one.
    pub(crate) fn sorted_merge(
        &mut self,
        mut front: VertexList,
        mut back: VertexList,
    ) -> VertexList {
        let mut result = VertexList::EMPTY;
        while let (Some(a), Some(b)) = (front.head, back.head) {
            if self.c.sweep_lt(self.arena.point(a), self.arena.point(b)) {
                self.arena.vertex_list_remove(&mut front, a);
                self.arena.vertex_list_append(&mut result, a);
            } else {
                self.arena.vertex_list_remove(&mut back, b);
                self.arena.vertex_list_append(&mut result, b);
            }
        }
        self.arena.vertex_list_append_list(&mut result, front);
        self.arena.vertex_list_append_list(&mut result, back);
        result
    }

    /// Find or create a vertex at `p`, keeping `mesh` sorted.
    ///
    /// The search starts at `reference`, which should be near `p` in sweep order.
    pub(crate) fn make_sorted_vertex(
        &mut self,
        p: Point,
        alpha: u8,
        mesh: &mut VertexList,
        reference: Option<VertexId>,
    ) -> VertexId {
        let c = self.c;
        let mut prev = reference;
        while let Some(pv) = prev {
            if !c.sweep_lt(p, self.arena.point(pv)) {
                break;
            }
            prev = self.arena.vertices[pv].links.prev;
        }
        let mut next = match prev {
            Some(pv) => self.arena.vertices[pv].links.next,
            None => mesh.head,
        };
        while let Some(nv) = next {
            if !c.sweep_lt(self.arena.point(nv), p) {
                break;
            }
            prev = Some(nv);
            next = self.arena.vertices[nv].links.next;
        }
        if let Some(pv) = prev.filter(|&pv| self.arena.point(pv) == p) {
            return pv;
        }
        if let Some(nv) = next.filter(|&nv| self.arena.point(nv) == p) {
            return nv;
        }
        let v = self.arena.add_vertex(p, alpha);
        self.arena.vertex_list_insert(mesh, v, prev, next);
        v
    }

    /// Merge `src` into `dst`, moving all of its edges.
    fn merge_vertices(&mut self, src: VertexId, dst: VertexId, mesh: &mut VertexList) {
        trace!(
            "found coincident verts at {:?}; merging {src:?} into {dst:?}",
            self.arena.point(src)
        );
        let src_alpha = self.arena.vertices[src].alpha;
        let dst_vertex = &mut self.arena.vertices[dst];
        dst_vertex.alpha = dst_vertex.alpha.max(src_alpha);
        if let Some(partner) = self.arena.vertices[src].partner {
            self.arena.vertices[partner].partner = Some(dst);
        }
        // Failures can only come from an active edge list, and there is none here.
        while let Some(e) = self.arena.vertices[src].above.head {
            let _ = self.set_bottom(e, dst, None);
        }
        while let Some(e) = self.arena.vertices[src].below.head {
            let _ = self.set_top(e, dst, None);
        }
        self.arena.vertex_list_remove(mesh, src);
        self.arena.vertices[dst].synthetic = true;
    }

    /// Merge vertices of a sorted mesh that share a position.
    ///
    /// A vertex that sorts before its predecessor (possible after rounding) is snapped onto it.
    /// Returns whether anything was merged.
    pub(crate) fn merge_coincident_vertices(&mut self, mesh: &mut VertexList) -> bool {
        let Some(head) = mesh.head else {
            return false;
        };
        let mut merged = false;
        let mut cursor = self.arena.vertices[head].links.next;
        while let Some(v) = cursor {
            let next = self.arena.vertices[v].links.next;
            let Some(prev) = self.arena.vertices[v].links.prev else {
                cursor = next;
                continue;
            };
            let prev_point = self.arena.point(prev);
            if self.c.sweep_lt(self.arena.point(v), prev_point) {
                self.arena.vertices[v].point = prev_point;
            }
            if self.arena.point(v) == prev_point {
                self.merge_vertices(v, prev, mesh);
                merged = true;
            }
            cursor = next;
        }
        merged
    }
}

#[cfg(test)]
mod tests {
    use crate::config::{Mode, Options};
    use crate::geom::Point;
    use crate::mesh::VertexList;
    use crate::path::FillRule;
    use crate::triangulator::Triangulator;

    fn triangulator(mode: Mode) -> Triangulator {
        Triangulator::new(&Options::new(mode), FillRule::NonZero)
    }

    fn contour(t: &mut Triangulator, points: &[(f32, f32)]) -> VertexList {
        let mut list = VertexList::EMPTY;
        for &(x, y) in points {
            let v = t.arena.add_vertex(Point::new(x, y), 255);
            t.arena.vertex_list_append(&mut list, v);
        }
        list
    }

    fn points(t: &Triangulator, list: &VertexList) -> Vec<(f32, f32)> {
        t.arena
            .collect_vertices(list)
            .into_iter()
            .map(|v| (t.arena.point(v).x, t.arena.point(v).y))
            .collect()
    }

    #[test]
    fn sanitize_removes_coincident_and_collinear() {
        let mut t = triangulator(Mode::Fill {
            emit_winding: false,
        });
        let mut contours = [contour(
            &mut t,
            &[(0., 0.), (0., 0.), (5., 0.), (10., 0.), (10., 10.), (f32::NAN, 1.)],
        )];
        t.sanitize_contours(&mut contours);
        assert_eq!(points(&t, &contours[0]), vec![(0., 0.), (10., 0.), (10., 10.)]);
    }

    #[test]
    fn strict_fan_keeps_collinear_vertices() {
        let mut t = triangulator(Mode::SimpleFan {
            collect_breadcrumbs: false,
        });
        let mut contours = [contour(&mut t, &[(0., 0.), (5., 0.), (10., 0.), (10., 10.)])];
        t.sanitize_contours(&mut contours);
        assert_eq!(points(&t, &contours[0]).len(), 4);
    }

    #[test]
    fn antialiasing_rounds_to_quarter_pixels() {
        let mut t = triangulator(Mode::Antialiased);
        let mut contours = [contour(&mut t, &[(0.1, 0.1), (10.3, 0.2), (5.0, 9.9)])];
        t.sanitize_contours(&mut contours);
        assert_eq!(
            points(&t, &contours[0]),
            vec![(0.0, 0.0), (10.25, 0.25), (5.0, 10.0)]
        );
    }

    #[test]
    fn sorted_mesh_follows_sweep() {
        let mut t = triangulator(Mode::default());
        let mut contours = [contour(&mut t, &[(0., 10.), (5., 0.), (10., 10.)])];
        let mut mesh = t.contours_to_mesh(&mut contours);
        t.sort_mesh(&mut mesh);
        assert_eq!(points(&t, &mesh), vec![(5., 0.), (0., 10.), (10., 10.)]);
        let top = mesh.head.unwrap();
        // Both edges start at the apex, ordered left to right.
        let below = t.arena.vertices[top].below;
        let left = below.head.unwrap();
        let right = below.tail.unwrap();
        assert_ne!(left, right);
        assert_eq!(t.arena.point(t.arena.edges[left].bottom), Point::new(0., 10.));
        assert_eq!(t.arena.point(t.arena.edges[right].bottom), Point::new(10., 10.));
    }

    #[test]
    fn coincident_vertices_merge() {
        let mut t = triangulator(Mode::default());
        let mut contours = [
            contour(&mut t, &[(0., 0.), (10., 0.), (0., 10.)]),
            contour(&mut t, &[(0., 0.), (-10., 5.), (0., 10.)]),
        ];
        let mut mesh = t.contours_to_mesh(&mut contours);
        t.sort_mesh(&mut mesh);
        assert!(t.merge_coincident_vertices(&mut mesh));
        assert_eq!(
            points(&t, &mesh),
            vec![(0., 0.), (10., 0.), (-10., 5.), (0., 10.)]
        );
        assert!(!t.merge_coincident_vertices(&mut mesh));
    }
}
