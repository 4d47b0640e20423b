// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Resolving self-intersections with a sweep over the sorted mesh.
//!
//! Edges are kept in an active edge list ordered left to right. Whenever two neighbouring edges
//! cross, both are split at a (possibly new) vertex at the crossing. Splitting and merging can
//! invalidate ordering decisions already made above the current vertex, in which case the sweep
//! rewinds to the highest affected vertex and continues from there.

use crate::arena::MAX_ITEMS;
use crate::geom::{double_to_clamped_f32, Line, Point};
use crate::mesh::{Arena, EdgeId, EdgeList, EdgeType, VertexId, VertexList};
use crate::triangulator::{BreadcrumbTriangle, Triangulator};
use crate::Error;
use log::trace;

/// The state of a sweep in progress.
#[derive(Debug)]
pub(crate) struct Sweep {
    pub active: EdgeList,
    pub current: VertexId,
}

/// The outcome of simplifying a mesh.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum SimplifyResult {
    /// No edges crossed.
    AlreadySimple,
    /// Crossings were found and resolved.
    FoundSelfIntersection,
    /// A crossing was found while self-intersections are disallowed.
    Abort,
}

/// The geometry of a segment for intersection tests.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Segment {
    pub top: VertexId,
    pub bottom: VertexId,
    pub line: Line,
    pub kind: EdgeType,
}

impl Segment {
    pub(crate) fn of_edge(arena: &Arena, e: EdgeId) -> Self {
        let edge = &arena.edges[e];
        Self {
            top: edge.top,
            bottom: edge.bottom,
            line: edge.line,
            kind: edge.kind,
        }
    }

    /// A segment between two vertices that need not be in sweep order.
    pub(crate) fn between(arena: &Arena, top: VertexId, bottom: VertexId, kind: EdgeType) -> Self {
        Self {
            top,
            bottom,
            line: Line::from_points(arena.point(top), arena.point(bottom)),
            kind,
        }
    }
}

// Coordinates whose magnitudes differ by more than 2^20 make the implicit line too imprecise to
// trust an intersection found with it.
fn needs_subdivision(p0: Point, p1: Point) -> bool {
    fn exponent(v: f32) -> i32 {
        if v.abs() < 1.0 {
            0
        } else {
            ((v.to_bits() >> 23) & 0xff) as i32 - 127
        }
    }
    (exponent(p0.x) - exponent(p1.x)).abs() > 20 || (exponent(p0.y) - exponent(p1.y)).abs() > 20
}

/// Intersect segments `u0..u1` and `v0..v1`, returning the point and both parameters.
///
/// Segments with widely varying coordinate magnitudes are bisected until the test is
/// trustworthy, which rejects false positives.
fn segment_intersect(
    mut u: Line,
    mut u0: Point,
    mut u1: Point,
    mut v: Line,
    mut v0: Point,
    mut v1: Point,
) -> Option<(Point, f64, f64)> {
    // Maps the parameters of the current sub-segments back onto the full segments.
    let (mut s_scale, mut s_shift) = (1.0, 0.0);
    let (mut t_scale, mut t_shift) = (1.0, 0.0);
    for _ in 0..512 {
        // Compare bounding boxes by hand, as axis-aligned segments have empty boxes.
        if u0.x.min(u1.x) > v0.x.max(v1.x)
            || u0.x.max(u1.x) < v0.x.min(v1.x)
            || u0.y.min(u1.y) > v0.y.max(v1.y)
            || u0.y.max(u1.y) < v0.y.min(v1.y)
        {
            return None;
        }
        let denom = u.a * v.b - u.b * v.a;
        if denom == 0.0 {
            return None;
        }
        let dx = v0.x as f64 - u0.x as f64;
        let dy = v0.y as f64 - u0.y as f64;
        let s_numer = dy * v.b + dx * v.a;
        let t_numer = dy * u.b + dx * u.a;
        let outside = if denom > 0.0 {
            s_numer < 0.0 || s_numer > denom || t_numer < 0.0 || t_numer > denom
        } else {
            s_numer > 0.0 || s_numer < denom || t_numer > 0.0 || t_numer < denom
        };
        if outside {
            return None;
        }
        let s = s_numer / denom;
        let t = t_numer / denom;

        let u_split = needs_subdivision(u0, u1);
        let v_split = needs_subdivision(v0, v1);
        if !u_split && !v_split {
            let p = Point::new(
                double_to_clamped_f32(u0.x as f64 - s * u.b),
                double_to_clamped_f32(u0.y as f64 + s * u.a),
            );
            return Some((p, s_scale * s + s_shift, t_scale * t + t_shift));
        }
        if u_split {
            let mid = Point::new(
                (0.5 * u0.x as f64 + 0.5 * u1.x as f64) as f32,
                (0.5 * u0.y as f64 + 0.5 * u1.y as f64) as f32,
            );
            if s >= 0.5 {
                u0 = mid;
                s_shift += s_scale * 0.5;
            } else {
                u1 = mid;
            }
            s_scale *= 0.5;
        }
        if v_split {
            let mid = Point::new(
                (0.5 * v0.x as f64 + 0.5 * v1.x as f64) as f32,
                (0.5 * v0.y as f64 + 0.5 * v1.y as f64) as f32,
            );
            if t >= 0.5 {
                v0 = mid;
                t_shift += t_scale * 0.5;
            } else {
                v1 = mid;
            }
            t_scale *= 0.5;
        }
        u = Line::from_points(u0, u1);
        v = Line::from_points(v0, v1);
    }
    None
}

/// Intersect two segments, returning the crossing and the coverage alpha it should carry.
///
/// Segments sharing an endpoint never intersect.
pub(crate) fn intersect(arena: &Arena, a: &Segment, b: &Segment) -> Option<(Point, u8)> {
    if a.top == b.top || a.bottom == b.bottom || a.top == b.bottom || a.bottom == b.top {
        return None;
    }
    let (p, s, t) = segment_intersect(
        a.line,
        arena.point(a.top),
        arena.point(a.bottom),
        b.line,
        arena.point(b.top),
        arena.point(b.bottom),
    )?;
    let alpha = match (a.kind, b.kind) {
        // Anything touching the interior stays opaque, or the fill would leak transparency.
        (EdgeType::Inner, _) | (_, EdgeType::Inner) => 255,
        (EdgeType::Outer, EdgeType::Outer) => 0,
        _ => {
            let lerp = |seg: &Segment, t: f64| {
                (1.0 - t) * arena.vertices[seg.top].alpha as f64
                    + t * arena.vertices[seg.bottom].alpha as f64
            };
            lerp(a, s).max(lerp(b, t)) as u8
        }
    };
    Some((p, alpha))
}

impl Triangulator {
    /// Find the active edges immediately left and right of `v`.
    pub(crate) fn find_enclosing_edges(
        &self,
        v: VertexId,
        active: &EdgeList,
    ) -> (Option<EdgeId>, Option<EdgeId>) {
        let a = &self.arena;
        let vertex = &a.vertices[v];
        if let (Some(first), Some(last)) = (vertex.above.head, vertex.above.tail) {
            return (a.edges[first].active.prev, a.edges[last].active.next);
        }
        let mut next = None;
        let mut prev = active.tail;
        while let Some(p) = prev {
            if a.is_left_of(p, v) {
                break;
            }
            next = Some(p);
            prev = a.edges[p].active.prev;
        }
        (prev, next)
    }

    /// Step the sweep back to `dst`, restoring the active edge list as it was there.
    ///
    /// If a vertex passed on the way back was placed inconsistently with its enclosing edges,
    /// the rewind continues up to that vertex.
    pub(crate) fn rewind(&mut self, sweep: Option<&mut Sweep>, dst: VertexId) -> Result<(), Error> {
        let Some(sweep) = sweep else {
            return Ok(());
        };
        let c = self.c;
        let a = &mut self.arena;
        let current = sweep.current;
        if current == dst || c.sweep_lt(a.point(current), a.point(dst)) {
            return Ok(());
        }
        trace!("rewinding active edges from vertex {current:?} to vertex {dst:?}");
        let mut dst = dst;
        let mut v = current;
        while v != dst {
            v = a.vertices[v]
                .links
                .prev
                .ok_or(Error::InconsistentActiveEdges)?;
            let mut cursor = a.vertices[v].below.head;
            while let Some(e) = cursor {
                if !a.edge_list_remove(&mut sweep.active, e) {
                    return Err(Error::InconsistentActiveEdges);
                }
                cursor = a.edges[e].below.next;
            }
            let mut left = a.vertices[v].left_enclosing;
            let mut cursor = a.vertices[v].above.head;
            while let Some(e) = cursor {
                if !a.edge_list_insert(&mut sweep.active, e, left) {
                    return Err(Error::InconsistentActiveEdges);
                }
                left = Some(e);
                let top = a.edges[e].top;
                if c.sweep_lt(a.point(top), a.point(dst)) {
                    let vertex = &a.vertices[top];
                    let misplaced_left = vertex
                        .left_enclosing
                        .is_some_and(|l| !a.is_left_of(l, top));
                    let misplaced_right = vertex
                        .right_enclosing
                        .is_some_and(|r| !a.is_right_of(r, top));
                    if misplaced_left || misplaced_right {
                        dst = top;
                    }
                }
                cursor = a.edges[e].above.next;
            }
        }
        sweep.current = v;
        Ok(())
    }

    /// Rewind if `e` no longer sits consistently between its active neighbours.
    fn rewind_if_necessary(
        &mut self,
        e: EdgeId,
        mut sweep: Option<&mut Sweep>,
    ) -> Result<(), Error> {
        if sweep.is_none() {
            return Ok(());
        }
        if let Some(dst) = self.misplaced_against_left(e) {
            self.rewind(sweep.as_deref_mut(), dst)?;
        }
        if let Some(dst) = self.misplaced_against_right(e) {
            self.rewind(sweep, dst)?;
        }
        Ok(())
    }

    fn misplaced_against_left(&self, e: EdgeId) -> Option<VertexId> {
        let a = &self.arena;
        let lt = |p: VertexId, q: VertexId| self.c.sweep_lt(a.point(p), a.point(q));
        let edge = &a.edges[e];
        let left = edge.active.prev.filter(|&l| !a.edges[l].removed)?;
        let (top, bottom) = (edge.top, edge.bottom);
        let (left_top, left_bottom) = (a.edges[left].top, a.edges[left].bottom);
        if lt(left_top, top) && !a.is_left_of(left, top) {
            Some(left_top)
        } else if lt(top, left_top) && !a.is_right_of(e, left_top) {
            Some(top)
        } else if lt(bottom, left_bottom) && !a.is_left_of(left, bottom) {
            Some(left_top)
        } else if lt(left_bottom, bottom) && !a.is_right_of(e, left_bottom) {
            Some(top)
        } else {
            None
        }
    }

    fn misplaced_against_right(&self, e: EdgeId) -> Option<VertexId> {
        let a = &self.arena;
        let lt = |p: VertexId, q: VertexId| self.c.sweep_lt(a.point(p), a.point(q));
        let edge = &a.edges[e];
        let right = edge.active.next.filter(|&r| !a.edges[r].removed)?;
        let (top, bottom) = (edge.top, edge.bottom);
        let (right_top, right_bottom) = (a.edges[right].top, a.edges[right].bottom);
        if lt(right_top, top) && !a.is_right_of(right, top) {
            Some(right_top)
        } else if lt(top, right_top) && !a.is_left_of(e, right_top) {
            Some(top)
        } else if lt(bottom, right_bottom) && !a.is_right_of(right, bottom) {
            Some(right_top)
        } else if lt(right_bottom, bottom) && !a.is_left_of(e, right_bottom) {
            Some(top)
        } else {
            None
        }
    }

    /// Remember the area swept when an endpoint of `e` moves to `v`.
    fn record_breadcrumb(&mut self, e: EdgeId, v: VertexId) {
        let edge = &self.arena.edges[e];
        let points = [
            self.arena.point(edge.top),
            self.arena.point(edge.bottom),
            self.arena.point(v),
        ];
        let winding = edge.winding;
        if points[2] == points[0] || points[2] == points[1] {
            return;
        }
        if let Some(breadcrumbs) = self.breadcrumbs_mut() {
            breadcrumbs.push(BreadcrumbTriangle { points, winding });
        }
    }

    /// Move the top of `e` to `v`.
    pub(crate) fn set_top(
        &mut self,
        e: EdgeId,
        v: VertexId,
        mut sweep: Option<&mut Sweep>,
    ) -> Result<(), Error> {
        self.arena.remove_below(e);
        self.record_breadcrumb(e, v);
        self.arena.edges[e].top = v;
        self.arena.recompute_line(e);
        self.arena.insert_below(e, v, &self.c);
        self.rewind_if_necessary(e, sweep.as_deref_mut())?;
        self.merge_collinear_edges(e, sweep)
    }

    /// Move the bottom of `e` to `v`.
    pub(crate) fn set_bottom(
        &mut self,
        e: EdgeId,
        v: VertexId,
        mut sweep: Option<&mut Sweep>,
    ) -> Result<(), Error> {
        self.arena.remove_above(e);
        self.record_breadcrumb(e, v);
        self.arena.edges[e].bottom = v;
        self.arena.recompute_line(e);
        self.arena.insert_above(e, v, &self.c);
        self.rewind_if_necessary(e, sweep.as_deref_mut())?;
        self.merge_collinear_edges(e, sweep)
    }

    fn remove_edge(&mut self, e: EdgeId) {
        self.arena.disconnect(e);
        self.arena.edges[e].removed = true;
    }

    /// Merge two collinear edges sharing a bottom vertex.
    fn merge_edges_above(
        &mut self,
        edge: EdgeId,
        other: EdgeId,
        mut sweep: Option<&mut Sweep>,
    ) -> Result<(), Error> {
        let edge_top = self.arena.edges[edge].top;
        let other_top = self.arena.edges[other].top;
        let (edge_point, other_point) = (self.arena.point(edge_top), self.arena.point(other_top));
        if edge_point == other_point {
            trace!("merging coincident above edges {edge:?} into {other:?}");
            self.rewind(sweep.as_deref_mut(), edge_top)?;
            self.arena.edges[other].winding += self.arena.edges[edge].winding;
            self.remove_edge(edge);
        } else if self.c.sweep_lt(edge_point, other_point) {
            self.rewind(sweep.as_deref_mut(), edge_top)?;
            self.arena.edges[other].winding += self.arena.edges[edge].winding;
            self.set_bottom(edge, other_top, sweep)?;
        } else {
            self.rewind(sweep.as_deref_mut(), other_top)?;
            self.arena.edges[edge].winding += self.arena.edges[other].winding;
            self.set_bottom(other, edge_top, sweep)?;
        }
        Ok(())
    }

    /// Merge two collinear edges sharing a top vertex.
    fn merge_edges_below(
        &mut self,
        edge: EdgeId,
        other: EdgeId,
        mut sweep: Option<&mut Sweep>,
    ) -> Result<(), Error> {
        let (edge_top, edge_bottom) = (self.arena.edges[edge].top, self.arena.edges[edge].bottom);
        let (other_top, other_bottom) =
            (self.arena.edges[other].top, self.arena.edges[other].bottom);
        let (edge_point, other_point) =
            (self.arena.point(edge_bottom), self.arena.point(other_bottom));
        if edge_point == other_point {
            trace!("merging coincident below edges {edge:?} into {other:?}");
            self.rewind(sweep.as_deref_mut(), edge_top)?;
            self.arena.edges[other].winding += self.arena.edges[edge].winding;
            self.remove_edge(edge);
        } else if self.c.sweep_lt(edge_point, other_point) {
            self.rewind(sweep.as_deref_mut(), other_top)?;
            self.arena.edges[edge].winding += self.arena.edges[other].winding;
            self.set_top(other, edge_bottom, sweep)?;
        } else {
            self.rewind(sweep.as_deref_mut(), edge_top)?;
            self.arena.edges[other].winding += self.arena.edges[edge].winding;
            self.set_top(edge, other_bottom, sweep)?;
        }
        Ok(())
    }

    fn top_collinear(&self, left: EdgeId, right: EdgeId) -> bool {
        let a = &self.arena;
        let (left_top, right_top) = (a.edges[left].top, a.edges[right].top);
        a.point(left_top) == a.point(right_top)
            || !a.is_left_of(left, right_top)
            || !a.is_right_of(right, left_top)
    }

    fn bottom_collinear(&self, left: EdgeId, right: EdgeId) -> bool {
        let a = &self.arena;
        let (left_bottom, right_bottom) = (a.edges[left].bottom, a.edges[right].bottom);
        a.point(left_bottom) == a.point(right_bottom)
            || !a.is_left_of(left, right_bottom)
            || !a.is_right_of(right, left_bottom)
    }

    /// Merge `e` with neighbours that share an endpoint and run along the same line.
    pub(crate) fn merge_collinear_edges(
        &mut self,
        e: EdgeId,
        mut sweep: Option<&mut Sweep>,
    ) -> Result<(), Error> {
        loop {
            let edge = &self.arena.edges[e];
            if edge.removed {
                return Ok(());
            }
            let (above, below) = (edge.above, edge.below);
            if let Some(prev) = above.prev.filter(|&p| self.top_collinear(p, e)) {
                self.merge_edges_above(prev, e, sweep.as_deref_mut())?;
            } else if let Some(next) = above.next.filter(|&n| self.top_collinear(e, n)) {
                self.merge_edges_above(next, e, sweep.as_deref_mut())?;
            } else if let Some(prev) = below.prev.filter(|&p| self.bottom_collinear(p, e)) {
                self.merge_edges_below(prev, e, sweep.as_deref_mut())?;
            } else if let Some(next) = below.next.filter(|&n| self.bottom_collinear(e, n)) {
                self.merge_edges_below(next, e, sweep.as_deref_mut())?;
            } else {
                return Ok(());
            }
        }
    }

    /// Split `e` at `v`. Returns whether a split happened.
    ///
    /// `v` normally lies between the endpoints, but clamping and rounding can put it beyond
    /// either end; the new edge's winding is flipped in that case so the total is unchanged.
    pub(crate) fn split_edge(
        &mut self,
        e: EdgeId,
        v: VertexId,
        mut sweep: Option<&mut Sweep>,
    ) -> Result<bool, Error> {
        let edge = &self.arena.edges[e];
        let (top, bottom, kind) = (edge.top, edge.bottom, edge.kind);
        if edge.removed || v == top || v == bottom {
            return Ok(false);
        }
        trace!("splitting edge {e:?} at vertex {v:?}");
        let mut winding = edge.winding;
        let vp = self.arena.point(v);
        let (new_top, new_bottom) = if self.c.sweep_lt(vp, self.arena.point(top)) {
            winding = -winding;
            self.set_top(e, v, sweep.as_deref_mut())?;
            (v, top)
        } else if self.c.sweep_lt(self.arena.point(bottom), vp) {
            winding = -winding;
            self.set_bottom(e, v, sweep.as_deref_mut())?;
            (bottom, v)
        } else {
            self.set_bottom(e, v, sweep.as_deref_mut())?;
            (v, bottom)
        };
        let new_edge = self.arena.add_edge(new_top, new_bottom, winding, kind);
        self.arena.insert_below(new_edge, new_top, &self.c);
        self.arena.insert_above(new_edge, new_bottom, &self.c);
        self.merge_collinear_edges(new_edge, sweep)?;
        Ok(true)
    }

    /// Correct the topology when the side tests say two edges cross but the exact test
    /// found nothing.
    fn intersect_edge_pair(
        &mut self,
        left: EdgeId,
        right: EdgeId,
        mut sweep: Option<&mut Sweep>,
    ) -> Result<bool, Error> {
        let a = &self.arena;
        let (l, r) = (&a.edges[left], &a.edges[right]);
        if l.removed || r.removed || l.top == r.top || l.bottom == r.bottom {
            return Ok(false);
        }
        let lt = |p: VertexId, q: VertexId| self.c.sweep_lt(a.point(p), a.point(q));
        let mut split = None;
        if lt(l.top, r.top) {
            if !a.is_left_of(left, r.top) {
                split = Some((left, r.top));
            }
        } else if !a.is_right_of(right, l.top) {
            split = Some((right, l.top));
        }
        if lt(r.bottom, l.bottom) {
            if !a.is_left_of(left, r.bottom) {
                split = Some((left, r.bottom));
            }
        } else if !a.is_right_of(right, l.bottom) {
            split = Some((right, l.bottom));
        }
        let Some((edge, at)) = split else {
            return Ok(false);
        };
        // The split moves this edge, so everything below its top must be revisited.
        let top = self.arena.edges[edge].top;
        self.rewind(sweep.as_deref_mut(), top)?;
        self.split_edge(edge, at, sweep)
    }

    /// Give `v` a partner offset from both edge lines, for antialiased meshes.
    pub(crate) fn compute_bisector(&mut self, e1: EdgeId, e2: EdgeId, v: VertexId) {
        let (edge1, edge2) = (&self.arena.edges[e1], &self.arena.edges[e2]);
        let (mut line1, mut line2) = (edge1.line, edge2.line);
        line1.normalize();
        line2.normalize();
        let cos_angle = line1.a * line2.a + line1.b * line2.b;
        if cos_angle > self.config.bisector_parallel_cos {
            return;
        }
        // The rings are one radius to either side of the path, so partners sit twice that apart.
        let offset = 2.0 * self.config.offset_radius;
        line1.c += if edge1.winding > 0 { -offset } else { offset };
        line2.c += if edge2.winding > 0 { -offset } else { offset };
        if let Some(p) = line1.intersect(&line2) {
            let alpha = if edge1.kind == EdgeType::Outer { 255 } else { 0 };
            let partner = self.arena.add_vertex(p, alpha);
            self.arena.vertices[v].partner = Some(partner);
            trace!("computed bisector ({}, {}) alpha {alpha} for vertex {v:?}", p.x, p.y);
        }
    }

    /// Split `left` and `right` where they cross. Returns whether the mesh changed.
    pub(crate) fn check_for_intersection(
        &mut self,
        left: Option<EdgeId>,
        right: Option<EdgeId>,
        sweep: &mut Sweep,
        mesh: &mut VertexList,
    ) -> Result<bool, Error> {
        let (Some(left), Some(right)) = (left, right) else {
            return Ok(false);
        };
        if self.arena.edges[left].removed || self.arena.edges[right].removed {
            return Err(Error::InconsistentActiveEdges);
        }
        let l = Segment::of_edge(&self.arena, left);
        let r = Segment::of_edge(&self.arena, right);
        let Some((mut p, alpha)) =
            intersect(&self.arena, &l, &r).filter(|(p, _)| p.is_finite())
        else {
            return self.intersect_edge_pair(left, right, Some(sweep));
        };
        trace!("found intersection, pt is {}, {}", p.x, p.y);
        // Find the last vertex at or above the intersection.
        let mut top = Some(sweep.current);
        while let Some(t) = top {
            if !self.c.sweep_lt(p, self.arena.point(t)) {
                break;
            }
            top = self.arena.vertices[t].links.prev;
        }
        // Rounding can push the crossing beyond either segment; pull it back onto both.
        let a = &self.arena;
        self.c.clamp(&mut p, a.point(l.top), a.point(l.bottom));
        self.c.clamp(&mut p, a.point(r.top), a.point(r.bottom));
        let existing = [l.top, l.bottom, r.top, r.bottom]
            .into_iter()
            .find(|&v| a.point(v) == p);
        let v = match existing {
            Some(v) => v,
            None => {
                let v = self.make_sorted_vertex(p, alpha, mesh, top);
                if self.arena.vertices[l.top].partner.is_some() {
                    self.arena.vertices[v].synthetic = true;
                    self.compute_bisector(left, right, v);
                }
                v
            }
        };
        // A crossing at an endpoint of both edges leaves nothing to split.
        let splits = |s: &Segment| v != s.top && v != s.bottom;
        if !splits(&l) && !splits(&r) {
            return Ok(false);
        }
        self.rewind(Some(&mut *sweep), top.unwrap_or(v))?;
        let split_left = self.split_edge(left, v, Some(&mut *sweep))?;
        let split_right = self.split_edge(right, v, Some(&mut *sweep))?;
        let vertex = &mut self.arena.vertices[v];
        vertex.alpha = vertex.alpha.max(alpha);
        Ok(split_left | split_right)
    }

    /// Sweep the sorted mesh, splitting every pair of crossing edges.
    pub(crate) fn simplify(&mut self, mesh: &mut VertexList) -> Result<SimplifyResult, Error> {
        trace!("simplifying complex polygons");
        let Some(head) = mesh.head else {
            return Ok(SimplifyResult::AlreadySimple);
        };
        let initial = self.arena.edges.len();
        let limit = initial
            .saturating_mul(self.config.max_edge_growth)
            .min(MAX_ITEMS);
        let mut sweep = Sweep {
            active: EdgeList::EMPTY,
            current: head,
        };
        let mut result = SimplifyResult::AlreadySimple;
        let mut cursor = Some(head);
        while let Some(start) = cursor {
            sweep.current = start;
            if !self.arena.vertices[start].is_connected() {
                cursor = self.arena.vertices[start].links.next;
                continue;
            }
            if self.arena.edges.len() > limit {
                return Err(Error::EdgeExplosion { initial, limit });
            }
            loop {
                let v = sweep.current;
                trace!("vertex {v:?}: {:?}", self.arena.point(v));
                let (left, right) = self.find_enclosing_edges(v, &sweep.active);
                self.arena.vertices[v].left_enclosing = left;
                self.arena.vertices[v].right_enclosing = right;
                let found = if let Some(first) = self.arena.vertices[v].below.head {
                    let mut found = false;
                    let mut below = Some(first);
                    while let Some(e) = below {
                        if self.check_for_intersection(left, Some(e), &mut sweep, mesh)?
                            || self.check_for_intersection(Some(e), right, &mut sweep, mesh)?
                        {
                            found = true;
                            break;
                        }
                        below = self.arena.edges[e].below.next;
                    }
                    found
                } else {
                    self.check_for_intersection(left, right, &mut sweep, mesh)?
                };
                if !found {
                    break;
                }
                if self.disallows_self_intersection() {
                    return Ok(SimplifyResult::Abort);
                }
                result = SimplifyResult::FoundSelfIntersection;
            }
            let v = sweep.current;
            let mut above = self.arena.vertices[v].above.head;
            while let Some(e) = above {
                if !self.arena.edge_list_remove(&mut sweep.active, e) {
                    return Err(Error::InconsistentActiveEdges);
                }
                above = self.arena.edges[e].above.next;
            }
            let mut left = self.arena.vertices[v].left_enclosing;
            let mut below = self.arena.vertices[v].below.head;
            while let Some(e) = below {
                self.arena.edge_list_insert(&mut sweep.active, e, left);
                left = Some(e);
                below = self.arena.edges[e].below.next;
            }
            cursor = self.arena.vertices[v].links.next;
        }
        Ok(result)
    }
}
