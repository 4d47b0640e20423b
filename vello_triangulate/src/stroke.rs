// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Offsetting boundary loops into the inner (opaque) and outer (transparent) antialiasing rings.

use log::trace;

use crate::geom::{Comparator, Line, Point};
use crate::mesh::{Arena, EdgeId, EdgeList, EdgeType, VertexId, VertexList};
use crate::triangulator::Triangulator;

/// The ring vertices produced at one boundary vertex.
enum Corner {
    /// One inner and one outer point.
    Join(Point, Point),
    /// A sharp corner, split into two points on the mitered ring.
    Miter { inner: [Point; 2], outer: [Point; 2] },
    /// The edges are parallel, so the neighbouring corners suffice.
    Parallel,
    /// The miter could not be computed; the corner is dropped.
    Degenerate,
}

/// Whether the ring step from `prev` to `next` runs against the boundary edge it offsets.
fn inversion(
    arena: &Arena,
    c: &Comparator,
    prev: Option<VertexId>,
    next: Option<VertexId>,
    edge: EdgeId,
) -> bool {
    let (Some(prev), Some(next)) = (prev, next) else {
        return true;
    };
    let winding = if c.sweep_lt(arena.point(prev), arena.point(next)) {
        1
    } else {
        -1
    };
    winding != arena.edges[edge].winding
}

fn direction(line: &Line) -> Point {
    Point::new(line.a as f32, line.b as f32)
}

/// One side of a ring at a boundary vertex.
struct Side {
    prev: Line,
    next: Line,
}

impl Triangulator {
    fn corner(
        &self,
        prev_edge: EdgeId,
        e: EdgeId,
        prev_normal: Point,
        normal: Point,
        inner: &Side,
        outer: &Side,
    ) -> Corner {
        let a = &self.arena;
        let (prev_line, line) = (a.edges[prev_edge].line, a.edges[e].line);
        if prev_line.near_parallel(&line, self.config.near_parallel_epsilon) {
            return Corner::Parallel;
        }
        let (Some(inner_point), Some(outer_point)) = (
            inner.prev.intersect(&inner.next),
            outer.prev.intersect(&outer.next),
        ) else {
            return Corner::Parallel;
        };
        if (normal.dot(prev_normal) as f64) >= -self.config.miter_cos {
            return Corner::Join(inner_point, outer_point);
        }

        let edge = &a.edges[e];
        let (v, next_v) = if edge.winding > 0 {
            (edge.top, edge.bottom)
        } else {
            (edge.bottom, edge.top)
        };
        let prev_e = &a.edges[prev_edge];
        let prev_v = if prev_e.winding > 0 {
            prev_e.top
        } else {
            prev_e.bottom
        };
        let bisector = Line::from_points(inner_point, outer_point);
        let p = a.point(v);
        let mut tangent = Line::from_points(p, p + direction(&bisector));
        if tangent.a == 0.0 && tangent.b == 0.0 {
            return Corner::Degenerate;
        }
        tangent.normalize();
        let radius = self.config.offset_radius;
        let mut inner_tangent = tangent;
        inner_tangent.c -= radius;
        let mut outer_tangent = tangent;
        outer_tangent.c += radius;

        // Miter the side on the inside of the turn; the other side meets at the bisector,
        // limited to the tangents at the neighbouring boundary vertices.
        let (turns_left, mitered, mitered_tangent, pinned) = if prev_normal.cross(normal) > 0.0 {
            (true, inner, inner_tangent, outer)
        } else {
            (false, outer, outer_tangent, inner)
        };
        let (Some(p1), Some(p2)) = (
            mitered_tangent.intersect(&mitered.prev),
            mitered_tangent.intersect(&mitered.next),
        ) else {
            return Corner::Degenerate;
        };
        let pinned_point = if turns_left {
            outer_tangent.intersect(&bisector)
        } else {
            Some(inner_point)
        };
        let Some(mut pinned_point) = pinned_point else {
            return Corner::Degenerate;
        };
        let prev_p = a.point(prev_v);
        let next_p = a.point(next_v);
        let prev_tangent = Line::from_points(prev_p, prev_p + direction(&pinned.prev));
        let next_tangent = Line::from_points(next_p, next_p + direction(&pinned.next));
        if prev_tangent.dist(pinned_point) > 0.0 {
            if let Some(q) = bisector.intersect(&prev_tangent) {
                pinned_point = q;
            }
        }
        if next_tangent.dist(pinned_point) < 0.0 {
            if let Some(q) = bisector.intersect(&next_tangent) {
                pinned_point = q;
            }
        }
        let (inner, outer) = if turns_left {
            ([p1, p2], [pinned_point; 2])
        } else {
            ([pinned_point; 2], [p1, p2])
        };
        if inner.iter().chain(outer.iter()).any(|p| !p.is_finite()) {
            return Corner::Degenerate;
        }
        Corner::Miter { inner, outer }
    }

    /// Offset a boundary loop to either side, appending the rings to `inner_mesh` and
    /// `outer_mesh`.
    ///
    /// Inner vertices are opaque, outer ones transparent, and each is the other's partner. Ring
    /// edges carry winding -2 (inner) and 1 (outer), negated for a ring that turned inside out.
    pub(crate) fn stroke_boundary(
        &mut self,
        boundary: &EdgeList,
        inner_mesh: &mut VertexList,
        outer_mesh: &mut VertexList,
    ) {
        let Some(head) = boundary.head else {
            return;
        };
        let degenerate = self.arena.edges[head]
            .active
            .next
            .and_then(|second| self.arena.edges[second].active.next)
            .is_none();
        if degenerate {
            return;
        }
        let Some(mut prev_edge) = boundary.tail else {
            return;
        };
        let radius = self.config.offset_radius;
        let offset = |line: Line, by: f64| Line { c: line.c + by, ..line };
        let mut prev_normal = self.edge_normal(prev_edge);
        let mut prev_inner = offset(self.arena.edges[prev_edge].line, -radius);
        let mut prev_outer = offset(self.arena.edges[prev_edge].line, radius);
        let mut inner_ring = VertexList::EMPTY;
        let mut outer_ring = VertexList::EMPTY;
        let mut inner_inversion = true;
        let mut outer_inversion = true;

        let mut cursor = Some(head);
        while let Some(e) = cursor {
            cursor = self.arena.edges[e].active.next;
            let normal = self.edge_normal(e);
            let inner = offset(self.arena.edges[e].line, -radius);
            let outer = offset(self.arena.edges[e].line, radius);
            let corner = self.corner(
                prev_edge,
                e,
                prev_normal,
                normal,
                &Side {
                    prev: prev_inner,
                    next: inner,
                },
                &Side {
                    prev: prev_outer,
                    next: outer,
                },
            );
            let (inner_points, outer_points): (&[Point], &[Point]) = match &corner {
                Corner::Join(i, o) => (core::slice::from_ref(i), core::slice::from_ref(o)),
                Corner::Miter { inner, outer } => (inner.as_slice(), outer.as_slice()),
                Corner::Parallel => (&[][..], &[][..]),
                Corner::Degenerate => continue,
            };
            for (i, (&ip, &op)) in inner_points.iter().zip(outer_points).enumerate() {
                trace!("inner ({}, {}), outer ({}, {})", ip.x, ip.y, op.x, op.y);
                let iv = self.arena.add_vertex(ip, 255);
                let ov = self.arena.add_vertex(op, 0);
                self.arena.vertices[iv].partner = Some(ov);
                self.arena.vertices[ov].partner = Some(iv);
                if i == 0 {
                    if !inversion(&self.arena, &self.c, inner_ring.tail, Some(iv), prev_edge) {
                        inner_inversion = false;
                    }
                    if !inversion(&self.arena, &self.c, outer_ring.tail, Some(ov), prev_edge) {
                        outer_inversion = false;
                    }
                }
                self.arena.vertex_list_append(&mut inner_ring, iv);
                self.arena.vertex_list_append(&mut outer_ring, ov);
            }
            prev_inner = inner;
            prev_outer = outer;
            prev_edge = e;
            prev_normal = normal;
        }
        if !inversion(&self.arena, &self.c, inner_ring.tail, inner_ring.head, prev_edge) {
            inner_inversion = false;
        }
        if !inversion(&self.arena, &self.c, outer_ring.tail, outer_ring.head, prev_edge) {
            outer_inversion = false;
        }
        // The interior sums to -1, or to 3 where a thin feature made the inner ring cross over.
        // A ring that inverted completely has flipped handedness, so its winding flips too.
        let inner_winding = if inner_inversion { 2 } else { -2 };
        let outer_winding = if outer_inversion { -1 } else { 1 };
        self.connect_ring(&inner_ring, EdgeType::Inner, inner_winding);
        self.connect_ring(&outer_ring, EdgeType::Outer, outer_winding);
        self.arena.vertex_list_append_list(inner_mesh, inner_ring);
        self.arena.vertex_list_append_list(outer_mesh, outer_ring);
    }

    /// Join consecutive ring vertices into a closed loop of edges.
    fn connect_ring(&mut self, ring: &VertexList, kind: EdgeType, winding: i32) {
        let mut cursor = ring.head;
        while let Some(v) = cursor {
            let next = self.arena.vertices[v].links.next;
            if next.is_some() {
                self.make_connecting_edge(Some(v), next, kind, winding);
            }
            cursor = next;
        }
        self.make_connecting_edge(ring.tail, ring.head, kind, winding);
    }
}

#[cfg(test)]
mod tests {
    use crate::config::{Mode, Options};
    use crate::geom::Point;
    use crate::mesh::{EdgeType, VertexList};
    use crate::path::FillRule;
    use crate::triangulator::Triangulator;

    /// Build, simplify and stroke a single contour, returning the inner and outer rings.
    fn rings(points: &[(f32, f32)]) -> (Triangulator, VertexList, VertexList) {
        let mut t = Triangulator::new(&Options::new(Mode::Antialiased), FillRule::NonZero);
        let mut contour = VertexList::EMPTY;
        for &(x, y) in points {
            let v = t.arena.add_vertex(Point::new(x, y), 255);
            t.arena.vertex_list_append(&mut contour, v);
        }
        let mut mesh = t.contours_to_mesh(&mut [contour]);
        t.sort_mesh(&mut mesh);
        t.merge_coincident_vertices(&mut mesh);
        t.simplify(&mut mesh).unwrap();
        let mut inner = VertexList::EMPTY;
        let mut outer = VertexList::EMPTY;
        t.extract_boundaries(&mesh, &mut inner, &mut outer);
        (t, inner, outer)
    }

    fn sorted_points(t: &Triangulator, list: &VertexList) -> Vec<(f32, f32)> {
        let mut points: Vec<(f32, f32)> = t
            .arena
            .collect_vertices(list)
            .into_iter()
            .map(|v| (t.arena.point(v).x, t.arena.point(v).y))
            .collect();
        points.sort_by(|a, b| a.partial_cmp(b).unwrap());
        points
    }

    #[test]
    fn rectangle_rings_are_half_a_pixel_out() {
        let (t, inner, outer) = rings(&[(10., 10.), (110., 10.), (110., 60.), (10., 60.)]);
        assert_eq!(
            sorted_points(&t, &inner),
            vec![(10.5, 10.5), (10.5, 59.5), (109.5, 10.5), (109.5, 59.5)]
        );
        assert_eq!(
            sorted_points(&t, &outer),
            vec![(9.5, 9.5), (9.5, 60.5), (110.5, 9.5), (110.5, 60.5)]
        );
        for v in t.arena.collect_vertices(&inner) {
            let vertex = &t.arena.vertices[v];
            assert_eq!(vertex.alpha, 255);
            let partner = vertex.partner.unwrap();
            assert_eq!(t.arena.vertices[partner].alpha, 0);
            assert_eq!(t.arena.vertices[partner].partner, Some(v));
        }
    }

    #[test]
    fn ring_windings_sum_to_the_interior() {
        let (t, inner, outer) = rings(&[(0., 0.), (20., 0.), (20., 20.), (0., 20.)]);
        let winding_of = |list: &VertexList, kind: EdgeType| {
            let v = list.head.unwrap();
            let e = t.arena.vertices[v].below.head.unwrap();
            let edge = &t.arena.edges[e];
            assert_eq!(edge.kind, kind);
            edge.winding.abs()
        };
        assert_eq!(winding_of(&inner, EdgeType::Inner), 2);
        assert_eq!(winding_of(&outer, EdgeType::Outer), 1);
    }

    #[test]
    fn sharp_corner_is_mitered() {
        // A long thin triangle; its acute tip gets two vertices on the inner ring.
        let (t, inner, outer) = rings(&[(0., 0.), (100., 2.), (0., 4.)]);
        let inner_count = t.arena.collect_vertices(&inner).len();
        let outer_count = t.arena.collect_vertices(&outer).len();
        assert_eq!(inner_count, outer_count);
        assert!(inner_count >= 4);
    }
}
