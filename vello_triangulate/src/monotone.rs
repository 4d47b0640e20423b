// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Partitioning a simple mesh into monotone polygons, and fanning those into triangles.

use std::collections::VecDeque;

use crate::arena::{define_id, list_insert, LinksOf, List};
use crate::mesh::{Arena, Edge, EdgeId, EdgeList, EdgeType, VertexId, VertexList};
use crate::path::FillRule;
use crate::triangulator::{BreadcrumbTriangle, Triangulator};
use crate::writer::TriangleSink;
use log::trace;

define_id!(
    /// Index of a [`Poly`].
    PolyId
);
define_id!(
    /// Index of a [`MonotonePoly`].
    ChainId
);

/// Which side of a monotone chain grows.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Side {
    Left,
    Right,
}

/// One monotone piece of a [`Poly`], as a chain of edges along one side.
#[derive(Debug)]
pub(crate) struct MonotonePoly {
    pub side: Side,
    pub first_edge: EdgeId,
    pub last_edge: EdgeId,
    pub next: Option<ChainId>,
    pub winding: i32,
}

/// A polygon under construction during the tessellation sweep.
#[derive(Debug)]
pub(crate) struct Poly {
    pub first_vertex: VertexId,
    pub winding: i32,
    pub head: Option<ChainId>,
    pub tail: Option<ChainId>,
    /// A poly this one must merge with when its next edge arrives.
    pub partner: Option<PolyId>,
    /// Number of vertices over all chains.
    pub count: usize,
}

impl Arena {
    fn chain_links(side: Side) -> LinksOf<EdgeId, Edge> {
        match side {
            Side::Left => Edge::left_chain_links,
            Side::Right => Edge::right_chain_links,
        }
    }

    fn mark_used(&mut self, e: EdgeId, side: Side) {
        let edge = &mut self.edges[e];
        match side {
            Side::Left => edge.used_in_left_poly = true,
            Side::Right => edge.used_in_right_poly = true,
        }
    }

    fn new_chain(&mut self, e: EdgeId, side: Side, winding: i32) -> ChainId {
        self.mark_used(e, side);
        self.chains.push(MonotonePoly {
            side,
            first_edge: e,
            last_edge: e,
            next: None,
            winding,
        })
    }

    fn chain_add_edge(&mut self, m: ChainId, e: EdgeId) {
        let chain = &self.chains[m];
        let side = chain.side;
        let mut list = List {
            head: Some(chain.first_edge),
            tail: Some(chain.last_edge),
        };
        list_insert(
            &mut self.edges,
            Self::chain_links(side),
            e,
            list.tail,
            None,
            &mut list,
        );
        self.mark_used(e, side);
        self.chains[m].last_edge = e;
    }

    pub(crate) fn new_poly(&mut self, v: VertexId, winding: i32) -> PolyId {
        trace!("making new poly {}, winding {winding}", self.polys.len());
        self.polys.push(Poly {
            first_vertex: v,
            winding,
            head: None,
            tail: None,
            partner: None,
            count: 0,
        })
    }

    pub(crate) fn poly_last_vertex(&self, p: PolyId) -> VertexId {
        let poly = &self.polys[p];
        match poly.tail {
            Some(tail) => self.edges[self.chains[tail].last_edge].bottom,
            None => poly.first_vertex,
        }
    }

    /// Add `e` to the `side` of poly `p`, returning the poly that now owns that side.
    ///
    /// A partnered poly hands its new chain over to the partner and the pair is dissolved.
    pub(crate) fn poly_add_edge(&mut self, p: PolyId, e: EdgeId, side: Side) -> PolyId {
        let used = match side {
            Side::Left => self.edges[e].used_in_left_poly,
            Side::Right => self.edges[e].used_in_right_poly,
        };
        if used {
            return p;
        }
        trace!(
            "adding edge {:?} -> {:?} to poly {p:?}, {side:?} side",
            self.edges[e].top,
            self.edges[e].bottom
        );
        let partner = self.polys[p].partner;
        if let Some(partner) = partner {
            self.polys[p].partner = None;
            self.polys[partner].partner = None;
        }
        let winding = self.polys[p].winding;
        let Some(tail) = self.polys[p].tail else {
            let m = self.new_chain(e, side, winding);
            let poly = &mut self.polys[p];
            poly.head = Some(m);
            poly.tail = Some(m);
            poly.count += 2;
            return p;
        };
        let last_bottom = self.edges[self.chains[tail].last_edge].bottom;
        let bottom = self.edges[e].bottom;
        if bottom == last_bottom {
            return p;
        }
        if side == self.chains[tail].side {
            self.chain_add_edge(tail, e);
            self.polys[p].count += 1;
            return p;
        }
        // Switching sides closes the tail chain with an edge across the poly.
        let join = self.add_edge(last_bottom, bottom, 1, EdgeType::Inner);
        self.chain_add_edge(tail, join);
        self.polys[p].count += 1;
        if let Some(partner) = partner {
            self.poly_add_edge(partner, join, side);
            partner
        } else {
            let m = self.new_chain(join, side, winding);
            self.chains[tail].next = Some(m);
            self.polys[p].tail = Some(m);
            p
        }
    }
}

impl Triangulator {
    /// Sweep a simple mesh, partitioning it into monotone polygons.
    ///
    /// Returns the polys in creation order.
    pub(crate) fn tessellate(&mut self, mesh: &VertexList) -> Vec<PolyId> {
        trace!("tessellating simple polygons");
        let mut active = EdgeList::EMPTY;
        let mut polys = Vec::new();
        let mut cursor = mesh.head;
        while let Some(v) = cursor {
            cursor = self.arena.vertices[v].links.next;
            if !self.arena.vertices[v].is_connected() {
                continue;
            }
            let (left_enclosing, right_enclosing) = self.find_enclosing_edges(v, &active);
            let a = &mut self.arena;
            let (above, below) = (a.vertices[v].above, a.vertices[v].below);
            let (mut left_poly, mut right_poly) = match (above.head, above.tail) {
                (Some(first), Some(last)) => (a.edges[first].left_poly, a.edges[last].right_poly),
                _ => (
                    left_enclosing.and_then(|e| a.edges[e].right_poly),
                    right_enclosing.and_then(|e| a.edges[e].left_poly),
                ),
            };
            if let (Some(first_above), Some(last_above)) = (above.head, above.tail) {
                if let Some(p) = left_poly {
                    left_poly = Some(a.poly_add_edge(p, first_above, Side::Right));
                }
                if let Some(p) = right_poly {
                    right_poly = Some(a.poly_add_edge(p, last_above, Side::Left));
                }
                let mut e = first_above;
                while e != last_above {
                    let Some(right_edge) = a.edges[e].above.next else {
                        break;
                    };
                    a.edge_list_remove(&mut active, e);
                    let right_of_e = a.edges[e].right_poly;
                    if let Some(p) = right_of_e {
                        a.poly_add_edge(p, e, Side::Left);
                    }
                    let left_of_right = a.edges[right_edge].left_poly;
                    if let Some(p) = left_of_right.filter(|&p| Some(p) != right_of_e) {
                        a.poly_add_edge(p, e, Side::Right);
                    }
                    e = right_edge;
                }
                a.edge_list_remove(&mut active, last_above);
                if below.is_empty() {
                    if let (Some(l), Some(r)) = (left_poly, right_poly) {
                        if l != r {
                            trace!("vertex {v:?} partners polys {l:?} and {r:?}");
                            a.polys[r].partner = Some(l);
                            a.polys[l].partner = Some(r);
                        }
                    }
                }
            }
            let (Some(first_below), Some(last_below)) = (below.head, below.tail) else {
                continue;
            };
            if above.is_empty() {
                if let (Some(mut l), Some(mut r)) = (left_poly, right_poly) {
                    if l == r {
                        let tail_on_left = a.polys[l]
                            .tail
                            .is_some_and(|t| a.chains[t].side == Side::Left);
                        if tail_on_left {
                            let winding = a.polys[l].winding;
                            l = a.new_poly(a.poly_last_vertex(l), winding);
                            polys.push(l);
                            if let Some(e) = left_enclosing {
                                a.edges[e].right_poly = Some(l);
                            }
                        } else {
                            let winding = a.polys[r].winding;
                            r = a.new_poly(a.poly_last_vertex(r), winding);
                            polys.push(r);
                            if let Some(e) = right_enclosing {
                                a.edges[e].left_poly = Some(r);
                            }
                        }
                    }
                    let join = a.add_edge(a.poly_last_vertex(l), v, 1, EdgeType::Inner);
                    left_poly = Some(a.poly_add_edge(l, join, Side::Right));
                    right_poly = Some(a.poly_add_edge(r, join, Side::Left));
                }
            }
            let mut left_edge = first_below;
            a.edges[left_edge].left_poly = left_poly;
            a.edge_list_insert(&mut active, left_edge, left_enclosing);
            let mut next = a.edges[left_edge].below.next;
            while let Some(right_edge) = next {
                a.edge_list_insert(&mut active, right_edge, Some(left_edge));
                let winding = a.edges[left_edge]
                    .left_poly
                    .map_or(0, |p| a.polys[p].winding)
                    + a.edges[left_edge].winding;
                if winding != 0 {
                    let poly = a.new_poly(v, winding);
                    polys.push(poly);
                    a.edges[left_edge].right_poly = Some(poly);
                    a.edges[right_edge].left_poly = Some(poly);
                }
                left_edge = right_edge;
                next = a.edges[right_edge].below.next;
            }
            a.edges[last_below].right_poly = right_poly;
        }
        polys
    }

    /// The number of vertices emitting `polys` will write.
    pub(crate) fn count_points(&self, polys: &[PolyId]) -> usize {
        polys
            .iter()
            .map(|&p| &self.arena.polys[p])
            .filter(|poly| self.fill_rule.contains(poly.winding) && poly.count >= 3)
            .map(|poly| (poly.count - 2) * 3)
            .sum()
    }

    /// Emit every filled poly, most recently created first.
    pub(crate) fn emit_polys(&mut self, polys: &[PolyId], sink: &mut impl TriangleSink) {
        for &p in polys.iter().rev() {
            let poly = &self.arena.polys[p];
            if !self.fill_rule.contains(poly.winding) || poly.count < 3 {
                continue;
            }
            let mut chain = poly.head;
            while let Some(m) = chain {
                self.emit_chain(m, sink);
                chain = self.arena.chains[m].next;
            }
        }
    }

    fn emit_chain(&mut self, m: ChainId, sink: &mut impl TriangleSink) {
        let a = &self.arena;
        let chain = &a.chains[m];
        let winding = chain.winding;
        let mut ordered = VecDeque::new();
        ordered.push_back(a.edges[chain.first_edge].top);
        let mut cursor = Some(chain.first_edge);
        while let Some(e) = cursor {
            let edge = &a.edges[e];
            match chain.side {
                Side::Right => {
                    ordered.push_back(edge.bottom);
                    cursor = edge.right_chain.next;
                }
                Side::Left => {
                    ordered.push_front(edge.bottom);
                    cursor = edge.left_chain.next;
                }
            }
        }
        let vertices = Vec::from(ordered);
        let n = vertices.len();
        if n < 3 {
            return;
        }
        // Splicing happens on index links rather than on the vertices themselves.
        let mut prev: Vec<usize> = (0..n).map(|i| i.saturating_sub(1)).collect();
        let mut next: Vec<usize> = (1..=n).collect();
        let (first, last) = (0, n - 1);
        let mut count = n;
        let mut v = 1;
        while v != last {
            let (p, nx) = (prev[v], next[v]);
            let tri = [vertices[p], vertices[v], vertices[nx]];
            if count == 3 {
                self.emit_triangle(tri, winding, sink);
                return;
            }
            let [pp, cp, np] = tri.map(|id| self.arena.point(id));
            let (ax, ay) = (cp.x as f64 - pp.x as f64, cp.y as f64 - pp.y as f64);
            let (bx, by) = (np.x as f64 - cp.x as f64, np.y as f64 - cp.y as f64);
            if ax * by - ay * bx >= 0.0 {
                self.emit_triangle(tri, winding, sink);
                next[p] = nx;
                prev[nx] = p;
                count -= 1;
                v = if p == first { nx } else { p };
            } else {
                v = nx;
            }
        }
    }

    fn emit_triangle(&mut self, tri: [VertexId; 3], winding: i32, sink: &mut impl TriangleSink) {
        let [mut prev, curr, mut next] = tri;
        if winding > 0 {
            core::mem::swap(&mut prev, &mut next);
        }
        let tri = [prev, curr, next];
        if winding.abs() > 1 && self.fill_rule == FillRule::NonZero {
            let points = tri.map(|v| self.arena.point(v));
            // The emitted triangle supplies one winding; the breadcrumb supplies the rest.
            if let Some(breadcrumbs) = self.breadcrumbs_mut() {
                breadcrumbs.push(BreadcrumbTriangle {
                    points,
                    winding: winding.abs() - 1,
                });
            }
        }
        let a = &self.arena;
        sink.triangle(tri.map(|v| &a.vertices[v]), winding);
    }
}

#[cfg(test)]
mod tests {
    use crate::config::{Mode, Options};
    use crate::geom::Point;
    use crate::mesh::{Vertex, VertexList};
    use crate::path::FillRule;
    use crate::triangulator::Triangulator;
    use crate::writer::TriangleSink;

    #[derive(Default)]
    struct Triangles(Vec<([Point; 3], i32)>);

    impl TriangleSink for Triangles {
        fn triangle(&mut self, vertices: [&Vertex; 3], winding: i32) {
            self.0.push((vertices.map(|v| v.point), winding));
        }
    }

    fn signed_area([a, b, c]: [Point; 3]) -> f32 {
        0.5 * (b - a).cross(c - a)
    }

    fn tessellate(mode: Mode, rule: FillRule, contours: &[&[(f32, f32)]]) -> (usize, Triangles) {
        let mut t = Triangulator::new(&Options::new(mode), rule);
        let mut lists: Vec<VertexList> = contours
            .iter()
            .map(|points| {
                let mut list = VertexList::EMPTY;
                for &(x, y) in points.iter() {
                    let v = t.arena.add_vertex(Point::new(x, y), 255);
                    t.arena.vertex_list_append(&mut list, v);
                }
                list
            })
            .collect();
        let mut mesh = t.contours_to_mesh(&mut lists);
        t.sort_mesh(&mut mesh);
        t.merge_coincident_vertices(&mut mesh);
        t.simplify(&mut mesh).unwrap();
        let polys = t.tessellate(&mesh);
        let count = t.count_points(&polys);
        let mut out = Triangles::default();
        t.emit_polys(&polys, &mut out);
        (count, out)
    }

    #[test]
    fn concave_polygon_fans_completely() {
        // An arrow head with a reflex vertex at (5, 6).
        let (count, out) = tessellate(
            Mode::default(),
            FillRule::NonZero,
            &[&[(5., 0.), (10., 10.), (5., 6.), (0., 10.)]],
        );
        assert_eq!(count, 6);
        assert_eq!(out.0.len(), 2);
        let area: f32 = out.0.iter().map(|(tri, _)| signed_area(*tri).abs()).sum();
        assert!((area - 30.0).abs() < 1e-4);
    }

    #[test]
    fn triangles_follow_contour_orientation() {
        let square: &[(f32, f32)] = &[(0., 0.), (10., 0.), (10., 10.), (0., 10.)];
        let reversed: Vec<(f32, f32)> = square.iter().rev().copied().collect();
        for contour in [square, &reversed[..]] {
            let (_, out) = tessellate(Mode::default(), FillRule::NonZero, &[contour]);
            let contour_area: f32 = (0..contour.len())
                .map(|i| {
                    let (x0, y0) = contour[i];
                    let (x1, y1) = contour[(i + 1) % contour.len()];
                    0.5 * (x0 * y1 - x1 * y0)
                })
                .sum();
            for (tri, _) in &out.0 {
                assert_eq!(signed_area(*tri).signum(), contour_area.signum());
            }
        }
    }

    #[test]
    fn double_winding_leaves_breadcrumbs() {
        let square: &[(f32, f32)] = &[(0., 0.), (10., 0.), (10., 10.), (0., 10.)];
        let mode = Mode::SimpleFan {
            collect_breadcrumbs: true,
        };
        let mut t = Triangulator::new(&Options::new(mode), FillRule::NonZero);
        let mut lists: Vec<VertexList> = [square, square]
            .iter()
            .map(|points| {
                let mut list = VertexList::EMPTY;
                for &(x, y) in points.iter() {
                    let v = t.arena.add_vertex(Point::new(x, y), 255);
                    t.arena.vertex_list_append(&mut list, v);
                }
                list
            })
            .collect();
        let mut mesh = t.contours_to_mesh(&mut lists);
        t.sort_mesh(&mut mesh);
        t.merge_coincident_vertices(&mut mesh);
        let polys = t.tessellate(&mesh);
        let mut out = Triangles::default();
        t.emit_polys(&polys, &mut out);
        assert_eq!(out.0.len(), 2);
        assert!(out.0.iter().all(|(_, w)| w.abs() == 2));
        let breadcrumbs = t.take_breadcrumbs();
        assert_eq!(breadcrumbs.len(), 2);
        assert!(breadcrumbs.iter().all(|b| b.winding == 1));
    }

    #[test]
    fn even_odd_drops_doubly_wound_polys() {
        let square: &[(f32, f32)] = &[(0., 0.), (10., 0.), (10., 10.), (0., 10.)];
        let (count, out) = tessellate(Mode::default(), FillRule::EvenOdd, &[square, square]);
        assert_eq!(count, 0);
        assert!(out.0.is_empty());
    }
}
