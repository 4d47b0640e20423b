// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Extracting the filled region's boundary loops from a simple mesh.

use log::trace;

use crate::geom::Point;
use crate::mesh::{EdgeId, EdgeList, EdgeType, VertexList};
use crate::triangulator::Triangulator;

impl Triangulator {
    /// The unit normal of a boundary edge.
    pub(crate) fn edge_normal(&self, e: EdgeId) -> Point {
        let edge = &self.arena.edges[e];
        let w = edge.winding as f64;
        Point::new((edge.line.a * w) as f32, (edge.line.b * w) as f32).normalize()
    }

    /// Disconnect every edge that has the same fill state on both sides.
    ///
    /// Afterwards the winding of each remaining edge is the accumulated winding to its right.
    pub(crate) fn remove_non_boundary_edges(&mut self, mesh: &VertexList) {
        trace!("removing non-boundary edges");
        let rule = self.path_rule;
        let mut active = EdgeList::EMPTY;
        let mut cursor = mesh.head;
        while let Some(v) = cursor {
            cursor = self.arena.vertices[v].links.next;
            if !self.arena.vertices[v].is_connected() {
                continue;
            }
            let (left, _) = self.find_enclosing_edges(v, &active);
            let a = &mut self.arena;
            let mut prev_filled = left.is_some_and(|l| rule.contains(a.edges[l].winding));
            let mut above = a.vertices[v].above.head;
            while let Some(e) = above {
                above = a.edges[e].above.next;
                a.edge_list_remove(&mut active, e);
                let filled = rule.contains(a.edges[e].winding);
                if filled == prev_filled {
                    a.disconnect(e);
                }
                prev_filled = filled;
            }
            let mut prev = left;
            let mut below = a.vertices[v].below.head;
            while let Some(e) = below {
                if let Some(p) = prev {
                    a.edges[e].winding += a.edges[p].winding;
                }
                a.edge_list_insert(&mut active, e, prev);
                prev = Some(e);
                below = a.edges[e].below.next;
            }
        }
    }

    /// Walk the boundary loop containing `start_edge`, disconnecting its edges from the mesh.
    ///
    /// Each edge gets winding +1 if it is walked downwards and -1 otherwise, and its line is
    /// normalized and scaled by that winding.
    pub(crate) fn extract_boundary(&mut self, start_edge: EdgeId) -> EdgeList {
        let mut boundary = EdgeList::EMPTY;
        let a = &mut self.arena;
        let mut down = self.path_rule.contains(a.edges[start_edge].winding);
        let start = if down {
            a.edges[start_edge].top
        } else {
            a.edges[start_edge].bottom
        };
        let mut e = start_edge;
        loop {
            let edge = &mut a.edges[e];
            edge.winding = if down { 1 } else { -1 };
            edge.line.normalize();
            edge.line = edge.line.scaled(edge.winding as f64);
            let (top, bottom, above, below) = (edge.top, edge.bottom, edge.above, edge.below);
            a.edge_list_append(&mut boundary, e);
            // Leave each vertex through the most clockwise unvisited edge.
            let next = if down {
                if let Some(n) = above.next {
                    down = false;
                    Some(n)
                } else if let Some(n) = a.vertices[bottom].below.tail {
                    Some(n)
                } else if let Some(n) = above.prev {
                    down = false;
                    Some(n)
                } else {
                    None
                }
            } else if let Some(n) = below.prev {
                down = true;
                Some(n)
            } else if let Some(n) = a.vertices[top].above.head {
                Some(n)
            } else if let Some(n) = below.next {
                down = true;
                Some(n)
            } else {
                None
            };
            a.disconnect(e);
            let Some(n) = next else {
                break;
            };
            let entry = if down { a.edges[n].top } else { a.edges[n].bottom };
            if entry == start {
                break;
            }
            e = n;
        }
        boundary
    }

    /// Remove pointy vertices, which would invert once the boundary is offset.
    pub(crate) fn simplify_boundary(&mut self, boundary: &mut EdgeList) {
        let Some(mut prev_edge) = boundary.tail else {
            return;
        };
        let mut prev_normal = self.edge_normal(prev_edge);
        let max_dist_sq = self.config.pointy_vertex_dist_sq;
        let mut cursor = boundary.head;
        while let Some(e) = cursor {
            let a = &self.arena;
            let prev_e = &a.edges[prev_edge];
            let prev = if prev_e.winding == 1 {
                prev_e.top
            } else {
                prev_e.bottom
            };
            let edge = &a.edges[e];
            let next = if edge.winding == 1 {
                edge.bottom
            } else {
                edge.top
            };
            let dist_prev = a.dist(e, a.point(prev));
            let dist_next = a.dist(prev_edge, a.point(next));
            let normal = self.edge_normal(e);
            if prev == next {
                self.arena.edge_list_remove(boundary, prev_edge);
                self.arena.edge_list_remove(boundary, e);
                cursor = boundary.head;
                let Some(tail) = boundary.tail else {
                    break;
                };
                prev_edge = tail;
                prev_normal = self.edge_normal(prev_edge);
            } else if prev_normal.dot(normal) < 0.0
                && (dist_prev * dist_prev <= max_dist_sq || dist_next * dist_next <= max_dist_sq)
            {
                trace!("joining pointy vertex between {prev:?} and {next:?}");
                let coincident = a.point(prev) == a.point(next);
                let join = self.make_edge(prev, next, EdgeType::Inner);
                if !coincident {
                    let edge = &mut self.arena.edges[join];
                    edge.line.normalize();
                    edge.line = edge.line.scaled(edge.winding as f64);
                }
                self.arena.edge_list_insert(boundary, join, Some(e));
                self.arena.edge_list_remove(boundary, prev_edge);
                self.arena.edge_list_remove(boundary, e);
                let links = self.arena.edges[join].active;
                match (links.prev, links.next) {
                    (Some(left), Some(_)) => {
                        prev_edge = left;
                        cursor = Some(join);
                    }
                    _ => {
                        let Some(tail) = boundary.tail else {
                            break;
                        };
                        prev_edge = tail;
                        cursor = boundary.head;
                    }
                }
                prev_normal = self.edge_normal(prev_edge);
            } else {
                prev_edge = e;
                prev_normal = normal;
                cursor = self.arena.edges[e].active.next;
            }
        }
    }

    /// Replace the mesh by the inner and outer antialiasing rings of its boundary.
    pub(crate) fn extract_boundaries(
        &mut self,
        mesh: &VertexList,
        inner: &mut VertexList,
        outer: &mut VertexList,
    ) {
        self.remove_non_boundary_edges(mesh);
        let mut cursor = mesh.head;
        while let Some(v) = cursor {
            while let Some(e) = self.arena.vertices[v].below.head {
                let mut boundary = self.extract_boundary(e);
                self.simplify_boundary(&mut boundary);
                self.stroke_boundary(&boundary, inner, outer);
            }
            cursor = self.arena.vertices[v].links.next;
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::config::{Mode, Options};
    use crate::geom::Point;
    use crate::mesh::{EdgeList, VertexList};
    use crate::path::FillRule;
    use crate::triangulator::Triangulator;

    fn simple_mesh(t: &mut Triangulator, contours: &[&[(f32, f32)]]) -> VertexList {
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
        mesh
    }

    fn boundary_len(t: &Triangulator, list: &EdgeList) -> usize {
        let mut n = 0;
        let mut cursor = list.head;
        while let Some(e) = cursor {
            n += 1;
            cursor = t.arena.edges[e].active.next;
        }
        n
    }

    #[test]
    fn square_has_one_unit_boundary() {
        let mut t = Triangulator::new(&Options::new(Mode::Antialiased), FillRule::NonZero);
        let mesh = simple_mesh(&mut t, &[&[(0., 0.), (10., 0.), (10., 10.), (0., 10.)]]);
        t.remove_non_boundary_edges(&mesh);
        let head = mesh.head.unwrap();
        let first = t.arena.vertices[head].below.head.unwrap();
        let boundary = t.extract_boundary(first);
        assert_eq!(boundary_len(&t, &boundary), 4);
        let mut cursor = boundary.head;
        while let Some(e) = cursor {
            let edge = &t.arena.edges[e];
            assert_eq!(edge.winding.abs(), 1);
            assert!((edge.line.mag_sq() - 1.0).abs() < 1e-9);
            cursor = edge.active.next;
        }
        // Everything was walked, so nothing is left connected.
        for v in t.arena.collect_vertices(&mesh) {
            assert!(!t.arena.vertices[v].is_connected());
        }
    }

    #[test]
    fn shared_edges_are_not_boundaries() {
        let mut t = Triangulator::new(&Options::new(Mode::Antialiased), FillRule::NonZero);
        let mesh = simple_mesh(
            &mut t,
            &[
                &[(0., 0.), (10., 0.), (10., 10.), (0., 10.)],
                &[(10., 0.), (20., 0.), (20., 10.), (10., 10.)],
            ],
        );
        t.remove_non_boundary_edges(&mesh);
        let connected: usize = t
            .arena
            .collect_vertices(&mesh)
            .into_iter()
            .map(|v| {
                let mut n = 0;
                let mut cursor = t.arena.vertices[v].below.head;
                while let Some(e) = cursor {
                    n += 1;
                    cursor = t.arena.edges[e].below.next;
                }
                n
            })
            .sum();
        // The shared side is interior, leaving the outline of the 20x10 rectangle. Its top and
        // bottom sides are each split in two at x = 10.
        assert_eq!(connected, 6);
    }

    #[test]
    fn pointy_spike_is_joined() {
        let mut t = Triangulator::new(&Options::new(Mode::Antialiased), FillRule::NonZero);
        // A square with a sliver spike whose tip is within a quarter pixel of its base.
        let mesh = simple_mesh(
            &mut t,
            &[&[(0., 0.), (10., 0.), (10., 5.), (30., 5.1), (10., 5.2), (10., 10.), (0., 10.)]],
        );
        t.remove_non_boundary_edges(&mesh);
        let head = mesh.head.unwrap();
        let first = t.arena.vertices[head].below.head.unwrap();
        let mut boundary = t.extract_boundary(first);
        let before = boundary_len(&t, &boundary);
        t.simplify_boundary(&mut boundary);
        assert!(boundary_len(&t, &boundary) < before);
    }
}
