// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Collapsing regions where an antialiasing ring overlaps itself.
//!
//! Where a ring crosses over (thin features, tight corners), the overlapping region is bounded by
//! edges whose winding is neither the ring's own nor zero. Those edges form a straight skeleton:
//! their endpoints move along the bisectors towards their partners, and whenever an edge shrinks
//! to nothing, its neighbours are joined at the collapse point.

use core::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

use log::trace;

use crate::arena::{define_id, Pool};
use crate::geom::Point;
use crate::mesh::{EdgeId, EdgeList, EdgeType, VertexId, VertexList};
use crate::simplify::{intersect, Segment};
use crate::triangulator::Triangulator;

define_id!(SsVertexId);
define_id!(SsEdgeId);

/// The order in which collapse events are processed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum EventOrder {
    /// Used for the inner ring, which collapses towards transparency.
    HighestAlphaFirst,
    /// Used for the outer ring, which collapses towards opacity.
    LowestAlphaFirst,
}

impl EventOrder {
    fn key(self, alpha: u8) -> u8 {
        match self {
            Self::HighestAlphaFirst => alpha,
            Self::LowestAlphaFirst => u8::MAX - alpha,
        }
    }
}

#[derive(Debug)]
struct SsVertex {
    vertex: VertexId,
    prev: Option<SsEdgeId>,
    next: Option<SsEdgeId>,
}

#[derive(Debug)]
struct SsEdge {
    /// The mesh edge, or `None` once collapsed.
    edge: Option<EdgeId>,
    /// The pending event of this edge.
    event: Option<usize>,
    prev: SsVertexId,
    next: SsVertexId,
}

#[derive(Clone, Copy, Debug)]
struct Event {
    /// The collapsing edge, or `None` if the event was invalidated.
    edge: Option<SsEdgeId>,
    point: Point,
    alpha: u8,
}

/// The straight skeleton of the overlap regions and its pending events.
struct Skeleton {
    vertices: Pool<SsVertexId, SsVertex>,
    edges: Pool<SsEdgeId, SsEdge>,
    edge_order: Vec<SsEdgeId>,
    by_vertex: HashMap<VertexId, SsVertexId>,
    events: Vec<Event>,
    // Ties are broken by creation order.
    queue: BinaryHeap<(u8, Reverse<usize>)>,
    order: EventOrder,
}

impl Skeleton {
    fn new(order: EventOrder) -> Self {
        Self {
            vertices: Pool::new(),
            edges: Pool::new(),
            edge_order: Vec::new(),
            by_vertex: HashMap::new(),
            events: Vec::new(),
            queue: BinaryHeap::new(),
            order,
        }
    }

    fn vertex_for(&mut self, v: VertexId) -> SsVertexId {
        let vertices = &mut self.vertices;
        *self.by_vertex.entry(v).or_insert_with(|| {
            vertices.push(SsVertex {
                vertex: v,
                prev: None,
                next: None,
            })
        })
    }

    /// Add a skeleton edge for `e`, running from `from` to `to` along its ring.
    fn add_edge(&mut self, e: EdgeId, from: VertexId, to: VertexId) -> SsEdgeId {
        let prev = self.vertex_for(from);
        let next = self.vertex_for(to);
        let id = self.edges.push(SsEdge {
            edge: Some(e),
            event: None,
            prev,
            next,
        });
        self.vertices[prev].next = Some(id);
        self.vertices[next].prev = Some(id);
        self.edge_order.push(id);
        id
    }

    fn push_event(&mut self, edge: SsEdgeId, point: Point, alpha: u8) {
        let id = self.events.len();
        self.events.push(Event {
            edge: Some(edge),
            point,
            alpha,
        });
        self.edges[edge].event = Some(id);
        self.queue.push((self.order.key(alpha), Reverse(id)));
    }

    fn invalidate_event(&mut self, edge: SsEdgeId) {
        if let Some(event) = self.edges[edge].event {
            self.events[event].edge = None;
        }
    }

    fn ends(&self, edge: SsEdgeId) -> (VertexId, VertexId) {
        let e = &self.edges[edge];
        (self.vertices[e.prev].vertex, self.vertices[e.next].vertex)
    }
}

impl Triangulator {
    /// Whether an edge bounds a region where its ring overlaps itself.
    fn is_overlap_edge(&self, e: EdgeId) -> bool {
        let edge = &self.arena.edges[e];
        match edge.kind {
            EdgeType::Outer => edge.winding != 0 && edge.winding != 1,
            EdgeType::Inner => edge.winding != 0 && edge.winding != -2,
            EdgeType::Connector => false,
        }
    }

    /// Schedule the point where both ends of `edge`, moving along their bisectors, meet.
    fn make_bisector_event(&self, sk: &mut Skeleton, edge: SsEdgeId) {
        let (prev, next) = sk.ends(edge);
        let a = &self.arena;
        let (Some(prev_partner), Some(next_partner)) =
            (a.vertices[prev].partner, a.vertices[next].partner)
        else {
            return;
        };
        if prev == next {
            return;
        }
        let bisector1 = Segment::between(a, prev, prev_partner, EdgeType::Connector);
        let bisector2 = Segment::between(a, next, next_partner, EdgeType::Connector);
        if let Some((p, alpha)) = intersect(a, &bisector1, &bisector2) {
            trace!(
                "found bisector event for edge {edge:?} at ({}, {}), alpha {alpha}",
                p.x,
                p.y
            );
            sk.push_event(edge, p, alpha);
        }
    }

    /// Schedule the point where `v`, moving along its bisector, meets the line through `dest`
    /// parallel to `edge`.
    fn make_line_event(&self, sk: &mut Skeleton, edge: SsEdgeId, v: VertexId, dest: VertexId) {
        let a = &self.arena;
        let Some(partner) = a.vertices[v].partner else {
            return;
        };
        let Some(e) = sk.edges[edge].edge else {
            return;
        };
        let mesh_edge = &a.edges[e];
        let (top, bottom) = (a.point(mesh_edge.top), a.point(mesh_edge.bottom));
        let mut line = mesh_edge.line;
        let d = a.point(dest);
        line.c = -(d.x as f64 * line.a + d.y as f64 * line.b);
        let bisector = Segment::between(a, v, partner, EdgeType::Connector).line;
        let Some(p) = line.intersect(&bisector) else {
            return;
        };
        if !self.c.sweep_lt(p, top) && self.c.sweep_lt(p, bottom) {
            let alpha = a.vertices[dest].alpha;
            trace!(
                "found line event for edge {edge:?} at ({}, {}), alpha {alpha}",
                p.x,
                p.y
            );
            sk.push_event(edge, p, alpha);
        }
    }

    /// Attach a collapsed vertex to the collapse point `dest`.
    ///
    /// Synthetic vertices are joined to it by a connector. Ring vertices hand their partner over
    /// to `dest`, so the coverage ramp starts from the collapse point.
    fn connect_ss_edge(&mut self, v: VertexId, dest: VertexId) {
        if v == dest {
            return;
        }
        if self.arena.vertices[v].synthetic {
            self.make_connecting_edge(Some(v), Some(dest), EdgeType::Connector, 0);
        } else if let Some(partner) = self.arena.vertices[v].partner.take() {
            self.arena.vertices[partner].partner = Some(dest);
        }
    }

    /// Collapse the edge of `event` to its point. Returns `false` if the event was stale.
    fn apply_event(&mut self, sk: &mut Skeleton, event: usize, mesh: &mut VertexList) -> bool {
        let Event { edge, point, alpha } = sk.events[event];
        let Some(edge) = edge else {
            return false;
        };
        let (ss_prev, ss_next) = (sk.edges[edge].prev, sk.edges[edge].next);
        let (prev, next) = sk.ends(edge);
        let (Some(prev_edge), Some(next_edge)) =
            (sk.vertices[ss_prev].prev, sk.vertices[ss_next].next)
        else {
            return false;
        };
        let (Some(prev_mesh_edge), Some(next_mesh_edge)) =
            (sk.edges[prev_edge].edge, sk.edges[next_edge].edge)
        else {
            return false;
        };
        let dest = self.make_sorted_vertex(point, alpha, mesh, Some(prev));
        self.arena.vertices[dest].synthetic = true;
        trace!(
            "collapsing edge {edge:?} ({prev:?} -> {next:?}) to ({}, {}), alpha {alpha}",
            point.x,
            point.y
        );
        let ssv = sk.vertices.push(SsVertex {
            vertex: dest,
            prev: Some(prev_edge),
            next: Some(next_edge),
        });
        sk.edges[edge].edge = None;
        self.connect_ss_edge(prev, dest);
        self.connect_ss_edge(next, dest);

        sk.edges[prev_edge].next = ssv;
        sk.edges[next_edge].prev = ssv;
        sk.invalidate_event(prev_edge);
        sk.invalidate_event(next_edge);
        let (before, after) = (sk.edges[prev_edge].prev, sk.edges[next_edge].next);
        if before == after {
            // The last three vertices of a loop; close it off at the collapse point.
            let v = sk.vertices[before].vertex;
            self.connect_ss_edge(v, dest);
            sk.edges[prev_edge].edge = None;
            sk.edges[next_edge].edge = None;
        } else {
            self.compute_bisector(prev_mesh_edge, next_mesh_edge, dest);
            if self.arena.vertices[dest].partner.is_some() {
                self.make_bisector_event(sk, prev_edge);
                self.make_bisector_event(sk, next_edge);
            } else {
                let before = sk.vertices[before].vertex;
                let after = sk.vertices[after].vertex;
                self.make_line_event(sk, prev_edge, before, dest);
                self.make_line_event(sk, next_edge, after, dest);
            }
        }
        true
    }

    /// Collapse the overlap regions of a simple antialiasing mesh.
    ///
    /// Returns whether any overlap region was found.
    pub(crate) fn collapse_overlap_regions(
        &mut self,
        mesh: &mut VertexList,
        order: EventOrder,
    ) -> bool {
        trace!("collapsing overlap regions");
        let mut sk = self.build_skeleton(mesh, order);
        let complex = !sk.queue.is_empty();
        let applied = self.run_events(&mut sk, mesh);
        trace!("applied {applied} collapse events");
        complex
    }

    /// Sweep `mesh`, turning the edges around each overlap region into a skeleton and scheduling
    /// its first events.
    fn build_skeleton(&mut self, mesh: &VertexList, order: EventOrder) -> Skeleton {
        let mut sk = Skeleton::new(order);
        let mut active = EdgeList::EMPTY;
        let mut cursor = mesh.head;
        while let Some(v) = cursor {
            cursor = self.arena.vertices[v].links.next;
            if !self.arena.vertices[v].is_connected() {
                continue;
            }
            let (left, _) = self.find_enclosing_edges(v, &active);
            // Right to left, so that each edge's left neighbour still has its accumulated winding.
            let mut above = self.arena.vertices[v].above.tail;
            while let Some(e) = above {
                above = self.arena.edges[e].above.prev;
                let prev = above.or(left);
                self.arena.edge_list_remove(&mut active, e);
                let left_overlap = prev.is_some_and(|p| self.is_overlap_edge(p));
                let right_overlap = self.is_overlap_edge(e);
                let edge = &self.arena.edges[e];
                let is_outer_boundary = edge.kind == EdgeType::Outer
                    && (edge.winding == 0
                        || match prev {
                            Some(p) => self.arena.edges[p].winding == 0,
                            None => true,
                        });
                if let Some(p) = prev {
                    let w = self.arena.edges[p].winding;
                    self.arena.edges[e].winding -= w;
                }
                if left_overlap && right_overlap {
                    trace!("found interior overlap edge {e:?}; disconnecting");
                    self.arena.disconnect(e);
                } else if left_overlap || right_overlap {
                    trace!("found overlap edge {e:?}; making skeleton edge");
                    // Skeleton edges follow the ring, not the sweep.
                    let edge = &self.arena.edges[e];
                    let (prev, next) = if edge.winding < 0 {
                        (edge.bottom, edge.top)
                    } else {
                        (edge.top, edge.bottom)
                    };
                    let ss_edge = sk.add_edge(e, prev, next);
                    self.make_bisector_event(&mut sk, ss_edge);
                    if !is_outer_boundary {
                        self.arena.disconnect(e);
                    }
                }
            }
            let mut prev = left;
            let mut below = self.arena.vertices[v].below.head;
            while let Some(e) = below {
                if let Some(p) = prev {
                    let w = self.arena.edges[p].winding;
                    self.arena.edges[e].winding += w;
                }
                self.arena.edge_list_insert(&mut active, e, prev);
                prev = Some(e);
                below = self.arena.edges[e].below.next;
            }
        }
        sk
    }

    /// Apply queued events until none are left, then reconnect the surviving skeleton edges.
    ///
    /// Returns the number of events applied.
    fn run_events(&mut self, sk: &mut Skeleton, mesh: &mut VertexList) -> usize {
        let mut applied = 0;
        while let Some((_, Reverse(event))) = sk.queue.pop() {
            if self.apply_event(sk, event, mesh) {
                applied += 1;
            }
        }
        for id in core::mem::take(&mut sk.edge_order) {
            if let Some(e) = sk.edges[id].edge {
                let (prev, next) = sk.ends(id);
                let kind = self.arena.edges[e].kind;
                self.make_connecting_edge(Some(prev), Some(next), kind, 0);
            }
        }
        applied
    }

    /// Join each ring vertex to its partner with a zero-winding connector.
    pub(crate) fn connect_partners(&mut self, mesh: &VertexList) {
        let mut cursor = mesh.head;
        while let Some(v) = cursor {
            cursor = self.arena.vertices[v].links.next;
            let Some(partner) = self.arena.vertices[v].partner else {
                continue;
            };
            let in_list = |t: &Self, v: VertexId| {
                let links = t.arena.vertices[v].links;
                links.prev.is_some() || links.next.is_some()
            };
            if in_list(self, v) && in_list(self, partner) {
                self.make_connecting_edge(Some(v), Some(partner), EdgeType::Connector, 0);
                self.arena.vertices[v].partner = None;
                self.arena.vertices[partner].partner = None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{EventOrder, Skeleton};
    use crate::config::{Mode, Options};
    use crate::geom::{Comparator, Point};
    use crate::mesh::VertexList;
    use crate::path::FillRule;
    use crate::triangulator::Triangulator;

    /// Offset a single contour into simplified inner and outer rings, ready to collapse.
    fn rings(points: &[(f32, f32)]) -> (Triangulator, VertexList, VertexList) {
        let mut t = Triangulator::new(&Options::new(Mode::Antialiased), FillRule::NonZero);
        let (min, max) = points.iter().fold(
            (Point::new(f32::MAX, f32::MAX), Point::new(f32::MIN, f32::MIN)),
            |(min, max), &(x, y)| {
                (
                    Point::new(min.x.min(x), min.y.min(y)),
                    Point::new(max.x.max(x), max.y.max(y)),
                )
            },
        );
        t.c = Comparator::for_extent((max.x - min.x) as f64, (max.y - min.y) as f64);
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
        for ring in [&mut inner, &mut outer] {
            t.sort_mesh(ring);
            t.merge_coincident_vertices(ring);
            t.simplify(ring).unwrap();
        }
        (t, inner, outer)
    }

    /// Build and run the skeletons of both rings, checking that each is a linked chain.
    ///
    /// Returns the number of events applied.
    fn collapse(points: &[(f32, f32)]) -> usize {
        let (mut t, mut inner, mut outer) = rings(points);
        let mut applied = 0;
        for (ring, order) in [
            (&mut inner, EventOrder::HighestAlphaFirst),
            (&mut outer, EventOrder::LowestAlphaFirst),
        ] {
            let mut sk = t.build_skeleton(ring, order);
            for &id in &sk.edge_order {
                let edge = &sk.edges[id];
                assert_eq!(sk.vertices[edge.prev].next, Some(id), "broken chain at {id:?}");
                assert_eq!(sk.vertices[edge.next].prev, Some(id), "broken chain at {id:?}");
            }
            applied += t.run_events(&mut sk, ring);
        }
        applied
    }

    #[test]
    fn thin_features_collapse() {
        assert!(collapse(&[(0., 0.), (100., 0.), (100., 0.5), (0., 0.5)]) > 0);
        let corner = [
            (0., 0.),
            (40., 0.),
            (40., 0.5),
            (0.5, 0.5),
            (0.5, 40.),
            (0., 40.),
        ];
        assert!(collapse(&corner) > 0);
    }

    #[test]
    fn wide_features_have_no_skeleton() {
        assert_eq!(collapse(&[(0., 0.), (20., 0.), (20., 20.), (0., 20.)]), 0);
    }

    #[test]
    fn events_pop_by_alpha_then_creation() {
        let mut sk = Skeleton::new(EventOrder::HighestAlphaFirst);
        let mut pools = crate::mesh::Arena::default();
        let (a, b) = (
            pools.add_vertex(Point::new(0., 0.), 0),
            pools.add_vertex(Point::new(0., 1.), 0),
        );
        let e = pools.add_edge(a, b, 1, crate::mesh::EdgeType::Inner);
        let edge = sk.add_edge(e, a, b);
        sk.push_event(edge, Point::new(0., 0.), 10);
        sk.push_event(edge, Point::new(0., 0.), 200);
        sk.push_event(edge, Point::new(0., 0.), 200);
        let order: Vec<usize> = core::iter::from_fn(|| sk.queue.pop().map(|(_, r)| r.0)).collect();
        assert_eq!(order, vec![1, 2, 0]);

        let mut sk = Skeleton::new(EventOrder::LowestAlphaFirst);
        let edge = sk.add_edge(e, a, b);
        sk.push_event(edge, Point::new(0., 0.), 200);
        sk.push_event(edge, Point::new(0., 0.), 10);
        let first = sk.queue.pop().map(|(_, r)| r.0);
        assert_eq!(first, Some(1));
    }

    #[test]
    fn invalidated_events_lose_their_edge() {
        let mut sk = Skeleton::new(EventOrder::LowestAlphaFirst);
        let mut pools = crate::mesh::Arena::default();
        let a = pools.add_vertex(Point::new(0., 0.), 0);
        let b = pools.add_vertex(Point::new(1., 1.), 0);
        let e = pools.add_edge(a, b, 1, crate::mesh::EdgeType::Outer);
        let edge = sk.add_edge(e, a, b);
        sk.push_event(edge, Point::new(0.5, 0.5), 0);
        sk.invalidate_event(edge);
        assert!(sk.events[0].edge.is_none());
        assert_eq!(sk.ends(edge), (a, b));
    }
}
