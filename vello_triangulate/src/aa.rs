// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The antialiasing pipeline: boundary rings, overlap collapse and the coverage ribbon.

use log::{debug, log_enabled, Level};

use crate::collapse::EventOrder;
use crate::mesh::{EdgeId, VertexList};
use crate::monotone::PolyId;
use crate::simplify::SimplifyResult;
use crate::triangulator::{ModeState, Triangulator};
use crate::writer::TriangleSink;
use crate::Error;

impl Triangulator {
    /// Turn a simplified mesh into monotone polygons carrying coverage.
    ///
    /// If neither ring needed intersection resolution or collapsing, only the inner ring is
    /// tessellated and the outer ring is kept for [`emit_ribbons`](Self::emit_ribbons).
    /// Otherwise both rings are stitched together and tessellated as one mesh.
    pub(crate) fn tessellate_antialiased(
        &mut self,
        mesh: VertexList,
    ) -> Result<Vec<PolyId>, Error> {
        let mut inner = VertexList::EMPTY;
        let mut outer = VertexList::EMPTY;
        self.extract_boundaries(&mesh, &mut inner, &mut outer);
        self.sort_mesh(&mut inner);
        self.sort_mesh(&mut outer);
        self.merge_coincident_vertices(&mut inner);
        let mut complex = self.merge_coincident_vertices(&mut outer);
        complex |= self.simplify(&mut inner)? == SimplifyResult::FoundSelfIntersection;
        complex |= self.simplify(&mut outer)? == SimplifyResult::FoundSelfIntersection;
        if log_enabled!(Level::Trace) {
            self.arena.dump("inner mesh before collapse", &inner);
            self.arena.dump("outer mesh before collapse", &outer);
        }
        complex |= self.collapse_overlap_regions(&mut inner, EventOrder::HighestAlphaFirst);
        complex |= self.collapse_overlap_regions(&mut outer, EventOrder::LowestAlphaFirst);
        if complex {
            debug!("found complex mesh; taking slow path");
            self.connect_partners(&outer);
            self.connect_partners(&inner);
            let mut merged = self.sorted_merge(inner, outer);
            self.merge_coincident_vertices(&mut merged);
            self.simplify(&mut merged)?;
            self.state = ModeState::Antialiased {
                outer_mesh: VertexList::EMPTY,
            };
            Ok(self.tessellate(&merged))
        } else {
            debug!("no complex polygons; taking fast path");
            let polys = self.tessellate(&inner);
            self.state = ModeState::Antialiased { outer_mesh: outer };
            Ok(polys)
        }
    }

    /// Edges of the outer ring that still need a coverage ribbon.
    pub(crate) fn ribbon_edges(&self) -> Vec<EdgeId> {
        let ModeState::Antialiased { outer_mesh } = &self.state else {
            return Vec::new();
        };
        let mut edges = Vec::new();
        let mut cursor = outer_mesh.head;
        while let Some(v) = cursor {
            let mut below = self.arena.vertices[v].below.head;
            while let Some(e) = below {
                edges.push(e);
                below = self.arena.edges[e].below.next;
            }
            cursor = self.arena.vertices[v].links.next;
        }
        edges
    }

    /// Emit two triangles per outer edge, spanning it and the matching inner ring segment.
    pub(crate) fn emit_ribbons(&self, edges: &[EdgeId], sink: &mut impl TriangleSink) {
        let a = &self.arena;
        for &e in edges {
            let edge = &a.edges[e];
            let (top, bottom) = (edge.top, edge.bottom);
            let (Some(top_partner), Some(bottom_partner)) =
                (a.vertices[top].partner, a.vertices[bottom].partner)
            else {
                continue;
            };
            let [v0, v1, v2, v3] =
                [top, bottom, bottom_partner, top_partner].map(|v| &a.vertices[v]);
            sink.triangle([v0, v1, v2], 0);
            sink.triangle([v0, v2, v3], 0);
        }
    }
}
