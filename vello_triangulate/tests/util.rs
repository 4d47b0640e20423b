// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Shared helpers for building paths and measuring triangulations.

use vello_triangulate::{
    triangulate, CoverageVertex, FillRule, FillVertex, Mode, Options, Path, Point, Triangulation,
    VecVertexAllocator, WindingVertex,
};

pub(crate) type Triangle = [Point; 3];

/// A closed polygon.
pub(crate) fn polygon(points: &[(f64, f64)], rule: FillRule) -> Path {
    let mut path = Path::new(rule);
    add_contour(&mut path, points);
    path
}

/// Append a closed contour to `path`.
pub(crate) fn add_contour(path: &mut Path, points: &[(f64, f64)]) {
    let Some((first, rest)) = points.split_first() else {
        return;
    };
    path.move_to(*first);
    for p in rest {
        path.line_to(*p);
    }
    path.close();
}

/// The axis-aligned rectangle `x0..x1` by `y0..y1`, clockwise on screen.
pub(crate) fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> [(f64, f64); 4] {
    [(x0, y0), (x1, y0), (x1, y1), (x0, y1)]
}

/// A five-pointed star drawn in a single self-intersecting stroke.
pub(crate) fn pentagram(center: (f64, f64), radius: f64, rule: FillRule) -> Path {
    let points: Vec<(f64, f64)> = (0..5)
        .map(|i| {
            let angle = -std::f64::consts::FRAC_PI_2 + (i * 2) as f64 * std::f64::consts::TAU / 5.0;
            (
                center.0 + radius * angle.cos(),
                center.1 + radius * angle.sin(),
            )
        })
        .collect();
    polygon(&points, rule)
}

pub(crate) fn run(path: &Path, options: &Options) -> (Triangulation, VecVertexAllocator) {
    let mut alloc = VecVertexAllocator::new();
    let result = triangulate(path, options, &mut alloc).expect("triangulation failed");
    assert_eq!(result.vertex_count, alloc.vertex_count());
    assert_eq!(result.vertex_count % 3, 0);
    (result, alloc)
}

pub(crate) fn fill(path: &Path) -> Vec<Triangle> {
    let (_, alloc) = run(path, &Options::default());
    fill_triangles(&alloc)
}

pub(crate) fn fill_triangles(alloc: &VecVertexAllocator) -> Vec<Triangle> {
    alloc
        .vertices::<FillVertex>()
        .chunks_exact(3)
        .map(|t| [0, 1, 2].map(|i| Point::new(t[i].x, t[i].y)))
        .collect()
}

pub(crate) fn winding_triangles(path: &Path) -> Vec<(Triangle, i32)> {
    let (_, alloc) = run(path, &Options::new(Mode::Fill { emit_winding: true }));
    alloc
        .vertices::<WindingVertex>()
        .chunks_exact(3)
        .map(|t| {
            assert!(t[0].winding == t[1].winding && t[1].winding == t[2].winding);
            ([0, 1, 2].map(|i| Point::new(t[i].x, t[i].y)), t[0].winding)
        })
        .collect()
}

pub(crate) fn coverage_triangles(path: &Path) -> Vec<[CoverageVertex; 3]> {
    let (_, alloc) = run(path, &Options::new(Mode::Antialiased));
    alloc
        .vertices::<CoverageVertex>()
        .chunks_exact(3)
        .map(|t| [t[0], t[1], t[2]])
        .collect()
}

pub(crate) fn signed_area([a, b, c]: Triangle) -> f64 {
    let (ax, ay) = (a.x as f64, a.y as f64);
    let (bx, by) = (b.x as f64, b.y as f64);
    let (cx, cy) = (c.x as f64, c.y as f64);
    ((bx - ax) * (cy - ay) - (by - ay) * (cx - ax)) * 0.5
}

pub(crate) fn total_area(triangles: &[Triangle]) -> f64 {
    triangles.iter().map(|&t| signed_area(t).abs()).sum()
}

/// Area of a simple polygon, positive for clockwise on screen.
pub(crate) fn shoelace(points: &[(f64, f64)]) -> f64 {
    let n = points.len();
    (0..n)
        .map(|i| {
            let (x0, y0) = points[i];
            let (x1, y1) = points[(i + 1) % n];
            x0 * y1 - x1 * y0
        })
        .sum::<f64>()
        * 0.5
}

/// The area of each coverage triangle times its mean coverage.
pub(crate) fn covered_area(triangles: &[[CoverageVertex; 3]]) -> f64 {
    triangles
        .iter()
        .map(|t| {
            let points = t.map(|v| Point::new(v.x, v.y));
            let coverage = t.iter().map(|v| v.coverage as f64).sum::<f64>() / 3.0;
            signed_area(points).abs() * coverage
        })
        .sum()
}

pub(crate) fn assert_close(actual: f64, expected: f64, tolerance: f64) {
    assert!(
        (actual - expected).abs() <= tolerance,
        "expected {expected} ± {tolerance}, got {actual}"
    );
}
