// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tests for the strict simple-fan mode.

use crate::util::{add_contour, fill_triangles, polygon, rect, run, total_area};
use vello_triangulate::{triangulate, Error, FillRule, Mode, Options, VecVertexAllocator};

fn fan(collect_breadcrumbs: bool) -> Options {
    Options::new(Mode::SimpleFan {
        collect_breadcrumbs,
    })
}

#[test]
fn strict_bowtie_aborts() {
    let bowtie = polygon(
        &[(0., 0.), (10., 10.), (10., 0.), (0., 10.)],
        FillRule::NonZero,
    );
    let mut alloc = VecVertexAllocator::new();
    let result = triangulate(&bowtie, &fan(false), &mut alloc);
    assert!(matches!(result, Err(Error::SelfIntersection)));
    assert_eq!(alloc.vertex_count(), 0);

    // The general fill handles it.
    let (result, alloc) = run(&bowtie, &Options::default());
    assert_eq!(result.vertex_count, 6);
    assert_eq!(total_area(&fill_triangles(&alloc)), 50.0);
}

#[test]
fn strict_keeps_collinear_vertices() {
    let points = [(0., 0.), (5., 0.), (10., 0.), (10., 10.), (0., 10.)];
    let path = polygon(&points, FillRule::NonZero);
    let (result, alloc) = run(&path, &fan(false));
    assert_eq!(result.vertex_count, 9);
    assert_eq!(total_area(&fill_triangles(&alloc)), 100.0);

    let (result, _) = run(&path, &Options::default());
    assert_eq!(result.vertex_count, 6);
}

#[test]
fn strict_breadcrumbs_for_double_winding() {
    let square = rect(0., 0., 10., 10.);
    let mut path = polygon(&square, FillRule::NonZero);
    add_contour(&mut path, &square);
    let (result, alloc) = run(&path, &fan(true));
    assert_eq!(result.vertex_count, 6);
    assert_eq!(total_area(&fill_triangles(&alloc)), 100.0);
    assert_eq!(result.breadcrumbs.len(), 2);
    assert!(result.breadcrumbs.iter().all(|b| b.winding == 1));

    let (result, _) = run(&path, &fan(false));
    assert!(result.breadcrumbs.is_empty());
}

#[test]
fn strict_even_odd_has_no_breadcrumbs() {
    let square = rect(0., 0., 10., 10.);
    let mut path = polygon(&square, FillRule::EvenOdd);
    add_contour(&mut path, &square);
    let (result, _) = run(&path, &fan(true));
    assert_eq!(result.vertex_count, 0);
    assert!(result.breadcrumbs.is_empty());
}
