// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tests for fill rules, including overlapping and inverse fills.

use crate::util::{
    add_contour, fill, fill_triangles, pentagram, polygon, rect, run, signed_area, total_area,
    winding_triangles,
};
use vello_triangulate::kurbo::Rect;
use vello_triangulate::{FillRule, Options};

fn reversed(points: [(f64, f64); 4]) -> [(f64, f64); 4] {
    let mut points = points;
    points.reverse();
    points
}

#[test]
fn fill_rule_overlap_same_direction() {
    let a = rect(0., 0., 10., 10.);
    let b = rect(5., 5., 15., 15.);
    let mut nonzero = polygon(&a, FillRule::NonZero);
    add_contour(&mut nonzero, &b);
    let mut even_odd = nonzero.clone();
    even_odd.set_fill_rule(FillRule::EvenOdd);
    assert_eq!(total_area(&fill(&nonzero)), 175.0);
    assert_eq!(total_area(&fill(&even_odd)), 150.0);
}

#[test]
fn fill_rule_overlap_opposite_direction() {
    let mut path = polygon(&rect(0., 0., 10., 10.), FillRule::NonZero);
    add_contour(&mut path, &reversed(rect(5., 5., 15., 15.)));
    assert_eq!(total_area(&fill(&path)), 150.0);
    path.set_fill_rule(FillRule::EvenOdd);
    assert_eq!(total_area(&fill(&path)), 150.0);
}

#[test]
fn fill_rule_hole() {
    let mut path = polygon(&rect(0., 0., 10., 10.), FillRule::NonZero);
    add_contour(&mut path, &reversed(rect(2., 2., 8., 8.)));
    assert_eq!(total_area(&fill(&path)), 64.0);

    let mut same = polygon(&rect(0., 0., 10., 10.), FillRule::EvenOdd);
    add_contour(&mut same, &rect(2., 2., 8., 8.));
    assert_eq!(total_area(&fill(&same)), 64.0);
    same.set_fill_rule(FillRule::NonZero);
    assert_eq!(total_area(&fill(&same)), 100.0);
}

#[test]
fn fill_rule_star_center() {
    let nonzero = total_area(&fill(&pentagram((50., 50.), 40., FillRule::NonZero)));
    let even_odd = total_area(&fill(&pentagram((50., 50.), 40., FillRule::EvenOdd)));
    // The central pentagon has winding two, so only the nonzero rule fills it. Its area is
    // about 0.3469 r^2 for a star of outer radius r.
    let pentagon = 0.3469 * 40. * 40.;
    assert!((nonzero - even_odd - pentagon).abs() < 2.0, "{nonzero} {even_odd}");
}

#[test]
fn fill_rule_winding_counts_overlap() {
    let mut path = polygon(&rect(0., 0., 10., 10.), FillRule::NonZero);
    add_contour(&mut path, &rect(5., 5., 15., 15.));
    let triangles = winding_triangles(&path);
    let doubled: f64 = triangles
        .iter()
        .filter(|(_, w)| w.abs() == 2)
        .map(|&(t, _)| signed_area(t).abs())
        .sum();
    assert_eq!(doubled, 25.0);
}

#[test]
fn fill_rule_inverse() {
    let clip = Rect::new(0., 0., 20., 20.);
    let options = Options::default().with_clip_bounds(clip);
    for rule in [FillRule::InverseNonZero, FillRule::InverseEvenOdd] {
        for square in [rect(5., 5., 15., 15.), reversed(rect(5., 5., 15., 15.))] {
            let path = polygon(&square, rule);
            let (_, alloc) = run(&path, &options);
            let area = total_area(&fill_triangles(&alloc));
            assert_eq!(area, 300.0, "{rule:?}");
        }
    }
}

#[test]
fn fill_rule_inverse_of_nothing_is_the_clip() {
    let options = Options::default().with_clip_bounds(Rect::new(0., 0., 30., 10.));
    let path = vello_triangulate::Path::new(FillRule::InverseNonZero);
    let (result, alloc) = run(&path, &options);
    assert_eq!(result.vertex_count, 6);
    assert_eq!(total_area(&fill_triangles(&alloc)), 300.0);
}
