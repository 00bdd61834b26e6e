// Copyright 2025 the Terrella Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Splitting the bound of a planar edge at a cell's center lines.

use kurbo::Point;
use terrella_cell::{UvRect, interpolate};

/// A planar edge on one cube face, in (u,v) coordinates.
///
/// The edge owns the splitting rules for its own bounding rectangle: when the
/// rectangle is cut by a vertical or horizontal line, the other coordinate at
/// the cut is where the edge itself crosses that line.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct UvEdge {
    /// Start point.
    pub a: Point,
    /// End point.
    pub b: Point,
}

impl UvEdge {
    /// Create an edge from its endpoints.
    pub const fn new(a: Point, b: Point) -> Self {
        Self { a, b }
    }

    /// The bounding rectangle of the edge.
    pub fn bound(&self) -> UvRect {
        UvRect::from_point_pair(self.a, self.b)
    }

    /// Which diagonal of the bound the edge spans: 0 for a positive slope, 1
    /// for a negative one.
    fn diag(&self) -> usize {
        usize::from((self.a.x > self.b.x) != (self.a.y > self.b.y))
    }

    /// Split `bound` (a sub-rectangle of this edge's bound) at `u`, returning
    /// the parts below and above `u`.
    ///
    /// `u` must lie in `bound.u`. The v-coordinate at the cut is interpolated
    /// along the edge and then clamped into `bound.v`, which covers an edge
    /// that does not quite reach the cut inside `bound`.
    pub fn split_u_bound(&self, bound: &UvRect, u: f64) -> [UvRect; 2] {
        let v = bound
            .v
            .clamp_point(interpolate(u, self.a.x, self.b.x, self.a.y, self.b.y));
        split_bound(bound, 0, u, self.diag(), v)
    }

    /// Split `bound` at `v`, returning the parts below and above `v`.
    ///
    /// The mirror image of [`UvEdge::split_u_bound`].
    pub fn split_v_bound(&self, bound: &UvRect, v: f64) -> [UvRect; 2] {
        let u = bound
            .u
            .clamp_point(interpolate(v, self.a.y, self.b.y, self.a.x, self.b.x));
        split_bound(bound, self.diag(), u, 0, v)
    }
}

/// Cut `bound` at the point `(u, v)` on the edge. Child 0 keeps the `u_end`
/// and `v_end` sides of the parent, child 1 keeps the opposite ones.
fn split_bound(bound: &UvRect, u_end: usize, u: f64, v_end: usize, v: f64) -> [UvRect; 2] {
    let mut first = *bound;
    first.u.set_bound(1 - u_end, u);
    first.v.set_bound(1 - v_end, v);

    let mut second = *bound;
    second.u.set_bound(u_end, u);
    second.v.set_bound(v_end, v);

    debug_assert!(
        !first.is_empty() && bound.contains(&first),
        "split produced an invalid first child: {first:?} of {bound:?}"
    );
    debug_assert!(
        !second.is_empty() && bound.contains(&second),
        "split produced an invalid second child: {second:?} of {bound:?}"
    );
    [first, second]
}
