// Copyright 2025 the Terrella Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Closed intervals and axis-aligned rectangles in face (u,v) coordinates.

use kurbo::Point;

/// A closed interval `[lo, hi]` on the real line.
///
/// The interval is empty when `lo > hi`. A single point is a valid, non-empty
/// interval of zero length.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Interval {
    /// Lower endpoint.
    pub lo: f64,
    /// Upper endpoint.
    pub hi: f64,
}

impl Interval {
    /// Create an interval from its endpoints.
    pub const fn new(lo: f64, hi: f64) -> Self {
        Self { lo, hi }
    }

    /// The canonical empty interval.
    pub const fn empty() -> Self {
        Self { lo: 1.0, hi: 0.0 }
    }

    /// The smallest interval containing both values.
    pub fn from_point_pair(a: f64, b: f64) -> Self {
        if a <= b {
            Self::new(a, b)
        } else {
            Self::new(b, a)
        }
    }

    /// True if the interval contains no points.
    pub fn is_empty(&self) -> bool {
        self.lo > self.hi
    }

    /// Length of the interval; negative when empty.
    pub fn length(&self) -> f64 {
        self.hi - self.lo
    }

    /// Midpoint of the interval.
    pub fn center(&self) -> f64 {
        0.5 * (self.lo + self.hi)
    }

    /// Endpoint by index: 0 is `lo`, 1 is `hi`.
    #[inline]
    pub fn bound(&self, end: usize) -> f64 {
        debug_assert!(end < 2, "interval endpoint index out of range: {end}");
        if end == 0 { self.lo } else { self.hi }
    }

    /// Set the endpoint at `end` (0 is `lo`, 1 is `hi`).
    #[inline]
    pub fn set_bound(&mut self, end: usize, value: f64) {
        debug_assert!(end < 2, "interval endpoint index out of range: {end}");
        if end == 0 {
            self.lo = value;
        } else {
            self.hi = value;
        }
    }

    /// Whether `p` lies in the closed interval.
    pub fn contains(&self, p: f64) -> bool {
        self.lo <= p && p <= self.hi
    }

    /// Whether `other` is a subset of this interval. Empty sets are contained by everything.
    pub fn contains_interval(&self, other: &Self) -> bool {
        if other.is_empty() {
            return true;
        }
        self.lo <= other.lo && other.hi <= self.hi
    }

    /// Whether the two intervals share at least one point.
    pub fn intersects(&self, other: &Self) -> bool {
        if self.lo <= other.lo {
            other.lo <= self.hi && other.lo <= other.hi
        } else {
            self.lo <= other.hi && self.lo <= self.hi
        }
    }

    /// The closest point of the interval to `p`. The interval must not be empty.
    #[inline]
    pub fn clamp_point(&self, p: f64) -> f64 {
        debug_assert!(!self.is_empty(), "cannot clamp to an empty interval");
        self.lo.max(p.min(self.hi))
    }

    /// The interval grown by `margin` on both sides. Empty intervals stay empty.
    pub fn expanded(&self, margin: f64) -> Self {
        if self.is_empty() {
            return *self;
        }
        Self::new(self.lo - margin, self.hi + margin)
    }
}

/// An axis-aligned rectangle in (u,v) space, stored as one [`Interval`] per axis.
///
/// Axis 0 is `u` (the `x` of a [`Point`]) and axis 1 is `v` (the `y`).
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct UvRect {
    /// Extent along the u-axis.
    pub u: Interval,
    /// Extent along the v-axis.
    pub v: Interval,
}

impl UvRect {
    /// Create a rectangle from its two axis intervals.
    pub const fn new(u: Interval, v: Interval) -> Self {
        Self { u, v }
    }

    /// The canonical empty rectangle.
    pub const fn empty() -> Self {
        Self {
            u: Interval::empty(),
            v: Interval::empty(),
        }
    }

    /// The bounding rectangle of a pair of points.
    ///
    /// A degenerate pair (`a == b`) yields a zero-area, non-empty rectangle.
    pub fn from_point_pair(a: Point, b: Point) -> Self {
        Self {
            u: Interval::from_point_pair(a.x, b.x),
            v: Interval::from_point_pair(a.y, b.y),
        }
    }

    /// The interval along `axis` (0 = u, 1 = v).
    #[inline]
    pub fn axis(&self, axis: usize) -> &Interval {
        debug_assert!(axis < 2, "rectangle axis out of range: {axis}");
        if axis == 0 { &self.u } else { &self.v }
    }

    /// Mutable access to the interval along `axis` (0 = u, 1 = v).
    #[inline]
    pub fn axis_mut(&mut self, axis: usize) -> &mut Interval {
        debug_assert!(axis < 2, "rectangle axis out of range: {axis}");
        if axis == 0 { &mut self.u } else { &mut self.v }
    }

    /// True if either axis interval is empty.
    pub fn is_empty(&self) -> bool {
        self.u.is_empty() || self.v.is_empty()
    }

    /// The lower-left corner.
    pub fn lo(&self) -> Point {
        Point::new(self.u.lo, self.v.lo)
    }

    /// The upper-right corner.
    pub fn hi(&self) -> Point {
        Point::new(self.u.hi, self.v.hi)
    }

    /// The center of the rectangle.
    pub fn center(&self) -> Point {
        Point::new(self.u.center(), self.v.center())
    }

    /// The corner selected by `i` (u endpoint) and `j` (v endpoint).
    pub fn vertex(&self, i: usize, j: usize) -> Point {
        Point::new(self.u.bound(i), self.v.bound(j))
    }

    /// Whether `p` lies in the closed rectangle.
    pub fn contains_point(&self, p: Point) -> bool {
        self.u.contains(p.x) && self.v.contains(p.y)
    }

    /// Whether `other` is a subset of this rectangle.
    pub fn contains(&self, other: &Self) -> bool {
        self.u.contains_interval(&other.u) && self.v.contains_interval(&other.v)
    }

    /// Whether the two rectangles share at least one point.
    pub fn intersects(&self, other: &Self) -> bool {
        self.u.intersects(&other.u) && self.v.intersects(&other.v)
    }

    /// The rectangle grown by `margin` on every side.
    pub fn expanded(&self, margin: f64) -> Self {
        Self {
            u: self.u.expanded(margin),
            v: self.v.expanded(margin),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_pair_orders_endpoints() {
        let i = Interval::from_point_pair(0.5, -0.25);
        assert_eq!(i, Interval::new(-0.25, 0.5));
        assert!(!Interval::from_point_pair(0.3, 0.3).is_empty());
        assert!(Interval::empty().is_empty());
    }

    #[test]
    fn clamp_and_bounds() {
        let mut i = Interval::new(-1.0, 1.0);
        assert_eq!(i.clamp_point(3.0), 1.0);
        assert_eq!(i.clamp_point(-3.0), -1.0);
        assert_eq!(i.clamp_point(0.25), 0.25);
        i.set_bound(1, 0.5);
        assert_eq!(i.bound(1), 0.5);
        assert_eq!(i.bound(0), -1.0);
    }

    #[test]
    fn interval_containment_and_intersection() {
        let outer = Interval::new(0.0, 1.0);
        assert!(outer.contains_interval(&Interval::new(0.0, 0.5)));
        assert!(outer.contains_interval(&Interval::empty()));
        assert!(!outer.contains_interval(&Interval::new(0.5, 1.5)));
        assert!(outer.intersects(&Interval::new(1.0, 2.0)));
        assert!(!outer.intersects(&Interval::new(1.5, 2.0)));
        assert!(!outer.intersects(&Interval::empty()));
    }

    #[test]
    fn rect_from_degenerate_pair_is_not_empty() {
        let p = Point::new(0.1, -0.2);
        let r = UvRect::from_point_pair(p, p);
        assert!(!r.is_empty());
        assert!(r.contains_point(p));
        assert_eq!(r.lo(), r.hi());
    }

    #[test]
    fn rect_vertices_and_containment() {
        let r = UvRect::from_point_pair(Point::new(1.0, 0.0), Point::new(0.0, 2.0));
        assert_eq!(r.vertex(0, 1), Point::new(0.0, 2.0));
        assert_eq!(r.vertex(1, 0), Point::new(1.0, 0.0));
        let inner = UvRect::from_point_pair(Point::new(0.25, 0.5), Point::new(0.75, 1.5));
        assert!(r.contains(&inner));
        assert!(!inner.contains(&r));
        assert!(r.intersects(&inner));
        assert!(r.expanded(0.5).contains_point(Point::new(-0.5, 2.5)));
    }
}
