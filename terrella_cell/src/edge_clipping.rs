// Copyright 2025 the Terrella Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Clipping geodesic edges to cube faces, and planar edges to rectangles.
//!
//! A geodesic edge AB is represented on the cube by the sequence of
//! [`FaceSegment`]s it crosses. Each segment is a straight line in the (u,v)
//! coordinates of its face, which is what makes a planar quadtree walk over the
//! face possible.
//!
//! All of the predicates that decide which face an edge leaves through work on
//! the normal of the plane containing AB, expressed in the (u,v,w) frame of the
//! face. That normal is the single source of truth for where the line goes, so
//! consecutive faces always agree with each other even under rounding.

use glam::DVec3;
use kurbo::Point;
use smallvec::SmallVec;

use crate::coords::{
    face, face_uv_to_xyz, face_xyz_to_uvw, uvw_face, valid_face_xyz_to_uv, xyz_to_face_uv,
};
use crate::interval::UvRect;

/// Maximum error in a u- or v-coordinate of a point produced by [`face_segments`]
/// or [`clip_to_padded_face`], relative to the exact edge.
pub const FACE_CLIP_ERROR_UV_COORD: f64 = 9.0 * core::f64::consts::FRAC_1_SQRT_2 * f64::EPSILON;

/// Maximum angle between a clipped vertex and the nearest point on the exact edge.
pub const FACE_CLIP_ERROR_RADIANS: f64 = 3.0 * f64::EPSILON;

/// Maximum error in a u- or v-coordinate when clipping a planar edge to a rectangle.
pub const EDGE_CLIP_ERROR_UV_COORD: f64 = 2.25 * f64::EPSILON;

/// Distance within which [`intersects_rect`] may report either answer.
pub const INTERSECTS_RECT_ERROR_UV_DIST: f64 = 3.0 * core::f64::consts::SQRT_2 * f64::EPSILON;

const MAX_SAFE_UV_COORD: f64 = 1.0 - FACE_CLIP_ERROR_UV_COORD;

/// The portion of a geodesic edge that lies on one cube face.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct FaceSegment {
    /// Cube face (0..=5).
    pub face: u8,
    /// Start of the segment in the face's (u,v) coordinates.
    pub a: Point,
    /// End of the segment in the face's (u,v) coordinates.
    pub b: Point,
}

/// Storage for the face segments of one edge. An edge shorter than a half
/// great circle crosses at most six faces, so this never spills.
pub type FaceSegmentVec = SmallVec<[FaceSegment; 6]>;

/// A vector orthogonal to `a`, stable for every input.
fn ortho(a: DVec3) -> DVec3 {
    let abs = a.abs();
    let largest = if abs.x > abs.y {
        if abs.x > abs.z { 0 } else { 2 }
    } else if abs.y > abs.z {
        1
    } else {
        2
    };
    let mut temp = DVec3::new(0.012, 0.0053, 0.00457);
    temp[(largest + 2) % 3] = 1.0;
    a.cross(temp).normalize()
}

/// A vector orthogonal to both `a` and `b`, with the orientation of `a × b`.
///
/// Computed as `(b + a) × (b - a)`, which stays accurate when the two points
/// are nearly identical. When `a` and `b` are equal (or exactly antipodal) an
/// arbitrary vector orthogonal to `a` is returned instead of zero.
pub fn robust_cross_prod(a: DVec3, b: DVec3) -> DVec3 {
    let x = (b + a).cross(b - a);
    if x != DVec3::ZERO { x } else { ortho(a) }
}

// The predicates below compare a sum `u + v` against a third value `w` using
// only ordinary floating point, yet produce the exact answer: if `u + v < w` in
// exact arithmetic then at least one of `u + v < w`, `u < w - v`, `v < w - u`
// holds in floating point.

fn sum_equal(u: f64, v: f64, w: f64) -> bool {
    (u + v == w) && (u == w - v) && (v == w - u)
}

/// Whether the line with normal `n` (in a face's (u,v,w) frame) crosses the face
/// square, i.e. `|n.u| + |n.v| >= |n.w|`.
fn intersects_face(n: DVec3) -> bool {
    let (u, v, w) = (n.x.abs(), n.y.abs(), n.z.abs());
    (v >= w - u) && (u >= w - v)
}

/// Whether the line with normal `n` crosses two opposite edges of the face
/// square (including passing exactly through a corner).
fn intersects_opposite_edges(n: DVec3) -> bool {
    let (u, v, w) = (n.x.abs(), n.y.abs(), n.z.abs());
    let diff = (u - v).abs();
    if diff != w {
        return diff >= w;
    }
    if u >= v { u - w >= v } else { v - w >= u }
}

/// The axis (0 = u, 1 = v) through whose edge the directed line `n` leaves the face.
fn exit_axis(n: DVec3) -> usize {
    if intersects_opposite_edges(n) {
        return if n.x.abs() >= n.y.abs() { 1 } else { 0 };
    }
    let odd_negatives = n.x.is_sign_negative() ^ n.y.is_sign_negative() ^ n.z.is_sign_negative();
    if odd_negatives { 0 } else { 1 }
}

/// The (u,v) point where the directed line `n` leaves the face along `axis`.
fn exit_point(n: DVec3, axis: usize) -> Point {
    if axis == 0 {
        let u = if n.y > 0.0 { 1.0 } else { -1.0 };
        Point::new(u, (-u * n.x - n.z) / n.y)
    } else {
        let v = if n.x < 0.0 { 1.0 } else { -1.0 };
        Point::new((-v * n.y - n.z) / n.x, v)
    }
}

/// Reproject the origin of AB onto a neighboring face if the computed line AB
/// does not actually leave `face` in the direction of B.
///
/// The normal `ab` is only approximately perpendicular to A, so when A sits
/// within rounding error of a face edge the line may miss A's face entirely,
/// or leave it behind A. A is then moved onto the adjacent face that the line
/// approaches, which shifts it by no more than the clipping tolerance.
fn move_origin_to_valid_face(face: u8, a: DVec3, ab: DVec3, a_uv: Point) -> (u8, Point) {
    if a_uv.x.abs().max(a_uv.y.abs()) <= MAX_SAFE_UV_COORD {
        return (face, a_uv);
    }

    let n = face_xyz_to_uvw(face, ab);
    if intersects_face(n) {
        let exit = face_uv_to_xyz(face, exit_point(n, exit_axis(n)));
        let a_tangent = ab.normalize().cross(a);
        if (exit - a).dot(a_tangent) >= -FACE_CLIP_ERROR_RADIANS {
            return (face, a_uv);
        }
    }

    // A line that misses a face crosses all four of its neighbors.
    let next = if a_uv.x.abs() >= a_uv.y.abs() {
        uvw_face(face, 0, a_uv.x > 0.0)
    } else {
        uvw_face(face, 1, a_uv.y > 0.0)
    };
    let uv = valid_face_xyz_to_uv(next, a);
    (
        next,
        Point::new(uv.x.clamp(-1.0, 1.0), uv.y.clamp(-1.0, 1.0)),
    )
}

/// The face entered after leaving `face` through `exit` along `axis`.
///
/// When the line passes exactly through a corner, either neighbor is valid; the
/// target face is preferred so that the walk always terminates on it.
fn next_face(face: u8, exit: Point, axis: usize, n: DVec3, target_face: u8) -> u8 {
    let (along, across) = if axis == 0 {
        (exit.x, exit.y)
    } else {
        (exit.y, exit.x)
    };
    if across.abs() == 1.0
        && uvw_face(face, 1 - axis, across > 0.0) == target_face
        && sum_equal(exit.x * n.x, exit.y * n.y, -n.z)
    {
        return target_face;
    }
    uvw_face(face, axis, along > 0.0)
}

/// Subdivide the edge AB at every cube-face boundary it crosses.
///
/// `out` is cleared and filled with the segments in order from A toward B.
/// Consecutive segments meet at a shared point on the common face edge, and
/// every returned coordinate lies in `[-1, 1]`. The input points must be unit
/// length and must not be antipodal.
pub fn face_segments(a: DVec3, b: DVec3, out: &mut FaceSegmentVec) {
    out.clear();
    let (a_face, a_uv) = xyz_to_face_uv(a);
    let (b_face, b_uv) = xyz_to_face_uv(b);
    if a_face == b_face {
        out.push(FaceSegment {
            face: a_face,
            a: a_uv,
            b: b_uv,
        });
        return;
    }

    // The normal of AB decides every question about where the line goes.
    let ab = robust_cross_prod(a, b);
    let (a_face, a_uv) = move_origin_to_valid_face(a_face, a, ab, a_uv);
    let (b_face, b_uv) = move_origin_to_valid_face(b_face, b, -ab, b_uv);

    let mut segment = FaceSegment {
        face: a_face,
        a: a_uv,
        b: b_uv,
    };
    let mut face = a_face;
    while face != b_face {
        let n = face_xyz_to_uvw(face, ab);
        let axis = exit_axis(n);
        segment.b = exit_point(n, axis);
        out.push(segment);

        let exit_xyz = face_uv_to_xyz(face, segment.b);
        face = next_face(face, segment.b, axis, n, b_face);
        let exit_uvw = face_xyz_to_uvw(face, exit_xyz);
        segment.face = face;
        segment.a = Point::new(exit_uvw.x, exit_uvw.y);
    }
    segment.b = b_uv;
    out.push(segment);
}

/// Clip one endpoint of AB to the face whose (u,v,w) frame all arguments use.
///
/// Returns the clipped (u,v) of `b` together with a score in `0..=3`. If the
/// scores of both endpoints sum to 3 or more, AB misses the face.
fn clip_destination(
    a: DVec3,
    b: DVec3,
    scaled_n: DVec3,
    a_tangent: DVec3,
    b_tangent: DVec3,
    scale_uv: f64,
) -> (Point, u8) {
    if b.z > 0.0 {
        let uv = Point::new(b.x / b.z, b.y / b.z);
        if uv.x.abs().max(uv.y.abs()) < MAX_SAFE_UV_COORD {
            return (uv, 0);
        }
    }

    let exit = exit_point(scaled_n, exit_axis(scaled_n));
    let uv = Point::new(scale_uv * exit.x, scale_uv * exit.y);
    let p = DVec3::new(uv.x, uv.y, 1.0);

    // The exit point is usable only when it lies between A and B.
    let score = if (p - a).dot(a_tangent) < 0.0 {
        2
    } else if (p - b).dot(b_tangent) < 0.0 {
        1
    } else {
        0
    };
    if score == 0 {
        return (uv, 0);
    }
    if b.z <= 0.0 {
        return (uv, 3);
    }
    (Point::new(b.x / b.z, b.y / b.z), score)
}

/// The (u,v) coordinates of the portion of AB on `face`, or `None` if AB misses it.
///
/// The results lie within `[-1, 1]` and within [`FACE_CLIP_ERROR_UV_COORD`] of
/// the exact edge, but may differ slightly from those of [`face_segments`].
pub fn clip_to_face(a: DVec3, b: DVec3, face: u8) -> Option<(Point, Point)> {
    clip_to_padded_face(a, b, face, 0.0)
}

/// Like [`clip_to_face`], but clips to the square `[-R, R]²` where `R = 1 + padding`.
///
/// `padding` must be non-negative.
pub fn clip_to_padded_face(a: DVec3, b: DVec3, face: u8, padding: f64) -> Option<(Point, Point)> {
    debug_assert!(padding >= 0.0, "padding must be non-negative: {padding}");
    if self::face(a) == face && self::face(b) == face {
        return Some((valid_face_xyz_to_uv(face, a), valid_face_xyz_to_uv(face, b)));
    }

    // The cross product is taken in (x,y,z) before changing frames.
    let mut n = face_xyz_to_uvw(face, robust_cross_prod(a, b));
    let a_uvw = face_xyz_to_uvw(face, a);
    let b_uvw = face_xyz_to_uvw(face, b);

    // Scaling the normal's u and v components makes every predicate see the
    // padded square `[-R, R]²` instead of the unit one.
    let scale_uv = 1.0 + padding;
    let scaled_n = DVec3::new(scale_uv * n.x, scale_uv * n.y, n.z);
    if !intersects_face(scaled_n) {
        return None;
    }

    // Normalizing a tiny vector underflows; rescale it first.
    if n.abs().max_element() < 2_f64.powi(-511) {
        n *= 2_f64.powi(563);
    }
    let n = n.normalize();
    let a_tangent = n.cross(a_uvw);
    let b_tangent = b_uvw.cross(n);
    let (a_uv, a_score) = clip_destination(b_uvw, a_uvw, -scaled_n, b_tangent, a_tangent, scale_uv);
    let (b_uv, b_score) = clip_destination(a_uvw, b_uvw, scaled_n, a_tangent, b_tangent, scale_uv);
    (a_score + b_score < 3).then_some((a_uv, b_uv))
}

/// The value that is the same combination of `a1` and `b1` as `x` is of `a` and `b`.
///
/// Interpolation starts from whichever of `a`, `b` is closer to `x`, so
/// `x == a` yields exactly `a1`, `x == b` yields exactly `b1`, and
/// `a <= x <= b` yields a value between `a1` and `b1`. Requires `a != b`.
#[inline]
pub fn interpolate(x: f64, a: f64, b: f64, a1: f64, b1: f64) -> f64 {
    debug_assert!(a != b, "interpolation needs distinct endpoints");
    if (a - x).abs() <= (b - x).abs() {
        a1 + (b1 - a1) * (x - a) / (b - a)
    } else {
        b1 + (a1 - b1) * (x - b) / (a - b)
    }
}

/// Whether the planar segment AB meets the closed rectangle `rect`.
///
/// If some point of AB is inside `rect` by at least
/// [`INTERSECTS_RECT_ERROR_UV_DIST`] the answer is `true`; if all of AB is
/// outside by at least that distance it is `false`.
pub fn intersects_rect(a: Point, b: Point, rect: &UvRect) -> bool {
    if !rect.intersects(&UvRect::from_point_pair(a, b)) {
        return false;
    }
    // The bounds overlap, so AB meets `rect` unless all four corners lie
    // strictly on one side of the line. Checking the two extreme corners along
    // the line's normal is enough.
    let n = (b - a).turn_90();
    let i = usize::from(n.x >= 0.0);
    let j = usize::from(n.y >= 0.0);
    let max = n.dot(rect.vertex(i, j) - a);
    let min = n.dot(rect.vertex(1 - i, 1 - j) - a);
    max >= 0.0 && min <= 0.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interval::Interval;
    use proptest::prelude::*;

    fn unit(x: f64, y: f64, z: f64) -> DVec3 {
        DVec3::new(x, y, z).normalize()
    }

    fn sphere_point(face: u8, uv: Point) -> DVec3 {
        face_uv_to_xyz(face, uv).normalize()
    }

    #[test]
    fn face_predicates() {
        let root = (2.0_f64 / 3.0).sqrt();
        assert!(!intersects_face(DVec3::new(0.169258, -0.169258, 0.664013)));
        assert!(intersects_face(DVec3::new(root, -root, 3.88578e-16)));
        assert!(intersects_face(DVec3::new(3.88578e-16, -root, root)));
        assert!(!intersects_opposite_edges(DVec3::new(0.169258, -0.169258, 0.664013)));
        let four = (4.0_f64 / 3.0).sqrt();
        assert!(intersects_opposite_edges(DVec3::new(four, 0.0, -four)));
        assert!(!intersects_opposite_edges(DVec3::new(-root, -root, 1.66533453694e-16)));
    }

    #[test]
    fn exit_point_lies_on_line() {
        for n in [
            DVec3::new(0.3, 0.9, 0.1),
            DVec3::new(-0.7, 0.2, -0.3),
            DVec3::new(0.5, -0.5, 0.2),
        ] {
            let axis = exit_axis(n);
            let p = exit_point(n, axis);
            let (along, across) = if axis == 0 { (p.x, p.y) } else { (p.y, p.x) };
            assert_eq!(along.abs(), 1.0, "exit on the face edge for {n:?}");
            assert!(across.abs() <= 1.0, "exit within the edge for {n:?}");
            let residual = n.dot(DVec3::new(p.x, p.y, 1.0));
            assert!(residual.abs() < 1e-15, "exit on the line for {n:?}");
        }
    }

    #[test]
    fn same_face_is_one_segment() {
        let a = sphere_point(2, Point::new(0.1, 0.2));
        let b = sphere_point(2, Point::new(-0.4, 0.5));
        let mut out = FaceSegmentVec::new();
        face_segments(a, b, &mut out);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].face, 2);
        assert!((out[0].a - Point::new(0.1, 0.2)).hypot() < 1e-15, "a = {:?}", out[0].a);
        assert!((out[0].b - Point::new(-0.4, 0.5)).hypot() < 1e-15, "b = {:?}", out[0].b);
    }

    #[test]
    fn adjacent_faces_meet_on_shared_edge() {
        let a = unit(1.0, 0.2, 0.1);
        let b = unit(0.2, 1.0, 0.1);
        let mut out = FaceSegmentVec::new();
        face_segments(a, b, &mut out);
        assert_eq!(out.len(), 2);
        assert_eq!((out[0].face, out[1].face), (0, 1));
        // Leaving +x through u = 1 enters +y through u = -1.
        assert_eq!(out[0].b.x, 1.0);
        assert!((out[1].a.x + 1.0).abs() < 1e-15, "entry {:?}", out[1].a);
        assert!((out[0].b.y - out[1].a.y).abs() < 1e-15, "shared edge point");
    }

    #[test]
    fn buffer_is_cleared() {
        let mut out = FaceSegmentVec::new();
        face_segments(unit(1.0, 0.2, 0.1), unit(0.2, 1.0, 0.1), &mut out);
        face_segments(unit(1.0, 0.0, 0.0), unit(1.0, 0.1, 0.0), &mut out);
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn clip_to_adjacent_face() {
        let a = unit(1.0, 0.2, 0.1);
        let b = unit(0.2, 1.0, 0.1);
        let (a_uv, b_uv) = clip_to_face(a, b, 1).expect("edge crosses +y");
        assert!((a_uv.x + 1.0).abs() < 1e-14, "clipped start {a_uv:?}");
        assert!((b_uv - valid_face_xyz_to_uv(1, b)).hypot() < 1e-15, "end {b_uv:?}");

        let (a_uv, b_uv) = clip_to_face(a, b, 0).expect("edge starts on +x");
        assert!((a_uv - valid_face_xyz_to_uv(0, a)).hypot() < 1e-15, "start {a_uv:?}");
        assert!((b_uv.x - 1.0).abs() < 1e-14, "clipped end {b_uv:?}");

        assert_eq!(clip_to_face(a, b, 4), None);
    }

    #[test]
    fn clip_on_face_fast_path() {
        let a = sphere_point(3, Point::new(0.5, 0.5));
        let b = sphere_point(3, Point::new(-0.5, 0.25));
        let (a_uv, b_uv) = clip_to_face(a, b, 3).expect("both endpoints on face");
        assert!((a_uv - Point::new(0.5, 0.5)).hypot() < 1e-15, "a {a_uv:?}");
        assert!((b_uv - Point::new(-0.5, 0.25)).hypot() < 1e-15, "b {b_uv:?}");
    }

    #[test]
    fn interpolate_is_exact_at_endpoints() {
        assert_eq!(interpolate(0.25, 0.25, 0.75, -1.0, 3.0), -1.0);
        assert_eq!(interpolate(0.75, 0.25, 0.75, -1.0, 3.0), 3.0);
        assert_eq!(interpolate(0.5, 0.25, 0.75, -1.0, 3.0), 1.0);
        // Constant output range stays constant.
        assert_eq!(interpolate(0.3, 0.0, 1.0, 0.7, 0.7), 0.7);
    }

    #[test]
    fn rect_intersection() {
        let rect = UvRect::new(Interval::new(0.0, 1.0), Interval::new(0.0, 1.0));
        assert!(intersects_rect(Point::new(-1.0, -1.0), Point::new(2.0, 2.0), &rect));
        assert!(intersects_rect(Point::new(0.5, 0.5), Point::new(0.5, 0.5), &rect));
        // Bounds overlap but the line passes above the (0, 1) corner.
        assert!(!intersects_rect(Point::new(-1.0, 0.5), Point::new(0.5, 2.0), &rect));
        assert!(!intersects_rect(Point::new(2.0, 0.0), Point::new(3.0, 1.0), &rect));
        // Touching a corner counts.
        assert!(intersects_rect(Point::new(1.0, 1.0), Point::new(2.0, 2.0), &rect));
    }

    #[test]
    fn robust_cross_of_equal_points() {
        let a = unit(0.3, -0.4, 0.5);
        let n = robust_cross_prod(a, a);
        assert!(n.length() > 0.5, "non-degenerate normal");
        assert!(n.dot(a).abs() < 1e-15, "orthogonal to the point");
        let b = unit(-0.2, 0.9, 0.1);
        let n = robust_cross_prod(a, b);
        assert!(n.dot(a.cross(b)) > 0.0, "same orientation as a × b");
    }

    fn arb_unit() -> impl Strategy<Value = DVec3> {
        (-1.0_f64..1.0, -1.0_f64..1.0, -1.0_f64..1.0)
            .prop_filter("not near the origin", |(x, y, z)| x * x + y * y + z * z > 0.01)
            .prop_map(|(x, y, z)| unit(x, y, z))
    }

    proptest! {
        #[test]
        fn segments_form_a_path(a in arb_unit(), b in arb_unit()) {
            prop_assume!(a.dot(b) > -0.99);
            let mut out = FaceSegmentVec::new();
            face_segments(a, b, &mut out);
            prop_assert!(!out.is_empty() && out.len() <= 6);

            let start = sphere_point(out[0].face, out[0].a);
            let end = sphere_point(out[out.len() - 1].face, out[out.len() - 1].b);
            prop_assert!((start - a).length() < 1e-13);
            prop_assert!((end - b).length() < 1e-13);

            for seg in &out {
                for p in [seg.a, seg.b] {
                    let limit = 1.0 + f64::EPSILON;
                    prop_assert!(p.x.abs() <= limit && p.y.abs() <= limit, "{:?}", seg);
                }
            }
            for pair in out.windows(2) {
                prop_assert_ne!(pair[0].face, pair[1].face);
                let exit = sphere_point(pair[0].face, pair[0].b);
                let entry = sphere_point(pair[1].face, pair[1].a);
                prop_assert!((exit - entry).length() < 1e-13);
            }
        }
    }
}
