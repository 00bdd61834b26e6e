// Copyright 2025 the Terrella Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Cube-face projections between the unit sphere and face coordinates.
//!
//! Points on the sphere map onto six cube faces. On each face there are three
//! coordinate systems:
//!
//! - (u,v): gnomonic coordinates in `[-1, 1]`, where geodesics are straight lines.
//! - (s,t): the quadratic area-equalizing transform of (u,v) into `[0, 1]`.
//! - (i,j): leaf-cell integer coordinates in `[0, 2^30)`.
//!
//! Faces 0..=2 are centered on +x, +y, +z and faces 3..=5 on -x, -y, -z.

use glam::DVec3;
use kurbo::Point;

use crate::interval::{Interval, UvRect};

/// Number of cube faces.
pub const NUM_FACES: u8 = 6;

/// Deepest subdivision level of a face.
pub const MAX_LEVEL: u8 = 30;

/// Number of leaf cells along each axis of a face.
pub const LIMIT_IJ: u32 = 1 << MAX_LEVEL;

/// Number of "si/ti" half-steps along each axis; cell centers land on odd values.
pub const MAX_SI_TI: u64 = 1 << (MAX_LEVEL + 1);

/// Quadratic transform from u or v in `[-1, 1]` to s or t in `[0, 1]`.
#[inline]
pub fn uv_to_st(u: f64) -> f64 {
    if u >= 0.0 {
        0.5 * (1.0 + 3.0 * u).sqrt()
    } else {
        1.0 - 0.5 * (1.0 - 3.0 * u).sqrt()
    }
}

/// Inverse of [`uv_to_st`].
#[inline]
pub fn st_to_uv(s: f64) -> f64 {
    if s >= 0.5 {
        (1.0 / 3.0) * (4.0 * s * s - 1.0)
    } else {
        (1.0 / 3.0) * (1.0 - 4.0 * (1.0 - s) * (1.0 - s))
    }
}

/// Leaf coordinate containing `s`, clamped to the face.
#[allow(
    clippy::cast_possible_truncation,
    reason = "The value is clamped to [0, LIMIT_IJ) before the cast."
)]
#[inline]
pub fn st_to_ij(s: f64) -> u32 {
    let limit = f64::from(LIMIT_IJ);
    (limit * s).floor().clamp(0.0, limit - 1.0) as u32
}

/// The s or t value of the low edge of leaf coordinate `i`.
#[inline]
pub fn ij_to_st_min(i: u32) -> f64 {
    f64::from(i) / f64::from(LIMIT_IJ)
}

/// Convert an si/ti half-step coordinate to s or t.
#[allow(
    clippy::cast_precision_loss,
    reason = "si/ti values are below 2^32 and convert exactly."
)]
#[inline]
pub fn si_ti_to_st(si: u64) -> f64 {
    si as f64 / MAX_SI_TI as f64
}

/// The (u,v) bound of the cell at `level` that contains leaf coordinates `ij`.
pub fn ij_level_to_bound_uv(ij: [u32; 2], level: u8) -> UvRect {
    let cell_size = 1_u32 << (MAX_LEVEL - level);
    let axis = |x: u32| {
        let lo = x & !(cell_size - 1);
        Interval::new(
            st_to_uv(ij_to_st_min(lo)),
            st_to_uv(ij_to_st_min(lo + cell_size)),
        )
    };
    UvRect::new(axis(ij[0]), axis(ij[1]))
}

/// The face whose center direction is closest to `p`.
#[allow(
    clippy::cast_possible_truncation,
    reason = "The axis index is at most 2."
)]
#[inline]
pub fn face(p: DVec3) -> u8 {
    let a = p.abs();
    let axis: usize = if a.x > a.y {
        if a.x > a.z { 0 } else { 2 }
    } else if a.y > a.z {
        1
    } else {
        2
    };
    if p[axis] < 0.0 { axis as u8 + 3 } else { axis as u8 }
}

/// Project `p` onto `face`, which must be the face `p` lies on (or one it is
/// adjacent to with a positive w-coordinate).
#[inline]
pub fn valid_face_xyz_to_uv(face: u8, p: DVec3) -> Point {
    debug_assert!(p.dot(unit_norm(face)) > 0.0, "point is behind face {face}");
    match face {
        0 => Point::new(p.y / p.x, p.z / p.x),
        1 => Point::new(-p.x / p.y, p.z / p.y),
        2 => Point::new(-p.x / p.z, -p.y / p.z),
        3 => Point::new(p.z / p.x, p.y / p.x),
        4 => Point::new(p.z / p.y, -p.x / p.y),
        _ => Point::new(-p.y / p.z, -p.x / p.z),
    }
}

/// Project `p` onto the face it lies on, returning the face and its (u,v).
#[inline]
pub fn xyz_to_face_uv(p: DVec3) -> (u8, Point) {
    let f = face(p);
    (f, valid_face_xyz_to_uv(f, p))
}

/// The (unnormalized) point on the cube surface with the given face coordinates.
#[inline]
pub fn face_uv_to_xyz(face: u8, uv: Point) -> DVec3 {
    let (u, v) = (uv.x, uv.y);
    match face {
        0 => DVec3::new(1.0, u, v),
        1 => DVec3::new(-u, 1.0, v),
        2 => DVec3::new(-u, -v, 1.0),
        3 => DVec3::new(-1.0, -v, -u),
        4 => DVec3::new(v, -1.0, -u),
        _ => DVec3::new(v, u, -1.0),
    }
}

/// Unit vector in the direction of increasing u on `face`.
#[inline]
pub fn u_axis(face: u8) -> DVec3 {
    match face {
        0 => DVec3::Y,
        1 | 2 => DVec3::NEG_X,
        3 | 4 => DVec3::NEG_Z,
        _ => DVec3::Y,
    }
}

/// Unit vector in the direction of increasing v on `face`.
#[inline]
pub fn v_axis(face: u8) -> DVec3 {
    match face {
        0 | 1 => DVec3::Z,
        2 | 3 => DVec3::NEG_Y,
        _ => DVec3::X,
    }
}

/// Outward unit normal of `face`.
#[inline]
pub fn unit_norm(face: u8) -> DVec3 {
    match face {
        0 => DVec3::X,
        1 => DVec3::Y,
        2 => DVec3::Z,
        3 => DVec3::NEG_X,
        4 => DVec3::NEG_Y,
        _ => DVec3::NEG_Z,
    }
}

/// The u, v, or w axis (`axis` 0, 1, 2) of `face`.
#[inline]
pub fn uvw_axis(face: u8, axis: usize) -> DVec3 {
    match axis {
        0 => u_axis(face),
        1 => v_axis(face),
        _ => unit_norm(face),
    }
}

/// Express `p` in the (u,v,w) frame of `face`.
#[inline]
pub fn face_xyz_to_uvw(face: u8, p: DVec3) -> DVec3 {
    DVec3::new(p.dot(u_axis(face)), p.dot(v_axis(face)), p.dot(unit_norm(face)))
}

/// The face reached by leaving `face` along `axis` in the positive or negative direction.
///
/// For `axis` 0 or 1 this is the neighbor across the u or v edge. For axis 2 it is
/// the face itself (positive) or the opposite face (negative).
#[inline]
pub fn uvw_face(face: u8, axis: usize, positive: bool) -> u8 {
    let dir = uvw_axis(face, axis);
    self::face(if positive { dir } else { -dir })
}
