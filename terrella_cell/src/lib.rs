// Copyright 2025 the Terrella Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Terrella Cell: cube-face cells and edge clipping for the unit sphere.
//!
//! The sphere is projected onto the six faces of a cube, and each face is
//! subdivided as a quadtree down to 30 levels. This crate provides the pieces a
//! spatial index over that hierarchy is built from:
//!
//! - [`CellId`]: a totally ordered 64-bit identifier for a cell, where every
//!   cell's descendants occupy a contiguous id range.
//! - [`coords`]: projections between unit vectors, face (u,v) coordinates,
//!   the area-equalizing (s,t) transform and leaf (i,j) coordinates.
//! - [`Interval`] and [`UvRect`]: closed intervals and rectangles in (u,v).
//! - [`edge_clipping`]: splitting a geodesic edge into per-face planar
//!   segments, clipping it to a single face, and testing planar segments
//!   against rectangles.
//!
//! Points on the sphere are [`glam::DVec3`]; points on a face are
//! [`kurbo::Point`].
//!
//! # Example
//!
//! ```rust
//! use glam::DVec3;
//! use terrella_cell::{CellId, FaceSegmentVec, face_segments};
//!
//! let a = DVec3::new(1.0, 0.2, 0.1).normalize();
//! let b = DVec3::new(0.2, 1.0, 0.1).normalize();
//!
//! // The edge starts on face 0 (+x) and ends on face 1 (+y).
//! let mut segments = FaceSegmentVec::new();
//! face_segments(a, b, &mut segments);
//! assert_eq!(segments.len(), 2);
//! assert_eq!(segments[0].face, 0);
//! assert_eq!(segments[1].face, 1);
//!
//! // The leaf cell under `a` descends from the face cell.
//! let leaf = CellId::from_point(a);
//! assert!(leaf.is_leaf());
//! assert!(CellId::from_face(0).contains(leaf));
//! ```

pub mod cell_id;
pub mod coords;
pub mod edge_clipping;
pub mod interval;

pub use cell_id::CellId;
pub use coords::{MAX_LEVEL, NUM_FACES};
pub use edge_clipping::{
    FaceSegment, FaceSegmentVec, clip_to_face, clip_to_padded_face, face_segments, interpolate,
    intersects_rect,
};
pub use interval::{Interval, UvRect};
