// Copyright 2025 the Terrella Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Terrella Index: candidate edge queries over a cube-face cell index.
//!
//! Shapes made of geodesic edges are stored in an index whose cells are
//! disjoint [`CellId`](terrella_cell::CellId)s, each holding the edges that
//! may intersect it. An [`EdgeQuery`] takes a query edge AB and returns a
//! superset of the indexed edges that intersect AB, without testing them
//! exactly.
//!
//! - [`ShapeIndex`] and its companion traits describe what a query needs from
//!   an index. Any backend implementing them can be queried.
//! - [`MemoryIndex`] is an immutable in-memory backend, built by adaptive
//!   subdivision or from an explicit cell layout.
//! - [`PaddedCell`] caches a cell's (u,v) bounds and center for quadtree
//!   descent and finds the smallest cell containing a rectangle.
//! - [`UvEdge`] splits the bound of a planar edge at a cell center.
//!
//! Shapes with few edges skip the index and return all of their edges; see
//! [`EdgeQueryOptions`].
//!
//! # Example
//!
//! ```rust
//! use glam::DVec3;
//! use terrella_index::{EdgeMap, EdgeQuery, MemoryIndex, Polyline};
//!
//! // A ring of 64 edges around the equator.
//! let ring: Vec<DVec3> = (0..64)
//!     .map(|k| {
//!         let t = core::f64::consts::TAU * f64::from(k) / 64.0;
//!         DVec3::new(t.cos(), t.sin(), 0.0)
//!     })
//!     .collect();
//! let index = MemoryIndex::new(vec![Polyline::closed(ring)]);
//!
//! // A short meridian segment crossing the equator at longitude 0.
//! let a = DVec3::new(1.0, 0.01, -0.1).normalize();
//! let b = DVec3::new(1.0, 0.01, 0.1).normalize();
//!
//! let mut query = EdgeQuery::new(&index);
//! let mut map = EdgeMap::new();
//! assert!(query.candidates(a, b, &mut map));
//!
//! // Edge 0 runs from longitude 0 to 360/64 degrees and crosses the query.
//! let edges = &map[&terrella_index::ShapeId::new(0)];
//! assert!(edges.contains(&0));
//! assert!(edges.len() < 64);
//! ```

mod bound;
mod error;
mod index;
mod memory;
mod padded_cell;
mod query;

pub use bound::UvEdge;
pub use error::IndexError;
pub use index::{
    CellRelation, ClippedShape, IndexCell, IndexIterator, Shape, ShapeId, ShapeIndex,
};
pub use memory::{
    CELL_PADDING, DEFAULT_MAX_EDGES_PER_CELL, IndexedShape, MemoryCell, MemoryClipped,
    MemoryIndex, MemoryIndexIter, MemoryIndexOptions, Polyline,
};
pub use padded_cell::PaddedCell;
pub use query::{DEFAULT_MAX_BRUTE_FORCE_EDGES, EdgeMap, EdgeQuery, EdgeQueryOptions};
