// Copyright 2025 the Terrella Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Candidate edges for a query edge.
//!
//! Given a geodesic edge AB, an [`EdgeQuery`] finds the index cells that AB
//! may pass through and returns the edges stored in them. Every edge that
//! intersects AB is returned; some that do not may be returned too, and are
//! expected to be filtered by an exact test afterwards.
//!
//! The search works face by face on the planar pieces of AB. For each piece it
//! starts at the smallest cell containing the piece's bound (the edge root),
//! asks the index how that cell relates to its own cells, and if the root is
//! subdivided in the index, descends the quadtree splitting the bound at each
//! cell's center. Because no padding is used, a straight piece reaches at most
//! three of the four children of any cell.

use core::fmt;

use glam::DVec3;
use hashbrown::HashMap;
use terrella_cell::{CellId, FaceSegmentVec, UvRect, clip_to_face, face_segments};

use crate::bound::UvEdge;
use crate::index::{
    CellRelation, ClippedShape, IndexCell, IndexIterator, Shape, ShapeId, ShapeIndex,
};
use crate::padded_cell::PaddedCell;

/// Edge count at or below which a shape is scanned without consulting the index.
pub const DEFAULT_MAX_BRUTE_FORCE_EDGES: usize = 27;

/// Tuning knobs for [`EdgeQuery`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct EdgeQueryOptions {
    /// Shapes with at most this many edges return all of their edges directly.
    ///
    /// Walking the index costs more than a linear scan for small shapes. The
    /// default was measured on one machine; see the `terrella_benches` crate to
    /// re-tune it.
    pub max_brute_force_edges: usize,
}

impl Default for EdgeQueryOptions {
    fn default() -> Self {
        Self {
            max_brute_force_edges: DEFAULT_MAX_BRUTE_FORCE_EDGES,
        }
    }
}

/// Candidate edges grouped by shape.
///
/// Every shape present maps to an ascending, duplicate-free list, which may be
/// empty.
pub type EdgeMap = HashMap<ShapeId, Vec<usize>>;

/// Finds candidate edges of an index that may intersect a query edge.
///
/// The query keeps an index cursor and a scratch list of matched cells between
/// calls so repeated queries do not reallocate. Both are reset at the start of
/// every call. One query object must not be shared between threads, but any
/// number of queries may read the same index at once.
pub struct EdgeQuery<'a, I: ShapeIndex + 'a>
where
    I::Cell: 'a,
{
    index: &'a I,
    iter: I::Iter<'a>,
    options: EdgeQueryOptions,
    // Cells matched by the current call.
    cells: Vec<&'a I::Cell>,
    // The planar piece of the query edge currently being traced.
    edge: UvEdge,
    segments: FaceSegmentVec,
}

impl<'a, I: ShapeIndex + 'a> fmt::Debug for EdgeQuery<'a, I>
where
    I::Cell: 'a,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EdgeQuery")
            .field("options", &self.options)
            .field("cells", &self.cells.len())
            .finish_non_exhaustive()
    }
}

impl<'a, I: ShapeIndex + 'a> EdgeQuery<'a, I>
where
    I::Cell: 'a,
{
    /// Create a query over `index` with default options.
    pub fn new(index: &'a I) -> Self {
        Self::with_options(index, EdgeQueryOptions::default())
    }

    /// Create a query over `index`.
    pub fn with_options(index: &'a I, options: EdgeQueryOptions) -> Self {
        Self {
            index,
            iter: index.iter(),
            options,
            cells: Vec::new(),
            edge: UvEdge::new(kurbo::Point::ZERO, kurbo::Point::ZERO),
            segments: FaceSegmentVec::new(),
        }
    }

    /// The options in use.
    pub fn options(&self) -> &EdgeQueryOptions {
        &self.options
    }

    /// The index being queried.
    pub fn index(&self) -> &'a I {
        self.index
    }

    /// Fill `edges` with the edges of `shape` that may intersect AB.
    ///
    /// `edges` is cleared first and ends up ascending and duplicate-free. A
    /// shape with at most
    /// [`max_brute_force_edges`](EdgeQueryOptions::max_brute_force_edges)
    /// edges yields all of them without consulting the index. Returns whether
    /// any candidate was found.
    pub fn candidates_for_shape<S>(
        &mut self,
        a: DVec3,
        b: DVec3,
        shape: &S,
        edges: &mut Vec<usize>,
    ) -> bool
    where
        S: Shape + ?Sized,
    {
        edges.clear();
        let num_edges = shape.num_edges();
        if num_edges <= self.options.max_brute_force_edges {
            log::trace!("brute force over {num_edges} edges");
            edges.extend(0..num_edges);
            return !edges.is_empty();
        }

        self.compute_cells(a, b);
        if self.cells.is_empty() {
            return false;
        }
        let id = shape.id();
        for cell in &self.cells {
            if let Some(clipped) = cell.find_clipped(id) {
                edges.extend(clipped.edges());
            }
        }
        // A single cell already lists each edge once, in order.
        if self.cells.len() > 1 {
            edges.sort_unstable();
            edges.dedup();
        }
        !edges.is_empty()
    }

    /// Fill `edge_map` with the candidate edges of every shape in the index.
    ///
    /// When the index holds a single shape id, `edge_map` is reused as long as
    /// it holds nothing but that shape's entry, and the entry is kept (empty)
    /// even when nothing is found. Otherwise `edge_map` is cleared first and
    /// only shapes with candidates appear. Returns whether `edge_map` is
    /// non-empty.
    pub fn candidates(&mut self, a: DVec3, b: DVec3, edge_map: &mut EdgeMap) -> bool {
        let index = self.index;
        if index.num_shape_ids() == 1 {
            if let Some(shape) = index.shape(ShapeId::new(0)) {
                let id = shape.id();
                edge_map.entry(id).or_default();
                if edge_map.len() != 1 {
                    // Left over from a query against some other index.
                    edge_map.clear();
                }
                let edges = edge_map.entry(id).or_default();
                return self.candidates_for_shape(a, b, shape, edges);
            }
        }

        self.compute_cells(a, b);
        edge_map.clear();
        if self.cells.is_empty() {
            return false;
        }
        for cell in &self.cells {
            for s in 0..cell.num_clipped() {
                let clipped = cell.clipped(s);
                edge_map
                    .entry(clipped.shape_id())
                    .or_default()
                    .extend(clipped.edges());
            }
        }
        if self.cells.len() > 1 {
            for edges in edge_map.values_mut() {
                edges.sort_unstable();
                edges.dedup();
            }
        }
        !edge_map.is_empty()
    }

    /// Fill `cells` with the index cells below `root` that AB may pass through.
    ///
    /// AB is clipped to the face of `root` first; nothing is found if it misses
    /// that face or the root's bound. `root` must not lie strictly inside an
    /// index cell. `cells` is cleared first. Returns whether any cell was found.
    pub fn cells_in_root(
        &mut self,
        a: DVec3,
        b: DVec3,
        root: &PaddedCell,
        cells: &mut Vec<&'a I::Cell>,
    ) -> bool {
        self.cells.clear();
        if let Some((a_uv, b_uv)) = clip_to_face(a, b, root.id().face()) {
            self.edge = UvEdge::new(a_uv, b_uv);
            let bound = self.edge.bound();
            if root.bound().intersects(&bound) {
                self.cells_in(root, &bound);
            }
        }
        cells.clear();
        cells.extend_from_slice(&self.cells);
        !cells.is_empty()
    }

    /// Collect the index cells intersected by AB into `self.cells`.
    fn compute_cells(&mut self, a: DVec3, b: DVec3) {
        self.cells.clear();
        let mut segments = core::mem::take(&mut self.segments);
        face_segments(a, b, &mut segments);
        for segment in &segments {
            self.edge = UvEdge::new(segment.a, segment.b);
            let bound = self.edge.bound();

            // Start from the smallest cell containing the piece rather than
            // the face; most edges are short.
            let face = PaddedCell::new(CellId::from_face(segment.face), 0.0);
            let edge_root = face.shrink_to_fit(&bound);
            match self.iter.locate(edge_root) {
                CellRelation::Indexed => {
                    debug_assert!(
                        self.iter.id().contains(edge_root),
                        "located cell {} does not contain {edge_root}",
                        self.iter.id()
                    );
                    self.cells.push(self.iter.cell());
                }
                CellRelation::Subdivided => {
                    let root = if edge_root.is_face() {
                        face
                    } else {
                        PaddedCell::new(edge_root, 0.0)
                    };
                    self.cells_in(&root, &bound);
                }
                CellRelation::Disjoint => {}
            }
        }
        log::trace!(
            "{} face segments matched {} cells",
            segments.len(),
            self.cells.len()
        );
        self.segments = segments;
    }

    /// Collect the index cells at or below `pcell` that the current planar
    /// edge may pass through, given `bound`, its bound clipped to `pcell`.
    ///
    /// Recursion ends no deeper than the leaf level: at a leaf the cursor is
    /// either exactly on it or past it.
    fn cells_in(&mut self, pcell: &PaddedCell, bound: &UvRect) {
        let id = pcell.id();
        self.iter.seek(id.range_min());
        if self.iter.done() || self.iter.id() > id.range_max() {
            return;
        }
        if self.iter.id() == id {
            self.cells.push(self.iter.cell());
            return;
        }
        debug_assert!(!id.is_leaf(), "index cursor inside leaf {id}");

        let center = pcell.middle().lo();
        if bound.u.hi < center.x {
            self.clip_v_axis(bound, center.y, 0, pcell);
        } else if bound.u.lo >= center.x {
            self.clip_v_axis(bound, center.y, 1, pcell);
        } else {
            let [left, right] = self.edge.split_u_bound(bound, center.x);
            if bound.v.hi < center.y {
                self.cells_in(&pcell.child_ij(0, 0), &left);
                self.cells_in(&pcell.child_ij(1, 0), &right);
            } else if bound.v.lo >= center.y {
                self.cells_in(&pcell.child_ij(0, 1), &left);
                self.cells_in(&pcell.child_ij(1, 1), &right);
            } else {
                // The bound spans all four children but the edge meets at
                // most three of them.
                self.clip_v_axis(&left, center.y, 0, pcell);
                self.clip_v_axis(&right, center.y, 1, pcell);
            }
        }
    }

    /// Recurse into the lower, upper, or both children in column `i`.
    fn clip_v_axis(&mut self, bound: &UvRect, center: f64, i: usize, pcell: &PaddedCell) {
        if bound.v.hi < center {
            self.cells_in(&pcell.child_ij(i, 0), bound);
        } else if bound.v.lo >= center {
            self.cells_in(&pcell.child_ij(i, 1), bound);
        } else {
            let [lower, upper] = self.edge.split_v_bound(bound, center);
            self.cells_in(&pcell.child_ij(i, 0), &lower);
            self.cells_in(&pcell.child_ij(i, 1), &upper);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{MemoryIndex, Polyline};
    use kurbo::Point;
    use terrella_cell::coords::face_uv_to_xyz;

    fn on_face(face: u8, u: f64, v: f64) -> DVec3 {
        face_uv_to_xyz(face, Point::new(u, v)).normalize()
    }

    /// An open chain of `n` short edges along v = `v` on face 0.
    fn chain(n: usize, v: f64) -> Polyline {
        let step = 1.6 / n as f64;
        Polyline::open(
            (0..=n)
                .map(|k| on_face(0, -0.8 + step * k as f64, v))
                .collect(),
        )
    }

    #[test]
    fn small_shapes_skip_the_index() {
        let index = MemoryIndex::new(vec![chain(5, 0.5)]);
        let mut query = EdgeQuery::new(&index);
        let shape = index.shape(ShapeId::new(0)).expect("shape 0");
        let mut edges = vec![99];
        // Far away from the shape, yet every edge comes back.
        let found =
            query.candidates_for_shape(on_face(3, 0.0, 0.0), on_face(3, 0.1, 0.1), shape, &mut edges);
        assert!(found);
        assert_eq!(edges, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn brute_force_threshold_is_configurable() {
        let index = MemoryIndex::new(vec![chain(5, 0.5)]);
        let mut query = EdgeQuery::with_options(
            &index,
            EdgeQueryOptions {
                max_brute_force_edges: 0,
            },
        );
        let shape = index.shape(ShapeId::new(0)).expect("shape 0");
        let mut edges = Vec::new();
        let found =
            query.candidates_for_shape(on_face(3, 0.0, 0.0), on_face(3, 0.1, 0.1), shape, &mut edges);
        assert!(!found);
        assert!(edges.is_empty());
    }

    #[test]
    fn crossing_edge_is_a_candidate() {
        let index = MemoryIndex::new(vec![chain(40, 0.0)]);
        let shape = index.shape(ShapeId::new(0)).expect("shape 0");
        let mut query = EdgeQuery::new(&index);
        let mut edges = Vec::new();
        // A short vertical edge crossing the chain at u = 0.01, inside edge 20.
        let found = query.candidates_for_shape(
            on_face(0, 0.01, -0.05),
            on_face(0, 0.01, 0.05),
            shape,
            &mut edges,
        );
        assert!(found);
        assert!(edges.contains(&20));
        assert!(edges.len() < 40);
        assert!(edges.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn debug_hides_internals() {
        let index = MemoryIndex::new(Vec::new());
        let query = EdgeQuery::new(&index);
        let text = format!("{query:?}");
        assert!(text.starts_with("EdgeQuery"));
        assert!(text.contains("max_brute_force_edges: 27"));
    }
}
