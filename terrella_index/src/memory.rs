// Copyright 2025 the Terrella Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A simple in-memory [`ShapeIndex`] over polylines.
//!
//! Cells are stored in a sorted `Vec` and located by binary search. The index
//! is immutable once built; rebuild it to change its contents.

use core::fmt;

use glam::DVec3;
use kurbo::Point;
use smallvec::SmallVec;
use terrella_cell::coords::MAX_LEVEL;
use terrella_cell::edge_clipping::{EDGE_CLIP_ERROR_UV_COORD, FACE_CLIP_ERROR_UV_COORD};
use terrella_cell::{CellId, NUM_FACES, clip_to_padded_face, intersects_rect};

use crate::error::IndexError;
use crate::index::{ClippedShape, IndexCell, IndexIterator, Shape, ShapeId, ShapeIndex};
use crate::padded_cell::PaddedCell;

/// Padding added around every index cell while assigning edges, so that edges
/// within clipping error of a cell boundary land in both neighbors.
pub const CELL_PADDING: f64 = 2.0 * (FACE_CLIP_ERROR_UV_COORD + EDGE_CLIP_ERROR_UV_COORD);

/// Default number of edges a cell may hold before it is subdivided.
pub const DEFAULT_MAX_EDGES_PER_CELL: usize = 10;

/// A chain of geodesic edges through unit-length vertices.
#[derive(Clone, Debug, PartialEq)]
pub struct Polyline {
    vertices: Vec<DVec3>,
    closed: bool,
}

impl Polyline {
    /// An open chain: `n` vertices make `n - 1` edges.
    pub fn open(vertices: Vec<DVec3>) -> Self {
        Self {
            vertices,
            closed: false,
        }
    }

    /// A closed loop: `n` vertices make `n` edges, the last returning to the first.
    pub fn closed(vertices: Vec<DVec3>) -> Self {
        Self {
            vertices,
            closed: true,
        }
    }

    /// The vertices.
    pub fn vertices(&self) -> &[DVec3] {
        &self.vertices
    }

    /// Whether the chain is a closed loop.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Number of edges.
    pub fn num_edges(&self) -> usize {
        if self.closed {
            self.vertices.len()
        } else {
            self.vertices.len().saturating_sub(1)
        }
    }

    /// Endpoints of edge `i`.
    pub fn edge(&self, i: usize) -> (DVec3, DVec3) {
        debug_assert!(i < self.num_edges(), "edge {i} out of range");
        let next = if i + 1 == self.vertices.len() { 0 } else { i + 1 };
        (self.vertices[i], self.vertices[next])
    }
}

/// A polyline stored in a [`MemoryIndex`] under its assigned id.
#[derive(Clone, Debug, PartialEq)]
pub struct IndexedShape {
    id: ShapeId,
    polyline: Polyline,
}

impl IndexedShape {
    /// The stored polyline.
    pub fn polyline(&self) -> &Polyline {
        &self.polyline
    }

    /// Endpoints of edge `i`.
    pub fn edge(&self, i: usize) -> (DVec3, DVec3) {
        self.polyline.edge(i)
    }
}

impl Shape for IndexedShape {
    fn id(&self) -> ShapeId {
        self.id
    }

    fn num_edges(&self) -> usize {
        self.polyline.num_edges()
    }
}

/// The edges of one shape inside one [`MemoryCell`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MemoryClipped {
    shape_id: ShapeId,
    edges: Vec<usize>,
}

impl MemoryClipped {
    /// The edge indices, ascending.
    pub fn edge_ids(&self) -> &[usize] {
        &self.edges
    }
}

impl ClippedShape for MemoryClipped {
    fn shape_id(&self) -> ShapeId {
        self.shape_id
    }

    fn num_edges(&self) -> usize {
        self.edges.len()
    }

    fn edge(&self, i: usize) -> usize {
        self.edges[i]
    }
}

/// One cell of a [`MemoryIndex`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MemoryCell {
    id: CellId,
    // Sorted by shape id.
    shapes: SmallVec<[MemoryClipped; 2]>,
}

impl MemoryCell {
    /// The cell id.
    pub fn id(&self) -> CellId {
        self.id
    }

    /// Total number of edges across all shapes.
    pub fn num_edges(&self) -> usize {
        self.shapes.iter().map(|c| c.edges.len()).sum()
    }
}

impl IndexCell for MemoryCell {
    type Clipped = MemoryClipped;

    fn find_clipped(&self, shape: ShapeId) -> Option<&MemoryClipped> {
        self.shapes
            .binary_search_by_key(&shape, |c| c.shape_id)
            .ok()
            .map(|i| &self.shapes[i])
    }

    fn num_clipped(&self) -> usize {
        self.shapes.len()
    }

    fn clipped(&self, i: usize) -> &MemoryClipped {
        &self.shapes[i]
    }
}

/// Options for [`MemoryIndex::build`].
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct MemoryIndexOptions {
    /// A cell holding more edges than this is subdivided, unless it is a leaf.
    pub max_edges_per_cell: usize,
    /// Padding around each cell's (u,v) bound when deciding which edges it holds.
    pub cell_padding: f64,
}

impl Default for MemoryIndexOptions {
    fn default() -> Self {
        Self {
            max_edges_per_cell: DEFAULT_MAX_EDGES_PER_CELL,
            cell_padding: CELL_PADDING,
        }
    }
}

/// An edge clipped to one face, waiting to be assigned to cells.
#[derive(Copy, Clone, Debug)]
struct FaceEdge {
    shape: ShapeId,
    edge: usize,
    a: Point,
    b: Point,
}

/// An immutable shape index held entirely in memory.
#[derive(Clone, PartialEq)]
pub struct MemoryIndex {
    shapes: Vec<IndexedShape>,
    cells: Vec<MemoryCell>,
}

impl fmt::Debug for MemoryIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryIndex")
            .field("shapes", &self.shapes.len())
            .field("cells", &self.cells.len())
            .finish_non_exhaustive()
    }
}

impl MemoryIndex {
    /// Index `shapes` with default options. Shape `i` gets id `i`.
    pub fn new(shapes: Vec<Polyline>) -> Self {
        Self::build(shapes, MemoryIndexOptions::default())
    }

    /// Index `shapes` by adaptive subdivision. Shape `i` gets id `i`.
    ///
    /// Every edge is clipped to each padded face it touches, then pushed down
    /// the face quadtree into every padded child it intersects. A cell stops
    /// splitting once it holds at most `max_edges_per_cell` edges or reaches
    /// the leaf level. Cells without edges are omitted.
    pub fn build(shapes: Vec<Polyline>, options: MemoryIndexOptions) -> Self {
        let shapes = assign_ids(shapes);
        let mut cells = Vec::new();
        for face in 0..NUM_FACES {
            let mut edges = Vec::new();
            for shape in &shapes {
                for edge in 0..shape.num_edges() {
                    let (a, b) = shape.edge(edge);
                    if let Some((a, b)) = clip_to_padded_face(a, b, face, options.cell_padding) {
                        edges.push(FaceEdge {
                            shape: shape.id,
                            edge,
                            a,
                            b,
                        });
                    }
                }
            }
            let root = PaddedCell::new(CellId::from_face(face), options.cell_padding);
            subdivide(&root, edges, &options, &mut cells);
        }
        cells.sort_unstable_by_key(|c| c.id);
        log::debug!(
            "built memory index: {} shapes, {} cells, {} clipped edges",
            shapes.len(),
            cells.len(),
            cells.iter().map(MemoryCell::num_edges).sum::<usize>()
        );
        Self { shapes, cells }
    }

    /// Assemble an index from an explicit cell layout.
    ///
    /// Each entry of `cells` is a cell id with the edges of each shape it
    /// holds. Edge lists are sorted and deduplicated; cells may be given in
    /// any order. Layouts with invalid or overlapping cells, unknown or
    /// repeated shapes, or out-of-range edges are rejected.
    pub fn from_cells(
        shapes: Vec<Polyline>,
        cells: Vec<(CellId, Vec<(ShapeId, Vec<usize>)>)>,
    ) -> Result<Self, IndexError> {
        let shapes = assign_ids(shapes);
        let mut built = Vec::with_capacity(cells.len());
        for (id, contents) in cells {
            if !id.is_valid() {
                return Err(IndexError::InvalidCell(id));
            }
            let mut clipped: SmallVec<[MemoryClipped; 2]> = SmallVec::new();
            for (shape_id, mut edges) in contents {
                let shape = shapes
                    .get(shape_id.index())
                    .ok_or(IndexError::UnknownShape {
                        cell: id,
                        shape: shape_id,
                    })?;
                let num_edges = shape.num_edges();
                if let Some(&edge) = edges.iter().find(|&&e| e >= num_edges) {
                    return Err(IndexError::EdgeOutOfRange {
                        shape: shape_id,
                        edge,
                        num_edges,
                    });
                }
                edges.sort_unstable();
                edges.dedup();
                clipped.push(MemoryClipped { shape_id, edges });
            }
            clipped.sort_unstable_by_key(|c| c.shape_id);
            if let Some(pair) = clipped.windows(2).find(|p| p[0].shape_id == p[1].shape_id) {
                return Err(IndexError::DuplicateShape {
                    cell: id,
                    shape: pair[0].shape_id,
                });
            }
            built.push(MemoryCell {
                id,
                shapes: clipped,
            });
        }
        built.sort_unstable_by_key(|c| c.id);
        if let Some(pair) = built
            .windows(2)
            .find(|p| p[0].id.range_max() >= p[1].id.range_min())
        {
            return Err(IndexError::OverlappingCells(pair[0].id, pair[1].id));
        }
        Ok(Self {
            shapes,
            cells: built,
        })
    }

    /// The indexed shapes, in id order.
    pub fn shapes(&self) -> &[IndexedShape] {
        &self.shapes
    }

    /// The index cells, in id order.
    pub fn cells(&self) -> &[MemoryCell] {
        &self.cells
    }
}

fn assign_ids(shapes: Vec<Polyline>) -> Vec<IndexedShape> {
    (0_u32..)
        .zip(shapes)
        .map(|(id, polyline)| IndexedShape {
            id: ShapeId::new(id),
            polyline,
        })
        .collect()
}

fn subdivide(
    pcell: &PaddedCell,
    edges: Vec<FaceEdge>,
    options: &MemoryIndexOptions,
    out: &mut Vec<MemoryCell>,
) {
    if edges.is_empty() {
        return;
    }
    if edges.len() <= options.max_edges_per_cell || pcell.level() == MAX_LEVEL {
        out.push(make_cell(pcell.id(), edges));
        return;
    }
    for i in 0..2 {
        for j in 0..2 {
            let child = pcell.child_ij(i, j);
            let inside: Vec<FaceEdge> = edges
                .iter()
                .filter(|e| intersects_rect(e.a, e.b, child.bound()))
                .copied()
                .collect();
            subdivide(&child, inside, options, out);
        }
    }
}

fn make_cell(id: CellId, mut edges: Vec<FaceEdge>) -> MemoryCell {
    edges.sort_unstable_by_key(|e| (e.shape, e.edge));
    let mut shapes: SmallVec<[MemoryClipped; 2]> = SmallVec::new();
    for e in edges {
        match shapes.last_mut() {
            Some(last) if last.shape_id == e.shape => last.edges.push(e.edge),
            _ => shapes.push(MemoryClipped {
                shape_id: e.shape,
                edges: vec![e.edge],
            }),
        }
    }
    MemoryCell { id, shapes }
}

impl ShapeIndex for MemoryIndex {
    type Shape = IndexedShape;
    type Cell = MemoryCell;
    type Iter<'a> = MemoryIndexIter<'a>;

    fn num_shape_ids(&self) -> usize {
        self.shapes.len()
    }

    fn shape(&self, id: ShapeId) -> Option<&IndexedShape> {
        self.shapes.get(id.index())
    }

    fn iter(&self) -> MemoryIndexIter<'_> {
        MemoryIndexIter {
            cells: &self.cells,
            pos: 0,
        }
    }
}

/// Cursor over the cells of a [`MemoryIndex`].
#[derive(Clone, Debug)]
pub struct MemoryIndexIter<'a> {
    cells: &'a [MemoryCell],
    pos: usize,
}

impl<'a> IndexIterator<'a> for MemoryIndexIter<'a> {
    type Cell = MemoryCell;

    fn seek(&mut self, target: CellId) {
        self.pos = self.cells.partition_point(|c| c.id < target);
    }

    fn done(&self) -> bool {
        self.pos >= self.cells.len()
    }

    fn id(&self) -> CellId {
        self.cells.get(self.pos).map_or(CellId::SENTINEL, |c| c.id)
    }

    fn cell(&self) -> &'a MemoryCell {
        debug_assert!(!self.done(), "no current cell");
        &self.cells[self.pos]
    }

    fn prev(&mut self) -> bool {
        if self.pos == 0 {
            return false;
        }
        self.pos -= 1;
        true
    }
}
