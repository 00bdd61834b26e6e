// Copyright 2025 the Terrella Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The contract between edge queries and a cell index.
//!
//! An index partitions (part of) the sphere into disjoint cells, each holding
//! the subset of every shape's edges that may intersect it. Queries only read
//! from the index through the traits below, so any storage strategy can be
//! plugged in.

use terrella_cell::CellId;

/// Identifier of a shape within a [`ShapeIndex`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ShapeId(u32);

impl ShapeId {
    /// Wrap a raw shape id.
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// The raw id.
    pub const fn get(self) -> u32 {
        self.0
    }

    /// The id as a slot index.
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// How a cell relates to the cells stored in an index.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CellRelation {
    /// The cell is an index cell, or is contained by one.
    Indexed,
    /// The cell is subdivided into one or more index cells.
    Subdivided,
    /// The cell does not intersect any index cell.
    Disjoint,
}

/// A shape made of edges, identified within its index.
pub trait Shape {
    /// The shape's id.
    fn id(&self) -> ShapeId;

    /// Total number of edges.
    fn num_edges(&self) -> usize;
}

/// The edges of one shape that are assigned to one index cell.
pub trait ClippedShape {
    /// The shape these edges belong to.
    fn shape_id(&self) -> ShapeId;

    /// Number of edges in this cell.
    fn num_edges(&self) -> usize;

    /// The shape-wide index of the `i`th edge. Indices are strictly ascending in `i`.
    fn edge(&self, i: usize) -> usize;

    /// All shape-wide edge indices in this cell, ascending.
    fn edges(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.num_edges()).map(move |i| self.edge(i))
    }
}

/// The contents of one index cell.
pub trait IndexCell {
    /// Per-shape edge list type.
    type Clipped: ClippedShape;

    /// The clipped edges of `shape`, if it has any in this cell.
    fn find_clipped(&self, shape: ShapeId) -> Option<&Self::Clipped>;

    /// Number of shapes with edges in this cell.
    fn num_clipped(&self) -> usize;

    /// The `i`th clipped shape.
    fn clipped(&self, i: usize) -> &Self::Clipped;
}

/// A cursor over the cells of an index in increasing [`CellId`] order.
///
/// `'a` is the lifetime of the index; cells handed out by the cursor outlive
/// the cursor itself.
pub trait IndexIterator<'a> {
    /// Cell type of the index.
    type Cell: IndexCell + 'a;

    /// Position at the first cell whose id is at or after `target`.
    fn seek(&mut self, target: CellId);

    /// Whether the cursor is past the last cell.
    fn done(&self) -> bool;

    /// The current cell's id, or [`CellId::SENTINEL`] when done.
    fn id(&self) -> CellId;

    /// The current cell. The cursor must not be done.
    fn cell(&self) -> &'a Self::Cell;

    /// Step back one cell. Returns `false` and stays put when already at the first cell.
    fn prev(&mut self) -> bool;

    /// Classify `target` against the index cells.
    ///
    /// When the result is [`CellRelation::Indexed`], the cursor is left at the
    /// index cell that contains `target`.
    fn locate(&mut self, target: CellId) -> CellRelation {
        self.seek(target.range_min());
        if !self.done() {
            let id = self.id();
            if id >= target && id.range_min() <= target {
                return CellRelation::Indexed;
            }
            if id <= target.range_max() {
                return CellRelation::Subdivided;
            }
        }
        if self.prev() && self.id().range_max() >= target {
            return CellRelation::Indexed;
        }
        CellRelation::Disjoint
    }
}

/// A read-only spatial index of shapes over cube-face cells.
///
/// Index cells are disjoint: no cell is an ancestor of another.
pub trait ShapeIndex {
    /// Shape type stored in the index.
    type Shape: Shape;

    /// Cell type stored in the index.
    type Cell: IndexCell;

    /// Cursor type.
    type Iter<'a>: IndexIterator<'a, Cell = Self::Cell>
    where
        Self: 'a;

    /// One more than the largest shape id ever assigned.
    fn num_shape_ids(&self) -> usize;

    /// The shape with the given id, if present.
    fn shape(&self, id: ShapeId) -> Option<&Self::Shape>;

    /// A new cursor positioned at the first cell.
    fn iter(&self) -> Self::Iter<'_>;
}
