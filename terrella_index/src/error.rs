// Copyright 2025 the Terrella Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Errors reported when assembling an index from explicit cells.

use core::fmt;

use terrella_cell::CellId;

use crate::index::ShapeId;

/// Reasons an explicit cell layout is rejected by
/// [`MemoryIndex::from_cells`](crate::MemoryIndex::from_cells).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IndexError {
    /// A cell id is not a valid cell.
    InvalidCell(CellId),

    /// Two cells overlap (one contains the other, or they are equal).
    OverlappingCells(CellId, CellId),

    /// A cell refers to a shape id with no shape.
    UnknownShape {
        /// The offending cell.
        cell: CellId,
        /// The unknown shape id.
        shape: ShapeId,
    },

    /// The same shape is listed twice in one cell.
    DuplicateShape {
        /// The offending cell.
        cell: CellId,
        /// The repeated shape id.
        shape: ShapeId,
    },

    /// A cell refers to an edge index beyond the shape's edge count.
    EdgeOutOfRange {
        /// The shape the edge was listed under.
        shape: ShapeId,
        /// The out-of-range edge index.
        edge: usize,
        /// The shape's edge count.
        num_edges: usize,
    },
}

impl fmt::Display for IndexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidCell(id) => write!(f, "invalid cell id {id:?}"),
            Self::OverlappingCells(a, b) => write!(f, "cells {a} and {b} overlap"),
            Self::UnknownShape { cell, shape } => {
                write!(f, "cell {cell} refers to unknown shape {}", shape.get())
            }
            Self::DuplicateShape { cell, shape } => {
                write!(f, "cell {cell} lists shape {} more than once", shape.get())
            }
            Self::EdgeOutOfRange {
                shape,
                edge,
                num_edges,
            } => write!(
                f,
                "edge {edge} is out of range for shape {} with {num_edges} edges",
                shape.get()
            ),
        }
    }
}

impl std::error::Error for IndexError {}
