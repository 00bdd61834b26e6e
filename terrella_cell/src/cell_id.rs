// Copyright 2025 the Terrella Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Hierarchical cell identifiers.
//!
//! A [`CellId`] packs a face, a path of child positions, and a trailing marker
//! bit into a `u64`:
//!
//! ```text
//! fff pp pp pp ... pp 1 00...0
//! ```
//!
//! where `fff` is the face (0..=5), each `pp` is the child position (0..=3) at
//! successive levels, and the lowest set bit marks the level. Ordering by the
//! raw value walks a Hilbert curve over each face, and every cell's descendants
//! occupy the contiguous range [`CellId::range_min`]..=[`CellId::range_max`].

use core::fmt;

use glam::DVec3;

use crate::coords::{
    LIMIT_IJ, MAX_LEVEL, NUM_FACES, ij_level_to_bound_uv, st_to_ij, uv_to_st, xyz_to_face_uv,
};
use crate::interval::UvRect;

/// Orientation bit: the child traversal swaps the i and j axes.
pub const SWAP_MASK: u8 = 0x01;

/// Orientation bit: the child traversal runs backwards along both axes.
pub const INVERT_MASK: u8 = 0x02;

/// Child position for each orientation and `(i << 1) | j` quadrant.
pub const IJ_TO_POS: [[usize; 4]; 4] = [
    [0, 1, 3, 2], // canonical order
    [0, 3, 1, 2], // axes swapped
    [2, 3, 1, 0], // bits inverted
    [2, 1, 3, 0], // swapped & inverted
];

/// The `(i << 1) | j` quadrant for each orientation and child position.
pub const POS_TO_IJ: [[u8; 4]; 4] = [
    [0, 1, 3, 2],
    [0, 2, 3, 1],
    [3, 2, 0, 1],
    [3, 1, 0, 2],
];

/// Orientation change applied when descending into each child position.
pub const POS_TO_ORIENTATION: [u8; 4] = [SWAP_MASK, 0, 0, INVERT_MASK | SWAP_MASK];

const POS_BITS: u32 = 2 * MAX_LEVEL as u32 + 1;

/// Identifier of a cell in the face quadtree.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CellId(u64);

impl CellId {
    /// An invalid id that orders after every valid cell.
    pub const SENTINEL: Self = Self(u64::MAX);

    /// Wrap a raw 64-bit value. The result may be invalid; see [`CellId::is_valid`].
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw 64-bit value.
    pub const fn raw(self) -> u64 {
        self.0
    }

    /// The lowest set bit of any cell at `level`.
    pub const fn lsb_for_level(level: u8) -> u64 {
        1 << (2 * (MAX_LEVEL - level) as u32)
    }

    /// Edge length of a cell at `level`, measured in leaf cells.
    pub const fn size_ij(level: u8) -> u32 {
        1 << (MAX_LEVEL - level)
    }

    /// The top-level cell covering an entire face.
    pub const fn from_face(face: u8) -> Self {
        debug_assert!(face < NUM_FACES, "face out of range");
        Self(((face as u64) << POS_BITS) + Self::lsb_for_level(0))
    }

    /// The leaf cell at leaf coordinates `(i, j)` on `face`.
    pub fn from_face_ij(face: u8, i: u32, j: u32) -> Self {
        debug_assert!(face < NUM_FACES, "face out of range: {face}");
        debug_assert!(i < LIMIT_IJ && j < LIMIT_IJ, "leaf coordinates out of range");
        let mut bits = u64::from(face) << POS_BITS;
        let mut orientation = face & SWAP_MASK;
        for level in 1..=MAX_LEVEL {
            let shift = MAX_LEVEL - level;
            let ij = ((((i >> shift) & 1) << 1) | ((j >> shift) & 1)) as usize;
            let pos = IJ_TO_POS[usize::from(orientation)][ij];
            bits |= (pos as u64) << (2 * u32::from(shift) + 1);
            orientation ^= POS_TO_ORIENTATION[pos];
        }
        Self(bits | 1)
    }

    /// The leaf cell containing the point `p` (which need not be unit length).
    pub fn from_point(p: DVec3) -> Self {
        let (face, uv) = xyz_to_face_uv(p);
        Self::from_face_ij(face, st_to_ij(uv_to_st(uv.x)), st_to_ij(uv_to_st(uv.y)))
    }

    /// The face this cell belongs to.
    #[allow(
        clippy::cast_possible_truncation,
        reason = "Only the three face bits remain after the shift."
    )]
    pub const fn face(self) -> u8 {
        (self.0 >> POS_BITS) as u8
    }

    /// The lowest set bit, which encodes the level.
    pub const fn lsb(self) -> u64 {
        self.0 & self.0.wrapping_neg()
    }

    /// Subdivision level: 0 for face cells, [`MAX_LEVEL`] for leaves.
    #[allow(
        clippy::cast_possible_truncation,
        reason = "A valid id has at most 60 trailing zeros."
    )]
    pub const fn level(self) -> u8 {
        debug_assert!(self.0 != 0, "level of an invalid cell id");
        MAX_LEVEL - (self.0.trailing_zeros() >> 1) as u8
    }

    /// Whether this is a well-formed cell id.
    pub const fn is_valid(self) -> bool {
        self.face() < NUM_FACES && (self.lsb() & 0x1555_5555_5555_5555) != 0
    }

    /// Whether this is a top-level face cell.
    pub const fn is_face(self) -> bool {
        (self.0 & (Self::lsb_for_level(0) - 1)) == 0
    }

    /// Whether this is a leaf cell.
    pub const fn is_leaf(self) -> bool {
        (self.0 & 1) != 0
    }

    /// The child position (0..=3) of this cell's ancestor at `level` within its parent.
    #[allow(
        clippy::cast_possible_truncation,
        reason = "The value is masked to two bits."
    )]
    pub const fn child_position(self, level: u8) -> usize {
        debug_assert!(level >= 1 && level <= self.level(), "level out of range");
        ((self.0 >> (2 * (MAX_LEVEL - level) as u32 + 1)) & 3) as usize
    }

    /// The child at traversal position `pos` (0..=3).
    pub const fn child(self, pos: usize) -> Self {
        debug_assert!(!self.is_leaf(), "leaf cells have no children");
        debug_assert!(pos < 4, "child position out of range");
        let new_lsb = self.lsb() >> 2;
        Self(self.0 - self.lsb() + (2 * pos as u64 + 1) * new_lsb)
    }

    /// All four children in traversal order.
    pub const fn children(self) -> [Self; 4] {
        [self.child(0), self.child(1), self.child(2), self.child(3)]
    }

    /// The immediate parent. Must not be called on a face cell.
    pub const fn parent(self) -> Self {
        debug_assert!(!self.is_face(), "face cells have no parent");
        let new_lsb = self.lsb() << 2;
        Self((self.0 & new_lsb.wrapping_neg()) | new_lsb)
    }

    /// The ancestor at `level`, which must not exceed this cell's level.
    pub const fn parent_at(self, level: u8) -> Self {
        debug_assert!(level <= self.level(), "ancestor level below this cell");
        let new_lsb = Self::lsb_for_level(level);
        Self((self.0 & new_lsb.wrapping_neg()) | new_lsb)
    }

    /// The first leaf descendant.
    pub const fn range_min(self) -> Self {
        Self(self.0 - (self.lsb() - 1))
    }

    /// The last leaf descendant.
    pub const fn range_max(self) -> Self {
        Self(self.0 + (self.lsb() - 1))
    }

    /// Whether `other` is this cell or one of its descendants.
    pub const fn contains(self, other: Self) -> bool {
        other.0 >= self.range_min().0 && other.0 <= self.range_max().0
    }

    /// Whether one of the two cells contains the other.
    pub const fn intersects(self, other: Self) -> bool {
        other.range_min().0 <= self.range_max().0 && other.range_max().0 >= self.range_min().0
    }

    /// Decode to `(face, i, j, orientation)`, where `(i, j)` are the leaf
    /// coordinates of the cell's lower-left leaf and `orientation` is the
    /// traversal orientation of this cell's children.
    pub fn to_face_ij_orientation(self) -> (u8, u32, u32, u8) {
        let face = self.face();
        let level = self.level();
        let mut orientation = face & SWAP_MASK;
        let (mut i, mut j) = (0_u32, 0_u32);
        for k in 1..=level {
            let pos = self.child_position(k);
            let ij = POS_TO_IJ[usize::from(orientation)][pos];
            i = (i << 1) | u32::from(ij >> 1);
            j = (j << 1) | u32::from(ij & 1);
            orientation ^= POS_TO_ORIENTATION[pos];
        }
        let shift = MAX_LEVEL - level;
        (face, i << shift, j << shift, orientation)
    }

    /// The cell's bound in the (u,v) coordinates of its face.
    pub fn bound_uv(self) -> UvRect {
        let (_, i, j, _) = self.to_face_ij_orientation();
        ij_level_to_bound_uv([i, j], self.level())
    }
}

impl fmt::Display for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.is_valid() {
            return write!(f, "Invalid: {:016x}", self.0);
        }
        write!(f, "{}/", self.face())?;
        for level in 1..=self.level() {
            write!(f, "{}", self.child_position(level))?;
        }
        Ok(())
    }
}

impl fmt::Debug for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CellId({self})")
    }
}
