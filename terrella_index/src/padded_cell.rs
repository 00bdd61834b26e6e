// Copyright 2025 the Terrella Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Hierarchy cells with (optionally padded) (u,v) bounds.

use kurbo::Point;
use terrella_cell::cell_id::{IJ_TO_POS, POS_TO_ORIENTATION, SWAP_MASK};
use terrella_cell::coords::{
    MAX_LEVEL, ij_level_to_bound_uv, si_ti_to_st, st_to_ij, st_to_uv, uv_to_st,
};
use terrella_cell::{CellId, Interval, UvRect};

/// A cell in the face quadtree together with its (u,v) bound, expanded on every
/// side by `padding`.
///
/// Padded cells are plain values: children are derived from their parent with
/// [`PaddedCell::child_ij`], which is much cheaper than decoding a [`CellId`]
/// from scratch, and nothing is retained between traversals.
#[derive(Copy, Clone, Debug)]
pub struct PaddedCell {
    id: CellId,
    padding: f64,
    bound: UvRect,
    middle: UvRect,
    ij_lo: [u32; 2],
    orientation: u8,
    level: u8,
}

impl PaddedCell {
    /// Construct a padded cell for `id`. `padding` must be non-negative.
    pub fn new(id: CellId, padding: f64) -> Self {
        debug_assert!(padding >= 0.0, "padding must be non-negative: {padding}");
        if id.is_face() {
            // Faces are the common starting point; skip the decode.
            let limit = 1.0 + padding;
            let full = Interval::new(-limit, limit);
            let mid = Interval::new(-padding, padding);
            return Self {
                id,
                padding,
                bound: UvRect::new(full, full),
                middle: UvRect::new(mid, mid),
                ij_lo: [0, 0],
                orientation: id.face() & SWAP_MASK,
                level: 0,
            };
        }
        let (_, i, j, orientation) = id.to_face_ij_orientation();
        let level = id.level();
        Self {
            id,
            padding,
            bound: ij_level_to_bound_uv([i, j], level).expanded(padding),
            middle: middle_of([i, j], level, padding),
            ij_lo: [i, j],
            orientation,
            level,
        }
    }

    /// The child in quadrant `(i, j)`, where `i` selects the upper half along u
    /// and `j` the upper half along v. This cell must not be a leaf.
    pub fn child_ij(&self, i: usize, j: usize) -> Self {
        debug_assert!(i < 2 && j < 2, "child quadrant out of range: ({i}, {j})");
        debug_assert!(!self.id.is_leaf(), "leaf cells have no children");
        let pos = IJ_TO_POS[usize::from(self.orientation)][2 * i + j];
        let level = self.level + 1;
        let size = CellId::size_ij(level);
        let ij_lo = [
            self.ij_lo[0] + if i == 1 { size } else { 0 },
            self.ij_lo[1] + if j == 1 { size } else { 0 },
        ];

        // The child shares the parent's outer edges and ends at the padded
        // middle on the inner ones.
        let mut bound = self.bound;
        bound.u.set_bound(1 - i, self.middle.u.bound(1 - i));
        bound.v.set_bound(1 - j, self.middle.v.bound(1 - j));

        Self {
            id: self.id.child(pos),
            padding: self.padding,
            bound,
            middle: middle_of(ij_lo, level, self.padding),
            ij_lo,
            orientation: self.orientation ^ POS_TO_ORIENTATION[pos],
            level,
        }
    }

    /// The cell id.
    pub fn id(&self) -> CellId {
        self.id
    }

    /// The padding applied to every side of the bound.
    pub fn padding(&self) -> f64 {
        self.padding
    }

    /// Subdivision level of the cell.
    pub fn level(&self) -> u8 {
        self.level
    }

    /// Traversal orientation of the cell's children.
    pub fn orientation(&self) -> u8 {
        self.orientation
    }

    /// The padded (u,v) bound.
    pub fn bound(&self) -> &UvRect {
        &self.bound
    }

    /// The rectangle where all four padded children overlap: the cell's
    /// center expanded by `padding` on every side.
    pub fn middle(&self) -> &UvRect {
        &self.middle
    }

    /// The (u,v) coordinates of the cell center.
    pub fn center(&self) -> Point {
        center_of(self.ij_lo, self.level)
    }

    /// The smallest descendant of this cell (possibly itself) that contains
    /// `rect` once `rect` is padded like the cell.
    ///
    /// The search stops at this cell as soon as `rect` straddles either center
    /// line. A rectangle degenerate to a point descends to a leaf. `rect` must
    /// intersect the cell's bound.
    pub fn shrink_to_fit(&self, rect: &UvRect) -> CellId {
        debug_assert!(self.bound.intersects(rect), "rectangle is outside the cell");
        let ij_size = CellId::size_ij(self.level);
        if self.level == 0 {
            if rect.u.contains(0.0) || rect.v.contains(0.0) {
                return self.id;
            }
        } else {
            let center = self.center();
            if rect.u.contains(center.x) || rect.v.contains(center.y) {
                return self.id;
            }
        }

        // Find the leaf coordinate range covered by the padded rectangle,
        // restricted to this cell. The highest differing bit between the two
        // ends tells how far the range can be shrunk.
        let padded = rect.expanded(self.padding + 1.5 * f64::EPSILON);
        let mut ij_min = [0_u32; 2];
        let mut ij_xor = 0_u32;
        for d in 0..2 {
            let axis = padded.axis(d);
            let lo = self.ij_lo[d].max(st_to_ij(uv_to_st(axis.lo)));
            let hi = (self.ij_lo[d] + ij_size - 1).min(st_to_ij(uv_to_st(axis.hi)));
            ij_min[d] = lo;
            ij_xor |= lo ^ hi;
        }
        let level_msb = (ij_xor << 1) + 1;
        let level = max_level_minus(level_msb.ilog2());
        if level <= self.level {
            return self.id;
        }
        CellId::from_face_ij(self.id.face(), ij_min[0], ij_min[1]).parent_at(level)
    }
}

#[allow(
    clippy::cast_possible_truncation,
    reason = "The log of a value below 2^31 is at most 30."
)]
fn max_level_minus(log2: u32) -> u8 {
    MAX_LEVEL - log2 as u8
}

/// The (u,v) center of the cell at `level` whose low corner is `ij_lo`.
fn center_of(ij_lo: [u32; 2], level: u8) -> Point {
    let size = u64::from(CellId::size_ij(level));
    let axis = |lo: u32| st_to_uv(si_ti_to_st(2 * u64::from(lo) + size));
    Point::new(axis(ij_lo[0]), axis(ij_lo[1]))
}

fn middle_of(ij_lo: [u32; 2], level: u8, padding: f64) -> UvRect {
    let c = center_of(ij_lo, level);
    UvRect::new(
        Interval::new(c.x - padding, c.x + padding),
        Interval::new(c.y - padding, c.y + padding),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use terrella_cell::NUM_FACES;

    #[test]
    fn face_cell_bounds() {
        let p = PaddedCell::new(CellId::from_face(4), 0.0);
        assert_eq!(p.bound().u, Interval::new(-1.0, 1.0));
        assert_eq!(p.middle().v, Interval::new(0.0, 0.0));
        assert_eq!(p.level(), 0);
        assert_eq!(p.orientation(), 0);
        assert_eq!(PaddedCell::new(CellId::from_face(3), 0.0).orientation(), SWAP_MASK);

        let padded = PaddedCell::new(CellId::from_face(0), 0.25);
        assert_eq!(padded.bound().v, Interval::new(-1.25, 1.25));
        assert_eq!(padded.middle().u, Interval::new(-0.25, 0.25));
    }

    #[test]
    fn children_match_decoded_cells() {
        for face in 0..NUM_FACES {
            let mut cell = PaddedCell::new(CellId::from_face(face), 0.0);
            // Walk down a zig-zag path and compare against a fresh decode.
            for step in 0..12_usize {
                let (i, j) = (step % 2, (step / 2) % 2);
                let child = cell.child_ij(i, j);
                let fresh = PaddedCell::new(child.id(), 0.0);
                assert_eq!(child.id().parent(), cell.id());
                assert_eq!(child.bound(), fresh.bound());
                assert_eq!(child.middle(), fresh.middle());
                assert_eq!(child.orientation(), fresh.orientation());
                assert_eq!(child.ij_lo, fresh.ij_lo);
                assert_eq!(*child.bound(), child.id().bound_uv());
                cell = child;
            }
        }
    }

    #[test]
    fn children_tile_the_parent() {
        let parent = PaddedCell::new(CellId::from_face(2).child(3).child(1), 0.0);
        let b = parent.bound();
        let c = parent.center();
        let low = parent.child_ij(0, 0);
        let high = parent.child_ij(1, 1);
        assert_eq!(low.bound().lo(), b.lo());
        assert_eq!(low.bound().hi(), c);
        assert_eq!(high.bound().lo(), c);
        assert_eq!(high.bound().hi(), b.hi());
    }

    #[test]
    fn padded_children_overlap() {
        let parent = PaddedCell::new(CellId::from_face(1), 0.125);
        let left = parent.child_ij(0, 0);
        let right = parent.child_ij(1, 0);
        assert_eq!(left.bound().u, Interval::new(-1.125, 0.125));
        assert_eq!(right.bound().u, Interval::new(-0.125, 1.125));
    }

    #[test]
    fn shrink_stops_at_straddle() {
        let face = PaddedCell::new(CellId::from_face(0), 0.0);
        let across = UvRect::from_point_pair(Point::new(-0.5, 0.2), Point::new(0.5, 0.4));
        assert_eq!(face.shrink_to_fit(&across), face.id());

        let quadrant = UvRect::from_point_pair(Point::new(0.1, 0.1), Point::new(0.9, 0.9));
        let id = face.shrink_to_fit(&quadrant);
        assert_eq!(id.level(), 1);
        assert!(id.bound_uv().contains(&quadrant));
    }

    #[test]
    fn shrink_point_reaches_leaf() {
        let face = PaddedCell::new(CellId::from_face(5), 0.0);
        let p = Point::new(0.3, -0.7);
        let id = face.shrink_to_fit(&UvRect::from_point_pair(p, p));
        assert!(id.is_leaf());
        assert!(id.bound_uv().expanded(1e-15).contains_point(p));
    }

    fn arb_rect() -> impl Strategy<Value = UvRect> {
        (-1.0_f64..1.0, -1.0_f64..1.0, 0.0_f64..0.5, 0.0_f64..0.5).prop_map(|(u, v, du, dv)| {
            UvRect::from_point_pair(
                Point::new(u, v),
                Point::new((u + du).min(1.0), (v + dv).min(1.0)),
            )
        })
    }

    proptest! {
        #[test]
        fn shrink_contains_rect(face in 0..NUM_FACES, rect in arb_rect(), path in 0_usize..4) {
            let mut cell = PaddedCell::new(CellId::from_face(face), 0.0);
            // Start below the face when the rectangle fits one child.
            let child = cell.child_ij(path / 2, path % 2);
            if child.bound().contains(&rect) {
                cell = child;
            }
            let id = cell.shrink_to_fit(&rect);
            prop_assert!(cell.id().contains(id));
            prop_assert!(id.bound_uv().expanded(1e-15).contains(&rect));
        }
    }
}
