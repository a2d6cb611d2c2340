use crate::grid::{Grid, Position};

const NO_BOX: u16 = u16::MAX;

/// Box positions and holder cells of a loaded level.
///
/// Boxes are stored both as a list of positions and as a row-major index from
/// cell to box, so `has_box_at` is a single lookup. Holders never change after
/// load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    positions: Vec<Position>,
    // Maps cell offset to box index (NO_BOX = empty cell)
    index: Vec<u16>,
    width: usize,
    height: usize,
    holders: Vec<Position>,
}

impl Placement {
    /// Create an empty placement sized for `grid`. Holders are sorted and
    /// de-duplicated.
    pub fn new(grid: &Grid, mut holders: Vec<Position>) -> Self {
        holders.sort_unstable();
        holders.dedup();
        // Panics on holders outside the grid
        for &pos in &holders {
            grid.offset(pos);
        }

        Placement {
            positions: Vec::new(),
            index: vec![NO_BOX; grid.width() * grid.height()],
            width: grid.width(),
            height: grid.height(),
            holders,
        }
    }

    /// Place a new box. Panics if the cell already holds one.
    pub fn add_box(&mut self, pos: Position) {
        let offset = self.offset(pos);
        assert!(
            self.index[offset] == NO_BOX,
            "Cannot add box at ({}, {}): cell occupied",
            pos.0,
            pos.1
        );
        self.index[offset] = self.positions.len() as u16;
        self.positions.push(pos);
    }

    pub fn has_box_at(&self, pos: Position) -> bool {
        self.index[self.offset(pos)] != NO_BOX
    }

    /// Relocate the box at `from` to `to`. Source and destination are updated
    /// together so the box is never duplicated or lost.
    pub fn move_box(&mut self, from: Position, to: Position) {
        let from_offset = self.offset(from);
        let to_offset = self.offset(to);
        let idx = self.index[from_offset];
        assert!(idx != NO_BOX, "No box at ({}, {})", from.0, from.1);
        assert!(
            self.index[to_offset] == NO_BOX,
            "Cannot move box to ({}, {}): destination occupied",
            to.0,
            to.1
        );

        self.positions[idx as usize] = to;
        self.index[from_offset] = NO_BOX;
        self.index[to_offset] = idx;
    }

    pub fn holders(&self) -> &[Position] {
        &self.holders
    }

    pub fn is_holder(&self, pos: Position) -> bool {
        self.holders.binary_search(&pos).is_ok()
    }

    pub fn box_positions(&self) -> &[Position] {
        &self.positions
    }

    pub fn box_count(&self) -> usize {
        self.positions.len()
    }

    pub fn boxes_on_holders(&self) -> usize {
        self.holders
            .iter()
            .filter(|&&pos| self.has_box_at(pos))
            .count()
    }

    fn offset(&self, pos: Position) -> usize {
        let (x, y) = (pos.0 as usize, pos.1 as usize);
        assert!(
            x < self.width && y < self.height,
            "position ({}, {}) out of bounds",
            x,
            y
        );
        y * self.width + x
    }
}
