use arrayvec::ArrayVec;
use log::debug;

use crate::{
    config::MAX_CHAIN_LEN,
    grid::{Direction, Grid, Position},
    placement::Placement,
};

/// Box moves produced by a successful push resolution, deepest box first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PushPlan {
    moves: ArrayVec<(Position, Position), MAX_CHAIN_LEN>,
}

impl PushPlan {
    pub fn new() -> Self {
        Self::default()
    }

    /// `(from, to)` pairs in commit order.
    pub fn moves(&self) -> &[(Position, Position)] {
        &self.moves
    }

    pub fn len(&self) -> usize {
        self.moves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }
}

/// Decides whether the chain of boxes starting at a cell can shift one cell
/// in a direction. Resolution never mutates the placement; a resolved plan is
/// applied with [`commit`].
pub struct Resolver<'a> {
    grid: &'a Grid,
    placement: &'a Placement,
    max_chain_len: usize,
}

impl<'a> Resolver<'a> {
    /// Panics if `max_chain_len` exceeds `MAX_CHAIN_LEN`; `PuzzleConfig`
    /// validates it first.
    pub fn new(grid: &'a Grid, placement: &'a Placement, max_chain_len: usize) -> Self {
        assert!(
            max_chain_len <= MAX_CHAIN_LEN,
            "chain length {} exceeds maximum {}",
            max_chain_len,
            MAX_CHAIN_LEN
        );
        Resolver {
            grid,
            placement,
            max_chain_len,
        }
    }

    /// Resolve a push into `start`, where `start` is the `chain_index`-th cell
    /// of the chain (1 for the cell the player steps into).
    ///
    /// Returns the moves to apply, or `None` if the push is illegal. An empty
    /// plan means the cell is free floor and the player simply walks. Chain
    /// indices start at 1, so an index of 0 is always rejected.
    pub fn resolve(
        &self,
        start: Position,
        direction: Direction,
        chain_index: usize,
    ) -> Option<PushPlan> {
        let mut plan = PushPlan::new();
        if self.resolve_into(start, direction, chain_index, &mut plan) {
            Some(plan)
        } else {
            None
        }
    }

    fn resolve_into(
        &self,
        start: Position,
        direction: Direction,
        chain_index: usize,
        plan: &mut PushPlan,
    ) -> bool {
        debug!(
            "Trying to move ({}, {}) {}, chain index {}",
            start.0, start.1, direction, chain_index
        );

        if chain_index == 0 || chain_index > self.max_chain_len {
            return false;
        }
        if self.grid.is_solid(start) {
            return false;
        }
        if !self.placement.has_box_at(start) {
            return true;
        }

        let Some(next) = self.grid.move_pos(start, direction) else {
            return false;
        };
        if self.grid.is_solid(next) {
            return false;
        }

        // The box behind must move out of the way first
        if self.placement.has_box_at(next)
            && !self.resolve_into(next, direction, chain_index + 1, plan)
        {
            return false;
        }

        debug!("Box ({}, {}) -> ({}, {})", start.0, start.1, next.0, next.1);
        plan.moves.try_push((start, next)).is_ok()
    }
}

/// Apply a resolved plan. Moves are ordered deepest box first, so every
/// destination is already vacated when its box arrives.
pub fn commit(plan: &PushPlan, placement: &mut Placement) {
    for &(from, to) in plan.moves() {
        placement.move_box(from, to);
    }
}

/// Resolve and, on success, commit a push in one call.
pub fn resolve_push(
    grid: &Grid,
    placement: &mut Placement,
    start: Position,
    direction: Direction,
    chain_index: usize,
    max_chain_len: usize,
) -> bool {
    let plan = Resolver::new(grid, placement, max_chain_len).resolve(
        start,
        direction,
        chain_index,
    );
    match plan {
        Some(plan) => {
            commit(&plan, placement);
            true
        }
        None => false,
    }
}
