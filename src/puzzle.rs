use log::{info, trace};
use std::{fmt, sync::Arc};

use crate::{
    config::PuzzleConfig,
    grid::{Direction, Grid, Position, Tile},
    levels::{Level, LevelError},
    map::MapDescription,
    placement::Placement,
    push::{self, Resolver},
};

/// Receives state changes of a puzzle. Both callbacks default to doing
/// nothing; `()` is the listener for callers that don't care.
pub trait PuzzleListener {
    fn on_steps_changed(&mut self, _steps: u32) {}

    fn on_level_completed(&mut self) {}
}

impl PuzzleListener for () {}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MoveOutcome {
    pub player_moved: bool,
    pub boxes_pushed: usize,
}

/// A level being played: the board plus the player, the step counter and the
/// completion latch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Puzzle {
    grid: Arc<Grid>,
    placement: Placement,
    player: Position,
    facing: Direction,
    steps: u32,
    completed: bool,
    config: PuzzleConfig,
    initial: Level,
}

impl Puzzle {
    pub fn new(level: Level, config: PuzzleConfig) -> Self {
        let mut puzzle = Puzzle {
            grid: Arc::clone(&level.grid),
            placement: level.placement.clone(),
            player: level.player,
            facing: Direction::Down,
            steps: 0,
            completed: false,
            config,
            initial: level,
        };
        // A level can start solved, e.g. when it has no holders
        puzzle.completed = puzzle.check_win();
        puzzle
    }

    pub fn load(map: &MapDescription, config: PuzzleConfig) -> Result<Self, LevelError> {
        Ok(Self::new(Level::from_map(map)?, config))
    }

    /// Try to step the player one cell, pushing whatever boxes lie ahead.
    ///
    /// Blocked moves change nothing except the facing. Once the puzzle is
    /// completed the board is frozen and every call is a no-op.
    pub fn attempt_move<L: PuzzleListener>(
        &mut self,
        direction: Direction,
        listener: &mut L,
    ) -> MoveOutcome {
        if self.completed {
            return MoveOutcome::default();
        }
        self.facing = direction;

        let Some(dest) = self.grid.move_pos(self.player, direction) else {
            trace!("Move {} blocked by grid edge", direction);
            return MoveOutcome::default();
        };

        let plan = Resolver::new(&self.grid, &self.placement, self.config.max_chain_len)
            .resolve(dest, direction, 1);
        let Some(plan) = plan else {
            trace!("Move {} to ({}, {}) blocked", direction, dest.0, dest.1);
            return MoveOutcome::default();
        };

        push::commit(&plan, &mut self.placement);
        self.player = dest;
        self.steps += 1;
        listener.on_steps_changed(self.steps);

        if self.check_win() {
            self.completed = true;
            info!("Level completed in {} steps", self.steps);
            listener.on_level_completed();
        }

        MoveOutcome {
            player_moved: true,
            boxes_pushed: plan.len(),
        }
    }

    /// True if every holder is covered by a box.
    pub fn check_win(&self) -> bool {
        self.placement
            .holders()
            .iter()
            .all(|&pos| self.placement.has_box_at(pos))
    }

    /// Report the current step count, e.g. to initialise a freshly attached HUD.
    pub fn notify_steps<L: PuzzleListener>(&self, listener: &mut L) {
        listener.on_steps_changed(self.steps);
    }

    /// Report completion to a listener that missed it, such as one attached
    /// to a level that loaded already solved. Does nothing while unsolved.
    pub fn notify_completed<L: PuzzleListener>(&self, listener: &mut L) {
        if self.completed {
            listener.on_level_completed();
        }
    }

    /// Put the level back into its loaded state.
    pub fn restart(&mut self) {
        *self = Puzzle::new(self.initial.clone(), self.config);
    }

    pub fn steps(&self) -> u32 {
        self.steps
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    pub fn player(&self) -> Position {
        self.player
    }

    /// Direction of the last attempted move, for presentation.
    pub fn facing(&self) -> Direction {
        self.facing
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn placement(&self) -> &Placement {
        &self.placement
    }

    pub fn config(&self) -> &PuzzleConfig {
        &self.config
    }
}

impl fmt::Display for Puzzle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for y in 0..self.grid.height() {
            let mut line = String::new();
            for x in 0..self.grid.width() {
                let pos = (x as u8, y as u8);
                let holder = self.placement.is_holder(pos);

                let ch = if pos == self.player {
                    if holder { '+' } else { '@' }
                } else if self.placement.has_box_at(pos) {
                    if holder { '*' } else { '$' }
                } else if holder {
                    '.'
                } else {
                    match self.grid.tile(pos) {
                        Tile::Wall => '#',
                        Tile::Floor => ' ',
                    }
                };
                line.push(ch);
            }
            // Trim trailing spaces to match the XSB input format
            writeln!(f, "{}", line.trim_end())?;
        }
        Ok(())
    }
}
