//! Sokoban move engine.
//! - Tile grid and box/holder placement
//! - Recursive box-chain pushing with a configurable chain length
//! - Win detection and step counting
//! - Level loading from Tiled-style maps and XSB text

pub mod config;
pub mod grid;
pub mod levels;
pub mod map;
pub mod placement;
pub mod push;
pub mod puzzle;

pub use config::{ConfigError, MAX_CHAIN_LEN, PuzzleConfig};
pub use grid::{ALL_DIRECTIONS, Direction, Grid, MAX_SIZE, Position, Tile};
pub use levels::{Level, LevelError, LevelSet, Levels};
pub use map::{MapDescription, MapObject, TILE_SIZE};
pub use placement::Placement;
pub use push::{PushPlan, Resolver, resolve_push};
pub use puzzle::{MoveOutcome, Puzzle, PuzzleListener};
