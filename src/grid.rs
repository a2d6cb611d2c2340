use std::fmt;

/// Largest supported grid dimension. Every in-bounds coordinate fits in a `u8`.
pub const MAX_SIZE: usize = 256;

/// Grid coordinate `(x, y)`, zero-based, `y` growing downwards.
pub type Position = (u8, u8);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tile {
    Wall,
    Floor,
}

/// Tile ids in map descriptions start at 1.
const FIRST_TILE_ID: u32 = 1;

const ALL_TILES: [Tile; 2] = [Tile::Wall, Tile::Floor];

impl Tile {
    /// Look up a tile by its 1-based map id. Returns `None` for unknown ids,
    /// including 0 (an empty cell in the authoring tool).
    pub fn from_id(id: u32) -> Option<Tile> {
        let index = id.checked_sub(FIRST_TILE_ID)?;
        ALL_TILES.get(index as usize).copied()
    }

    pub fn id(&self) -> u32 {
        match self {
            Tile::Wall => FIRST_TILE_ID,
            Tile::Floor => FIRST_TILE_ID + 1,
        }
    }

    pub fn is_solid(&self) -> bool {
        match self {
            Tile::Wall => true,
            Tile::Floor => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

pub const ALL_DIRECTIONS: [Direction; 4] = [
    Direction::Up,
    Direction::Down,
    Direction::Left,
    Direction::Right,
];

impl Direction {
    pub fn delta(&self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }

    /// Parse a LURD move character. Upper case (a push in LURD notation) is
    /// accepted as well, since the engine decides whether a box moves.
    pub fn from_char(ch: char) -> Option<Direction> {
        match ch.to_ascii_lowercase() {
            'u' => Some(Direction::Up),
            'd' => Some(Direction::Down),
            'l' => Some(Direction::Left),
            'r' => Some(Direction::Right),
            _ => None,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Up => write!(f, "Up"),
            Direction::Down => write!(f, "Down"),
            Direction::Left => write!(f, "Left"),
            Direction::Right => write!(f, "Right"),
        }
    }
}

/// Fixed-size tile map. Read-only once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    tiles: Vec<Tile>,
    width: usize,
    height: usize,
}

impl Grid {
    /// Build a grid from row-major tiles.
    /// Panics if the tile count does not match the dimensions or a dimension
    /// exceeds `MAX_SIZE`; the level loader validates both beforehand.
    pub fn new(width: usize, height: usize, tiles: Vec<Tile>) -> Self {
        assert!(
            width <= MAX_SIZE && height <= MAX_SIZE,
            "Grid {}x{} exceeds maximum size {}",
            width,
            height,
            MAX_SIZE
        );
        assert_eq!(tiles.len(), width * height, "tile count mismatch");
        Grid {
            tiles,
            width,
            height,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height
    }

    pub fn tile(&self, pos: Position) -> Tile {
        self.tiles[self.offset(pos)]
    }

    /// Panics when `pos` lies outside the grid.
    pub fn is_solid(&self, pos: Position) -> bool {
        self.tile(pos).is_solid()
    }

    /// Move from `pos` one cell in the given direction.
    /// Returns `None` if the new position falls outside the grid.
    pub fn move_pos(&self, pos: Position, dir: Direction) -> Option<Position> {
        let (dx, dy) = dir.delta();
        let new_x = pos.0 as i32 + dx;
        let new_y = pos.1 as i32 + dy;

        if self.in_bounds(new_x, new_y) {
            Some((new_x as u8, new_y as u8))
        } else {
            None
        }
    }

    /// Row-major offset of `pos`, shared with the placement index.
    pub(crate) fn offset(&self, pos: Position) -> usize {
        let (x, y) = (pos.0 as usize, pos.1 as usize);
        assert!(
            x < self.width && y < self.height,
            "position ({}, {}) out of bounds for {}x{} grid",
            x,
            y,
            self.width,
            self.height
        );
        y * self.width + x
    }
}
