use log::info;
use std::{
    fs, io,
    path::{Path, PathBuf},
    sync::Arc,
};
use thiserror::Error;

use crate::{
    grid::{Grid, MAX_SIZE, Position, Tile},
    map::{BACKGROUND_LAYER, MapDescription, MapObject, OBJECTS_LAYER, TILE_SIZE},
    placement::Placement,
};

/// Error type for level loading operations.
#[derive(Error, Debug)]
pub enum LevelError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid map file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Malformed level: {0}")]
    Malformed(String),
}

impl From<String> for LevelError {
    fn from(msg: String) -> Self {
        LevelError::Malformed(msg)
    }
}

/// Initial simulation state of a level: the tile grid, box and holder
/// placement, and where the player starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Level {
    pub grid: Arc<Grid>,
    pub placement: Placement,
    pub player: Position,
}

enum ObjectKind {
    Player,
    Box,
    Holder,
}

impl ObjectKind {
    fn from_name(name: &str) -> Option<ObjectKind> {
        match name {
            "Player" => Some(ObjectKind::Player),
            "Box" => Some(ObjectKind::Box),
            "Holder" => Some(ObjectKind::Holder),
            _ => None,
        }
    }
}

impl Level {
    /// Build the initial state from a map description.
    ///
    /// The map must have a `Background` tile layer and an `Objects` layer with
    /// exactly one `Player` and any number of `Box` and `Holder` objects, all
    /// inside the grid. Nothing is returned unless the whole map is valid.
    pub fn from_map(map: &MapDescription) -> Result<Self, LevelError> {
        let tiles = map
            .tile_layer(BACKGROUND_LAYER)
            .ok_or_else(|| format!("Missing tile layer '{}'", BACKGROUND_LAYER))?;
        let objects = map
            .object_layer(OBJECTS_LAYER)
            .ok_or_else(|| format!("Missing object layer '{}'", OBJECTS_LAYER))?;

        let (width, height) = (tiles.width, tiles.height);
        if width == 0 || height == 0 {
            return Err(format!("Empty tile layer ({}x{})", width, height).into());
        }
        if width > MAX_SIZE || height > MAX_SIZE {
            return Err(format!(
                "Map size {}x{} exceeds maximum size {}",
                width, height, MAX_SIZE
            )
            .into());
        }
        if tiles.data.len() != width * height {
            return Err(format!(
                "Tile layer has {} tiles, expected {}",
                tiles.data.len(),
                width * height
            )
            .into());
        }

        let grid_tiles = tiles
            .data
            .iter()
            .enumerate()
            .map(|(i, &id)| {
                Tile::from_id(id).ok_or_else(|| {
                    format!(
                        "Unknown tile id {} at position ({}, {})",
                        id,
                        i % width,
                        i / width
                    )
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        let grid = Grid::new(width, height, grid_tiles);

        let mut player = None;
        let mut boxes = Vec::new();
        let mut holders = Vec::new();

        for obj in &objects.objects {
            let kind = ObjectKind::from_name(&obj.name)
                .ok_or_else(|| format!("Unknown object type '{}'", obj.name))?;
            let pos = object_cell(&grid, obj)?;

            match kind {
                ObjectKind::Player => {
                    if player.is_some() {
                        return Err("Multiple players found".to_string().into());
                    }
                    player = Some(pos);
                }
                ObjectKind::Box => boxes.push(pos),
                ObjectKind::Holder => holders.push(pos),
            }
        }

        let player = player.ok_or("No player found on map".to_string())?;
        if grid.is_solid(player) {
            return Err(format!(
                "Player starts inside a wall at ({}, {})",
                player.0, player.1
            )
            .into());
        }

        let mut placement = Placement::new(&grid, holders);
        for pos in boxes {
            if grid.is_solid(pos) {
                return Err(format!("Box inside a wall at ({}, {})", pos.0, pos.1).into());
            }
            if placement.has_box_at(pos) {
                return Err(format!("Multiple boxes at ({}, {})", pos.0, pos.1).into());
            }
            placement.add_box(pos);
        }
        if placement.has_box_at(player) {
            return Err(format!(
                "Player starts on a box at ({}, {})",
                player.0, player.1
            )
            .into());
        }

        info!(
            "Loaded {}x{} level: {} boxes, {} holders",
            width,
            height,
            placement.box_count(),
            placement.holders().len()
        );

        Ok(Level {
            grid: Arc::new(grid),
            placement,
            player,
        })
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, LevelError> {
        Self::from_map(&MapDescription::from_file(path)?)
    }
}

/// Convert an object's pixel anchor to its grid cell. Objects sit one tile
/// below their logical cell, so the vertical coordinate is shifted up by one
/// tile before dividing.
fn object_cell(grid: &Grid, obj: &MapObject) -> Result<Position, LevelError> {
    if !obj.x.is_finite() || !obj.y.is_finite() {
        return Err(format!("{} has a non-finite position", obj.name).into());
    }
    // Casts saturate, so far-off coordinates land outside the grid below
    let x = (obj.x.floor() as i64).div_euclid(TILE_SIZE);
    let y = (obj.y.floor() as i64).saturating_sub(TILE_SIZE).div_euclid(TILE_SIZE);

    let in_bounds =
        x >= 0 && y >= 0 && (x as usize) < grid.width() && (y as usize) < grid.height();
    if !in_bounds {
        return Err(format!(
            "{} at ({}, {}) is outside the {}x{} grid",
            obj.name,
            x,
            y,
            grid.width(),
            grid.height()
        )
        .into());
    }
    Ok((x as u8, y as u8))
}

/// A collection of levels in XSB format.
#[derive(Debug)]
pub struct Levels {
    levels: Vec<MapDescription>,
}

impl Levels {
    /// Parse XSB-formatted levels from a string.
    ///
    /// Lines starting with `;` and empty lines separate levels.
    pub fn from_text(contents: &str) -> Result<Self, LevelError> {
        let mut levels = Vec::new();
        let mut current_level = String::new();

        for line in contents.lines() {
            let separator = line.trim_start().starts_with(';') || line.trim().is_empty();
            if separator {
                if !current_level.is_empty() {
                    levels.push(MapDescription::from_xsb(current_level.trim_end())?);
                    current_level.clear();
                }
                continue;
            }

            current_level.push_str(line);
            current_level.push('\n');
        }

        // Last level if the file doesn't end with a separator
        if !current_level.is_empty() {
            levels.push(MapDescription::from_xsb(current_level.trim_end())?);
        }

        Ok(Levels { levels })
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, LevelError> {
        let contents = fs::read_to_string(path)?;
        Self::from_text(&contents)
    }

    /// Get the nth level (0-indexed).
    pub fn get(&self, index: usize) -> Option<&MapDescription> {
        self.levels.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &MapDescription> {
        self.levels.iter()
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }
}

/// Ordered list of level files with a cursor on the level being played.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LevelSet {
    levels: Vec<PathBuf>,
    selected: usize,
}

impl LevelSet {
    pub fn new(levels: Vec<PathBuf>) -> Self {
        LevelSet {
            levels,
            selected: 0,
        }
    }

    /// Collect `.json` and `.xsb` files from a directory, sorted by name.
    pub fn from_dir(path: impl AsRef<Path>) -> Result<Self, LevelError> {
        let mut levels = Vec::new();
        for entry in fs::read_dir(path)? {
            let path = entry?.path();
            let is_level = matches!(
                path.extension().and_then(|ext| ext.to_str()),
                Some("json") | Some("xsb")
            );
            if path.is_file() && is_level {
                levels.push(path);
            }
        }
        levels.sort();
        Ok(Self::new(levels))
    }

    pub fn list(&self) -> &[PathBuf] {
        &self.levels
    }

    pub fn current(&self) -> Option<&Path> {
        self.levels.get(self.selected).map(PathBuf::as_path)
    }

    /// True if there is a level after the current one.
    pub fn has_more(&self) -> bool {
        self.selected + 1 < self.levels.len()
    }

    /// Move the cursor to the next level and return it.
    pub fn advance(&mut self) -> Option<&Path> {
        if !self.has_more() {
            return None;
        }
        self.selected += 1;
        self.current()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::{Layer, ObjectLayer, TileLayer};

    fn row_map(data: Vec<u32>, objects: Vec<MapObject>) -> MapDescription {
        MapDescription {
            layers: vec![
                Layer::Tiles(TileLayer {
                    name: BACKGROUND_LAYER.to_string(),
                    width: data.len(),
                    height: 1,
                    data,
                }),
                Layer::Objects(ObjectLayer {
                    name: OBJECTS_LAYER.to_string(),
                    objects,
                }),
            ],
        }
    }

    fn malformed(result: Result<Level, LevelError>) -> bool {
        matches!(result, Err(LevelError::Malformed(_)))
    }

    #[test]
    fn test_from_map_basic() {
        let map = row_map(
            vec![2, 2, 2],
            vec![
                MapObject::at_cell("Player", 0, 0),
                MapObject::at_cell("Box", 1, 0),
                MapObject::at_cell("Holder", 2, 0),
            ],
        );
        let level = Level::from_map(&map).unwrap();

        assert_eq!(level.grid.width(), 3);
        assert_eq!(level.grid.height(), 1);
        assert_eq!(level.player, (0, 0));
        assert_eq!(level.placement.box_positions(), &[(1, 0)]);
        assert_eq!(level.placement.holders(), &[(2, 0)]);
    }

    #[test]
    fn test_vertical_offset() {
        // Pixel y = 64 anchors the object on row 1 of a 2-row map
        let mut map = MapDescription::from_xsb("  \n  ").unwrap();
        if let Some(Layer::Objects(objects)) = map.layers.get_mut(1) {
            objects.objects.push(MapObject {
                name: "Player".to_string(),
                x: 40.0,
                y: 64.0,
                width: 32.0,
                height: 32.0,
            });
        }
        let level = Level::from_map(&map).unwrap();
        assert_eq!(level.player, (1, 1));
    }

    #[test]
    fn test_object_above_grid() {
        // y = 0 maps to row -1
        let map = row_map(
            vec![2, 2],
            vec![MapObject {
                name: "Player".to_string(),
                x: 0.0,
                y: 0.0,
                width: 32.0,
                height: 32.0,
            }],
        );
        assert!(malformed(Level::from_map(&map)));
    }

    #[test]
    fn test_object_far_outside_grid() {
        let player = MapObject::at_cell("Player", 0, 0);
        for (x, y) in [
            (32.0, -1e30),
            (32.0, 1e30),
            (-1e30, 32.0),
            (1e30, 32.0),
            (f64::NAN, 32.0),
            (32.0, f64::NEG_INFINITY),
        ] {
            let far = MapObject {
                name: "Box".to_string(),
                x,
                y,
                width: 32.0,
                height: 32.0,
            };
            let map = row_map(vec![2, 2], vec![player.clone(), far]);
            assert!(malformed(Level::from_map(&map)), "({}, {})", x, y);
        }
    }

    #[test]
    fn test_missing_layers() {
        let mut map = row_map(vec![2, 2], vec![MapObject::at_cell("Player", 0, 0)]);
        map.layers.remove(1);
        assert!(malformed(Level::from_map(&map)));

        let mut map = row_map(vec![2, 2], vec![MapObject::at_cell("Player", 0, 0)]);
        map.layers.remove(0);
        assert!(malformed(Level::from_map(&map)));
    }

    #[test]
    fn test_invalid_objects() {
        let unknown = row_map(
            vec![2, 2],
            vec![
                MapObject::at_cell("Player", 0, 0),
                MapObject::at_cell("Ghost", 1, 0),
            ],
        );
        assert!(malformed(Level::from_map(&unknown)));

        let two_players = row_map(
            vec![2, 2],
            vec![
                MapObject::at_cell("Player", 0, 0),
                MapObject::at_cell("Player", 1, 0),
            ],
        );
        assert!(malformed(Level::from_map(&two_players)));

        let no_player = row_map(vec![2, 2], vec![MapObject::at_cell("Box", 1, 0)]);
        assert!(malformed(Level::from_map(&no_player)));
    }

    #[test]
    fn test_out_of_bounds_objects() {
        let box_outside = row_map(
            vec![2, 2],
            vec![
                MapObject::at_cell("Player", 0, 0),
                MapObject::at_cell("Box", 2, 0),
            ],
        );
        assert!(malformed(Level::from_map(&box_outside)));

        let holder_outside = row_map(
            vec![2, 2],
            vec![
                MapObject::at_cell("Player", 0, 0),
                MapObject::at_cell("Holder", 0, 1),
            ],
        );
        assert!(malformed(Level::from_map(&holder_outside)));
    }

    #[test]
    fn test_invalid_tiles() {
        let map = row_map(vec![2, 0], vec![MapObject::at_cell("Player", 0, 0)]);
        assert!(malformed(Level::from_map(&map)));

        let mut map = row_map(vec![2, 2], vec![MapObject::at_cell("Player", 0, 0)]);
        if let Some(Layer::Tiles(tiles)) = map.layers.get_mut(0) {
            tiles.data.pop();
        }
        assert!(malformed(Level::from_map(&map)));
    }

    #[test]
    fn test_invalid_placement() {
        let mut player_in_wall = MapDescription::from_xsb("#").unwrap();
        if let Some(Layer::Objects(objects)) = player_in_wall.layers.get_mut(1) {
            objects.objects.push(MapObject::at_cell("Player", 0, 0));
        }
        assert!(malformed(Level::from_map(&player_in_wall)));

        let stacked_boxes = row_map(
            vec![2, 2],
            vec![
                MapObject::at_cell("Player", 0, 0),
                MapObject::at_cell("Box", 1, 0),
                MapObject::at_cell("Box", 1, 0),
            ],
        );
        assert!(malformed(Level::from_map(&stacked_boxes)));

        let player_on_box = row_map(
            vec![2, 2],
            vec![
                MapObject::at_cell("Player", 1, 0),
                MapObject::at_cell("Box", 1, 0),
            ],
        );
        assert!(malformed(Level::from_map(&player_on_box)));
    }

    #[test]
    fn test_load_is_pure() {
        let map = MapDescription::from_xsb("######\n#@$ .#\n# $. #\n######").unwrap();
        let first = Level::from_map(&map).unwrap();
        let second = Level::from_map(&map).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_levels_from_text() {
        let level1 = "####\n# .#\n#  ###\n#*@  #\n#  $ #\n#  ###\n####";
        let level2 = "######\n#    #\n# #@ #\n# $* #\n# .* #\n#    #\n######";
        let contents = format!("; 1\n\n{}\n\n; 2\n\n{}\n", level1, level2);

        let levels = Levels::from_text(&contents).unwrap();
        assert_eq!(levels.len(), 2);

        let first = Level::from_map(levels.get(0).unwrap()).unwrap();
        assert_eq!(first.player, (2, 3));
        assert_eq!(first.placement.box_count(), 2);

        let second = Level::from_map(levels.get(1).unwrap()).unwrap();
        assert_eq!(second.player, (3, 2));
        assert_eq!(second.placement.box_count(), 3);
        assert!(levels.get(2).is_none());
    }

    #[test]
    fn test_levels_from_text_invalid_level() {
        let result = Levels::from_text("; 1\n\n####\n#@x #\n####\n");
        assert!(matches!(result, Err(LevelError::Malformed(_))));
    }

    #[test]
    fn test_levels_from_file_no_file() {
        let result = Levels::from_file("nonexistent_file.xsb");
        assert!(matches!(result, Err(LevelError::Io(_))));
    }

    #[test]
    fn test_level_from_file() {
        let map = row_map(
            vec![2, 2, 2],
            vec![
                MapObject::at_cell("Player", 0, 0),
                MapObject::at_cell("Box", 1, 0),
                MapObject::at_cell("Holder", 2, 0),
            ],
        );
        let path =
            std::env::temp_dir().join(format!("pushbox-level-{}.json", std::process::id()));
        fs::write(&path, serde_json::to_string(&map).unwrap()).unwrap();

        let level = Level::from_file(&path).unwrap();
        assert_eq!(level, Level::from_map(&map).unwrap());
        assert_eq!(level.player, (0, 0));

        fs::remove_file(&path).unwrap();
        assert!(matches!(Level::from_file(&path), Err(LevelError::Io(_))));
    }

    #[test]
    fn test_level_set_cursor() {
        let mut set = LevelSet::new(vec![
            PathBuf::from("a.json"),
            PathBuf::from("b.json"),
            PathBuf::from("c.xsb"),
        ]);
        assert_eq!(set.current(), Some(Path::new("a.json")));
        assert!(set.has_more());
        assert_eq!(set.advance(), Some(Path::new("b.json")));
        assert!(set.has_more());
        assert_eq!(set.advance(), Some(Path::new("c.xsb")));
        assert!(!set.has_more());
        assert_eq!(set.advance(), None);
        assert_eq!(set.current(), Some(Path::new("c.xsb")));
    }

    #[test]
    fn test_empty_level_set() {
        let mut set = LevelSet::default();
        assert!(!set.has_more());
        assert!(set.current().is_none());
        assert!(set.advance().is_none());
    }

    #[test]
    fn test_level_set_from_dir() {
        let dir = std::env::temp_dir().join(format!("pushbox-levels-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("02.xsb"), "#@#").unwrap();
        fs::write(dir.join("01.json"), "{}").unwrap();
        fs::write(dir.join("notes.txt"), "ignored").unwrap();

        let set = LevelSet::from_dir(&dir).unwrap();
        let names: Vec<_> = set
            .list()
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["01.json", "02.xsb"]);

        fs::remove_dir_all(&dir).unwrap();
    }
}
