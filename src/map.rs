//! Level descriptions as produced by the level editor: a background tile layer
//! plus a layer of named objects positioned in pixels.
//!
//! The JSON layout follows the Tiled map format closely enough that exported
//! maps load directly; fields the loader does not need are ignored.

use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

use crate::grid::Tile;
use crate::levels::LevelError;

/// Edge length of one tile in pixels.
pub const TILE_SIZE: i64 = 32;

pub const BACKGROUND_LAYER: &str = "Background";
pub const OBJECTS_LAYER: &str = "Objects";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapDescription {
    pub layers: Vec<Layer>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Layer {
    #[serde(rename = "tilelayer")]
    Tiles(TileLayer),
    #[serde(rename = "objectgroup")]
    Objects(ObjectLayer),
    /// Image layers, groups and anything else the editor may emit.
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileLayer {
    pub name: String,
    pub width: usize,
    pub height: usize,
    /// Row-major, 1-based tile ids.
    pub data: Vec<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectLayer {
    pub name: String,
    #[serde(default)]
    pub objects: Vec<MapObject>,
}

/// A placed object. `name` is the type tag (`Player`, `Box` or `Holder`);
/// `x`/`y` locate the object's anchor in pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapObject {
    pub name: String,
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub width: f64,
    #[serde(default)]
    pub height: f64,
}

impl MapObject {
    /// Object placed on grid cell `(x, y)`. Objects are anchored at the top
    /// edge of the cell below their logical cell.
    pub fn at_cell(name: &str, x: usize, y: usize) -> Self {
        let size = TILE_SIZE as f64;
        MapObject {
            name: name.to_string(),
            x: x as f64 * size,
            y: (y + 1) as f64 * size,
            width: size,
            height: size,
        }
    }
}

impl MapDescription {
    pub fn tile_layer(&self, name: &str) -> Option<&TileLayer> {
        self.layers.iter().find_map(|layer| match layer {
            Layer::Tiles(tiles) if tiles.name == name => Some(tiles),
            _ => None,
        })
    }

    pub fn object_layer(&self, name: &str) -> Option<&ObjectLayer> {
        self.layers.iter().find_map(|layer| match layer {
            Layer::Objects(objects) if objects.name == name => Some(objects),
            _ => None,
        })
    }

    pub fn from_json(contents: &str) -> Result<Self, LevelError> {
        Ok(serde_json::from_str(contents)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, LevelError> {
        let contents = fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    /// Convert a single XSB board into a map description.
    ///
    /// Characters:
    /// - `#` = Wall
    /// - ` `, `-`, `_` = Floor
    /// - `.` = Holder
    /// - `$` = Box
    /// - `@` = Player
    /// - `*` = Box on holder
    /// - `+` = Player on holder
    ///
    /// Short rows are padded with floor. Player count and bounds are checked
    /// when the map is loaded, not here.
    pub fn from_xsb(text: &str) -> Result<Self, LevelError> {
        let lines: Vec<&str> = text.lines().collect();

        if lines.is_empty() {
            return Err(LevelError::Malformed("Empty board".to_string()));
        }

        let height = lines.len();
        let width = lines
            .iter()
            .map(|line| line.chars().count())
            .max()
            .unwrap_or(0);

        let mut data = vec![Tile::Floor.id(); width * height];
        let mut objects = Vec::new();

        for (y, line) in lines.iter().enumerate() {
            for (x, ch) in line.chars().enumerate() {
                match ch {
                    '#' => data[y * width + x] = Tile::Wall.id(),
                    ' ' | '-' | '_' => {}
                    '.' => objects.push(MapObject::at_cell("Holder", x, y)),
                    '$' => objects.push(MapObject::at_cell("Box", x, y)),
                    '*' => {
                        objects.push(MapObject::at_cell("Box", x, y));
                        objects.push(MapObject::at_cell("Holder", x, y));
                    }
                    '@' => objects.push(MapObject::at_cell("Player", x, y)),
                    '+' => {
                        objects.push(MapObject::at_cell("Player", x, y));
                        objects.push(MapObject::at_cell("Holder", x, y));
                    }
                    _ => {
                        return Err(LevelError::Malformed(format!(
                            "Invalid character '{}' at position ({}, {})",
                            ch, x, y
                        )));
                    }
                }
            }
        }

        Ok(MapDescription {
            layers: vec![
                Layer::Tiles(TileLayer {
                    name: BACKGROUND_LAYER.to_string(),
                    width,
                    height,
                    data,
                }),
                Layer::Objects(ObjectLayer {
                    name: OBJECTS_LAYER.to_string(),
                    objects,
                }),
            ],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TILED_JSON: &str = r#"{
        "width": 3,
        "height": 1,
        "tilewidth": 32,
        "tileheight": 32,
        "layers": [
            { "type": "imagelayer", "name": "Sky", "image": "sky.png" },
            {
                "type": "tilelayer",
                "name": "Background",
                "width": 3,
                "height": 1,
                "data": [2, 2, 2],
                "opacity": 1
            },
            {
                "type": "objectgroup",
                "name": "Objects",
                "objects": [
                    { "id": 1, "name": "Player", "x": 0, "y": 32, "width": 32, "height": 32 },
                    { "id": 2, "name": "Box", "x": 32, "y": 32, "width": 32, "height": 32 },
                    { "id": 3, "name": "Holder", "x": 64, "y": 32, "width": 32, "height": 32 }
                ]
            }
        ]
    }"#;

    #[test]
    fn test_from_json() {
        let map = MapDescription::from_json(TILED_JSON).unwrap();
        assert_eq!(map.layers.len(), 3);
        assert_eq!(map.layers[0], Layer::Other);

        let tiles = map.tile_layer(BACKGROUND_LAYER).unwrap();
        assert_eq!((tiles.width, tiles.height), (3, 1));
        assert_eq!(tiles.data, vec![2, 2, 2]);

        let objects = map.object_layer(OBJECTS_LAYER).unwrap();
        let names: Vec<&str> = objects.objects.iter().map(|o| o.name.as_str()).collect();
        assert_eq!(names, vec!["Player", "Box", "Holder"]);
        assert_eq!(objects.objects[1].x, 32.0);
    }

    #[test]
    fn test_from_json_invalid() {
        let result = MapDescription::from_json("{ \"layers\": 5 }");
        assert!(matches!(result, Err(LevelError::Parse(_))));
    }

    #[test]
    fn test_from_xsb() {
        let map = MapDescription::from_xsb("####\n#@*#\n#$.#\n####").unwrap();
        let tiles = map.tile_layer(BACKGROUND_LAYER).unwrap();
        assert_eq!((tiles.width, tiles.height), (4, 4));
        assert_eq!(tiles.data[0], Tile::Wall.id());
        assert_eq!(tiles.data[5], Tile::Floor.id());

        let objects = &map.object_layer(OBJECTS_LAYER).unwrap().objects;
        assert_eq!(objects.len(), 5);
        assert_eq!(objects[0], MapObject::at_cell("Player", 1, 1));
        assert_eq!(objects[0].y, 64.0);
    }

    #[test]
    fn test_from_xsb_pads_rows() {
        let map = MapDescription::from_xsb("#####\n#@#\n#####").unwrap();
        let tiles = map.tile_layer(BACKGROUND_LAYER).unwrap();
        assert_eq!(tiles.width, 5);
        assert_eq!(tiles.data.len(), 15);
        assert_eq!(tiles.data[5 + 3], Tile::Floor.id());
    }

    #[test]
    fn test_from_xsb_invalid_character() {
        let result = MapDescription::from_xsb("####\n#@x#\n####");
        assert!(matches!(result, Err(LevelError::Malformed(_))));
    }

    #[test]
    fn test_missing_layers() {
        let map = MapDescription { layers: Vec::new() };
        assert!(map.tile_layer(BACKGROUND_LAYER).is_none());
        assert!(map.object_layer(OBJECTS_LAYER).is_none());
    }
}
