use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{ConfigError, InitError};

use super::grid::GridCoord;

pub type TerrainCode = u16;

/// Cells carrying this code are empty (lava/void) and produce no tile.
pub const VOID_TERRAIN_CODE: TerrainCode = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroundKind {
    Water,
    Grass,
    Land,
    Stone,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Forest,
    Tree,
    Stone,
    Ore,
    Crystal,
    Herb,
    Fish,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerrainMapping {
    pub code: TerrainCode,
    pub ground: GroundKind,
    #[serde(default)]
    pub resource: Option<ResourceKind>,
}

impl TerrainMapping {
    const fn ground(code: TerrainCode, ground: GroundKind) -> Self {
        Self {
            code,
            ground,
            resource: None,
        }
    }

    const fn overlay(code: TerrainCode, ground: GroundKind, resource: ResourceKind) -> Self {
        Self {
            code,
            ground,
            resource: Some(resource),
        }
    }
}

pub fn default_terrain_mappings() -> Vec<TerrainMapping> {
    vec![
        TerrainMapping::ground(1, GroundKind::Water),
        TerrainMapping::ground(2, GroundKind::Grass),
        TerrainMapping::ground(3, GroundKind::Land),
        TerrainMapping::ground(4, GroundKind::Stone),
        TerrainMapping::overlay(5, GroundKind::Grass, ResourceKind::Forest),
        TerrainMapping::overlay(6, GroundKind::Grass, ResourceKind::Tree),
        TerrainMapping::overlay(7, GroundKind::Stone, ResourceKind::Ore),
        TerrainMapping::overlay(8, GroundKind::Stone, ResourceKind::Crystal),
        TerrainMapping::overlay(9, GroundKind::Grass, ResourceKind::Herb),
        TerrainMapping::overlay(10, GroundKind::Water, ResourceKind::Fish),
        TerrainMapping::overlay(11, GroundKind::Land, ResourceKind::Stone),
    ]
}

/// Terrain code lookup, validated once when the world context is built.
#[derive(Debug, Clone, Default)]
pub struct TerrainTable {
    by_code: HashMap<TerrainCode, TerrainMapping>,
}

impl TerrainTable {
    pub fn new(mappings: &[TerrainMapping]) -> Result<Self, ConfigError> {
        let mut by_code = HashMap::with_capacity(mappings.len());
        for mapping in mappings {
            if mapping.code == VOID_TERRAIN_CODE {
                return Err(ConfigError::ReservedTerrainCode { code: mapping.code });
            }
            if by_code.insert(mapping.code, *mapping).is_some() {
                return Err(ConfigError::DuplicateTerrainCode { code: mapping.code });
            }
        }
        Ok(Self { by_code })
    }

    pub fn lookup(&self, code: TerrainCode) -> Option<&TerrainMapping> {
        self.by_code.get(&code)
    }

    pub fn len(&self) -> usize {
        self.by_code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_code.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("terrain code {code} at {coord} has no configured mapping")]
pub struct MissingMappingError {
    pub code: TerrainCode,
    pub coord: GridCoord,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tile {
    pub coord: GridCoord,
    pub code: TerrainCode,
    pub ground: GroundKind,
    pub resource: Option<ResourceKind>,
}

/// Static terrain, row-major over an `n x n` map. Void cells hold no tile.
#[derive(Debug, Clone, PartialEq)]
pub struct TileGrid {
    size: usize,
    tiles: Vec<Option<Tile>>,
}

impl TileGrid {
    pub fn from_map(map: &[Vec<TerrainCode>], table: &TerrainTable) -> Result<Self, InitError> {
        let size = validate_map_shape(map)?;
        let mut tiles = Vec::with_capacity(size * size);
        for (row, cells) in map.iter().enumerate() {
            for (col, &code) in cells.iter().enumerate() {
                let coord = GridCoord::new(row as i32, col as i32);
                if code == VOID_TERRAIN_CODE {
                    tiles.push(None);
                    continue;
                }
                let mapping = table
                    .lookup(code)
                    .ok_or(MissingMappingError { code, coord })?;
                tiles.push(Some(Tile {
                    coord,
                    code,
                    ground: mapping.ground,
                    resource: mapping.resource,
                }));
            }
        }
        Ok(Self { size, tiles })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn index_of(&self, coord: GridCoord) -> Option<usize> {
        if !coord.in_square(self.size) {
            return None;
        }
        Some(coord.row as usize * self.size + coord.col as usize)
    }

    pub fn tile(&self, coord: GridCoord) -> Option<&Tile> {
        self.index_of(coord)
            .and_then(|index| self.tiles.get(index))
            .and_then(Option::as_ref)
    }

    pub fn tiles(&self) -> impl Iterator<Item = &Tile> + '_ {
        self.tiles.iter().flatten()
    }

    pub fn tile_count(&self) -> usize {
        self.tiles().count()
    }

    pub fn resource_tiles(&self) -> impl Iterator<Item = (GridCoord, ResourceKind)> + '_ {
        self.tiles()
            .filter_map(|tile| tile.resource.map(|resource| (tile.coord, resource)))
    }
}

fn validate_map_shape(map: &[Vec<TerrainCode>]) -> Result<usize, InitError> {
    let size = map.len();
    if size == 0 {
        return Err(InitError::EmptyMap);
    }
    for (row, cells) in map.iter().enumerate() {
        if cells.len() != size {
            return Err(InitError::NonSquareMap {
                row,
                expected: size,
                actual: cells.len(),
            });
        }
    }
    Ok(size)
}
