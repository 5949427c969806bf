use std::f32::consts::{FRAC_PI_2, FRAC_PI_6};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::world::{
    default_terrain_mappings, DeathFogConfig, GridProjector, MissingMappingError, TerrainMapping,
    TerrainTable, TileGeometry,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplayConfig {
    /// Wall time between two replayed ticks at 1x speed.
    pub tick_duration_ms: f32,
    pub tile_pixel_width: f32,
    pub projection_angle_radians: f32,
    pub border_size: usize,
    pub zoom_scales: Vec<f32>,
    pub initial_zoom_index: usize,
    pub follow_min_zoom_index: usize,
    pub follow_hysteresis_tiles: f32,
    pub min_speed_rate: f32,
    pub max_speed_rate: f32,
    pub death_fog: DeathFogConfig,
    pub terrain: Vec<TerrainMapping>,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            tick_duration_ms: 600.0,
            tile_pixel_width: 128.0,
            projection_angle_radians: FRAC_PI_6,
            border_size: 16,
            zoom_scales: vec![0.25, 0.5, 1.0, 1.5],
            initial_zoom_index: 2,
            follow_min_zoom_index: 1,
            follow_hysteresis_tiles: 2.0,
            min_speed_rate: 0.5,
            max_speed_rate: 8.0,
            death_fog: DeathFogConfig::default(),
            terrain: default_terrain_mappings(),
        }
    }
}

impl ReplayConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.tick_duration_ms.is_finite() && self.tick_duration_ms > 0.0) {
            return Err(ConfigError::NonPositiveTickDuration {
                value: self.tick_duration_ms,
            });
        }
        if !(self.tile_pixel_width.is_finite() && self.tile_pixel_width > 0.0) {
            return Err(ConfigError::NonPositiveTileWidth {
                value: self.tile_pixel_width,
            });
        }
        let angle = self.projection_angle_radians;
        if !(angle.is_finite() && angle > 0.0 && angle <= FRAC_PI_2) {
            return Err(ConfigError::InvalidProjectionAngle { value: angle });
        }
        if self.zoom_scales.is_empty() {
            return Err(ConfigError::NoZoomScales);
        }
        for (index, &value) in self.zoom_scales.iter().enumerate() {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::InvalidZoomScale { index, value });
            }
        }
        if self.initial_zoom_index >= self.zoom_scales.len() {
            return Err(ConfigError::InitialZoomOutOfRange {
                index: self.initial_zoom_index,
                len: self.zoom_scales.len(),
            });
        }
        if self.follow_min_zoom_index >= self.zoom_scales.len() {
            return Err(ConfigError::FollowZoomOutOfRange {
                index: self.follow_min_zoom_index,
                len: self.zoom_scales.len(),
            });
        }
        let (min, max) = (self.min_speed_rate, self.max_speed_rate);
        if !(min.is_finite() && max.is_finite() && min > 0.0 && min <= max) {
            return Err(ConfigError::InvalidSpeedRange { min, max });
        }
        if !(self.death_fog.speed.is_finite() && self.death_fog.speed >= 0.0) {
            return Err(ConfigError::InvalidFogSpeed {
                value: self.death_fog.speed,
            });
        }
        Ok(())
    }

    pub fn tile_geometry(&self) -> TileGeometry {
        TileGeometry {
            tile_pixel_width: self.tile_pixel_width,
            angle_radians: self.projection_angle_radians,
        }
    }

    pub fn tick_duration(&self) -> Duration {
        Duration::from_nanos((self.tick_duration_ms as f64 * 1_000_000.0).round() as u64)
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("tick duration must be a positive number of milliseconds, got {value}")]
    NonPositiveTickDuration { value: f32 },
    #[error("tile pixel width must be positive, got {value}")]
    NonPositiveTileWidth { value: f32 },
    #[error("projection angle must be within (0, pi/2] radians, got {value}")]
    InvalidProjectionAngle { value: f32 },
    #[error("zoom scale list cannot be empty")]
    NoZoomScales,
    #[error("zoom scale #{index} must be positive, got {value}")]
    InvalidZoomScale { index: usize, value: f32 },
    #[error("initial zoom index {index} is out of range for {len} zoom scales")]
    InitialZoomOutOfRange { index: usize, len: usize },
    #[error("follow minimum zoom index {index} is out of range for {len} zoom scales")]
    FollowZoomOutOfRange { index: usize, len: usize },
    #[error("speed rate range [{min}, {max}] is invalid")]
    InvalidSpeedRange { min: f32, max: f32 },
    #[error("death fog speed must be a non-negative number, got {value}")]
    InvalidFogSpeed { value: f32 },
    #[error("terrain code {code} is mapped more than once")]
    DuplicateTerrainCode { code: u16 },
    #[error("terrain code {code} is reserved for void cells and cannot be mapped")]
    ReservedTerrainCode { code: u16 },
}

#[derive(Debug, Error)]
pub enum InitError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("replay map is empty")]
    EmptyMap,
    #[error("replay map is not square: row {row} has {actual} cells, expected {expected}")]
    NonSquareMap {
        row: usize,
        expected: usize,
        actual: usize,
    },
    #[error(transparent)]
    MissingMapping(#[from] MissingMappingError),
}

/// Immutable per-replay context handed to every core call.
#[derive(Debug, Clone)]
pub struct WorldContext {
    config: ReplayConfig,
    terrain: TerrainTable,
    projector: GridProjector,
}

impl WorldContext {
    pub fn new(config: ReplayConfig, map_size: usize) -> Result<Self, ConfigError> {
        config.validate()?;
        let terrain = TerrainTable::new(&config.terrain)?;
        let projector = GridProjector::new(config.tile_geometry(), map_size);
        Ok(Self {
            config,
            terrain,
            projector,
        })
    }

    pub fn config(&self) -> &ReplayConfig {
        &self.config
    }

    pub fn terrain(&self) -> &TerrainTable {
        &self.terrain
    }

    pub fn projector(&self) -> &GridProjector {
        &self.projector
    }

    pub fn follow_hysteresis_px(&self) -> f32 {
        self.config.follow_hysteresis_tiles * self.config.tile_pixel_width
    }
}
