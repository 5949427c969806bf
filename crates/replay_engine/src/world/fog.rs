use serde::{Deserialize, Serialize};

use crate::replay::PacketConfig;

use super::grid::GridCoord;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeathFogConfig {
    /// First step at which the fog starts closing in.
    pub start_step: u32,
    /// Half-width of the final safe square, in tiles.
    pub final_size: u32,
    /// Tiles the fog advances per step.
    pub speed: f32,
}

impl Default for DeathFogConfig {
    fn default() -> Self {
        Self {
            start_step: 240,
            final_size: 15,
            speed: 1.0 / 16.0,
        }
    }
}

impl DeathFogConfig {
    fn with_overrides(self, overrides: &PacketConfig) -> Self {
        Self {
            start_step: overrides.death_fog_start.unwrap_or(self.start_step),
            final_size: overrides.death_fog_final_size.unwrap_or(self.final_size),
            speed: overrides
                .death_fog_speed
                .filter(|speed| speed.is_finite() && *speed >= 0.0)
                .unwrap_or(self.speed),
        }
    }
}

/// Inclusive square of cells outside the fog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SafeZone {
    pub min: i32,
    pub max: i32,
}

impl SafeZone {
    pub fn contains(&self, coord: GridCoord) -> bool {
        (self.min..=self.max).contains(&coord.row) && (self.min..=self.max).contains(&coord.col)
    }

    pub fn is_empty(&self) -> bool {
        self.min > self.max
    }
}

#[derive(Debug, Clone)]
pub struct DeathFog {
    config: DeathFogConfig,
    map_size: usize,
    border: usize,
    fog_step: Option<u32>,
}

impl DeathFog {
    pub fn new(config: DeathFogConfig, map_size: usize, border: usize) -> Self {
        Self {
            config,
            map_size,
            border,
            fog_step: None,
        }
    }

    pub fn config(&self) -> DeathFogConfig {
        self.config
    }

    /// Overrides persist until a later packet config replaces them.
    pub(crate) fn apply_packet_config(&mut self, overrides: Option<&PacketConfig>, border: usize) {
        if let Some(overrides) = overrides {
            self.config = self.config.with_overrides(overrides);
        }
        self.border = border;
    }

    pub fn max_step(&self) -> u32 {
        let shrinkable = self
            .map_size
            .saturating_sub(self.border * 2)
            .saturating_sub(self.config.final_size as usize * 2);
        (shrinkable / 2) as u32
    }

    /// Fog depth at `step`, or `None` before the fog starts.
    pub fn fog_step_at(&self, step: usize) -> Option<u32> {
        let start = self.config.start_step as usize;
        if step < start {
            return None;
        }
        let elapsed = (step - start + 1) as f32;
        let advanced = (elapsed * self.config.speed).floor() as u32;
        Some(advanced.min(self.max_step()))
    }

    /// Recomputes the fog for `step`; returns true when the fog depth changed.
    pub fn update(&mut self, step: usize) -> bool {
        let next = self.fog_step_at(step);
        let changed = next != self.fog_step;
        self.fog_step = next;
        changed
    }

    pub fn is_active(&self) -> bool {
        self.fog_step.is_some()
    }

    pub fn fog_step(&self) -> u32 {
        self.fog_step.unwrap_or(0)
    }

    pub fn safe_zone(&self) -> SafeZone {
        let inset = (self.border + self.fog_step() as usize) as i32;
        SafeZone {
            min: inset,
            max: self.map_size as i32 - 1 - inset,
        }
    }
}
