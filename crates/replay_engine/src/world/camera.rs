use crate::config::WorldContext;
use crate::replay::EntityId;

use super::entity::EntityData;
use super::projection::{clamp_drag_position, GridProjector, Vec2};

/// Minimum share of the remaining distance covered per eased update.
const FOLLOW_MIN_SNAP: f32 = 0.3;

#[derive(Debug, Clone, PartialEq)]
pub struct ViewportState {
    /// Map translation in screen pixels; the origin centers the map.
    pub position: Vec2,
    pub zoom_index: usize,
    pub scale: f32,
    pub followed: Option<EntityId>,
}

#[derive(Debug, Clone)]
pub struct CameraFollowController {
    viewport: ViewportState,
    zoom_scales: Vec<f32>,
    follow_min_zoom_index: usize,
    hysteresis_px: f32,
}

impl CameraFollowController {
    pub fn new(context: &WorldContext) -> Self {
        let config = context.config();
        let zoom_index = config.initial_zoom_index;
        Self {
            viewport: ViewportState {
                position: Vec2::ZERO,
                zoom_index,
                scale: config.zoom_scales[zoom_index],
                followed: None,
            },
            zoom_scales: config.zoom_scales.clone(),
            follow_min_zoom_index: config.follow_min_zoom_index,
            hysteresis_px: context.follow_hysteresis_px(),
        }
    }

    pub fn viewport(&self) -> &ViewportState {
        &self.viewport
    }

    pub fn followed(&self) -> Option<EntityId> {
        self.viewport.followed
    }

    /// Returns true when the followed id changed.
    pub fn set_followed_entity(&mut self, id: Option<EntityId>) -> bool {
        let changed = self.viewport.followed != id;
        self.viewport.followed = id;
        changed
    }

    pub fn is_following_enabled(&self) -> bool {
        self.viewport.zoom_index >= self.follow_min_zoom_index
    }

    /// Viewport position that centers `entity`'s tile at the current zoom.
    pub fn target_for(&self, entity: &EntityData, projector: &GridProjector) -> Option<Vec2> {
        let origin = projector.tile_origin(entity.position()?);
        Some(origin * -self.viewport.scale)
    }

    /// Eases toward the followed entity. Returns true when the viewport moved.
    pub fn update(
        &mut self,
        delta_seconds: f32,
        tick_seconds: f32,
        followed: Option<&EntityData>,
        projector: &GridProjector,
    ) -> bool {
        if !self.is_following_enabled() {
            return false;
        }
        let Some(entity) = followed.filter(|entity| entity.alive && !entity.removed) else {
            return false;
        };
        let Some(target) = self.target_for(entity, projector) else {
            return false;
        };
        if self.viewport.position.distance(target) <= self.hysteresis_px {
            return false;
        }
        let ratio = follow_ratio(delta_seconds, tick_seconds);
        self.viewport.position = self.viewport.position.lerp(target, ratio);
        true
    }

    /// Moves the zoom index by `delta` within the configured scales, keeping
    /// the on-screen focal point. Returns true when the zoom changed.
    pub fn set_zoom_step(&mut self, delta: i32) -> bool {
        let last = self.zoom_scales.len().saturating_sub(1) as i64;
        let next = (self.viewport.zoom_index as i64 + i64::from(delta)).clamp(0, last) as usize;
        if next == self.viewport.zoom_index {
            return false;
        }
        let old_scale = self.viewport.scale;
        let new_scale = self.zoom_scales[next];
        self.viewport.position = self.viewport.position * (new_scale / old_scale);
        self.viewport.scale = new_scale;
        self.viewport.zoom_index = next;
        true
    }

    /// Translates the viewport by a drag gesture, clamped to the playable
    /// area. Dragging drops the follow; returns true when a follow was dropped.
    pub fn drag_by(&mut self, delta: Vec2, projector: &GridProjector, border_size: usize) -> bool {
        let bounds = projector
            .real_map_pixel_size(projector.map_size(), border_size)
            .scaled(self.viewport.scale);
        self.viewport.position = clamp_drag_position(self.viewport.position + delta, bounds);
        self.viewport.followed.take().is_some()
    }
}

fn follow_ratio(delta_seconds: f32, tick_seconds: f32) -> f32 {
    if !(tick_seconds > 0.0) {
        return 1.0;
    }
    (FOLLOW_MIN_SNAP + delta_seconds / tick_seconds).clamp(0.0, 1.0)
}
