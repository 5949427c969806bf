use std::time::Duration;

use tracing::{debug, info, warn};

use crate::config::{InitError, ReplayConfig, WorldContext};
use crate::replay::{EntityId, Packet, Replay};

use super::camera::{CameraFollowController, ViewportState};
use super::clock::{PlaybackClock, PlaybackPhase, PlaybackState, SpeedChange, SpeedControl};
use super::entity::EntityData;
use super::events::{ListenerSet, ReplayEvent, ReplayListener};
use super::fog::DeathFog;
use super::projection::Vec2;
use super::reconcile::EntityReconciler;
use super::resources::ResourceVisibilityTracker;
use super::teams::{Standing, TeamRegistry};
use super::terrain::TileGrid;

/// Camera catch-up window used when the follow target changes.
const FOLLOW_SNAP_SECONDS: f32 = 1.0;

/// The replay world container: owns the recording and every piece of state
/// reconstructed from it. Hosts drive it through `advance` once per frame.
#[derive(Debug)]
pub struct ReplayWorld {
    context: WorldContext,
    replay: Replay,
    tiles: TileGrid,
    resources: ResourceVisibilityTracker,
    entities: EntityReconciler,
    teams: TeamRegistry,
    fog: DeathFog,
    clock: PlaybackClock,
    playback: PlaybackState,
    speed: SpeedControl,
    camera: CameraFollowController,
    border_size: usize,
    selected_team: Option<String>,
    listeners: ListenerSet,
}

impl ReplayWorld {
    pub fn init(replay: Replay, config: ReplayConfig) -> Result<Self, InitError> {
        let context = WorldContext::new(config, replay.map.len())?;
        let tiles = TileGrid::from_map(&replay.map, context.terrain())?;
        let resources = ResourceVisibilityTracker::from_tiles(&tiles);
        let settings = context.config();
        let border_size = settings.border_size;
        let fog = DeathFog::new(settings.death_fog, tiles.size(), border_size);
        let speed = SpeedControl::new(settings.min_speed_rate, settings.max_speed_rate);
        let camera = CameraFollowController::new(&context);

        info!(
            map_size = tiles.size(),
            packet_count = replay.packets.len(),
            tile_count = tiles.tile_count(),
            resource_tile_count = resources.resource_count(),
            "replay_initialized"
        );

        Ok(Self {
            context,
            replay,
            tiles,
            resources,
            entities: EntityReconciler::new(),
            teams: TeamRegistry::default(),
            fog,
            clock: PlaybackClock::new(),
            playback: PlaybackState::default(),
            speed,
            camera,
            border_size,
            selected_team: None,
            listeners: ListenerSet::default(),
        })
    }

    pub fn add_listener(&mut self, listener: impl ReplayListener + 'static) {
        self.listeners.push(Box::new(listener));
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Feeds one host frame. Returns true when a replay tick was dispatched.
    pub fn advance(&mut self, wall_delta: Duration) -> bool {
        if self.replay.packets.is_empty() || self.playback.paused {
            return false;
        }
        let fired = self.clock.advance(wall_delta, self.effective_tick());
        if fired {
            self.run_tick();
        }
        self.update_camera(wall_delta.as_secs_f32());
        fired
    }

    fn run_tick(&mut self) {
        let packet_count = self.replay.packets.len();
        let start = self.playback.begin_tick(packet_count);
        if start.restarted {
            info!(packet_count, "playback_restarted");
        }
        self.dispatch(start.step);
        self.finish_step();
    }

    fn finish_step(&mut self) {
        let packet_count = self.replay.packets.len();
        if self.playback.complete_tick(packet_count) {
            info!(step_index = self.playback.step_index, "playback_ended");
            self.listeners.emit(ReplayEvent::PlaybackEnded);
        }
    }

    fn dispatch(&mut self, step: usize) {
        let Some(packet) = self.replay.packets.get(step) else {
            return;
        };
        debug!(step, "tick_dispatched");
        self.listeners
            .emit(ReplayEvent::PacketChanged { step, packet });
        self.listeners.emit(ReplayEvent::StepChanged(step));

        if let Some(border) = packet.border {
            self.border_size = border;
        }

        let outcome = self.entities.apply_packet(packet, &self.context);
        for err in &outcome.rejected {
            warn!(
                step,
                entity_id = ?err.entity_id(),
                error = %err,
                "malformed_delta_rejected"
            );
        }
        for id in outcome.created.iter().chain(&outcome.updated) {
            let Some(entity) = self.entities.get(*id) else {
                continue;
            };
            if let Some(team) = self.teams.observe(entity) {
                info!(team = %team, population = ?entity.population, "team_added");
                self.listeners.emit(ReplayEvent::TeamAdded(&team));
            }
        }
        for &id in &outcome.removed {
            self.listeners.emit(ReplayEvent::EntityRemoved(id));
            if self.camera.followed() == Some(id) {
                self.camera.set_followed_entity(None);
                debug!(entity_id = %id, reason = "entity_removed", "follow_cleared");
                self.listeners.emit(ReplayEvent::LookAtChanged(None));
            }
        }

        let changes = self.resources.apply_depletion_list(&packet.resource);
        if !changes.is_empty() {
            debug!(
                step,
                depleted = changes.depleted.len(),
                regenerated = changes.regenerated.len(),
                "resource_visibility_changed"
            );
        }

        self.fog
            .apply_packet_config(packet.config.as_ref(), self.border_size);
        if self.fog.update(step) {
            debug!(step, fog_step = self.fog.fog_step(), "death_fog_advanced");
        }
    }

    fn update_camera(&mut self, delta_seconds: f32) {
        let tick_seconds = self.effective_tick().as_secs_f32();
        let followed = self
            .camera
            .followed()
            .and_then(|id| self.entities.get(id));
        self.camera
            .update(delta_seconds, tick_seconds, followed, self.context.projector());
    }

    pub fn pause(&mut self) {
        if !self.playback.paused {
            self.playback.paused = true;
            debug!(step_index = self.playback.step_index, "playback_paused");
        }
    }

    pub fn resume(&mut self) {
        if self.playback.paused {
            self.playback.paused = false;
            debug!(step_index = self.playback.step_index, "playback_resumed");
        }
    }

    pub fn toggle_pause(&mut self) -> bool {
        if self.playback.paused {
            self.resume();
        } else {
            self.pause();
        }
        self.playback.paused
    }

    /// Jumps to `step` (clamped to the recording) and dispatches it at once.
    /// Returns the dispatched step, or `None` for an empty recording.
    pub fn seek(&mut self, step: usize) -> Option<usize> {
        let last = self.replay.packets.len().checked_sub(1)?;
        let step = step.min(last);
        self.playback.step_index = step;
        self.clock.reset();
        info!(step, "playback_seek");
        self.dispatch(step);
        // A jump is not a move: no entity animates toward its new cell.
        self.entities.settle_all();
        self.finish_step();
        Some(step)
    }

    /// Returns true when the followed id changed.
    pub fn set_followed_entity(&mut self, id: Option<EntityId>) -> bool {
        if !self.camera.set_followed_entity(id) {
            return false;
        }
        debug!(entity_id = ?id, "follow_changed");
        self.listeners.emit(ReplayEvent::LookAtChanged(id));
        self.update_camera(FOLLOW_SNAP_SECONDS);
        true
    }

    pub fn set_zoom_step(&mut self, delta: i32) -> bool {
        let changed = self.camera.set_zoom_step(delta);
        if changed {
            let viewport = self.camera.viewport();
            debug!(
                zoom_index = viewport.zoom_index,
                scale = viewport.scale,
                "zoom_changed"
            );
        }
        changed
    }

    pub fn drag_by(&mut self, delta: Vec2) {
        if self
            .camera
            .drag_by(delta, self.context.projector(), self.border_size)
        {
            debug!(reason = "drag", "follow_cleared");
            self.listeners.emit(ReplayEvent::LookAtChanged(None));
        }
    }

    /// Selects a registered team; unknown names are ignored.
    pub fn select_team(&mut self, name: &str) -> bool {
        if self.teams.by_name(name).is_none() {
            return false;
        }
        self.selected_team = Some(name.to_string());
        self.listeners.emit(ReplayEvent::TeamSelected(name));
        true
    }

    pub fn adjust_speed(&mut self, change: SpeedChange) -> f32 {
        if self.speed.apply(change) {
            debug!(rate = self.speed.rate(), "speed_changed");
        }
        self.speed.rate()
    }

    pub fn effective_tick(&self) -> Duration {
        self.speed.effective_tick(self.context.config().tick_duration())
    }

    pub fn context(&self) -> &WorldContext {
        &self.context
    }

    pub fn replay(&self) -> &Replay {
        &self.replay
    }

    pub fn packet_count(&self) -> usize {
        self.replay.packets.len()
    }

    /// Packet dispatched by the most recent tick.
    pub fn current_packet(&self) -> Option<&Packet> {
        let index = self.playback.step_index.checked_sub(1)?;
        self.replay.packets.get(index)
    }

    pub fn playback(&self) -> PlaybackState {
        self.playback
    }

    pub fn phase(&self) -> PlaybackPhase {
        self.playback.phase()
    }

    pub fn speed_rate(&self) -> f32 {
        self.speed.rate()
    }

    pub fn tiles(&self) -> &TileGrid {
        &self.tiles
    }

    pub fn resources(&self) -> &ResourceVisibilityTracker {
        &self.resources
    }

    pub fn entities(&self) -> &EntityReconciler {
        &self.entities
    }

    pub fn entity(&self, id: EntityId) -> Option<&EntityData> {
        self.entities.get(id)
    }

    pub fn draw_order(&self) -> Vec<EntityId> {
        self.entities.draw_order()
    }

    pub fn teams(&self) -> &TeamRegistry {
        &self.teams
    }

    pub fn selected_team(&self) -> Option<&str> {
        self.selected_team.as_deref()
    }

    pub fn standings(&self) -> Vec<Standing> {
        let final_metrics = self
            .replay
            .metrics
            .as_ref()
            .filter(|_| self.playback.ended);
        self.teams.standings(&self.entities, final_metrics)
    }

    pub fn fog(&self) -> &DeathFog {
        &self.fog
    }

    pub fn border_size(&self) -> usize {
        self.border_size
    }

    pub fn viewport(&self) -> &ViewportState {
        self.camera.viewport()
    }
}
