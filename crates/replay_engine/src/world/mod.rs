mod camera;
mod clock;
mod entity;
mod events;
mod fog;
mod grid;
mod projection;
mod reconcile;
mod replay_world;
mod resources;
mod teams;
mod terrain;

pub use camera::{CameraFollowController, ViewportState};
pub use clock::{PlaybackClock, PlaybackPhase, PlaybackState, SpeedChange, SpeedControl, TickStart};
pub use entity::{
    derive_team_name, Disposition, EntityData, Facing, Gauge, HistoryState, InventoryState,
    MetricsState, Profession, ResourceGauges, SkillState, SkillsState, StatusState,
};
pub use events::{ReplayEvent, ReplayListener};
pub use fog::{DeathFog, DeathFogConfig, SafeZone};
pub use grid::{GridCoord, GridKeyError};
pub use projection::{clamp_drag_position, GridProjector, PixelSize, TileGeometry, Vec2};
pub use reconcile::{EntityReconciler, ReconcileOutcome};
pub use replay_world::ReplayWorld;
pub use resources::{ResourceVisibilityTracker, VisibilityChanges};
pub use teams::{Standing, Team, TeamRegistry};
pub use terrain::{
    default_terrain_mappings, GroundKind, MissingMappingError, ResourceKind, TerrainCode,
    TerrainMapping, TerrainTable, Tile, TileGrid, VOID_TERRAIN_CODE,
};

#[cfg(test)]
mod tests;
