pub mod config;
pub mod replay;
pub mod world;

pub use config::{ConfigError, InitError, ReplayConfig, WorldContext};
pub use replay::{
    EntityDelta, EntityId, EntityKind, FinalMetrics, MalformedDeltaError, Packet, PacketEntry,
    Replay,
};
pub use world::{
    CameraFollowController, DeathFog, EntityData, EntityReconciler, GridCoord, GridProjector,
    MissingMappingError, PlaybackClock, PlaybackPhase, PlaybackState, ReplayEvent, ReplayListener,
    ReplayWorld, ResourceVisibilityTracker, SpeedChange, Standing, TileGrid, Vec2, ViewportState,
};
