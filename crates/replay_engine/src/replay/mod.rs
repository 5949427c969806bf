//! The parsed recording: static terrain, per-tick packets and their entity deltas.

mod delta;
mod packet;

pub use delta::{
    Attack, BaseDelta, EntityDelta, Equipment, GaugeDelta, HistoryDelta, InventoryDelta, Item,
    MetricsDelta, SkillDelta, SkillsDelta, StatusDelta,
};
pub use packet::{
    EntityId, EntityKind, FinalMetrics, MalformedDeltaError, MarketItem, Packet, PacketConfig,
    PacketEntry, Replay, ResolvedEntries,
};
