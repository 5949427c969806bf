use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::world::{GridCoord, TerrainCode};

use super::delta::EntityDelta;

/// A complete recording: the static terrain plus one packet per tick.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Replay {
    pub map: Vec<Vec<TerrainCode>>,
    #[serde(default)]
    pub packets: Vec<Packet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<FinalMetrics>,
}

/// End-of-match scores keyed by population.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FinalMetrics {
    #[serde(rename = "AliveScore")]
    pub alive_score: BTreeMap<i32, f64>,
    #[serde(rename = "DefeatScore")]
    pub defeat_score: BTreeMap<i32, f64>,
    #[serde(rename = "Gold")]
    pub gold: BTreeMap<i32, f64>,
    #[serde(rename = "DamageTaken")]
    pub damage_taken: BTreeMap<i32, f64>,
    #[serde(rename = "TimeAlive")]
    pub time_alive: BTreeMap<i32, f64>,
    #[serde(rename = "TotalScore")]
    pub total_score: BTreeMap<i32, f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Packet {
    #[serde(default)]
    pub player: BTreeMap<String, EntityDelta>,
    #[serde(default)]
    pub npc: BTreeMap<String, EntityDelta>,
    /// Cells whose resource is depleted during this tick.
    #[serde(
        default,
        alias = "resource_depleted",
        deserialize_with = "nullable_list"
    )]
    pub resource: Vec<GridCoord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub border: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pos: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wilderness: Option<i64>,
    #[serde(default)]
    pub market: BTreeMap<String, MarketItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<PacketConfig>,
    /// Entries keyed directly by entity id at packet top level.
    #[serde(flatten)]
    pub ungrouped: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketItem {
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub supply: i64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub level: Option<i32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PacketConfig {
    #[serde(rename = "PLAYER_DEATH_FOG")]
    pub death_fog_start: Option<u32>,
    #[serde(rename = "PLAYER_DEATH_FOG_FINAL_SIZE")]
    pub death_fog_final_size: Option<u32>,
    #[serde(rename = "PLAYER_DEATH_FOG_SPEED")]
    pub death_fog_speed: Option<f32>,
}

fn nullable_list<'de, D>(deserializer: D) -> Result<Vec<GridCoord>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<GridCoord>>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub i64);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which record variant an entry belongs to. Players sort before NPCs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EntityKind {
    Player,
    Npc,
}

impl EntityKind {
    /// Top-level entries carry no section, so the id sign decides: recordings
    /// number players from 1 upward and NPCs from -1 downward.
    pub fn from_id_sign(id: EntityId) -> Option<Self> {
        match id.0 {
            id if id > 0 => Some(Self::Player),
            id if id < 0 => Some(Self::Npc),
            _ => None,
        }
    }

    pub fn section_name(self) -> &'static str {
        match self {
            Self::Player => "player",
            Self::Npc => "npc",
        }
    }
}

#[derive(Debug, Error)]
pub enum MalformedDeltaError {
    #[error("entity key '{key}' in the {section} section is not an integer id")]
    UnparseableId { key: String, section: &'static str },
    #[error("entity {id} cannot be attributed to a player or an npc")]
    UnresolvedKind { id: EntityId },
    #[error("entity {id} is reported more than once in the same packet")]
    AmbiguousKind { id: EntityId },
    #[error("entity {id} was first seen as {known:?} but is now reported as {claimed:?}")]
    KindConflict {
        id: EntityId,
        known: EntityKind,
        claimed: EntityKind,
    },
    #[error("entry for entity {id} is not a valid delta: {source}")]
    InvalidDelta {
        id: EntityId,
        #[source]
        source: serde_json::Error,
    },
}

impl MalformedDeltaError {
    pub fn entity_id(&self) -> Option<EntityId> {
        match self {
            Self::UnparseableId { .. } => None,
            Self::UnresolvedKind { id }
            | Self::AmbiguousKind { id }
            | Self::KindConflict { id, .. }
            | Self::InvalidDelta { id, .. } => Some(*id),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PacketEntry<'a> {
    pub id: EntityId,
    pub kind: EntityKind,
    pub delta: Cow<'a, EntityDelta>,
}

#[derive(Debug, Default)]
pub struct ResolvedEntries<'a> {
    pub entries: Vec<PacketEntry<'a>>,
    pub rejected: Vec<MalformedDeltaError>,
}

impl ResolvedEntries<'_> {
    /// Ids mentioned by the packet, including entries that were rejected.
    pub fn mentioned_ids(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.entries
            .iter()
            .map(|entry| entry.id)
            .chain(self.rejected.iter().filter_map(MalformedDeltaError::entity_id))
    }
}

impl Packet {
    /// Attributes every entry of the packet to an entity variant, players first
    /// and then NPCs, each in ascending id order.
    pub fn resolve_entries(&self) -> ResolvedEntries<'_> {
        let mut resolved = ResolvedEntries::default();
        let mut candidates = Vec::<PacketEntry<'_>>::new();

        for (kind, section) in [(EntityKind::Player, &self.player), (EntityKind::Npc, &self.npc)] {
            for (key, delta) in section {
                match parse_entity_id(key) {
                    Some(id) => candidates.push(PacketEntry {
                        id,
                        kind,
                        delta: Cow::Borrowed(delta),
                    }),
                    None => resolved.rejected.push(MalformedDeltaError::UnparseableId {
                        key: key.clone(),
                        section: kind.section_name(),
                    }),
                }
            }
        }

        for (key, value) in &self.ungrouped {
            let Some(id) = parse_entity_id(key) else {
                debug!(key = %key, "packet_metadata_ignored");
                continue;
            };
            let Some(kind) = EntityKind::from_id_sign(id) else {
                resolved
                    .rejected
                    .push(MalformedDeltaError::UnresolvedKind { id });
                continue;
            };
            match serde_json::from_value::<EntityDelta>(value.clone()) {
                Ok(delta) => candidates.push(PacketEntry {
                    id,
                    kind,
                    delta: Cow::Owned(delta),
                }),
                Err(source) => resolved
                    .rejected
                    .push(MalformedDeltaError::InvalidDelta { id, source }),
            }
        }

        let mut occurrences = BTreeMap::<EntityId, usize>::new();
        for candidate in &candidates {
            *occurrences.entry(candidate.id).or_default() += 1;
        }
        for (&id, &count) in &occurrences {
            if count > 1 {
                resolved
                    .rejected
                    .push(MalformedDeltaError::AmbiguousKind { id });
            }
        }
        candidates.retain(|candidate| occurrences.get(&candidate.id) == Some(&1));
        candidates.sort_by_key(|candidate| (candidate.kind, candidate.id));
        resolved.entries = candidates;
        resolved
    }
}

fn parse_entity_id(key: &str) -> Option<EntityId> {
    key.trim().parse::<i64>().ok().map(EntityId)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn packet(value: serde_json::Value) -> Packet {
        serde_json::from_value(value).expect("packet")
    }

    #[test]
    fn sections_are_the_discriminator() {
        let packet = packet(json!({
            "player": { "2": { "base": { "name": "Neural_2" } }, "10": {} },
            "npc": { "-3": { "base": { "name": "Passive_-3" } } }
        }));
        let resolved = packet.resolve_entries();
        assert!(resolved.rejected.is_empty());
        let ids = resolved
            .entries
            .iter()
            .map(|entry| (entry.kind, entry.id.0))
            .collect::<Vec<_>>();
        assert_eq!(
            ids,
            vec![
                (EntityKind::Player, 2),
                (EntityKind::Player, 10),
                (EntityKind::Npc, -3)
            ]
        );
    }

    #[test]
    fn top_level_entries_resolve_by_id_sign() {
        let packet = packet(json!({
            "7": { "base": { "r": 1, "c": 1 } },
            "-4": { "alive": true },
            "resource_depleted": [[0, 1]]
        }));
        let resolved = packet.resolve_entries();
        assert!(resolved.rejected.is_empty());
        assert_eq!(resolved.entries.len(), 2);
        assert_eq!(resolved.entries[0].kind, EntityKind::Player);
        assert_eq!(resolved.entries[1].kind, EntityKind::Npc);
        assert_eq!(packet.resource, vec![GridCoord::new(0, 1)]);
    }

    #[test]
    fn unattributable_entries_are_rejected() {
        let packet = packet(json!({
            "player": { "abc": {}, "5": {} },
            "npc": { "5": {} },
            "0": {},
            "8": 42,
            "wilderness": 3,
            "note": "ignored"
        }));
        let resolved = packet.resolve_entries();
        assert!(resolved.entries.is_empty());
        assert_eq!(resolved.rejected.len(), 4);
        assert!(resolved.rejected.iter().any(|err| matches!(
            err,
            MalformedDeltaError::UnparseableId { key, section: "player" } if key == "abc"
        )));
        assert!(resolved.rejected.iter().any(|err| matches!(
            err,
            MalformedDeltaError::AmbiguousKind { id: EntityId(5) }
        )));
        assert!(resolved.rejected.iter().any(|err| matches!(
            err,
            MalformedDeltaError::UnresolvedKind { id: EntityId(0) }
        )));
        assert!(resolved.rejected.iter().any(|err| matches!(
            err,
            MalformedDeltaError::InvalidDelta { id: EntityId(8), .. }
        )));
        let mut mentioned = resolved.mentioned_ids().collect::<Vec<_>>();
        mentioned.sort();
        assert_eq!(mentioned, vec![EntityId(0), EntityId(5), EntityId(8)]);
    }

    #[test]
    fn null_depletion_list_is_empty() {
        let packet = packet(json!({ "resource": null }));
        assert!(packet.resource.is_empty());
    }

    #[test]
    fn packet_metadata_decodes() {
        let packet = packet(json!({
            "border": 8,
            "size": 64,
            "market": { "Ration": { "price": 3.5, "supply": 12 } },
            "config": { "PLAYER_DEATH_FOG": 100, "PLAYER_DEATH_FOG_SPEED": 0.25 }
        }));
        assert_eq!(packet.border, Some(8));
        assert_eq!(packet.market["Ration"].supply, 12);
        let config = packet.config.expect("config");
        assert_eq!(config.death_fog_start, Some(100));
        assert_eq!(config.death_fog_final_size, None);
        assert!(packet.ungrouped.is_empty());
    }

    #[test]
    fn final_metrics_are_keyed_by_population() {
        let replay: Replay = serde_json::from_value(json!({
            "map": [[1]],
            "packets": [],
            "metrics": { "TotalScore": { "3": 9.5 }, "Gold": { "3": 34 } }
        }))
        .expect("replay");
        let metrics = replay.metrics.expect("metrics");
        assert_eq!(metrics.total_score.get(&3), Some(&9.5));
        assert_eq!(metrics.gold.get(&3), Some(&34.0));
    }
}
