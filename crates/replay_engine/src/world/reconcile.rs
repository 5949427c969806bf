use std::collections::{BTreeMap, BTreeSet};

use crate::config::WorldContext;
use crate::replay::{EntityId, MalformedDeltaError, Packet, PacketEntry};

use super::entity::EntityData;

/// What one packet did to the live entity set.
#[derive(Debug, Default)]
pub struct ReconcileOutcome {
    pub created: Vec<EntityId>,
    pub updated: Vec<EntityId>,
    pub removed: Vec<EntityId>,
    pub rejected: Vec<MalformedDeltaError>,
}

/// Owns every `EntityData` ever observed, keyed by id.
#[derive(Debug, Clone, Default)]
pub struct EntityReconciler {
    entities: BTreeMap<EntityId, EntityData>,
}

impl EntityReconciler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merges one resolved entry. Returns true when the entity was created.
    pub fn apply(
        &mut self,
        entry: &PacketEntry<'_>,
        context: &WorldContext,
    ) -> Result<bool, MalformedDeltaError> {
        let created = !self.entities.contains_key(&entry.id);
        let entity = self
            .entities
            .entry(entry.id)
            .or_insert_with(|| EntityData::new(entry.id, entry.kind));
        if entity.kind != entry.kind {
            return Err(MalformedDeltaError::KindConflict {
                id: entry.id,
                known: entity.kind,
                claimed: entry.kind,
            });
        }
        entity.apply(&entry.delta, context.projector());
        Ok(created)
    }

    /// Applies every entry of `packet` and marks known entities the packet
    /// does not mention as removed.
    pub fn apply_packet(&mut self, packet: &Packet, context: &WorldContext) -> ReconcileOutcome {
        let resolved = packet.resolve_entries();
        let mentioned = resolved.mentioned_ids().collect::<BTreeSet<_>>();
        let mut outcome = ReconcileOutcome {
            rejected: resolved.rejected,
            ..ReconcileOutcome::default()
        };

        for entry in &resolved.entries {
            match self.apply(entry, context) {
                Ok(true) => outcome.created.push(entry.id),
                Ok(false) => outcome.updated.push(entry.id),
                Err(err) => outcome.rejected.push(err),
            }
        }

        for (id, entity) in &mut self.entities {
            let present = mentioned.contains(id);
            if !present && !entity.removed {
                entity.removed = true;
                outcome.removed.push(*id);
            } else if present {
                entity.removed = false;
            }
        }
        outcome
    }

    /// Settles every entity after a jump in the recording.
    pub fn settle_all(&mut self) {
        for entity in self.entities.values_mut() {
            entity.settle();
        }
    }

    pub fn get(&self, id: EntityId) -> Option<&EntityData> {
        self.entities.get(&id)
    }

    pub fn entities(&self) -> impl Iterator<Item = &EntityData> + '_ {
        self.entities.values()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Visible entity ids, back to front in isometric depth.
    pub fn draw_order(&self) -> Vec<EntityId> {
        let mut visible = self
            .entities
            .values()
            .filter(|entity| !entity.removed)
            .filter_map(|entity| Some((entity.position()?, entity.id)))
            .collect::<Vec<_>>();
        visible.sort_by_key(|(coord, id)| (coord.depth(), coord.col, *id));
        visible.into_iter().map(|(_, id)| id).collect()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::config::ReplayConfig;
    use crate::replay::EntityKind;
    use crate::world::GridCoord;

    fn context() -> WorldContext {
        WorldContext::new(ReplayConfig::default(), 8).expect("context")
    }

    fn packet(value: serde_json::Value) -> Packet {
        serde_json::from_value(value).expect("packet")
    }

    #[test]
    fn settle_all_drops_pending_moves() {
        let context = context();
        let mut reconciler = EntityReconciler::new();
        reconciler.apply_packet(
            &packet(json!({ "npc": { "-4": { "base": { "r": 1, "c": 1 } } } })),
            &context,
        );
        reconciler.apply_packet(
            &packet(json!({ "npc": { "-4": { "base": { "r": 1, "c": 3 } } } })),
            &context,
        );
        assert!(reconciler.get(EntityId(-4)).expect("npc").move_target.is_some());

        reconciler.settle_all();
        let npc = reconciler.get(EntityId(-4)).expect("npc");
        assert_eq!(npc.move_target, None);
        assert_eq!(npc.previous_position(), Some(GridCoord::new(1, 3)));
    }

    #[test]
    fn creates_once_then_merges() {
        let context = context();
        let mut reconciler = EntityReconciler::new();
        let outcome = reconciler.apply_packet(
            &packet(json!({ "player": { "1": { "base": { "name": "Neural_1", "r": 1, "c": 1 } } } })),
            &context,
        );
        assert_eq!(outcome.created, vec![EntityId(1)]);
        let outcome = reconciler.apply_packet(
            &packet(json!({ "player": { "1": { "base": { "r": 2 } } } })),
            &context,
        );
        assert!(outcome.created.is_empty());
        assert_eq!(outcome.updated, vec![EntityId(1)]);
        let entity = reconciler.get(EntityId(1)).expect("entity");
        assert_eq!((entity.row, entity.col), (Some(2), Some(1)));
        assert_eq!(entity.team.as_deref(), Some("Neural"));
        assert_eq!(reconciler.len(), 1);
    }

    #[test]
    fn kind_conflict_is_rejected_without_touching_the_record() {
        let context = context();
        let mut reconciler = EntityReconciler::new();
        reconciler.apply_packet(&packet(json!({ "player": { "3": { "base": { "r": 0, "c": 0 } } } })), &context);
        let outcome =
            reconciler.apply_packet(&packet(json!({ "npc": { "3": { "base": { "r": 5, "c": 5 } } } })), &context);
        assert!(matches!(
            outcome.rejected.as_slice(),
            [MalformedDeltaError::KindConflict {
                id: EntityId(3),
                known: EntityKind::Player,
                claimed: EntityKind::Npc
            }]
        ));
        let entity = reconciler.get(EntityId(3)).expect("entity");
        assert_eq!(entity.position(), Some(GridCoord::new(0, 0)));
        assert!(!entity.removed);
    }

    #[test]
    fn absent_entities_are_marked_removed_once() {
        let context = context();
        let mut reconciler = EntityReconciler::new();
        reconciler.apply_packet(
            &packet(json!({ "player": { "1": {}, "2": {} } })),
            &context,
        );
        let outcome = reconciler.apply_packet(&packet(json!({ "player": { "1": {} } })), &context);
        assert_eq!(outcome.removed, vec![EntityId(2)]);
        assert!(reconciler.get(EntityId(2)).expect("entity").removed);

        let outcome = reconciler.apply_packet(&packet(json!({ "player": { "1": {} } })), &context);
        assert!(outcome.removed.is_empty());

        reconciler.apply_packet(&packet(json!({ "player": { "1": {}, "2": {} } })), &context);
        assert!(!reconciler.get(EntityId(2)).expect("entity").removed);
    }

    #[test]
    fn draw_order_is_back_to_front() {
        let context = context();
        let mut reconciler = EntityReconciler::new();
        reconciler.apply_packet(
            &packet(json!({
                "player": {
                    "1": { "base": { "r": 2, "c": 2 } },
                    "2": { "base": { "r": 0, "c": 1 } },
                    "3": { "base": { "r": 1, "c": 0 } }
                },
                "npc": { "-1": {} }
            })),
            &context,
        );
        assert_eq!(
            reconciler.draw_order(),
            vec![EntityId(3), EntityId(2), EntityId(1)]
        );
    }
}
