use replay_engine::{ReplayEvent, ReplayListener};
use tracing::{debug, info};

/// Forwards world notifications to the log.
#[derive(Debug, Default)]
pub(crate) struct LoggingListener {
    events_seen: u64,
}

impl ReplayListener for LoggingListener {
    fn on_event(&mut self, event: &ReplayEvent<'_>) {
        self.events_seen += 1;
        match event {
            ReplayEvent::PacketChanged { step, packet } => debug!(
                step,
                players = packet.player.len(),
                npcs = packet.npc.len(),
                depleted = packet.resource.len(),
                "packet_changed"
            ),
            ReplayEvent::StepChanged(step) => debug!(step, "step_changed"),
            ReplayEvent::EntityRemoved(id) => debug!(entity_id = %id, "entity_removed"),
            ReplayEvent::TeamAdded(team) => debug!(team, "team_announced"),
            ReplayEvent::TeamSelected(team) => info!(team, "team_selected"),
            ReplayEvent::LookAtChanged(id) => info!(entity_id = ?id, "look_at_changed"),
            ReplayEvent::PlaybackEnded => {
                info!(events_seen = self.events_seen, "playback_finished")
            }
        }
    }
}
