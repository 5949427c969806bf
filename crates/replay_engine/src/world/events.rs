use crate::replay::{EntityId, Packet};

/// One-way notifications for presentation listeners, delivered in order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ReplayEvent<'a> {
    PacketChanged { step: usize, packet: &'a Packet },
    StepChanged(usize),
    EntityRemoved(EntityId),
    TeamAdded(&'a str),
    TeamSelected(&'a str),
    LookAtChanged(Option<EntityId>),
    PlaybackEnded,
}

pub trait ReplayListener {
    fn on_event(&mut self, event: &ReplayEvent<'_>);
}

impl<F> ReplayListener for F
where
    F: FnMut(&ReplayEvent<'_>),
{
    fn on_event(&mut self, event: &ReplayEvent<'_>) {
        self(event)
    }
}

#[derive(Default)]
pub(crate) struct ListenerSet {
    listeners: Vec<Box<dyn ReplayListener>>,
}

impl ListenerSet {
    pub(crate) fn push(&mut self, listener: Box<dyn ReplayListener>) {
        self.listeners.push(listener);
    }

    pub(crate) fn emit(&mut self, event: ReplayEvent<'_>) {
        for listener in &mut self.listeners {
            listener.on_event(&event);
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.listeners.len()
    }
}

impl std::fmt::Debug for ListenerSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerSet")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
