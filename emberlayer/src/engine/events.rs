//! Typed engine events and the channel they travel on.

use tokio::sync::mpsc;

use crate::geo::CameraState;

/// Identity of one engine instance within a session.
///
/// A fresh id is minted every time the lifecycle manager creates an engine;
/// ids are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EngineInstanceId(u64);

impl EngineInstanceId {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn get(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for EngineInstanceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "engine#{}", self.0)
    }
}

/// Handle returned by [`MapEngine::subscribe`](super::MapEngine::subscribe).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }
}

/// Event names a listener can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventTopic {
    /// Base style finished loading (`style.load`).
    StyleReady,
    /// Camera moved (`move` / `zoom`), fires every animation frame.
    ViewportChanged,
}

/// Event payload.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEventKind {
    StyleReady,
    ViewportChanged(CameraState),
}

impl EngineEventKind {
    pub fn topic(&self) -> EventTopic {
        match self {
            EngineEventKind::StyleReady => EventTopic::StyleReady,
            EngineEventKind::ViewportChanged(_) => EventTopic::ViewportChanged,
        }
    }
}

/// An event stamped with the instance that emitted it.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineEvent {
    pub instance: EngineInstanceId,
    pub kind: EngineEventKind,
}

pub type EngineEventSender = mpsc::UnboundedSender<EngineEvent>;
pub type EngineEventReceiver = mpsc::UnboundedReceiver<EngineEvent>;

/// Create the single-consumer channel engine events are delivered on.
pub fn event_channel() -> (EngineEventSender, EngineEventReceiver) {
    mpsc::unbounded_channel()
}

/// Where an engine delivers events for one subscription.
///
/// Stamps every event with the owning instance id so the consumer never has
/// to trust the engine to identify itself.
#[derive(Debug, Clone)]
pub struct EventSink {
    instance: EngineInstanceId,
    tx: EngineEventSender,
}

impl EventSink {
    pub fn new(instance: EngineInstanceId, tx: EngineEventSender) -> Self {
        Self { instance, tx }
    }

    pub fn instance(&self) -> EngineInstanceId {
        self.instance
    }

    /// Deliver an event. Returns `false` if the consumer has gone away.
    pub fn emit(&self, kind: EngineEventKind) -> bool {
        self.tx
            .send(EngineEvent {
                instance: self.instance,
                kind,
            })
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::LngLat;

    #[test]
    fn test_sink_stamps_instance() {
        let (tx, mut rx) = event_channel();
        let sink = EventSink::new(EngineInstanceId::new(7), tx);

        assert!(sink.emit(EngineEventKind::StyleReady));

        let event = rx.try_recv().unwrap();
        assert_eq!(event.instance, EngineInstanceId::new(7));
        assert_eq!(event.kind, EngineEventKind::StyleReady);
    }

    #[test]
    fn test_emit_reports_closed_channel() {
        let (tx, rx) = event_channel();
        let sink = EventSink::new(EngineInstanceId::new(1), tx);
        drop(rx);
        assert!(!sink.emit(EngineEventKind::StyleReady));
    }

    #[test]
    fn test_kind_topic() {
        let camera = CameraState::new(LngLat::new(0.0, 0.0), 3.0);
        assert_eq!(
            EngineEventKind::ViewportChanged(camera).topic(),
            EventTopic::ViewportChanged
        );
        assert_eq!(EngineEventKind::StyleReady.topic(), EventTopic::StyleReady);
    }

    #[test]
    fn test_instance_display() {
        assert_eq!(EngineInstanceId::new(3).to_string(), "engine#3");
    }
}
