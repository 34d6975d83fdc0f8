//! Exclusive ownership of one live engine instance.

use crate::engine::{EngineInstanceId, MapEngine, SubscriptionId};
use crate::geo::CameraState;

/// The live engine for the current session.
///
/// Owned by the lifecycle manager; other components borrow it for the
/// duration of one call and never keep a copy. Once torn down the handle is
/// gone, so nothing can issue calls into a destroyed engine through it.
#[derive(Debug)]
pub struct EngineHandle<E: MapEngine> {
    engine: E,
    instance: EngineInstanceId,
    style_ready: bool,
    subscriptions: Vec<SubscriptionId>,
}

impl<E: MapEngine> EngineHandle<E> {
    pub(crate) fn new(engine: E, instance: EngineInstanceId) -> Self {
        Self {
            engine,
            instance,
            style_ready: false,
            subscriptions: Vec::new(),
        }
    }

    pub fn instance(&self) -> EngineInstanceId {
        self.instance
    }

    /// Whether the one-time style bootstrap has run on this instance.
    pub fn is_style_ready(&self) -> bool {
        self.style_ready
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    pub fn camera(&self) -> CameraState {
        self.engine.camera()
    }

    pub(crate) fn mark_style_ready(&mut self) {
        self.style_ready = true;
    }

    pub(crate) fn track_subscription(&mut self, id: SubscriptionId) {
        self.subscriptions.push(id);
    }

    /// Number of listeners registered through this handle.
    pub fn subscription_count(&self) -> usize {
        self.subscriptions.len()
    }

    /// Unsubscribe every listener, then destroy the engine.
    pub(crate) fn release(mut self) {
        for id in self.subscriptions.drain(..) {
            self.engine.unsubscribe(id);
        }
        self.engine.destroy();
    }
}
