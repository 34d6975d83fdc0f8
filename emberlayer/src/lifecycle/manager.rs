//! Engine lifecycle manager.

use tracing::{debug, error, info, warn};

use super::error::LifecycleError;
use super::handle::EngineHandle;
use crate::catalog::StyleBootstrap;
use crate::engine::{
    EngineConfig, EngineEventSender, EngineFactory, EngineInstanceId, EventSink, EventTopic,
    MapControl, MapEngine,
};

/// What a session-flag change did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionTransition {
    /// A new engine instance was created.
    Started(EngineInstanceId),
    /// The live engine was torn down.
    Stopped,
    /// Nothing to do (flag matches current state).
    Unchanged,
}

/// Result of delivering a style-ready event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StyleReadyOutcome {
    /// First-time setup ran on the live instance.
    Bootstrapped,
    /// Setup already ran on this instance; nothing was done.
    AlreadyBootstrapped,
    /// The event came from an instance that is no longer live.
    Stale,
    /// The live engine does not report its style as loaded; nothing was done.
    NotLoaded,
}

/// Owns creation, one-time style bootstrap and teardown of the engine.
///
/// The manager holds the only [`EngineHandle`]. Creation is gated on the
/// session flag; teardown unsubscribes every listener before destroying the
/// engine and drops the handle.
///
/// # Startup sequence
///
/// 1. [`initialize`](Self::initialize): create engine, add navigation and
///    fullscreen controls, subscribe to `StyleReady`
/// 2. [`on_style_ready`](Self::on_style_ready): static sources, then static
///    layers, then fog, terrain and pitch, then subscribe to `ViewportChanged`
pub struct EngineLifecycleManager<F: EngineFactory> {
    factory: F,
    engine_config: EngineConfig,
    style: StyleBootstrap,
    events: EngineEventSender,
    handle: Option<EngineHandle<F::Engine>>,
    next_instance: u64,
}

impl<F: EngineFactory> EngineLifecycleManager<F> {
    /// Create a manager. No engine exists until the session starts.
    ///
    /// Events from every instance this manager creates are delivered on
    /// `events`, stamped with the instance id.
    pub fn new(
        factory: F,
        engine_config: EngineConfig,
        style: StyleBootstrap,
        events: EngineEventSender,
    ) -> Self {
        Self {
            factory,
            engine_config,
            style,
            events,
            handle: None,
            next_instance: 0,
        }
    }

    pub fn engine_config(&self) -> &EngineConfig {
        &self.engine_config
    }

    pub fn style(&self) -> &StyleBootstrap {
        &self.style
    }

    /// Create the engine instance for this session.
    ///
    /// # Errors
    ///
    /// `AlreadyInitialized` if a handle is still live (the live engine is left
    /// untouched), or `Engine` if construction or the `StyleReady`
    /// subscription fails.
    pub fn initialize(&mut self, config: &EngineConfig) -> Result<EngineInstanceId, LifecycleError> {
        if let Some(ref handle) = self.handle {
            error!(
                instance = %handle.instance(),
                "initialize called while an engine is still live"
            );
            return Err(LifecycleError::AlreadyInitialized {
                instance: handle.instance(),
            });
        }

        let engine = self.factory.create(config)?;
        self.next_instance += 1;
        let instance = EngineInstanceId::new(self.next_instance);
        let mut handle = EngineHandle::new(engine, instance);

        for control in [MapControl::Navigation, MapControl::Fullscreen] {
            if let Err(e) = handle.engine_mut().add_control(control) {
                warn!(%instance, ?control, error = %e, "Failed to add map control");
            }
        }

        let sink = EventSink::new(instance, self.events.clone());
        match handle.engine_mut().subscribe(EventTopic::StyleReady, sink) {
            Ok(id) => handle.track_subscription(id),
            Err(e) => {
                handle.release();
                return Err(e.into());
            }
        }

        info!(
            %instance,
            container = %config.container,
            style = %config.style_url,
            projection = ?config.projection,
            "Map engine created"
        );
        self.handle = Some(handle);
        Ok(instance)
    }

    /// Follow the session gate: create on `true`, tear down on `false`.
    pub fn apply_session(&mut self, active: bool) -> Result<SessionTransition, LifecycleError> {
        match (active, self.handle.is_some()) {
            (true, false) => {
                let config = self.engine_config.clone();
                self.initialize(&config).map(SessionTransition::Started)
            }
            (false, true) => {
                self.teardown();
                Ok(SessionTransition::Stopped)
            }
            _ => Ok(SessionTransition::Unchanged),
        }
    }

    /// Run first-time setup for `instance`, at most once per instance.
    ///
    /// Each step is existence-gated, so a style that already carries one of
    /// the static resources does not cause a duplicate add. Engine errors in
    /// individual steps are logged and do not abort the remaining steps.
    pub fn on_style_ready(&mut self, instance: EngineInstanceId) -> StyleReadyOutcome {
        let Some(handle) = self.handle.as_mut() else {
            debug!(%instance, "Style ready after teardown, ignoring");
            return StyleReadyOutcome::Stale;
        };
        if handle.instance() != instance {
            debug!(%instance, live = %handle.instance(), "Style ready from stale instance");
            return StyleReadyOutcome::Stale;
        }
        if handle.is_style_ready() {
            debug!(%instance, "Style ready fired again, bootstrap already done");
            return StyleReadyOutcome::AlreadyBootstrapped;
        }
        if !handle.engine().is_style_loaded() {
            warn!(%instance, "Style ready event but engine style not loaded, skipping bootstrap");
            return StyleReadyOutcome::NotLoaded;
        }

        let engine = handle.engine_mut();

        for source in &self.style.sources {
            if engine.has_source(&source.id) {
                debug!(source = %source.id, "Static source already present");
                continue;
            }
            if let Err(e) = engine.add_source(&source.id, &source.spec) {
                warn!(source = %source.id, error = %e, "Failed to add static source");
            }
        }

        for layer in &self.style.layers {
            if engine.has_layer(&layer.id) {
                debug!(layer = %layer.id, "Static layer already present");
                continue;
            }
            if let Some(ref source) = layer.source {
                if !engine.has_source(source) {
                    warn!(layer = %layer.id, %source, "Skipping static layer, source missing");
                    continue;
                }
            }
            if let Err(e) = engine.add_layer(layer) {
                warn!(layer = %layer.id, error = %e, "Failed to add static layer");
            }
        }

        if let Err(e) = engine.set_fog(&self.style.fog) {
            warn!(error = %e, "Failed to set fog");
        }
        if let Some(ref terrain) = self.style.terrain {
            if let Err(e) = engine.set_terrain(terrain) {
                warn!(source = %terrain.source, error = %e, "Failed to set terrain");
            }
        }
        if let Err(e) = engine.set_pitch(self.style.pitch) {
            warn!(pitch = self.style.pitch, error = %e, "Failed to set pitch");
        }

        let sink = EventSink::new(instance, self.events.clone());
        match engine.subscribe(EventTopic::ViewportChanged, sink) {
            Ok(id) => handle.track_subscription(id),
            Err(e) => warn!(%instance, error = %e, "Failed to subscribe to viewport changes"),
        }

        handle.mark_style_ready();
        info!(
            %instance,
            sources = self.style.sources.len(),
            layers = self.style.layers.len(),
            "Style bootstrap complete"
        );
        StyleReadyOutcome::Bootstrapped
    }

    /// Unsubscribe all listeners, destroy the engine and drop the handle.
    ///
    /// Returns `false` if there was nothing to tear down.
    pub fn teardown(&mut self) -> bool {
        match self.handle.take() {
            Some(handle) => {
                let instance = handle.instance();
                handle.release();
                info!(%instance, "Map engine torn down");
                true
            }
            None => {
                debug!("Teardown with no live engine");
                false
            }
        }
    }

    pub fn handle(&self) -> Option<&EngineHandle<F::Engine>> {
        self.handle.as_ref()
    }

    pub fn handle_mut(&mut self) -> Option<&mut EngineHandle<F::Engine>> {
        self.handle.as_mut()
    }

    pub fn is_live(&self) -> bool {
        self.handle.is_some()
    }

    /// Instance id of the live engine, if any.
    pub fn live_instance(&self) -> Option<EngineInstanceId> {
        self.handle.as_ref().map(EngineHandle::instance)
    }
}

impl<F: EngineFactory> Drop for EngineLifecycleManager<F> {
    fn drop(&mut self) {
        self.teardown();
    }
}
