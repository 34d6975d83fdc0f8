//! The synchronization controller.

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace};

use super::status::SyncStatus;
use crate::camera::CameraDirector;
use crate::catalog::{OverlayRegistry, StyleBootstrap};
use crate::config::ControllerConfig;
use crate::engine::{
    event_channel, EngineConfig, EngineEvent, EngineEventKind, EngineEventReceiver,
    EngineFactory, EngineInstanceId, FlyToOptions,
};
use crate::geo::CameraState;
use crate::lifecycle::{EngineLifecycleManager, SessionTransition, StyleReadyOutcome};
use crate::reconciler::{LayerReconciler, ReconcileOutcome};
use crate::scale::GroundScaleEstimator;
use crate::store::{DesiredLayerSet, Selection, StoreHandles};

/// Keeps one map engine consistent with the application store.
///
/// Store changes flow in through [`StoreHandles`]; engine events flow in on
/// a single-consumer channel, stamped with the instance that emitted them.
/// The controller owns the lifecycle manager (and through it the only engine
/// handle) and lends the handle to the reconciler and camera director one
/// call at a time.
///
/// Drive it either synchronously with [`pump`](Self::pump) or as an async
/// task with [`run`](Self::run).
pub struct SyncController<F: EngineFactory> {
    lifecycle: EngineLifecycleManager<F>,
    reconciler: LayerReconciler,
    registry: OverlayRegistry,
    director: CameraDirector,
    estimator: GroundScaleEstimator,
    store: StoreHandles,
    events: EngineEventReceiver,
    /// Whether the store's initial values have been applied.
    primed: bool,
    replay_selection_on_ready: bool,
}

impl<F: EngineFactory> SyncController<F> {
    pub fn builder(factory: F, store: StoreHandles) -> SyncControllerBuilder<F> {
        SyncControllerBuilder::new(factory, store)
    }

    /// Drain everything pending: engine events, then store changes, then the
    /// engine events those changes caused. Returns the number of items
    /// handled.
    pub fn pump(&mut self) -> usize {
        let mut handled = self.drain_engine_events();
        handled += self.sync_store();
        handled += self.drain_engine_events();
        handled
    }

    /// Handle every queued engine event.
    pub fn drain_engine_events(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(event) = self.events.try_recv() {
            self.handle_engine_event(event);
            handled += 1;
        }
        handled
    }

    /// Apply store values that changed since the last call (all of them on
    /// the first call). Session first, so a new engine exists before layers
    /// and selection are looked at.
    pub fn sync_store(&mut self) -> usize {
        let prime = !self.primed;
        self.primed = true;
        let mut handled = 0;

        if prime || self.store.session.has_changed().unwrap_or(false) {
            self.apply_session_state();
            handled += 1;
        }
        if prime || self.store.layers.has_changed().unwrap_or(false) {
            self.apply_desired_layers();
            handled += 1;
        }
        if prime || self.store.selection.has_changed().unwrap_or(false) {
            self.apply_selection();
            handled += 1;
        }
        handled
    }

    /// Run until `shutdown` is cancelled, then tear the engine down.
    pub async fn run(&mut self, shutdown: CancellationToken) {
        info!("Sync controller started");
        self.sync_store();

        loop {
            tokio::select! {
                biased;

                _ = shutdown.cancelled() => break,

                Some(event) = self.events.recv() => {
                    self.handle_engine_event(event);
                }

                Ok(()) = self.store.session.changed() => {
                    self.apply_session_state();
                }

                Ok(()) = self.store.layers.changed() => {
                    self.apply_desired_layers();
                }

                Ok(()) = self.store.selection.changed() => {
                    self.apply_selection();
                }

                else => break,
            }
        }

        self.shutdown();
        info!("Sync controller stopped");
    }

    /// Tear down the engine and forget applied state.
    pub fn shutdown(&mut self) {
        if self.lifecycle.teardown() {
            self.reconciler.reset();
        }
    }

    pub fn status(&self) -> SyncStatus {
        let applied = self.reconciler.applied();
        SyncStatus {
            engine: self.lifecycle.live_instance(),
            style_ready: self
                .lifecycle
                .handle()
                .is_some_and(|handle| handle.is_style_ready()),
            applied_overlays: applied.overlays().map(str::to_string).collect(),
            applied_layers: applied.layer_count(),
            scale: self.estimator.last(),
            camera_commands: self.director.commands_issued(),
        }
    }

    pub fn lifecycle(&self) -> &EngineLifecycleManager<F> {
        &self.lifecycle
    }

    pub fn reconciler(&self) -> &LayerReconciler {
        &self.reconciler
    }

    pub fn director(&self) -> &CameraDirector {
        &self.director
    }

    pub fn registry(&self) -> &OverlayRegistry {
        &self.registry
    }

    fn handle_engine_event(&mut self, event: EngineEvent) {
        match event.kind {
            EngineEventKind::StyleReady => self.on_style_ready(event.instance),
            EngineEventKind::ViewportChanged(camera) => {
                self.on_viewport_changed(event.instance, camera)
            }
        }
    }

    fn on_style_ready(&mut self, instance: EngineInstanceId) {
        if self.lifecycle.on_style_ready(instance) != StyleReadyOutcome::Bootstrapped {
            return;
        }

        if let Some(handle) = self.lifecycle.handle() {
            self.reconciler.adopt_static(self.lifecycle.style(), handle.engine());
        }
        let desired = self.store.layers.borrow().clone();
        self.reconcile_layers(&desired);

        if self.replay_selection_on_ready {
            let target = self.store.selection.borrow().as_ref().map(Selection::target);
            self.director.resync(self.lifecycle.handle_mut(), target);
        }
    }

    fn on_viewport_changed(&mut self, instance: EngineInstanceId, camera: CameraState) {
        if self.lifecycle.live_instance() != Some(instance) {
            debug!(%instance, "Viewport change from stale instance, ignoring");
            return;
        }
        let metric = self.estimator.update(&camera);
        trace!(zoom = camera.zoom, lat = camera.center.lat, %metric, "Scale updated");
        self.store.scale.publish(metric);
    }

    fn apply_session_state(&mut self) {
        let active = *self.store.session.borrow_and_update();
        match self.lifecycle.apply_session(active) {
            Ok(SessionTransition::Started(instance)) => {
                info!(%instance, "Session started");
            }
            Ok(SessionTransition::Stopped) => {
                self.reconciler.reset();
                info!("Session ended");
            }
            Ok(SessionTransition::Unchanged) => {}
            Err(e) => error!(error = %e, "Failed to start map engine"),
        }
    }

    fn apply_desired_layers(&mut self) {
        let desired = self.store.layers.borrow_and_update().clone();
        self.reconcile_layers(&desired);
    }

    fn apply_selection(&mut self) {
        let target = self
            .store
            .selection
            .borrow_and_update()
            .as_ref()
            .map(Selection::target);
        self.director.on_selection(self.lifecycle.handle_mut(), target);
    }

    fn reconcile_layers(&mut self, desired: &DesiredLayerSet) {
        let outcome =
            self.reconciler
                .reconcile(self.lifecycle.handle_mut(), desired, &self.registry);
        if let ReconcileOutcome::Applied(report) = outcome {
            let options = *self.director.options();
            for view in report.activation_views {
                self.director
                    .fly_to(self.lifecycle.handle_mut(), view, &options);
            }
        }
    }
}

/// Builder for [`SyncController`].
pub struct SyncControllerBuilder<F: EngineFactory> {
    factory: F,
    store: StoreHandles,
    engine_config: EngineConfig,
    style: StyleBootstrap,
    registry: OverlayRegistry,
    fly_to: FlyToOptions,
    replay_selection_on_ready: bool,
}

impl<F: EngineFactory> SyncControllerBuilder<F> {
    fn new(factory: F, store: StoreHandles) -> Self {
        Self {
            factory,
            store,
            engine_config: EngineConfig::default(),
            style: StyleBootstrap::wildfire_defaults(),
            registry: OverlayRegistry::wildfire_defaults(),
            fly_to: FlyToOptions::default(),
            replay_selection_on_ready: true,
        }
    }

    /// Take engine, style and camera settings from a loaded config.
    pub fn config(mut self, config: &ControllerConfig) -> Self {
        self.engine_config = config.engine_config();
        self.style = config.style();
        self.fly_to = config.fly_to_options();
        self.replay_selection_on_ready = config.camera.replay_selection_on_ready;
        self
    }

    pub fn engine_config(mut self, engine_config: EngineConfig) -> Self {
        self.engine_config = engine_config;
        self
    }

    pub fn style(mut self, style: StyleBootstrap) -> Self {
        self.style = style;
        self
    }

    pub fn registry(mut self, registry: OverlayRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn fly_to_options(mut self, options: FlyToOptions) -> Self {
        self.fly_to = options;
        self
    }

    pub fn replay_selection_on_ready(mut self, replay: bool) -> Self {
        self.replay_selection_on_ready = replay;
        self
    }

    pub fn build(self) -> SyncController<F> {
        let (tx, rx) = event_channel();
        SyncController {
            lifecycle: EngineLifecycleManager::new(
                self.factory,
                self.engine_config,
                self.style,
                tx,
            ),
            reconciler: LayerReconciler::new(),
            registry: self.registry,
            director: CameraDirector::new(self.fly_to),
            estimator: GroundScaleEstimator::new(),
            store: self.store,
            events: rx,
            primed: false,
            replay_selection_on_ready: self.replay_selection_on_ready,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{FIRE_HISTORY, HOTSPOT_LAYER_ID};
    use crate::engine::{EngineCall, HeadlessFactory, HeadlessProbe};
    use crate::geo::LngLat;
    use crate::store::AppStore;

    fn controller() -> (SyncController<HeadlessFactory>, AppStore, HeadlessProbe) {
        let store = AppStore::new();
        let factory = HeadlessFactory::new();
        let probe = factory.probe();
        let controller = SyncController::builder(factory, store.handles()).build();
        (controller, store, probe)
    }

    fn nogales() -> Selection {
        Selection::new("wf-son-001", LngLat::new(-110.90, 31.26))
    }

    #[test]
    fn test_nothing_happens_before_session() {
        let (mut controller, store, probe) = controller();
        store.select(nogales());
        store.toggle_layer(FIRE_HISTORY);
        controller.pump();

        assert!(probe.calls().is_empty());
        assert!(!controller.status().is_live());
    }

    #[test]
    fn test_session_gate_creates_engine() {
        let (mut controller, store, probe) = controller();
        store.set_session_active(true);
        controller.pump();

        assert!(probe.is_live());
        let status = controller.status();
        assert!(status.is_live());
        assert!(!status.style_ready);
    }

    #[test]
    fn test_layers_deferred_until_style_ready() {
        let (mut controller, store, probe) = controller();
        store.set_session_active(true);
        store.toggle_layer(FIRE_HISTORY);
        controller.pump();
        assert!(!probe.has_layer(HOTSPOT_LAYER_ID));

        probe.fire_style_ready();
        controller.pump();
        assert!(probe.has_layer(HOTSPOT_LAYER_ID));
        assert_eq!(controller.status().applied_overlays, vec![FIRE_HISTORY]);
    }

    #[test]
    fn test_selection_before_session_is_replayed_on_ready() {
        let (mut controller, store, probe) = controller();
        store.select(nogales());
        controller.pump();
        store.set_session_active(true);
        controller.pump();
        assert!(probe.fly_to_commands().is_empty());

        probe.fire_style_ready();
        controller.pump();
        let commands = probe.fly_to_commands();
        assert_eq!(commands.len(), 1);
        assert_eq!(commands[0].center, LngLat::new(-110.90, 31.26));
    }

    #[test]
    fn test_replay_can_be_disabled() {
        let store = AppStore::new();
        let factory = HeadlessFactory::new();
        let probe = factory.probe();
        let mut controller = SyncController::builder(factory, store.handles())
            .replay_selection_on_ready(false)
            .build();

        store.select(nogales());
        controller.pump();
        store.set_session_active(true);
        controller.pump();
        probe.fire_style_ready();
        controller.pump();

        assert!(probe.fly_to_commands().is_empty());
    }

    #[test]
    fn test_viewport_change_publishes_scale() {
        let (mut controller, store, probe) = controller();
        store.set_session_active(true);
        controller.pump();
        probe.fire_style_ready();
        controller.pump();

        let camera = CameraState::new(LngLat::new(0.0, 0.0), 8.0);
        probe.move_camera(camera);
        controller.pump();

        let scale = store.scale().unwrap();
        assert!((scale.per_pixel() - crate::scale::ground_scale(8.0, 0.0)).abs() < 1e-12);
        assert_eq!(controller.status().scale, Some(scale));
    }

    #[test]
    fn test_session_end_tears_down_and_restart_rebuilds() {
        let (mut controller, store, probe) = controller();
        store.set_session_active(true);
        store.toggle_layer(FIRE_HISTORY);
        controller.pump();
        probe.fire_style_ready();
        controller.pump();

        store.set_session_active(false);
        controller.pump();
        assert!(!probe.is_live());
        assert_eq!(controller.status().applied_layers, 0);

        store.set_session_active(true);
        controller.pump();
        probe.fire_style_ready();
        controller.pump();
        assert_eq!(probe.instances_created(), 2);
        assert!(probe.has_layer(HOTSPOT_LAYER_ID));
        assert!(probe.rejected().is_empty());
    }

    #[test]
    fn test_shutdown_is_idempotent() {
        let (mut controller, store, probe) = controller();
        store.set_session_active(true);
        controller.pump();

        controller.shutdown();
        let calls = probe.calls().len();
        controller.shutdown();
        assert_eq!(probe.calls().len(), calls);
        assert_eq!(
            probe.count_calls(|c| matches!(c, EngineCall::Destroy)),
            1
        );
    }
}
