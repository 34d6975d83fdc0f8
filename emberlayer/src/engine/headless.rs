//! In-memory rendering engine.
//!
//! `HeadlessEngine` implements [`MapEngine`] without drawing anything. It
//! enforces the same rules a real engine does (mutations only after the style
//! has loaded, no duplicate adds, no removal of missing resources, no source
//! removal while a layer still references it, nothing after destroy) and
//! records every primitive call so callers can assert on the exact sequence.
//!
//! # Observation
//!
//! Engines are created through [`HeadlessFactory`], which shares its state
//! with a cloneable [`HeadlessProbe`]. The probe stays valid across engine
//! instances, so a test can keep watching after the controller has torn one
//! engine down and created the next.
//!
//! ```ignore
//! let factory = HeadlessFactory::new();
//! let probe = factory.probe();
//! // ... hand `factory` to the controller ...
//! probe.fire_style_ready();
//! assert!(probe.has_layer("sky"));
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::trace;

use super::camera::FlyToCommand;
use super::error::EngineError;
use super::events::{EngineEventKind, EventSink, EventTopic, SubscriptionId};
use super::traits::{EngineFactory, MapEngine};
use super::types::{EngineConfig, FogConfig, LayerSpec, MapControl, SourceSpec, TerrainConfig};
use crate::geo::CameraState;

/// Default number of frames a `fly_to` animation is split into.
pub const DEFAULT_ANIMATION_FRAMES: u32 = 4;

/// One primitive call as observed by the headless engine.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineCall {
    Create { container: String },
    AddControl(MapControl),
    AddSource(String),
    AddLayer(String),
    RemoveLayer(String),
    RemoveSource(String),
    SetFog,
    SetTerrain { source: String },
    SetPitch(f64),
    FlyTo(FlyToCommand),
    Subscribe(EventTopic),
    Unsubscribe(SubscriptionId),
    Destroy,
}

impl EngineCall {
    /// Whether this call mutates sources or layers.
    pub fn is_resource_mutation(&self) -> bool {
        matches!(
            self,
            EngineCall::AddSource(_)
                | EngineCall::AddLayer(_)
                | EngineCall::RemoveLayer(_)
                | EngineCall::RemoveSource(_)
        )
    }
}

#[derive(Debug)]
struct HeadlessWorld {
    /// Generation of the most recently created engine.
    generation: u64,
    /// Generation of the live engine, if any.
    live: Option<u64>,
    calls: Vec<EngineCall>,
    rejected: Vec<(EngineCall, EngineError)>,
    sources: BTreeMap<String, SourceSpec>,
    /// Layers in draw order.
    layers: Vec<LayerSpec>,
    camera: CameraState,
    style_loaded: bool,
    fog: Option<FogConfig>,
    terrain: Option<TerrainConfig>,
    subscriptions: BTreeMap<SubscriptionId, (EventTopic, EventSink)>,
    next_subscription: u64,
    animation_frames: u32,
    fail_next_create: Option<String>,
}

impl HeadlessWorld {
    fn new(animation_frames: u32) -> Self {
        Self {
            generation: 0,
            live: None,
            calls: Vec::new(),
            rejected: Vec::new(),
            sources: BTreeMap::new(),
            layers: Vec::new(),
            camera: CameraState::default(),
            style_loaded: false,
            fog: None,
            terrain: None,
            subscriptions: BTreeMap::new(),
            next_subscription: 0,
            animation_frames,
            fail_next_create: None,
        }
    }

    fn reset_instance_state(&mut self) {
        self.sources.clear();
        self.layers.clear();
        self.style_loaded = false;
        self.fog = None;
        self.terrain = None;
        self.subscriptions.clear();
    }

    fn has_layer(&self, id: &str) -> bool {
        self.layers.iter().any(|l| l.id == id)
    }

    fn emit(&self, kind: EngineEventKind) -> usize {
        let topic = kind.topic();
        self.subscriptions
            .values()
            .filter(|(t, _)| *t == topic)
            .filter(|(_, sink)| sink.emit(kind.clone()))
            .count()
    }

    fn require_style(&self) -> Result<(), EngineError> {
        if self.style_loaded {
            Ok(())
        } else {
            Err(EngineError::StyleNotLoaded)
        }
    }
}

/// A headless engine instance.
#[derive(Debug)]
pub struct HeadlessEngine {
    generation: u64,
    world: Arc<Mutex<HeadlessWorld>>,
}

impl HeadlessEngine {
    /// Record `call`, then run `op` against the world if this instance is
    /// still the live one. Rejections are remembered for inspection.
    fn dispatch<T>(
        &self,
        call: EngineCall,
        op: impl FnOnce(&mut HeadlessWorld) -> Result<T, EngineError>,
    ) -> Result<T, EngineError> {
        let mut world = self.world.lock();
        trace!(generation = self.generation, call = ?call, "headless engine call");
        world.calls.push(call.clone());

        let result = if world.live == Some(self.generation) {
            op(&mut world)
        } else {
            Err(EngineError::Destroyed)
        };

        if let Err(ref e) = result {
            world.rejected.push((call, e.clone()));
        }
        result
    }

    fn is_live(world: &HeadlessWorld, generation: u64) -> bool {
        world.live == Some(generation)
    }
}

impl MapEngine for HeadlessEngine {
    fn add_control(&mut self, control: MapControl) -> Result<(), EngineError> {
        self.dispatch(EngineCall::AddControl(control), |_| Ok(()))
    }

    fn add_source(&mut self, id: &str, spec: &SourceSpec) -> Result<(), EngineError> {
        self.dispatch(EngineCall::AddSource(id.to_string()), |world| {
            world.require_style()?;
            if world.sources.contains_key(id) {
                return Err(EngineError::SourceExists(id.to_string()));
            }
            world.sources.insert(id.to_string(), spec.clone());
            Ok(())
        })
    }

    fn add_layer(&mut self, spec: &LayerSpec) -> Result<(), EngineError> {
        self.dispatch(EngineCall::AddLayer(spec.id.clone()), |world| {
            world.require_style()?;
            if world.has_layer(&spec.id) {
                return Err(EngineError::LayerExists(spec.id.clone()));
            }
            match &spec.source {
                Some(source) if !world.sources.contains_key(source) => {
                    return Err(EngineError::SourceMissing(source.clone()));
                }
                None if spec.kind.needs_source() => {
                    return Err(EngineError::SourceMissing(String::new()));
                }
                _ => {}
            }
            world.layers.push(spec.clone());
            Ok(())
        })
    }

    fn remove_layer(&mut self, id: &str) -> Result<(), EngineError> {
        self.dispatch(EngineCall::RemoveLayer(id.to_string()), |world| {
            world.require_style()?;
            let before = world.layers.len();
            world.layers.retain(|l| l.id != id);
            if world.layers.len() == before {
                return Err(EngineError::LayerMissing(id.to_string()));
            }
            Ok(())
        })
    }

    fn remove_source(&mut self, id: &str) -> Result<(), EngineError> {
        self.dispatch(EngineCall::RemoveSource(id.to_string()), |world| {
            world.require_style()?;
            if !world.sources.contains_key(id) {
                return Err(EngineError::SourceMissing(id.to_string()));
            }
            if let Some(layer) = world
                .layers
                .iter()
                .find(|l| l.source.as_deref() == Some(id))
            {
                return Err(EngineError::SourceInUse {
                    source_id: id.to_string(),
                    layer_id: layer.id.clone(),
                });
            }
            world.sources.remove(id);
            Ok(())
        })
    }

    fn has_layer(&self, id: &str) -> bool {
        let world = self.world.lock();
        Self::is_live(&world, self.generation) && world.has_layer(id)
    }

    fn has_source(&self, id: &str) -> bool {
        let world = self.world.lock();
        Self::is_live(&world, self.generation) && world.sources.contains_key(id)
    }

    fn set_fog(&mut self, fog: &FogConfig) -> Result<(), EngineError> {
        self.dispatch(EngineCall::SetFog, |world| {
            world.require_style()?;
            world.fog = Some(fog.clone());
            Ok(())
        })
    }

    fn set_terrain(&mut self, terrain: &TerrainConfig) -> Result<(), EngineError> {
        let call = EngineCall::SetTerrain {
            source: terrain.source.clone(),
        };
        self.dispatch(call, |world| {
            world.require_style()?;
            if !world.sources.contains_key(&terrain.source) {
                return Err(EngineError::SourceMissing(terrain.source.clone()));
            }
            world.terrain = Some(terrain.clone());
            Ok(())
        })
    }

    fn set_pitch(&mut self, degrees: f64) -> Result<(), EngineError> {
        self.dispatch(EngineCall::SetPitch(degrees), |world| {
            world.camera.pitch = degrees;
            let camera = world.camera;
            world.emit(EngineEventKind::ViewportChanged(camera));
            Ok(())
        })
    }

    fn fly_to(&mut self, command: &FlyToCommand) -> Result<(), EngineError> {
        self.dispatch(EngineCall::FlyTo(*command), |world| {
            let start = world.camera;
            let frames = world.animation_frames.max(1);
            for frame in 1..=frames {
                let progress = command.easing.apply(frame as f64 / frames as f64);
                world.camera.center = start.center.lerp(&command.center, progress);
                world.camera.zoom = start.zoom + (command.zoom - start.zoom) * progress;
                if frame == frames {
                    world.camera.center = command.center;
                    world.camera.zoom = command.zoom;
                }
                let camera = world.camera;
                world.emit(EngineEventKind::ViewportChanged(camera));
            }
            Ok(())
        })
    }

    fn subscribe(
        &mut self,
        topic: EventTopic,
        sink: EventSink,
    ) -> Result<SubscriptionId, EngineError> {
        self.dispatch(EngineCall::Subscribe(topic), |world| {
            world.next_subscription += 1;
            let id = SubscriptionId::new(world.next_subscription);
            world.subscriptions.insert(id, (topic, sink));
            Ok(id)
        })
    }

    fn unsubscribe(&mut self, id: SubscriptionId) {
        let _ = self.dispatch(EngineCall::Unsubscribe(id), |world| {
            world.subscriptions.remove(&id);
            Ok(())
        });
    }

    fn camera(&self) -> CameraState {
        self.world.lock().camera
    }

    fn is_style_loaded(&self) -> bool {
        let world = self.world.lock();
        Self::is_live(&world, self.generation) && world.style_loaded
    }

    fn destroy(&mut self) {
        let _ = self.dispatch(EngineCall::Destroy, |world| {
            world.live = None;
            world.reset_instance_state();
            Ok(())
        });
    }
}

/// Creates [`HeadlessEngine`] instances that share one observable world.
#[derive(Debug, Clone)]
pub struct HeadlessFactory {
    world: Arc<Mutex<HeadlessWorld>>,
}

impl HeadlessFactory {
    pub fn new() -> Self {
        Self::with_animation_frames(DEFAULT_ANIMATION_FRAMES)
    }

    /// Create a factory whose engines split each `fly_to` into `frames`
    /// viewport-change events.
    pub fn with_animation_frames(frames: u32) -> Self {
        Self {
            world: Arc::new(Mutex::new(HeadlessWorld::new(frames))),
        }
    }

    /// A probe observing every engine this factory creates.
    pub fn probe(&self) -> HeadlessProbe {
        HeadlessProbe {
            world: Arc::clone(&self.world),
        }
    }
}

impl Default for HeadlessFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineFactory for HeadlessFactory {
    type Engine = HeadlessEngine;

    fn create(&mut self, config: &EngineConfig) -> Result<HeadlessEngine, EngineError> {
        let mut world = self.world.lock();
        if let Some(reason) = world.fail_next_create.take() {
            return Err(EngineError::Creation(reason));
        }

        world.generation += 1;
        let generation = world.generation;
        world.live = Some(generation);
        world.reset_instance_state();
        world.camera = CameraState::new(config.center, config.zoom);
        world.calls.push(EngineCall::Create {
            container: config.container.clone(),
        });

        Ok(HeadlessEngine {
            generation,
            world: Arc::clone(&self.world),
        })
    }
}

/// Observation and stimulus handle for headless engines.
///
/// Plays the role of the engine's host: it can fire the events a real engine
/// would emit on its own (style finished loading, user panned the map).
#[derive(Debug, Clone)]
pub struct HeadlessProbe {
    world: Arc<Mutex<HeadlessWorld>>,
}

impl HeadlessProbe {
    /// Mark the style as loaded and emit `StyleReady` to listeners.
    ///
    /// Returns the number of listeners notified. Firing again emits again,
    /// like an engine that reloads its style.
    pub fn fire_style_ready(&self) -> usize {
        let mut world = self.world.lock();
        if world.live.is_none() {
            return 0;
        }
        world.style_loaded = true;
        world.emit(EngineEventKind::StyleReady)
    }

    /// Move the camera as a user interaction would, emitting `ViewportChanged`.
    pub fn move_camera(&self, camera: CameraState) -> usize {
        let mut world = self.world.lock();
        if world.live.is_none() {
            return 0;
        }
        world.camera = camera;
        world.emit(EngineEventKind::ViewportChanged(camera))
    }

    /// Remove a layer behind the controller's back.
    pub fn remove_layer_externally(&self, id: &str) -> bool {
        let mut world = self.world.lock();
        let before = world.layers.len();
        world.layers.retain(|l| l.id != id);
        world.layers.len() != before
    }

    /// Make the next `create` call fail with `reason`.
    pub fn fail_next_create(&self, reason: impl Into<String>) {
        self.world.lock().fail_next_create = Some(reason.into());
    }

    /// Every call recorded so far, across all instances.
    pub fn calls(&self) -> Vec<EngineCall> {
        self.world.lock().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.world.lock().calls.clear();
    }

    /// Number of recorded calls matching `predicate`.
    pub fn count_calls(&self, predicate: impl Fn(&EngineCall) -> bool) -> usize {
        self.world.lock().calls.iter().filter(|c| predicate(c)).count()
    }

    /// Every `fly_to` command received, in order.
    pub fn fly_to_commands(&self) -> Vec<FlyToCommand> {
        self.world
            .lock()
            .calls
            .iter()
            .filter_map(|c| match c {
                EngineCall::FlyTo(cmd) => Some(*cmd),
                _ => None,
            })
            .collect()
    }

    /// Calls the engine rejected, with the error it reported.
    pub fn rejected(&self) -> Vec<(EngineCall, EngineError)> {
        self.world.lock().rejected.clone()
    }

    pub fn sources(&self) -> Vec<String> {
        self.world.lock().sources.keys().cloned().collect()
    }

    /// Layer ids in draw order.
    pub fn layers(&self) -> Vec<String> {
        self.world.lock().layers.iter().map(|l| l.id.clone()).collect()
    }

    pub fn has_source(&self, id: &str) -> bool {
        self.world.lock().sources.contains_key(id)
    }

    pub fn has_layer(&self, id: &str) -> bool {
        self.world.lock().has_layer(id)
    }

    /// Source each layer draws from, for dependency checks.
    pub fn layer_sources(&self) -> Vec<(String, Option<String>)> {
        self.world
            .lock()
            .layers
            .iter()
            .map(|l| (l.id.clone(), l.source.clone()))
            .collect()
    }

    pub fn camera(&self) -> CameraState {
        self.world.lock().camera
    }

    pub fn fog(&self) -> Option<FogConfig> {
        self.world.lock().fog.clone()
    }

    pub fn terrain(&self) -> Option<TerrainConfig> {
        self.world.lock().terrain.clone()
    }

    pub fn is_live(&self) -> bool {
        self.world.lock().live.is_some()
    }

    pub fn instances_created(&self) -> u64 {
        self.world.lock().generation
    }

    pub fn subscription_count(&self) -> usize {
        self.world.lock().subscriptions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::events::{event_channel, EngineInstanceId};
    use crate::engine::types::LayerKind;
    use crate::engine::Easing;
    use crate::geo::LngLat;
    use serde_json::json;

    fn live_engine() -> (HeadlessEngine, HeadlessProbe) {
        let mut factory = HeadlessFactory::new();
        let probe = factory.probe();
        let engine = factory.create(&EngineConfig::default()).unwrap();
        (engine, probe)
    }

    fn points() -> SourceSpec {
        SourceSpec::geojson(json!({"type": "FeatureCollection", "features": []}))
    }

    #[test]
    fn test_mutation_before_style_load_is_rejected() {
        let (mut engine, probe) = live_engine();
        assert_eq!(
            engine.add_source("hotspots", &points()),
            Err(EngineError::StyleNotLoaded)
        );
        assert_eq!(probe.rejected().len(), 1);
    }

    #[test]
    fn test_layer_requires_source() {
        let (mut engine, probe) = live_engine();
        probe.fire_style_ready();

        let layer = LayerSpec::new("heat", LayerKind::Heatmap).with_source("hotspots");
        assert_eq!(
            engine.add_layer(&layer),
            Err(EngineError::SourceMissing("hotspots".to_string()))
        );

        engine.add_source("hotspots", &points()).unwrap();
        engine.add_layer(&layer).unwrap();
        assert_eq!(probe.layers(), vec!["heat".to_string()]);
    }

    #[test]
    fn test_duplicates_and_missing_are_rejected() {
        let (mut engine, probe) = live_engine();
        probe.fire_style_ready();

        engine.add_source("a", &points()).unwrap();
        assert_eq!(
            engine.add_source("a", &points()),
            Err(EngineError::SourceExists("a".to_string()))
        );
        assert_eq!(
            engine.remove_layer("nope"),
            Err(EngineError::LayerMissing("nope".to_string()))
        );
        assert_eq!(
            engine.remove_source("nope"),
            Err(EngineError::SourceMissing("nope".to_string()))
        );
    }

    #[test]
    fn test_source_in_use_cannot_be_removed() {
        let (mut engine, probe) = live_engine();
        probe.fire_style_ready();

        engine.add_source("hotspots", &points()).unwrap();
        engine
            .add_layer(&LayerSpec::new("heat", LayerKind::Heatmap).with_source("hotspots"))
            .unwrap();

        assert!(matches!(
            engine.remove_source("hotspots"),
            Err(EngineError::SourceInUse { .. })
        ));

        engine.remove_layer("heat").unwrap();
        engine.remove_source("hotspots").unwrap();
        assert!(probe.sources().is_empty());
    }

    #[test]
    fn test_calls_after_destroy_are_rejected() {
        let (mut engine, probe) = live_engine();
        engine.destroy();

        assert!(!probe.is_live());
        assert_eq!(engine.set_pitch(60.0), Err(EngineError::Destroyed));
        assert!(!engine.has_layer("anything"));
        assert_eq!(probe.fire_style_ready(), 0);
    }

    #[test]
    fn test_old_instance_cannot_touch_new_one() {
        let mut factory = HeadlessFactory::new();
        let probe = factory.probe();

        let mut first = factory.create(&EngineConfig::default()).unwrap();
        first.destroy();
        let _second = factory.create(&EngineConfig::default()).unwrap();
        probe.fire_style_ready();

        assert_eq!(first.add_source("x", &points()), Err(EngineError::Destroyed));
        assert!(!first.is_style_loaded());
        assert_eq!(probe.instances_created(), 2);
    }

    #[test]
    fn test_fly_to_animates_through_frames() {
        let mut factory = HeadlessFactory::with_animation_frames(5);
        let probe = factory.probe();
        let mut engine = factory.create(&EngineConfig::default()).unwrap();

        let (tx, mut rx) = event_channel();
        engine
            .subscribe(
                EventTopic::ViewportChanged,
                EventSink::new(EngineInstanceId::new(1), tx),
            )
            .unwrap();

        let target = LngLat::new(-110.90, 31.26);
        engine
            .fly_to(&FlyToCommand {
                center: target,
                zoom: 15.0,
                speed: 0.8,
                curve: 1.0,
                easing: Easing::Linear,
            })
            .unwrap();

        let mut frames = Vec::new();
        while let Ok(event) = rx.try_recv() {
            frames.push(event);
        }
        assert_eq!(frames.len(), 5);
        assert_eq!(probe.camera().center, target);
        assert_eq!(probe.camera().zoom, 15.0);
    }

    #[test]
    fn test_unsubscribe_stops_delivery() {
        let (mut engine, probe) = live_engine();
        let (tx, mut rx) = event_channel();
        let id = engine
            .subscribe(EventTopic::StyleReady, EventSink::new(EngineInstanceId::new(1), tx))
            .unwrap();
        engine.unsubscribe(id);

        assert_eq!(probe.fire_style_ready(), 0);
        assert!(rx.try_recv().is_err());
        assert_eq!(probe.subscription_count(), 0);
    }

    #[test]
    fn test_terrain_needs_dem_source() {
        let (mut engine, probe) = live_engine();
        probe.fire_style_ready();

        let terrain = TerrainConfig {
            source: "mapbox-dem".to_string(),
            exaggeration: 1.4,
        };
        assert!(engine.set_terrain(&terrain).is_err());
        engine
            .add_source(
                "mapbox-dem",
                &SourceSpec::RasterDem {
                    url: "mapbox://mapbox.mapbox-terrain-dem-v1".to_string(),
                    tile_size: 512,
                    maxzoom: 14,
                },
            )
            .unwrap();
        engine.set_terrain(&terrain).unwrap();
        assert_eq!(probe.terrain(), Some(terrain));
    }
}
