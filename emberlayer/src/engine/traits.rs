//! Engine primitives consumed by the controller.

use super::camera::FlyToCommand;
use super::error::EngineError;
use super::events::{EventSink, EventTopic, SubscriptionId};
use super::types::{EngineConfig, FogConfig, LayerSpec, MapControl, SourceSpec, TerrainConfig};
use crate::geo::CameraState;

/// A live rendering-engine instance.
///
/// All calls are fire-and-forget commands the engine schedules internally;
/// none of them block. Mutating calls return an error when the engine's own
/// rules reject them (duplicate add, remove of a missing resource, mutation
/// before the style has loaded, use after destroy).
pub trait MapEngine {
    fn add_control(&mut self, control: MapControl) -> Result<(), EngineError>;

    fn add_source(&mut self, id: &str, spec: &SourceSpec) -> Result<(), EngineError>;

    fn add_layer(&mut self, spec: &LayerSpec) -> Result<(), EngineError>;

    fn remove_layer(&mut self, id: &str) -> Result<(), EngineError>;

    fn remove_source(&mut self, id: &str) -> Result<(), EngineError>;

    /// Existence check (`getLayer`).
    fn has_layer(&self, id: &str) -> bool;

    /// Existence check (`getSource`).
    fn has_source(&self, id: &str) -> bool;

    fn set_fog(&mut self, fog: &FogConfig) -> Result<(), EngineError>;

    fn set_terrain(&mut self, terrain: &TerrainConfig) -> Result<(), EngineError>;

    fn set_pitch(&mut self, degrees: f64) -> Result<(), EngineError>;

    /// Start an animated camera transition, superseding any in-flight one.
    fn fly_to(&mut self, command: &FlyToCommand) -> Result<(), EngineError>;

    /// Register a listener; events for `topic` are delivered to `sink`.
    fn subscribe(&mut self, topic: EventTopic, sink: EventSink)
        -> Result<SubscriptionId, EngineError>;

    /// Remove a listener. Unknown ids are ignored.
    fn unsubscribe(&mut self, id: SubscriptionId);

    /// Current camera (`getCenter` / `getZoom` / `getPitch`).
    fn camera(&self) -> CameraState;

    fn is_style_loaded(&self) -> bool;

    /// Release every resource held by the instance (`remove`).
    fn destroy(&mut self);
}

/// Constructs engine instances (`new Engine(config)`).
pub trait EngineFactory {
    type Engine: MapEngine;

    fn create(&mut self, config: &EngineConfig) -> Result<Self::Engine, EngineError>;
}
