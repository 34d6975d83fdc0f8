//! Rendering engine boundary.
//!
//! The engine itself is an external collaborator. This module describes the
//! primitives the controller consumes ([`MapEngine`], [`EngineFactory`]), the
//! typed values passed through them, and the events the engine emits back.
//!
//! # Event Flow
//!
//! ```text
//! ┌──────────────┐  EventSink::emit   ┌─────────────────────┐
//! │  MapEngine   │ ─────────────────► │ mpsc (unbounded)     │ ──► SyncController
//! │ (style.load, │  EngineEvent {     │ single consumer      │
//! │  move, ...)  │   instance, kind } └─────────────────────┘
//! └──────────────┘
//! ```
//!
//! Every event carries the [`EngineInstanceId`] of the engine that emitted it,
//! so events queued by an instance that has since been destroyed can be
//! recognised and ignored.
//!
//! [`HeadlessEngine`] is an in-memory implementation used by tests and the CLI.

mod camera;
mod error;
mod events;
mod headless;
mod traits;
mod types;

pub use camera::{Easing, FlyToCommand, FlyToOptions};
pub use error::EngineError;
pub use events::{
    event_channel, EngineEvent, EngineEventKind, EngineEventReceiver, EngineEventSender,
    EngineInstanceId, EventSink, EventTopic, SubscriptionId,
};
pub use headless::{
    EngineCall, HeadlessEngine, HeadlessFactory, HeadlessProbe, DEFAULT_ANIMATION_FRAMES,
};
pub use traits::{EngineFactory, MapEngine};
pub use types::{
    EngineConfig, FogConfig, LayerKind, LayerSpec, MapControl, Projection, SourceSpec,
    TerrainConfig,
};
