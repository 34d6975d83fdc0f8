//! EmberLayer - map engine synchronization for wildfire monitoring
//!
//! This library keeps an imperative, stateful map-rendering engine consistent
//! with a reactive application-state store. It owns four concerns:
//!
//! - **Lifecycle**: create the engine once per session, bootstrap the style once,
//!   tear everything down safely ([`lifecycle`])
//! - **Reconciliation**: diff the desired overlay set against what the engine
//!   holds and apply order-safe add/remove operations ([`reconciler`])
//! - **Camera**: turn selection changes into animated camera moves ([`camera`])
//! - **Scale**: derive ground distance per pixel from camera state ([`scale`])
//!
//! [`sync::SyncController`] composes them and is the only type most callers need.
//!
//! # Example
//!
//! ```ignore
//! use emberlayer::engine::HeadlessFactory;
//! use emberlayer::store::AppStore;
//! use emberlayer::sync::SyncController;
//!
//! let store = AppStore::new();
//! let factory = HeadlessFactory::new();
//! let probe = factory.probe();
//! let mut controller = SyncController::builder(factory, store.handles()).build();
//!
//! store.set_session_active(true);
//! controller.pump();
//! probe.fire_style_ready();
//! controller.pump();
//! ```

pub mod camera;
pub mod catalog;
pub mod config;
pub mod engine;
pub mod geo;
pub mod lifecycle;
pub mod logging;
pub mod reconciler;
pub mod scale;
pub mod store;
pub mod sync;
