//! Top-level synchronization.
//!
//! ```text
//!  store (watch) ──► SyncController ──► CameraDirector ───┐
//!                        │     ▲    └──► LayerReconciler ─┼──► MapEngine
//!                        │     │                          │
//!                        │     └── EngineEvent (mpsc) ◄───┘
//!                        └──► GroundScaleEstimator ──► store (scale)
//! ```

mod controller;
mod status;

pub use controller::{SyncController, SyncControllerBuilder};
pub use status::SyncStatus;
