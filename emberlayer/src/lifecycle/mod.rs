//! Engine lifecycle: session-gated creation, one-time style bootstrap,
//! and teardown.
//!
//! ```text
//! session=true ──► initialize ──► [StyleReady] ──► on_style_ready ──► live
//!                                                                     │
//! session=false / drop ──────────────────────────────────► teardown ◄─┘
//! ```

mod error;
mod handle;
mod manager;

pub use error::LifecycleError;
pub use handle::EngineHandle;
pub use manager::{EngineLifecycleManager, SessionTransition, StyleReadyOutcome};
