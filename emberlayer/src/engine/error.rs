//! Errors raised by engine primitives.

use thiserror::Error;

/// Errors an engine primitive can report.
///
/// The controller gates every mutating call behind an existence check, so in
/// practice these only surface when something outside the controller mutated
/// the engine. They are logged, never propagated to the UI.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("Source '{0}' already exists")]
    SourceExists(String),

    #[error("Layer '{0}' already exists")]
    LayerExists(String),

    #[error("Source '{0}' does not exist")]
    SourceMissing(String),

    #[error("Layer '{0}' does not exist")]
    LayerMissing(String),

    #[error("Source '{source_id}' is still referenced by layer '{layer_id}'")]
    SourceInUse { source_id: String, layer_id: String },

    #[error("Style is not done loading")]
    StyleNotLoaded,

    #[error("Engine instance has been destroyed")]
    Destroyed,

    #[error("Engine creation failed: {0}")]
    Creation(String),
}
