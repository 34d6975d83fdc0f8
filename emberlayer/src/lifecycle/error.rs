//! Lifecycle error types.

use thiserror::Error;

use crate::engine::{EngineError, EngineInstanceId};

/// Errors creating an engine instance.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LifecycleError {
    /// `initialize` was called while an instance is still live.
    ///
    /// At most one live engine exists per session; this is a logic error in
    /// the caller.
    #[error("Engine already initialized ({instance} is still live)")]
    AlreadyInitialized { instance: EngineInstanceId },

    #[error("Engine construction failed: {0}")]
    Engine(#[from] EngineError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_already_initialized() {
        let err = LifecycleError::AlreadyInitialized {
            instance: EngineInstanceId::new(2),
        };
        assert_eq!(
            err.to_string(),
            "Engine already initialized (engine#2 is still live)"
        );
    }

    #[test]
    fn test_from_engine_error() {
        let err: LifecycleError = EngineError::Creation("no webgl".to_string()).into();
        assert!(matches!(err, LifecycleError::Engine(_)));
        assert!(err.to_string().contains("no webgl"));
    }
}
