//! Point-in-time controller snapshot.

use std::fmt;

use crate::engine::EngineInstanceId;
use crate::scale::ScaleMetric;

/// What the controller currently believes about the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncStatus {
    /// Live engine instance, if a session is active.
    pub engine: Option<EngineInstanceId>,
    pub style_ready: bool,
    /// Overlays currently applied, sorted.
    pub applied_overlays: Vec<String>,
    /// Number of layers applied (static and overlay).
    pub applied_layers: usize,
    /// Last published ground scale.
    pub scale: Option<ScaleMetric>,
    /// `flyTo` commands accepted so far.
    pub camera_commands: u64,
}

impl SyncStatus {
    pub fn is_live(&self) -> bool {
        self.engine.is_some()
    }
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.engine {
            Some(instance) => write!(f, "{instance}")?,
            None => write!(f, "no engine")?,
        }
        write!(
            f,
            " | style {} | {} layers",
            if self.style_ready { "ready" } else { "loading" },
            self.applied_layers
        )?;
        if !self.applied_overlays.is_empty() {
            write!(f, " | overlays [{}]", self.applied_overlays.join(", "))?;
        }
        if let Some(scale) = self.scale {
            write!(f, " | {scale}")?;
        }
        write!(f, " | {} camera moves", self.camera_commands)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let status = SyncStatus {
            engine: Some(EngineInstanceId::new(1)),
            style_ready: true,
            applied_overlays: vec!["Fire history".to_string()],
            applied_layers: 4,
            scale: None,
            camera_commands: 2,
        };
        assert_eq!(
            status.to_string(),
            "engine#1 | style ready | 4 layers | overlays [Fire history] | 2 camera moves"
        );
    }

    #[test]
    fn test_idle_display() {
        let status = SyncStatus {
            engine: None,
            style_ready: false,
            applied_overlays: Vec::new(),
            applied_layers: 0,
            scale: None,
            camera_commands: 0,
        };
        assert!(!status.is_live());
        assert_eq!(
            status.to_string(),
            "no engine | style loading | 0 layers | 0 camera moves"
        );
    }
}
