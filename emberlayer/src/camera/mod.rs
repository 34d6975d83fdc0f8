//! Camera direction: selection changes become animated camera moves.
//!
//! [`CameraDirector`] keeps exactly one desired target, the one derived from
//! the latest selection. A new target issues one `flyTo`, which supersedes
//! whatever animation the engine is running. Clearing the selection resets
//! the target without moving the camera.
//!
//! Without a live engine the command is dropped, not queued. The selection
//! stays in the store, so [`CameraDirector::resync`] can re-derive it once an
//! engine is ready.

use tracing::{debug, info, warn};

use crate::engine::{EngineInstanceId, FlyToCommand, FlyToOptions, MapEngine};
use crate::geo::SelectionTarget;
use crate::lifecycle::EngineHandle;

/// Issues camera transitions for selection targets.
#[derive(Debug, Clone)]
pub struct CameraDirector {
    options: FlyToOptions,
    current: Option<SelectionTarget>,
    /// Instance the current target was last delivered to.
    delivered_to: Option<EngineInstanceId>,
    issued: u64,
}

impl CameraDirector {
    pub fn new(options: FlyToOptions) -> Self {
        Self {
            options,
            current: None,
            delivered_to: None,
            issued: 0,
        }
    }

    pub fn options(&self) -> &FlyToOptions {
        &self.options
    }

    /// The target derived from the latest selection.
    pub fn current(&self) -> Option<SelectionTarget> {
        self.current
    }

    /// Total `flyTo` commands accepted by an engine.
    pub fn commands_issued(&self) -> u64 {
        self.issued
    }

    /// Issue one animated transition to `target`.
    ///
    /// A no-op returning `None` when there is no engine. Engine rejections
    /// are logged and also return `None`.
    pub fn fly_to<E: MapEngine>(
        &mut self,
        handle: Option<&mut EngineHandle<E>>,
        target: SelectionTarget,
        options: &FlyToOptions,
    ) -> Option<FlyToCommand> {
        let Some(handle) = handle else {
            debug!(center = %target.center, "No engine, camera target dropped");
            return None;
        };

        let command = FlyToCommand::resolve(&target, options);
        match handle.engine_mut().fly_to(&command) {
            Ok(()) => {
                self.issued += 1;
                info!(
                    instance = %handle.instance(),
                    center = %command.center,
                    zoom = command.zoom,
                    easing = command.easing.name(),
                    "Camera flyTo"
                );
                Some(command)
            }
            Err(e) => {
                warn!(center = %command.center, error = %e, "flyTo rejected");
                None
            }
        }
    }

    /// React to a selection change.
    ///
    /// A new target issues exactly one `flyTo`; an unchanged target or a
    /// cleared selection issues nothing.
    pub fn on_selection<E: MapEngine>(
        &mut self,
        handle: Option<&mut EngineHandle<E>>,
        target: Option<SelectionTarget>,
    ) -> Option<FlyToCommand> {
        if target == self.current {
            return None;
        }
        self.current = target;

        let Some(target) = target else {
            debug!("Selection cleared, camera stays");
            self.delivered_to = None;
            return None;
        };
        self.deliver(handle, target)
    }

    /// Re-derive the target from `target` (the store's current selection)
    /// and deliver it if the live engine has not received it yet.
    pub fn resync<E: MapEngine>(
        &mut self,
        handle: Option<&mut EngineHandle<E>>,
        target: Option<SelectionTarget>,
    ) -> Option<FlyToCommand> {
        self.current = target;
        let target = target?;
        let handle = handle?;
        if self.delivered_to == Some(handle.instance()) {
            return None;
        }
        debug!(center = %target.center, "Replaying selection on ready engine");
        self.deliver(Some(handle), target)
    }

    fn deliver<E: MapEngine>(
        &mut self,
        handle: Option<&mut EngineHandle<E>>,
        target: SelectionTarget,
    ) -> Option<FlyToCommand> {
        let instance = handle.as_ref().map(|h| h.instance());
        let options = self.options;
        let command = self.fly_to(handle, target, &options);
        if command.is_some() {
            self.delivered_to = instance;
        }
        command
    }
}

impl Default for CameraDirector {
    fn default() -> Self {
        Self::new(FlyToOptions::default())
    }
}
