//! Desired-to-applied overlay reconciliation.

use tracing::{debug, error, info, warn};

use super::applied::AppliedLayerSet;
use crate::catalog::{OverlayDefinition, OverlayRegistry, StyleBootstrap};
use crate::engine::MapEngine;
use crate::geo::SelectionTarget;
use crate::lifecycle::EngineHandle;
use crate::store::DesiredLayerSet;

/// What one reconcile pass did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReconcileReport {
    /// Overlays switched on, in application order.
    pub activated: Vec<String>,
    /// Overlays switched off, in application order.
    pub deactivated: Vec<String>,
    /// Overlays left partially applied after an engine rejection. They are
    /// not retried until they leave the desired set and come back.
    pub partial: Vec<String>,
    /// Camera views declared by the activated overlays.
    pub activation_views: Vec<SelectionTarget>,
    /// Engine calls that failed despite the existence checks.
    pub engine_errors: usize,
}

impl ReconcileReport {
    /// Whether the pass changed nothing.
    pub fn is_noop(&self) -> bool {
        self.activated.is_empty()
            && self.deactivated.is_empty()
            && self.partial.is_empty()
            && self.engine_errors == 0
    }
}

/// Result of [`LayerReconciler::reconcile`].
#[derive(Debug, Clone, PartialEq)]
pub enum ReconcileOutcome {
    /// No engine, or its style has not loaded yet. Nothing was touched.
    Deferred,
    Applied(ReconcileReport),
}

impl ReconcileOutcome {
    pub fn is_deferred(&self) -> bool {
        matches!(self, ReconcileOutcome::Deferred)
    }
}

/// Converges the engine's overlay layers toward the desired set.
///
/// Every add and remove is gated on both the applied record and the engine's
/// own existence check. Sources go in before their layers; layers come out
/// before their source, and a source is removed only when no applied layer
/// still draws from it.
#[derive(Debug, Default)]
pub struct LayerReconciler {
    applied: AppliedLayerSet,
}

impl LayerReconciler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn applied(&self) -> &AppliedLayerSet {
        &self.applied
    }

    /// Start tracking a freshly bootstrapped engine.
    ///
    /// Only the static resources the engine actually holds are adopted; a
    /// bootstrap step that failed leaves nothing behind to pin.
    pub fn adopt_static<E: MapEngine>(&mut self, style: &StyleBootstrap, engine: &E) {
        self.applied.clear();
        for source in &style.sources {
            if engine.has_source(&source.id) {
                self.applied.pin_source(&source.id);
            } else {
                warn!(source = %source.id, "Static source missing after bootstrap, not adopted");
            }
        }
        for layer in &style.layers {
            if engine.has_layer(&layer.id) {
                self.applied.record_layer(&layer.id, layer.source.as_deref());
            } else {
                warn!(layer = %layer.id, "Static layer missing after bootstrap, not adopted");
            }
        }
    }

    /// Forget everything (the engine was torn down).
    pub fn reset(&mut self) {
        self.applied.clear();
    }

    pub fn reconcile<E: MapEngine>(
        &mut self,
        handle: Option<&mut EngineHandle<E>>,
        desired: &DesiredLayerSet,
        registry: &OverlayRegistry,
    ) -> ReconcileOutcome {
        let Some(handle) = handle else {
            debug!("Reconcile deferred, no engine");
            return ReconcileOutcome::Deferred;
        };
        if !handle.is_style_ready() {
            debug!(instance = %handle.instance(), "Reconcile deferred, style not ready");
            return ReconcileOutcome::Deferred;
        }

        let to_activate: Vec<&str> = desired
            .iter()
            .filter(|name| !self.applied.is_tracked(name))
            .collect();
        let to_deactivate: Vec<String> = self
            .applied
            .tracked_overlays()
            .filter(|name| !desired.contains(name))
            .map(str::to_string)
            .collect();

        let mut report = ReconcileReport::default();
        let engine = handle.engine_mut();

        for name in to_activate {
            let Some(overlay) = registry.get(name) else {
                warn!(overlay = name, "Unknown overlay requested, skipping");
                continue;
            };
            if self.activate(engine, overlay, &mut report) {
                report.activated.push(name.to_string());
                report.activation_views.extend(overlay.activation_view);
            } else {
                report.partial.push(name.to_string());
            }
        }

        for name in to_deactivate {
            match registry.get(&name) {
                Some(overlay) => self.deactivate(engine, overlay, desired, registry, &mut report),
                None => warn!(overlay = %name, "Applied overlay no longer registered"),
            }
            self.applied.forget_overlay(&name);
            report.deactivated.push(name);
        }

        if let Some((layer, source)) = self.applied.dangling_dependency() {
            error!(layer, source, "Applied layer references a missing source");
            debug_assert!(false, "layer {layer} references missing source {source}");
        }

        if !report.is_noop() {
            info!(
                activated = ?report.activated,
                deactivated = ?report.deactivated,
                partial = ?report.partial,
                engine_errors = report.engine_errors,
                "Overlays reconciled"
            );
        }
        ReconcileOutcome::Applied(report)
    }

    /// Add the overlay's sources, then its layers, and track the overlay.
    /// Returns `true` when every resource is present afterwards.
    fn activate<E: MapEngine>(
        &mut self,
        engine: &mut E,
        overlay: &OverlayDefinition,
        report: &mut ReconcileReport,
    ) -> bool {
        let mut complete = true;

        for source in &overlay.sources {
            if self.applied.has_source(&source.id) {
                continue;
            }
            if engine.has_source(&source.id) {
                debug!(source = %source.id, "Source already in engine, adopting");
                self.applied.record_source(&source.id);
                continue;
            }
            match engine.add_source(&source.id, &source.spec) {
                Ok(()) => {
                    debug!(source = %source.id, overlay = %overlay.name, "Source added");
                    self.applied.record_source(&source.id);
                }
                Err(e) => {
                    let skipped: Vec<&str> = overlay.dependent_layers(&source.id).collect();
                    warn!(
                        source = %source.id,
                        error = %e,
                        ?skipped,
                        "Failed to add overlay source"
                    );
                    report.engine_errors += 1;
                    complete = false;
                }
            }
        }

        for layer in &overlay.layers {
            if self.applied.has_layer(&layer.id) {
                continue;
            }
            if engine.has_layer(&layer.id) {
                debug!(layer = %layer.id, "Layer already in engine, adopting");
                self.applied.record_layer(&layer.id, layer.source.as_deref());
                continue;
            }
            if let Some(ref source) = layer.source {
                if !self.applied.has_source(source) {
                    debug!(layer = %layer.id, %source, "Layer source unavailable, not adding");
                    complete = false;
                    continue;
                }
            }
            match engine.add_layer(layer) {
                Ok(()) => {
                    debug!(layer = %layer.id, overlay = %overlay.name, "Layer added");
                    self.applied.record_layer(&layer.id, layer.source.as_deref());
                }
                Err(e) => {
                    warn!(layer = %layer.id, error = %e, "Failed to add overlay layer");
                    report.engine_errors += 1;
                    complete = false;
                }
            }
        }

        self.applied.record_overlay(&overlay.name, complete);
        complete
    }

    /// Remove the overlay's layers, then any of its sources nothing else
    /// draws from.
    fn deactivate<E: MapEngine>(
        &mut self,
        engine: &mut E,
        overlay: &OverlayDefinition,
        desired: &DesiredLayerSet,
        registry: &OverlayRegistry,
        report: &mut ReconcileReport,
    ) {
        for layer in overlay.layers.iter().rev() {
            if !self.applied.has_layer(&layer.id) {
                continue;
            }
            if self.layer_kept_by_other(&layer.id, &overlay.name, desired, registry) {
                debug!(layer = %layer.id, "Layer shared with a still-desired overlay");
                continue;
            }
            if engine.has_layer(&layer.id) {
                match engine.remove_layer(&layer.id) {
                    Ok(()) => debug!(layer = %layer.id, overlay = %overlay.name, "Layer removed"),
                    Err(e) => {
                        warn!(layer = %layer.id, error = %e, "Failed to remove overlay layer");
                        report.engine_errors += 1;
                    }
                }
            }
            if !engine.has_layer(&layer.id) {
                self.applied.forget_layer(&layer.id);
            }
        }

        for source in &overlay.sources {
            if !self.applied.has_source(&source.id) || self.applied.is_pinned(&source.id) {
                continue;
            }
            if let Some(dependent) = self.applied.dependents_of(&source.id).next() {
                debug!(source = %source.id, dependent, "Source still in use, keeping");
                continue;
            }
            if engine.has_source(&source.id) {
                match engine.remove_source(&source.id) {
                    Ok(()) => debug!(source = %source.id, overlay = %overlay.name, "Source removed"),
                    Err(e) => {
                        warn!(source = %source.id, error = %e, "Failed to remove overlay source");
                        report.engine_errors += 1;
                    }
                }
            }
            if !engine.has_source(&source.id) {
                self.applied.forget_source(&source.id);
            }
        }
    }

    fn layer_kept_by_other(
        &self,
        layer_id: &str,
        leaving: &str,
        desired: &DesiredLayerSet,
        registry: &OverlayRegistry,
    ) -> bool {
        self.applied
            .tracked_overlays()
            .filter(|name| *name != leaving && desired.contains(name))
            .filter_map(|name| registry.get(name))
            .any(|other| other.layers.iter().any(|l| l.id == layer_id))
    }
}
