//! Overlay reconciliation.
//!
//! [`LayerReconciler`] diffs the store's [`DesiredLayerSet`](crate::store::DesiredLayerSet)
//! against its own [`AppliedLayerSet`] and issues the minimal, order-safe
//! engine calls to converge them. It trusts its applied record rather than
//! engine-reported names, and still existence-checks the engine before each
//! call so an external mutation cannot turn into a duplicate add or a
//! remove of something missing.
//!
//! Activations run before deactivations within one pass.

mod applied;
mod reconcile;

pub use applied::AppliedLayerSet;
pub use reconcile::{LayerReconciler, ReconcileOutcome, ReconcileReport};
