//! Injected application state.
//!
//! The controller never reaches into global state. [`AppStore`] owns the
//! writable side (what the UI mutates) and hands out [`StoreHandles`]: watch
//! receivers the controller reads and subscribes to, plus a publisher for the
//! one value the controller writes back (the ground scale metric).
//!
//! ```text
//!  UI ──► AppStore ──(watch)──► StoreHandles ──► SyncController
//!            ▲                                         │
//!            └──────────── ScalePublisher ◄────────────┘
//! ```
//!
//! Setters only notify subscribers when the value actually changes.

use std::collections::BTreeSet;
use std::sync::Arc;

use tokio::sync::watch;

use crate::geo::{LngLat, SelectionTarget};
use crate::scale::ScaleMetric;

/// The selected wildfire record.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub id: String,
    pub coordinates: LngLat,
}

impl Selection {
    pub fn new(id: impl Into<String>, coordinates: LngLat) -> Self {
        Self {
            id: id.into(),
            coordinates,
        }
    }

    /// Where the camera should go for this selection.
    pub fn target(&self) -> SelectionTarget {
        SelectionTarget::new(self.coordinates)
    }
}

/// Logical overlay names the application wants visible.
///
/// Membership is all that matters; iteration order is sorted for
/// deterministic reconciliation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DesiredLayerSet(BTreeSet<String>);

impl DesiredLayerSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>) -> bool {
        self.0.insert(name.into())
    }

    pub fn remove(&mut self, name: &str) -> bool {
        self.0.remove(name)
    }

    /// Flip membership of `name`. Returns `true` if it is now present.
    pub fn toggle(&mut self, name: &str) -> bool {
        if self.0.remove(name) {
            false
        } else {
            self.0.insert(name.to_string());
            true
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for DesiredLayerSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// Write side of the application state.
#[derive(Debug)]
pub struct AppStore {
    session: watch::Sender<bool>,
    selection: watch::Sender<Option<Selection>>,
    layers: watch::Sender<DesiredLayerSet>,
    scale: Arc<watch::Sender<Option<ScaleMetric>>>,
}

impl AppStore {
    /// A store with the session gate closed, nothing selected, no overlays.
    pub fn new() -> Self {
        Self {
            session: watch::channel(false).0,
            selection: watch::channel(None).0,
            layers: watch::channel(DesiredLayerSet::new()).0,
            scale: Arc::new(watch::channel(None).0),
        }
    }

    /// Read/subscribe handles for the controller.
    pub fn handles(&self) -> StoreHandles {
        StoreHandles {
            session: self.session.subscribe(),
            selection: self.selection.subscribe(),
            layers: self.layers.subscribe(),
            scale: ScalePublisher {
                tx: Arc::clone(&self.scale),
            },
        }
    }

    /// Open or close the entry gate.
    pub fn set_session_active(&self, active: bool) {
        self.session.send_if_modified(|current| {
            let changed = *current != active;
            *current = active;
            changed
        });
    }

    pub fn session_active(&self) -> bool {
        *self.session.borrow()
    }

    pub fn select(&self, selection: Selection) {
        self.set_selection(Some(selection));
    }

    /// Reset the selected record (the prediction screen closing).
    pub fn clear_selection(&self) {
        self.set_selection(None);
    }

    fn set_selection(&self, selection: Option<Selection>) {
        self.selection.send_if_modified(|current| {
            let changed = *current != selection;
            *current = selection;
            changed
        });
    }

    pub fn selection(&self) -> Option<Selection> {
        self.selection.borrow().clone()
    }

    pub fn set_desired_layers(&self, layers: DesiredLayerSet) {
        self.layers.send_if_modified(|current| {
            let changed = *current != layers;
            *current = layers;
            changed
        });
    }

    /// Flip one overlay in the desired set. Returns `true` if now desired.
    pub fn toggle_layer(&self, name: &str) -> bool {
        let mut now_present = false;
        self.layers.send_modify(|current| {
            now_present = current.toggle(name);
        });
        now_present
    }

    pub fn desired_layers(&self) -> DesiredLayerSet {
        self.layers.borrow().clone()
    }

    /// Last ground scale the controller published.
    pub fn scale(&self) -> Option<ScaleMetric> {
        *self.scale.borrow()
    }

    /// Subscribe to scale updates (the scale bar's view).
    pub fn subscribe_scale(&self) -> watch::Receiver<Option<ScaleMetric>> {
        self.scale.subscribe()
    }
}

impl Default for AppStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Controller-side view of the store.
#[derive(Debug)]
pub struct StoreHandles {
    pub session: watch::Receiver<bool>,
    pub selection: watch::Receiver<Option<Selection>>,
    pub layers: watch::Receiver<DesiredLayerSet>,
    pub scale: ScalePublisher,
}

/// Publishes the ground scale metric back into the store.
#[derive(Debug, Clone)]
pub struct ScalePublisher {
    tx: Arc<watch::Sender<Option<ScaleMetric>>>,
}

impl ScalePublisher {
    pub fn publish(&self, metric: ScaleMetric) {
        self.tx.send_replace(Some(metric));
    }
}
