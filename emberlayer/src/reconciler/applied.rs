//! Authoritative record of what the controller has put into the engine.

use std::collections::BTreeMap;

/// Sources, layers and overlays currently applied to the live engine.
///
/// Static resources registered by the style bootstrap are adopted as
/// pinned: they count as dependencies but are never removed by
/// reconciliation.
///
/// An overlay is tracked as soon as an activation was attempted. It is
/// complete when every one of its resources went in, partial otherwise;
/// either way it holds whatever did go in until it is deactivated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppliedLayerSet {
    /// Overlay name to whether its activation completed.
    overlays: BTreeMap<String, bool>,
    /// Layer id to the source it draws from.
    layers: BTreeMap<String, Option<String>>,
    /// Source id to whether it is pinned.
    sources: BTreeMap<String, bool>,
}

impl AppliedLayerSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `name` is fully applied.
    pub fn has_overlay(&self, name: &str) -> bool {
        self.overlays.get(name).copied().unwrap_or(false)
    }

    /// Whether `name` is applied, fully or partially.
    pub fn is_tracked(&self, name: &str) -> bool {
        self.overlays.contains_key(name)
    }

    pub fn is_partial(&self, name: &str) -> bool {
        self.overlays.get(name) == Some(&false)
    }

    pub fn has_layer(&self, id: &str) -> bool {
        self.layers.contains_key(id)
    }

    pub fn has_source(&self, id: &str) -> bool {
        self.sources.contains_key(id)
    }

    pub fn is_pinned(&self, source_id: &str) -> bool {
        self.sources.get(source_id).copied().unwrap_or(false)
    }

    pub(crate) fn record_overlay(&mut self, name: &str, complete: bool) {
        self.overlays.insert(name.to_string(), complete);
    }

    pub(crate) fn forget_overlay(&mut self, name: &str) {
        self.overlays.remove(name);
    }

    /// Record a static source. Pinned sources are never removed.
    pub(crate) fn pin_source(&mut self, id: &str) {
        self.sources.insert(id.to_string(), true);
    }

    pub(crate) fn record_source(&mut self, id: &str) {
        self.sources.entry(id.to_string()).or_insert(false);
    }

    pub(crate) fn forget_source(&mut self, id: &str) {
        self.sources.remove(id);
    }

    pub(crate) fn record_layer(&mut self, id: &str, source: Option<&str>) {
        self.layers
            .insert(id.to_string(), source.map(str::to_string));
    }

    pub(crate) fn forget_layer(&mut self, id: &str) {
        self.layers.remove(id);
    }

    /// Applied layers that draw from `source_id`.
    pub fn dependents_of<'a>(&'a self, source_id: &'a str) -> impl Iterator<Item = &'a str> {
        self.layers
            .iter()
            .filter(move |(_, source)| source.as_deref() == Some(source_id))
            .map(|(id, _)| id.as_str())
    }

    /// A layer whose source is not applied, if any.
    ///
    /// Always `None` when adds and removes respect dependency order.
    pub fn dangling_dependency(&self) -> Option<(&str, &str)> {
        self.layers.iter().find_map(|(layer, source)| match source {
            Some(source) if !self.sources.contains_key(source) => {
                Some((layer.as_str(), source.as_str()))
            }
            _ => None,
        })
    }

    /// Fully applied overlays.
    pub fn overlays(&self) -> impl Iterator<Item = &str> {
        self.overlays
            .iter()
            .filter(|(_, complete)| **complete)
            .map(|(name, _)| name.as_str())
    }

    /// Every overlay holding resources, complete or partial.
    pub fn tracked_overlays(&self) -> impl Iterator<Item = &str> {
        self.overlays.keys().map(|s| s.as_str())
    }

    pub fn layers(&self) -> impl Iterator<Item = &str> {
        self.layers.keys().map(|s| s.as_str())
    }

    pub fn sources(&self) -> impl Iterator<Item = &str> {
        self.sources.keys().map(|s| s.as_str())
    }

    pub fn overlay_count(&self) -> usize {
        self.overlays().count()
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    pub fn clear(&mut self) {
        self.overlays.clear();
        self.layers.clear();
        self.sources.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{DEM_SOURCE_ID, PERIMETER_SOURCE_ID};

    #[test]
    fn test_pinned_sources() {
        let mut applied = AppliedLayerSet::new();
        applied.pin_source(PERIMETER_SOURCE_ID);
        applied.record_layer("wildfire-perimeter-fill", Some(PERIMETER_SOURCE_ID));
        applied.record_layer("wildfire-perimeter-outline", Some(PERIMETER_SOURCE_ID));

        assert!(applied.is_pinned(PERIMETER_SOURCE_ID));
        assert_eq!(applied.dependents_of(PERIMETER_SOURCE_ID).count(), 2);
        assert_eq!(applied.overlay_count(), 0);
        assert!(applied.dangling_dependency().is_none());
    }

    #[test]
    fn test_partial_overlay_is_tracked_but_not_applied() {
        let mut applied = AppliedLayerSet::new();
        applied.record_overlay("Fire history", true);
        applied.record_overlay("Burn scars", false);

        assert!(applied.has_overlay("Fire history"));
        assert!(!applied.has_overlay("Burn scars"));
        assert!(applied.is_tracked("Burn scars"));
        assert!(applied.is_partial("Burn scars"));
        assert_eq!(applied.overlays().collect::<Vec<_>>(), vec!["Fire history"]);
        assert_eq!(
            applied.tracked_overlays().collect::<Vec<_>>(),
            vec!["Burn scars", "Fire history"]
        );
        assert_eq!(applied.overlay_count(), 1);

        applied.forget_overlay("Burn scars");
        assert!(!applied.is_tracked("Burn scars"));
    }

    #[test]
    fn test_record_source_keeps_pin() {
        let mut applied = AppliedLayerSet::new();
        applied.pin_source(DEM_SOURCE_ID);
        applied.record_source(DEM_SOURCE_ID);
        assert!(applied.is_pinned(DEM_SOURCE_ID));

        applied.record_source("hotspots");
        assert!(!applied.is_pinned("hotspots"));
    }

    #[test]
    fn test_dangling_dependency_detected() {
        let mut applied = AppliedLayerSet::new();
        applied.record_source("hotspots");
        applied.record_layer("heat", Some("hotspots"));
        assert!(applied.dangling_dependency().is_none());

        applied.forget_source("hotspots");
        assert_eq!(applied.dangling_dependency(), Some(("heat", "hotspots")));
    }
}
