//! Toggleable overlay registry.
//!
//! Maps a logical overlay name (what the UI puts in the desired layer set) to
//! the sources and layers that realise it, plus an optional camera view to
//! fly to when the overlay is switched on. The activation view is data here,
//! not control flow in the reconciler.

use std::collections::BTreeMap;

use serde_json::json;

use super::style::SourceDefinition;
use crate::engine::{LayerKind, LayerSpec, SourceSpec};
use crate::geo::{LngLat, SelectionTarget};

/// Logical name of the historical hotspot overlay.
pub const FIRE_HISTORY: &str = "Fire history";

/// Source backing the hotspot heatmap.
pub const HOTSPOT_SOURCE_ID: &str = "hotspots";

/// Heatmap layer drawn by the fire history overlay.
pub const HOTSPOT_LAYER_ID: &str = "hotspot-heatmap-layer";

/// Everything needed to switch one overlay on.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayDefinition {
    pub name: String,
    /// Sources created (if absent) before any layer.
    pub sources: Vec<SourceDefinition>,
    /// Layers in draw order.
    pub layers: Vec<LayerSpec>,
    /// Region-level view flown to on activation.
    pub activation_view: Option<SelectionTarget>,
}

impl OverlayDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sources: Vec::new(),
            layers: Vec::new(),
            activation_view: None,
        }
    }

    pub fn with_source(mut self, source: SourceDefinition) -> Self {
        self.sources.push(source);
        self
    }

    pub fn with_layer(mut self, layer: LayerSpec) -> Self {
        self.layers.push(layer);
        self
    }

    pub fn with_activation_view(mut self, view: SelectionTarget) -> Self {
        self.activation_view = Some(view);
        self
    }

    /// Layers of this overlay that draw from `source_id`.
    pub fn dependent_layers<'a>(&'a self, source_id: &'a str) -> impl Iterator<Item = &'a str> {
        self.layers
            .iter()
            .filter(move |l| l.source.as_deref() == Some(source_id))
            .map(|l| l.id.as_str())
    }
}

/// Overlay definitions keyed by logical name.
#[derive(Debug, Clone, Default)]
pub struct OverlayRegistry {
    overlays: BTreeMap<String, OverlayDefinition>,
}

impl OverlayRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The wildfire map's toggleable overlays.
    pub fn wildfire_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(
            OverlayDefinition::new(FIRE_HISTORY)
                .with_source(SourceDefinition::new(
                    HOTSPOT_SOURCE_ID,
                    SourceSpec::geojson(historical_hotspots()),
                ))
                .with_layer(
                    LayerSpec::new(HOTSPOT_LAYER_ID, LayerKind::Heatmap)
                        .with_source(HOTSPOT_SOURCE_ID)
                        .with_max_zoom(12.0)
                        .with_paint(json!({
                            "heatmap-weight": ["interpolate", ["linear"], ["get", "frp"], 0, 0, 150, 1],
                            "heatmap-intensity": ["interpolate", ["linear"], ["zoom"], 0, 1, 12, 3],
                            "heatmap-radius": ["interpolate", ["linear"], ["zoom"], 0, 2, 12, 24],
                            "heatmap-opacity": 0.8
                        })),
                )
                .with_activation_view(
                    SelectionTarget::new(LngLat::new(-110.897, 31.259)).with_zoom(9.0),
                ),
        );
        registry
    }

    /// Add or replace an overlay. Returns the definition it replaced.
    pub fn register(&mut self, overlay: OverlayDefinition) -> Option<OverlayDefinition> {
        self.overlays.insert(overlay.name.clone(), overlay)
    }

    pub fn get(&self, name: &str) -> Option<&OverlayDefinition> {
        self.overlays.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.overlays.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.overlays.keys().map(|k| k.as_str())
    }
}

fn historical_hotspots() -> serde_json::Value {
    let detections: [(f64, f64, f64); 6] = [
        (-110.902, 31.262, 96.4),
        (-110.880, 31.240, 41.0),
        (-110.931, 31.301, 58.2),
        (-110.288, 30.992, 143.0),
        (-111.061, 31.458, 64.1),
        (-109.142, 29.811, 88.9),
    ];
    let features: Vec<_> = detections
        .iter()
        .map(|(lng, lat, frp)| {
            json!({
                "type": "Feature",
                "properties": {"frp": frp},
                "geometry": {"type": "Point", "coordinates": [lng, lat]}
            })
        })
        .collect();
    json!({"type": "FeatureCollection", "features": features})
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fire_history_definition() {
        let registry = OverlayRegistry::wildfire_defaults();
        let overlay = registry.get(FIRE_HISTORY).unwrap();

        assert_eq!(overlay.sources.len(), 1);
        assert_eq!(overlay.sources[0].id, HOTSPOT_SOURCE_ID);
        assert_eq!(overlay.layers.len(), 1);
        assert_eq!(overlay.layers[0].id, HOTSPOT_LAYER_ID);

        let view = overlay.activation_view.unwrap();
        assert_eq!(view.center, LngLat::new(-110.897, 31.259));
        assert_eq!(view.zoom, Some(9.0));
    }

    #[test]
    fn test_dependent_layers() {
        let registry = OverlayRegistry::wildfire_defaults();
        let overlay = registry.get(FIRE_HISTORY).unwrap();
        assert_eq!(
            overlay.dependent_layers(HOTSPOT_SOURCE_ID).collect::<Vec<_>>(),
            vec![HOTSPOT_LAYER_ID]
        );
        assert_eq!(overlay.dependent_layers("unknown").count(), 0);
    }

    #[test]
    fn test_register_replaces() {
        let mut registry = OverlayRegistry::new();
        assert!(registry.register(OverlayDefinition::new("a")).is_none());
        let previous = registry.register(
            OverlayDefinition::new("a").with_activation_view(SelectionTarget::new(LngLat::new(
                1.0, 2.0,
            ))),
        );
        assert!(previous.is_some());
        assert!(registry.get("a").unwrap().activation_view.is_some());
        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["a"]);
        assert!(registry.contains("a"));
    }
}
