//! Static style bootstrap: everything registered once when the style loads.

use serde_json::json;

use crate::engine::{FogConfig, LayerKind, LayerSpec, SourceSpec, TerrainConfig};

/// Terrain elevation source id.
pub const DEM_SOURCE_ID: &str = "mapbox-dem";

/// Wildfire perimeter polygons source id.
pub const PERIMETER_SOURCE_ID: &str = "wildfire-perimeters";

/// A source together with the id it is registered under.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceDefinition {
    pub id: String,
    pub spec: SourceSpec,
}

impl SourceDefinition {
    pub fn new(id: impl Into<String>, spec: SourceSpec) -> Self {
        Self {
            id: id.into(),
            spec,
        }
    }
}

/// First-time setup applied by the style-ready handler.
///
/// Sources are always registered before layers; terrain is configured after
/// the DEM source exists.
#[derive(Debug, Clone, PartialEq)]
pub struct StyleBootstrap {
    pub sources: Vec<SourceDefinition>,
    pub layers: Vec<LayerSpec>,
    pub fog: FogConfig,
    pub terrain: Option<TerrainConfig>,
    /// Initial camera pitch in degrees.
    pub pitch: f64,
}

impl StyleBootstrap {
    /// The wildfire map's static sources and layers.
    pub fn wildfire_defaults() -> Self {
        Self {
            sources: vec![
                SourceDefinition::new(
                    DEM_SOURCE_ID,
                    SourceSpec::RasterDem {
                        url: "mapbox://mapbox.mapbox-terrain-dem-v1".to_string(),
                        tile_size: 512,
                        maxzoom: 14,
                    },
                ),
                SourceDefinition::new(PERIMETER_SOURCE_ID, SourceSpec::geojson(perimeters())),
            ],
            layers: vec![
                LayerSpec::new("sky", LayerKind::Sky).with_paint(json!({
                    "sky-type": "atmosphere",
                    "sky-atmosphere-sun": [0.0, 0.0],
                    "sky-atmosphere-sun-intensity": 15
                })),
                LayerSpec::new("wildfire-perimeter-fill", LayerKind::Fill)
                    .with_source(PERIMETER_SOURCE_ID)
                    .with_paint(json!({
                        "fill-color": "#ff4500",
                        "fill-opacity": 0.35
                    })),
                LayerSpec::new("wildfire-perimeter-outline", LayerKind::Line)
                    .with_source(PERIMETER_SOURCE_ID)
                    .with_paint(json!({
                        "line-color": "#ff8c00",
                        "line-width": 2
                    })),
            ],
            fog: FogConfig::default(),
            terrain: Some(TerrainConfig {
                source: DEM_SOURCE_ID.to_string(),
                exaggeration: 1.4,
            }),
            pitch: 60.0,
        }
    }

    /// Override terrain exaggeration (no-op when terrain is disabled).
    pub fn with_terrain_exaggeration(mut self, exaggeration: f64) -> Self {
        if let Some(ref mut terrain) = self.terrain {
            terrain.exaggeration = exaggeration;
        }
        self
    }

    pub fn with_pitch(mut self, pitch: f64) -> Self {
        self.pitch = pitch;
        self
    }

    pub fn without_terrain(mut self) -> Self {
        self.terrain = None;
        self
    }

    pub fn source_ids(&self) -> impl Iterator<Item = &str> {
        self.sources.iter().map(|s| s.id.as_str())
    }

    pub fn layer_ids(&self) -> impl Iterator<Item = &str> {
        self.layers.iter().map(|l| l.id.as_str())
    }
}

impl Default for StyleBootstrap {
    fn default() -> Self {
        Self::wildfire_defaults()
    }
}

fn perimeters() -> serde_json::Value {
    json!({
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "properties": {"wildfire": "wf-son-001"},
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [[
                        [-110.915, 31.250],
                        [-110.885, 31.252],
                        [-110.882, 31.270],
                        [-110.910, 31.273],
                        [-110.915, 31.250]
                    ]]
                }
            },
            {
                "type": "Feature",
                "properties": {"wildfire": "wf-son-002"},
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [[
                        [-110.320, 30.970],
                        [-110.260, 30.975],
                        [-110.255, 31.010],
                        [-110.315, 31.012],
                        [-110.320, 30.970]
                    ]]
                }
            }
        ]
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_have_two_sources_and_three_layers() {
        let style = StyleBootstrap::wildfire_defaults();
        assert_eq!(
            style.source_ids().collect::<Vec<_>>(),
            vec![DEM_SOURCE_ID, PERIMETER_SOURCE_ID]
        );
        assert_eq!(
            style.layer_ids().collect::<Vec<_>>(),
            vec!["sky", "wildfire-perimeter-fill", "wildfire-perimeter-outline"]
        );
    }

    #[test]
    fn test_every_layer_source_is_static() {
        let style = StyleBootstrap::wildfire_defaults();
        for layer in &style.layers {
            if let Some(ref source) = layer.source {
                assert!(style.source_ids().any(|id| id == source), "{}", layer.id);
            }
        }
    }

    #[test]
    fn test_overrides() {
        let style = StyleBootstrap::wildfire_defaults()
            .with_terrain_exaggeration(2.0)
            .with_pitch(45.0);
        assert_eq!(style.terrain.as_ref().unwrap().exaggeration, 2.0);
        assert_eq!(style.pitch, 45.0);

        assert!(style.without_terrain().terrain.is_none());
    }
}
