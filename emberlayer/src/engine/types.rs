//! Typed values passed to engine primitives.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::geo::LngLat;

/// Map projection requested at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Projection {
    #[default]
    Globe,
    Mercator,
}

impl FromStr for Projection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "globe" => Ok(Projection::Globe),
            "mercator" => Ok(Projection::Mercator),
            other => Err(format!("unknown projection '{}'", other)),
        }
    }
}

/// Construction parameters for one engine instance.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Identifier of the host element the engine renders into.
    pub container: String,
    /// Base style URL.
    pub style_url: String,
    pub projection: Projection,
    /// Initial camera center.
    pub center: LngLat,
    /// Initial zoom level.
    pub zoom: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            container: "map".to_string(),
            style_url: "mapbox://styles/mapbox/satellite-streets-v12".to_string(),
            projection: Projection::Globe,
            center: LngLat::new(-109.68775015454612, 30.375232671192375),
            zoom: 15.0,
        }
    }
}

/// UI controls attached to the engine at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MapControl {
    Navigation,
    Fullscreen,
}

/// Data source specification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum SourceSpec {
    /// Inline GeoJSON data.
    #[serde(rename = "geojson")]
    GeoJson { data: Value },
    /// Elevation tiles used for terrain.
    RasterDem {
        url: String,
        #[serde(rename = "tileSize")]
        tile_size: u32,
        maxzoom: u8,
    },
    /// Vector tile source.
    Vector { url: String },
}

impl SourceSpec {
    pub fn geojson(data: Value) -> Self {
        SourceSpec::GeoJson { data }
    }
}

/// Layer rendering kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerKind {
    Fill,
    Line,
    Circle,
    Heatmap,
    Raster,
    Sky,
}

impl LayerKind {
    /// Whether layers of this kind draw from a source.
    pub fn needs_source(&self) -> bool {
        !matches!(self, LayerKind::Sky)
    }
}

/// Layer specification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerSpec {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: LayerKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default)]
    pub paint: Value,
    #[serde(rename = "minzoom", skip_serializing_if = "Option::is_none")]
    pub min_zoom: Option<f64>,
    #[serde(rename = "maxzoom", skip_serializing_if = "Option::is_none")]
    pub max_zoom: Option<f64>,
}

impl LayerSpec {
    pub fn new(id: impl Into<String>, kind: LayerKind) -> Self {
        Self {
            id: id.into(),
            kind,
            source: None,
            paint: Value::Null,
            min_zoom: None,
            max_zoom: None,
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn with_paint(mut self, paint: Value) -> Self {
        self.paint = paint;
        self
    }

    pub fn with_max_zoom(mut self, max_zoom: f64) -> Self {
        self.max_zoom = Some(max_zoom);
        self
    }
}

/// Atmospheric fog parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct FogConfig {
    pub color: String,
    pub high_color: String,
    pub horizon_blend: f64,
    pub space_color: String,
    pub star_intensity: f64,
}

impl Default for FogConfig {
    fn default() -> Self {
        Self {
            color: "rgb(186, 210, 235)".to_string(),
            high_color: "rgb(36, 92, 223)".to_string(),
            horizon_blend: 0.02,
            space_color: "rgb(11, 11, 25)".to_string(),
            star_intensity: 0.6,
        }
    }
}

/// 3D terrain parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TerrainConfig {
    /// Raster-dem source providing elevation.
    pub source: String,
    pub exaggeration: f64,
}
