//! Static domain data.
//!
//! - [`WildfireCatalog`]: wildfire records selectable from the UI
//! - [`StyleBootstrap`]: sources, layers and atmosphere registered once per engine
//! - [`OverlayRegistry`]: overlays the user can toggle on and off

mod overlays;
mod style;
mod wildfires;

pub use overlays::{
    OverlayDefinition, OverlayRegistry, FIRE_HISTORY, HOTSPOT_LAYER_ID, HOTSPOT_SOURCE_ID,
};
pub use style::{SourceDefinition, StyleBootstrap, DEM_SOURCE_ID, PERIMETER_SOURCE_ID};
pub use wildfires::{ActualData, WeatherConditions, WildfireCatalog, WildfireRecord};

use thiserror::Error;

use crate::geo::GeoError;

/// Errors loading catalog data.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Failed to parse wildfire dataset: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Duplicate wildfire id '{0}'")]
    DuplicateId(String),

    #[error("Wildfire '{0}' has invalid coordinates: {1}")]
    InvalidCoordinates(String, #[source] GeoError),
}
