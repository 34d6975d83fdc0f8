//! Static wildfire dataset.
//!
//! Records are grouped country → state → wildfire, the same hierarchy the
//! prediction screen walks to resolve a selection.

use serde::Deserialize;

use super::CatalogError;
use crate::geo::LngLat;
use crate::store::Selection;

const EMBEDDED_DATASET: &str = include_str!("wildfires.json");

/// Observed fire behaviour at ignition.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActualData {
    pub start_time: String,
    pub sheltering: String,
    pub live_moist: String,
    pub elev_difference: String,
    pub aspect: String,
    pub size: String,
    pub fuel: String,
    pub slope: String,
    pub frp: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherConditions {
    pub wind_direction: String,
    pub wind_eye_level: String,
    pub air_temp: String,
    pub rel_humidity: String,
    pub precipitation: String,
    pub shading: String,
    pub clouds: String,
    pub solar_radiation: String,
    pub heat_index: String,
    pub brightness: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawWildfire {
    id: String,
    name: String,
    coordinates: LngLat,
    actual_data: ActualData,
    weather_conditions: WeatherConditions,
}

#[derive(Debug, Clone, Deserialize)]
struct RawState {
    name: String,
    wildfires: Vec<RawWildfire>,
}

#[derive(Debug, Clone, Deserialize)]
struct RawCountry {
    country: String,
    states: Vec<RawState>,
}

/// One wildfire record, flattened with its country and state.
#[derive(Debug, Clone, PartialEq)]
pub struct WildfireRecord {
    pub id: String,
    pub name: String,
    pub country: String,
    pub state: String,
    pub coordinates: LngLat,
    pub actual_data: ActualData,
    pub weather: WeatherConditions,
}

impl WildfireRecord {
    /// The store selection produced when this record is picked.
    pub fn selection(&self) -> Selection {
        Selection::new(self.id.clone(), self.coordinates)
    }
}

/// Wildfire records keyed by id.
#[derive(Debug, Clone)]
pub struct WildfireCatalog {
    records: Vec<WildfireRecord>,
}

impl WildfireCatalog {
    /// Load the dataset compiled into the binary.
    pub fn embedded() -> Result<Self, CatalogError> {
        Self::from_json(EMBEDDED_DATASET)
    }

    /// Parse a dataset in the country → state → wildfire layout.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let countries: Vec<RawCountry> = serde_json::from_str(json)?;

        let mut records = Vec::new();
        for country in countries {
            for state in country.states {
                for fire in state.wildfires {
                    if records.iter().any(|r: &WildfireRecord| r.id == fire.id) {
                        return Err(CatalogError::DuplicateId(fire.id));
                    }
                    LngLat::try_new(fire.coordinates.lng, fire.coordinates.lat)
                        .map_err(|e| CatalogError::InvalidCoordinates(fire.id.clone(), e))?;
                    records.push(WildfireRecord {
                        id: fire.id,
                        name: fire.name,
                        country: country.country.clone(),
                        state: state.name.clone(),
                        coordinates: fire.coordinates,
                        actual_data: fire.actual_data,
                        weather: fire.weather_conditions,
                    });
                }
            }
        }

        Ok(Self { records })
    }

    pub fn get(&self, id: &str) -> Option<&WildfireRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    /// Look up a record the way the prediction screen does.
    pub fn find(&self, country: &str, state: &str, name: &str) -> Option<&WildfireRecord> {
        self.records
            .iter()
            .find(|r| r.country == country && r.state == state && r.name == name)
    }

    pub fn records(&self) -> &[WildfireRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
