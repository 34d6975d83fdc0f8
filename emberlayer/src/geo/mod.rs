//! Geographic primitives shared by the controller components.
//!
//! Coordinates follow the rendering engine's convention: longitude first,
//! latitude second, both in degrees.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Minimum valid latitude in degrees.
pub const MIN_LAT: f64 = -90.0;

/// Maximum valid latitude in degrees.
pub const MAX_LAT: f64 = 90.0;

/// Minimum valid longitude in degrees.
pub const MIN_LON: f64 = -180.0;

/// Maximum valid longitude in degrees.
pub const MAX_LON: f64 = 180.0;

/// Maximum zoom level the engine accepts.
pub const MAX_ZOOM: f64 = 22.0;

/// Errors produced when validating geographic input.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeoError {
    #[error("Latitude {0} outside [-90, 90]")]
    InvalidLatitude(f64),

    #[error("Longitude {0} outside [-180, 180]")]
    InvalidLongitude(f64),

    #[error("Zoom {0} outside [0, 22]")]
    InvalidZoom(f64),
}

/// A longitude/latitude pair in degrees.
///
/// Serialized as a `[lng, lat]` array, the layout used by GeoJSON and by the
/// engine's `center` parameter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct LngLat {
    /// Longitude in degrees (negative = west)
    pub lng: f64,
    /// Latitude in degrees (negative = south)
    pub lat: f64,
}

impl LngLat {
    /// Create a coordinate without validation.
    pub const fn new(lng: f64, lat: f64) -> Self {
        Self { lng, lat }
    }

    /// Create a coordinate, rejecting values outside the valid ranges.
    pub fn try_new(lng: f64, lat: f64) -> Result<Self, GeoError> {
        if !(MIN_LAT..=MAX_LAT).contains(&lat) {
            return Err(GeoError::InvalidLatitude(lat));
        }
        if !(MIN_LON..=MAX_LON).contains(&lng) {
            return Err(GeoError::InvalidLongitude(lng));
        }
        Ok(Self { lng, lat })
    }

    /// Linear interpolation towards `other`; `t` is clamped to `[0, 1]`.
    pub fn lerp(&self, other: &LngLat, t: f64) -> LngLat {
        let t = t.clamp(0.0, 1.0);
        LngLat {
            lng: self.lng + (other.lng - self.lng) * t,
            lat: self.lat + (other.lat - self.lat) * t,
        }
    }
}

/// Check that `zoom` is within `0..=MAX_ZOOM`.
pub fn validate_zoom(zoom: f64) -> Result<f64, GeoError> {
    if (0.0..=MAX_ZOOM).contains(&zoom) {
        Ok(zoom)
    } else {
        Err(GeoError::InvalidZoom(zoom))
    }
}

impl From<[f64; 2]> for LngLat {
    fn from(pair: [f64; 2]) -> Self {
        Self {
            lng: pair[0],
            lat: pair[1],
        }
    }
}

impl From<LngLat> for [f64; 2] {
    fn from(point: LngLat) -> Self {
        [point.lng, point.lat]
    }
}

impl std::fmt::Display for LngLat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.5}, {:.5})", self.lng, self.lat)
    }
}

/// Camera parameters as reported by the engine.
///
/// Read-only from the controller's point of view; it only changes through
/// animated transitions the controller requests.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraState {
    /// Map center
    pub center: LngLat,
    /// Zoom level (0 = whole world in one 256px tile)
    pub zoom: f64,
    /// Tilt away from nadir in degrees
    pub pitch: f64,
    /// Rotation from north in degrees
    pub bearing: f64,
}

impl CameraState {
    pub fn new(center: LngLat, zoom: f64) -> Self {
        Self {
            center,
            zoom,
            pitch: 0.0,
            bearing: 0.0,
        }
    }

    pub fn with_pitch(mut self, pitch: f64) -> Self {
        self.pitch = pitch;
        self
    }
}

impl Default for CameraState {
    fn default() -> Self {
        Self::new(LngLat::new(0.0, 0.0), 0.0)
    }
}

/// Where the camera should be: a center plus an optional zoom hint.
///
/// Produced by selecting a record (no hint, the director applies its
/// configured selection zoom) or declared by an overlay's activation view.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectionTarget {
    pub center: LngLat,
    pub zoom: Option<f64>,
}

impl SelectionTarget {
    pub fn new(center: LngLat) -> Self {
        Self { center, zoom: None }
    }

    pub fn with_zoom(mut self, zoom: f64) -> Self {
        self.zoom = Some(zoom);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_try_new_accepts_valid_coordinates() {
        let point = LngLat::try_new(-110.90, 31.26).unwrap();
        assert_eq!(point.lng, -110.90);
        assert_eq!(point.lat, 31.26);
    }

    #[test]
    fn test_try_new_rejects_latitude() {
        assert!(matches!(
            LngLat::try_new(0.0, 91.0),
            Err(GeoError::InvalidLatitude(_))
        ));
    }

    #[test]
    fn test_try_new_rejects_longitude() {
        assert!(matches!(
            LngLat::try_new(-181.0, 0.0),
            Err(GeoError::InvalidLongitude(_))
        ));
    }

    #[test]
    fn test_validate_zoom() {
        assert_eq!(validate_zoom(0.0), Ok(0.0));
        assert_eq!(validate_zoom(MAX_ZOOM), Ok(MAX_ZOOM));
        assert_eq!(validate_zoom(22.5), Err(GeoError::InvalidZoom(22.5)));
        assert_eq!(validate_zoom(-1.0), Err(GeoError::InvalidZoom(-1.0)));
    }

    #[test]
    fn test_serializes_as_lng_lat_array() {
        let point = LngLat::new(-110.9, 31.26);
        let json = serde_json::to_string(&point).unwrap();
        assert_eq!(json, "[-110.9,31.26]");

        let parsed: LngLat = serde_json::from_str("[-109.5,30.25]").unwrap();
        assert_eq!(parsed, LngLat::new(-109.5, 30.25));
    }

    #[test]
    fn test_lerp_endpoints_and_clamp() {
        let a = LngLat::new(0.0, 0.0);
        let b = LngLat::new(10.0, -20.0);
        assert_eq!(a.lerp(&b, 0.0), a);
        assert_eq!(a.lerp(&b, 1.0), b);
        assert_eq!(a.lerp(&b, 2.0), b);
        assert_eq!(a.lerp(&b, 0.5), LngLat::new(5.0, -10.0));
    }

    #[test]
    fn test_selection_target_zoom_hint() {
        let target = SelectionTarget::new(LngLat::new(1.0, 2.0));
        assert_eq!(target.zoom, None);
        assert_eq!(target.with_zoom(9.0).zoom, Some(9.0));
    }
}
