//! Ground scale estimation.
//!
//! Derives the real-world distance covered by one screen pixel from the
//! camera's zoom and center latitude. This is the Web Mercator ground
//! sampling distance: it halves with every zoom level and shrinks towards the
//! poles by the cosine of latitude (meridian convergence).
//!
//! ```text
//! scale = C * |cos(lat * π / 180)| / 2^(zoom + 8)
//! ```
//!
//! The `+ 8` accounts for the 256px tile width at zoom 0.

use std::f64::consts::PI;

use crate::geo::CameraState;

/// Ground distance spanning the full world width at zoom level 0.
///
/// Tenths of the equatorial circumference in metres, the unit the scale bar
/// consumes.
pub const WORLD_SPAN_AT_ZOOM_ZERO: f64 = 4_007_501.6686;

/// Ground distance per pixel for the given zoom and center latitude.
#[inline]
pub fn ground_scale(zoom: f64, latitude: f64) -> f64 {
    WORLD_SPAN_AT_ZOOM_ZERO * (latitude * PI / 180.0).cos().abs() / 2.0_f64.powf(zoom + 8.0)
}

/// The derived "ground distance per pixel" metric.
///
/// Has no lifecycle of its own; it is a projection of the latest camera state.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct ScaleMetric(f64);

impl ScaleMetric {
    /// Compute the metric for a camera state.
    pub fn from_camera(camera: &CameraState) -> Self {
        Self(ground_scale(camera.zoom, camera.center.lat))
    }

    /// Ground distance represented by one pixel.
    pub fn per_pixel(&self) -> f64 {
        self.0
    }

    /// Ground distance covered by a bar `pixels` wide.
    pub fn span(&self, pixels: f64) -> f64 {
        self.0 * pixels
    }
}

impl std::fmt::Display for ScaleMetric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.6}/px", self.0)
    }
}

/// Recomputes the scale metric on every viewport change.
///
/// Keeps only the last computed value; there is no interpolation between
/// events.
#[derive(Debug, Default)]
pub struct GroundScaleEstimator {
    last: Option<ScaleMetric>,
}

impl GroundScaleEstimator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compute the metric for `camera` and remember it.
    pub fn update(&mut self, camera: &CameraState) -> ScaleMetric {
        let metric = ScaleMetric::from_camera(camera);
        self.last = Some(metric);
        metric
    }

    /// The most recently computed metric, if any viewport change was seen.
    pub fn last(&self) -> Option<ScaleMetric> {
        self.last
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::LngLat;

    const C: f64 = WORLD_SPAN_AT_ZOOM_ZERO;

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() <= b.abs() * 1e-12
    }

    #[test]
    fn test_equator_zoom_8() {
        assert!(approx_eq(ground_scale(8.0, 0.0), C / 2.0_f64.powi(16)));
    }

    #[test]
    fn test_sixty_degrees_halves_the_equator_value() {
        // cos(60°) = 0.5
        let equator = ground_scale(0.0, 0.0);
        assert!(approx_eq(equator, C / 256.0));
        assert!(approx_eq(ground_scale(0.0, 60.0), equator * 0.5));
    }

    #[test]
    fn test_symmetric_in_latitude() {
        for lat in [1.0, 31.26, 45.0, 60.0, 89.0] {
            assert_eq!(ground_scale(12.0, lat), ground_scale(12.0, -lat));
        }
    }

    #[test]
    fn test_each_zoom_level_halves_scale() {
        let z10 = ground_scale(10.0, 31.26);
        let z11 = ground_scale(11.0, 31.26);
        assert!(approx_eq(z11 * 2.0, z10));
    }

    #[test]
    fn test_fractional_zoom() {
        let z = ground_scale(9.5, 0.0);
        assert!(z < ground_scale(9.0, 0.0));
        assert!(z > ground_scale(10.0, 0.0));
    }

    #[test]
    fn test_estimator_remembers_last_value() {
        let mut estimator = GroundScaleEstimator::new();
        assert!(estimator.last().is_none());

        let first = estimator.update(&CameraState::new(LngLat::new(-110.9, 31.26), 15.0));
        assert_eq!(estimator.last(), Some(first));

        let second = estimator.update(&CameraState::new(LngLat::new(-110.9, 31.26), 9.0));
        assert!(second > first);
        assert_eq!(estimator.last(), Some(second));
    }

    #[test]
    fn test_metric_span_and_display() {
        let metric = ScaleMetric::from_camera(&CameraState::new(LngLat::new(0.0, 0.0), 8.0));
        assert!(approx_eq(metric.span(100.0), metric.per_pixel() * 100.0));
        assert!(metric.to_string().ends_with("/px"));
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn test_strictly_decreasing_in_zoom(
                lat in -85.0..85.0_f64,
                zoom in 0.0..21.0_f64,
                step in 0.01..1.0_f64,
            ) {
                prop_assert!(ground_scale(zoom + step, lat) < ground_scale(zoom, lat));
            }

            #[test]
            fn test_never_exceeds_equator_value(
                lat in -90.0..90.0_f64,
                zoom in 0.0..22.0_f64,
            ) {
                prop_assert!(ground_scale(zoom, lat) <= ground_scale(zoom, 0.0));
            }
        }
    }
}
