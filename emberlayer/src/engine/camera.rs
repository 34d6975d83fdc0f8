//! Animated camera commands.

use std::str::FromStr;

use crate::geo::{LngLat, SelectionTarget};

/// Easing curve for camera animations.
///
/// Each variant is a monotonic map from normalized time `t ∈ [0, 1]` to eased
/// progress in `[0, 1]`, with `apply(0) == 0` and `apply(1) == 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Easing {
    /// Identity: progress equals time.
    #[default]
    Linear,
    EaseInQuad,
    EaseOutQuad,
    EaseInOutCubic,
}

impl Easing {
    /// Eased progress at normalized time `t` (clamped to `[0, 1]`).
    pub fn apply(&self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::EaseInQuad => t * t,
            Easing::EaseOutQuad => t * (2.0 - t),
            Easing::EaseInOutCubic => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
                }
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Easing::Linear => "linear",
            Easing::EaseInQuad => "ease-in-quad",
            Easing::EaseOutQuad => "ease-out-quad",
            Easing::EaseInOutCubic => "ease-in-out-cubic",
        }
    }
}

impl FromStr for Easing {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "linear" => Ok(Easing::Linear),
            "ease-in-quad" => Ok(Easing::EaseInQuad),
            "ease-out-quad" => Ok(Easing::EaseOutQuad),
            "ease-in-out-cubic" => Ok(Easing::EaseInOutCubic),
            other => Err(format!("unknown easing '{}'", other)),
        }
    }
}

/// Options bundle for a fly-to transition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlyToOptions {
    /// Zoom used when the target carries no zoom hint.
    pub zoom: f64,
    /// Animation speed factor.
    pub speed: f64,
    /// Zoom-out curvature of the flight path.
    pub curve: f64,
    pub easing: Easing,
}

impl Default for FlyToOptions {
    fn default() -> Self {
        Self {
            zoom: 15.0,
            speed: 0.8,
            curve: 1.0,
            easing: Easing::Linear,
        }
    }
}

/// A fully resolved `flyTo` call as handed to the engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlyToCommand {
    pub center: LngLat,
    pub zoom: f64,
    pub speed: f64,
    pub curve: f64,
    pub easing: Easing,
}

impl FlyToCommand {
    /// Resolve a target against an options bundle.
    ///
    /// The target's zoom hint wins over `options.zoom`.
    pub fn resolve(target: &SelectionTarget, options: &FlyToOptions) -> Self {
        Self {
            center: target.center,
            zoom: target.zoom.unwrap_or(options.zoom),
            speed: options.speed,
            curve: options.curve,
            easing: options.easing,
        }
    }
}
