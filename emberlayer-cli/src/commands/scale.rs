//! `emberlayer scale`: ground distance per pixel.

use clap::Args;
use console::style;
use emberlayer::geo::{validate_zoom, CameraState, LngLat};
use emberlayer::scale::ScaleMetric;

use crate::error::CliError;

#[derive(Debug, Args)]
pub struct ScaleArgs {
    /// Zoom level (0-22, fractional allowed)
    #[arg(long)]
    pub zoom: f64,

    /// Center latitude in degrees
    #[arg(long, allow_hyphen_values = true)]
    pub lat: f64,

    /// Scale bar width in pixels
    #[arg(long, default_value_t = 100.0)]
    pub pixels: f64,
}

pub fn run(args: &ScaleArgs) -> Result<(), CliError> {
    let metric = compute(args)?;

    println!(
        "{} zoom {} at latitude {}",
        style("Scale").cyan().bold(),
        args.zoom,
        args.lat
    );
    println!("  per pixel:      {:.6}", metric.per_pixel());
    println!(
        "  {:>5} px bar:   {:.3}",
        args.pixels,
        metric.span(args.pixels)
    );
    Ok(())
}

fn compute(args: &ScaleArgs) -> Result<ScaleMetric, CliError> {
    let zoom = validate_zoom(args.zoom)?;
    let center = LngLat::try_new(0.0, args.lat)?;
    Ok(ScaleMetric::from_camera(&CameraState::new(center, zoom)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use emberlayer::geo::GeoError;
    use emberlayer::scale::ground_scale;

    fn args(zoom: f64, lat: f64) -> ScaleArgs {
        ScaleArgs {
            zoom,
            lat,
            pixels: 100.0,
        }
    }

    #[test]
    fn test_compute_matches_library() {
        let metric = compute(&args(8.0, -31.26)).unwrap();
        assert_eq!(metric.per_pixel(), ground_scale(8.0, -31.26));
    }

    #[test]
    fn test_rejects_out_of_range() {
        assert!(matches!(
            compute(&args(23.0, 0.0)),
            Err(CliError::Geo(GeoError::InvalidZoom(_)))
        ));
        assert!(matches!(
            compute(&args(5.0, 91.0)),
            Err(CliError::Geo(GeoError::InvalidLatitude(_)))
        ));
    }
}
