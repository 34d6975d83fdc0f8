//! CLI error type.

use emberlayer::catalog::CatalogError;
use emberlayer::config::ConfigError;
use emberlayer::geo::GeoError;
use emberlayer::logging::LoggingError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Logging(#[from] LoggingError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Geo(#[from] GeoError),

    #[error("{0}")]
    InvalidArgument(String),

    #[error("Unknown wildfire '{0}'. Use 'emberlayer wildfires' to list records.")]
    UnknownWildfire(String),
}
