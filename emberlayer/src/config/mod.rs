//! Controller configuration.
//!
//! Loaded from an INI file; every key is optional and falls back to the
//! defaults below.
//!
//! # Example Configuration (INI)
//!
//! ```ini
//! [map]
//! container = map
//! style_url = mapbox://styles/mapbox/satellite-streets-v12
//! projection = globe
//! center = -109.68775, 30.37523
//! zoom = 15
//!
//! [camera]
//! selection_zoom = 15
//! speed = 0.8
//! curve = 1.0
//! easing = linear
//! replay_selection_on_ready = true
//!
//! [terrain]
//! enabled = true
//! exaggeration = 1.4
//! pitch = 60
//!
//! [logging]
//! level = info
//! directory = /var/log/emberlayer
//!
//! [headless]
//! animation_frames = 4
//! ```

use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use ini::{Ini, Properties};
use thiserror::Error;
use tracing::debug;

use crate::catalog::StyleBootstrap;
use crate::engine::{Easing, EngineConfig, FlyToOptions, Projection};
use crate::geo::{validate_zoom, LngLat};

/// Directory under the user's home holding EmberLayer files.
pub const CONFIG_DIR_NAME: &str = ".emberlayer";

/// Configuration file name.
pub const CONFIG_FILE_NAME: &str = "config.ini";

/// Errors loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: ini::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] ini::ParseError),

    #[error("Invalid value '{value}' for [{section}] {key}: {reason}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
        reason: String,
    },
}

/// `[map]`: engine construction parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct MapSection {
    pub container: String,
    pub style_url: String,
    pub projection: Projection,
    pub center: LngLat,
    pub zoom: f64,
}

impl Default for MapSection {
    fn default() -> Self {
        let engine = EngineConfig::default();
        Self {
            container: engine.container,
            style_url: engine.style_url,
            projection: engine.projection,
            center: engine.center,
            zoom: engine.zoom,
        }
    }
}

/// `[camera]`: selection fly-to behaviour.
#[derive(Debug, Clone, PartialEq)]
pub struct CameraSection {
    /// Zoom used for a selected record.
    pub selection_zoom: f64,
    pub speed: f64,
    pub curve: f64,
    pub easing: Easing,
    /// Fly to the store's selection once a new engine's style is ready.
    pub replay_selection_on_ready: bool,
}

impl Default for CameraSection {
    fn default() -> Self {
        let options = FlyToOptions::default();
        Self {
            selection_zoom: options.zoom,
            speed: options.speed,
            curve: options.curve,
            easing: options.easing,
            replay_selection_on_ready: true,
        }
    }
}

/// `[terrain]`: 3D terrain and initial pitch.
#[derive(Debug, Clone, PartialEq)]
pub struct TerrainSection {
    pub enabled: bool,
    pub exaggeration: f64,
    pub pitch: f64,
}

impl Default for TerrainSection {
    fn default() -> Self {
        Self {
            enabled: true,
            exaggeration: 1.4,
            pitch: 60.0,
        }
    }
}

/// `[logging]`
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingSection {
    /// Default filter directive when `RUST_LOG` is unset.
    pub level: String,
    /// Directory for daily-rolling log files; stderr only when unset.
    pub directory: Option<PathBuf>,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            directory: None,
        }
    }
}

/// `[headless]`: in-memory engine settings.
#[derive(Debug, Clone, PartialEq)]
pub struct HeadlessSection {
    pub animation_frames: u32,
}

impl Default for HeadlessSection {
    fn default() -> Self {
        Self {
            animation_frames: crate::engine::DEFAULT_ANIMATION_FRAMES,
        }
    }
}

/// Complete controller configuration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ControllerConfig {
    pub map: MapSection,
    pub camera: CameraSection,
    pub terrain: TerrainSection,
    pub logging: LoggingSection,
    pub headless: HeadlessSection,
}

impl ControllerConfig {
    /// `~/.emberlayer/config.ini`, if a home directory is known.
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Load from `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let ini = Ini::load_from_file(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "Loaded config file");
        Self::from_ini(&ini)
    }

    /// Parse INI text.
    pub fn from_ini_str(text: &str) -> Result<Self, ConfigError> {
        let ini = Ini::load_from_str(text)?;
        Self::from_ini(&ini)
    }

    /// Load `path` if given, else the default path if that file exists,
    /// else defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = path {
            return Self::load(path);
        }
        match Self::default_path() {
            Some(path) if path.exists() => Self::load(&path),
            _ => {
                debug!("No config file, using defaults");
                Ok(Self::default())
            }
        }
    }

    fn from_ini(ini: &Ini) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(section) = ini.section(Some("map")) {
            let map = &mut config.map;
            if let Some(v) = section.get("container") {
                map.container = v.trim().to_string();
            }
            if let Some(v) = section.get("style_url") {
                map.style_url = v.trim().to_string();
            }
            read(section, "map", "projection", &mut map.projection)?;
            if let Some(v) = section.get("center") {
                map.center = parse_center(v)?;
            }
            read(section, "map", "zoom", &mut map.zoom)?;
            check_zoom("map", "zoom", map.zoom)?;
        }

        if let Some(section) = ini.section(Some("camera")) {
            let camera = &mut config.camera;
            read(section, "camera", "selection_zoom", &mut camera.selection_zoom)?;
            check_zoom("camera", "selection_zoom", camera.selection_zoom)?;
            read(section, "camera", "speed", &mut camera.speed)?;
            read(section, "camera", "curve", &mut camera.curve)?;
            read(section, "camera", "easing", &mut camera.easing)?;
            read(
                section,
                "camera",
                "replay_selection_on_ready",
                &mut camera.replay_selection_on_ready,
            )?;
        }

        if let Some(section) = ini.section(Some("terrain")) {
            let terrain = &mut config.terrain;
            read(section, "terrain", "enabled", &mut terrain.enabled)?;
            read(section, "terrain", "exaggeration", &mut terrain.exaggeration)?;
            read(section, "terrain", "pitch", &mut terrain.pitch)?;
        }

        if let Some(section) = ini.section(Some("logging")) {
            if let Some(v) = section.get("level") {
                config.logging.level = v.trim().to_string();
            }
            if let Some(v) = section.get("directory") {
                let v = v.trim();
                config.logging.directory = (!v.is_empty()).then(|| PathBuf::from(v));
            }
        }

        if let Some(section) = ini.section(Some("headless")) {
            read(
                section,
                "headless",
                "animation_frames",
                &mut config.headless.animation_frames,
            )?;
        }

        Ok(config)
    }

    /// Construction parameters for a new engine instance.
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            container: self.map.container.clone(),
            style_url: self.map.style_url.clone(),
            projection: self.map.projection,
            center: self.map.center,
            zoom: self.map.zoom,
        }
    }

    /// Options bundle for selection fly-to commands.
    pub fn fly_to_options(&self) -> FlyToOptions {
        FlyToOptions {
            zoom: self.camera.selection_zoom,
            speed: self.camera.speed,
            curve: self.camera.curve,
            easing: self.camera.easing,
        }
    }

    /// Static style bootstrap with this config's terrain settings applied.
    pub fn style(&self) -> StyleBootstrap {
        let style = StyleBootstrap::wildfire_defaults().with_pitch(self.terrain.pitch);
        if self.terrain.enabled {
            style.with_terrain_exaggeration(self.terrain.exaggeration)
        } else {
            style.without_terrain()
        }
    }
}

/// Overwrite `target` with the parsed value of `key`, if present.
fn read<T>(section: &Properties, name: &str, key: &str, target: &mut T) -> Result<(), ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    if let Some(raw) = section.get(key) {
        *target = raw.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
            section: name.to_string(),
            key: key.to_string(),
            value: raw.to_string(),
            reason: e.to_string(),
        })?;
    }
    Ok(())
}

fn parse_center(raw: &str) -> Result<LngLat, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidValue {
        section: "map".to_string(),
        key: "center".to_string(),
        value: raw.to_string(),
        reason,
    };

    let parts: Vec<&str> = raw.split(',').map(str::trim).collect();
    let [lng, lat] = parts.as_slice() else {
        return Err(invalid("expected 'lng, lat'".to_string()));
    };
    let lng: f64 = lng.parse().map_err(|e| invalid(format!("{e}")))?;
    let lat: f64 = lat.parse().map_err(|e| invalid(format!("{e}")))?;
    LngLat::try_new(lng, lat).map_err(|e| invalid(e.to_string()))
}

fn check_zoom(section: &str, key: &str, zoom: f64) -> Result<(), ConfigError> {
    validate_zoom(zoom)
        .map(|_| ())
        .map_err(|e| ConfigError::InvalidValue {
            section: section.to_string(),
            key: key.to_string(),
            value: zoom.to_string(),
            reason: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults_match_application() {
        let config = ControllerConfig::default();
        assert_eq!(config.map.container, "map");
        assert_eq!(config.map.projection, Projection::Globe);
        assert_eq!(config.map.zoom, 15.0);
        assert_eq!(config.camera.speed, 0.8);
        assert_eq!(config.camera.easing, Easing::Linear);
        assert!(config.camera.replay_selection_on_ready);
        assert_eq!(config.terrain.exaggeration, 1.4);
        assert_eq!(config.terrain.pitch, 60.0);
        assert_eq!(config.logging.level, "info");
        assert!(config.logging.directory.is_none());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = ControllerConfig::from_ini_str(
            "[camera]\nspeed = 1.2\neasing = ease-out-quad\n\n[terrain]\npitch = 45\n",
        )
        .unwrap();
        assert_eq!(config.camera.speed, 1.2);
        assert_eq!(config.camera.easing, Easing::EaseOutQuad);
        assert_eq!(config.camera.curve, 1.0);
        assert_eq!(config.terrain.pitch, 45.0);
        assert_eq!(config.map, MapSection::default());
    }

    #[test]
    fn test_center_parsing() {
        let config = ControllerConfig::from_ini_str("[map]\ncenter = -110.9, 31.26\n").unwrap();
        assert_eq!(config.map.center, LngLat::new(-110.9, 31.26));

        for bad in ["-110.9", "a, b", "0, 95", "1, 2, 3"] {
            let text = format!("[map]\ncenter = {bad}\n");
            assert!(
                matches!(
                    ControllerConfig::from_ini_str(&text),
                    Err(ConfigError::InvalidValue { .. })
                ),
                "{bad}"
            );
        }
    }

    #[test]
    fn test_invalid_values_are_reported() {
        let err = ControllerConfig::from_ini_str("[camera]\neasing = bouncy\n").unwrap_err();
        let message = err.to_string();
        assert!(message.contains("[camera] easing"), "{message}");
        assert!(message.contains("bouncy"), "{message}");

        assert!(ControllerConfig::from_ini_str("[map]\nzoom = 40\n").is_err());
        assert!(ControllerConfig::from_ini_str("[map]\nprojection = polar\n").is_err());
        assert!(ControllerConfig::from_ini_str("[terrain]\nenabled = maybe\n").is_err());
    }

    #[test]
    fn test_zoom_out_of_range_is_rejected() {
        let err = ControllerConfig::from_ini_str("[camera]\nselection_zoom = 23\n").unwrap_err();
        match err {
            ConfigError::InvalidValue { key, reason, .. } => {
                assert_eq!(key, "selection_zoom");
                assert!(reason.contains("Zoom 23"), "{reason}");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[map]\nprojection = mercator\nzoom = 9").unwrap();
        writeln!(file, "[logging]\nlevel = debug\ndirectory = /tmp/ember-logs").unwrap();

        let config = ControllerConfig::load(file.path()).unwrap();
        assert_eq!(config.map.projection, Projection::Mercator);
        assert_eq!(config.map.zoom, 9.0);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(
            config.logging.directory,
            Some(PathBuf::from("/tmp/ember-logs"))
        );
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.ini");
        assert!(matches!(
            ControllerConfig::load(&path),
            Err(ConfigError::Read { .. })
        ));
        assert!(ControllerConfig::load_or_default(Some(&path)).is_err());
    }

    #[test]
    fn test_derived_engine_config_and_style() {
        let config = ControllerConfig::from_ini_str(
            "[camera]\nselection_zoom = 12\n[terrain]\nexaggeration = 2.0\npitch = 30\n",
        )
        .unwrap();

        assert_eq!(config.engine_config(), EngineConfig::default());
        assert_eq!(config.fly_to_options().zoom, 12.0);

        let style = config.style();
        assert_eq!(style.pitch, 30.0);
        assert_eq!(style.terrain.unwrap().exaggeration, 2.0);

        let flat = ControllerConfig::from_ini_str("[terrain]\nenabled = false\n").unwrap();
        assert!(flat.style().terrain.is_none());
    }
}
