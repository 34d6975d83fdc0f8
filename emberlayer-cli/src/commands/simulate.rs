//! `emberlayer simulate`: drive the controller against the headless engine.
//!
//! Walks one user session through its steps (open map, style load, pick a
//! wildfire, toggle an overlay, clear the pick, close the map) and prints
//! the engine calls each step produced.

use clap::Args;
use console::style;
use emberlayer::catalog::{OverlayRegistry, WildfireCatalog, FIRE_HISTORY};
use emberlayer::config::ControllerConfig;
use emberlayer::engine::{EngineCall, HeadlessFactory, HeadlessProbe};
use emberlayer::store::AppStore;
use emberlayer::sync::SyncController;
use tracing::info;

use crate::error::CliError;

#[derive(Debug, Args)]
pub struct SimulateArgs {
    /// Wildfire record to select
    #[arg(long, default_value = "wf-son-001")]
    pub wildfire: String,

    /// Overlay to toggle
    #[arg(long, default_value = FIRE_HISTORY)]
    pub overlay: String,

    /// Number of overlay toggles
    #[arg(long, default_value_t = 2)]
    pub toggles: u32,
}

struct Session {
    store: AppStore,
    probe: HeadlessProbe,
    controller: SyncController<HeadlessFactory>,
}

impl Session {
    fn step(&mut self, title: &str, action: impl FnOnce(&AppStore, &HeadlessProbe)) {
        action(&self.store, &self.probe);
        self.controller.pump();

        println!("\n{}", style(title).cyan().bold());
        let calls = self.probe.calls();
        if calls.is_empty() {
            println!("  {}", style("(no engine calls)").dim());
        }
        for call in &calls {
            println!("  {}", describe(call));
        }
        println!("  {} {}", style("status").dim(), self.controller.status());
        self.probe.clear_calls();
    }
}

pub fn run(args: &SimulateArgs, config: &ControllerConfig) -> Result<(), CliError> {
    let catalog = WildfireCatalog::embedded()?;
    let record = catalog
        .get(&args.wildfire)
        .ok_or_else(|| CliError::UnknownWildfire(args.wildfire.clone()))?;

    let registry = OverlayRegistry::wildfire_defaults();
    if !registry.contains(&args.overlay) {
        let known: Vec<&str> = registry.names().collect();
        return Err(CliError::InvalidArgument(format!(
            "unknown overlay '{}' (registered: {})",
            args.overlay,
            known.join(", ")
        )));
    }

    let store = AppStore::new();
    let factory = HeadlessFactory::with_animation_frames(config.headless.animation_frames);
    let probe = factory.probe();
    let controller = SyncController::builder(factory, store.handles())
        .config(config)
        .registry(registry)
        .build();
    let mut session = Session {
        store,
        probe,
        controller,
    };

    info!(wildfire = %record.id, overlay = %args.overlay, "Starting simulated session");

    session.step("Open map", |store, _| store.set_session_active(true));
    session.step("Style loaded", |_, probe| {
        probe.fire_style_ready();
    });
    let selection = record.selection();
    session.step(&format!("Select {} ({})", record.name, record.id), |store, _| {
        store.select(selection)
    });
    for i in 0..args.toggles {
        let state = if i % 2 == 0 { "on" } else { "off" };
        session.step(&format!("Toggle {} {}", args.overlay, state), |store, _| {
            store.toggle_layer(&args.overlay);
        });
    }
    session.step("Clear selection", |store, _| store.clear_selection());
    session.step("Close map", |store, _| store.set_session_active(false));

    let rejected = session.probe.rejected();
    if rejected.is_empty() {
        println!("\n{}", style("No engine calls rejected").green());
    } else {
        println!("\n{}", style("Rejected engine calls:").red().bold());
        for (call, err) in &rejected {
            println!("  {}: {}", describe(call), err);
        }
    }
    Ok(())
}

fn describe(call: &EngineCall) -> String {
    match call {
        EngineCall::Create { container } => format!("create in '{container}'"),
        EngineCall::AddControl(control) => format!("addControl {control:?}"),
        EngineCall::AddSource(id) => format!("addSource {id}"),
        EngineCall::AddLayer(id) => format!("addLayer {id}"),
        EngineCall::RemoveLayer(id) => format!("removeLayer {id}"),
        EngineCall::RemoveSource(id) => format!("removeSource {id}"),
        EngineCall::SetFog => "setFog".to_string(),
        EngineCall::SetTerrain { source } => format!("setTerrain {source}"),
        EngineCall::SetPitch(pitch) => format!("setPitch {pitch}"),
        EngineCall::FlyTo(cmd) => format!(
            "flyTo {} zoom {} speed {} curve {} ({})",
            cmd.center,
            cmd.zoom,
            cmd.speed,
            cmd.curve,
            cmd.easing.name()
        ),
        EngineCall::Subscribe(topic) => format!("on {topic:?}"),
        EngineCall::Unsubscribe(id) => format!("off {id:?}"),
        EngineCall::Destroy => "remove".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use emberlayer::engine::{Easing, FlyToCommand};
    use emberlayer::geo::LngLat;

    fn args(wildfire: &str, overlay: &str) -> SimulateArgs {
        SimulateArgs {
            wildfire: wildfire.to_string(),
            overlay: overlay.to_string(),
            toggles: 2,
        }
    }

    #[test]
    fn test_default_session_runs() {
        let config = ControllerConfig::default();
        assert!(run(&args("wf-son-001", FIRE_HISTORY), &config).is_ok());
    }

    #[test]
    fn test_unknown_wildfire() {
        let config = ControllerConfig::default();
        assert!(matches!(
            run(&args("wf-none", FIRE_HISTORY), &config),
            Err(CliError::UnknownWildfire(id)) if id == "wf-none"
        ));
    }

    #[test]
    fn test_unknown_overlay() {
        let config = ControllerConfig::default();
        assert!(matches!(
            run(&args("wf-son-001", "Lava"), &config),
            Err(CliError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_describe_fly_to() {
        let cmd = FlyToCommand {
            center: LngLat::new(-110.5, 31.2),
            zoom: 8.0,
            speed: 0.8,
            curve: 1.0,
            easing: Easing::Linear,
        };
        let text = describe(&EngineCall::FlyTo(cmd));
        assert!(text.starts_with("flyTo "));
        assert!(text.contains("zoom 8"));
        assert_eq!(describe(&EngineCall::Destroy), "remove");
    }
}
