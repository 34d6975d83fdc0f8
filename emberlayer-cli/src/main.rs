//! EmberLayer CLI - Command-line interface
//!
//! Drives the EmberLayer synchronization controller against its headless
//! engine and exposes the map scale and wildfire catalog helpers.

mod commands;
mod error;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use console::style;
use emberlayer::config::ControllerConfig;
use emberlayer::logging;

use commands::scale::ScaleArgs;
use commands::simulate::SimulateArgs;
use commands::wildfires::WildfiresArgs;
use error::CliError;

#[derive(Debug, Parser)]
#[command(name = "emberlayer", version, about = "EmberLayer map synchronization tools")]
struct Cli {
    /// Path to config.ini (defaults to ~/.emberlayer/config.ini)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Show the ground distance per pixel at a zoom and latitude
    Scale(ScaleArgs),

    /// List the embedded wildfire records
    Wildfires(WildfiresArgs),

    /// Run a scripted session against the headless engine
    Simulate(SimulateArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("error:").red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let config = load_config(&cli)?;
    let _logging = logging::init(&config.logging, cli.verbose)?;

    match cli.command {
        Commands::Scale(args) => commands::scale::run(&args),
        Commands::Wildfires(args) => commands::wildfires::run(&args),
        Commands::Simulate(args) => commands::simulate::run(&args, &config),
    }
}

fn load_config(cli: &Cli) -> Result<ControllerConfig, CliError> {
    Ok(ControllerConfig::load_or_default(cli.config.as_deref())?)
}
