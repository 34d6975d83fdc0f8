//! CLI subcommands.

pub mod scale;
pub mod simulate;
pub mod wildfires;
