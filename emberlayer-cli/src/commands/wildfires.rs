//! `emberlayer wildfires`: list the embedded wildfire catalog.

use clap::Args;
use console::style;
use emberlayer::catalog::{WildfireCatalog, WildfireRecord};

use crate::error::CliError;

#[derive(Debug, Args)]
pub struct WildfiresArgs {
    /// Only records in this country (case-insensitive)
    #[arg(long)]
    pub country: Option<String>,

    /// Only records in this state (case-insensitive)
    #[arg(long)]
    pub state: Option<String>,

    /// Show fire behaviour and weather for each record
    #[arg(long)]
    pub details: bool,
}

pub fn run(args: &WildfiresArgs) -> Result<(), CliError> {
    let catalog = WildfireCatalog::embedded()?;
    let records = filter(&catalog, args);

    if records.is_empty() {
        println!("No wildfire records match.");
        return Ok(());
    }

    println!(
        "{:<12} {:<18} {:<14} {:<16} {}",
        style("ID").bold(),
        style("NAME").bold(),
        style("STATE").bold(),
        style("COUNTRY").bold(),
        style("COORDINATES").bold()
    );
    for record in &records {
        println!(
            "{:<12} {:<18} {:<14} {:<16} {}",
            record.id, record.name, record.state, record.country, record.coordinates
        );
        if args.details {
            print_details(record);
        }
    }
    println!("\n{} record(s)", records.len());
    Ok(())
}

fn filter<'a>(catalog: &'a WildfireCatalog, args: &WildfiresArgs) -> Vec<&'a WildfireRecord> {
    let matches = |wanted: &Option<String>, actual: &str| {
        wanted
            .as_deref()
            .map_or(true, |w| w.eq_ignore_ascii_case(actual))
    };
    catalog
        .records()
        .iter()
        .filter(|r| matches(&args.country, &r.country) && matches(&args.state, &r.state))
        .collect()
}

fn print_details(record: &WildfireRecord) {
    let fire = &record.actual_data;
    let weather = &record.weather;
    println!(
        "    {} started {}, size {}, fuel {}, slope {}, FRP {}",
        style("fire").dim(),
        fire.start_time,
        fire.size,
        fire.fuel,
        fire.slope,
        fire.frp
    );
    println!(
        "    {} wind {} {}, air {}, humidity {}, precipitation {}",
        style("weather").dim(),
        weather.wind_direction,
        weather.wind_eye_level,
        weather.air_temp,
        weather.rel_humidity,
        weather.precipitation
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(country: Option<&str>, state: Option<&str>) -> WildfiresArgs {
        WildfiresArgs {
            country: country.map(str::to_string),
            state: state.map(str::to_string),
            details: false,
        }
    }

    #[test]
    fn test_filter_by_country_and_state() {
        let catalog = WildfireCatalog::embedded().unwrap();

        assert_eq!(filter(&catalog, &args(None, None)).len(), catalog.len());
        assert!(filter(&catalog, &args(Some("mexico"), None))
            .iter()
            .all(|r| r.country == "Mexico"));
        let arizona = filter(&catalog, &args(None, Some("Arizona")));
        assert_eq!(arizona.len(), 1);
        assert_eq!(arizona[0].id, "wf-az-001");
        assert!(filter(&catalog, &args(Some("Canada"), None)).is_empty());
    }
}
