use crate::core::query::RawParams;
use crate::domain::model::GeoPoint;
use clap::{Parser, Subcommand};

#[derive(Debug, Clone, Parser)]
#[command(name = "venue-discovery")]
#[command(about = "Search, rank and suggest venues from a venue catalogue")]
pub struct CliConfig {
    /// Path to TOML configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Override the venue catalogue file from config
    #[arg(long)]
    pub venues: Option<String>,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON")]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Paginated search, e.g. `search -p city=makati -p amenities=wifi`
    Search {
        #[arg(short = 'p', long = "param", value_parser = parse_key_val)]
        params: Vec<(String, String)>,
    },
    /// Rating-weighted random suggestions
    Suggest {
        #[arg(short = 'p', long = "param", value_parser = parse_key_val)]
        params: Vec<(String, String)>,

        #[arg(short = 'n', long)]
        count: Option<usize>,
    },
    /// Show a single venue by slug
    Show { slug: String },
    /// Venues near the midpoint of two locations
    Midpoint {
        #[arg(long, value_parser = parse_point)]
        from: GeoPoint,

        #[arg(long, value_parser = parse_point)]
        to: GeoPoint,

        #[arg(long, default_value = "3")]
        radius_km: f64,
    },
}

impl Command {
    pub fn raw_params(params: &[(String, String)]) -> RawParams {
        RawParams::from_pairs(params.iter().map(|(k, v)| (k.as_str(), v.clone())))
    }
}

fn parse_key_val(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(k, v)| (k.trim().to_string(), v.to_string()))
        .filter(|(k, _)| !k.is_empty())
        .ok_or_else(|| format!("expected key=value, got '{}'", raw))
}

fn parse_point(raw: &str) -> Result<GeoPoint, String> {
    let (lat, lng) = raw
        .split_once(',')
        .ok_or_else(|| format!("expected lat,lng, got '{}'", raw))?;
    let lat: f64 = lat.trim().parse().map_err(|e| format!("bad latitude: {}", e))?;
    let lng: f64 = lng.trim().parse().map_err(|e| format!("bad longitude: {}", e))?;
    Ok(GeoPoint::new(lat, lng))
}
