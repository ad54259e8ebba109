//! georesolve CLI - Command-line interface
//!
//! This binary provides a command-line interface to the georesolve library:
//! geocoding, routing, matrices, multi-stop optimization, isochrones, and
//! delivery quotes, all through the tiered resolver. Results print as JSON
//! on stdout; logs go to stderr and `logs/georesolve.log`.

use clap::{Parser, Subcommand};
use serde_json::json;
use std::process;

use georesolve::config::ResolverConfig;
use georesolve::delivery;
use georesolve::geo::Location;
use georesolve::logging::{default_log_dir, default_log_file, init_logging};
use georesolve::model::TravelProfile;
use georesolve::optimizer::RouteOptimizer;
use georesolve::provider::{providers_from_env, AsyncReqwestClient};
use georesolve::resolver::TieredResolver;

#[derive(Parser)]
#[command(name = "georesolve")]
#[command(about = "Tiered geospatial resolution for delivery routing", long_about = None)]
#[command(version = georesolve::VERSION)]
struct Args {
    /// Travel profile: driving, cycling, or walking
    #[arg(long, global = true)]
    profile: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Resolve a free-text address into coordinates
    Geocode {
        /// Address or place name to resolve
        query: String,

        /// Two-letter country code hint (e.g. PH)
        #[arg(long)]
        country: Option<String>,
    },

    /// Resolve coordinates into a formatted address
    Reverse {
        /// Position as "lat,lng"
        position: String,
    },

    /// Compute a point-to-point route
    Route {
        /// Origin as "lat,lng"
        from: String,

        /// Destination as "lat,lng"
        to: String,
    },

    /// Compute a distance/duration matrix
    Matrix {
        /// Origins as comma-separated "lat,lng" pairs joined by ';'
        origins: String,

        /// Destinations as comma-separated "lat,lng" pairs joined by ';'
        destinations: String,
    },

    /// Order delivery stops into a short visiting sequence
    Optimize {
        /// Start position as "lat,lng"
        start: String,

        /// Stops as "lat,lng" pairs joined by ';'
        stops: String,

        /// Optional end position as "lat,lng" (defaults back to start)
        #[arg(long)]
        end: Option<String>,
    },

    /// Compute reachability bands around a point
    Isochrone {
        /// Center as "lat,lng"
        center: String,

        /// Band ranges in seconds, comma-separated (e.g. 300,600,900)
        ranges: String,
    },

    /// Quote a delivery: route, fee, and ETA
    Quote {
        /// Pickup position as "lat,lng"
        from: String,

        /// Drop-off position as "lat,lng"
        to: String,

        /// Merchant preparation time in minutes
        #[arg(long, default_value = "15")]
        prep_minutes: u32,
    },
}

/// Parses a "lat,lng" pair.
fn parse_location(raw: &str) -> Result<Location, String> {
    let (lat, lng) = raw
        .split_once(',')
        .ok_or_else(|| format!("expected \"lat,lng\", got \"{}\"", raw))?;
    let latitude: f64 = lat
        .trim()
        .parse()
        .map_err(|_| format!("invalid latitude \"{}\"", lat.trim()))?;
    let longitude: f64 = lng
        .trim()
        .parse()
        .map_err(|_| format!("invalid longitude \"{}\"", lng.trim()))?;
    Ok(Location::new(latitude, longitude))
}

/// Parses "lat,lng" pairs joined by ';'.
fn parse_locations(raw: &str) -> Result<Vec<Location>, String> {
    raw.split(';')
        .filter(|s| !s.trim().is_empty())
        .map(parse_location)
        .collect()
}

fn fail(message: impl std::fmt::Display) -> ! {
    eprintln!("Error: {}", message);
    process::exit(1);
}

fn print_json(value: &serde_json::Value) {
    match serde_json::to_string_pretty(value) {
        Ok(rendered) => println!("{}", rendered),
        Err(e) => fail(e),
    }
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let _logging_guard = match init_logging(default_log_dir(), default_log_file()) {
        Ok(guard) => guard,
        Err(e) => fail(format!("failed to initialize logging: {}", e)),
    };

    let http_client = match AsyncReqwestClient::new() {
        Ok(client) => client,
        Err(e) => fail(format!("failed to create HTTP client: {}", e)),
    };

    let mut config = ResolverConfig::from_env();
    if let Some(raw) = &args.profile {
        match raw.parse::<TravelProfile>() {
            Ok(profile) => config = config.with_default_profile(profile),
            Err(e) => fail(e),
        }
    }
    let profile = config.default_profile;

    let resolver = TieredResolver::new(providers_from_env(http_client), config);

    match args.command {
        Command::Geocode { query, country } => {
            let result = resolver
                .geocode(&query, country.as_deref())
                .await
                .unwrap_or_else(|e| fail(e));
            match result {
                Some(hit) => print_json(&json!(hit)),
                None => {
                    eprintln!("Could not resolve \"{}\"", query);
                    process::exit(1);
                }
            }
        }

        Command::Reverse { position } => {
            let location = parse_location(&position).unwrap_or_else(|e| fail(e));
            let address = resolver
                .reverse_geocode(&location)
                .await
                .unwrap_or_else(|e| fail(e));
            match address {
                Some(address) => print_json(&json!({ "address": address })),
                None => {
                    eprintln!("No known address near {}", position);
                    process::exit(1);
                }
            }
        }

        Command::Route { from, to } => {
            let origin = parse_location(&from).unwrap_or_else(|e| fail(e));
            let destination = parse_location(&to).unwrap_or_else(|e| fail(e));
            let route = resolver
                .route(&origin, &destination, profile)
                .await
                .unwrap_or_else(|e| fail(e));
            print_json(&json!(route));
        }

        Command::Matrix {
            origins,
            destinations,
        } => {
            let origins = parse_locations(&origins).unwrap_or_else(|e| fail(e));
            let destinations = parse_locations(&destinations).unwrap_or_else(|e| fail(e));
            let matrix = resolver
                .distance_matrix(&origins, &destinations, profile)
                .await
                .unwrap_or_else(|e| fail(e));
            print_json(&json!(matrix));
        }

        Command::Optimize { start, stops, end } => {
            let start = parse_location(&start).unwrap_or_else(|e| fail(e));
            let stops = parse_locations(&stops).unwrap_or_else(|e| fail(e));
            let end = match end {
                Some(raw) => Some(parse_location(&raw).unwrap_or_else(|e| fail(e))),
                None => None,
            };
            let optimizer = RouteOptimizer::new(&resolver);
            let itinerary = optimizer
                .optimize(&start, &stops, end.as_ref(), profile)
                .await
                .unwrap_or_else(|e| fail(e));
            print_json(&json!(itinerary));
        }

        Command::Isochrone { center, ranges } => {
            let center = parse_location(&center).unwrap_or_else(|e| fail(e));
            let ranges: Vec<u32> = ranges
                .split(',')
                .filter(|s| !s.trim().is_empty())
                .map(|s| {
                    s.trim()
                        .parse()
                        .map_err(|_| format!("invalid range \"{}\"", s.trim()))
                })
                .collect::<Result<_, _>>()
                .unwrap_or_else(|e| fail(e));
            let bands = resolver
                .isochrone(&center, &ranges, profile)
                .await
                .unwrap_or_else(|e| fail(e));
            print_json(&json!(bands));
        }

        Command::Quote {
            from,
            to,
            prep_minutes,
        } => {
            let origin = parse_location(&from).unwrap_or_else(|e| fail(e));
            let destination = parse_location(&to).unwrap_or_else(|e| fail(e));
            let route = resolver
                .route(&origin, &destination, profile)
                .await
                .unwrap_or_else(|e| fail(e));
            let fee = delivery::delivery_fee(route.distance_meters);
            let eta = delivery::estimated_delivery_minutes(route.distance_meters, prep_minutes);
            print_json(&json!({
                "distance_meters": route.distance_meters,
                "duration_seconds": route.duration_seconds,
                "delivery_fee": fee,
                "estimated_minutes": eta,
            }));
        }
    }
}
