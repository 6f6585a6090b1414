use std::process::ExitCode;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use placefinder::config::ResolverConfig;
use placefinder::geo::{format_coordinates, haversine_distance_meters};
use placefinder::location::{Coordinates, LocationResolver};
use placefinder::server;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// placefinder: resolve place descriptions to coordinates
///
/// Walks MapmyIndia (OAuth2), MapmyIndia legacy, Google Geocoding and a
/// built-in gazetteer in that order; the first stage that answers wins.
///
/// Examples:
///   placefinder resolve "Barrackpore"
///   placefinder resolve "22.7606,88.3742"
///   placefinder reverse --lat 22.7606 --lon 88.3742
///   placefinder distance 22.7606 88.3742 22.5726 88.3639
///   placefinder serve --port 8080
#[derive(Parser)]
#[command(name = "placefinder", version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    credentials: CredentialArgs,

    #[command(subcommand)]
    command: Command,
}

/// Credentials override the MAPMYINDIA_* / GOOGLE_MAPS_API_KEY environment.
#[derive(Args)]
struct CredentialArgs {
    /// MapmyIndia OAuth2 client id.
    #[arg(long, global = true)]
    client_id: Option<String>,

    /// MapmyIndia OAuth2 client secret.
    #[arg(long, global = true)]
    client_secret: Option<String>,

    /// MapmyIndia legacy REST key.
    #[arg(long, global = true)]
    legacy_key: Option<String>,

    /// Google Geocoding API key.
    #[arg(long, global = true)]
    google_key: Option<String>,
}

#[derive(Subcommand)]
enum Command {
    /// Resolve free text or "lat,lon" and print the result as JSON.
    Resolve {
        /// Place description, e.g. "Sodepur station road" or "22.69,88.38".
        text: String,
    },
    /// Describe a coordinate pair as text.
    Reverse {
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,
    },
    /// Great-circle distance in metres between two points.
    Distance {
        #[arg(allow_hyphen_values = true)]
        lat1: f64,
        #[arg(allow_hyphen_values = true)]
        lon1: f64,
        #[arg(allow_hyphen_values = true)]
        lat2: f64,
        #[arg(allow_hyphen_values = true)]
        lon2: f64,
    },
    /// Serve the JSON API.
    Serve {
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
        #[arg(long, default_value_t = 3000)]
        port: u16,
    },
}

fn init_tracing() {
    // Logs go to stderr so stdout stays machine-readable.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();
}

fn build_config(args: CredentialArgs) -> ResolverConfig {
    let mut config = ResolverConfig::from_env();
    if args.client_id.is_some() {
        config.mapmyindia_client_id = args.client_id;
    }
    if args.client_secret.is_some() {
        config.mapmyindia_client_secret = args.client_secret;
    }
    if args.legacy_key.is_some() {
        config.mapmyindia_legacy_api_key = args.legacy_key;
    }
    if args.google_key.is_some() {
        config.google_api_key = args.google_key;
    }
    config
}

fn valid_coords(lat: f64, lon: f64) -> bool {
    (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lon)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing();

    let config = build_config(cli.credentials);
    info!(stages = %config.summary(), "configuration loaded");

    match cli.command {
        Command::Resolve { text } => {
            let resolver = LocationResolver::new(&config);
            match resolver.resolve(&text) {
                Some(result) => match serde_json::to_string_pretty(&result) {
                    Ok(json) => {
                        println!("{}", json);
                        ExitCode::SUCCESS
                    }
                    Err(e) => {
                        eprintln!("Error: cannot serialize result: {}", e);
                        ExitCode::FAILURE
                    }
                },
                None => {
                    eprintln!("Error: Location not found: '{}'", text.trim());
                    ExitCode::FAILURE
                }
            }
        }

        Command::Reverse { lat, lon } => {
            if !valid_coords(lat, lon) {
                eprintln!("Error: Invalid coordinates. Lat: -90..90, Lon: -180..180");
                return ExitCode::FAILURE;
            }
            let resolver = LocationResolver::new(&config);
            println!("{}", resolver.reverse_to_text(Coordinates::new(lat, lon)));
            ExitCode::SUCCESS
        }

        Command::Distance { lat1, lon1, lat2, lon2 } => {
            if !valid_coords(lat1, lon1) || !valid_coords(lat2, lon2) {
                eprintln!("Error: Invalid coordinates. Lat: -90..90, Lon: -180..180");
                return ExitCode::FAILURE;
            }
            let meters = haversine_distance_meters(lat1, lon1, lat2, lon2);
            eprintln!(
                "  {} -> {}",
                format_coordinates(Coordinates::new(lat1, lon1)),
                format_coordinates(Coordinates::new(lat2, lon2)),
            );
            println!("{:.1}", meters);
            ExitCode::SUCCESS
        }

        Command::Serve { host, port } => {
            let resolver = Arc::new(LocationResolver::new(&config));
            let runtime = match tokio::runtime::Runtime::new() {
                Ok(rt) => rt,
                Err(e) => {
                    eprintln!("Error: cannot start runtime: {}", e);
                    return ExitCode::FAILURE;
                }
            };
            match runtime.block_on(server::start(&host, port, resolver)) {
                Ok(()) => ExitCode::SUCCESS,
                Err(e) => {
                    eprintln!("Server error: {}", e);
                    ExitCode::FAILURE
                }
            }
        }
    }
}
