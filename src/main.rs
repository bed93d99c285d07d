//! rating.chgk.info CLI - query the rating API from the terminal
//!
//! Runs a single API operation, prints the JSON response, and manages the
//! optional Redis and file caches.

use std::process::ExitCode;

use chgk_rating::cli::{parse_operation_arg, Cli, Command};
use chgk_rating::{Endpoint, RatingClient};
use clap::Parser;
use tracing_subscriber::EnvFilter;

/// Sets up logging to stderr
///
/// `RUST_LOG` wins when set; otherwise only warnings are shown, or debug
/// output for this crate with `--verbose`.
fn setup_logging(verbose: bool) {
    let default = if verbose { "chgk_rating=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Prints the endpoint table
fn print_endpoints() {
    for endpoint in Endpoint::ALL {
        println!("{:<28} {}", endpoint.name(), endpoint.template());
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match &cli.command {
        Command::Endpoints => print_endpoints(),
        Command::Get { operation, args } => {
            // Validate before connecting to any cache
            let (endpoint, args) = parse_operation_arg(operation, args)?;
            let mut client = RatingClient::new(cli.client_config())?;
            let response = client.call(endpoint, &args)?;
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        Command::Clear { mask } => {
            let mut client = RatingClient::new(cli.client_config())?;
            client.clear_cache(mask.as_deref())?;
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
