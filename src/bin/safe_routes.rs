//! CLI for planning safe routes.
//!
//! Reads a JSON route request from a file (or stdin), plans it against the
//! local datasets and OSRM, and prints the JSON result.

use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use safe_route_planner::config::EngineConfig;
use safe_route_planner::error::PlanError;
use safe_route_planner::layers::SpatialContext;
use safe_route_planner::osrm::OsrmClient;
use safe_route_planner::request::RouteRequest;
use safe_route_planner::response::RouteResponse;
use safe_route_planner::solver::{SolveOptions, solve};

/// Plan safety-ranked routes between two points
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Request JSON file; reads stdin when omitted or "-"
    input: Option<PathBuf>,

    /// Directory holding the CSV datasets (overrides SAFE_ROUTES_DATA_DIR)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// OSRM base URL (overrides OSRM_SERVER)
    #[arg(long)]
    osrm_url: Option<String>,

    /// Pretty-print the JSON output
    #[arg(long)]
    pretty: bool,
}

fn main() -> Result<ExitCode> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("safe_route_planner=info".parse()?),
        )
        .init();

    let args = Args::parse();

    let mut config = EngineConfig::from_env();
    if let Some(dir) = args.data_dir {
        config.data_dir = dir;
    }
    if let Some(url) = args.osrm_url {
        config.osrm.base_url = url;
    }

    let raw = read_input(args.input.as_ref())?;
    let response = match RouteRequest::from_json(&raw) {
        Ok(request) => {
            let ctx = SpatialContext::load(&config.dataset_paths());
            let provider =
                OsrmClient::new(config.osrm.clone()).context("building OSRM client")?;
            solve(&request, &ctx, &provider, &SolveOptions::default())
        }
        Err(err) => {
            tracing::info!(error = %err, "rejected route request");
            RouteResponse::failure(&PlanError::InvalidRequest(err))
        }
    };
    let output = if args.pretty {
        serde_json::to_string_pretty(&response)?
    } else {
        serde_json::to_string(&response)?
    };
    println!("{}", output);

    Ok(if response.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn read_input(input: Option<&PathBuf>) -> Result<String> {
    let raw = match input {
        Some(path) if path.as_os_str() != "-" => fs::read_to_string(path)
            .with_context(|| format!("reading request from {}", path.display()))?,
        _ => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("reading request from stdin")?;
            buf
        }
    };
    Ok(raw)
}
