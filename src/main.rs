mod routes;
mod controllers;
mod services;
mod models;
mod api_docs;
mod shared_state;
mod config;
mod errors;

use std::fs::File;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use anyhow::Context;
use axum::{Router, routing::get, response::Html};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::fmt::format::FmtSpan;
use utoipa::OpenApi;
use utoipa_scalar::Scalar;

use crate::api_docs::ApiDoc;
use crate::config::Config;
use crate::models::simulation::SimulationResponse;
use crate::routes::simulation_routes::simulation_routes;
use crate::services::simulation_service::simulate_configured_day;
use crate::shared_state::AppState;

#[derive(Parser, Debug)]
#[command(name = "bifacial-yield-sim", version)]
#[command(about = "Bifacial fixed-tilt PV production simulator", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Maximum log level: trace, debug, info, warn or error
    #[arg(long, global = true, default_value_t = tracing::Level::INFO)]
    log_level: tracing::Level,

    #[arg(long, global = true, default_value_t = false, help = "Whether to log out spans")]
    log_spans: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Simulates one day and prints the hourly energy table
    Simulate {
        #[arg(long, short, default_value = "config.json")]
        config: PathBuf,

        /// Day to simulate (YYYY-MM-DD) instead of the configured one
        #[arg(long, short)]
        date: Option<NaiveDate>,

        /// Use the offline ambient profile instead of Open-Meteo
        #[arg(long, default_value_t = false)]
        offline: bool,

        /// Write the full result as JSON to this file
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Serves the simulation HTTP API
    Serve {
        #[arg(long, short, default_value = "config.json")]
        config: PathBuf,
    },
}

fn load_config(path: &Path) -> anyhow::Result<Config> {
    let config = Config::load(path).with_context(|| format!("failed to load {}", path.display()))?;
    info!(path = %path.display(), "configuration loaded");
    Ok(config)
}

async fn run_simulate(
    config_path: &Path,
    date: Option<NaiveDate>,
    offline: bool,
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let result = simulate_configured_day(&config, date, offline || config.offline_mode).await?;

    println!("{:<17} {:>12} {:>8}", "hour", "energy (Wh)", "samples");
    for hour in &result.hourly_energy {
        println!(
            "{:<17} {:>12.1} {:>8}",
            hour.hour_start.format("%Y-%m-%d %H:%M"),
            hour.energy_wh,
            hour.samples
        );
    }
    let summary = &result.daily_summary;
    println!("Daily energy: {:.3} kWh ({:.2} kWh/kWp)", summary.energy_kwh, summary.specific_yield_kwh_kwp);
    if let Some(at) = summary.peak_at {
        println!("Peak power:   {:.1} W at {}", summary.peak_power_w, at.format("%H:%M"));
    }

    if let Some(path) = output {
        let file = File::create(&path).with_context(|| format!("failed to create {}", path.display()))?;
        serde_json::to_writer_pretty(file, &SimulationResponse::from(&result))?;
        println!("Result saved to {:?}", path);
    }
    Ok(())
}

async fn run_server(config_path: &Path) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let server_port = config.server.port;
    let state = AppState::new(config);

    let app = Router::new()
        .nest("/api", simulation_routes(state))
        .route("/scalar", get(|| async {
            Html(Scalar::new(ApiDoc::openapi()).to_html())
        }))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr = SocketAddr::from(([0, 0, 0, 0], server_port));
    info!("API Server listening on http://{}", addr);
    info!("Scalar UI: http://{}/scalar", addr);

    axum_server::bind(addr)
        .serve(app.into_make_service())
        .await
        .context("HTTP server failed")
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let tracing_subscriber = {
        let mut builder = tracing_subscriber::fmt::fmt().with_max_level(cli.log_level);

        if cli.log_spans {
            builder = builder.with_span_events(FmtSpan::CLOSE);
        }

        builder.finish()
    };
    tracing::subscriber::set_global_default(tracing_subscriber)
        .context("setting tracing subscriber failed")?;

    match cli.command {
        Commands::Simulate { config, date, offline, output } => {
            run_simulate(&config, date, offline, output).await
        }
        Commands::Serve { config } => run_server(&config).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn simulate_flags_parse() {
        let cli = Cli::try_parse_from([
            "bifacial-yield-sim",
            "--log-level",
            "debug",
            "simulate",
            "--date",
            "2025-12-21",
            "--offline",
        ])
        .unwrap();
        assert_eq!(cli.log_level, tracing::Level::DEBUG);
        match cli.command {
            Commands::Simulate { config, date, offline, output } => {
                assert_eq!(config, PathBuf::from("config.json"));
                assert_eq!(date, NaiveDate::from_ymd_opt(2025, 12, 21));
                assert!(offline);
                assert!(output.is_none());
            }
            Commands::Serve { .. } => panic!("expected simulate"),
        }
    }
}
