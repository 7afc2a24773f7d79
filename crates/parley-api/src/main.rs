//! Parley CLI and REST API entry point.
//!
//! Binary name: `parley`
//!
//! Parses CLI arguments, loads configuration, initializes database and
//! services, then dispatches to a maintenance command or starts the REST API
//! server.

mod cli;
mod http;
mod state;

use std::time::Duration;

use clap::Parser;

use parley_infra::config::{apply_env_overrides, load_config, resolve_data_dir};
use parley_observe::tracing_setup::{
    TracingOptions, filter_for_verbosity, init_tracing, shutdown_tracing,
};

use cli::{Cli, Commands};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let data_dir = cli.data_dir.clone().unwrap_or_else(resolve_data_dir);
    let config = apply_env_overrides(load_config(&data_dir).await, |key| {
        std::env::var(key).ok()
    });

    let default_filter = match (cli.verbose, &cli.command) {
        (0, _) if cli.quiet => "error",
        (0, Commands::Serve { .. }) => "info",
        (0, _) => "warn",
        (v, _) => filter_for_verbosity(v),
    };
    init_tracing(&TracingOptions {
        json: config.logging.json,
        otel: config.logging.otel,
        default_filter: default_filter.to_string(),
    })
    .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))?;

    let state = AppState::init(config, &data_dir).await?;

    let result = match cli.command {
        Commands::Serve { port, host } => serve(state.clone(), host, port).await,
        Commands::PurgeTokens => cli::tokens::purge_tokens(&state, cli.json).await,
        Commands::Status => cli::status::status(&state, cli.json).await,
    };

    state.db_pool.close().await;
    shutdown_tracing();
    result
}

async fn serve(state: AppState, host: Option<String>, port: Option<u16>) -> anyhow::Result<()> {
    let host = host.unwrap_or_else(|| state.config.server.host.clone());
    let port = port.unwrap_or(state.config.server.port);
    let sweep_every = Duration::from_secs(state.config.auth.revocation_sweep_secs.max(1));

    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    println!(
        "  {} Parley API listening on {}",
        console::style("●").cyan().bold(),
        console::style(format!("http://{addr}/api/v1")).cyan()
    );
    println!("  {}", console::style("Press Ctrl+C to stop").dim());

    let sweep = cli::tokens::spawn_revocation_sweep(state.clone(), sweep_every);
    let router = http::router::build_router(state);

    let served = axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await;
    sweep.abort();
    served?;

    println!("\n  Server stopped.");
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("shutdown signal received");
}
