// Main entry point - Dependency injection and server setup
mod application;
mod domain;
mod error;
mod infrastructure;
mod presentation;

use anyhow::Context;
use std::{net::SocketAddr, sync::Arc};
use tracing_subscriber::EnvFilter;

use crate::application::chart_service::ChartService;
use crate::application::query_service::QueryConsoleService;
use crate::domain::chart::ChartPresenter;
use crate::infrastructure::config::load_config;
use crate::infrastructure::http_source::HttpDataSource;
use crate::presentation::app_state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("river_dashboard=info,tower_http=info")),
        )
        .init();

    // Load configuration
    let config = load_config().context("failed to load configuration")?;
    let presenter = ChartPresenter::new(config.display.offset()?, config.display.time_format()?);

    // Create data source (infrastructure layer)
    let source = Arc::new(HttpDataSource::new(reqwest::Client::new()));

    // Create services (application layer)
    tracing::info!(charts = config.charts.len(), "configuring chart cards");
    let chart_service = ChartService::new(source.clone(), presenter, config.charts);
    let console_service = QueryConsoleService::new(source, config.console);

    // Create application state
    let state = Arc::new(AppState {
        chart_service,
        console_service,
    });

    // Build router (presentation layer)
    let router = presentation::router(state);

    // Start server
    let addr: SocketAddr = config
        .server
        .bind
        .parse()
        .with_context(|| format!("invalid bind address: {}", config.server.bind))?;
    tracing::info!("Starting river-dashboard on {}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router).await?;

    Ok(())
}
