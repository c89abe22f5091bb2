// Main entry point - Dependency injection and server setup
mod application;
mod domain;
mod infrastructure;
mod presentation;

use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use crate::application::catalog_service::DateCatalogService;
use crate::application::chart_assembler::ChartAssembler;
use crate::application::filter::FilterRegistry;
use crate::application::panel::{AxisSelector, FilterToggle, PanelState, VisualSettings};
use crate::application::panel_service::ChartPanel;
use crate::application::table::TableSource;
use crate::infrastructure::config::{DashboardConfig, SourceSettings, load_dashboard_config};
use crate::infrastructure::influx_table::InfluxTableSource;
use crate::infrastructure::memory_table::MemoryTable;
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{draw, get_figure, get_panel, health_check, post_event};

fn build_source(config: &DashboardConfig) -> anyhow::Result<Arc<dyn TableSource>> {
    match &config.source {
        SourceSettings::Influx => {
            let influx = config
                .influx
                .clone()
                .context("[influx] settings are required for the influx source")?;
            Ok(Arc::new(
                InfluxTableSource::new(influx.host, influx.token, influx.database, influx.retention_policy)
                    .with_timezone(influx.tz),
            ))
        }
        SourceSettings::File { path } => Ok(Arc::new(MemoryTable::from_json_file(&config.table.name, path)?)),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load configuration
    let config = load_dashboard_config()?;
    let metric_specs = config.metric_specs()?;

    // Create table source (infrastructure layer)
    let source = build_source(&config)?;

    // Load the date catalog once; an unreachable table leaves the panel inert
    let catalog = DateCatalogService::new(source.clone(), config.table.clone())
        .load_catalog()
        .await;

    // Create services (application layer)
    let filters = FilterRegistry::with_defaults(config.filter.window);
    let filter_toggle = FilterToggle::new(
        filters
            .first_id()
            .context("no smoothing algorithm registered")?,
    );
    let state = PanelState::new(
        catalog,
        AxisSelector::new(metric_specs),
        filter_toggle,
        VisualSettings::new(config.visual.enabled),
    );
    let panel = ChartPanel::new(state, filters, ChartAssembler::new(source, config.table.clone()));

    // Create application state
    let state = Arc::new(AppState::new(panel));

    // Build router (presentation layer)
    let router = Router::new()
        .route("/healthz", get(health_check))
        .route("/panel", get(get_panel))
        .route("/panel/events", post(post_event))
        .route("/panel/draw", post(draw))
        .route("/panel/figure", get(get_figure))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start server
    let addr: SocketAddr = config
        .server
        .bind
        .parse()
        .with_context(|| format!("Invalid bind address {}", config.server.bind))?;
    tracing::info!("Starting daily-chart service on {}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router).await?;

    Ok(())
}
