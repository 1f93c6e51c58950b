//! `serve`: wire the data sources into the router and listen.

use crate::api::{self, AppState};
use crate::config::AppConfig;
use crate::reports::ReportsDir;
use crate::storage::{CsvPredictionSource, FixtureStore, OlympicsDatabase};
use anyhow::Context;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

/// Build handler state for the configured data source.
///
/// In store mode the database must already exist and answer a probe query;
/// failure aborts startup.
pub fn build_state(config: &AppConfig) -> anyhow::Result<AppState> {
    let fallback = Arc::new(CsvPredictionSource::new(
        config.predictions_csv(),
        &config.summary_csv,
    ));
    let reports = Arc::new(ReportsDir::new(&config.reports_dir, &config.fixtures_dir));

    let state = if config.is_demo() {
        let store = Arc::new(
            FixtureStore::load(&config.fixtures_dir).with_context(|| {
                format!("loading fixtures from {}", config.fixtures_dir.display())
            })?,
        );
        info!(dir = %config.fixtures_dir.display(), "Serving fixture data (demo mode)");
        AppState {
            source: store.clone(),
            predictions: store,
            prediction_fallback: fallback,
            reports,
            debug_errors: config.debug_errors,
        }
    } else {
        let path = config.database_path()?;
        let db = OlympicsDatabase::open_existing(path)
            .and_then(|db| db.probe().map(|_| db))
            .with_context(|| format!("opening database {}", path.display()))?;
        let db = Arc::new(db);
        info!(path = %path.display(), "Serving SQLite store");
        AppState {
            source: db.clone(),
            predictions: db,
            prediction_fallback: fallback,
            reports,
            debug_errors: config.debug_errors,
        }
    };

    Ok(state)
}

pub async fn handle_serve(config: AppConfig) -> anyhow::Result<()> {
    let state = build_state(&config)?;
    let app = api::router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {}", addr))?;
    info!(%addr, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutdown signal received");
    }
}
