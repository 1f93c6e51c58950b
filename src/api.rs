//! HTTP surface: router, shared state and request-level wiring
//!
//! Handlers normalize parameters on the async side, so invalid input is
//! rejected before any data source is touched, then run the synchronous
//! pipeline on the blocking pool.

pub mod error;
pub mod handlers;

pub use error::ApiError;

use crate::reports::ReportsDir;
use crate::storage::{OlympicsSource, PredictionSource};
use axum::http::{HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

/// Origins the dashboard is served from during development.
pub const DASHBOARD_ORIGINS: [&str; 2] = ["http://localhost:3000", "http://127.0.0.1:3000"];

/// Every data route, as listed by the banner and the 404 body.
pub const ROUTES: [&str; 17] = [
    "GET /api",
    "GET /api/stats",
    "GET /api/stats/quick",
    "GET /api/athletes",
    "GET /api/hosts",
    "GET /api/medals",
    "GET /api/results",
    "GET /api/predicted_medals",
    "GET /api/sports",
    "GET /api/sports/top",
    "GET /api/years",
    "GET /api/countries",
    "GET /api/filters",
    "POST /api/data/filtered",
    "GET /api/models",
    "GET /api/reports/figures",
    "GET /api/reports/scores",
];

/// Injected capabilities shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub source: Arc<dyn OlympicsSource>,
    pub predictions: Arc<dyn PredictionSource>,
    /// Answers prediction requests when `predictions` lacks its table.
    pub prediction_fallback: Arc<dyn PredictionSource>,
    pub reports: Arc<ReportsDir>,
    /// Include internal error detail in 500 responses.
    pub debug_errors: bool,
}

/// Build the full application router.
pub fn router(state: AppState) -> Router {
    let reports_dir = state.reports.root().to_path_buf();

    Router::new()
        .route("/api", get(handlers::banner))
        .route("/api/results", get(handlers::results))
        .route("/api/predicted_medals", get(handlers::predicted_medals))
        .route("/api/medals", get(handlers::medals))
        .route("/api/athletes", get(handlers::athletes))
        .route("/api/hosts", get(handlers::hosts))
        .route("/api/sports", get(handlers::sports))
        .route("/api/sports/top", get(handlers::top_sports))
        .route("/api/years", get(handlers::years))
        .route("/api/countries", get(handlers::countries))
        .route("/api/filters", get(handlers::filters))
        .route("/api/stats", get(handlers::stats))
        .route("/api/stats/quick", get(handlers::quick_stats))
        .route("/api/data/filtered", post(handlers::filtered_data))
        .route("/api/models", get(handlers::models))
        .route("/api/reports/figures", get(handlers::figures))
        .route("/api/reports/scores", get(handlers::scores))
        .nest_service("/reports", ServeDir::new(reports_dir))
        .fallback(handlers::not_found)
        .layer(cors_layer())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer() -> CorsLayer {
    let origins: Vec<HeaderValue> = DASHBOARD_ORIGINS
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([axum::http::header::CONTENT_TYPE])
}
