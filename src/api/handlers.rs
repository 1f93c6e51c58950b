//! Route handlers.

use super::{ApiError, AppState, ROUTES};
use crate::error::{OlympicsError, Result};
use crate::query::aggregate::{SportBucket, TOP_SPORTS_ENDPOINT};
use crate::query::assemble::{FilterOptions, FilteredResponse, PredictionsPage, ResultsPage};
use crate::query::params::FilteredRequest;
use crate::query::{BaseStats, FilterSet, QueryParams};
use crate::reports::{FigureAsset, ModelsResponse, ScoreFile};
use crate::service;
use crate::storage::{Athlete, Host, MedalSummaryRow};
use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{Method, StatusCode, Uri},
    response::IntoResponse,
    Json,
};
use serde_json::{json, Value};
use tracing::info;

type Reply<T> = std::result::Result<Json<T>, ApiError>;

/// Run synchronous pipeline work on the blocking pool.
async fn blocking<T, F>(state: &AppState, work: F) -> Reply<T>
where
    F: FnOnce(AppState) -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    let expose_details = state.debug_errors;
    let state = state.clone();
    tokio::task::spawn_blocking(move || work(state))
        .await
        .map_err(OlympicsError::from)
        .and_then(|result| result)
        .map(Json)
        .map_err(|err| ApiError::new(err, expose_details))
}

fn reject(state: &AppState, err: OlympicsError) -> ApiError {
    ApiError::new(err, state.debug_errors)
}

pub async fn banner() -> Json<Value> {
    Json(json!({
        "message": "Olympics data API",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running",
        "endpoints": ROUTES,
    }))
}

pub async fn results(
    State(state): State<AppState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Reply<ResultsPage> {
    let (filters, pagination) = QueryParams::from(pairs)
        .results_request()
        .map_err(|err| reject(&state, err))?;

    let page = blocking(&state, move |state| {
        service::results_page(state.source.as_ref(), &filters, &pagination)
    })
    .await?;
    info!(
        total = page.pagination.total,
        page = page.pagination.page,
        "Served results"
    );
    Ok(page)
}

pub async fn predicted_medals(
    State(state): State<AppState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Reply<PredictionsPage> {
    let (query, pagination) = QueryParams::from(pairs)
        .predictions_request()
        .map_err(|err| reject(&state, err))?;

    blocking(&state, move |state| {
        service::predictions_page(
            state.predictions.as_ref(),
            state.prediction_fallback.as_ref(),
            &query,
            &pagination,
        )
    })
    .await
}

pub async fn medals(State(state): State<AppState>) -> Reply<Vec<MedalSummaryRow>> {
    blocking(&state, |state| state.source.medal_summary()).await
}

pub async fn athletes(
    State(state): State<AppState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Reply<Vec<Athlete>> {
    let window = QueryParams::from(pairs)
        .athletes_window()
        .map_err(|err| reject(&state, err))?;

    blocking(&state, move |state| state.source.athletes(window)).await
}

pub async fn hosts(State(state): State<AppState>) -> Reply<Vec<Host>> {
    blocking(&state, |state| state.source.hosts()).await
}

pub async fn sports(State(state): State<AppState>) -> Reply<Vec<String>> {
    blocking(&state, |state| state.source.sports()).await
}

pub async fn top_sports(State(state): State<AppState>) -> Reply<Vec<SportBucket>> {
    blocking(&state, |state| state.source.top_sports(TOP_SPORTS_ENDPOINT)).await
}

pub async fn years(State(state): State<AppState>) -> Reply<Vec<i32>> {
    blocking(&state, |state| state.source.years()).await
}

pub async fn countries(State(state): State<AppState>) -> Reply<Vec<String>> {
    blocking(&state, |state| state.source.countries()).await
}

pub async fn filters(State(state): State<AppState>) -> Reply<FilterOptions> {
    blocking(&state, |state| state.source.filter_options()).await
}

pub async fn stats(State(state): State<AppState>) -> Reply<BaseStats> {
    blocking(&state, |state| {
        service::quick_stats(state.source.as_ref(), &FilterSet::default())
    })
    .await
}

pub async fn quick_stats(
    State(state): State<AppState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Reply<BaseStats> {
    let filters = QueryParams::from(pairs)
        .stats_filters()
        .map_err(|err| reject(&state, err))?;
    blocking(&state, move |state| {
        service::quick_stats(state.source.as_ref(), &filters)
    })
    .await
}

/// The body is parsed by hand so an empty or malformed body maps onto the
/// crate's own error shape.
pub async fn filtered_data(State(state): State<AppState>, body: Bytes) -> Reply<FilteredResponse> {
    let value = if body.iter().all(u8::is_ascii_whitespace) {
        Value::Null
    } else {
        serde_json::from_slice(&body)
            .map_err(|_| reject(&state, OlympicsError::invalid_parameter("body", "must be valid JSON")))?
    };
    let request = FilteredRequest::from_json(&value).map_err(|err| reject(&state, err))?;

    blocking(&state, move |state| {
        service::filtered_data(state.source.as_ref(), &request)
    })
    .await
}

pub async fn models(State(state): State<AppState>) -> Reply<ModelsResponse> {
    blocking(&state, |state| state.reports.models()).await
}

pub async fn figures(State(state): State<AppState>) -> Reply<Vec<FigureAsset>> {
    blocking(&state, |state| state.reports.figures()).await
}

pub async fn scores(State(state): State<AppState>) -> Reply<Vec<ScoreFile>> {
    blocking(&state, |state| state.reports.scores()).await
}

pub async fn not_found(method: Method, uri: Uri) -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "error": "NOT_FOUND",
            "message": format!("Route {} {} not found", method, uri.path()),
            "availableRoutes": ROUTES,
        })),
    )
}
