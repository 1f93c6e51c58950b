//! Request orchestration: normalized filters → source → paginate → assemble
//!
//! Every function here is synchronous and runs against injected sources, so
//! the HTTP layer calls them from the blocking pool and tests call them
//! directly.

use crate::error::Result;
use crate::query::assemble::{FilteredResponse, PredictionsPage, ResultsPage};
use crate::query::params::FilteredRequest;
use crate::query::{paginate, BaseStats, FilterSet, PaginationRequest, PaginationResult, PredictionQuery};
use crate::storage::{Lookup, OlympicsSource, PredictionSource};
use tracing::{debug, warn};

/// Paginated `/api/results`.
pub fn results_page(
    source: &dyn OlympicsSource,
    filters: &FilterSet,
    pagination: &PaginationRequest,
) -> Result<ResultsPage> {
    let total = source.count_results(filters)?;
    let pagination = paginate(total, pagination);
    let results = if total > 0 {
        source.fetch_results(filters, pagination.window())?
    } else {
        Vec::new()
    };

    debug!(total, page = pagination.page, rows = results.len(), "Assembled results page");
    Ok(ResultsPage {
        results,
        pagination,
    })
}

/// Paginated `/api/predicted_medals`.
///
/// The primary source is consulted first. If it reports the predictions
/// relation as missing, at either the count or the fetch, the whole request
/// is answered from `fallback` instead.
pub fn predictions_page(
    primary: &dyn PredictionSource,
    fallback: &dyn PredictionSource,
    query: &PredictionQuery,
    pagination: &PaginationRequest,
) -> Result<PredictionsPage> {
    if let Some(page) = try_predictions(primary, query, pagination)? {
        return Ok(page);
    }

    match try_predictions(fallback, query, pagination)? {
        Some(page) => Ok(page),
        None => Ok(PredictionsPage {
            predictions: Vec::new(),
            pagination: paginate(0, pagination),
        }),
    }
}

fn try_predictions(
    source: &dyn PredictionSource,
    query: &PredictionQuery,
    pagination: &PaginationRequest,
) -> Result<Option<PredictionsPage>> {
    let total = match source.count_predictions(query)? {
        Lookup::Found(total) => total,
        Lookup::TableMissing { table } => {
            warn!(%table, "Predictions relation missing, using fallback source");
            return Ok(None);
        }
    };

    let pagination = paginate(total, pagination);
    let predictions = if total > 0 {
        match source.fetch_predictions(query, pagination.window())? {
            Lookup::Found(rows) => rows,
            Lookup::TableMissing { table } => {
                warn!(%table, "Predictions relation vanished after count, using fallback source");
                return Ok(None);
            }
        }
    } else {
        Vec::new()
    };

    Ok(Some(PredictionsPage {
        predictions,
        pagination,
    }))
}

/// `POST /api/data/filtered`: stats, a row window and the requested
/// aggregations over one filter set.
pub fn filtered_data(source: &dyn OlympicsSource, request: &FilteredRequest) -> Result<FilteredResponse> {
    let stats = source.base_stats(&request.filters)?;
    let total = source.count_results(&request.filters)?;
    let pagination: PaginationResult = paginate(total, &request.pagination);

    let results = if total > 0 {
        source.fetch_results(&request.filters, pagination.window())?
    } else {
        Vec::new()
    };
    let aggregations = source.aggregate(&request.filters, &request.aggregations)?;

    Ok(FilteredResponse {
        stats,
        results,
        aggregations,
        pagination,
    })
}

/// `/api/stats` and `/api/stats/quick`.
pub fn quick_stats(source: &dyn OlympicsSource, filters: &FilterSet) -> Result<BaseStats> {
    source.base_stats(filters)
}
