//! Olympic Games Statistics Data API
//!
//! A Rust library and HTTP service exposing athlete, medal, host and
//! ML-prediction records with filtering, pagination and aggregation.
//!
//! ## Features
//!
//! - **One filter pipeline, two back ends**: the same [`FilterSet`] is
//!   evaluated in memory against JSON fixtures or compiled to SQL against
//!   the SQLite store, with identical results
//! - **Deterministic pagination**: page/offset requests are clamped so the
//!   last page is always full
//! - **Aggregations**: per-country, per-year, per-medal and per-sport buckets
//! - **Prediction fallback**: when the ML pipeline has not produced its table
//!   yet, predictions are read from CSV with the same response shape
//!
//! ## Quick Start
//!
//! ```rust
//! use olympics_api::{paginate, FilterSet, Medal, PaginationRequest};
//!
//! let filters = FilterSet::default()
//!     .with_year_range(Some(2000), Some(2016))
//!     .with_medals([Medal::Gold]);
//! assert!(!filters.is_unrestricted());
//!
//! let page = paginate(42, &PaginationRequest::page(10, 9));
//! assert_eq!(page.page, 5);
//! assert_eq!(page.effective_offset, 32);
//! ```
//!
//! ## Environment Configuration
//!
//! ```bash
//! export OLYMPICS_DATABASE=/var/lib/olympics/olympics.db
//! export DEMO_MODE=true   # serve fixtures only
//! ```

pub mod api;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod logging;
pub mod query;
pub mod reports;
pub mod service;
pub mod storage;
pub mod types;

// Re-export commonly used types
pub use error::{OlympicsError, Result};
pub use query::{paginate, FilterSet, PaginationRequest, PaginationResult, PredictionQuery};
pub use storage::{Lookup, OlympicsSource, PredictionSource};
pub use types::{AthleteId, Gender, Medal, ResultId, Season};
