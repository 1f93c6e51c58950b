//! The filter/aggregate/paginate pipeline shared by every data endpoint
//!
//! - `filter_set`: normalized request intent
//! - `params`: raw query parameters and request bodies → `FilterSet`
//! - `predicate`: in-memory evaluation (fixture path)
//! - `compiler`: SQL WHERE-clause generation (store path)
//! - `aggregate`: grouped buckets and base stats
//! - `pagination`: page/offset arithmetic
//! - `assemble`: response envelopes

pub mod aggregate;
pub mod assemble;
pub mod compiler;
pub mod filter_set;
pub mod pagination;
pub mod params;
pub mod predicate;

pub use aggregate::{AggregationKey, Aggregations, BaseStats};
pub use compiler::CompiledFilter;
pub use filter_set::{FilterSet, PredictionQuery};
pub use pagination::{paginate, PageStart, PaginationRequest, PaginationResult, Window};
pub use params::{LimitPolicy, QueryParams};

#[cfg(test)]
pub(crate) mod test_support;
