//! Filter normalizer: raw query strings and JSON bodies → typed filters.
//!
//! Raw parameter shapes (absent, scalar, comma-separated, repeated key,
//! `key[]`, JSON array) are resolved here and nowhere else.

use super::aggregate::AggregationKey;
use super::filter_set::{FilterSet, PredictionQuery};
use super::pagination::{PageStart, PaginationRequest, Window, DEFAULT_LIMIT, MAX_LIMIT};
use crate::error::{OlympicsError, Result};
use crate::types::{Gender, Medal, Season};
use serde_json::Value;
use std::collections::BTreeSet;
use std::str::FromStr;

pub const ATHLETES_DEFAULT_LIMIT: u64 = 1000;
pub const ATHLETES_MAX_LIMIT: u64 = 10_000;
pub const FILTERED_DEFAULT_LIMIT: u64 = 50;

/// How out-of-range pagination values are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitPolicy {
    /// Reject with `InvalidParameter`.
    Strict,
    /// Fall back to the default or clamp into range.
    Clamp,
}

/// Ordered query-string pairs, repeated keys preserved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl From<Vec<(String, String)>> for QueryParams {
    fn from(pairs: Vec<(String, String)>) -> Self {
        Self { pairs }
    }
}

impl<'a> FromIterator<(&'a str, &'a str)> for QueryParams {
    fn from_iter<I: IntoIterator<Item = (&'a str, &'a str)>>(iter: I) -> Self {
        Self {
            pairs: iter
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }
}

impl QueryParams {
    /// All raw values for `key`, also accepting the `key[]` array spelling.
    fn values(&self, key: &str) -> Vec<&str> {
        self.pairs
            .iter()
            .filter(|(k, _)| k.strip_suffix("[]").unwrap_or(k) == key)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    /// First non-blank value for `key`, trimmed.
    pub fn first(&self, key: &str) -> Option<&str> {
        self.values(key)
            .into_iter()
            .map(str::trim)
            .find(|v| !v.is_empty())
    }

    /// Every comma-separated entry of every occurrence of `key`, deduplicated.
    pub fn list(&self, key: &str) -> BTreeSet<String> {
        self.values(key)
            .into_iter()
            .flat_map(|v| v.split(','))
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Optional integer; unparseable values count as absent.
    pub fn optional_i32(&self, key: &str) -> Option<i32> {
        self.first(key).and_then(|v| v.parse().ok())
    }

    /// Parsed members of a list parameter. An unknown token rejects the
    /// whole parameter rather than widening the filter.
    fn parsed_list<T>(&self, key: &str) -> Result<BTreeSet<T>>
    where
        T: FromStr<Err = OlympicsError> + Ord,
    {
        self.list(key).iter().map(|v| parse_field(key, v)).collect()
    }

    /// Optional enum-valued parameter; a present but unknown value is rejected.
    fn parsed_first<T>(&self, key: &str) -> Result<Option<T>>
    where
        T: FromStr<Err = OlympicsError>,
    {
        self.first(key).map(|v| parse_field(key, v)).transpose()
    }

    /// `true` only for a case-insensitive literal `true`.
    pub fn flag(&self, key: &str) -> bool {
        self.first(key)
            .is_some_and(|v| v.eq_ignore_ascii_case("true"))
    }

    /// Limit/offset/page controls under the given policy.
    pub fn pagination(&self, policy: LimitPolicy) -> Result<PaginationRequest> {
        let limit = bounded(
            self.first("limit"),
            "limit",
            policy,
            DEFAULT_LIMIT,
            MAX_LIMIT,
        )?;
        let offset = offset(self.first("offset"), policy)?;

        Ok(PaginationRequest::new(limit, start_from(self.first("page"), offset)))
    }

    /// Filters and pagination for `/api/results`; limit and offset are strict.
    pub fn results_request(&self) -> Result<(FilterSet, PaginationRequest)> {
        let pagination = self.pagination(LimitPolicy::Strict)?;

        let mut filters = FilterSet::default()
            .with_sports(self.first("sport"))
            .with_countries(self.list("country"));
        if let Some(year) = self.optional_i32("year") {
            filters = filters.with_year_equals(year);
        }
        if let Some(gender) = self.parsed_first::<Gender>("gender")? {
            filters = filters.with_gender(gender);
        }
        if let Some(medal) = self.parsed_first::<Medal>("medal")? {
            filters = filters.with_medals([medal]);
        }

        Ok((filters, pagination))
    }

    /// Filters for `/api/stats/quick`.
    pub fn stats_filters(&self) -> Result<FilterSet> {
        let mut filters = FilterSet::default()
            .with_year_range(self.optional_i32("yearMin"), self.optional_i32("yearMax"))
            .with_seasons(self.parsed_list::<Season>("seasons")?)
            .with_countries(self.list("countries"))
            .with_medals(self.parsed_list::<Medal>("medalTypes")?)
            .with_sports(self.list("sports"));
        if let Some(gender) = self.parsed_first::<Gender>("gender")? {
            filters = filters.with_gender(gender);
        }
        if let Some(term) = self.first("search") {
            filters = filters.with_search(term);
        }
        Ok(filters)
    }

    /// Filters and pagination for `/api/predicted_medals`; limit is clamped.
    pub fn predictions_request(&self) -> Result<(PredictionQuery, PaginationRequest)> {
        let pagination = self.pagination(LimitPolicy::Clamp)?;
        let query = PredictionQuery {
            countries: self.list("country"),
            slug_game: self.first("slug_game").map(str::to_string),
            target: self.first("target").map(str::to_string),
            model: self.first("model").map(str::to_string),
            year_min: self.optional_i32("yearMin"),
            year_max: self.optional_i32("yearMax"),
            include_actual: self.flag("includeActual"),
        };
        Ok((query, pagination))
    }

    /// Row window for `/api/athletes`.
    pub fn athletes_window(&self) -> Result<Window> {
        let limit = bounded(
            self.first("limit"),
            "limit",
            LimitPolicy::Clamp,
            ATHLETES_DEFAULT_LIMIT,
            ATHLETES_MAX_LIMIT,
        )?;
        let offset = offset(self.first("offset"), LimitPolicy::Clamp)?;
        Ok(Window { offset, limit })
    }
}

fn bounded(
    raw: Option<&str>,
    field: &str,
    policy: LimitPolicy,
    default: u64,
    max: u64,
) -> Result<u64> {
    let Some(raw) = raw else {
        return Ok(default);
    };

    match (raw.parse::<i64>(), policy) {
        (Ok(value), _) if value >= 1 && value as u64 <= max => Ok(value as u64),
        (Ok(value), LimitPolicy::Clamp) => Ok(value.clamp(1, max as i64) as u64),
        (Err(_), LimitPolicy::Clamp) => Ok(default),
        (_, LimitPolicy::Strict) => Err(OlympicsError::invalid_parameter(
            field,
            format!("must be an integer between 1 and {max}"),
        )),
    }
}

fn offset(raw: Option<&str>, policy: LimitPolicy) -> Result<u64> {
    let Some(raw) = raw else {
        return Ok(0);
    };

    match (raw.parse::<i64>(), policy) {
        (Ok(value), _) if value >= 0 => Ok(value as u64),
        (_, LimitPolicy::Clamp) => Ok(0),
        (_, LimitPolicy::Strict) => Err(OlympicsError::invalid_parameter(
            "offset",
            "must be a non-negative integer",
        )),
    }
}

/// Parse one enum token, reporting failures against the request field.
fn parse_field<T>(field: &str, raw: &str) -> Result<T>
where
    T: FromStr<Err = OlympicsError>,
{
    raw.parse().map_err(|err| match err {
        OlympicsError::InvalidParameter { message, .. } => {
            OlympicsError::invalid_parameter(field, message)
        }
        other => other,
    })
}

/// A positive page wins over the offset.
fn start_from(page: Option<&str>, offset: u64) -> PageStart {
    match page.and_then(|p| p.parse::<u64>().ok()) {
        Some(page) if page > 0 => PageStart::Page(page),
        _ => PageStart::Offset(offset),
    }
}

/// Normalized `POST /api/data/filtered` body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilteredRequest {
    pub filters: FilterSet,
    pub aggregations: BTreeSet<AggregationKey>,
    pub pagination: PaginationRequest,
}

impl FilteredRequest {
    /// Interpret a loosely-typed JSON body. Every field is optional and
    /// pagination values are clamped rather than rejected; unknown season,
    /// medal or gender values are rejected.
    pub fn from_json(body: &Value) -> Result<Self> {
        if !(body.is_object() || body.is_null()) {
            return Err(OlympicsError::invalid_parameter(
                "body",
                "must be a JSON object",
            ));
        }

        let filters_value = &body["filters"];
        let mut filters = FilterSet::default()
            .with_year_range(json_i32(&filters_value["yearMin"]), json_i32(&filters_value["yearMax"]))
            .with_seasons(parse_each("seasons", json_list(&filters_value["seasons"]))?)
            .with_countries(json_list(&filters_value["countries"]))
            .with_medals(parse_each("medalTypes", json_list(&filters_value["medalTypes"]))?)
            .with_sports(json_list(&filters_value["sports"]));
        if let Some(year) = json_i32(&filters_value["yearEquals"]) {
            filters = filters.with_year_equals(year);
        }
        if let Some(gender) = json_string(&filters_value["gender"]) {
            filters = filters.with_gender(parse_field("gender", &gender)?);
        }
        if let Some(term) = json_string(&filters_value["search"]) {
            filters = filters.with_search(&term);
        }

        // Unknown aggregation names only omit a section, so they are skipped.
        let aggregations = json_list(&body["aggregations"])
            .iter()
            .filter_map(|v| v.parse().ok())
            .collect();

        let page = &body["pagination"];
        let limit = json_i64(&page["limit"])
            .map(|limit| limit.clamp(1, MAX_LIMIT as i64) as u64)
            .unwrap_or(FILTERED_DEFAULT_LIMIT);
        let offset = json_i64(&page["offset"]).map_or(0, |offset| offset.max(0) as u64);
        let start = match json_i64(&page["page"]) {
            Some(page) if page > 0 => PageStart::Page(page as u64),
            _ => PageStart::Offset(offset),
        };

        Ok(Self {
            filters,
            aggregations,
            pagination: PaginationRequest::new(limit, start),
        })
    }
}

fn parse_each<T>(field: &str, values: Vec<String>) -> Result<BTreeSet<T>>
where
    T: FromStr<Err = OlympicsError> + Ord,
{
    values.iter().map(|v| parse_field(field, v)).collect()
}

fn json_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn json_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn json_i32(value: &Value) -> Option<i32> {
    json_i64(value).and_then(|v| i32::try_from(v).ok())
}

/// Array of scalars, or a comma-separated string.
fn json_list(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .iter()
            .filter_map(json_string)
            .collect(),
        Value::String(s) => s
            .split(',')
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}
