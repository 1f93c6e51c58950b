//! Type-safe wrappers and enums for Olympic Games data.

pub mod edition;
pub mod gender;
pub mod ids;
pub mod medal;


pub use edition::Season;
pub use gender::Gender;
pub use ids::{AthleteId, ResultId};
pub use medal::Medal;

use serde::{Deserialize, Deserializer};
use std::str::FromStr;

/// Deserialize an optional enum from fixture data, treating unrecognised or
/// blank values as absent instead of rejecting the whole file.
pub(crate) fn deserialize_lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.and_then(|value| value.trim().parse().ok()))
}
