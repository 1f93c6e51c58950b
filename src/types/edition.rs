//! Olympic edition types.

use crate::error::{OlympicsError, Result};
use rusqlite::types::{ToSql, ToSqlOutput};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Season of an Olympic edition.
///
/// Declared alphabetically so the derived `Ord` matches the store's text ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum Season {
    Summer,
    Winter,
}

impl Season {
    pub fn as_str(&self) -> &'static str {
        match self {
            Season::Summer => "Summer",
            Season::Winter => "Winter",
        }
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Season {
    type Err = OlympicsError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "summer" => Ok(Season::Summer),
            "winter" => Ok(Season::Winter),
            _ => Err(OlympicsError::invalid_parameter(
                "season",
                format!("unknown season \"{}\" (expected Summer or Winter)", s),
            )),
        }
    }
}

impl TryFrom<String> for Season {
    type Error = OlympicsError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl ToSql for Season {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

/// Extract the edition year from a game slug such as `paris-2024`.
///
/// Only the last four characters are considered; anything that is not four
/// ASCII digits yields `None`.
pub fn slug_year(slug: &str) -> Option<i32> {
    let chars: Vec<char> = slug.chars().collect();
    if chars.len() < 4 {
        return None;
    }
    let tail = &chars[chars.len() - 4..];
    if !tail.iter().all(|c| c.is_ascii_digit()) {
        return None;
    }
    tail.iter().collect::<String>().parse().ok()
}
