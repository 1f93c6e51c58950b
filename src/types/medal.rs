//! Medal types.

use crate::error::{OlympicsError, Result};
use rusqlite::types::{ToSql, ToSqlOutput};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Olympic medal.
///
/// The wire format is always upper-case (`GOLD`, `SILVER`, `BRONZE`); parsing
/// accepts any case. Variants are declared in podium order, so the derived
/// `Ord` is the GOLD < SILVER < BRONZE priority used when listing medals.
///
/// ```rust
/// use olympics_api::Medal;
///
/// let medal: Medal = "gold".parse().unwrap();
/// assert_eq!(medal, Medal::Gold);
/// assert_eq!(medal.to_string(), "GOLD");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE", try_from = "String")]
pub enum Medal {
    Gold,
    Silver,
    Bronze,
}

impl Medal {
    pub const ALL: [Medal; 3] = [Medal::Gold, Medal::Silver, Medal::Bronze];

    pub fn as_str(&self) -> &'static str {
        match self {
            Medal::Gold => "GOLD",
            Medal::Silver => "SILVER",
            Medal::Bronze => "BRONZE",
        }
    }
}

impl fmt::Display for Medal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Medal {
    type Err = OlympicsError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "GOLD" => Ok(Medal::Gold),
            "SILVER" => Ok(Medal::Silver),
            "BRONZE" => Ok(Medal::Bronze),
            _ => Err(OlympicsError::invalid_parameter(
                "medal",
                format!("unknown medal \"{}\" (expected GOLD, SILVER or BRONZE)", s),
            )),
        }
    }
}

impl TryFrom<String> for Medal {
    type Error = OlympicsError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl ToSql for Medal {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}
