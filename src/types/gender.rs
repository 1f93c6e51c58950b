//! Athlete gender as recorded in the source data.

use crate::error::{OlympicsError, Result};
use rusqlite::types::{ToSql, ToSqlOutput};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum Gender {
    #[serde(rename = "M")]
    Male,
    #[serde(rename = "F")]
    Female,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "M",
            Gender::Female => "F",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Gender {
    type Err = OlympicsError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "m" | "male" | "men" => Ok(Gender::Male),
            "f" | "female" | "women" => Ok(Gender::Female),
            _ => Err(OlympicsError::invalid_parameter(
                "gender",
                format!("unknown gender \"{}\" (expected M or F)", s),
            )),
        }
    }
}

impl TryFrom<String> for Gender {
    type Error = OlympicsError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl ToSql for Gender {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}
