//! Normalization and validation of request input.

use std::collections::HashSet;

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;

use super::error::{Error, Result};

pub const MIN_RATING: i16 = 1;
pub const MAX_RATING: i16 = 5;
pub const MAX_ABV: f64 = 100.0;

lazy_static! {
    static ref EMAIL_RE: Regex = Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap();
}

/// Emails are compared trimmed and lowercased everywhere.
pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

pub fn validate_email(raw: &str) -> Result<String> {
    let email = normalize_email(raw);
    if email.is_empty() {
        return Err(Error::bad_request("Email is required"));
    }
    if !EMAIL_RE.is_match(&email) {
        return Err(Error::bad_request("Invalid email address"));
    }
    Ok(email)
}

/// Trims `raw`, treating a blank string the same as no value.
pub fn non_blank(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|s| !s.is_empty())
}

/// Trims each name, drops blanks, and drops names that repeat an earlier one
/// ignoring case. The first spelling wins.
pub fn normalize_brewery_names<I, S>(names: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    let mut normalized = Vec::new();

    for name in names {
        let name = name.as_ref().trim();
        if name.is_empty() {
            continue;
        }
        if seen.insert(name.to_lowercase()) {
            normalized.push(name.to_owned());
        }
    }

    normalized
}

/// Breweries of a beer as written to storage: the list and the single legacy
/// name derived from it.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BreweryFields {
    pub breweries: Vec<String>,
    pub brewery: String,
}

impl BreweryFields {
    /// Prefers the `breweries` list; a lone `brewery` string is accepted from
    /// older clients. `None` when the request names neither.
    pub fn from_input(breweries: Option<&[String]>, brewery: Option<&str>) -> Option<BreweryFields> {
        let breweries = match (breweries, brewery) {
            (Some(list), _) => normalize_brewery_names(list),
            (None, Some(single)) => normalize_brewery_names(Some(single)),
            (None, None) => return None,
        };

        Some(BreweryFields {
            brewery: breweries.join(", "),
            breweries,
        })
    }
}

/// Accepts a whole number from 1 to 5.
pub fn parse_rating(rating: Option<f64>) -> Result<i16> {
    const MESSAGE: &str = "Rating must be between 1 and 5";

    match rating {
        Some(r) if r.fract() == 0.0 && r >= f64::from(MIN_RATING) && r <= f64::from(MAX_RATING) => {
            Ok(r as i16)
        }
        _ => Err(Error::bad_request(MESSAGE)),
    }
}

/// ABV arrives either as a JSON number or as the raw text of a form field.
/// Missing, `null` and empty text mean 0.
pub fn parse_abv(abv: Option<&Value>) -> Result<f64> {
    const MESSAGE: &str = "ABV must be a number between 0 and 100";

    let value = match abv {
        None | Some(Value::Null) => return Ok(0.0),
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) if s.trim().is_empty() => return Ok(0.0),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        Some(_) => None,
    };

    match value {
        Some(v) if v.is_finite() && (0.0..=MAX_ABV).contains(&v) => Ok(v),
        _ => Err(Error::bad_request(MESSAGE)),
    }
}
