// Core data structures for the cubewatch pipeline

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One competition as listed upstream
///
/// `url` is the identity: two records with the same `url` are the same
/// competition even when the other fields drift between scrapes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Competition {
    pub name: String,
    pub url: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate, // >= start_date
    pub country: String,     // canonical display name
    pub location: String,    // venue/city, country prefix stripped
}

impl Competition {
    /// Single-day events are shown with one date instead of a range
    pub fn is_single_day(&self) -> bool {
        self.start_date == self.end_date
    }

    /// Still running or upcoming on `as_of`
    pub fn is_active_on(&self, as_of: NaiveDate) -> bool {
        self.end_date >= as_of
    }
}

/// A listing row as scraped, before date normalization
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawCompetition {
    pub name: String,
    pub href: String,
    pub date_text: String,
    pub location_text: String,
}

/// A country known to the upstream directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountryReference {
    pub name: String,
    #[serde(rename = "iso2Code")]
    pub iso2_code: String,
}

/// Shape of the country reference feed
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CountryFeed {
    #[serde(default)]
    pub items: Vec<CountryReference>,
}

/// Per-invocation settings for a pipeline run
///
/// Passed explicitly into every call so that concurrent queries for
/// different countries or locales never share mutable state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Free-form country input (name, ISO2 code, or approximate name)
    pub country: String,
    /// Translation locale code
    pub locale: String,
}

impl Session {
    pub fn new(country: impl Into<String>, locale: impl Into<String>) -> Self {
        Self {
            country: country.into(),
            locale: locale.into(),
        }
    }
}
