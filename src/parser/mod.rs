//! HTML parsing and data extraction
//!
//! This module handles parsing the competition listing page and
//! normalizing its date text.

pub mod dates;
pub mod listing;
pub mod selectors;

// Re-export main parsers and public helpers
pub use dates::{parse_date_range, DateRangeParser};
pub use listing::{strip_country_prefix, ListingParser};
pub use selectors::ListingSelectors;
