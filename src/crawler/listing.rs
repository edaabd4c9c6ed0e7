//! Competition listing fetcher
//!
//! Downloads the "present competitions" listing for one country and turns
//! it into [`Competition`] records.

use std::sync::Arc;

use url::Url;

use crate::crawler::countries::Resolution;
use crate::crawler::fetcher::PageFetcher;
use crate::models::{Competition, RawCompetition};
use crate::parser::dates::parse_date_range;
use crate::parser::listing::ListingParser;
use crate::utils::error::FetchError;
use crate::utils::from_url_form;

/// Fetches and parses the listing page
pub struct ListingFetcher {
    fetcher: Arc<PageFetcher>,
    parser: ListingParser,
}

impl ListingFetcher {
    /// Create a listing fetcher for the site rooted at `base_url`
    ///
    /// # Errors
    ///
    /// Returns `FetchError::InvalidUrl` if `base_url` is not an absolute URL
    pub fn new(fetcher: Arc<PageFetcher>, base_url: &str) -> Result<Self, FetchError> {
        let base_url =
            Url::parse(base_url).map_err(|e| FetchError::InvalidUrl(format!("{base_url}: {e}")))?;

        Ok(Self {
            fetcher,
            parser: ListingParser::new(base_url),
        })
    }

    /// Listing URL for a URL-safe country name
    pub fn listing_url(&self, country: &str) -> String {
        let region: String =
            url::form_urlencoded::byte_serialize(from_url_form(country).as_bytes()).collect();
        format!(
            "{}/competitions?region={region}&search=&state=present&year=all+years&from_date=&to_date=&delegate=&display=list",
            self.parser.base_url().as_str().trim_end_matches('/')
        )
    }

    /// Fetch raw listing rows for a URL-safe country name
    ///
    /// An empty or unrecognized page yields an empty vector.
    ///
    /// # Errors
    ///
    /// Returns `FetchError` on non-2xx responses or network failure
    pub async fn fetch(&self, country: &str) -> Result<Vec<RawCompetition>, FetchError> {
        let url = self.listing_url(country);
        tracing::debug!(url = %url, "Fetching competition listing");

        let html = self.fetcher.fetch_text(&url).await?;
        let rows = self.parser.parse(&html, country);

        tracing::info!(country = %country, rows = rows.len(), "Listing fetched");
        Ok(rows)
    }

    /// Fetch the listing for a resolved country and normalize its dates
    ///
    /// Competitions carry the canonical country name as the reference feed
    /// spells it. Rows whose date text cannot be parsed are skipped.
    ///
    /// # Errors
    ///
    /// Returns `FetchError` on non-2xx responses or network failure
    pub async fn fetch_competitions(
        &self,
        country: &Resolution,
    ) -> Result<Vec<Competition>, FetchError> {
        let rows = self.fetch(&country.name).await?;
        Ok(normalize(rows, &from_url_form(&country.name)))
    }
}

/// Turn raw rows into competitions, skipping rows with bad dates
pub fn normalize(rows: Vec<RawCompetition>, country: &str) -> Vec<Competition> {
    rows.into_iter()
        .filter_map(|row| match parse_date_range(&row.date_text) {
            Ok((start_date, end_date)) => Some(Competition {
                name: row.name,
                url: row.href,
                start_date,
                end_date,
                country: country.to_string(),
                location: row.location_text,
            }),
            Err(e) => {
                tracing::warn!(
                    name = %row.name,
                    date_text = %row.date_text,
                    error = %e,
                    "Skipping competition with unparseable date"
                );
                None
            }
        })
        .collect()
}
