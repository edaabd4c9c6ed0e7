//! Competition listing HTML parser
//!
//! Turns the `display=list` listing page into [`RawCompetition`] rows. Names,
//! dates and locations live in three sibling groups that are selected
//! independently and zipped by position.

use scraper::{ElementRef, Html};
use url::Url;

use crate::models::RawCompetition;
use crate::parser::selectors::ListingSelectors;
use crate::utils::{from_url_form, normalize_whitespace};

/// HTML parser for the listing page
pub struct ListingParser {
    selectors: ListingSelectors,
    base_url: Url,
}

impl ListingParser {
    /// Create a parser resolving relative links against `base_url`
    #[must_use]
    pub fn new(base_url: Url) -> Self {
        Self {
            selectors: ListingSelectors::new(),
            base_url,
        }
    }

    /// Base URL used for link resolution
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Extract listing rows for `country` (display or URL-safe form)
    ///
    /// * An empty group yields an empty result.
    /// * Groups of different lengths are zipped to the shortest and the
    ///   misalignment is logged.
    /// * Rows without a usable link are skipped.
    pub fn parse(&self, html: &str, country: &str) -> Vec<RawCompetition> {
        let document = Html::parse_document(html);

        let infos: Vec<ElementRef<'_>> = document.select(self.selectors.info).collect();
        let dates: Vec<ElementRef<'_>> = document.select(self.selectors.date).collect();
        let locations: Vec<ElementRef<'_>> = document.select(self.selectors.location).collect();

        if infos.is_empty() || dates.is_empty() || locations.is_empty() {
            tracing::info!(
                country = %country,
                names = infos.len(),
                dates = dates.len(),
                locations = locations.len(),
                "No competitions found"
            );
            return Vec::new();
        }

        if infos.len() != dates.len() || infos.len() != locations.len() {
            tracing::warn!(
                country = %country,
                names = infos.len(),
                dates = dates.len(),
                locations = locations.len(),
                "Listing groups are misaligned, trailing rows dropped"
            );
        }

        infos
            .iter()
            .zip(dates.iter())
            .zip(locations.iter())
            .filter_map(|((info, date), location)| self.parse_row(info, date, location, country))
            .collect()
    }

    fn parse_row(
        &self,
        info: &ElementRef<'_>,
        date: &ElementRef<'_>,
        location: &ElementRef<'_>,
        country: &str,
    ) -> Option<RawCompetition> {
        let Some(link) = info.select(self.selectors.link).next() else {
            tracing::warn!(text = %element_text(info), "Competition entry without link, skipping");
            return None;
        };

        let href = link.value().attr("href").unwrap_or_default();
        let url = match self.base_url.join(href) {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!(href = %href, error = %e, "Unresolvable competition link, skipping");
                return None;
            }
        };

        Some(RawCompetition {
            name: element_text(&link),
            href: url.to_string(),
            date_text: element_text(date),
            location_text: strip_country_prefix(&element_text(location), country),
        })
    }
}

/// Concatenated text of an element with whitespace collapsed
fn element_text(element: &ElementRef<'_>) -> String {
    normalize_whitespace(&element.text().collect::<String>())
}

/// Remove a leading `"{country}, "` from a location string
///
/// Matching is case-insensitive and accepts the URL-safe country form
/// (`New+Zealand`). Locations without the prefix are returned trimmed.
pub fn strip_country_prefix(location: &str, country: &str) -> String {
    let location = location.trim();
    let prefix = format!("{}, ", from_url_form(country).trim());

    match location.get(..prefix.len()) {
        Some(head) if head.eq_ignore_ascii_case(&prefix) => location[prefix.len()..].trim().to_string(),
        _ => location.to_string(),
    }
}
