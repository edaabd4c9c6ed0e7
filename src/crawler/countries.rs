//! Country resolution against the upstream reference feed
//!
//! Free-form user input ("cl", "chile", "Chille") is mapped to the canonical
//! name the listing URL expects. Lookup order:
//!
//! 1. exact name, case-insensitive
//! 2. ISO2 code, case-insensitive
//! 3. best normalized Levenshtein similarity at or above the threshold
//! 4. the configured default country (flagged as a fallback)

use std::sync::Arc;
use std::time::Duration;

use crate::cache::TtlCache;
use crate::config::CountriesConfig;
use crate::crawler::fetcher::PageFetcher;
use crate::models::{CountryFeed, CountryReference};
use crate::utils::error::FetchError;
use crate::utils::{from_url_form, title_case, to_url_form};

const FEED_CACHE_KEY: &str = "countries";

/// How a resolution was obtained
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MatchKind {
    Name,
    Code,
    /// Approximate name match with its similarity score
    Fuzzy(f64),
    /// Nothing matched; the default country was used
    Fallback,
}

/// Resolved country
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    /// URL-safe canonical name (`New+Zealand`)
    pub name: String,
    pub kind: MatchKind,
}

impl Resolution {
    /// Title-cased name with spaces, for display
    pub fn display_name(&self) -> String {
        title_case(&from_url_form(&self.name))
    }

    /// True when the input matched nothing
    pub fn is_fallback(&self) -> bool {
        self.kind == MatchKind::Fallback
    }
}

/// Country resolver settings
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    pub feed_url: String,
    pub similarity_threshold: f64,
    pub default_country: String,
    pub cache_ttl: Duration,
}

impl From<&CountriesConfig> for ResolverConfig {
    fn from(config: &CountriesConfig) -> Self {
        Self {
            feed_url: config.feed_url.clone(),
            similarity_threshold: config.similarity_threshold,
            default_country: config.default_country.clone(),
            cache_ttl: Duration::from_secs(config.cache_ttl_secs),
        }
    }
}

/// Resolves user-supplied country strings to canonical names
pub struct CountryResolver {
    fetcher: Arc<PageFetcher>,
    config: ResolverConfig,
    cache: TtlCache<&'static str, Arc<Vec<CountryReference>>>,
}

impl CountryResolver {
    pub fn new(fetcher: Arc<PageFetcher>, config: ResolverConfig) -> Self {
        let cache = TtlCache::new(config.cache_ttl);
        Self {
            fetcher,
            config,
            cache,
        }
    }

    /// Reference list, served from the cache while fresh
    ///
    /// # Errors
    ///
    /// Returns `FetchError` when the feed cannot be fetched or decoded
    pub async fn references(&self) -> Result<Arc<Vec<CountryReference>>, FetchError> {
        self.cache
            .get_or_try_insert_with(FEED_CACHE_KEY, || async {
                let feed: CountryFeed = self.fetcher.fetch_json(&self.config.feed_url).await?;
                tracing::debug!(countries = feed.items.len(), "Country reference feed loaded");
                Ok(Arc::new(feed.items))
            })
            .await
    }

    /// Resolve `input` to a canonical URL-safe country name
    ///
    /// # Errors
    ///
    /// Returns `FetchError` when the reference feed is unavailable
    pub async fn resolve(&self, input: &str) -> Result<Resolution, FetchError> {
        let references = self.references().await?;
        let resolution = resolve_in(
            &references,
            input,
            self.config.similarity_threshold,
            &self.config.default_country,
        );

        if resolution.is_fallback() {
            tracing::warn!(
                input = %input,
                default = %self.config.default_country,
                "No country matched, using default"
            );
        }

        Ok(resolution)
    }

    /// Resolved name for display
    ///
    /// # Errors
    ///
    /// Returns `FetchError` when the reference feed is unavailable
    pub async fn display_name(&self, input: &str) -> Result<String, FetchError> {
        Ok(self.resolve(input).await?.display_name())
    }

    /// True when `input` resolves without falling back
    ///
    /// # Errors
    ///
    /// Returns `FetchError` when the reference feed is unavailable
    pub async fn is_known(&self, input: &str) -> Result<bool, FetchError> {
        Ok(!self.resolve(input).await?.is_fallback())
    }
}

/// Resolve `input` against an in-memory reference list
pub fn resolve_in(
    references: &[CountryReference],
    input: &str,
    threshold: f64,
    default_country: &str,
) -> Resolution {
    let needle = from_url_form(input).trim().to_lowercase();

    if !needle.is_empty() {
        if let Some(country) = references.iter().find(|c| c.name.to_lowercase() == needle) {
            return Resolution {
                name: to_url_form(&country.name),
                kind: MatchKind::Name,
            };
        }

        if let Some(country) = references
            .iter()
            .find(|c| c.iso2_code.to_lowercase() == needle)
        {
            return Resolution {
                name: to_url_form(&country.name),
                kind: MatchKind::Code,
            };
        }

        if let Some((country, similarity)) = best_fuzzy_match(references, &needle) {
            if similarity >= threshold {
                return Resolution {
                    name: to_url_form(&country.name),
                    kind: MatchKind::Fuzzy(similarity),
                };
            }
        }
    }

    Resolution {
        name: to_url_form(default_country),
        kind: MatchKind::Fallback,
    }
}

/// Single best candidate by normalized Levenshtein similarity
fn best_fuzzy_match<'a>(
    references: &'a [CountryReference],
    needle: &str,
) -> Option<(&'a CountryReference, f64)> {
    let mut best: Option<(&CountryReference, f64)> = None;

    for country in references {
        let similarity = strsim::normalized_levenshtein(needle, &country.name.to_lowercase());
        if similarity > best.map(|(_, s)| s).unwrap_or(0.0) {
            best = Some((country, similarity));
        }
    }

    best
}
