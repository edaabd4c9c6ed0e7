//! Web crawling functionality with rate limiting
//!
//! This module fetches the competition listing and the country reference
//! feed over a single shared, rate-limited HTTP client.

pub mod countries;
pub mod fetcher;
pub mod listing;

pub use countries::{CountryResolver, MatchKind, Resolution, ResolverConfig};
pub use fetcher::PageFetcher;
pub use listing::ListingFetcher;

use anyhow::{Context, Result};
use std::sync::Arc;

use crate::config::Config;
use crate::models::Competition;
use crate::utils::error::FetchError;

/// Country resolver and listing fetcher sharing one HTTP client
pub struct Crawler {
    resolver: CountryResolver,
    listing: ListingFetcher,
}

impl Crawler {
    /// Create a new crawler instance
    pub fn new(config: &Config) -> Result<Self> {
        config.validate().context("Invalid configuration")?;

        let fetcher = Arc::new(
            PageFetcher::from_config(&config.listing).context("Failed to create HTTP client")?,
        );

        let resolver = CountryResolver::new(
            Arc::clone(&fetcher),
            ResolverConfig::from(&config.countries),
        );
        let listing = ListingFetcher::new(fetcher, &config.listing.base_url)
            .context("Invalid listing base URL")?;

        Ok(Self { resolver, listing })
    }

    /// Assemble a crawler from existing parts
    pub fn from_parts(resolver: CountryResolver, listing: ListingFetcher) -> Self {
        Self { resolver, listing }
    }

    pub fn resolver(&self) -> &CountryResolver {
        &self.resolver
    }

    pub fn listing(&self) -> &ListingFetcher {
        &self.listing
    }

    /// Resolve `country` and fetch its current competitions
    ///
    /// # Errors
    ///
    /// Returns `FetchError` if the reference feed or listing cannot be fetched
    pub async fn fetch_current(
        &self,
        country: &str,
    ) -> std::result::Result<(Resolution, Vec<Competition>), FetchError> {
        let resolution = self.resolver.resolve(country).await?;
        let competitions = self.listing.fetch_competitions(&resolution).await?;
        Ok((resolution, competitions))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crawler_creation() {
        let config = Config::default();
        assert!(Crawler::new(&config).is_ok());
    }

    #[test]
    fn test_invalid_config_fails() {
        let mut config = Config::default();
        config.listing.base_url = "not a url".to_string();
        assert!(Crawler::new(&config).is_err());
    }
}
