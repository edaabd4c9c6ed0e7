//! CSS selectors for the competition listing page
//!
//! The listing is rendered as three parallel groups of elements. Each group is
//! selected independently and the groups are zipped positionally afterwards.

use lazy_static::lazy_static;
use scraper::Selector;

// Helper macro to parse selectors safely at compile time
macro_rules! parse_selector {
    ($s:expr) => {
        Selector::parse($s).expect(concat!("Invalid CSS selector: ", $s))
    };
}

lazy_static! {
    static ref COMPETITION_INFO: Selector = parse_selector!("span.competition-info");
    static ref COMPETITION_LINK: Selector = parse_selector!("a[href]");
    static ref COMPETITION_DATE: Selector = parse_selector!("span.date");
    static ref COMPETITION_LOCATION: Selector = parse_selector!("div.location");
}

/// Selectors for the competition listing (`display=list`)
pub struct ListingSelectors {
    /// Container holding the competition name and its link
    pub info: &'static Selector,
    /// Anchor inside the info container
    pub link: &'static Selector,
    pub date: &'static Selector,
    pub location: &'static Selector,
}

impl ListingSelectors {
    pub fn new() -> Self {
        Self {
            info: &COMPETITION_INFO,
            link: &COMPETITION_LINK,
            date: &COMPETITION_DATE,
            location: &COMPETITION_LOCATION,
        }
    }
}

impl Default for ListingSelectors {
    fn default() -> Self {
        Self::new()
    }
}
