//! New-competition detection
//!
//! A competition is new iff no known record shares its `url`. Other fields
//! are ignored so that cosmetic changes upstream never re-announce an entry.

use std::collections::HashSet;

use crate::models::Competition;

/// Records of `current` whose url is absent from `known`, in `current` order
///
/// A url repeated inside `current` is reported once, at its first position.
pub fn diff(current: &[Competition], known: &[Competition]) -> Vec<Competition> {
    let mut seen: HashSet<&str> = known.iter().map(|c| c.url.as_str()).collect();

    current
        .iter()
        .filter(|c| seen.insert(c.url.as_str()))
        .cloned()
        .collect()
}
