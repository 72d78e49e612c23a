//! Gender classification of free-text section labels.
//!
//! The archive has no structured gender attribute. The only signal is the
//! `section` label attached to each item ("Women's Ready-to-Wear",
//! "Menswear", ...), so gender preferences are applied as a post-filter
//! over that label after the index query returns.

use crate::search::query::GenderPreference;

fn mentions_women(section: &str) -> bool {
    section.contains("women") || section.contains("womenswear")
}

fn mentions_men(section: &str) -> bool {
    section.contains("menswear") || section.contains("men's") || section.starts_with("men ")
}

/// Decide whether a candidate with the given section label survives the
/// gender post-filter. Matching is case-insensitive; an absent label is
/// passed in as the empty string and always survives.
///
/// The women-signal check runs first under both preferences, so a label
/// naming both genders is kept for `womens` and dropped for `mens`.
pub fn section_matches(section: &str, preference: GenderPreference) -> bool {
    let section = section.to_lowercase();

    match preference {
        GenderPreference::Womens => mentions_women(&section) || !mentions_men(&section),
        GenderPreference::Mens => !mentions_women(&section),
        GenderPreference::Both => true,
    }
}
