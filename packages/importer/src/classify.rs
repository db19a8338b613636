//! Division-code classification.
//!
//! The tier of a division is encoded only in how many trailing positions of
//! its code are padded with the filler digit: `130000` is a province, `130100`
//! a city, `130102` a county.

use crate::config::FILLER_DIGIT;
use crate::types::Tier;

/// Trailing filler run that marks a province code.
const PROVINCE_FILLER_RUN: usize = 4;

/// Trailing filler run that marks a city code.
const CITY_FILLER_RUN: usize = 2;

/// Classify a division code into its administrative tier.
///
/// Total over all strings: anything without a qualifying filler run,
/// including empty and malformed codes, is a county. The province pattern is
/// checked first, so a code matching both patterns is never a city.
///
/// # Examples
/// ```
/// use divcode_importer::classify::classify;
/// use divcode_importer::types::Tier;
///
/// assert_eq!(classify("130000"), Tier::Province);
/// assert_eq!(classify("130100"), Tier::City);
/// assert_eq!(classify("130102"), Tier::County);
/// ```
#[must_use]
pub fn classify(code: &str) -> Tier {
    if ends_with_filler(code, PROVINCE_FILLER_RUN) {
        Tier::Province
    } else if ends_with_filler(code, CITY_FILLER_RUN) {
        Tier::City
    } else {
        Tier::County
    }
}

/// Whether the last `run` characters of `code` are all the filler digit.
///
/// Codes shorter than `run` never match.
fn ends_with_filler(code: &str, run: usize) -> bool {
    let mut trailing = code.chars().rev();
    (0..run).all(|_| trailing.next() == Some(FILLER_DIGIT))
}
