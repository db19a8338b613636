//! Configuration constants and validation functions for the importer.

use regex::Regex;
use std::sync::LazyLock;

use crate::error::{ImporterError, Result};

/// Published listing of county-level and higher division codes.
pub const DEFAULT_SOURCE_URL: &str =
    "http://www.mca.gov.cn/article/sj/tjbz/a/2017/201801/201801151447.html";

/// HTTP timeout in seconds.
pub const HTTP_TIMEOUT_SECS: u64 = 30;

/// Default maximum HTTP response size in bytes (16 MB).
///
/// The national listing is a few hundred kilobytes; anything far larger is
/// not the page we expect.
pub const DEFAULT_MAX_RESPONSE_SIZE: u64 = 16 * 1024 * 1024;

/// Width of one sibling-index segment in a materialized path code.
pub const CODE_SEGMENT_WIDTH: usize = 4;

/// Separator between materialized path segments (e.g. `0001.0002`).
pub const CODE_SEPARATOR: char = '.';

/// Separator between ancestor names in a full name (e.g. `河北省-石家庄市`).
pub const FULL_NAME_SEPARATOR: &str = "-";

/// Length of a well-formed division code.
pub const DIVISION_CODE_LENGTH: usize = 6;

/// Digit used to pad the unused trailing positions of a division code.
pub const FILLER_DIGIT: char = '0';

/// Default file name for the exported document.
pub const DEFAULT_OUTPUT_FILE: &str = "region.json";

/// Division code pattern: exactly six ASCII digits.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static DIVISION_CODE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{6}$").expect("valid regex"));

/// Source URL pattern: http or https with a host.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static SOURCE_URL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^https?://[^\s/]+(/\S*)?$").expect("valid regex"));

/// Validate a source URL before making HTTP requests.
///
/// # Examples
/// ```
/// use divcode_importer::config::validate_source_url;
///
/// assert!(validate_source_url("http://www.mca.gov.cn/article/sj/").is_ok());
/// assert!(validate_source_url("ftp://example.com/codes").is_err());
/// ```
pub fn validate_source_url(url: &str) -> Result<()> {
    if SOURCE_URL_PATTERN.is_match(url) {
        Ok(())
    } else {
        Err(ImporterError::InvalidSourceUrl(url.to_string()))
    }
}

/// Check whether a division code has the expected shape.
///
/// Malformed codes are still imported; this only drives data-quality warnings.
///
/// # Examples
/// ```
/// use divcode_importer::config::is_well_formed_code;
///
/// assert!(is_well_formed_code("130102"));
/// assert!(!is_well_formed_code("13010"));
/// assert!(!is_well_formed_code(""));
/// ```
#[must_use]
pub fn is_well_formed_code(code: &str) -> bool {
    DIVISION_CODE_PATTERN.is_match(code)
}

/// Format one materialized path segment for a 1-based sibling position.
///
/// Returns `None` when the position does not fit in [`CODE_SEGMENT_WIDTH`]
/// digits.
#[must_use]
pub fn code_segment(position: usize) -> Option<String> {
    let segment = format!("{position:0width$}", width = CODE_SEGMENT_WIDTH);
    (segment.len() == CODE_SEGMENT_WIDTH).then_some(segment)
}

/// Largest sibling position that fits in one path segment.
#[must_use]
pub fn max_siblings() -> usize {
    10usize.pow(CODE_SEGMENT_WIDTH as u32) - 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_source_url_valid() {
        assert!(validate_source_url(DEFAULT_SOURCE_URL).is_ok());
        assert!(validate_source_url("https://example.com").is_ok());
        assert!(validate_source_url("http://127.0.0.1:8080/codes.html").is_ok());
    }

    #[test]
    fn test_validate_source_url_invalid() {
        assert!(validate_source_url("").is_err());
        assert!(validate_source_url("www.mca.gov.cn").is_err());
        assert!(validate_source_url("file:///tmp/codes.html").is_err());
        assert!(validate_source_url("http://exa mple.com").is_err());
    }

    #[test]
    fn test_is_well_formed_code() {
        assert!(is_well_formed_code("110000"));
        assert!(is_well_formed_code("659011"));
        assert!(!is_well_formed_code("11000"));
        assert!(!is_well_formed_code("1100000"));
        assert!(!is_well_formed_code("11A000"));
        assert!(!is_well_formed_code(" 110000"));
    }

    #[test]
    fn test_code_segment() {
        assert_eq!(code_segment(1).as_deref(), Some("0001"));
        assert_eq!(code_segment(42).as_deref(), Some("0042"));
        assert_eq!(code_segment(9999).as_deref(), Some("9999"));
        assert_eq!(code_segment(10_000), None);
    }

    #[test]
    fn test_max_siblings() {
        assert_eq!(max_siblings(), 9999);
    }
}
