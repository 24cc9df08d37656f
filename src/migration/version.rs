//! Migration versions and the identifier grammar
//!
//! Two naming conventions are accepted for migration files and pre-loaded
//! units:
//!
//! - `20200101000000_create_users` (timestamp first)
//! - `v20200101000000_create_users` (marker first, so the stem is a legal identifier)
//!
//! Both resolve through [`parse_identifier`] to the same `(version, name)` pair.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Width of a version timestamp (`%Y%m%d%H%M%S`)
pub const VERSION_LENGTH: usize = 14;

/// Leading marker of the identifier-safe naming form
pub const VERSION_MARKER: char = 'v';

/// Version recorded for a database with no migrations applied
pub const ZERO_VERSION: &str = "0";

/// A migration version
///
/// Versions are fixed-width digit strings, so the derived lexicographic
/// ordering is also chronological. The zero sentinel `"0"` sorts before
/// every timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Version(String);

impl Version {
    /// The zero sentinel
    pub fn zero() -> Self {
        Version(ZERO_VERSION.to_string())
    }

    /// Parse a well-formed version: a 14-digit timestamp or the zero sentinel
    pub fn parse(value: &str) -> Option<Self> {
        if value == ZERO_VERSION || is_timestamp(value) {
            Some(Version(value.to_string()))
        } else {
            None
        }
    }

    /// Wrap a value read back from the version table as-is
    pub(crate) fn from_stored(value: String) -> Self {
        Version(value)
    }

    pub fn is_zero(&self) -> bool {
        self.0 == ZERO_VERSION
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Version {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Result of matching an identifier against the naming grammar
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedName {
    Recognized { version: Version, name: String },
    Unrecognized,
}

/// Parse a file stem or unit identifier into its version and name
///
/// The timestamp-first form is tried before the marker form. The character
/// after the 14 digits must be a separator (`_` or `-`) or the end of the
/// identifier; all leading separators are stripped from the name.
pub fn parse_identifier(identifier: &str) -> ParsedName {
    split_timestamp(identifier)
        .or_else(|| {
            identifier
                .strip_prefix(VERSION_MARKER)
                .and_then(split_timestamp)
        })
        .map(|(version, name)| ParsedName::Recognized { version, name })
        .unwrap_or(ParsedName::Unrecognized)
}

fn split_timestamp(value: &str) -> Option<(Version, String)> {
    let digits = value.get(..VERSION_LENGTH)?;
    if !is_timestamp(digits) {
        return None;
    }

    let rest = &value[VERSION_LENGTH..];
    if !(rest.is_empty() || rest.starts_with(is_separator)) {
        return None;
    }

    let name = rest.trim_start_matches(is_separator).to_string();
    Some((Version(digits.to_string()), name))
}

fn is_timestamp(value: &str) -> bool {
    value.len() == VERSION_LENGTH && value.bytes().all(|b| b.is_ascii_digit())
}

fn is_separator(c: char) -> bool {
    c == '_' || c == '-'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recognized(version: &str, name: &str) -> ParsedName {
        ParsedName::Recognized {
            version: Version(version.to_string()),
            name: name.to_string(),
        }
    }

    #[test]
    fn test_timestamp_first_form() {
        assert_eq!(
            parse_identifier("20091112130101__migration_one"),
            recognized("20091112130101", "migration_one")
        );
        assert_eq!(
            parse_identifier("20091112150205_migration_three"),
            recognized("20091112150205", "migration_three")
        );
        assert_eq!(
            parse_identifier("20091112150205-add-index"),
            recognized("20091112150205", "add-index")
        );
    }

    #[test]
    fn test_marker_form() {
        assert_eq!(
            parse_identifier("v20260206024658_create_users"),
            recognized("20260206024658", "create_users")
        );
    }

    #[test]
    fn test_bare_version_has_empty_name() {
        assert_eq!(
            parse_identifier("20200101000000"),
            recognized("20200101000000", "")
        );
    }

    #[test]
    fn test_unrecognized_identifiers() {
        for identifier in [
            "",
            "create_users",
            "2009111213010_short",
            "200911121301011_too_long",
            "x20091112130101_bad_marker",
            "vv20091112130101_double_marker",
            "2009-11-12_dashes",
            "20091112130101create_no_separator",
            "日本語20091112130101",
        ] {
            assert_eq!(
                parse_identifier(identifier),
                ParsedName::Unrecognized,
                "{identifier}"
            );
        }
    }

    #[test]
    fn test_version_parse() {
        assert!(Version::parse("0").unwrap().is_zero());
        assert_eq!(
            Version::parse("20200101000000").unwrap().as_str(),
            "20200101000000"
        );
        assert!(Version::parse("asdf").is_none());
        assert!(Version::parse("22341").is_none());
        assert!(Version::parse("").is_none());
    }

    #[test]
    fn test_zero_sorts_first() {
        let zero = Version::zero();
        let early = Version::parse("00000000000001").unwrap();
        let late = Version::parse("20200101000000").unwrap();
        assert!(zero < early);
        assert!(early < late);
    }
}
