use std::cmp::Ordering;
use std::fmt;

use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;

/// Error type for version tag parsing
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SemVerError {
    #[error("Invalid version tag \"{0}\"")]
    InvalidTag(String),
}

lazy_static! {
    // Leading `v` is optional; minor and patch default to zero; anything
    // after the matched components (pre-release, build metadata) is ignored
    // for ordering.
    static ref TAG_RE: Regex =
        Regex::new(r"^v?(\d{1,9})(?:\.(\d{1,9}))?(?:\.(\d{1,9}))?").unwrap();
}

/// A parsed semantic version tag.
///
/// Keeps the original tag string for display and the three numeric
/// components for ordering. Two tags compare equal when their numeric
/// components match, even if the raw strings differ (`v1.2` == `1.2.0`).
#[derive(Debug, Clone)]
pub struct SemVer {
    raw: String,
    major: u64,
    minor: u64,
    patch: u64,
}

impl SemVer {
    /// Parse a tag string.
    ///
    /// A tag that does not start with a numeric major component (after an
    /// optional `v` prefix) is rejected; unmatched minor/patch components
    /// default to zero.
    pub fn parse(tag: &str) -> Result<Self, SemVerError> {
        let captures = TAG_RE
            .captures(tag)
            .ok_or_else(|| SemVerError::InvalidTag(tag.to_string()))?;

        let component = |idx: usize| -> u64 {
            captures
                .get(idx)
                .and_then(|m| m.as_str().parse().ok())
                .unwrap_or(0)
        };

        Ok(Self {
            raw: tag.to_string(),
            major: component(1),
            minor: component(2),
            patch: component(3),
        })
    }

    /// The tag exactly as it was written.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn major(&self) -> u64 {
        self.major
    }

    pub fn minor(&self) -> u64 {
        self.minor
    }

    pub fn patch(&self) -> u64 {
        self.patch
    }

    /// The leading integer component as a string, for grouping and display.
    pub fn major_part(&self) -> String {
        self.major.to_string()
    }

    /// Compare two raw tag strings.
    pub fn compare(a: &str, b: &str) -> Result<Ordering, SemVerError> {
        Ok(Self::parse(a)?.cmp(&Self::parse(b)?))
    }

    /// Sort raw tag strings ascending. Unparsable tags are reported, not
    /// silently dropped.
    pub fn sort(tags: &[&str]) -> Result<Vec<String>, SemVerError> {
        let mut parsed = tags
            .iter()
            .map(|t| Self::parse(t))
            .collect::<Result<Vec<_>, _>>()?;
        parsed.sort();
        Ok(parsed.into_iter().map(|v| v.raw).collect())
    }
}

impl PartialEq for SemVer {
    fn eq(&self, other: &Self) -> bool {
        (self.major, self.minor, self.patch) == (other.major, other.minor, other.patch)
    }
}

impl Eq for SemVer {}

impl PartialOrd for SemVer {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SemVer {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.major, self.minor, self.patch).cmp(&(other.major, other.minor, other.patch))
    }
}

impl std::hash::Hash for SemVer {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        (self.major, self.minor, self.patch).hash(state);
    }
}

impl fmt::Display for SemVer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

impl std::str::FromStr for SemVer {
    type Err = SemVerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full() {
        let v = SemVer::parse("1.2.3").unwrap();
        assert_eq!(v.major(), 1);
        assert_eq!(v.minor(), 2);
        assert_eq!(v.patch(), 3);
    }

    #[test]
    fn test_parse_v_prefix() {
        let v = SemVer::parse("v10.20.30").unwrap();
        assert_eq!((v.major(), v.minor(), v.patch()), (10, 20, 30));
        assert_eq!(v.raw(), "v10.20.30");
    }

    #[test]
    fn test_parse_partial_components() {
        let v = SemVer::parse("v2").unwrap();
        assert_eq!((v.major(), v.minor(), v.patch()), (2, 0, 0));

        let v = SemVer::parse("1.5").unwrap();
        assert_eq!((v.major(), v.minor(), v.patch()), (1, 5, 0));
    }

    #[test]
    fn test_parse_ignores_suffix() {
        let v = SemVer::parse("1.2.3-beta.1").unwrap();
        assert_eq!((v.major(), v.minor(), v.patch()), (1, 2, 3));

        let v = SemVer::parse("v4.0.1+build.7").unwrap();
        assert_eq!((v.major(), v.minor(), v.patch()), (4, 0, 1));
    }

    #[test]
    fn test_parse_rejects_non_numeric() {
        assert!(SemVer::parse("development").is_err());
        assert!(SemVer::parse("main").is_err());
        assert!(SemVer::parse("").is_err());
        assert!(SemVer::parse("vx.1").is_err());
    }

    #[test]
    fn test_compare() {
        assert_eq!(SemVer::compare("1.0.0", "1.0.0").unwrap(), Ordering::Equal);
        assert_eq!(SemVer::compare("1.0.0", "v1.0").unwrap(), Ordering::Equal);
        assert_eq!(SemVer::compare("1.2.3", "1.10.0").unwrap(), Ordering::Less);
        assert_eq!(SemVer::compare("2.0.0", "1.99.99").unwrap(), Ordering::Greater);
        assert_eq!(SemVer::compare("1.0.10", "1.0.9").unwrap(), Ordering::Greater);
    }

    #[test]
    fn test_compare_numeric_not_lexicographic() {
        // "10" orders after "9" even though it sorts before it as a string
        assert_eq!(SemVer::compare("0.10.0", "0.9.0").unwrap(), Ordering::Greater);
    }

    #[test]
    fn test_sort() {
        let sorted = SemVer::sort(&["2.0.0", "v1.0", "1.0.1", "10.0.0"]).unwrap();
        assert_eq!(sorted, vec!["v1.0", "1.0.1", "2.0.0", "10.0.0"]);
    }

    #[test]
    fn test_sort_rejects_invalid() {
        assert!(SemVer::sort(&["1.0.0", "development"]).is_err());
    }

    #[test]
    fn test_major_part() {
        assert_eq!(SemVer::parse("v12.3.4").unwrap().major_part(), "12");
    }
}
