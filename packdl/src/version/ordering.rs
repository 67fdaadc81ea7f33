//! Sort keys for release tags.
//!
//! A tag such as `EndlessPixel.1.21.11-v10-b3` is reduced to:
//!
//! - the digit runs of the main version (`[1, 21, 11, 10]`)
//! - a release rank (final releases outrank pre-releases)
//! - the pre-release number taken from the trailing suffix (`3`)
//!
//! The trailing suffix is the last hyphen-separated segment when it starts
//! with a letter (`-b3`, `-rc1`, `-beta`). Tags whose last segment starts
//! with a digit (`-1.6`) are final releases.

use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;
use tracing::debug;

/// Error raised when a tag carries no numeric components at all.
///
/// [`sort_key`] never propagates this; it substitutes an all-zero sequence.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VersionParseError {
    /// The version string contains no digit runs.
    #[error("no numeric components in version string '{0}'")]
    NoDigits(String),
}

/// Rank of a release within the same numeric version.
///
/// Variant order matters: `PreRelease < Final`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ReleaseRank {
    PreRelease,
    Final,
}

impl ReleaseRank {
    /// Numeric weight of the rank (50 for pre-releases, 100 for finals).
    pub fn weight(self) -> u8 {
        match self {
            ReleaseRank::PreRelease => 50,
            ReleaseRank::Final => 100,
        }
    }
}

/// Derived comparison key for a release tag.
///
/// Field order defines the ordering: numeric components first (element-wise,
/// a shorter sequence is less when it is a prefix of the other), then rank,
/// then pre-release number.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VersionSortKey {
    /// Digit runs of the main version string, left to right.
    pub components: Vec<u64>,
    /// Final or pre-release.
    pub rank: ReleaseRank,
    /// First digit run of the pre-release suffix, or 0.
    pub prerelease_number: u64,
}

fn suffix_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"-([A-Za-z][^-]*)$").expect("valid suffix regex"))
}

fn digits_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"[0-9]+").expect("valid digits regex"))
}

/// Parse a run of ASCII digits, saturating on overflow.
fn parse_digit_run(run: &str) -> u64 {
    run.parse::<u64>().unwrap_or(u64::MAX)
}

/// Extract every maximal run of digits from `version`, left to right.
///
/// # Examples
///
/// ```
/// use packdl::version::numeric_components;
///
/// assert_eq!(
///     numeric_components("EndlessPixel.1.21.11-v10").unwrap(),
///     vec![1, 21, 11, 10]
/// );
/// assert!(numeric_components("latest").is_err());
/// ```
pub fn numeric_components(version: &str) -> Result<Vec<u64>, VersionParseError> {
    let components: Vec<u64> = digits_pattern()
        .find_iter(version)
        .map(|m| parse_digit_run(m.as_str()))
        .collect();

    if components.is_empty() {
        Err(VersionParseError::NoDigits(version.to_string()))
    } else {
        Ok(components)
    }
}

/// Compute the sort key for a release tag.
///
/// Never fails: a tag without digits gets the component sequence `[0]`.
///
/// # Examples
///
/// ```
/// use packdl::version::sort_key;
///
/// let final_release = sort_key("EndlessPixel.1.21.0-v10-1.6");
/// let beta = sort_key("EndlessPixel.1.21.0-v10-b9");
/// assert!(final_release > beta);
/// ```
pub fn sort_key(tag_name: &str) -> VersionSortKey {
    let (main, suffix) = match suffix_pattern().captures(tag_name) {
        Some(caps) => {
            let whole = caps.get(0).map(|m| m.start()).unwrap_or(tag_name.len());
            let suffix = caps.get(1).map(|m| m.as_str());
            (&tag_name[..whole], suffix)
        }
        None => (tag_name, None),
    };

    let components = numeric_components(main).unwrap_or_else(|e| {
        debug!(tag = tag_name, error = %e, "Falling back to zero version components");
        vec![0]
    });

    let (rank, prerelease_number) = match suffix {
        Some(suffix) => (
            ReleaseRank::PreRelease,
            digits_pattern()
                .find(suffix)
                .map(|m| parse_digit_run(m.as_str()))
                .unwrap_or(0),
        ),
        None => (ReleaseRank::Final, 0),
    };

    VersionSortKey {
        components,
        rank,
        prerelease_number,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_final_tag_key() {
        let key = sort_key("1.21.11-v10-1.6");
        assert_eq!(key.components, vec![1, 21, 11, 10, 1, 6]);
        assert_eq!(key.rank, ReleaseRank::Final);
        assert_eq!(key.prerelease_number, 0);
    }

    #[test]
    fn test_beta_tag_key() {
        let key = sort_key("EndlessPixel.1.21.11-v10-b3");
        assert_eq!(key.components, vec![1, 21, 11, 10]);
        assert_eq!(key.rank, ReleaseRank::PreRelease);
        assert_eq!(key.prerelease_number, 3);
    }

    #[test]
    fn test_suffix_without_digits() {
        let key = sort_key("2.0-beta");
        assert_eq!(key.components, vec![2, 0]);
        assert_eq!(key.rank, ReleaseRank::PreRelease);
        assert_eq!(key.prerelease_number, 0);
    }

    #[test]
    fn test_final_outranks_prerelease() {
        assert!(sort_key("EndlessPixel.1.21.0-v10-1.6") > sort_key("EndlessPixel.1.21.0-v10-b9"));
        assert!(sort_key("2.0") > sort_key("2.0-rc5"));
    }

    #[test]
    fn test_prerelease_numbers_order() {
        assert!(sort_key("2.0-rc2") > sort_key("2.0-rc1"));
        assert!(sort_key("v10-b4") > sort_key("v10-b1"));
    }

    #[test]
    fn test_shorter_sequence_is_less() {
        assert!(sort_key("1.2") < sort_key("1.2.1"));
    }

    #[test]
    fn test_tag_without_digits_falls_back() {
        let key = sort_key("nightly");
        assert_eq!(key.components, vec![0]);
        assert_eq!(key.rank, ReleaseRank::Final);

        let key = sort_key("preview-alpha");
        assert_eq!(key.components, vec![0]);
        assert_eq!(key.rank, ReleaseRank::PreRelease);
    }

    #[test]
    fn test_huge_digit_run_saturates() {
        let key = sort_key("99999999999999999999999.1");
        assert_eq!(key.components, vec![u64::MAX, 1]);
    }

    #[test]
    fn test_release_list_ordering() {
        let mut tags = vec![
            "v10-1.6",
            "v10-b4",
            "v10-1.5",
            "v9-2.0",
            "1.21.11-v10-1.6",
            "1.21.11-v10-b1",
            "1.20.12-v10-1.0",
        ];
        tags.sort_by_key(|t| std::cmp::Reverse(sort_key(t)));

        assert_eq!(
            tags,
            vec![
                "v10-1.6",
                "v10-1.5",
                "v10-b4",
                "v9-2.0",
                "1.21.11-v10-1.6",
                "1.21.11-v10-b1",
                "1.20.12-v10-1.0",
            ]
        );
    }

    #[test]
    fn test_rank_weights() {
        assert_eq!(ReleaseRank::Final.weight(), 100);
        assert_eq!(ReleaseRank::PreRelease.weight(), 50);
    }

    #[test]
    fn test_numeric_components_error() {
        assert_eq!(
            numeric_components("abc"),
            Err(VersionParseError::NoDigits("abc".to_string()))
        );
    }

    proptest! {
        #[test]
        fn prop_sort_key_is_pure(tag in "\\PC*") {
            prop_assert_eq!(sort_key(&tag), sort_key(&tag));
        }

        #[test]
        fn prop_final_beats_prerelease(parts in proptest::collection::vec(0u64..1000, 1..5), beta in 0u64..100) {
            let base = parts.iter().map(u64::to_string).collect::<Vec<_>>().join(".");
            let final_tag = base.clone();
            let pre_tag = format!("{}-b{}", base, beta);
            prop_assert!(sort_key(&final_tag) > sort_key(&pre_tag));
        }
    }
}
