//! Asset naming grammar and platform-version extraction.
//!
//! Release assets are only considered when their file name follows the
//! product's archive naming convention:
//!
//! ```text
//! {prefix}.{major}.{minor}[.{patch}]-v{build}-{sub.version | b{beta}}.{zip | mrpack}
//! EndlessPixel.1.21.11-v10-1.6.zip
//! EndlessPixel.1.21-v9-b3.mrpack
//! ```

use std::sync::OnceLock;

use regex::Regex;

/// Product prefix used by the default asset pattern.
pub const DEFAULT_ASSET_PREFIX: &str = "EndlessPixel";

/// Platform version for tags without a leading dotted version.
pub const UNKNOWN_PLATFORM: &str = "unknown";

/// Compiled asset file name grammar for one product prefix.
#[derive(Debug, Clone)]
pub struct AssetPattern {
    prefix: String,
    regex: Regex,
}

impl Default for AssetPattern {
    fn default() -> Self {
        Self::new(DEFAULT_ASSET_PREFIX)
    }
}

impl AssetPattern {
    /// Build the grammar for a product prefix.
    ///
    /// The prefix is matched literally.
    pub fn new(prefix: &str) -> Self {
        let pattern = format!(
            r"^{}\.\d+\.\d+(\.\d+)?-v\d+-(\d+\.\d+|b\d+)\.(zip|mrpack)$",
            regex::escape(prefix)
        );
        Self {
            prefix: prefix.to_string(),
            regex: Regex::new(&pattern).expect("escaped asset pattern is valid"),
        }
    }

    /// The product prefix this pattern was built for.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Whether a file name follows the naming grammar.
    ///
    /// # Examples
    ///
    /// ```
    /// use packdl::catalog::AssetPattern;
    ///
    /// let pattern = AssetPattern::default();
    /// assert!(pattern.matches("EndlessPixel.1.21.11-v10-1.6.zip"));
    /// assert!(pattern.matches("EndlessPixel.1.20-v9-b4.mrpack"));
    /// assert!(!pattern.matches("EndlessPixel.1.21.11-v10-1.6.tar.gz"));
    /// ```
    pub fn matches(&self, file_name: &str) -> bool {
        self.regex.is_match(file_name)
    }
}

fn platform_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^([0-9]+\.[0-9]+(?:\.[0-9]+)?)-").expect("valid platform regex"))
}

/// Extract the platform version from a release tag.
///
/// Tags that do not start with a dotted version followed by a hyphen map to
/// [`UNKNOWN_PLATFORM`].
///
/// # Examples
///
/// ```
/// use packdl::catalog::platform_version;
///
/// assert_eq!(platform_version("1.21.11-v10-1.6"), "1.21.11");
/// assert_eq!(platform_version("v10-1.0"), "unknown");
/// ```
pub fn platform_version(tag_name: &str) -> String {
    platform_pattern()
        .captures(tag_name)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| UNKNOWN_PLATFORM.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_asset_pattern_accepts_release_archives() {
        let pattern = AssetPattern::default();
        assert!(pattern.matches("EndlessPixel.1.21.11-v10-1.6.zip"));
        assert!(pattern.matches("EndlessPixel.1.21-v10-1.6.zip"));
        assert!(pattern.matches("EndlessPixel.1.21.11-v10-b12.zip"));
        assert!(pattern.matches("EndlessPixel.1.20.1-v8-2.0.mrpack"));
    }

    #[test]
    fn test_asset_pattern_rejects_other_files() {
        let pattern = AssetPattern::default();
        assert!(!pattern.matches("EndlessPixel-Modpack-v10-1.6.zip"));
        assert!(!pattern.matches("EndlessPixel.1-v10-1.6.zip"));
        assert!(!pattern.matches("EndlessPixel.1.21.11-v10-1.6.zip.sha256"));
        assert!(!pattern.matches("EndlessPixel.1.21.11-v10-rc1.zip"));
        assert!(!pattern.matches("Other.1.21.11-v10-1.6.zip"));
        assert!(!pattern.matches("EndlessPixelX1.21.11-v10-1.6.zip"));
    }

    #[test]
    fn test_custom_prefix_is_literal() {
        let pattern = AssetPattern::new("My.Pack");
        assert_eq!(pattern.prefix(), "My.Pack");
        assert!(pattern.matches("My.Pack.1.20-v1-1.0.zip"));
        assert!(!pattern.matches("MyXPack.1.20-v1-1.0.zip"));
    }

    #[test]
    fn test_platform_version_extraction() {
        assert_eq!(platform_version("1.21.11-v10-1.6"), "1.21.11");
        assert_eq!(platform_version("1.20.12-v10-1.0"), "1.20.12");
        assert_eq!(platform_version("1.21-v9-b2"), "1.21");
    }

    #[test]
    fn test_platform_version_unknown() {
        assert_eq!(platform_version("v10-1.0"), UNKNOWN_PLATFORM);
        assert_eq!(platform_version("EndlessPixel.1.21.11-v10"), UNKNOWN_PLATFORM);
        assert_eq!(platform_version("1.21.11"), UNKNOWN_PLATFORM);
        assert_eq!(platform_version(""), UNKNOWN_PLATFORM);
    }
}
