//! Mirror endpoints for release downloads and catalog requests.
//!
//! A mirror is a URL prefix placed in front of a canonical URL, the way
//! GitHub proxy services work:
//!
//! ```text
//! https://gh-proxy.org/ + https://github.com/owner/repo/releases/download/...
//! ```
//!
//! The [`MirrorTable`] preserves insertion order so mirror listings are
//! deterministic. An empty prefix means "no rewrite".

/// The mirror that leaves URLs untouched.
pub const DEFAULT_MIRROR: &str = "GitHub";

/// A named alternate endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mirror {
    /// Unique display name (e.g., "Cloudflare").
    pub name: String,
    /// URL prefix; empty means the canonical URL is used as-is.
    pub prefix: String,
    /// Short human hint shown next to the name.
    pub tip: String,
}

impl Mirror {
    /// Create a new mirror entry.
    pub fn new(name: impl Into<String>, prefix: impl Into<String>, tip: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            prefix: prefix.into(),
            tip: tip.into(),
        }
    }

    /// Whether this mirror rewrites URLs at all.
    pub fn is_passthrough(&self) -> bool {
        self.prefix.trim().is_empty()
    }

    /// Rewrite a canonical URL through this mirror.
    ///
    /// The prefix and the URL are joined with exactly one `/` between them.
    pub fn apply(&self, original_url: &str) -> String {
        if self.is_passthrough() {
            return original_url.to_string();
        }
        format!(
            "{}/{}",
            self.prefix.trim().trim_end_matches('/'),
            original_url.trim_start_matches('/')
        )
    }
}

/// Ordered mapping from mirror name to URL prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MirrorTable {
    mirrors: Vec<Mirror>,
}

impl Default for MirrorTable {
    /// The built-in mirror list.
    fn default() -> Self {
        Self::new(vec![
            Mirror::new(DEFAULT_MIRROR, "", "official source"),
            Mirror::new("Cloudflare", "https://gh-proxy.org/", "recommended"),
            Mirror::new("Fastly", "https://cdn.gh-proxy.org/", "recommended"),
            Mirror::new("Edgeone", "https://edgeone.gh-proxy.org/", "recommended"),
            Mirror::new("Jasonzeng", "https://gh.xmly.dev/", "avoid for large files"),
            Mirror::new("Imixc", "https://gh.imixc.top/", "avoid for large files"),
            Mirror::new("香港", "https://hk.gh-proxy.org/", "Hong Kong node"),
        ])
    }
}

impl MirrorTable {
    /// Create a table from a list of mirrors.
    ///
    /// Later entries with a duplicate name replace earlier ones in place.
    pub fn new(mirrors: Vec<Mirror>) -> Self {
        let mut table = Self::empty();
        for mirror in mirrors {
            table.insert(mirror);
        }
        table
    }

    /// Create a table with no mirrors.
    pub fn empty() -> Self {
        Self {
            mirrors: Vec::new(),
        }
    }

    /// Insert a mirror, replacing an existing entry of the same name in place.
    pub fn insert(&mut self, mirror: Mirror) {
        match self.mirrors.iter_mut().find(|m| m.name == mirror.name) {
            Some(existing) => *existing = mirror,
            None => self.mirrors.push(mirror),
        }
    }

    /// Look up a mirror by name.
    pub fn get(&self, name: &str) -> Option<&Mirror> {
        self.mirrors.iter().find(|m| m.name == name)
    }

    /// Rewrite `original_url` through the named mirror.
    ///
    /// Unknown names and empty prefixes return the URL unchanged.
    pub fn rewrite(&self, original_url: &str, mirror_name: &str) -> String {
        match self.get(mirror_name) {
            Some(mirror) => mirror.apply(original_url),
            None => original_url.to_string(),
        }
    }

    /// All mirror names in table order.
    pub fn names(&self) -> Vec<&str> {
        self.mirrors.iter().map(|m| m.name.as_str()).collect()
    }

    /// The hint for a mirror, or an empty string when unknown.
    pub fn tip(&self, mirror_name: &str) -> &str {
        self.get(mirror_name).map(|m| m.tip.as_str()).unwrap_or("")
    }

    /// Iterate over mirrors in table order.
    pub fn iter(&self) -> impl Iterator<Item = &Mirror> {
        self.mirrors.iter()
    }

    pub fn len(&self) -> usize {
        self.mirrors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mirrors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const ASSET_URL: &str = "https://github.com/EndlessPixel/EndlessPixel-Modpack/releases/download/v10-1.6/EndlessPixel.1.21.11-v10-1.6.zip";

    #[test]
    fn test_default_names_in_order() {
        let table = MirrorTable::default();
        assert_eq!(
            table.names(),
            vec!["GitHub", "Cloudflare", "Fastly", "Edgeone", "Jasonzeng", "Imixc", "香港"]
        );
    }

    #[test]
    fn test_rewrite_with_prefix() {
        let table = MirrorTable::default();
        assert_eq!(
            table.rewrite(ASSET_URL, "Cloudflare"),
            format!("https://gh-proxy.org/{}", ASSET_URL)
        );
    }

    #[test]
    fn test_rewrite_prefix_without_trailing_slash() {
        let table = MirrorTable::new(vec![Mirror::new("Bare", "https://proxy.example/gh", "")]);
        assert_eq!(
            table.rewrite("https://github.com/a/b", "Bare"),
            "https://proxy.example/gh/https://github.com/a/b"
        );
    }

    #[test]
    fn test_rewrite_unknown_mirror_is_noop() {
        let table = MirrorTable::default();
        assert_eq!(table.rewrite(ASSET_URL, "NoSuchMirror"), ASSET_URL);
    }

    #[test]
    fn test_insert_replaces_in_place() {
        let mut table = MirrorTable::default();
        table.insert(Mirror::new("Fastly", "https://fastly.example/", "custom"));

        assert_eq!(table.len(), 7);
        assert_eq!(table.names()[2], "Fastly");
        assert_eq!(table.tip("Fastly"), "custom");
    }

    #[test]
    fn test_tip_lookup() {
        let table = MirrorTable::default();
        assert_eq!(table.tip("GitHub"), "official source");
        assert_eq!(table.tip("missing"), "");
    }

    #[test]
    fn test_empty_table() {
        let table = MirrorTable::empty();
        assert!(table.is_empty());
        assert_eq!(table.rewrite(ASSET_URL, DEFAULT_MIRROR), ASSET_URL);
    }

    proptest! {
        #[test]
        fn prop_passthrough_mirror_returns_url_unchanged(url in "\\PC*") {
            let table = MirrorTable::default();
            prop_assert_eq!(table.rewrite(&url, "GitHub"), url);
        }
    }
}
