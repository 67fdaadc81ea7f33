//! Catalog data model.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use super::api::ApiAsset;
use crate::version::natural_cmp;

/// A downloadable release asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseAsset {
    /// File name as published.
    pub name: String,
    /// Canonical download URL (before any mirror rewrite).
    pub download_url: String,
    /// Size reported by the listing API.
    pub size_bytes: u64,
}

impl From<ApiAsset> for ReleaseAsset {
    fn from(asset: ApiAsset) -> Self {
        Self {
            name: asset.name,
            download_url: asset.browser_download_url,
            size_bytes: asset.size,
        }
    }
}

/// One release reduced to its single matching asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseEntry {
    pub tag_name: String,
    /// Grouping key extracted from the tag, or `"unknown"`.
    pub platform_version: String,
    pub is_prerelease: bool,
    pub published_at: DateTime<Utc>,
    pub asset: ReleaseAsset,
    /// Release notes text (empty when the release has none).
    pub notes: String,
}

impl ReleaseEntry {
    /// File name of the selected asset.
    pub fn file_name(&self) -> &str {
        &self.asset.name
    }

    /// `'P'` for pre-releases, `'R'` for final releases.
    pub fn channel_marker(&self) -> char {
        if self.is_prerelease {
            'P'
        } else {
            'R'
        }
    }

    /// Publish date without the time part (`YYYY-MM-DD`).
    pub fn published_date(&self) -> String {
        self.published_at.date_naive().to_string()
    }
}

/// Release entries grouped by platform version.
///
/// Entries inside a group keep the order in which they were added, which the
/// resolver guarantees is newest-first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    groups: HashMap<String, Vec<ReleaseEntry>>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry to the group for its platform version.
    pub fn push(&mut self, entry: ReleaseEntry) {
        self.groups
            .entry(entry.platform_version.clone())
            .or_default()
            .push(entry);
    }

    /// Entries for one platform version.
    pub fn get(&self, platform_version: &str) -> Option<&[ReleaseEntry]> {
        self.groups.get(platform_version).map(Vec::as_slice)
    }

    /// Platform versions sorted descending with natural ordering.
    pub fn platform_versions(&self) -> Vec<&str> {
        let mut versions: Vec<&str> = self.groups.keys().map(String::as_str).collect();
        versions.sort_by(|a, b| natural_cmp(b, a));
        versions
    }

    /// Groups in display order.
    pub fn groups(&self) -> Vec<(&str, &[ReleaseEntry])> {
        self.platform_versions()
            .into_iter()
            .filter_map(|v| self.get(v).map(|entries| (v, entries)))
            .collect()
    }

    /// Find an entry by tag name across all groups.
    pub fn find(&self, tag_name: &str) -> Option<&ReleaseEntry> {
        self.groups
            .values()
            .flat_map(|entries| entries.iter())
            .find(|entry| entry.tag_name == tag_name)
    }

    /// Number of platform-version groups.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Total number of entries across all groups.
    pub fn entry_count(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }
}
