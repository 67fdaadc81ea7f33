//! Paginated release listing traversal and catalog construction.

use std::cmp::Reverse;
use std::collections::HashSet;
use std::fmt;
use std::ops::ControlFlow;
use std::sync::Arc;

use tracing::{debug, info, warn};

use super::api::{decode_page, ApiAsset, ApiRelease};
use super::error::CatalogResult;
use super::link::next_link;
use super::model::{Catalog, ReleaseEntry};
use super::naming::{platform_version, AssetPattern};
use crate::http::HttpTransport;
use crate::mirror::{MirrorTable, DEFAULT_MIRROR};
use crate::version::sort_key;

/// Release listing of the EndlessPixel modpack.
pub const DEFAULT_API_URL: &str =
    "https://api.github.com/repos/EndlessPixel/EndlessPixel-Modpack/releases";

/// Outcome of a best-effort release notes lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReleaseNotes {
    /// The release was found; its notes may be empty.
    Found(String),
    /// No release with the requested tag exists.
    NotFound { tag_name: String },
    /// The listing could not be fetched or decoded.
    Unavailable { reason: String },
}

impl fmt::Display for ReleaseNotes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReleaseNotes::Found(notes) if notes.trim().is_empty() => {
                write!(f, "(no release notes)")
            }
            ReleaseNotes::Found(notes) => write!(f, "{}", notes),
            ReleaseNotes::NotFound { tag_name } => {
                write!(f, "release notes not found for {}", tag_name)
            }
            ReleaseNotes::Unavailable { reason } => {
                write!(f, "failed to load release notes: {}", reason)
            }
        }
    }
}

/// Builds version catalogs from a remote release listing.
///
/// The resolver keeps no state between calls except the selected mirror;
/// every [`fetch`](Self::fetch) re-reads the listing and returns a fresh
/// [`Catalog`].
pub struct ReleaseCatalogResolver {
    transport: Arc<dyn HttpTransport>,
    mirrors: Arc<MirrorTable>,
    mirror: String,
    pattern: AssetPattern,
}

impl ReleaseCatalogResolver {
    /// Create a resolver using the default asset pattern and no mirror.
    pub fn new(transport: Arc<dyn HttpTransport>, mirrors: Arc<MirrorTable>) -> Self {
        Self {
            transport,
            mirrors,
            mirror: DEFAULT_MIRROR.to_string(),
            pattern: AssetPattern::default(),
        }
    }

    /// Use a different asset naming grammar.
    pub fn with_asset_pattern(mut self, pattern: AssetPattern) -> Self {
        self.pattern = pattern;
        self
    }

    /// Select the mirror used for listing requests.
    pub fn set_mirror(&mut self, mirror: impl Into<String>) {
        self.mirror = mirror.into();
    }

    /// The currently selected mirror name.
    pub fn mirror(&self) -> &str {
        &self.mirror
    }

    /// The asset naming grammar in use.
    pub fn asset_pattern(&self) -> &AssetPattern {
        &self.pattern
    }

    /// Fetch every page of the listing and build the catalog.
    ///
    /// Any failed page aborts the whole fetch; no partial catalog is returned.
    pub fn fetch(&self, api_url: &str) -> CatalogResult<Catalog> {
        let releases = self.fetch_releases(api_url)?;
        let catalog = self.build_catalog(releases);

        info!(
            groups = catalog.len(),
            entries = catalog.entry_count(),
            "Release catalog built"
        );
        Ok(catalog)
    }

    /// Fetch and decode every page of the listing, in page order.
    pub fn fetch_releases(&self, api_url: &str) -> CatalogResult<Vec<ApiRelease>> {
        let mut all = Vec::new();
        self.walk_pages(api_url, |page| {
            all.extend(page);
            ControlFlow::Continue(())
        })?;
        Ok(all)
    }

    /// Sort, filter and group decoded releases into a catalog.
    pub fn build_catalog(&self, mut releases: Vec<ApiRelease>) -> Catalog {
        releases.sort_by_cached_key(|r| Reverse(sort_key(&r.tag_name)));

        let mut catalog = Catalog::new();
        for release in releases {
            if let Some(entry) = self.to_entry(release) {
                catalog.push(entry);
            }
        }
        catalog
    }

    /// Look up the notes of one release.
    ///
    /// Pages are fetched only until the tag is found. Failures are reported
    /// as [`ReleaseNotes::Unavailable`] rather than propagated.
    pub fn release_notes(&self, api_url: &str, tag_name: &str) -> ReleaseNotes {
        let mut found = None;
        let walked = self.walk_pages(api_url, |page| {
            match page.into_iter().find(|r| r.tag_name == tag_name) {
                Some(release) => {
                    found = Some(release.body.unwrap_or_default());
                    ControlFlow::Break(())
                }
                None => ControlFlow::Continue(()),
            }
        });

        match (found, walked) {
            (Some(notes), _) => ReleaseNotes::Found(notes),
            (None, Ok(())) => ReleaseNotes::NotFound {
                tag_name: tag_name.to_string(),
            },
            (None, Err(e)) => {
                warn!(tag = tag_name, error = %e, "Release notes lookup failed");
                ReleaseNotes::Unavailable {
                    reason: e.to_string(),
                }
            }
        }
    }

    /// Find the first asset (in listed order) that follows the naming grammar.
    pub fn select_asset<'a>(&self, release: &'a ApiRelease) -> Option<&'a ApiAsset> {
        release
            .assets
            .iter()
            .find(|asset| self.pattern.matches(&asset.name))
    }

    fn to_entry(&self, release: ApiRelease) -> Option<ReleaseEntry> {
        if release.assets.is_empty() {
            debug!(tag = %release.tag_name, "Skipping release without assets");
            return None;
        }

        let Some(index) = release
            .assets
            .iter()
            .position(|asset| self.pattern.matches(&asset.name))
        else {
            debug!(tag = %release.tag_name, "Skipping release without a matching asset");
            return None;
        };

        let ApiRelease {
            tag_name,
            prerelease,
            published_at,
            body,
            mut assets,
        } = release;

        Some(ReleaseEntry {
            platform_version: platform_version(&tag_name),
            tag_name,
            is_prerelease: prerelease,
            published_at,
            asset: assets.swap_remove(index).into(),
            notes: body.unwrap_or_default(),
        })
    }

    /// Walk the listing page by page following `rel="next"` links.
    ///
    /// Only the first URL goes through the selected mirror; `next` links are
    /// followed exactly as the server returned them.
    fn walk_pages<F>(&self, api_url: &str, mut visit: F) -> CatalogResult<()>
    where
        F: FnMut(Vec<ApiRelease>) -> ControlFlow<()>,
    {
        let mut url = Some(self.mirrors.rewrite(api_url, &self.mirror));
        let mut seen = HashSet::new();

        while let Some(current) = url.take() {
            if !seen.insert(current.clone()) {
                warn!(url = %current, "Pagination loop detected, stopping");
                break;
            }

            debug!(url = %current, "Fetching release page");
            let response = self.transport.get(&current)?;
            let page = decode_page(&current, &response.body)?;
            debug!(url = %current, releases = page.len(), "Release page decoded");

            if visit(page).is_break() {
                break;
            }

            url = response.link.as_deref().and_then(next_link);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use crate::catalog::CatalogError;
    use crate::http::{HttpError, HttpResponse, HttpResult, RangeResponse};
    use crate::mirror::Mirror;

    /// In-memory listing server keyed by URL.
    struct MockListing {
        pages: HashMap<String, (String, Option<String>)>,
        requests: parking_lot::Mutex<Vec<String>>,
    }

    impl MockListing {
        fn new() -> Self {
            Self {
                pages: HashMap::new(),
                requests: parking_lot::Mutex::new(Vec::new()),
            }
        }

        fn page(mut self, url: &str, body: &str, next: Option<&str>) -> Self {
            let link = next.map(|n| format!("<{}>; rel=\"next\"", n));
            self.pages.insert(url.to_string(), (body.to_string(), link));
            self
        }

        fn requested(&self) -> Vec<String> {
            self.requests.lock().clone()
        }
    }

    impl HttpTransport for MockListing {
        fn get(&self, url: &str) -> HttpResult<HttpResponse> {
            self.requests.lock().push(url.to_string());
            match self.pages.get(url) {
                Some((body, link)) => Ok(HttpResponse {
                    status: 200,
                    body: body.clone().into_bytes(),
                    link: link.clone(),
                }),
                None => Err(HttpError::Status {
                    url: url.to_string(),
                    status: 404,
                }),
            }
        }

        fn content_length(&self, _url: &str) -> HttpResult<Option<u64>> {
            Ok(None)
        }

        fn get_range(&self, url: &str, _start: u64, _end: u64) -> HttpResult<RangeResponse> {
            Err(HttpError::Status {
                url: url.to_string(),
                status: 405,
            })
        }
    }

    fn release_json(tag: &str, prerelease: bool, assets: &[&str]) -> String {
        let assets: Vec<String> = assets
            .iter()
            .map(|name| {
                format!(
                    r#"{{"name":"{0}","browser_download_url":"https://dl.example/{0}","size":100}}"#,
                    name
                )
            })
            .collect();
        format!(
            r#"{{"tag_name":"{}","prerelease":{},"published_at":"2025-06-01T12:00:00Z","body":"notes for {}","assets":[{}]}}"#,
            tag,
            prerelease,
            tag,
            assets.join(",")
        )
    }

    fn page_json(releases: &[String]) -> String {
        format!("[{}]", releases.join(","))
    }

    fn resolver(listing: MockListing) -> (ReleaseCatalogResolver, Arc<MockListing>) {
        let listing = Arc::new(listing);
        let resolver = ReleaseCatalogResolver::new(listing.clone(), Arc::new(MirrorTable::default()));
        (resolver, listing)
    }

    const API: &str = "https://api.example/releases";

    #[test]
    fn test_fetch_single_page() {
        let page = page_json(&[
            release_json("1.21.11-v10-1.5", false, &["EndlessPixel.1.21.11-v10-1.5.zip"]),
            release_json("1.21.11-v10-1.6", false, &["EndlessPixel.1.21.11-v10-1.6.zip"]),
        ]);
        let (resolver, _) = resolver(MockListing::new().page(API, &page, None));

        let catalog = resolver.fetch(API).unwrap();
        let group = catalog.get("1.21.11").unwrap();

        assert_eq!(group.len(), 2);
        assert_eq!(group[0].tag_name, "1.21.11-v10-1.6");
        assert_eq!(group[0].notes, "notes for 1.21.11-v10-1.6");
        assert_eq!(group[0].asset.size_bytes, 100);
    }

    #[test]
    fn test_skips_releases_without_matching_assets() {
        let page = page_json(&[
            release_json("1.21.11-v10-1.6", false, &[]),
            release_json("1.21.11-v10-1.5", false, &["source.tar.gz", "notes.txt"]),
            release_json("1.21.11-v10-1.4", false, &["EndlessPixel.1.21.11-v10-1.4.zip"]),
        ]);
        let (resolver, _) = resolver(MockListing::new().page(API, &page, None));

        let catalog = resolver.fetch(API).unwrap();

        assert_eq!(catalog.entry_count(), 1);
        assert!(catalog.find("1.21.11-v10-1.4").is_some());
    }

    #[test]
    fn test_first_matching_asset_wins() {
        let page = page_json(&[release_json(
            "1.21.11-v10-1.6",
            false,
            &[
                "EndlessPixel.1.21.11-v10-1.6.zip",
                "EndlessPixel.1.21.11-v10-1.6.mrpack",
            ],
        )]);
        let (resolver, _) = resolver(MockListing::new().page(API, &page, None));

        let catalog = resolver.fetch(API).unwrap();
        let entry = catalog.find("1.21.11-v10-1.6").unwrap();
        assert_eq!(entry.asset.name, "EndlessPixel.1.21.11-v10-1.6.zip");
    }

    #[test]
    fn test_unknown_platform_bucket() {
        let page = page_json(&[release_json("v10-1.0", true, &["EndlessPixel.1.20-v10-1.0.zip"])]);
        let (resolver, _) = resolver(MockListing::new().page(API, &page, None));

        let catalog = resolver.fetch(API).unwrap();
        let group = catalog.get("unknown").unwrap();
        assert!(group[0].is_prerelease);
    }

    #[test]
    fn test_mid_pagination_failure_aborts() {
        let page1 = page_json(&[release_json(
            "1.21.11-v10-1.6",
            false,
            &["EndlessPixel.1.21.11-v10-1.6.zip"],
        )]);
        let (resolver, _) = resolver(MockListing::new().page(
            API,
            &page1,
            Some("https://api.example/releases?page=2"),
        ));

        let err = resolver.fetch(API).unwrap_err();
        assert!(matches!(
            err,
            CatalogError::Network(HttpError::Status { status: 404, .. })
        ));
    }

    #[test]
    fn test_malformed_page_is_parse_error() {
        let (resolver, _) = resolver(MockListing::new().page(API, r#"{"message":"rate limited"}"#, None));
        assert!(matches!(
            resolver.fetch(API).unwrap_err(),
            CatalogError::Parse { .. }
        ));
    }

    #[test]
    fn test_pagination_loop_terminates() {
        let page = page_json(&[]);
        let (resolver, listing) = resolver(MockListing::new().page(API, &page, Some(API)));

        let catalog = resolver.fetch(API).unwrap();
        assert!(catalog.is_empty());
        assert_eq!(listing.requested().len(), 1);
    }

    #[test]
    fn test_mirror_applies_to_first_request() {
        let mirrored = format!("https://proxy.example/{}", API);
        let page = page_json(&[]);
        let listing = Arc::new(MockListing::new().page(&mirrored, &page, None));
        let mirrors = MirrorTable::new(vec![Mirror::new("Proxy", "https://proxy.example/", "")]);
        let mut resolver = ReleaseCatalogResolver::new(listing.clone(), Arc::new(mirrors));

        resolver.set_mirror("Proxy");
        assert_eq!(resolver.mirror(), "Proxy");
        resolver.fetch(API).unwrap();

        assert_eq!(listing.requested(), vec![mirrored]);
    }

    #[test]
    fn test_release_notes_found_on_second_page() {
        let page2_url = "https://api.example/releases?page=2";
        let page3_url = "https://api.example/releases?page=3";
        let page1 = page_json(&[release_json("v10-1.6", false, &[])]);
        let page2 = page_json(&[release_json("v10-1.5", false, &[])]);
        let (resolver, listing) = resolver(
            MockListing::new()
                .page(API, &page1, Some(page2_url))
                .page(page2_url, &page2, Some(page3_url)),
        );

        let notes = resolver.release_notes(API, "v10-1.5");

        assert_eq!(notes, ReleaseNotes::Found("notes for v10-1.5".to_string()));
        assert_eq!(listing.requested().len(), 2);
    }

    #[test]
    fn test_release_notes_not_found_and_unavailable() {
        let page = page_json(&[release_json("v10-1.6", false, &[])]);
        let (resolver, _) = resolver(MockListing::new().page(API, &page, None));

        let missing = resolver.release_notes(API, "v1-0.1");
        assert_eq!(
            missing.to_string(),
            "release notes not found for v1-0.1"
        );

        let unavailable = resolver.release_notes("https://api.example/other", "v10-1.6");
        assert!(matches!(unavailable, ReleaseNotes::Unavailable { .. }));
        assert!(unavailable.to_string().starts_with("failed to load release notes"));
    }

    #[test]
    fn test_custom_asset_prefix() {
        let page = page_json(&[release_json("1.20-v1-1.0", false, &["Other.1.20-v1-1.0.zip"])]);
        let (resolver, _) = resolver(MockListing::new().page(API, &page, None));
        let resolver = resolver.with_asset_pattern(AssetPattern::new("Other"));

        assert_eq!(resolver.asset_pattern().prefix(), "Other");
        assert_eq!(resolver.fetch(API).unwrap().entry_count(), 1);
    }
}
