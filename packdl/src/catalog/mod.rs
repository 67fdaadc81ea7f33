//! Release catalog resolution.
//!
//! The resolver walks a paginated release listing (GitHub-style
//! `/releases` endpoint), keeps at most one matching asset per release and
//! groups the resulting entries by platform version:
//!
//! ```text
//! ReleaseCatalogResolver
//!         │
//!         ├── HttpTransport      (page fetches, optionally via a mirror)
//!         ├── api                (typed decode of release objects)
//!         ├── link               (Link header "next" relation)
//!         ├── naming             (asset grammar, platform version)
//!         └── version::sort_key  (newest-first ordering)
//!                 │
//!                 ▼
//!              Catalog  { platform version → [ReleaseEntry] }
//! ```

mod api;
mod error;
mod link;
mod model;
mod naming;
mod resolver;

pub use api::{ApiAsset, ApiRelease, LatestRelease};
pub use error::{CatalogError, CatalogResult};
pub use link::next_link;
pub use model::{Catalog, ReleaseAsset, ReleaseEntry};
pub use naming::{platform_version, AssetPattern, DEFAULT_ASSET_PREFIX, UNKNOWN_PLATFORM};
pub use resolver::{ReleaseCatalogResolver, ReleaseNotes, DEFAULT_API_URL};
