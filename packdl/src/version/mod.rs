//! Release tag ordering.
//!
//! Two orderings live here:
//!
//! - [`sort_key`] turns a release tag into a [`VersionSortKey`] used to order
//!   releases newest-first inside the catalog
//! - [`natural_cmp`] orders platform-version group labels (e.g. `1.21.11`
//!   above `1.21.4`) for display
//!
//! Both are pure functions that never fail: malformed input degrades to a
//! best-effort key.

mod natural;
mod ordering;

pub use natural::natural_cmp;
pub use ordering::{numeric_components, sort_key, ReleaseRank, VersionParseError, VersionSortKey};
