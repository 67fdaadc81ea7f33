//! Shared setup for commands that talk to the release API.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use packdl::catalog::{AssetPattern, Catalog, ReleaseCatalogResolver, ReleaseEntry};
use packdl::config::ConfigFile;
use packdl::http::{HttpTransport, ReqwestTransport};
use packdl::mirror::MirrorTable;

use crate::error::CliError;

/// Configuration plus the network pieces built from it.
pub struct CommandContext {
    pub config: ConfigFile,
    pub mirror: String,
    mirrors: Arc<MirrorTable>,
    transport: Arc<dyn HttpTransport>,
}

impl CommandContext {
    /// Build a context, validating a mirror override against the table.
    ///
    /// CLI mirror takes precedence over `catalog.mirror`.
    pub fn new(config: ConfigFile, mirror: Option<String>) -> Result<Self, CliError> {
        let mirror = mirror.unwrap_or_else(|| config.catalog.mirror.clone());
        if config.mirrors.get(&mirror).is_none() {
            return Err(CliError::UnknownMirror(mirror));
        }

        let transport =
            ReqwestTransport::with_timeout(Duration::from_secs(config.download.timeout_secs))?;

        Ok(Self {
            mirrors: Arc::new(config.mirrors.clone()),
            transport: Arc::new(transport),
            mirror,
            config,
        })
    }

    pub fn transport(&self) -> Arc<dyn HttpTransport> {
        Arc::clone(&self.transport)
    }

    pub fn mirrors(&self) -> &MirrorTable {
        &self.mirrors
    }

    /// Resolver configured with the selected mirror and asset prefix.
    pub fn resolver(&self) -> ReleaseCatalogResolver {
        let mut resolver = ReleaseCatalogResolver::new(self.transport(), Arc::clone(&self.mirrors))
            .with_asset_pattern(AssetPattern::new(&self.config.catalog.asset_prefix));
        resolver.set_mirror(self.mirror.clone());
        resolver
    }

    /// Fetch the catalog with a spinner on stderr.
    pub fn fetch_catalog(&self) -> Result<Catalog, CliError> {
        let spinner = spinner(format!("Fetching releases via {}...", self.mirror));
        let result = self.resolver().fetch(&self.config.catalog.api_url);
        spinner.finish_and_clear();
        Ok(result?)
    }

    /// Canonical download URL rewritten through the selected mirror.
    pub fn download_url(&self, entry: &ReleaseEntry) -> String {
        self.mirrors.rewrite(&entry.asset.download_url, &self.mirror)
    }
}

/// Look up a release by tag.
pub fn find_entry<'a>(catalog: &'a Catalog, tag: &str) -> Result<&'a ReleaseEntry, CliError> {
    catalog
        .find(tag)
        .ok_or_else(|| CliError::ReleaseNotFound(tag.to_string()))
}

/// Where a download should be written.
///
/// Explicit output > configured directory > user download directory >
/// current directory; directories get the asset file name appended.
pub fn resolve_destination(
    output: Option<&Path>,
    configured_dir: Option<&Path>,
    download_dir: Option<&Path>,
    file_name: &str,
) -> PathBuf {
    match output {
        Some(path) if path.is_dir() => path.join(file_name),
        Some(path) => path.to_path_buf(),
        None => configured_dir
            .or(download_dir)
            .unwrap_or_else(|| Path::new("."))
            .join(file_name),
    }
}

/// Steady-ticking spinner with a message.
pub fn spinner(message: String) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.enable_steady_tick(Duration::from_millis(120));
    if let Ok(style) = ProgressStyle::with_template("{spinner:.blue} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message);
    pb
}
