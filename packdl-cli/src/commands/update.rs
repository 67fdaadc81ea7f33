//! `packdl check-update`

use std::sync::Arc;
use std::time::Duration;

use packdl::config::ConfigFile;
use packdl::http::ReqwestTransport;
use packdl::update::{UpdateChecker, UpdateStatus};
use packdl::APP_VERSION;
use tracing::warn;

use super::common::spinner;
use crate::error::CliError;

/// Report whether a newer release exists. Failures are logged and treated
/// as "no update".
pub fn run(config: &ConfigFile) -> Result<(), CliError> {
    let transport =
        ReqwestTransport::with_timeout(Duration::from_secs(config.download.timeout_secs))?;
    let checker = UpdateChecker::with_url(Arc::new(transport), &config.catalog.update_url);

    let pb = spinner("Checking for updates...".to_string());
    let result = checker.check(APP_VERSION);
    pb.finish_and_clear();

    match result {
        Ok(UpdateStatus::Available { latest, page_url }) => {
            println!("packdl {} is available (you have {}).", latest, APP_VERSION);
            if !page_url.is_empty() {
                println!("Download: {}", page_url);
            }
        }
        Ok(UpdateStatus::UpToDate) => println!("packdl {} is up to date.", APP_VERSION),
        Err(e) => {
            warn!(error = %e, "Update check failed");
            println!("Could not check for updates.");
        }
    }
    Ok(())
}
