//! `packdl notes <tag>`

use packdl::config::ConfigFile;

use super::common::CommandContext;
use crate::error::CliError;

/// Print release notes. Lookup failures are shown, not returned as errors.
pub fn run(config: ConfigFile, tag: &str, mirror: Option<String>) -> Result<(), CliError> {
    let ctx = CommandContext::new(config, mirror)?;
    let notes = ctx
        .resolver()
        .release_notes(&ctx.config.catalog.api_url, tag);

    println!("{}", notes);
    Ok(())
}
