//! `packdl url <tag>`

use packdl::config::ConfigFile;

use super::common::{find_entry, CommandContext};
use crate::error::CliError;

pub fn run(config: ConfigFile, tag: &str, mirror: Option<String>) -> Result<(), CliError> {
    let ctx = CommandContext::new(config, mirror)?;
    let catalog = ctx.fetch_catalog()?;
    let entry = find_entry(&catalog, tag)?;

    println!("{}", ctx.download_url(entry));
    Ok(())
}
