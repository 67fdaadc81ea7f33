//! `packdl list`

use console::style;
use packdl::catalog::{Catalog, ReleaseEntry};
use packdl::config::ConfigFile;
use packdl::format::format_size;

use super::common::CommandContext;
use crate::error::CliError;

pub fn run(config: ConfigFile, mirror: Option<String>) -> Result<(), CliError> {
    let ctx = CommandContext::new(config, mirror)?;
    let catalog = ctx.fetch_catalog()?;

    if catalog.is_empty() {
        println!("No releases found.");
        return Ok(());
    }

    print!("{}", render(&catalog));
    println!();
    println!(
        "{} releases in {} groups (R = release, P = pre-release)",
        catalog.entry_count(),
        catalog.len()
    );
    Ok(())
}

/// Catalog as text, newest platform version first.
fn render(catalog: &Catalog) -> String {
    let mut out = String::new();
    for (platform, entries) in catalog.groups() {
        out.push_str(&format!("{}\n", style(platform).bold()));
        for entry in entries {
            out.push_str(&format!("  {}\n", render_entry(entry)));
        }
    }
    out
}

fn render_entry(entry: &ReleaseEntry) -> String {
    format!(
        "{}  {:<20} {}  {:>10}  {}",
        entry.channel_marker(),
        entry.tag_name,
        entry.published_date(),
        format_size(entry.asset.size_bytes),
        entry.file_name()
    )
}
