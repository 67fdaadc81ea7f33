//! `packdl download [tag]`

use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use console::style;
use dialoguer::{Confirm, Select};
use indicatif::{ProgressBar, ProgressStyle};
use packdl::catalog::{Catalog, ReleaseEntry};
use packdl::config::ConfigFile;
use packdl::download::{DownloadEngine, DownloadEvent, TransferOutcome, TransferRequest};
use packdl::format::format_size;
use tracing::info;

use super::common::{find_entry, resolve_destination, CommandContext};
use crate::error::CliError;
use crate::keys::KeyControls;

const BAR_TEMPLATE: &str =
    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({percent}%) {msg}";

#[derive(Debug, Args)]
pub struct DownloadArgs {
    /// Release tag; prompts for a release when omitted
    pub tag: Option<String>,

    /// Output file or directory
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Number of parallel connections (1-64)
    #[arg(short, long)]
    pub threads: Option<usize>,

    /// Mirror to download through
    #[arg(short, long)]
    pub mirror: Option<String>,

    /// Overwrite an existing file without asking
    #[arg(short, long)]
    pub yes: bool,
}

pub fn run(config: ConfigFile, args: DownloadArgs) -> Result<(), CliError> {
    let ctx = CommandContext::new(config, args.mirror)?;
    let catalog = ctx.fetch_catalog()?;

    let entry = match args.tag.as_deref() {
        Some(tag) => find_entry(&catalog, tag)?,
        None => choose_entry(&catalog)?,
    };

    let destination = resolve_destination(
        args.output.as_deref(),
        ctx.config.download.directory.as_deref(),
        dirs::download_dir().as_deref(),
        entry.file_name(),
    );

    if destination.exists() && !args.yes && !confirm_overwrite(&destination)? {
        println!("Download cancelled.");
        return Ok(());
    }

    let url = ctx.download_url(entry);
    let threads = args.threads.unwrap_or(ctx.config.download.threads);
    let tip = ctx.mirrors().tip(&ctx.mirror);

    println!("Release:  {} ({})", entry.tag_name, format_size(entry.asset.size_bytes));
    if tip.is_empty() {
        println!("Mirror:   {}", ctx.mirror);
    } else {
        println!("Mirror:   {} ({})", ctx.mirror, tip);
    }
    println!("Saving:   {}", destination.display());
    let interactive = console::user_attended();
    if interactive {
        println!("Press p to pause or resume, q or Ctrl+C to stop");
    } else {
        println!("Press Ctrl+C to stop");
    }
    println!();
    info!(url = %url, threads, "Starting download");

    let bar = progress_bar(entry.asset.size_bytes);
    let observer = {
        let bar = bar.clone();
        move |event: DownloadEvent| render_event(&bar, event)
    };

    let handle = DownloadEngine::new(ctx.transport()).spawn(
        TransferRequest::new(url, &destination).with_threads(threads),
        Arc::new(observer),
    );

    let control = handle.control();
    ctrlc::set_handler(move || control.stop())
        .map_err(|e| CliError::Config(format!("Failed to set signal handler: {}", e)))?;

    let keys = if interactive {
        KeyControls::start(handle.remote())
    } else {
        None
    };

    let result = handle.wait();
    drop(keys);
    bar.finish_and_clear();

    match result? {
        TransferOutcome::Completed { path, bytes } => {
            println!(
                "{} Saved {} to {}",
                style("✓").green(),
                format_size(bytes),
                path.display()
            );
        }
        TransferOutcome::Stopped { downloaded_bytes } => {
            println!(
                "{} Stopped after {}; partial file left at {}",
                style("■").yellow(),
                format_size(downloaded_bytes),
                destination.display()
            );
        }
    }
    Ok(())
}

fn progress_bar(len: u64) -> ProgressBar {
    let bar = ProgressBar::new(len);
    if let Ok(style) = ProgressStyle::with_template(BAR_TEMPLATE) {
        bar.set_style(style.progress_chars("#>-"));
    }
    bar
}

fn render_event(bar: &ProgressBar, event: DownloadEvent) {
    match event {
        DownloadEvent::Started {
            total_bytes,
            threads,
        } => {
            // Stays on the bar line; raw mode breaks full-line output.
            bar.set_length(total_bytes);
            bar.set_message(format!("{} connections", threads));
        }
        DownloadEvent::Progress {
            downloaded_bytes, ..
        } => {
            // Workers report out of order; never move the bar backwards.
            if downloaded_bytes > bar.position() {
                bar.set_position(downloaded_bytes);
            }
        }
        DownloadEvent::Speed { display, .. } => bar.set_message(display),
        DownloadEvent::Paused => bar.set_message("paused"),
        DownloadEvent::Resumed => bar.set_message(""),
        DownloadEvent::Finished { .. } | DownloadEvent::Failed { .. } => {}
    }
}

/// Interactive release picker, newest platform version first.
fn choose_entry(catalog: &Catalog) -> Result<&ReleaseEntry, CliError> {
    if !console::user_attended() {
        return Err(CliError::Config(
            "No release tag given. Pass a tag or run interactively.".to_string(),
        ));
    }

    let entries: Vec<&ReleaseEntry> = catalog
        .groups()
        .into_iter()
        .flat_map(|(_, entries)| entries.iter())
        .collect();
    if entries.is_empty() {
        return Err(CliError::Config("No releases available.".to_string()));
    }

    let items: Vec<String> = entries.iter().map(|e| picker_label(e)).collect();
    let index = Select::new()
        .with_prompt("Select a release")
        .items(&items)
        .default(0)
        .interact()?;

    Ok(entries[index])
}

fn picker_label(entry: &ReleaseEntry) -> String {
    format!(
        "[{}] {}  ({}, {})",
        entry.channel_marker(),
        entry.tag_name,
        entry.platform_version,
        entry.published_date()
    )
}

fn confirm_overwrite(path: &std::path::Path) -> Result<bool, CliError> {
    if !console::user_attended() {
        return Err(CliError::Config(format!(
            "{} already exists. Use --yes to overwrite.",
            path.display()
        )));
    }
    Ok(Confirm::new()
        .with_prompt(format!("{} already exists. Overwrite?", path.display()))
        .default(false)
        .interact()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use packdl::catalog::ReleaseAsset;

    #[test]
    fn test_picker_label() {
        let entry = ReleaseEntry {
            tag_name: "1.21.11-v10-b1".to_string(),
            platform_version: "1.21.11".to_string(),
            is_prerelease: true,
            published_at: Utc.with_ymd_and_hms(2025, 10, 1, 0, 0, 0).unwrap(),
            asset: ReleaseAsset {
                name: "EndlessPixel.1.21.11-v10-b1.zip".to_string(),
                download_url: "https://example.com/a.zip".to_string(),
                size_bytes: 1,
            },
            notes: String::new(),
        };
        assert_eq!(
            picker_label(&entry),
            "[P] 1.21.11-v10-b1  (1.21.11, 2025-10-01)"
        );
    }

    #[test]
    fn test_render_event_keeps_bar_monotonic() {
        let bar = ProgressBar::hidden();
        render_event(
            &bar,
            DownloadEvent::Started {
                total_bytes: 100,
                threads: 2,
            },
        );
        for downloaded_bytes in [40, 20, 60] {
            render_event(
                &bar,
                DownloadEvent::Progress {
                    percent: 0,
                    downloaded_bytes,
                    total_bytes: 100,
                },
            );
        }

        assert_eq!(bar.length(), Some(100));
        assert_eq!(bar.position(), 60);
    }

    #[test]
    fn test_render_event_pause_message() {
        let bar = ProgressBar::hidden();
        render_event(
            &bar,
            DownloadEvent::Started {
                total_bytes: 100,
                threads: 4,
            },
        );
        assert_eq!(bar.message(), "4 connections");

        render_event(&bar, DownloadEvent::Paused);
        assert_eq!(bar.message(), "paused");

        render_event(&bar, DownloadEvent::Resumed);
        assert_eq!(bar.message(), "");
    }
}
