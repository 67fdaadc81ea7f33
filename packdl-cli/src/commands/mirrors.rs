//! `packdl mirrors`

use console::style;
use packdl::config::ConfigFile;
use packdl::mirror::MirrorTable;

use crate::error::CliError;

pub fn run(config: &ConfigFile) -> Result<(), CliError> {
    print!("{}", render(&config.mirrors, &config.catalog.mirror));
    Ok(())
}

fn render(mirrors: &MirrorTable, selected: &str) -> String {
    let width = mirrors.iter().map(|m| m.name.chars().count()).max().unwrap_or(0);
    let mut out = String::new();

    for mirror in mirrors.iter() {
        let marker = if mirror.name == selected { "*" } else { " " };
        let prefix = if mirror.is_passthrough() {
            "(direct)".to_string()
        } else {
            mirror.prefix.clone()
        };
        let padding = " ".repeat(width - mirror.name.chars().count());
        out.push_str(&format!(
            "{} {}{}  {}  {}\n",
            marker,
            mirror.name,
            padding,
            prefix,
            style(&mirror.tip).dim()
        ));
    }
    out
}
