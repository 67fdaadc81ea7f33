//! `packdl config get|set|list|path`

use clap::Subcommand;
use packdl::config::{config_file_path, ConfigFile, ConfigKey};

use crate::error::CliError;

#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Print one value
    Get {
        /// Key in section.key form (e.g., download.threads)
        key: String,
    },

    /// Change one value and save the file
    Set {
        /// Key in section.key form (e.g., catalog.mirror)
        key: String,

        value: String,
    },

    /// Print every setting
    List,

    /// Print the config file location
    Path,
}

pub fn run(command: ConfigCommands) -> Result<(), CliError> {
    match command {
        ConfigCommands::Get { key } => {
            let key = parse_key(&key)?;
            let config = ConfigFile::load()?;
            println!("{}", display_value(&key.get(&config)));
        }
        ConfigCommands::Set { key, value } => {
            let key = parse_key(&key)?;
            let mut config = ConfigFile::load()?;
            key.set(&mut config, &value)?;
            config.save()?;
            println!("Set {} = {}", key, display_value(&key.get(&config)));
        }
        ConfigCommands::List => {
            let config = ConfigFile::load()?;
            print!("{}", render_list(&config));
        }
        ConfigCommands::Path => println!("{}", config_file_path().display()),
    }
    Ok(())
}

fn parse_key(key: &str) -> Result<ConfigKey, CliError> {
    key.parse().map_err(|_| {
        CliError::Config(format!(
            "Unknown configuration key '{}'. Use 'packdl config list' to see available keys.",
            key
        ))
    })
}

fn display_value(value: &str) -> &str {
    if value.is_empty() {
        "(not set)"
    } else {
        value
    }
}

/// Settings grouped under `[section]` headers, followed by the mirror count.
fn render_list(config: &ConfigFile) -> String {
    let mut out = String::new();
    let mut current_section = "";

    for key in ConfigKey::all() {
        if key.section() != current_section {
            if !current_section.is_empty() {
                out.push('\n');
            }
            out.push_str(&format!("[{}]\n", key.section()));
            current_section = key.section();
        }
        out.push_str(&format!(
            "  {} = {}\n",
            key.key_name(),
            display_value(&key.get(config))
        ));
    }

    out.push_str(&format!(
        "\n{} mirrors configured (see 'packdl mirrors')\n",
        config.mirrors.len()
    ));
    out
}
