//! Persistent user configuration.
//!
//! Settings live in an INI file at `<config_dir>/packdl/config.ini`. A
//! missing file yields the defaults; saving always writes every section.
//!
//! ```ini
//! [catalog]
//! api_url = https://api.github.com/repos/EndlessPixel/EndlessPixel-Modpack/releases
//! mirror = Cloudflare
//! asset_prefix = EndlessPixel
//!
//! [download]
//! threads = 8
//! directory = /home/user/Downloads/modpacks
//!
//! [mirror.Cloudflare]
//! url = https://gh-proxy.org/
//! tip = recommended
//! ```
//!
//! When the file contains `[mirror.*]` sections they replace the built-in
//! mirror list, in file order.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use ini::Ini;
use thiserror::Error;
use tracing::{debug, warn};

use crate::catalog::{DEFAULT_API_URL, DEFAULT_ASSET_PREFIX};
use crate::download::{DEFAULT_THREADS, MAX_THREADS, MIN_THREADS};
use crate::http::DEFAULT_TIMEOUT_SECS;
use crate::mirror::{Mirror, MirrorTable, DEFAULT_MIRROR};

/// Endpoint returning the newest application release.
pub const DEFAULT_UPDATE_URL: &str =
    "https://api.github.com/repos/EndlessPixel/EndlessPixel-ModpackApp/releases/latest";

const MIRROR_SECTION_PREFIX: &str = "mirror.";
const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Errors reading, writing or editing the configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {}: {source}", path.display())]
    Read { path: PathBuf, source: ini::Error },

    #[error("failed to write config file {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid value '{value}' for {key}: {reason}")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },

    #[error("unknown configuration key '{0}'")]
    UnknownKey(String),
}

/// `[catalog]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogSettings {
    pub api_url: String,
    /// Name of the selected mirror.
    pub mirror: String,
    /// Product prefix used by the asset naming grammar.
    pub asset_prefix: String,
    pub update_url: String,
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            mirror: DEFAULT_MIRROR.to_string(),
            asset_prefix: DEFAULT_ASSET_PREFIX.to_string(),
            update_url: DEFAULT_UPDATE_URL.to_string(),
        }
    }
}

/// `[download]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadSettings {
    pub threads: usize,
    /// Default destination directory; `None` falls back to the user's
    /// download directory.
    pub directory: Option<PathBuf>,
    pub timeout_secs: u64,
}

impl Default for DownloadSettings {
    fn default() -> Self {
        Self {
            threads: DEFAULT_THREADS,
            directory: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl DownloadSettings {
    /// Configured directory, else the platform download directory.
    pub fn resolved_directory(&self) -> Option<PathBuf> {
        self.directory.clone().or_else(dirs::download_dir)
    }
}

/// `[logging]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    /// Optional log file, in addition to stderr.
    pub file: Option<PathBuf>,
    pub level: String,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            file: None,
            level: "info".to_string(),
        }
    }
}

/// The whole configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ConfigFile {
    pub catalog: CatalogSettings,
    pub download: DownloadSettings,
    pub logging: LogSettings,
    pub mirrors: MirrorTable,
}

/// Default location of the configuration file.
pub fn config_file_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("packdl")
        .join("config.ini")
}

impl ConfigFile {
    /// Load from the default location.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&config_file_path())
    }

    /// Save to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&config_file_path())
    }

    /// Load from `path`; a missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            debug!(path = %path.display(), "Config file not found, using defaults");
            return Ok(Self::default());
        }

        let ini = Ini::load_from_file(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_ini(&ini)
    }

    /// Write every section to `path`, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let write_error = |source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(write_error)?;
        }
        self.to_ini().write_to_file(path).map_err(write_error)
    }

    /// Build a configuration from parsed INI data.
    ///
    /// Missing keys keep their defaults; present keys are validated the same
    /// way [`ConfigKey::set`] validates them. A selected mirror missing from
    /// the mirror table falls back to [`DEFAULT_MIRROR`] when the table has it,
    /// otherwise to the table's first mirror.
    pub fn from_ini(ini: &Ini) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        for key in ConfigKey::all() {
            if let Some(value) = ini
                .section(Some(key.section()))
                .and_then(|props| props.get(key.key_name()))
            {
                key.apply(&mut config, value)?;
            }
        }

        let mirrors: Vec<Mirror> = ini
            .iter()
            .filter_map(|(section, props)| {
                let name = section?.strip_prefix(MIRROR_SECTION_PREFIX)?;
                Some(Mirror::new(
                    name,
                    props.get("url").unwrap_or_default(),
                    props.get("tip").unwrap_or_default(),
                ))
            })
            .collect();
        if !mirrors.is_empty() {
            config.mirrors = MirrorTable::new(mirrors);
        }

        if config.mirrors.get(&config.catalog.mirror).is_none() {
            let fallback = if config.mirrors.get(DEFAULT_MIRROR).is_some() {
                DEFAULT_MIRROR.to_string()
            } else {
                config
                    .mirrors
                    .names()
                    .first()
                    .map(|name| name.to_string())
                    .unwrap_or_else(|| DEFAULT_MIRROR.to_string())
            };
            warn!(
                selected = %config.catalog.mirror,
                fallback = %fallback,
                "Selected mirror is not configured, falling back"
            );
            config.catalog.mirror = fallback;
        }

        Ok(config)
    }

    /// Render as INI data.
    pub fn to_ini(&self) -> Ini {
        let mut ini = Ini::new();

        for key in ConfigKey::all() {
            ini.with_section(Some(key.section()))
                .set(key.key_name(), key.get(self));
        }
        for mirror in self.mirrors.iter() {
            ini.with_section(Some(format!("{}{}", MIRROR_SECTION_PREFIX, mirror.name)))
                .set("url", mirror.prefix.as_str())
                .set("tip", mirror.tip.as_str());
        }

        ini
    }
}

/// A settable `section.key` in the configuration file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigKey {
    CatalogApiUrl,
    CatalogMirror,
    CatalogAssetPrefix,
    CatalogUpdateUrl,
    DownloadThreads,
    DownloadDirectory,
    DownloadTimeoutSecs,
    LoggingFile,
    LoggingLevel,
}

impl ConfigKey {
    /// Every key, grouped by section.
    pub fn all() -> &'static [ConfigKey] {
        &[
            ConfigKey::CatalogApiUrl,
            ConfigKey::CatalogMirror,
            ConfigKey::CatalogAssetPrefix,
            ConfigKey::CatalogUpdateUrl,
            ConfigKey::DownloadThreads,
            ConfigKey::DownloadDirectory,
            ConfigKey::DownloadTimeoutSecs,
            ConfigKey::LoggingFile,
            ConfigKey::LoggingLevel,
        ]
    }

    pub fn section(&self) -> &'static str {
        match self {
            ConfigKey::CatalogApiUrl
            | ConfigKey::CatalogMirror
            | ConfigKey::CatalogAssetPrefix
            | ConfigKey::CatalogUpdateUrl => "catalog",
            ConfigKey::DownloadThreads
            | ConfigKey::DownloadDirectory
            | ConfigKey::DownloadTimeoutSecs => "download",
            ConfigKey::LoggingFile | ConfigKey::LoggingLevel => "logging",
        }
    }

    pub fn key_name(&self) -> &'static str {
        match self {
            ConfigKey::CatalogApiUrl => "api_url",
            ConfigKey::CatalogMirror => "mirror",
            ConfigKey::CatalogAssetPrefix => "asset_prefix",
            ConfigKey::CatalogUpdateUrl => "update_url",
            ConfigKey::DownloadThreads => "threads",
            ConfigKey::DownloadDirectory => "directory",
            ConfigKey::DownloadTimeoutSecs => "timeout_secs",
            ConfigKey::LoggingFile => "file",
            ConfigKey::LoggingLevel => "level",
        }
    }

    /// Full `section.key` name.
    pub fn name(&self) -> String {
        format!("{}.{}", self.section(), self.key_name())
    }

    /// Current value as a string; unset optional values are empty.
    pub fn get(&self, config: &ConfigFile) -> String {
        let path_string = |p: &Option<PathBuf>| {
            p.as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_default()
        };

        match self {
            ConfigKey::CatalogApiUrl => config.catalog.api_url.clone(),
            ConfigKey::CatalogMirror => config.catalog.mirror.clone(),
            ConfigKey::CatalogAssetPrefix => config.catalog.asset_prefix.clone(),
            ConfigKey::CatalogUpdateUrl => config.catalog.update_url.clone(),
            ConfigKey::DownloadThreads => config.download.threads.to_string(),
            ConfigKey::DownloadDirectory => path_string(&config.download.directory),
            ConfigKey::DownloadTimeoutSecs => config.download.timeout_secs.to_string(),
            ConfigKey::LoggingFile => path_string(&config.logging.file),
            ConfigKey::LoggingLevel => config.logging.level.clone(),
        }
    }

    /// Validate and store a value.
    ///
    /// The mirror name is checked against the configured mirror table.
    pub fn set(&self, config: &mut ConfigFile, value: &str) -> Result<(), ConfigError> {
        if *self == ConfigKey::CatalogMirror && config.mirrors.get(value.trim()).is_none() {
            return Err(self.invalid(value, "no such mirror"));
        }
        self.apply(config, value)
    }

    fn invalid(&self, value: &str, reason: impl Into<String>) -> ConfigError {
        ConfigError::InvalidValue {
            key: self.name(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }

    fn apply(&self, config: &mut ConfigFile, value: &str) -> Result<(), ConfigError> {
        let value = value.trim();
        let optional_path = |v: &str| (!v.is_empty()).then(|| PathBuf::from(v));

        match self {
            ConfigKey::CatalogApiUrl => config.catalog.api_url = self.url(value)?,
            ConfigKey::CatalogUpdateUrl => config.catalog.update_url = self.url(value)?,
            ConfigKey::CatalogMirror => config.catalog.mirror = value.to_string(),
            ConfigKey::CatalogAssetPrefix => {
                if value.is_empty() {
                    return Err(self.invalid(value, "must not be empty"));
                }
                config.catalog.asset_prefix = value.to_string();
            }
            ConfigKey::DownloadThreads => {
                let threads: usize = value
                    .parse()
                    .map_err(|_| self.invalid(value, "expected a whole number"))?;
                if !(MIN_THREADS..=MAX_THREADS).contains(&threads) {
                    return Err(self.invalid(
                        value,
                        format!("must be between {} and {}", MIN_THREADS, MAX_THREADS),
                    ));
                }
                config.download.threads = threads;
            }
            ConfigKey::DownloadDirectory => config.download.directory = optional_path(value),
            ConfigKey::DownloadTimeoutSecs => {
                let secs: u64 = value
                    .parse()
                    .map_err(|_| self.invalid(value, "expected a whole number of seconds"))?;
                if secs == 0 {
                    return Err(self.invalid(value, "must be greater than zero"));
                }
                config.download.timeout_secs = secs;
            }
            ConfigKey::LoggingFile => config.logging.file = optional_path(value),
            ConfigKey::LoggingLevel => {
                let level = value.to_ascii_lowercase();
                if !LOG_LEVELS.contains(&level.as_str()) {
                    return Err(self.invalid(value, format!("expected one of {}", LOG_LEVELS.join(", "))));
                }
                config.logging.level = level;
            }
        }
        Ok(())
    }

    fn url(&self, value: &str) -> Result<String, ConfigError> {
        if value.starts_with("http://") || value.starts_with("https://") {
            Ok(value.to_string())
        } else {
            Err(self.invalid(value, "expected an http(s) URL"))
        }
    }
}

impl fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.section(), self.key_name())
    }
}

impl FromStr for ConfigKey {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ConfigKey::all()
            .iter()
            .copied()
            .find(|key| key.name() == s)
            .ok_or_else(|| ConfigError::UnknownKey(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = ConfigFile::load_from(&dir.path().join("config.ini")).unwrap();

        assert_eq!(config, ConfigFile::default());
        assert_eq!(config.download.threads, 4);
        assert_eq!(config.download.timeout_secs, 30);
        assert_eq!(config.catalog.mirror, "GitHub");
        assert_eq!(config.mirrors.len(), 7);
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sub").join("config.ini");

        let mut config = ConfigFile::default();
        ConfigKey::DownloadThreads.set(&mut config, "16").unwrap();
        ConfigKey::CatalogMirror.set(&mut config, "Fastly").unwrap();
        ConfigKey::DownloadDirectory
            .set(&mut config, "/tmp/packs")
            .unwrap();
        config.save_to(&path).unwrap();

        let loaded = ConfigFile::load_from(&path).unwrap();
        assert_eq!(loaded, config);
        assert_eq!(loaded.download.directory, Some(PathBuf::from("/tmp/packs")));
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let ini = Ini::load_from_str("[download]\nthreads = 12\n").unwrap();
        let config = ConfigFile::from_ini(&ini).unwrap();

        assert_eq!(config.download.threads, 12);
        assert_eq!(config.catalog, CatalogSettings::default());
    }

    #[test]
    fn test_mirror_sections_replace_defaults_in_order() {
        let ini = Ini::load_from_str(
            "[catalog]\nmirror = Local\n\
             [mirror.Direct]\nurl =\ntip = none\n\
             [mirror.Local]\nurl = http://127.0.0.1:8080/\ntip = lan cache\n",
        )
        .unwrap();
        let config = ConfigFile::from_ini(&ini).unwrap();

        assert_eq!(config.mirrors.names(), vec!["Direct", "Local"]);
        assert_eq!(config.mirrors.tip("Local"), "lan cache");
        assert_eq!(
            config.mirrors.rewrite("https://github.com/x", "Local"),
            "http://127.0.0.1:8080/https://github.com/x"
        );
    }

    #[test]
    fn test_unknown_selected_mirror_falls_back_to_default() {
        let ini = Ini::load_from_str("[catalog]\nmirror = Nowhere\n").unwrap();
        let config = ConfigFile::from_ini(&ini).unwrap();
        assert_eq!(config.catalog.mirror, DEFAULT_MIRROR);
    }

    #[test]
    fn test_custom_mirrors_without_selected_mirror_still_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.ini");
        std::fs::write(
            &path,
            "[download]\nthreads = 16\n\
             [mirror.Cloudflare]\nurl = https://gh-proxy.org/\ntip = recommended\n",
        )
        .unwrap();

        let mut config = ConfigFile::load_from(&path).unwrap();

        assert_eq!(config.download.threads, 16);
        assert_eq!(config.mirrors.names(), vec!["Cloudflare"]);
        assert_eq!(config.catalog.mirror, "Cloudflare");

        ConfigKey::CatalogMirror.set(&mut config, "Cloudflare").unwrap();
        assert!(ConfigKey::CatalogMirror.set(&mut config, "GitHub").is_err());
    }

    #[test]
    fn test_invalid_values() {
        let mut config = ConfigFile::default();

        assert!(ConfigKey::DownloadThreads.set(&mut config, "0").is_err());
        assert!(ConfigKey::DownloadThreads.set(&mut config, "65").is_err());
        assert!(ConfigKey::DownloadThreads.set(&mut config, "many").is_err());
        assert!(ConfigKey::DownloadTimeoutSecs.set(&mut config, "0").is_err());
        assert!(ConfigKey::CatalogApiUrl.set(&mut config, "ftp://x").is_err());
        assert!(ConfigKey::LoggingLevel.set(&mut config, "loud").is_err());
        assert!(ConfigKey::CatalogAssetPrefix.set(&mut config, " ").is_err());

        assert_eq!(config, ConfigFile::default());
    }

    #[test]
    fn test_empty_directory_unsets() {
        let mut config = ConfigFile::default();
        ConfigKey::DownloadDirectory.set(&mut config, "/data").unwrap();
        ConfigKey::DownloadDirectory.set(&mut config, "").unwrap();

        assert_eq!(config.download.directory, None);
        assert_eq!(ConfigKey::DownloadDirectory.get(&config), "");
    }

    #[test]
    fn test_log_level_normalised() {
        let mut config = ConfigFile::default();
        ConfigKey::LoggingLevel.set(&mut config, "DEBUG").unwrap();
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_key_parsing() {
        assert_eq!(
            "download.threads".parse::<ConfigKey>().unwrap(),
            ConfigKey::DownloadThreads
        );
        assert!(matches!(
            "download.speed".parse::<ConfigKey>(),
            Err(ConfigError::UnknownKey(_))
        ));

        for key in ConfigKey::all() {
            assert_eq!(key.name().parse::<ConfigKey>().unwrap(), *key);
            assert_eq!(key.to_string(), key.name());
        }
    }

    #[test]
    fn test_invalid_file_value_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.ini");
        std::fs::write(&path, "[download]\nthreads = lots\n").unwrap();

        let err = ConfigFile::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("download.threads"));
    }

    #[test]
    fn test_config_file_path_name() {
        let path = config_file_path();
        assert!(path.ends_with("packdl/config.ini"));
    }
}
