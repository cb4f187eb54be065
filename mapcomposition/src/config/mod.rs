//! Configuration file handling for `~/.mapcomposition/config.ini`.
//!
//! Loads and saves user configuration with sensible defaults. Unknown
//! sections and keys are ignored on load; missing files load as defaults.
//!
//! ```ini
//! [server]
//! bind = 127.0.0.1
//! port = 8080
//!
//! [composition]
//! wfs_precision = 8
//! legend_size = 96
//!
//! [logging]
//! directory = logs
//! level = info
//! ```

use std::path::{Path, PathBuf};
use std::str::FromStr;

use ini::Ini;
use thiserror::Error;

/// Configuration file errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Read(#[from] ini::Error),

    #[error("failed to write config file: {0}")]
    Write(std::io::Error),

    #[error("invalid configuration: {section}.{key} = '{value}'")]
    InvalidValue {
        section: &'static str,
        key: &'static str,
        value: String,
    },

    #[error("unknown configuration key '{0}'")]
    UnknownKey(String),
}

/// `[server]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerSettings {
    pub bind: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

/// `[composition]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompositionSettings {
    pub wfs_precision: i64,
    pub legend_size: u32,
}

impl Default for CompositionSettings {
    fn default() -> Self {
        Self {
            wfs_precision: 8,
            legend_size: 96,
        }
    }
}

/// `[logging]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingSettings {
    pub directory: PathBuf,
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("logs"),
            level: "info".to_string(),
        }
    }
}

/// The whole configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigFile {
    pub server: ServerSettings,
    pub composition: CompositionSettings,
    pub logging: LoggingSettings,
}

/// Default config file path (`~/.mapcomposition/config.ini`).
pub fn config_file_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".mapcomposition")
        .join("config.ini")
}

impl ConfigFile {
    /// Load from the default path; a missing file loads as defaults.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&config_file_path())
    }

    /// Load from a specific path; a missing file loads as defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let ini = Ini::load_from_file(path)?;
        Self::from_ini(&ini)
    }

    fn from_ini(ini: &Ini) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(bind) = ini.get_from(Some("server"), "bind") {
            config.server.bind = bind.to_string();
        }
        if let Some(port) = ini.get_from(Some("server"), "port") {
            config.server.port = parse_value("server", "port", port)?;
        }
        if let Some(precision) = ini.get_from(Some("composition"), "wfs_precision") {
            config.composition.wfs_precision =
                parse_value("composition", "wfs_precision", precision)?;
        }
        if let Some(size) = ini.get_from(Some("composition"), "legend_size") {
            config.composition.legend_size = parse_value("composition", "legend_size", size)?;
        }
        if let Some(directory) = ini.get_from(Some("logging"), "directory") {
            config.logging.directory = PathBuf::from(directory);
        }
        if let Some(level) = ini.get_from(Some("logging"), "level") {
            config.logging.level = level.to_string();
        }

        Ok(config)
    }

    fn to_ini(&self) -> Ini {
        let mut ini = Ini::new();
        ini.with_section(Some("server"))
            .set("bind", self.server.bind.clone())
            .set("port", self.server.port.to_string());
        ini.with_section(Some("composition"))
            .set("wfs_precision", self.composition.wfs_precision.to_string())
            .set("legend_size", self.composition.legend_size.to_string());
        ini.with_section(Some("logging"))
            .set("directory", self.logging.directory.display().to_string())
            .set("level", self.logging.level.clone());
        ini
    }

    /// Save to the default path.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&config_file_path())
    }

    /// Save to a specific path, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(ConfigError::Write)?;
        }
        self.to_ini()
            .write_to_file(path)
            .map_err(ConfigError::Write)
    }

    /// Create the default config file if it doesn't exist; returns its path.
    pub fn ensure_exists() -> Result<PathBuf, ConfigError> {
        let path = config_file_path();
        if !path.exists() {
            Self::default().save_to(&path)?;
        }
        Ok(path)
    }
}

fn parse_value<T: FromStr>(
    section: &'static str,
    key: &'static str,
    value: &str,
) -> Result<T, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidValue {
        section,
        key,
        value: value.to_string(),
    })
}

/// Addressable configuration keys (`section.key`) for CLI get/set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigKey {
    ServerBind,
    ServerPort,
    WfsPrecision,
    LegendSize,
    LogDirectory,
    LogLevel,
}

impl ConfigKey {
    pub const ALL: &'static [ConfigKey] = &[
        ConfigKey::ServerBind,
        ConfigKey::ServerPort,
        ConfigKey::WfsPrecision,
        ConfigKey::LegendSize,
        ConfigKey::LogDirectory,
        ConfigKey::LogLevel,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ConfigKey::ServerBind => "server.bind",
            ConfigKey::ServerPort => "server.port",
            ConfigKey::WfsPrecision => "composition.wfs_precision",
            ConfigKey::LegendSize => "composition.legend_size",
            ConfigKey::LogDirectory => "logging.directory",
            ConfigKey::LogLevel => "logging.level",
        }
    }

    pub fn get(&self, config: &ConfigFile) -> String {
        match self {
            ConfigKey::ServerBind => config.server.bind.clone(),
            ConfigKey::ServerPort => config.server.port.to_string(),
            ConfigKey::WfsPrecision => config.composition.wfs_precision.to_string(),
            ConfigKey::LegendSize => config.composition.legend_size.to_string(),
            ConfigKey::LogDirectory => config.logging.directory.display().to_string(),
            ConfigKey::LogLevel => config.logging.level.clone(),
        }
    }

    pub fn set(&self, config: &mut ConfigFile, value: &str) -> Result<(), ConfigError> {
        match self {
            ConfigKey::ServerBind => config.server.bind = value.to_string(),
            ConfigKey::ServerPort => {
                config.server.port = parse_value("server", "port", value)?;
            }
            ConfigKey::WfsPrecision => {
                config.composition.wfs_precision =
                    parse_value("composition", "wfs_precision", value)?;
            }
            ConfigKey::LegendSize => {
                config.composition.legend_size = parse_value("composition", "legend_size", value)?;
            }
            ConfigKey::LogDirectory => config.logging.directory = PathBuf::from(value),
            ConfigKey::LogLevel => config.logging.level = value.to_string(),
        }
        Ok(())
    }
}

impl FromStr for ConfigKey {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ConfigKey::ALL
            .iter()
            .find(|k| k.name() == s)
            .copied()
            .ok_or_else(|| ConfigError::UnknownKey(s.to_string()))
    }
}
