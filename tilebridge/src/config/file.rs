//! Configuration file handling for `~/.tilebridge/config.ini`.
//!
//! ```ini
//! [protocol]
//! scheme = pmtiles
//! source = regions
//!
//! [peer]
//! peer = 16Uiu2HAm...:/ip4/127.0.0.1/tcp/43101
//!
//! [renderer]
//! initial_zoom = 2
//!
//! [logging]
//! directory = logs
//! file = tilebridge.log
//! ```
//!
//! Missing sections and keys keep their defaults.

use std::path::{Path, PathBuf};

use ini::Ini;
use thiserror::Error;

use super::peer::{parse_peer, PeerSpec};
use crate::state::DEFAULT_ZOOM;

/// Default URL scheme the protocol handler registers.
pub const DEFAULT_SCHEME: &str = "pmtiles";

/// Default source identifier in descriptor URLs.
pub const DEFAULT_SOURCE: &str = "regions";

/// Default data peer id.
pub const DEFAULT_PEER_ID: &str = "16Uiu2HAmLFwze8Y4pydjKyveeRjjotpospuEHLcGyVhw1mp1XBbM";

/// Default data peer address.
pub const DEFAULT_PEER_ADDRESS: &str = "/ip4/127.0.0.1/tcp/43101";

/// Default log directory.
pub const DEFAULT_LOG_DIR: &str = "logs";

/// Default log file name.
pub const DEFAULT_LOG_FILE: &str = "tilebridge.log";

/// Configuration file errors.
#[derive(Debug, Error)]
pub enum ConfigFileError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] ini::Error),

    /// Failed to write config file
    #[error("Failed to write config file: {0}")]
    WriteError(String),

    /// Invalid configuration value
    #[error("Invalid configuration: {section}.{key} = '{value}' - {reason}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
        reason: String,
    },

    /// Failed to create config directory
    #[error("Failed to create config directory: {0}")]
    DirectoryError(std::io::Error),
}

/// `[protocol]` settings.
#[derive(Debug, Clone, PartialEq)]
pub struct ProtocolSettings {
    pub scheme: String,
    pub source: String,
}

impl ProtocolSettings {
    /// Descriptor URL the renderer's style points at.
    pub fn source_url(&self) -> String {
        format!("{}://{}", self.scheme, self.source)
    }
}

impl Default for ProtocolSettings {
    fn default() -> Self {
        Self {
            scheme: DEFAULT_SCHEME.to_string(),
            source: DEFAULT_SOURCE.to_string(),
        }
    }
}

/// `[renderer]` settings.
#[derive(Debug, Clone, PartialEq)]
pub struct RendererSettings {
    pub initial_zoom: f64,
}

impl Default for RendererSettings {
    fn default() -> Self {
        Self {
            initial_zoom: DEFAULT_ZOOM,
        }
    }
}

/// `[logging]` settings.
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingSettings {
    pub directory: PathBuf,
    pub file: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            directory: PathBuf::from(DEFAULT_LOG_DIR),
            file: DEFAULT_LOG_FILE.to_string(),
        }
    }
}

/// Complete bridge configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct BridgeConfig {
    pub protocol: ProtocolSettings,
    pub peer: PeerSpec,
    pub renderer: RendererSettings,
    pub logging: LoggingSettings,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            protocol: ProtocolSettings::default(),
            peer: PeerSpec::new(DEFAULT_PEER_ID, DEFAULT_PEER_ADDRESS),
            renderer: RendererSettings::default(),
            logging: LoggingSettings::default(),
        }
    }
}

impl BridgeConfig {
    /// Load configuration from the default path.
    pub fn load() -> Result<Self, ConfigFileError> {
        Self::load_from(&config_file_path())
    }

    /// Load configuration from a specific path.
    ///
    /// If the file doesn't exist, returns defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigFileError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let ini = Ini::load_from_file(path)?;
        parse_ini(&ini)
    }

    /// Parse configuration from INI text.
    pub fn from_ini_str(content: &str) -> Result<Self, ConfigFileError> {
        let ini = Ini::load_from_str(content)
            .map_err(|e| ConfigFileError::ReadError(ini::Error::Parse(e)))?;
        parse_ini(&ini)
    }

    /// Save configuration to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigFileError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(ConfigFileError::DirectoryError)?;
        }

        self.to_ini()
            .write_to_file(path)
            .map_err(|e| ConfigFileError::WriteError(e.to_string()))
    }

    fn to_ini(&self) -> Ini {
        let mut ini = Ini::new();
        ini.with_section(Some("protocol"))
            .set("scheme", self.protocol.scheme.as_str())
            .set("source", self.protocol.source.as_str());
        ini.with_section(Some("peer"))
            .set("peer", self.peer.to_string());
        ini.with_section(Some("renderer"))
            .set("initial_zoom", self.renderer.initial_zoom.to_string());
        ini.with_section(Some("logging"))
            .set("directory", self.logging.directory.to_string_lossy())
            .set("file", self.logging.file.as_str());
        ini
    }
}

/// Overlay any values found in `ini` onto the defaults.
fn parse_ini(ini: &Ini) -> Result<BridgeConfig, ConfigFileError> {
    let mut config = BridgeConfig::default();

    // [protocol] section
    if let Some(section) = ini.section(Some("protocol")) {
        if let Some(v) = section.get("scheme") {
            let v = v.trim();
            validate_scheme(v)?;
            config.protocol.scheme = v.to_string();
        }
        if let Some(v) = section.get("source") {
            let v = v.trim();
            if v.is_empty() {
                return Err(ConfigFileError::InvalidValue {
                    section: "protocol".to_string(),
                    key: "source".to_string(),
                    value: v.to_string(),
                    reason: "must not be empty".to_string(),
                });
            }
            config.protocol.source = v.to_string();
        }
    }

    // [peer] section
    if let Some(section) = ini.section(Some("peer")) {
        if let Some(v) = section.get("peer") {
            config.peer = parse_peer(v.trim())?;
        }
    }

    // [renderer] section
    if let Some(section) = ini.section(Some("renderer")) {
        if let Some(v) = section.get("initial_zoom") {
            config.renderer.initial_zoom = v
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|z| z.is_finite() && *z >= 0.0)
                .ok_or_else(|| ConfigFileError::InvalidValue {
                    section: "renderer".to_string(),
                    key: "initial_zoom".to_string(),
                    value: v.to_string(),
                    reason: "must be a non-negative number".to_string(),
                })?;
        }
    }

    // [logging] section
    if let Some(section) = ini.section(Some("logging")) {
        if let Some(v) = section.get("directory") {
            let v = v.trim();
            if !v.is_empty() {
                config.logging.directory = expand_tilde(v);
            }
        }
        if let Some(v) = section.get("file") {
            let v = v.trim();
            if !v.is_empty() {
                config.logging.file = v.to_string();
            }
        }
    }

    Ok(config)
}

/// A scheme starts with a letter and continues with letters, digits, `+`,
/// `-` or `.`.
fn validate_scheme(scheme: &str) -> Result<(), ConfigFileError> {
    let mut chars = scheme.chars();
    let valid = chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));

    if valid {
        Ok(())
    } else {
        Err(ConfigFileError::InvalidValue {
            section: "protocol".to_string(),
            key: "scheme".to_string(),
            value: scheme.to_string(),
            reason: "must start with a letter and contain only letters, digits, '+', '-' or '.'"
                .to_string(),
        })
    }
}

fn expand_tilde(path: &str) -> PathBuf {
    match path.strip_prefix("~/") {
        Some(rest) => dirs::home_dir()
            .map(|home| home.join(rest))
            .unwrap_or_else(|| PathBuf::from(path)),
        None => PathBuf::from(path),
    }
}

/// Get the path to the config directory (~/.tilebridge).
pub fn config_directory() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".tilebridge")
}

/// Get the path to the config file (~/.tilebridge/config.ini).
pub fn config_file_path() -> PathBuf {
    config_directory().join("config.ini")
}
