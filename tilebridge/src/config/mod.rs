//! Bridge configuration.
//!
//! Settings are grouped by concern and loaded from an INI file:
//!
//! - [`ProtocolSettings`] - URL scheme and source identifier
//! - [`PeerSpec`] - data peer contacted during bootstrap
//! - [`RendererSettings`] - initial camera zoom
//! - [`LoggingSettings`] - log file location
//!
//! # Example
//!
//! ```
//! use tilebridge::config::BridgeConfig;
//!
//! let config = BridgeConfig::from_ini_str("[protocol]\nscheme = regiontiles\n").unwrap();
//! assert_eq!(config.protocol.source_url(), "regiontiles://regions");
//! ```

mod file;
mod peer;

pub use file::{
    config_directory, config_file_path, BridgeConfig, ConfigFileError, LoggingSettings,
    ProtocolSettings, RendererSettings, DEFAULT_LOG_DIR, DEFAULT_LOG_FILE, DEFAULT_PEER_ADDRESS,
    DEFAULT_PEER_ID, DEFAULT_SCHEME, DEFAULT_SOURCE,
};
pub use peer::{parse_peer, parse_peers, PeerSpec};
