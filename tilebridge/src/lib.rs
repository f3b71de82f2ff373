//! Tilebridge - serve offline regional map tiles to an embedded renderer
//!
//! This library brings up a map session over a set of regional tile
//! archives: it starts local storage, reaches the data peer, opens the tile
//! session, registers a custom URL scheme the renderer fetches tiles
//! through, and creates the renderer.
//!
//! # Modules
//!
//! - [`session`] - ordered startup and teardown of a map session
//! - [`protocol`] - custom-scheme resource handler and scheme registry
//! - [`state`] - observable readiness, error and camera state
//! - [`region`] - region metadata and aggregation
//! - [`provider`] - multi-region tile routing
//! - [`backend`] - interfaces for storage, tile provider and renderer
//! - [`config`] - INI configuration and peer parsing
//! - [`logging`] - tracing subscriber setup

pub mod backend;
pub mod config;
pub mod coord;
pub mod logging;
pub mod protocol;
pub mod provider;
pub mod region;
pub mod session;
pub mod state;

/// Version of the tilebridge library.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
