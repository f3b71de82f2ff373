//! Capability interfaces for the collaborators this crate drives but does
//! not implement.
//!
//! The session controller talks to three external parties:
//!
//! - a [`StorageBackend`] that starts local storage, connects to a data peer
//!   and acquires the region data set,
//! - a [`TileProvider`] that opens the data set and serves raw tile bytes,
//! - a [`RendererFactory`] that builds the map renderer once tiles can be
//!   served.
//!
//! All async methods return a [`BoxFuture`] so the traits stay
//! dyn-compatible and can be held as `Arc<dyn ...>`. Production
//! implementations wrap the real backend; tests use deterministic fakes.

mod renderer;

pub use crate::session::RendererEvents;
pub use renderer::{Renderer, RendererConfig, RendererFactory};

use std::future::Future;
use std::pin::Pin;

use bytes::Bytes;
use thiserror::Error;

use crate::coord::TileCoord;
use crate::region::RegionDescriptor;

/// Boxed future type for dyn-compatible async methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A failure reported by an external collaborator.
///
/// Displays as the collaborator's own message, unchanged, so it can be
/// surfaced to the user as-is.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct BackendError(String);

impl BackendError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }

    pub fn message(&self) -> &str {
        &self.0
    }
}

impl From<String> for BackendError {
    fn from(message: String) -> Self {
        Self(message)
    }
}

impl From<&str> for BackendError {
    fn from(message: &str) -> Self {
        Self(message.to_string())
    }
}

/// Storage, peer connectivity and data acquisition.
///
/// The controller calls each method at most once per start attempt, in
/// declaration order.
pub trait StorageBackend: Send + Sync {
    /// Bring up local storage.
    fn start_storage(&self) -> BoxFuture<'_, Result<(), BackendError>>;

    /// Connect to the peer that holds the region data set.
    fn connect_to_peer<'a>(
        &'a self,
        peer_id: &'a str,
        address: &'a str,
    ) -> BoxFuture<'a, Result<(), BackendError>>;

    /// Fetch the region data set. Returns the number of items acquired.
    fn acquire_data_set(&self) -> BoxFuture<'_, Result<usize, BackendError>>;
}

/// What the provider reports once its session is open.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionInfo {
    pub regions: Vec<RegionDescriptor>,
}

/// Region metadata and raw tile bytes.
pub trait TileProvider: Send + Sync {
    /// Open the data set and describe its regions.
    fn init_session(&self) -> BoxFuture<'_, Result<SessionInfo, BackendError>>;

    /// Fetch one tile.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(bytes))` if the tile exists
    /// - `Ok(None)` if no region holds this tile
    /// - `Err(_)` if the fetch itself failed
    fn fetch_tile(&self, tile: TileCoord) -> BoxFuture<'_, Result<Option<Bytes>, BackendError>>;
}
