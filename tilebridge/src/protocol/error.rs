//! Protocol error types.
//!
//! Every variant is local to the request that raised it. None of them
//! touches the session state.

use thiserror::Error;

use crate::backend::BackendError;

/// Errors returned to the renderer for a single resource request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// The request's cancellation signal was already set.
    #[error("Request aborted")]
    Cancelled,

    /// The provider session has not been opened.
    #[error("Tile session not initialized")]
    NotInitialized,

    /// The URL does not match `<scheme>://<source>/<z>/<x>/<y>`.
    #[error("Invalid tile address: {0}")]
    AddressParse(String),

    /// The provider call itself failed.
    #[error("Failed to get tile: {0}")]
    Provider(#[from] BackendError),

    /// No handler is registered for the URL's scheme.
    #[error("No protocol handler registered for '{0}'")]
    UnknownScheme(String),
}
