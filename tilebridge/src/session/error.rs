//! Session bootstrap errors.

use thiserror::Error;

use crate::backend::BackendError;
use crate::protocol::RegistryError;
use crate::region::RegionError;
use crate::state::ReadinessState;

/// Errors that end a start attempt.
///
/// Stage failures are terminal for the attempt and are never retried. The
/// user-facing text stored as the session error is [`message`](Self::message),
/// which is the collaborator's own failure text.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InitializationError {
    /// Local storage did not start.
    #[error("Failed to start storage: {0}")]
    StorageStart(BackendError),

    /// The data peer could not be reached.
    #[error("Failed to connect to peer {peer}: {source}")]
    PeerConnection { peer: String, source: BackendError },

    /// The region data set could not be acquired.
    #[error("Failed to acquire region data: {0}")]
    DataAcquisition(BackendError),

    /// The provider session did not open.
    #[error("Failed to initialize tile session: {0}")]
    SessionInit(BackendError),

    /// Region metadata could not be combined.
    #[error("Failed to combine region metadata: {0}")]
    Aggregation(#[from] RegionError),

    /// The protocol handler could not be registered.
    #[error("{0}")]
    ProtocolRegistration(#[from] RegistryError),

    /// The renderer could not be created.
    #[error("Failed to create renderer: {0}")]
    RendererCreation(BackendError),

    /// A session is already loading or running.
    #[error("Session already {0}")]
    AlreadyActive(ReadinessState),

    /// `stop()` ran while this attempt was in flight.
    #[error("Session start aborted")]
    Aborted,
}

impl InitializationError {
    /// Text surfaced as the session error.
    pub fn message(&self) -> String {
        match self {
            InitializationError::StorageStart(e)
            | InitializationError::DataAcquisition(e)
            | InitializationError::SessionInit(e)
            | InitializationError::RendererCreation(e) => e.message().to_string(),
            InitializationError::PeerConnection { source, .. } => source.message().to_string(),
            InitializationError::Aggregation(e) => e.to_string(),
            InitializationError::ProtocolRegistration(e) => e.to_string(),
            InitializationError::AlreadyActive(_) | InitializationError::Aborted => {
                self.to_string()
            }
        }
    }
}
