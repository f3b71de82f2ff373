//! Scheme registration.
//!
//! A renderer resolves custom-scheme URLs through a process-wide table of
//! handlers. [`ProtocolRegistry`] abstracts that table; [`SchemeRegistry`]
//! is the in-process implementation. [`ProtocolRegistration`] ties a
//! registration to a value's lifetime so every teardown path releases it.

use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::error::ProtocolError;
use super::handler::{ResourceProtocolHandler, ResourceRequest, ResourceResponse};

/// Registration failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// A handler already owns this scheme.
    #[error("Protocol '{0}' is already registered")]
    AlreadyRegistered(String),
}

/// Table of custom-scheme handlers.
pub trait ProtocolRegistry: Send + Sync {
    /// Install `handler` for `scheme`.
    fn register(
        &self,
        scheme: &str,
        handler: Arc<ResourceProtocolHandler>,
    ) -> Result<(), RegistryError>;

    /// Remove the handler for `scheme`. Returns whether one was installed.
    fn unregister(&self, scheme: &str) -> bool;
}

/// In-process handler table.
#[derive(Default)]
pub struct SchemeRegistry {
    handlers: DashMap<String, Arc<ResourceProtocolHandler>>,
}

impl SchemeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_registered(&self, scheme: &str) -> bool {
        self.handlers.contains_key(scheme)
    }

    /// Route a request to the handler for its URL's scheme.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::UnknownScheme`] if the URL has no scheme or
    /// no handler owns it; otherwise whatever the handler returns.
    pub async fn dispatch(
        &self,
        request: &ResourceRequest,
        cancel: &CancellationToken,
    ) -> Result<ResourceResponse, ProtocolError> {
        let scheme = request
            .url
            .split_once("://")
            .map(|(scheme, _)| scheme)
            .ok_or_else(|| ProtocolError::UnknownScheme(request.url.clone()))?;

        // Clone out of the map so no shard lock is held across the await
        let handler = self
            .handlers
            .get(scheme)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| ProtocolError::UnknownScheme(scheme.to_string()))?;

        handler.handle(request, cancel).await
    }
}

impl ProtocolRegistry for SchemeRegistry {
    fn register(
        &self,
        scheme: &str,
        handler: Arc<ResourceProtocolHandler>,
    ) -> Result<(), RegistryError> {
        match self.handlers.entry(scheme.to_string()) {
            Entry::Occupied(_) => Err(RegistryError::AlreadyRegistered(scheme.to_string())),
            Entry::Vacant(slot) => {
                slot.insert(handler);
                Ok(())
            }
        }
    }

    fn unregister(&self, scheme: &str) -> bool {
        self.handlers.remove(scheme).is_some()
    }
}

/// A live scheme registration.
///
/// Unregisters exactly once: on [`release`](Self::release) or on drop,
/// whichever comes first.
pub struct ProtocolRegistration {
    registry: Arc<dyn ProtocolRegistry>,
    scheme: String,
    released: bool,
}

impl ProtocolRegistration {
    /// Register `handler` and return the guard that will undo it.
    pub fn acquire(
        registry: Arc<dyn ProtocolRegistry>,
        handler: Arc<ResourceProtocolHandler>,
    ) -> Result<Self, RegistryError> {
        let scheme = handler.scheme().to_string();
        registry.register(&scheme, handler)?;
        info!(scheme = %scheme, "Protocol handler registered");

        Ok(Self {
            registry,
            scheme,
            released: false,
        })
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// Unregister now.
    pub fn release(mut self) {
        self.release_inner();
    }

    fn release_inner(&mut self) {
        if self.released {
            return;
        }
        self.released = true;

        if self.registry.unregister(&self.scheme) {
            info!(scheme = %self.scheme, "Protocol handler unregistered");
        } else {
            debug!(scheme = %self.scheme, "Protocol handler was already gone");
        }
    }
}

impl Drop for ProtocolRegistration {
    fn drop(&mut self) {
        self.release_inner();
    }
}
