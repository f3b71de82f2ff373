//! Session lifecycle controller.
//!
//! # Startup Sequence
//!
//! 1. Local storage starts
//! 2. The configured data peer is connected
//! 3. The region data set is acquired
//! 4. The provider session opens and the session is marked initialized
//! 5. Region metadata is combined into one extent
//! 6. The protocol handler is registered for the configured scheme
//! 7. The renderer is created and attached
//!
//! The session then stays `Loading` until the renderer reports its first
//! paint. The first stage to fail ends the attempt: the session moves to
//! `Error` with the collaborator's message, and anything registered by the
//! attempt is released.
//!
//! # Example
//!
//! ```ignore
//! use tilebridge::session::{SessionCollaborators, SessionController};
//!
//! let controller = SessionController::new(&config, collaborators);
//! let mut changes = controller.store().subscribe();
//!
//! controller.start().await?;
//! // ... renderer paints, readiness becomes `ready` ...
//! controller.stop();
//! ```

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use super::error::InitializationError;
use super::events::RendererEvents;
use crate::backend::{Renderer, RendererConfig, RendererFactory, StorageBackend, TileProvider};
use crate::config::{BridgeConfig, PeerSpec, ProtocolSettings};
use crate::protocol::{ProtocolRegistration, ProtocolRegistry, ResourceProtocolHandler};
use crate::region::{aggregate, AggregateDescriptor};
use crate::state::{ReadinessState, StateStore};

/// The external parties a session drives.
#[derive(Clone)]
pub struct SessionCollaborators {
    pub storage: Arc<dyn StorageBackend>,
    pub provider: Arc<dyn TileProvider>,
    pub registry: Arc<dyn ProtocolRegistry>,
    pub renderer_factory: Arc<dyn RendererFactory>,
}

/// Resources owned by the current attempt.
#[derive(Default)]
struct ActiveSession {
    attempt: Option<CancellationToken>,
    registration: Option<ProtocolRegistration>,
    renderer: Option<Arc<dyn Renderer>>,
}

/// Starts and stops the map session.
///
/// The controller is the only writer of lifecycle state. Share the
/// [`StateStore`] returned by [`store`](Self::store) with presentation code.
pub struct SessionController {
    protocol: ProtocolSettings,
    peer: PeerSpec,
    initial_zoom: f64,
    collaborators: SessionCollaborators,
    store: Arc<StateStore>,
    /// Bumped on every start and stop; renderer signals from older values
    /// are ignored.
    generation: Arc<AtomicU64>,
    active: Mutex<ActiveSession>,
}

impl SessionController {
    /// Create an idle controller.
    pub fn new(config: &BridgeConfig, collaborators: SessionCollaborators) -> Self {
        Self {
            protocol: config.protocol.clone(),
            peer: config.peer.clone(),
            initial_zoom: config.renderer.initial_zoom,
            collaborators,
            store: Arc::new(StateStore::with_initial_zoom(config.renderer.initial_zoom)),
            generation: Arc::new(AtomicU64::new(0)),
            active: Mutex::new(ActiveSession::default()),
        }
    }

    /// The observable session state.
    pub fn store(&self) -> &Arc<StateStore> {
        &self.store
    }

    /// Run the startup sequence.
    ///
    /// Returns once the renderer has been created; readiness becomes `Ready`
    /// later, when the renderer reports its first paint. Starting from
    /// `Error` is allowed and re-runs the whole sequence.
    ///
    /// # Errors
    ///
    /// - [`InitializationError::AlreadyActive`] if a session is loading or
    ///   ready; nothing is touched
    /// - [`InitializationError::Aborted`] if [`stop`](Self::stop) ran while
    ///   the attempt was in flight; the state `stop()` left is kept
    /// - any stage error, after the session has moved to `Error`
    pub async fn start(&self) -> Result<(), InitializationError> {
        let (attempt, generation, residue) = {
            let mut active = self.active.lock();
            let readiness = self.store.readiness();
            if matches!(readiness, ReadinessState::Loading | ReadinessState::Ready) {
                debug!(%readiness, "Start ignored, session already active");
                return Err(InitializationError::AlreadyActive(readiness));
            }

            // Anything left from a renderer failure after startup
            let residue = std::mem::take(&mut *active);

            let attempt = CancellationToken::new();
            active.attempt = Some(attempt.clone());
            let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
            self.store.begin_loading();
            (attempt, generation, residue)
        };
        release(residue);

        info!(generation, "Starting session");

        let result = self.bootstrap(&attempt, generation).await;
        match result {
            Ok(()) => {
                info!(generation, "Session started, waiting for first paint");
                Ok(())
            }
            Err(InitializationError::Aborted) => {
                info!(generation, "Session start aborted");
                Err(InitializationError::Aborted)
            }
            Err(e) => {
                let residue = {
                    let mut active = self.active.lock();
                    if attempt.is_cancelled() {
                        // stop() already cleaned up after this attempt
                        return Err(InitializationError::Aborted);
                    }
                    self.store.fail(e.message());
                    std::mem::take(&mut *active)
                };
                release(residue);

                error!(generation, error = %e, "Session start failed");
                Err(e)
            }
        }
    }

    /// Tear the session down and return to `Idle`.
    ///
    /// Never fails and is safe to call repeatedly. An in-flight
    /// [`start`](Self::start) is aborted. The protocol handler is
    /// unregistered and the renderer torn down at most once each.
    ///
    /// The renderer's teardown runs after the controller lock is released,
    /// so it may call back into the controller.
    pub fn stop(&self) {
        let (renderer, had_session) = {
            let mut active = self.active.lock();

            if let Some(attempt) = active.attempt.take() {
                attempt.cancel();
            }
            self.generation.fetch_add(1, Ordering::AcqRel);

            let had_session = active.registration.is_some() || active.renderer.is_some();
            if let Some(registration) = active.registration.take() {
                registration.release();
            }
            let renderer = active.renderer.take();
            self.store.reset();
            (renderer, had_session)
        };

        if let Some(renderer) = renderer {
            renderer.teardown();
            debug!("Renderer torn down");
        }
        if had_session {
            info!("Session stopped");
        }
    }

    async fn bootstrap(
        &self,
        attempt: &CancellationToken,
        generation: u64,
    ) -> Result<(), InitializationError> {
        let c = &self.collaborators;

        info!(stage = "storage", "Starting local storage");
        guard(attempt, c.storage.start_storage())
            .await?
            .map_err(InitializationError::StorageStart)?;

        info!(stage = "peer", peer = %self.peer, "Connecting to data peer");
        let peer = &self.peer;
        guard(attempt, c.storage.connect_to_peer(&peer.peer_id, &peer.address))
            .await?
            .map_err(|source| InitializationError::PeerConnection {
                peer: peer.peer_id.clone(),
                source,
            })?;

        info!(stage = "data", "Acquiring region data set");
        let items = guard(attempt, c.storage.acquire_data_set())
            .await?
            .map_err(InitializationError::DataAcquisition)?;
        debug!(items, "Region data set acquired");

        info!(stage = "session", "Opening tile session");
        let session = guard(attempt, c.provider.init_session())
            .await?
            .map_err(InitializationError::SessionInit)?;
        let regions = session.regions.clone();
        self.commit(attempt, |_| self.store.open_session(regions))?;

        let extent = aggregate(&session.regions)?;
        info!(
            stage = "aggregate",
            regions = session.regions.len(),
            min_zoom = extent.min_zoom,
            max_zoom = extent.max_zoom,
            "Region metadata combined"
        );

        info!(stage = "protocol", scheme = %self.protocol.scheme, "Registering protocol handler");
        let handler = Arc::new(ResourceProtocolHandler::new(
            &self.protocol.scheme,
            Arc::clone(&c.provider),
            Arc::clone(&self.store),
            extent,
        ));
        let registration = ProtocolRegistration::acquire(Arc::clone(&c.registry), handler)?;
        // On abort the registration drops here and unregisters
        self.commit(attempt, |active| active.registration = Some(registration))?;

        info!(stage = "renderer", "Creating renderer");
        let events = RendererEvents::new(
            Arc::clone(&self.store),
            generation,
            Arc::clone(&self.generation),
        );
        let config = self.renderer_config(extent);
        let renderer = guard(attempt, c.renderer_factory.create(config, events))
            .await?
            .map_err(InitializationError::RendererCreation)?;

        let attached = self.commit(attempt, |active| {
            self.store.attach_renderer(&renderer);
            active.renderer = Some(Arc::clone(&renderer));
        });
        if attached.is_err() {
            renderer.teardown();
        }
        attached
    }

    fn renderer_config(&self, extent: AggregateDescriptor) -> RendererConfig {
        RendererConfig {
            source_id: self.protocol.source.clone(),
            source_url: self.protocol.source_url(),
            aggregate: extent,
            center: extent.center,
            zoom: self.initial_zoom,
        }
    }

    /// Apply a write for `attempt` unless `stop()` has already run.
    fn commit(
        &self,
        attempt: &CancellationToken,
        apply: impl FnOnce(&mut ActiveSession),
    ) -> Result<(), InitializationError> {
        let mut active = self.active.lock();
        if attempt.is_cancelled() {
            return Err(InitializationError::Aborted);
        }
        apply(&mut active);
        Ok(())
    }
}

impl Drop for SessionController {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Race a stage against the attempt's cancellation.
async fn guard<T>(
    attempt: &CancellationToken,
    stage: impl Future<Output = T>,
) -> Result<T, InitializationError> {
    tokio::select! {
        biased;
        _ = attempt.cancelled() => Err(InitializationError::Aborted),
        output = stage => Ok(output),
    }
}

/// Unregister the protocol handler, then tear the renderer down.
fn release(session: ActiveSession) {
    if let Some(attempt) = session.attempt {
        attempt.cancel();
    }
    if let Some(registration) = session.registration {
        registration.release();
    }
    if let Some(renderer) = session.renderer {
        renderer.teardown();
        debug!("Renderer torn down");
    }
}
