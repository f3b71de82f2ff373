//! Deterministic collaborators shared by the integration tests.
//!
//! Every fake records what it was asked to do so tests can assert call
//! counts and ordering directly.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use parking_lot::Mutex;
use tokio::sync::Notify;

use tilebridge::backend::{
    BackendError, BoxFuture, Renderer, RendererConfig, RendererEvents, RendererFactory,
    SessionInfo, StorageBackend, TileProvider,
};
use tilebridge::config::BridgeConfig;
use tilebridge::coord::TileCoord;
use tilebridge::protocol::{ProtocolRegistry, RegistryError, ResourceProtocolHandler, SchemeRegistry};
use tilebridge::region::{BoundingBox, CenterPoint, RegionDescriptor};
use tilebridge::session::{SessionCollaborators, SessionController};

// ============================================================================
// Storage
// ============================================================================

/// Storage backend that logs each stage and can fail or hold any of them.
#[derive(Default)]
pub struct RecordingStorage {
    calls: Mutex<Vec<String>>,
    peer_failures: Mutex<Vec<String>>,
    acquire_failure: Mutex<Option<String>>,
    /// When set, `acquire_data_set` signals `entered` and waits on `resume`.
    hold_acquire: Mutex<bool>,
    pub entered: Notify,
    pub resume: Notify,
}

impl RecordingStorage {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Fail the next peer connection with `message`. Queued failures are
    /// consumed one per call.
    pub fn fail_peer_once(&self, message: &str) {
        self.peer_failures.lock().push(message.to_string());
    }

    pub fn fail_acquire(&self, message: &str) {
        *self.acquire_failure.lock() = Some(message.to_string());
    }

    pub fn hold_acquire(&self) {
        *self.hold_acquire.lock() = true;
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().push(call);
    }
}

impl StorageBackend for RecordingStorage {
    fn start_storage(&self) -> BoxFuture<'_, Result<(), BackendError>> {
        self.record("start_storage".to_string());
        Box::pin(async { Ok(()) })
    }

    fn connect_to_peer<'a>(
        &'a self,
        peer_id: &'a str,
        address: &'a str,
    ) -> BoxFuture<'a, Result<(), BackendError>> {
        self.record(format!("connect_to_peer {}:{}", peer_id, address));
        let failure = {
            let mut failures = self.peer_failures.lock();
            if failures.is_empty() {
                None
            } else {
                Some(failures.remove(0))
            }
        };
        Box::pin(async move {
            match failure {
                Some(message) => Err(BackendError::new(message)),
                None => Ok(()),
            }
        })
    }

    fn acquire_data_set(&self) -> BoxFuture<'_, Result<usize, BackendError>> {
        self.record("acquire_data_set".to_string());
        let failure = self.acquire_failure.lock().clone();
        let hold = *self.hold_acquire.lock();
        Box::pin(async move {
            if hold {
                self.entered.notify_one();
                self.resume.notified().await;
            }
            match failure {
                Some(message) => Err(BackendError::new(message)),
                None => Ok(3),
            }
        })
    }
}

// ============================================================================
// Tile provider
// ============================================================================

/// Provider with a fixed region list and tile table.
pub struct ScriptedProvider {
    regions: Vec<RegionDescriptor>,
    tiles: HashMap<TileCoord, Bytes>,
    failing_tiles: HashMap<TileCoord, String>,
    pub init_calls: AtomicUsize,
    pub fetch_calls: AtomicUsize,
}

impl ScriptedProvider {
    pub fn new(regions: Vec<RegionDescriptor>) -> Self {
        Self {
            regions,
            tiles: HashMap::new(),
            failing_tiles: HashMap::new(),
            init_calls: AtomicUsize::new(0),
            fetch_calls: AtomicUsize::new(0),
        }
    }

    pub fn with_tile(mut self, tile: TileCoord, data: &'static [u8]) -> Self {
        self.tiles.insert(tile, Bytes::from_static(data));
        self
    }

    pub fn with_failing_tile(mut self, tile: TileCoord, message: &str) -> Self {
        self.failing_tiles.insert(tile, message.to_string());
        self
    }

    pub fn fetches(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }
}

impl TileProvider for ScriptedProvider {
    fn init_session(&self) -> BoxFuture<'_, Result<SessionInfo, BackendError>> {
        self.init_calls.fetch_add(1, Ordering::SeqCst);
        let regions = self.regions.clone();
        Box::pin(async move { Ok(SessionInfo { regions }) })
    }

    fn fetch_tile(&self, tile: TileCoord) -> BoxFuture<'_, Result<Option<Bytes>, BackendError>> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        let result = match self.failing_tiles.get(&tile) {
            Some(message) => Err(BackendError::new(message.as_str())),
            None => Ok(self.tiles.get(&tile).cloned()),
        };
        Box::pin(async move { result })
    }
}

// ============================================================================
// Protocol registry
// ============================================================================

/// Scheme registry that counts register and unregister calls.
#[derive(Default)]
pub struct RecordingRegistry {
    pub inner: SchemeRegistry,
    pub registers: AtomicUsize,
    pub unregisters: AtomicUsize,
}

impl RecordingRegistry {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn register_count(&self) -> usize {
        self.registers.load(Ordering::SeqCst)
    }

    pub fn unregister_count(&self) -> usize {
        self.unregisters.load(Ordering::SeqCst)
    }
}

impl ProtocolRegistry for RecordingRegistry {
    fn register(
        &self,
        scheme: &str,
        handler: Arc<ResourceProtocolHandler>,
    ) -> Result<(), RegistryError> {
        self.registers.fetch_add(1, Ordering::SeqCst);
        self.inner.register(scheme, handler)
    }

    fn unregister(&self, scheme: &str) -> bool {
        self.unregisters.fetch_add(1, Ordering::SeqCst);
        self.inner.unregister(scheme)
    }
}

// ============================================================================
// Renderer
// ============================================================================

pub type TeardownHook = Arc<dyn Fn() + Send + Sync>;

/// Renderer that counts teardowns.
pub struct FakeRenderer {
    pub teardowns: AtomicUsize,
    on_teardown: Option<TeardownHook>,
}

impl Renderer for FakeRenderer {
    fn teardown(&self) {
        self.teardowns.fetch_add(1, Ordering::SeqCst);
        if let Some(hook) = &self.on_teardown {
            hook();
        }
    }
}

/// Renderer factory that keeps every renderer and event handle it hands out.
#[derive(Default)]
pub struct FakeRendererFactory {
    paint_on_create: bool,
    failure: Mutex<Option<String>>,
    on_teardown: Mutex<Option<TeardownHook>>,
    configs: Mutex<Vec<RendererConfig>>,
    events: Mutex<Vec<RendererEvents>>,
    renderers: Mutex<Vec<Arc<FakeRenderer>>>,
}

impl FakeRendererFactory {
    /// Renderers from this factory report nothing until told to.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Renderers from this factory paint during creation.
    pub fn painting() -> Arc<Self> {
        Arc::new(Self {
            paint_on_create: true,
            ..Self::default()
        })
    }

    pub fn fail_with(&self, message: &str) {
        *self.failure.lock() = Some(message.to_string());
    }

    /// Run `hook` inside every later renderer's teardown.
    pub fn on_teardown(&self, hook: TeardownHook) {
        *self.on_teardown.lock() = Some(hook);
    }

    pub fn created(&self) -> usize {
        self.renderers.lock().len()
    }

    pub fn last_config(&self) -> Option<RendererConfig> {
        self.configs.lock().last().cloned()
    }

    /// Event handle given to the `index`th renderer.
    pub fn events(&self, index: usize) -> RendererEvents {
        self.events.lock()[index].clone()
    }

    pub fn renderer(&self, index: usize) -> Arc<FakeRenderer> {
        Arc::clone(&self.renderers.lock()[index])
    }
}

impl RendererFactory for FakeRendererFactory {
    fn create(
        &self,
        config: RendererConfig,
        events: RendererEvents,
    ) -> BoxFuture<'_, Result<Arc<dyn Renderer>, BackendError>> {
        self.configs.lock().push(config);

        if let Some(message) = self.failure.lock().clone() {
            return Box::pin(async move { Err(BackendError::new(message)) });
        }

        let renderer = Arc::new(FakeRenderer {
            teardowns: AtomicUsize::new(0),
            on_teardown: self.on_teardown.lock().clone(),
        });
        self.renderers.lock().push(Arc::clone(&renderer));
        self.events.lock().push(events.clone());

        if self.paint_on_create {
            events.first_paint();
        }

        Box::pin(async move { Ok(renderer as Arc<dyn Renderer>) })
    }
}

// ============================================================================
// Fixtures
// ============================================================================

pub fn ottawa_region() -> RegionDescriptor {
    RegionDescriptor::new(
        "ottawa.pmtiles",
        "",
        BoundingBox::new(-76.5, 45.0, -75.0, 45.6),
        CenterPoint::new(-75.7, 45.4),
        0,
        14,
    )
    .unwrap()
}

pub fn square_region(id: &str, min: f64, max: f64, min_zoom: u8, max_zoom: u8) -> RegionDescriptor {
    RegionDescriptor::new(
        id,
        "",
        BoundingBox::new(min, min, max, max),
        CenterPoint::new((min + max) / 2.0, (min + max) / 2.0),
        min_zoom,
        max_zoom,
    )
    .unwrap()
}

/// A controller wired to the given fakes with default configuration.
pub struct Harness {
    pub controller: Arc<SessionController>,
    pub storage: Arc<RecordingStorage>,
    pub provider: Arc<ScriptedProvider>,
    pub registry: Arc<RecordingRegistry>,
    pub factory: Arc<FakeRendererFactory>,
}

impl Harness {
    pub fn new(provider: ScriptedProvider, factory: Arc<FakeRendererFactory>) -> Self {
        Self::with_storage(RecordingStorage::new(), provider, factory)
    }

    pub fn with_storage(
        storage: Arc<RecordingStorage>,
        provider: ScriptedProvider,
        factory: Arc<FakeRendererFactory>,
    ) -> Self {
        let provider = Arc::new(provider);
        let registry = RecordingRegistry::new();
        let collaborators = SessionCollaborators {
            storage: storage.clone(),
            provider: provider.clone(),
            registry: registry.clone(),
            renderer_factory: factory.clone(),
        };
        let controller = Arc::new(SessionController::new(
            &BridgeConfig::default(),
            collaborators,
        ));

        Self {
            controller,
            storage,
            provider,
            registry,
            factory,
        }
    }
}
