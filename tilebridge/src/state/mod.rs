//! Observable session state.
//!
//! [`StateStore`] is the single holder of readiness, the session error
//! message, the session-initialized flag, the session's regions, the camera
//! and a non-owning reference to the live renderer. Anyone may read it or subscribe to
//! changes; only the session controller and the protocol handler inside this
//! crate may write to it.
//!
//! Every write is applied through one `watch` update, so a subscriber never
//! observes a state where, say, readiness is `Error` but the message is
//! still empty.
//!
//! # Example
//!
//! ```ignore
//! let store = Arc::new(StateStore::new());
//! let mut changes = store.subscribe();
//!
//! tokio::spawn(async move {
//!     while changes.changed().await.is_ok() {
//!         let snapshot = changes.borrow().clone();
//!         println!("readiness: {}", snapshot.readiness);
//!     }
//! });
//! ```

use std::fmt;
use std::sync::{Arc, Weak};

use tokio::sync::watch;

use crate::backend::Renderer;
use crate::region::{CenterPoint, RegionDescriptor};

/// Default zoom the camera starts at before a renderer reports otherwise.
pub const DEFAULT_ZOOM: f64 = 2.0;

/// Lifecycle status of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ReadinessState {
    /// No session. Initial state and the only state `reset()` produces.
    #[default]
    Idle,
    /// Bootstrap in progress, or waiting for the renderer's first paint.
    Loading,
    /// Renderer has painted; tiles are being served.
    Ready,
    /// A bootstrap stage or the renderer failed. See the session error.
    Error,
}

impl fmt::Display for ReadinessState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ReadinessState::Idle => "idle",
            ReadinessState::Loading => "loading",
            ReadinessState::Ready => "ready",
            ReadinessState::Error => "error",
        };
        f.write_str(s)
    }
}

/// Last camera position reported by the renderer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub center: CenterPoint,
    pub zoom: f64,
}

/// Point-in-time copy of the session state.
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    /// Current lifecycle status.
    pub readiness: ReadinessState,
    /// Failure message. `Some` only while `readiness` is `Error`.
    pub error: Option<String>,
    /// Whether the provider session is open and may be queried.
    pub session_initialized: bool,
    /// Regions of the open session, in provider order. Empty when no
    /// session is open.
    pub regions: Vec<RegionDescriptor>,
    /// Camera position.
    pub camera: Camera,
    renderer: Option<Weak<dyn Renderer>>,
}

impl SessionSnapshot {
    fn initial(initial_zoom: f64) -> Self {
        Self {
            readiness: ReadinessState::Idle,
            error: None,
            session_initialized: false,
            regions: Vec::new(),
            camera: Camera {
                center: CenterPoint::default(),
                zoom: initial_zoom,
            },
            renderer: None,
        }
    }

    /// The live renderer, if one is attached and still alive.
    pub fn renderer(&self) -> Option<Arc<dyn Renderer>> {
        self.renderer.as_ref().and_then(Weak::upgrade)
    }

    /// Whether a renderer reference is held.
    pub fn has_renderer(&self) -> bool {
        self.renderer.is_some()
    }

    fn is_initial(&self, initial_zoom: f64) -> bool {
        self.readiness == ReadinessState::Idle
            && self.error.is_none()
            && !self.session_initialized
            && self.regions.is_empty()
            && self.renderer.is_none()
            && self.camera.center == CenterPoint::default()
            && self.camera.zoom == initial_zoom
    }
}

/// Process-wide session state holder.
///
/// Share it as `Arc<StateStore>` between the session controller, the
/// protocol handler and any presentation code.
pub struct StateStore {
    tx: watch::Sender<SessionSnapshot>,
    initial_zoom: f64,
}

impl StateStore {
    /// Create a store in the idle state with the default camera zoom.
    pub fn new() -> Self {
        Self::with_initial_zoom(DEFAULT_ZOOM)
    }

    /// Create a store whose camera starts (and resets) at `initial_zoom`.
    pub fn with_initial_zoom(initial_zoom: f64) -> Self {
        let (tx, _rx) = watch::channel(SessionSnapshot::initial(initial_zoom));
        Self { tx, initial_zoom }
    }

    /// Current state.
    pub fn get(&self) -> SessionSnapshot {
        self.tx.borrow().clone()
    }

    pub fn readiness(&self) -> ReadinessState {
        self.tx.borrow().readiness
    }

    pub fn error(&self) -> Option<String> {
        self.tx.borrow().error.clone()
    }

    pub fn is_session_initialized(&self) -> bool {
        self.tx.borrow().session_initialized
    }

    /// Regions of the open session.
    pub fn regions(&self) -> Vec<RegionDescriptor> {
        self.tx.borrow().regions.clone()
    }

    pub fn camera(&self) -> Camera {
        self.tx.borrow().camera
    }

    /// Subscribe to state changes.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.tx.subscribe()
    }

    /// Enter `Loading`, clearing anything left by a previous session.
    pub(crate) fn begin_loading(&self) {
        self.tx.send_modify(|s| {
            s.readiness = ReadinessState::Loading;
            s.error = None;
            s.session_initialized = false;
            s.regions.clear();
            s.renderer = None;
        });
    }

    /// Enter `Error` with `message`, dropping the session handle.
    ///
    /// Used when startup fails. See [`renderer_failed`](Self::renderer_failed)
    /// for errors raised by a running renderer.
    pub(crate) fn fail(&self, message: impl Into<String>) {
        let message = message.into();
        self.tx.send_modify(|s| {
            s.readiness = ReadinessState::Error;
            s.error = Some(message);
            s.session_initialized = false;
            s.regions.clear();
        });
    }

    /// Enter `Error` with `message`, keeping the session open so tiles
    /// are still served.
    pub(crate) fn renderer_failed(&self, message: impl Into<String>) {
        let message = message.into();
        self.tx.send_modify(|s| {
            s.readiness = ReadinessState::Error;
            s.error = Some(message);
        });
    }

    /// Move `Loading` to `Ready`. Returns `false` and changes nothing from
    /// any other state.
    pub(crate) fn mark_ready(&self) -> bool {
        self.tx.send_if_modified(|s| {
            if s.readiness != ReadinessState::Loading {
                return false;
            }
            s.readiness = ReadinessState::Ready;
            s.error = None;
            true
        })
    }

    /// Mark the session open and record its regions.
    pub(crate) fn open_session(&self, regions: Vec<RegionDescriptor>) {
        self.tx.send_modify(|s| {
            s.session_initialized = true;
            s.regions = regions;
        });
    }

    pub(crate) fn attach_renderer(&self, renderer: &Arc<dyn Renderer>) {
        let weak = Arc::downgrade(renderer);
        self.tx.send_modify(|s| s.renderer = Some(weak));
    }

    pub(crate) fn set_camera(&self, camera: Camera) {
        self.tx.send_if_modified(|s| {
            let changed = s.camera != camera;
            s.camera = camera;
            changed
        });
    }

    /// Return every field to its default in one update.
    ///
    /// Subscribers are not notified when the store is already in its
    /// initial state.
    pub(crate) fn reset(&self) {
        let initial_zoom = self.initial_zoom;
        self.tx.send_if_modified(|s| {
            if s.is_initial(initial_zoom) {
                return false;
            }
            *s = SessionSnapshot::initial(initial_zoom);
            true
        });
    }
}

impl Default for StateStore {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for StateStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateStore")
            .field("state", &*self.tx.borrow())
            .finish()
    }
}
