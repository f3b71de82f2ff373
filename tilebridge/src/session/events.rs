//! Callback handle the renderer uses to report back.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::region::CenterPoint;
use crate::state::{Camera, StateStore};

/// Renderer-to-session signals for one start attempt.
///
/// Each handle is bound to the attempt that created the renderer. Once that
/// attempt is stopped or superseded, its signals are ignored, so a renderer
/// that paints late cannot flip a newer session to `Ready`.
#[derive(Clone)]
pub struct RendererEvents {
    store: Arc<StateStore>,
    generation: u64,
    current: Arc<AtomicU64>,
}

impl RendererEvents {
    pub(crate) fn new(store: Arc<StateStore>, generation: u64, current: Arc<AtomicU64>) -> Self {
        Self {
            store,
            generation,
            current,
        }
    }

    fn is_current(&self) -> bool {
        self.current.load(Ordering::Acquire) == self.generation
    }

    /// The renderer finished its first paint.
    pub fn first_paint(&self) {
        if !self.is_current() {
            debug!(generation = self.generation, "Ignoring first paint from stale renderer");
            return;
        }
        if self.store.mark_ready() {
            info!(generation = self.generation, "Renderer painted, session ready");
        }
    }

    /// The renderer hit an error.
    ///
    /// The session moves to `Error` but stays open; tiles are served until
    /// `stop()`.
    pub fn failed(&self, message: impl Into<String>) {
        let message = message.into();
        if !self.is_current() {
            debug!(generation = self.generation, %message, "Ignoring failure from stale renderer");
            return;
        }
        warn!(generation = self.generation, %message, "Renderer reported an error");
        self.store.renderer_failed(message);
    }

    /// The camera moved.
    pub fn camera_moved(&self, center: CenterPoint, zoom: f64) {
        if self.is_current() {
            self.store.set_camera(Camera { center, zoom });
        }
    }
}

impl std::fmt::Debug for RendererEvents {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RendererEvents")
            .field("generation", &self.generation)
            .finish()
    }
}
