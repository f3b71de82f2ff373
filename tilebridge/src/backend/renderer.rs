//! Renderer collaborator interface.

use std::sync::Arc;

use serde::Serialize;

use super::{BackendError, BoxFuture};
use crate::region::{AggregateDescriptor, CenterPoint};
use crate::session::RendererEvents;

/// What the renderer is built from.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RendererConfig {
    /// Source id the renderer's style refers to.
    pub source_id: String,
    /// Descriptor URL for the tile source, `<scheme>://<source>`.
    pub source_url: String,
    /// Combined extent of the session's regions.
    pub aggregate: AggregateDescriptor,
    /// Initial camera center.
    pub center: CenterPoint,
    /// Initial camera zoom.
    pub zoom: f64,
}

/// A live renderer instance.
pub trait Renderer: Send + Sync {
    /// Release the renderer. Called at most once, by `stop()`.
    fn teardown(&self);
}

/// Builds renderer instances.
///
/// The factory receives a [`RendererEvents`] handle. The renderer calls
/// [`RendererEvents::first_paint`] once its first frame is on screen and
/// [`RendererEvents::failed`] if it cannot load; the session stays in
/// `Loading` until one of them arrives.
pub trait RendererFactory: Send + Sync {
    fn create(
        &self,
        config: RendererConfig,
        events: RendererEvents,
    ) -> BoxFuture<'_, Result<Arc<dyn Renderer>, BackendError>>;
}
