//! Multi-region tile provider.
//!
//! Combines several single-region tile sources into one [`TileProvider`].
//! Opening the session opens every region; a region that fails to open is
//! logged and left out, and the session fails only if no region opens.
//!
//! Tile lookups consult only the regions whose bounds intersect the tile,
//! in the order the sources were added. The first region with data wins.
//!
//! # Example
//!
//! ```ignore
//! use tilebridge::provider::MultiRegionProvider;
//!
//! let provider = MultiRegionProvider::new(vec![ottawa_source, gatineau_source]);
//! let info = provider.init_session().await?;
//! let tile = provider.fetch_tile(TileCoord::new(12, 1186, 1466)).await?;
//! ```

use std::sync::Arc;

use bytes::Bytes;
use parking_lot::RwLock;
use tracing::{info, warn};

use crate::backend::{BackendError, BoxFuture, SessionInfo, TileProvider};
use crate::coord::TileCoord;
use crate::region::{BoundingBox, RegionDescriptor};

/// One region's tiles.
pub trait RegionTileSource: Send + Sync {
    /// Label used in logs before the region has been opened.
    fn name(&self) -> &str;

    /// Open the region and describe it.
    fn open(&self) -> BoxFuture<'_, Result<RegionDescriptor, BackendError>>;

    /// Fetch a tile from this region only.
    fn fetch_tile(&self, tile: TileCoord) -> BoxFuture<'_, Result<Option<Bytes>, BackendError>>;
}

/// An opened region and its extent.
struct OpenRegion {
    id: String,
    bounds: BoundingBox,
    source: Arc<dyn RegionTileSource>,
}

/// Routes tile requests across several regions.
pub struct MultiRegionProvider {
    sources: Vec<Arc<dyn RegionTileSource>>,
    open: RwLock<Vec<Arc<OpenRegion>>>,
}

impl MultiRegionProvider {
    pub fn new(sources: Vec<Arc<dyn RegionTileSource>>) -> Self {
        Self {
            sources,
            open: RwLock::new(Vec::new()),
        }
    }

    /// Number of regions opened by the last `init_session`.
    pub fn open_region_count(&self) -> usize {
        self.open.read().len()
    }

    async fn open_all(&self) -> Result<SessionInfo, BackendError> {
        let mut opened = Vec::new();
        let mut regions = Vec::new();

        for source in &self.sources {
            match source.open().await {
                Ok(descriptor) => {
                    opened.push(Arc::new(OpenRegion {
                        id: descriptor.id().to_string(),
                        bounds: descriptor.bounds(),
                        source: Arc::clone(source),
                    }));
                    regions.push(descriptor);
                }
                Err(e) => {
                    warn!(region = source.name(), error = %e, "Skipping region that failed to open");
                }
            }
        }

        if regions.is_empty() {
            return Err(BackendError::new("No valid regions found"));
        }

        info!(
            opened = regions.len(),
            configured = self.sources.len(),
            "Region sources opened"
        );
        *self.open.write() = opened;

        Ok(SessionInfo { regions })
    }

    async fn route(&self, tile: TileCoord) -> Result<Option<Bytes>, BackendError> {
        let tile_bounds = tile.bounds();

        // Snapshot the candidates so the lock is not held across awaits
        let candidates: Vec<Arc<OpenRegion>> = self
            .open
            .read()
            .iter()
            .filter(|region| region.bounds.intersects(&tile_bounds))
            .cloned()
            .collect();

        for region in candidates {
            match region.source.fetch_tile(tile).await {
                Ok(Some(data)) => return Ok(Some(data)),
                Ok(None) => continue,
                Err(e) => {
                    warn!(region = %region.id, %tile, error = %e, "Region failed to serve tile");
                    continue;
                }
            }
        }

        Ok(None)
    }
}

impl TileProvider for MultiRegionProvider {
    fn init_session(&self) -> BoxFuture<'_, Result<SessionInfo, BackendError>> {
        Box::pin(self.open_all())
    }

    fn fetch_tile(&self, tile: TileCoord) -> BoxFuture<'_, Result<Option<Bytes>, BackendError>> {
        Box::pin(self.route(tile))
    }
}
