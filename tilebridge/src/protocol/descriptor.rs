//! Tile-source descriptor returned for metadata requests.

use serde::Serialize;

use crate::region::AggregateDescriptor;

/// A TileJSON-style document describing the tile source.
///
/// Serializes to:
///
/// ```text
/// { "tiles": ["<url>/{z}/{x}/{y}"], "minzoom": 0, "maxzoom": 14,
///   "bounds": [minLon, minLat, maxLon, maxLat] }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TileSourceDescriptor {
    pub tiles: Vec<String>,
    pub minzoom: u8,
    pub maxzoom: u8,
    pub bounds: [f64; 4],
}

impl TileSourceDescriptor {
    /// Build the descriptor for a request URL from the session aggregate.
    ///
    /// Zoom range and bounds are copied verbatim from `aggregate`.
    pub fn new(request_url: &str, aggregate: &AggregateDescriptor) -> Self {
        Self {
            tiles: vec![format!("{}/{{z}}/{{x}}/{{y}}", request_url)],
            minzoom: aggregate.min_zoom,
            maxzoom: aggregate.max_zoom,
            bounds: aggregate.bounds.to_array(),
        }
    }
}
