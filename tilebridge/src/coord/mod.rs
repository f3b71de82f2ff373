//! Tile coordinate types.
//!
//! Provides the `(z, x, y)` tile address used by the resource protocol and
//! the conversion from a tile address back to the geographic area it covers
//! in the Web Mercator grid.

use std::f64::consts::PI;
use std::fmt;

use crate::region::BoundingBox;

/// A tile address in the slippy-map grid.
///
/// All three components are non-negative. No range check is applied here:
/// whether `x` and `y` fall inside the grid at zoom `z` is the provider's
/// concern.
///
/// # Example
///
/// ```
/// use tilebridge::coord::TileCoord;
///
/// let tile = TileCoord::new(14, 4680, 5951);
/// assert_eq!(tile.to_string(), "14/4680/5951");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileCoord {
    /// Zoom level
    pub z: u32,
    /// Column, increasing eastward
    pub x: u32,
    /// Row, increasing southward
    pub y: u32,
}

impl TileCoord {
    /// Create a new tile coordinate.
    pub fn new(z: u32, x: u32, y: u32) -> Self {
        Self { z, x, y }
    }

    /// Geographic bounds covered by this tile.
    ///
    /// West/east come straight from the column; north/south use the inverse
    /// Web Mercator projection on the row edges.
    #[inline]
    pub fn bounds(&self) -> BoundingBox {
        let n = 2.0_f64.powi(self.z.min(i32::MAX as u32) as i32);

        let min_lon = self.x as f64 / n * 360.0 - 180.0;
        let max_lon = (self.x as f64 + 1.0) / n * 360.0 - 180.0;

        let max_lat = row_edge_latitude(self.y as f64, n);
        let min_lat = row_edge_latitude(self.y as f64 + 1.0, n);

        BoundingBox {
            min_lon,
            min_lat,
            max_lon,
            max_lat,
        }
    }
}

impl fmt::Display for TileCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.z, self.x, self.y)
    }
}

/// Latitude of the northern edge of `row` in a grid of `n` rows.
fn row_edge_latitude(row: f64, n: f64) -> f64 {
    let lat_rad = (PI * (1.0 - 2.0 * row / n)).sinh().atan();
    lat_rad * 180.0 / PI
}
