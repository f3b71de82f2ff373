//! Region descriptors and multi-region aggregation.
//!
//! A region is one named geographic data set served by the provider. Each
//! session produces one descriptor per region, which the
//! [`aggregate`](aggregate::aggregate) function folds into a single
//! [`AggregateDescriptor`] covering all of them.

mod aggregate;

pub use aggregate::{aggregate, AggregateDescriptor};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised when region data violates its invariants.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RegionError {
    /// A bounding box edge is NaN or infinite.
    #[error("Region '{id}' has a non-finite bounding box")]
    NonFiniteBounds { id: String },

    /// `min_lon > max_lon` or `min_lat > max_lat`.
    #[error("Region '{id}' has inverted bounds: [{min_lon}, {min_lat}, {max_lon}, {max_lat}]")]
    InvertedBounds {
        id: String,
        min_lon: f64,
        min_lat: f64,
        max_lon: f64,
        max_lat: f64,
    },

    /// `min_zoom > max_zoom`.
    #[error("Region '{id}' has inverted zoom range: {min_zoom}..{max_zoom}")]
    InvertedZoom {
        id: String,
        min_zoom: u8,
        max_zoom: u8,
    },

    /// Aggregation requires at least one region.
    #[error("No regions to aggregate")]
    Empty,
}

/// Geographic bounding box in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundingBox {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl BoundingBox {
    /// Create a bounding box from its four edges.
    pub fn new(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> Self {
        Self {
            min_lon,
            min_lat,
            max_lon,
            max_lat,
        }
    }

    /// Component-wise union: min of mins, max of maxes.
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox {
            min_lon: self.min_lon.min(other.min_lon),
            min_lat: self.min_lat.min(other.min_lat),
            max_lon: self.max_lon.max(other.max_lon),
            max_lat: self.max_lat.max(other.max_lat),
        }
    }

    /// Midpoint of the box.
    pub fn centroid(&self) -> CenterPoint {
        CenterPoint {
            lon: (self.min_lon + self.max_lon) / 2.0,
            lat: (self.min_lat + self.max_lat) / 2.0,
        }
    }

    /// Closed-interval overlap test. Boxes sharing only an edge intersect.
    pub fn intersects(&self, other: &BoundingBox) -> bool {
        self.min_lon <= other.max_lon
            && other.min_lon <= self.max_lon
            && self.min_lat <= other.max_lat
            && other.min_lat <= self.max_lat
    }

    /// `[minLon, minLat, maxLon, maxLat]`, the order tile-source documents use.
    pub fn to_array(&self) -> [f64; 4] {
        [self.min_lon, self.min_lat, self.max_lon, self.max_lat]
    }

    fn is_finite(&self) -> bool {
        self.to_array().iter().all(|v| v.is_finite())
    }
}

/// A longitude/latitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CenterPoint {
    pub lon: f64,
    pub lat: f64,
}

impl CenterPoint {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }
}

/// Metadata for one region data set.
///
/// Construct with [`RegionDescriptor::new`], which enforces
/// `min_lon <= max_lon`, `min_lat <= max_lat` and `min_zoom <= max_zoom`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionDescriptor {
    id: String,
    display_name: String,
    bounds: BoundingBox,
    center: CenterPoint,
    min_zoom: u8,
    max_zoom: u8,
}

impl RegionDescriptor {
    /// Create a validated region descriptor.
    ///
    /// # Errors
    ///
    /// Returns `RegionError` if the bounds are non-finite or inverted, or if
    /// the zoom range is inverted.
    pub fn new(
        id: impl Into<String>,
        display_name: impl Into<String>,
        bounds: BoundingBox,
        center: CenterPoint,
        min_zoom: u8,
        max_zoom: u8,
    ) -> Result<Self, RegionError> {
        let id = id.into();

        if !bounds.is_finite() {
            return Err(RegionError::NonFiniteBounds { id });
        }
        if bounds.min_lon > bounds.max_lon || bounds.min_lat > bounds.max_lat {
            return Err(RegionError::InvertedBounds {
                id,
                min_lon: bounds.min_lon,
                min_lat: bounds.min_lat,
                max_lon: bounds.max_lon,
                max_lat: bounds.max_lat,
            });
        }
        if min_zoom > max_zoom {
            return Err(RegionError::InvertedZoom {
                id,
                min_zoom,
                max_zoom,
            });
        }

        let display_name = {
            let name: String = display_name.into();
            if name.trim().is_empty() {
                region_name_from_id(&id)
            } else {
                name
            }
        };

        Ok(Self {
            id,
            display_name,
            bounds,
            center,
            min_zoom,
            max_zoom,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Human-readable name. Derived from the id when the provider gave none.
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn bounds(&self) -> BoundingBox {
        self.bounds
    }

    /// Center as supplied by the provider. Aggregation ignores it.
    pub fn center(&self) -> CenterPoint {
        self.center
    }

    pub fn min_zoom(&self) -> u8 {
        self.min_zoom
    }

    pub fn max_zoom(&self) -> u8 {
        self.max_zoom
    }
}

/// Derive a display name from a region id or file name.
///
/// Drops a trailing `.pmtiles`, turns underscores into spaces and
/// capitalizes each word.
///
/// ```
/// use tilebridge::region::region_name_from_id;
///
/// assert_eq!(region_name_from_id("new_york_city.pmtiles"), "New York City");
/// ```
pub fn region_name_from_id(id: &str) -> String {
    id.strip_suffix(".pmtiles")
        .unwrap_or(id)
        .replace('_', " ")
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
