//! Folding per-region descriptors into one aggregate.

use serde::Serialize;

use super::{BoundingBox, CenterPoint, RegionDescriptor, RegionError};

/// Combined extent of every region in a session.
///
/// The center is always the centroid of `bounds`; per-region centers are
/// never consulted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateDescriptor {
    pub bounds: BoundingBox,
    pub center: CenterPoint,
    pub min_zoom: u8,
    pub max_zoom: u8,
}

/// Merge a non-empty set of regions into one descriptor.
///
/// The result does not depend on the order of `regions`: bounds are a
/// component-wise min/max, the zoom range a min/max, and the center is
/// recomputed from the merged bounds.
///
/// # Errors
///
/// Returns [`RegionError::Empty`] if `regions` is empty.
///
/// # Example
///
/// ```
/// use tilebridge::region::{aggregate, BoundingBox, CenterPoint, RegionDescriptor};
///
/// let a = RegionDescriptor::new("a", "A", BoundingBox::new(0.0, 0.0, 1.0, 1.0),
///     CenterPoint::new(0.5, 0.5), 0, 5).unwrap();
/// let b = RegionDescriptor::new("b", "B", BoundingBox::new(2.0, 2.0, 3.0, 3.0),
///     CenterPoint::new(2.5, 2.5), 2, 8).unwrap();
///
/// let combined = aggregate(&[a, b]).unwrap();
/// assert_eq!(combined.bounds, BoundingBox::new(0.0, 0.0, 3.0, 3.0));
/// assert_eq!(combined.center, CenterPoint::new(1.5, 1.5));
/// assert_eq!((combined.min_zoom, combined.max_zoom), (0, 8));
/// ```
pub fn aggregate(regions: &[RegionDescriptor]) -> Result<AggregateDescriptor, RegionError> {
    let (first, rest) = regions.split_first().ok_or(RegionError::Empty)?;

    let (bounds, min_zoom, max_zoom) = rest.iter().fold(
        (first.bounds(), first.min_zoom(), first.max_zoom()),
        |(bounds, min_zoom, max_zoom), region| {
            (
                bounds.union(&region.bounds()),
                min_zoom.min(region.min_zoom()),
                max_zoom.max(region.max_zoom()),
            )
        },
    );

    Ok(AggregateDescriptor {
        bounds,
        center: bounds.centroid(),
        min_zoom,
        max_zoom,
    })
}
