#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! In-memory spatial index for ward attribution.
//!
//! Builds an R-tree over ward boundary polygons at startup and provides
//! fast point-in-polygon lookups. Used at report creation time to assign
//! the containing ward and by the aggregation pass to attribute reports
//! that were submitted before the boundary file was available.

use geo::{Contains, MultiPolygon};
use rstar::{AABB, RTree, RTreeObject};
use waterlog_map_geography_models::WardShape;

/// A ward polygon stored in the R-tree with its store id.
struct WardEntry {
    ward_id: i64,
    envelope: AABB<[f64; 2]>,
    polygon: MultiPolygon<f64>,
}

impl RTreeObject for WardEntry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// Pre-built spatial index over ward boundaries.
///
/// Constructed once and shared across all consumers. Wards tile the city
/// without meaningful overlap, so the first containing polygon wins.
pub struct WardIndex {
    wards: RTree<WardEntry>,
}

impl WardIndex {
    /// Builds the index from registered ward shapes.
    #[must_use]
    pub fn from_shapes(shapes: &[WardShape]) -> Self {
        let entries: Vec<WardEntry> = shapes
            .iter()
            .map(|shape| WardEntry {
                ward_id: shape.ward_id,
                envelope: compute_envelope(&shape.polygon),
                polygon: shape.polygon.clone(),
            })
            .collect();

        log::info!("Built ward spatial index over {} boundaries", entries.len());

        Self {
            wards: RTree::bulk_load(entries),
        }
    }

    /// Looks up the ward containing a point.
    ///
    /// Returns `None` when the point falls outside every known boundary;
    /// such reports stay in the global list but are excluded from density
    /// computation.
    #[must_use]
    pub fn assign_ward(&self, lng: f64, lat: f64) -> Option<i64> {
        let point = geo::Point::new(lng, lat);
        let query_env = AABB::from_point([lng, lat]);

        for entry in self.wards.locate_in_envelope_intersecting(&query_env) {
            if entry.polygon.contains(&point) {
                return Some(entry.ward_id);
            }
        }
        None
    }

    /// Number of boundaries in the index.
    #[must_use]
    pub fn len(&self) -> usize {
        self.wards.size()
    }

    /// Returns `true` if the index holds no boundaries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.wards.size() == 0
    }
}

/// Compute the bounding box envelope for a [`MultiPolygon`].
fn compute_envelope(mp: &MultiPolygon<f64>) -> AABB<[f64; 2]> {
    use geo::BoundingRect;

    mp.bounding_rect().map_or_else(
        || AABB::from_point([0.0, 0.0]),
        |rect| AABB::from_corners([rect.min().x, rect.min().y], [rect.max().x, rect.max().y]),
    )
}
