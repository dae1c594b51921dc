pub mod haversine;
pub mod rtree;

pub use rtree::{BBoxEntry, BBoxRTree};

/// crude meters-to-degrees conversion used to expand bounding-box queries
/// by a metric tolerance. Ignores latitude-dependent longitude scaling,
/// which only matters for bbox pre-filtering (exact distances are always
/// re-checked with [`haversine::coord_distance_meters`]).
pub fn meters_to_degrees(meters: f64) -> f64 {
    meters / 111_320.0
}
