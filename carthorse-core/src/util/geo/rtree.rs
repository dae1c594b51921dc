use geo::{BoundingRect, Coord, LineString};
use rstar::{RTree, RTreeObject, AABB};

/// one trail's bounding box, indexed so the Intersection Resolver can prune
/// candidate trail pairs to those whose bounding boxes are within
/// tolerance (spec.md §4.2) before running exact segment intersection.
pub struct BBoxEntry<D> {
    envelope: AABB<[f64; 2]>,
    pub data: D,
}

impl<D> BBoxEntry<D> {
    pub fn new(line: &LineString<f64>, data: D) -> Option<Self> {
        let rect = line.bounding_rect()?;
        let envelope = AABB::from_corners([rect.min().x, rect.min().y], [rect.max().x, rect.max().y]);
        Some(BBoxEntry { envelope, data })
    }

    /// a zero-area entry at a single point, for indexing vertex candidates
    /// rather than trail/edge geometries.
    pub fn from_point(point: Coord<f64>, data: D) -> Self {
        BBoxEntry {
            envelope: AABB::from_point([point.x, point.y]),
            data,
        }
    }
}

impl<D> RTreeObject for BBoxEntry<D> {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// a bounding-box spatial index over trail (or edge) geometries.
///
/// This is deliberately simpler than a full geometric intersection index:
/// it answers "which candidates could plausibly intersect or lie within
/// `tolerance_m` of this query", leaving exact geometry tests (segment
/// intersection, endpoint proximity) to the caller.
pub struct BBoxRTree<D> {
    tree: RTree<BBoxEntry<D>>,
}

impl<D> BBoxRTree<D> {
    pub fn build(entries: Vec<BBoxEntry<D>>) -> Self {
        BBoxRTree {
            tree: RTree::bulk_load(entries),
        }
    }

    /// candidates whose bounding box lies within `tolerance_m` (expressed
    /// in the same units as the input coordinates, i.e. degrees for WGS84
    /// data pre-scaled by the caller) of `line`'s bounding box.
    pub fn candidates_near_line<'a>(
        &'a self,
        line: &LineString<f64>,
        tolerance: f64,
    ) -> Vec<&'a D> {
        let Some(rect) = line.bounding_rect() else {
            return Vec::new();
        };
        let query = AABB::from_corners(
            [rect.min().x - tolerance, rect.min().y - tolerance],
            [rect.max().x + tolerance, rect.max().y + tolerance],
        );
        self.tree
            .locate_in_envelope_intersecting(&query)
            .map(|entry| &entry.data)
            .collect()
    }

    /// candidates whose bounding box lies within `tolerance` of a single
    /// point, used by the Bridger to find nearby endpoints (spec.md §4.4).
    pub fn candidates_near_point<'a>(&'a self, point: Coord<f64>, tolerance: f64) -> Vec<&'a D> {
        let query = AABB::from_corners(
            [point.x - tolerance, point.y - tolerance],
            [point.x + tolerance, point.y + tolerance],
        );
        self.tree
            .locate_in_envelope_intersecting(&query)
            .map(|entry| &entry.data)
            .collect()
    }
}
