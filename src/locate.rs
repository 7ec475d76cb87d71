//! Point-in-polygon ward location.
//!
//! Candidates are scanned in dataset order and the first structural
//! match wins; when boundary polygons genuinely overlap (a data error
//! the source sets contain), the earlier feature takes the point. The
//! R-tree only prunes features whose bounding box excludes the point,
//! so indexed lookup returns exactly what a linear scan would.

use geo::{LineString, Polygon};
use rstar::{RTree, RTreeObject, AABB};

use crate::{WardFeature, WardGeometry};

/// Even-odd ray cast of a point against one ring.
///
/// Horizontal ray to +x; an edge is crossed when the point's y lies
/// strictly between the edge endpoints' y on one side and the
/// x-intersection falls right of the point. A point exactly on an edge
/// is undefined, which the viewer accepts.
fn ring_contains(ring: &LineString<f64>, x: f64, y: f64) -> bool {
    let pts = &ring.0;
    if pts.len() < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = pts.len() - 1;
    for i in 0..pts.len() {
        let (xi, yi) = (pts[i].x, pts[i].y);
        let (xj, yj) = (pts[j].x, pts[j].y);
        if (yi > y) != (yj > y) && x < (xj - xi) * (y - yi) / (yj - yi) + xi {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// Containment against a polygon's exterior ring only.
///
/// Interior rings (holes) are carried in the geometry but never
/// consulted here — a point inside a hole still reports as contained,
/// matching the viewer this replaces.
pub fn polygon_contains(polygon: &Polygon<f64>, lng: f64, lat: f64) -> bool {
    ring_contains(polygon.exterior(), lng, lat)
}

/// Containment for any ward geometry. Unsupported geometry never
/// contains a point.
pub fn geometry_contains(geometry: &WardGeometry, lng: f64, lat: f64) -> bool {
    match geometry {
        WardGeometry::Polygon(p) => polygon_contains(p, lng, lat),
        WardGeometry::MultiPolygon(mp) => {
            mp.0.iter().any(|p| polygon_contains(p, lng, lat))
        }
        WardGeometry::Unsupported(_) => false,
    }
}

/// First feature containing the point, scanning in slice order.
///
/// Coordinates are `[lng, lat]`, matching the geometry's own axis
/// order; convert `{lat, lng}` before calling.
pub fn locate_linear<'a>(lng: f64, lat: f64, features: &'a [WardFeature]) -> Option<&'a WardFeature> {
    features
        .iter()
        .find(|f| geometry_contains(&f.geometry, lng, lat))
}

/// Feature bounding box stored in the R-tree.
#[derive(Debug, Clone)]
struct FeatureBounds {
    index: usize,
    envelope: AABB<[f64; 2]>,
}

impl RTreeObject for FeatureBounds {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// Ward features plus a bounding-box R-tree for point lookups.
///
/// Features with unsupported geometry are kept in the feature list (the
/// metadata builder still reads their attributes) but never enter the
/// tree, so they cannot match a point.
pub struct WardIndex {
    features: Vec<WardFeature>,
    tree: RTree<FeatureBounds>,
}

impl WardIndex {
    /// Build the index. Feature order is preserved and is the
    /// tie-break order for overlapping polygons.
    pub fn new(features: Vec<WardFeature>) -> Self {
        let entries: Vec<FeatureBounds> = features
            .iter()
            .enumerate()
            .filter_map(|(index, feature)| {
                feature.geometry.bounding_rect().map(|rect| FeatureBounds {
                    index,
                    envelope: AABB::from_corners(
                        [rect.min().x, rect.min().y],
                        [rect.max().x, rect.max().y],
                    ),
                })
            })
            .collect();
        Self {
            tree: RTree::bulk_load(entries),
            features,
        }
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn features(&self) -> &[WardFeature] {
        &self.features
    }

    /// First feature containing the point, `[lng, lat]` order.
    ///
    /// Envelope candidates are re-sorted by dataset position before the
    /// ray cast, preserving linear-scan first-match semantics.
    pub fn locate(&self, lng: f64, lat: f64) -> Option<&WardFeature> {
        let point = [lng, lat];
        let mut candidates: Vec<usize> = self
            .tree
            .locate_in_envelope_intersecting(&AABB::from_point(point))
            .map(|entry| entry.index)
            .collect();
        candidates.sort_unstable();

        candidates
            .into_iter()
            .map(|i| &self.features[i])
            .find(|f| geometry_contains(&f.geometry, lng, lat))
    }
}
