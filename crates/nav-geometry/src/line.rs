//! `RouteLine` — a route polyline pre-processed for per-fix queries.
//!
//! # Data layout
//!
//! ```text
//! points[i]      vertex i (finite coordinates only)
//! cumulative[i]  great-circle distance from points[0] to points[i]
//! ```
//!
//! # Spatial index
//!
//! An R-tree (via `rstar`) holds one entry per segment in a planar
//! equirectangular frame (`x = lon · cos φ₀`, `y = lat`, with φ₀ the mean
//! latitude of the route).  A projection query fetches the few nearest
//! candidate segments from the tree and measures each exactly on the sphere,
//! so long routes cost O(log n) per fix instead of a full scan.

use rstar::{AABB, PointDistance, RTree, RTreeObject};

use nav_core::GeoPoint;

use crate::math::{self, Projection};

/// Number of planar-nearest candidates re-measured on the sphere.
const CANDIDATES: usize = 4;

// ── R-tree segment entry ──────────────────────────────────────────────────────

#[derive(Clone, Debug)]
struct SegmentEntry {
    index: usize,
    a:     [f64; 2],
    b:     [f64; 2],
}

impl RTreeObject for SegmentEntry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners(self.a, self.b)
    }
}

impl PointDistance for SegmentEntry {
    /// Squared planar distance from `point` to the segment.
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let (dx, dy) = (self.b[0] - self.a[0], self.b[1] - self.a[1]);
        let (px, py) = (point[0] - self.a[0], point[1] - self.a[1]);
        let len_sq = dx * dx + dy * dy;
        let t = if len_sq < 1e-24 { 0.0 } else { ((px * dx + py * dy) / len_sq).clamp(0.0, 1.0) };
        let (ex, ey) = (px - t * dx, py - t * dy);
        ex * ex + ey * ey
    }
}

// ── RouteLine ─────────────────────────────────────────────────────────────────

/// Route polyline with cumulative distances and a segment index.
///
/// Immutable once built; cheap to share behind an `Arc`.
#[derive(Debug, Clone)]
pub struct RouteLine {
    points:     Vec<GeoPoint>,
    cumulative: Vec<f64>,
    ref_cos:    f64,
    index:      RTree<SegmentEntry>,
}

impl RouteLine {
    /// Build from raw vertices.  Non-finite vertices are dropped.
    pub fn new(points: impl IntoIterator<Item = GeoPoint>) -> Self {
        let points: Vec<GeoPoint> = points.into_iter().filter(|p| p.is_finite()).collect();

        let mut cumulative = Vec::with_capacity(points.len());
        let mut acc = 0.0;
        for (i, p) in points.iter().enumerate() {
            if i > 0 {
                acc += points[i - 1].distance_m(*p);
            }
            cumulative.push(acc);
        }

        let ref_cos = if points.is_empty() {
            1.0
        } else {
            let mean_lat = points.iter().map(|p| p.lat).sum::<f64>() / points.len() as f64;
            mean_lat.to_radians().cos().max(1e-6)
        };

        let entries: Vec<SegmentEntry> = points
            .windows(2)
            .enumerate()
            .map(|(i, w)| SegmentEntry {
                index: i,
                a:     [w[0].lon * ref_cos, w[0].lat],
                b:     [w[1].lon * ref_cos, w[1].lat],
            })
            .collect();

        Self {
            points,
            cumulative,
            ref_cos,
            index: RTree::bulk_load(entries),
        }
    }

    // ── Dimensions ────────────────────────────────────────────────────────

    pub fn points(&self) -> &[GeoPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Fewer than two vertices: no segment to project onto.
    pub fn is_degenerate(&self) -> bool {
        self.points.len() < 2
    }

    /// Great-circle length of the whole line.
    pub fn total_m(&self) -> f64 {
        self.cumulative.last().copied().unwrap_or(0.0)
    }

    pub fn first(&self) -> Option<GeoPoint> {
        self.points.first().copied()
    }

    pub fn last(&self) -> Option<GeoPoint> {
        self.points.last().copied()
    }

    /// Distance from the start to vertex `i`.
    pub fn cumulative_m(&self, i: usize) -> f64 {
        self.cumulative.get(i).copied().unwrap_or_else(|| self.total_m())
    }

    // ── Queries ───────────────────────────────────────────────────────────

    /// Project `point` onto the line.
    ///
    /// Returns `None` for a non-finite point or an empty line.
    pub fn project(&self, point: GeoPoint) -> Option<Projection> {
        if !point.is_finite() || self.points.is_empty() {
            return None;
        }
        if self.is_degenerate() {
            return math::project(point, &self.points);
        }

        let query = [point.lon * self.ref_cos, point.lat];
        self.index
            .nearest_neighbor_iter(&query)
            .take(CANDIDATES)
            .map(|seg| {
                let (a, b) = (self.points[seg.index], self.points[seg.index + 1]);
                let (projected, t) = math::project_on_segment(point, a, b);
                Projection {
                    point:      projected,
                    distance_m: point.distance_m(projected),
                    segment:    seg.index,
                    t,
                    along_m:    self.cumulative[seg.index] + a.distance_m(projected),
                }
            })
            .min_by(|x, y| {
                x.distance_m
                    .total_cmp(&y.distance_m)
                    .then(x.segment.cmp(&y.segment))
            })
    }

    /// Split the line at a projection into `(traversed, remaining)`.
    ///
    /// Both halves contain the projected point, so their lengths sum to the
    /// line's total length.
    pub fn split_at(&self, at: &Projection) -> (Vec<GeoPoint>, Vec<GeoPoint>) {
        if self.points.is_empty() {
            return (Vec::new(), Vec::new());
        }
        let seg = at.segment.min(self.points.len() - 1);

        let mut traversed = Vec::with_capacity(seg + 2);
        traversed.extend_from_slice(&self.points[..=seg]);
        if traversed.last() != Some(&at.point) {
            traversed.push(at.point);
        }

        let mut remaining = Vec::with_capacity(self.points.len() - seg + 1);
        remaining.push(at.point);
        for v in &self.points[seg + 1..] {
            if remaining.last() != Some(v) {
                remaining.push(*v);
            }
        }

        (traversed, remaining)
    }

    /// The part of the line between the projections of `from` and `to`, in
    /// line order.  Same degenerate-case rules as [`math::slice`].
    pub fn slice(&self, from: GeoPoint, to: GeoPoint) -> Vec<GeoPoint> {
        math::slice(&self.points, from, to)
    }

    /// The point `along_m` metres from the start, clamped to the ends.
    pub fn point_at(&self, along_m: f64) -> Option<GeoPoint> {
        math::point_at(&self.points, along_m)
    }
}
