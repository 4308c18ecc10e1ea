//! Pure polyline functions.
//!
//! All distances are great-circle (haversine) metres.  The projection
//! parameter along a segment is found in a local equirectangular frame
//! (longitude scaled by the cosine of the segment's mean latitude), which is
//! accurate to well under a metre for road-length segments; the reported
//! distances are then measured on the sphere.
//!
//! # Sentinels
//!
//! None of these functions fail.  Empty polylines, single points and NaN
//! coordinates produce zero lengths, zero distances and empty slices, because
//! they run once per GPS fix and a malformed fix must not abort tracking.

use nav_core::GeoPoint;

// ── Projection ────────────────────────────────────────────────────────────────

/// Result of projecting a position onto a polyline.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Projection {
    /// Nearest point on the polyline.
    pub point: GeoPoint,
    /// Distance from the input position to `point`, in metres.
    pub distance_m: f64,
    /// Index of the segment start vertex that `point` lies on.
    pub segment: usize,
    /// Position of `point` along the segment, in `[0, 1]`.
    pub t: f64,
    /// Distance along the polyline from its first vertex to `point`.
    pub along_m: f64,
}

impl Projection {
    /// Total order along the polyline, independent of floating-point
    /// accumulation in `along_m`.
    #[inline]
    fn key(&self) -> (usize, f64) {
        (self.segment, self.t)
    }

    #[inline]
    fn is_before(&self, other: &Projection) -> bool {
        let (sa, ta) = self.key();
        let (sb, tb) = other.key();
        sa < sb || (sa == sb && ta < tb)
    }
}

/// Closest point on the segment `a → b` to `p`, plus its parameter `t`.
///
/// Degenerate segments (coincident endpoints) return `a` with `t = 0`.
pub(crate) fn project_on_segment(p: GeoPoint, a: GeoPoint, b: GeoPoint) -> (GeoPoint, f64) {
    let cos_lat = ((a.lat + b.lat) * 0.5).to_radians().cos();

    let dx = (b.lon - a.lon) * cos_lat;
    let dy = b.lat - a.lat;
    let px = (p.lon - a.lon) * cos_lat;
    let py = p.lat - a.lat;

    let seg_len_sq = dx * dx + dy * dy;
    if seg_len_sq < 1e-20 {
        return (a, 0.0);
    }

    let t = ((px * dx + py * dy) / seg_len_sq).clamp(0.0, 1.0);
    (a.lerp(b, t), t)
}

/// Project `point` onto `polyline`, returning full projection details.
///
/// Returns `None` when the polyline has no finite vertex or `point` is not
/// finite.  A single-vertex polyline projects onto that vertex.
pub fn project(point: GeoPoint, polyline: &[GeoPoint]) -> Option<Projection> {
    if !point.is_finite() {
        return None;
    }

    if polyline.len() == 1 {
        let v = polyline[0];
        return v.is_finite().then(|| Projection {
            point:      v,
            distance_m: point.distance_m(v),
            segment:    0,
            t:          0.0,
            along_m:    0.0,
        });
    }

    let mut best: Option<Projection> = None;
    let mut cumulative = 0.0;

    for (i, w) in polyline.windows(2).enumerate() {
        let (a, b) = (w[0], w[1]);
        if !a.is_finite() || !b.is_finite() {
            continue;
        }
        let (projected, t) = project_on_segment(point, a, b);
        let dist = point.distance_m(projected);

        // Strict `<` keeps the earliest segment on ties.
        if best.as_ref().is_none_or(|prev| dist < prev.distance_m) {
            best = Some(Projection {
                point:      projected,
                distance_m: dist,
                segment:    i,
                t,
                along_m:    cumulative + a.distance_m(projected),
            });
        }
        cumulative += a.distance_m(b);
    }

    best
}

/// Closest point on `polyline` to `point` and the distance to it in metres.
///
/// Degenerate input yields `(point, 0.0)`.
pub fn project_onto_line(point: GeoPoint, polyline: &[GeoPoint]) -> (GeoPoint, f64) {
    match project(point, polyline) {
        Some(p) => (p.point, p.distance_m),
        None    => (point, 0.0),
    }
}

// ── Length, bearing, interpolation ────────────────────────────────────────────

/// Sum of pairwise great-circle distances.  Non-finite vertices contribute 0.
pub fn length(polyline: &[GeoPoint]) -> f64 {
    polyline
        .windows(2)
        .map(|w| w[0].distance_m(w[1]))
        .sum()
}

/// Initial bearing from `a` to `b` in degrees `[0, 360)`.
#[inline]
pub fn bearing(a: GeoPoint, b: GeoPoint) -> f64 {
    a.bearing_to(b)
}

/// The point `along_m` metres from the start of `polyline`, clamped to its
/// ends.  Returns `None` for an empty polyline.
pub fn point_at(polyline: &[GeoPoint], along_m: f64) -> Option<GeoPoint> {
    let first = *polyline.first()?;
    if !along_m.is_finite() || along_m <= 0.0 {
        return Some(first);
    }
    let mut remaining = along_m;
    for w in polyline.windows(2) {
        let seg = w[0].distance_m(w[1]);
        if remaining <= seg && seg > 0.0 {
            return Some(w[0].lerp(w[1], remaining / seg));
        }
        remaining -= seg;
    }
    polyline.last().copied()
}

// ── Slicing ───────────────────────────────────────────────────────────────────

/// The part of `polyline` between the projections of `from` and `to`.
///
/// The result follows the polyline's own direction whichever argument comes
/// first.  Degenerate cases (`from == to`, fewer than two vertices, both
/// positions projecting onto the same spot) return an empty sequence.
pub fn slice(polyline: &[GeoPoint], from: GeoPoint, to: GeoPoint) -> Vec<GeoPoint> {
    if polyline.len() < 2 || from == to {
        return Vec::new();
    }
    let (Some(a), Some(b)) = (project(from, polyline), project(to, polyline)) else {
        return Vec::new();
    };
    let (start, end) = if b.is_before(&a) { (b, a) } else { (a, b) };
    if start.key() == end.key() {
        return Vec::new();
    }
    between(polyline, &start, &end)
}

/// Vertices strictly between two ordered projections, bracketed by the
/// projected points themselves.
pub(crate) fn between(polyline: &[GeoPoint], start: &Projection, end: &Projection) -> Vec<GeoPoint> {
    let mut out = Vec::with_capacity(end.segment.saturating_sub(start.segment) + 2);
    push_dedup(&mut out, start.point);
    for v in &polyline[(start.segment + 1).min(polyline.len())..=end.segment.min(polyline.len() - 1)] {
        push_dedup(&mut out, *v);
    }
    push_dedup(&mut out, end.point);
    out
}

#[inline]
fn push_dedup(out: &mut Vec<GeoPoint>, p: GeoPoint) {
    if out.last() != Some(&p) {
        out.push(p);
    }
}
