//! Geographic coordinate type and spatial utilities.
//!
//! `GeoPoint` uses `f64` longitude/latitude.  Route geometry arrives from the
//! directions provider as GeoJSON `[lon, lat]` pairs, so the constructor takes
//! the same order.

/// Mean Earth radius in metres, shared by every great-circle computation.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// A WGS-84 geographic coordinate.
#[derive(Copy, Clone, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GeoPoint {
    pub lon: f64,
    pub lat: f64,
}

impl GeoPoint {
    #[inline]
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    /// `true` when both components are finite numbers.
    #[inline]
    pub fn is_finite(self) -> bool {
        self.lon.is_finite() && self.lat.is_finite()
    }

    /// Haversine great-circle distance in metres.
    ///
    /// Non-finite input yields `0.0` rather than `NaN` so hot per-fix paths
    /// never have to branch on poisoned values.
    pub fn distance_m(self, other: GeoPoint) -> f64 {
        if !self.is_finite() || !other.is_finite() {
            return 0.0;
        }

        let d_lat = (other.lat - self.lat).to_radians();
        let d_lon = (other.lon - self.lon).to_radians();

        let lat1 = self.lat.to_radians();
        let lat2 = other.lat.to_radians();

        let a = (d_lat * 0.5).sin().powi(2)
            + lat1.cos() * lat2.cos() * (d_lon * 0.5).sin().powi(2);

        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
        EARTH_RADIUS_M * c
    }

    /// Initial bearing from `self` towards `other`, in degrees `[0, 360)`.
    pub fn bearing_to(self, other: GeoPoint) -> f64 {
        if !self.is_finite() || !other.is_finite() || self == other {
            return 0.0;
        }
        let lat1 = self.lat.to_radians();
        let lat2 = other.lat.to_radians();
        let d_lon = (other.lon - self.lon).to_radians();

        let y = d_lon.sin() * lat2.cos();
        let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * d_lon.cos();

        let deg = y.atan2(x).to_degrees();
        let norm = (deg + 360.0) % 360.0;
        // `-0.0 % 360.0` and rounding can land exactly on 360.0.
        if norm >= 360.0 { 0.0 } else { norm }
    }

    /// Linear interpolation in lon/lat space.  `t` is clamped to `[0, 1]`.
    #[inline]
    pub fn lerp(self, other: GeoPoint, t: f64) -> GeoPoint {
        let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 1.0 };
        // Exact endpoints, so callers can compare against vertices.
        if t == 0.0 {
            return self;
        }
        if t == 1.0 {
            return other;
        }
        GeoPoint {
            lon: self.lon + (other.lon - self.lon) * t,
            lat: self.lat + (other.lat - self.lat) * t,
        }
    }
}

impl std::fmt::Display for GeoPoint {
    /// Formats as the provider's `"lon,lat"` waypoint syntax.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.6},{:.6}", self.lon, self.lat)
    }
}
