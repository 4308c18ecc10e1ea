//! Speed conversions.

/// Metres per second → kilometres per hour.
///
/// Negative and non-finite speeds clamp to zero: a fix with a bogus speed is
/// still a valid position and must not be dropped.
#[inline]
pub fn mps_to_kmh(mps: f64) -> f64 {
    if mps.is_finite() && mps > 0.0 { mps * 3.6 } else { 0.0 }
}

/// Kilometres per hour → metres per second, with the same clamping.
#[inline]
pub fn kmh_to_mps(kmh: f64) -> f64 {
    if kmh.is_finite() && kmh > 0.0 { kmh / 3.6 } else { 0.0 }
}
