//! Fuel consumption estimate.

/// Litres needed to drive `distance_m` at `km_per_liter`.
///
/// Returns `None` ("unavailable", not zero) when the rate is unset,
/// non-finite or not positive.  Negative distances count as zero.
pub fn estimate(distance_m: f64, km_per_liter: Option<f64>) -> Option<f64> {
    let rate = km_per_liter.filter(|r| r.is_finite() && *r > 0.0)?;
    let km = if distance_m.is_finite() { distance_m.max(0.0) / 1_000.0 } else { 0.0 };
    Some(km / rate)
}
