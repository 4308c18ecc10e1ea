//! Wire format of the directions and map-matching APIs, and its conversion
//! into engine types.
//!
//! Parsing is defensive: fields the engine can live without are optional,
//! and anything that would leave the engine without a usable plan becomes a
//! typed error rather than a panic.

use serde::Deserialize;

use nav_core::GeoPoint;
use nav_route::{Congestion, DirectionsError, RoutePlan, SnapError, Step};

// ── Directions ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct DirectionsResponse {
    pub code:    String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub routes:  Vec<RouteJson>,
}

#[derive(Debug, Deserialize)]
pub struct RouteJson {
    pub geometry: LineStringJson,
    #[serde(default)]
    pub distance: Option<f64>,
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default)]
    pub legs:     Vec<LegJson>,
}

#[derive(Debug, Deserialize)]
pub struct LineStringJson {
    pub coordinates: Vec<[f64; 2]>,
}

#[derive(Debug, Deserialize)]
pub struct LegJson {
    #[serde(default)]
    pub steps:      Vec<StepJson>,
    #[serde(default)]
    pub annotation: Option<AnnotationJson>,
}

#[derive(Debug, Deserialize)]
pub struct AnnotationJson {
    #[serde(default)]
    pub congestion: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub struct StepJson {
    pub maneuver: ManeuverJson,
    #[serde(default)]
    pub distance: f64,
    #[serde(default)]
    pub duration: f64,
    #[serde(default)]
    pub name:     String,
}

#[derive(Debug, Deserialize)]
pub struct ManeuverJson {
    pub location:      [f64; 2],
    #[serde(default)]
    pub instruction:   String,
    #[serde(default)]
    pub bearing_after: f64,
}

fn point([lon, lat]: [f64; 2]) -> GeoPoint {
    GeoPoint::new(lon, lat)
}

/// Provider codes meaning "the waypoints cannot be connected".
fn is_no_route(code: &str) -> bool {
    matches!(code, "NoRoute" | "NoSegment")
}

/// Parse a directions response body into the first route's plan.
pub fn parse_directions(body: &str) -> Result<RoutePlan, DirectionsError> {
    let response: DirectionsResponse =
        serde_json::from_str(body).map_err(|e| DirectionsError::MalformedResponse(e.to_string()))?;

    if response.code != "Ok" {
        let detail = match response.message {
            Some(m) => format!("{}: {m}", response.code),
            None => response.code.clone(),
        };
        return Err(if is_no_route(&response.code) {
            DirectionsError::NoRouteFound(detail)
        } else {
            DirectionsError::MalformedResponse(detail)
        });
    }

    let Some(route) = response.routes.into_iter().next() else {
        return Err(DirectionsError::NoRouteFound("response has no routes".into()));
    };

    let geometry: Vec<GeoPoint> = route.geometry.coordinates.into_iter().map(point).collect();

    let steps: Vec<Step> = route
        .legs
        .iter()
        .flat_map(|leg| &leg.steps)
        .map(|s| Step {
            location:      point(s.maneuver.location),
            instruction:   s.maneuver.instruction.clone(),
            bearing_after: s.maneuver.bearing_after,
            distance_m:    s.distance,
            duration_s:    s.duration,
            road_name:     s.name.clone(),
        })
        .collect();

    // Per-leg annotations concatenate into one per-edge list; a leg without
    // them leaves the whole route without congestion data.
    let congestion: Vec<Congestion> = route
        .legs
        .iter()
        .map(|leg| leg.annotation.as_ref().and_then(|a| a.congestion.as_ref()))
        .collect::<Option<Vec<_>>>()
        .map(|per_leg| per_leg.into_iter().flatten().map(|c| Congestion::parse(c)).collect())
        .unwrap_or_default();

    RoutePlan::new(
        geometry,
        steps,
        congestion,
        route.distance.unwrap_or(f64::NAN),
        route.duration.unwrap_or(f64::NAN),
    )
    .map_err(|e| DirectionsError::MalformedResponse(e.to_string()))
}

// ── Map matching ──────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct MatchingResponse {
    pub code:      String,
    #[serde(default)]
    pub message:   Option<String>,
    #[serde(default)]
    pub matchings: Vec<MatchingJson>,
}

#[derive(Debug, Deserialize)]
pub struct MatchingJson {
    pub geometry: LineStringJson,
}

/// Parse a two-point map-matching response into the snapped current point:
/// the second coordinate of the first matching.
pub fn parse_matching(body: &str) -> Result<GeoPoint, SnapError> {
    let response: MatchingResponse =
        serde_json::from_str(body).map_err(|e| SnapError::Network(format!("unreadable response: {e}")))?;

    if response.code != "Ok" {
        return Err(SnapError::NoMatch);
    }
    response
        .matchings
        .first()
        .and_then(|m| m.geometry.coordinates.get(1))
        .map(|&c| point(c))
        .filter(|p| p.is_finite())
        .ok_or(SnapError::NoMatch)
}
