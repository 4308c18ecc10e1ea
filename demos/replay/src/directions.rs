//! Offline directions provider for replays.
//!
//! Routes are straight lines through the requested waypoints with one step
//! per waypoint, timed at a fixed cruising speed.  Good enough to exercise
//! tracking, re-routing and arrival without network access.

use async_trait::async_trait;

use nav_core::GeoPoint;
use nav_core::units::kmh_to_mps;
use nav_route::{Congestion, DirectionsClient, DirectionsError, RoutePlan, RouteRequest, Step};

pub struct StraightLineDirections {
    pub cruise_kmh: f64,
}

#[async_trait]
impl DirectionsClient for StraightLineDirections {
    async fn compute_route(&self, request: &RouteRequest) -> Result<RoutePlan, DirectionsError> {
        let waypoints = request.waypoints();
        let speed = kmh_to_mps(self.cruise_kmh);

        let mut steps = Vec::with_capacity(waypoints.len());
        for (i, pair) in waypoints.windows(2).enumerate() {
            let (from, to): (GeoPoint, GeoPoint) = (pair[0], pair[1]);
            let leg_m = from.distance_m(to);
            steps.push(Step {
                location:      from,
                instruction:   format!("Head to waypoint {}", i + 1),
                bearing_after: from.bearing_to(to),
                distance_m:    leg_m,
                duration_s:    leg_m / speed,
                road_name:     format!("Leg {}", i + 1),
            });
        }
        steps.push(Step {
            location:      request.destination,
            instruction:   "You have arrived".into(),
            bearing_after: 0.0,
            distance_m:    0.0,
            duration_s:    0.0,
            road_name:     String::new(),
        });

        // Alternate severities so the overlay has something to show.
        let congestion = (0..waypoints.len() - 1)
            .map(|i| if i % 2 == 0 { Congestion::Low } else { Congestion::Moderate })
            .collect();

        RoutePlan::new(waypoints, steps, congestion, f64::NAN, f64::NAN)
            .map_err(|e| DirectionsError::NoRouteFound(e.to_string()))
    }
}
