//! Unit tests for nav-directions.  No network access: request building and
//! response parsing are tested against canned bodies.

use nav_core::GeoPoint;

// ── Helpers ───────────────────────────────────────────────────────────────────

/// Two-leg route through one stop, with congestion on both legs.
const TWO_LEG: &str = r#"{
  "code": "Ok",
  "routes": [{
    "distance": 2300.5,
    "duration": 240.0,
    "geometry": {"type": "LineString", "coordinates": [[0.0, 0.0], [0.01, 0.0], [0.02, 0.0], [0.02, 0.005]]},
    "legs": [
      {
        "steps": [
          {"distance": 1112.0, "duration": 100.0, "name": "Main Street",
           "maneuver": {"location": [0.0, 0.0], "instruction": "Head east on Main Street", "bearing_after": 90}},
          {"distance": 0.0, "duration": 0.0, "name": "Main Street",
           "maneuver": {"location": [0.01, 0.0], "instruction": "You have arrived at your 1st destination", "bearing_after": 0}}
        ],
        "annotation": {"congestion": ["heavy"]}
      },
      {
        "steps": [
          {"distance": 1112.0, "duration": 90.0, "name": "Harbor Road",
           "maneuver": {"location": [0.01, 0.0], "instruction": "Head east on Harbor Road", "bearing_after": 90}},
          {"distance": 556.0, "duration": 50.0, "name": "Dock Lane",
           "maneuver": {"location": [0.02, 0.0], "instruction": "Turn left onto Dock Lane", "bearing_after": 0}}
        ],
        "annotation": {"congestion": ["low", "moderate"]}
      }
    ]
  }],
  "waypoints": []
}"#;

// ── Directions parsing ────────────────────────────────────────────────────────

#[cfg(test)]
mod directions {
    use nav_route::{Congestion, DirectionsError};

    use super::*;
    use crate::parse_directions;

    #[test]
    fn two_leg_route() {
        let plan = parse_directions(TWO_LEG).unwrap();
        assert_eq!(plan.geometry().len(), 4);
        assert_eq!(plan.steps().len(), 4);
        assert_eq!(plan.steps()[3].instruction, "Turn left onto Dock Lane");
        assert_eq!(plan.steps()[3].location, GeoPoint::new(0.02, 0.0));
        assert_eq!(plan.total_distance_m(), 2300.5);
        assert_eq!(plan.total_duration_s(), 240.0);
        assert_eq!(plan.congestion(), &[Congestion::Heavy, Congestion::Low, Congestion::Moderate]);
    }

    #[test]
    fn missing_annotations_mean_no_congestion() {
        let body = TWO_LEG.replace(r#""annotation": {"congestion": ["heavy"]}"#, r#""summary": "A1""#);
        let plan = parse_directions(&body).unwrap();
        assert!(!plan.has_congestion());
    }

    #[test]
    fn congestion_length_mismatch_is_dropped() {
        let body = TWO_LEG.replace(r#"["low", "moderate"]"#, r#"["low"]"#);
        let plan = parse_directions(&body).unwrap();
        assert!(plan.congestion().is_empty());
        assert_eq!(plan.steps().len(), 4);
    }

    #[test]
    fn empty_routes_is_no_route() {
        let err = parse_directions(r#"{"code": "Ok", "routes": []}"#).unwrap_err();
        assert!(matches!(err, DirectionsError::NoRouteFound(_)));
        assert!(!err.is_retryable());
    }

    #[test]
    fn provider_codes() {
        let err = parse_directions(r#"{"code": "NoRoute", "message": "No route found"}"#).unwrap_err();
        assert_eq!(err, DirectionsError::NoRouteFound("NoRoute: No route found".into()));

        let err = parse_directions(r#"{"code": "InvalidInput"}"#).unwrap_err();
        assert!(matches!(err, DirectionsError::MalformedResponse(_)));
    }

    #[test]
    fn garbage_is_malformed() {
        for body in ["", "<html>502</html>", r#"{"routes": []}"#] {
            let err = parse_directions(body).unwrap_err();
            assert!(matches!(err, DirectionsError::MalformedResponse(_)), "{body:?} gave {err:?}");
            assert!(err.is_retryable());
        }
    }

    #[test]
    fn single_point_geometry_is_malformed() {
        let body = r#"{"code": "Ok", "routes": [{"geometry": {"coordinates": [[0.0, 0.0]]}, "legs": []}]}"#;
        assert!(matches!(parse_directions(body), Err(DirectionsError::MalformedResponse(_))));
    }
}

// ── Map-matching parsing ──────────────────────────────────────────────────────

#[cfg(test)]
mod matching {
    use nav_route::SnapError;

    use super::*;
    use crate::parse_matching;

    #[test]
    fn second_coordinate_is_the_snapped_point() {
        let body = r#"{"code": "Ok", "matchings": [
            {"geometry": {"coordinates": [[0.0, 0.0001], [0.001, 0.00002]]}},
            {"geometry": {"coordinates": [[9.0, 9.0], [9.0, 9.0]]}}
        ]}"#;
        assert_eq!(parse_matching(body).unwrap(), GeoPoint::new(0.001, 0.00002));
    }

    #[test]
    fn absence_of_match_is_no_match() {
        assert_eq!(parse_matching(r#"{"code": "NoMatch"}"#), Err(SnapError::NoMatch));
        assert_eq!(parse_matching(r#"{"code": "Ok", "matchings": []}"#), Err(SnapError::NoMatch));
        let short = r#"{"code": "Ok", "matchings": [{"geometry": {"coordinates": [[0.0, 0.0]]}}]}"#;
        assert_eq!(parse_matching(short), Err(SnapError::NoMatch));
    }

    #[test]
    fn unreadable_body_is_network_failure() {
        assert!(matches!(parse_matching("Bad Gateway"), Err(SnapError::Network(_))));
    }
}

// ── Request building ──────────────────────────────────────────────────────────

#[cfg(test)]
mod request {
    use nav_core::{Avoid, AvoidSet, RoutingProfile};
    use nav_route::RouteRequest;

    use super::*;
    use crate::{MapboxConfig, coordinate_path, directions_query};

    #[test]
    fn coordinates_are_lon_lat_pairs() {
        let path = coordinate_path(&[GeoPoint::new(-88.04, 30.69), GeoPoint::new(-88.1, 30.7)]);
        assert_eq!(path, "-88.040000,30.690000;-88.100000,30.700000");
    }

    #[test]
    fn query_carries_options() {
        let request = RouteRequest::new(GeoPoint::new(0.0, 0.0), GeoPoint::new(0.02, 0.0))
            .with_avoid(AvoidSet::new().with(Avoid::Toll).with(Avoid::Ferry))
            .with_profile(RoutingProfile::DrivingTraffic);
        let query = directions_query(&request);
        assert!(query.contains(&("annotations", "congestion".to_string())));
        assert!(query.contains(&("exclude", "toll,ferry".to_string())));
        assert!(query.contains(&("geometries", "geojson".to_string())));
    }

    #[test]
    fn plain_driving_has_no_congestion_or_exclude() {
        let request = RouteRequest::new(GeoPoint::new(0.0, 0.0), GeoPoint::new(0.02, 0.0));
        let query = directions_query(&request);
        assert!(query.iter().all(|(k, _)| *k != "annotations" && *k != "exclude"));
    }

    #[test]
    fn config_defaults_from_json() {
        let config: MapboxConfig = serde_json::from_str(r#"{"access_token": "pk.test"}"#).unwrap();
        assert_eq!(config.base_url, "https://api.mapbox.com");
        assert_eq!(config.timeout_ms, 15_000);
    }
}
