//! Mapbox-compatible HTTP clients for the [`DirectionsClient`] and
//! [`RoadSnapClient`] ports.

use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use serde::Deserialize;

use nav_core::{GeoPoint, RoutingProfile};
use nav_route::{DirectionsClient, DirectionsError, RoadSnapClient, RoutePlan, RouteRequest, SnapError};

use crate::response::{parse_directions, parse_matching};

pub const DEFAULT_BASE_URL: &str = "https://api.mapbox.com";

/// Endpoint and credentials shared by both clients.
#[derive(Clone, Debug, Deserialize)]
pub struct MapboxConfig {
    #[serde(default = "default_base_url")]
    pub base_url:     String,
    pub access_token: String,
    /// Transport-level timeout.  The session applies its own bound on top.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms:   u64,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout_ms() -> u64 {
    15_000
}

impl MapboxConfig {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            base_url:     default_base_url(),
            access_token: access_token.into(),
            timeout_ms:   default_timeout_ms(),
        }
    }

    fn http_client(&self) -> reqwest::Result<reqwest::Client> {
        reqwest::Client::builder()
            .timeout(Duration::from_millis(self.timeout_ms))
            .build()
    }
}

/// `lon,lat;lon,lat;…` as the path segment of both APIs.
pub fn coordinate_path(points: &[GeoPoint]) -> String {
    points
        .iter()
        .map(GeoPoint::to_string)
        .collect::<Vec<_>>()
        .join(";")
}

/// Query parameters of a directions request, without the access token.
pub fn directions_query(request: &RouteRequest) -> Vec<(&'static str, String)> {
    let mut query = vec![
        ("geometries", "geojson".to_string()),
        ("overview",   "full".to_string()),
        ("steps",      "true".to_string()),
    ];
    // Congestion annotations only exist for the traffic-aware profile.
    if request.profile == RoutingProfile::DrivingTraffic {
        query.push(("annotations", "congestion".to_string()));
    }
    if !request.avoid.is_empty() {
        query.push(("exclude", request.avoid.to_string()));
    }
    query
}

fn is_transient(status: reqwest::StatusCode) -> bool {
    status.is_server_error() || status == reqwest::StatusCode::TOO_MANY_REQUESTS
}

// ── Directions ────────────────────────────────────────────────────────────────

/// Directions API client.
#[derive(Clone, Debug)]
pub struct MapboxDirections {
    http:   reqwest::Client,
    config: MapboxConfig,
}

impl MapboxDirections {
    pub fn new(config: MapboxConfig) -> reqwest::Result<Self> {
        Ok(Self { http: config.http_client()?, config })
    }

    /// Share an existing connection pool.
    pub fn with_client(http: reqwest::Client, config: MapboxConfig) -> Self {
        Self { http, config }
    }

    fn url(&self, request: &RouteRequest) -> String {
        format!(
            "{}/directions/v5/mapbox/{}/{}",
            self.config.base_url.trim_end_matches('/'),
            request.profile.as_str(),
            coordinate_path(&request.waypoints()),
        )
    }
}

#[async_trait]
impl DirectionsClient for MapboxDirections {
    async fn compute_route(&self, request: &RouteRequest) -> Result<RoutePlan, DirectionsError> {
        let url = self.url(request);
        debug!("GET {url}");

        let response = self
            .http
            .get(&url)
            .query(&directions_query(request))
            .query(&[("access_token", self.config.access_token.as_str())])
            .send()
            .await
            .map_err(|e| DirectionsError::Network(format!("GET request failed: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| DirectionsError::Network(format!("reading response failed: {e}")))?;

        if is_transient(status) {
            return Err(DirectionsError::Network(format!("provider answered {status}")));
        }
        parse_directions(&body)
    }
}

// ── Map matching ──────────────────────────────────────────────────────────────

/// Map Matching API client used for road-snapping.
#[derive(Clone, Debug)]
pub struct MapboxMapMatching {
    http:    reqwest::Client,
    config:  MapboxConfig,
    profile: RoutingProfile,
}

impl MapboxMapMatching {
    pub fn new(config: MapboxConfig) -> reqwest::Result<Self> {
        Ok(Self { http: config.http_client()?, config, profile: RoutingProfile::Driving })
    }

    pub fn with_client(http: reqwest::Client, config: MapboxConfig) -> Self {
        Self { http, config, profile: RoutingProfile::Driving }
    }

    pub fn with_profile(mut self, profile: RoutingProfile) -> Self {
        // Matching has no traffic-aware variant.
        self.profile = match profile {
            RoutingProfile::DrivingTraffic => RoutingProfile::Driving,
            other => other,
        };
        self
    }

    fn url(&self, previous: GeoPoint, current: GeoPoint) -> String {
        format!(
            "{}/matching/v5/mapbox/{}/{}",
            self.config.base_url.trim_end_matches('/'),
            self.profile.as_str(),
            coordinate_path(&[previous, current]),
        )
    }
}

#[async_trait]
impl RoadSnapClient for MapboxMapMatching {
    async fn snap_to_road(&self, previous: GeoPoint, current: GeoPoint) -> Result<GeoPoint, SnapError> {
        let response = self
            .http
            .get(self.url(previous, current))
            .query(&[
                ("geometries",   "geojson"),
                ("overview",     "full"),
                ("access_token", self.config.access_token.as_str()),
            ])
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    SnapError::Timeout
                } else {
                    SnapError::Network(e.to_string())
                }
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| SnapError::Network(e.to_string()))?;
        if is_transient(status) {
            return Err(SnapError::Network(format!("provider answered {status}")));
        }
        parse_matching(&body)
    }
}
