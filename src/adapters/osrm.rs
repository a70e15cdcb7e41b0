//! OSRM Routing - Implementation of RoutingService against an OSRM server.
//!
//! Calls the `route/v1/{profile}` endpoint with the two points and maps
//! OSRM's response codes onto `RoutingError`.
//!
//! # Configuration
//!
//! ```ignore
//! let config = OsrmConfig::new("https://router.project-osrm.org")
//!     .with_profile("driving")
//!     .with_timeout(Duration::from_secs(5));
//!
//! let routing = OsrmRoutingService::new(config)?;
//! ```

use async_trait::async_trait;
use reqwest::{Client, Response};
use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use std::time::Duration;

use crate::domain::ride::{LocationPoint, RouteInfo, RouteShapeRef};
use crate::ports::{RoutingError, RoutingService};

/// Configuration for the OSRM adapter.
#[derive(Debug, Clone)]
pub struct OsrmConfig {
    /// Server base URL, without trailing slash.
    pub base_url: String,
    /// Routing profile (e.g. "driving").
    pub profile: String,
    /// Request timeout.
    pub timeout: Duration,
    /// Access token for hosted OSRM-compatible services.
    api_key: Option<Secret<String>>,
}

impl OsrmConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            profile: "driving".to_string(),
            timeout: Duration::from_secs(10),
            api_key: None,
        }
    }

    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = profile.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_api_key(mut self, key: Secret<String>) -> Self {
        self.api_key = Some(key);
        self
    }

    fn api_key(&self) -> Option<&str> {
        self.api_key.as_ref().map(|key| key.expose_secret().as_str())
    }
}

/// OSRM routing service.
pub struct OsrmRoutingService {
    config: OsrmConfig,
    client: Client,
}

impl OsrmRoutingService {
    /// Creates the service.
    ///
    /// # Errors
    ///
    /// - `Unavailable` if the HTTP client cannot be built
    pub fn new(config: OsrmConfig) -> Result<Self, RoutingError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| RoutingError::Unavailable(format!("failed to create HTTP client: {}", e)))?;
        Ok(Self { config, client })
    }

    fn route_url(&self, from: &LocationPoint, to: &LocationPoint) -> String {
        route_url(&self.config, from, to)
    }

    async fn send_request(&self, url: String) -> Result<Response, RoutingError> {
        let mut request = self.client.get(url);
        if let Some(key) = self.config.api_key() {
            request = request.query(&[("access_token", key)]);
        }
        request.send().await.map_err(|e| {
            if e.is_timeout() {
                RoutingError::Network(format!(
                    "request timed out after {}s",
                    self.config.timeout.as_secs()
                ))
            } else if e.is_connect() {
                RoutingError::Network(format!("connection failed: {}", e))
            } else {
                RoutingError::Network(e.to_string())
            }
        })
    }
}

#[async_trait]
impl RoutingService for OsrmRoutingService {
    async fn calculate_route(
        &self,
        from: &LocationPoint,
        to: &LocationPoint,
    ) -> Result<RouteInfo, RoutingError> {
        let response = self.send_request(self.route_url(from, to)).await?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| RoutingError::Network(format!("failed to read response: {}", e)))?;

        // OSRM reports NoRoute/NoSegment as 400 with a JSON body.
        if status.is_server_error() {
            return Err(RoutingError::Unavailable(format!(
                "server error {}: {}",
                status, body
            )));
        }
        parse_route_response(&body)
    }
}

/// Builds the route URL. OSRM expects `lon,lat` order.
fn route_url(config: &OsrmConfig, from: &LocationPoint, to: &LocationPoint) -> String {
    format!(
        "{}/route/v1/{}/{:.6},{:.6};{:.6},{:.6}?overview=full&geometries=polyline",
        config.base_url,
        config.profile,
        from.coordinate().longitude(),
        from.coordinate().latitude(),
        to.coordinate().longitude(),
        to.coordinate().latitude(),
    )
}

#[derive(Debug, Deserialize)]
struct OsrmResponse {
    code: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    routes: Vec<OsrmRoute>,
}

#[derive(Debug, Deserialize)]
struct OsrmRoute {
    distance: f64,
    duration: f64,
    #[serde(default)]
    geometry: Option<String>,
}

fn parse_route_response(body: &str) -> Result<RouteInfo, RoutingError> {
    let response: OsrmResponse = serde_json::from_str(body)
        .map_err(|e| RoutingError::Parse(format!("failed to parse response: {}", e)))?;

    let message = response.message.unwrap_or_default();
    match response.code.as_str() {
        "Ok" => {}
        "NoRoute" => return Err(RoutingError::NoRoute),
        "NoSegment" => return Err(segment_error(message)),
        other => {
            return Err(RoutingError::Unavailable(format!("{}: {}", other, message)));
        }
    }

    let route = response
        .routes
        .into_iter()
        .next()
        .ok_or(RoutingError::NoRoute)?;
    let info = RouteInfo::new(route.distance, route.duration)
        .map_err(|e| RoutingError::Parse(e.to_string()))?;
    Ok(match route.geometry {
        Some(polyline) => info.with_shape(RouteShapeRef::new(polyline)),
        None => info,
    })
}

/// NoSegment names the offending input: "coordinate 0" is the origin.
fn segment_error(message: String) -> RoutingError {
    if message.contains("coordinate 0") {
        RoutingError::InvalidOrigin(message)
    } else if message.contains("coordinate 1") {
        RoutingError::InvalidDestination(message)
    } else {
        RoutingError::NoRoute
    }
}
