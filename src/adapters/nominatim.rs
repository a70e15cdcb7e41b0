//! Nominatim Geocoding - Implementation of GeocodingService for
//! OpenStreetMap's Nominatim search API.
//!
//! Nominatim's usage policy requires an identifying User-Agent, so one is
//! always configured.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use crate::domain::foundation::Coordinate;
use crate::ports::{GeocodedAddress, GeocodingError, GeocodingService};

/// Configuration for the Nominatim adapter.
#[derive(Debug, Clone)]
pub struct NominatimConfig {
    pub base_url: String,
    pub user_agent: String,
    pub timeout: Duration,
}

impl NominatimConfig {
    pub fn new(base_url: impl Into<String>, user_agent: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            user_agent: user_agent.into(),
            timeout: Duration::from_secs(10),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

pub struct NominatimGeocoder {
    config: NominatimConfig,
    client: Client,
}

impl NominatimGeocoder {
    /// # Errors
    ///
    /// - `Unavailable` if the HTTP client cannot be built
    pub fn new(config: NominatimConfig) -> Result<Self, GeocodingError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| {
                GeocodingError::Unavailable(format!("failed to create HTTP client: {}", e))
            })?;
        Ok(Self { config, client })
    }

    fn search_url(&self) -> String {
        format!("{}/search", self.config.base_url)
    }
}

#[async_trait]
impl GeocodingService for NominatimGeocoder {
    async fn geocode(&self, address: &str) -> Result<GeocodedAddress, GeocodingError> {
        let address = address.trim();
        if address.is_empty() {
            return Err(GeocodingError::EmptyAddress);
        }

        let response = self
            .client
            .get(self.search_url())
            .query(&[("q", address), ("format", "jsonv2"), ("limit", "1")])
            .send()
            .await
            .map_err(|e| GeocodingError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GeocodingError::Unavailable(format!(
                "unexpected status {}: {}",
                status, body
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| GeocodingError::Network(e.to_string()))?;
        parse_search_response(address, &body)
    }
}

#[derive(Debug, Deserialize)]
struct Place {
    lat: String,
    lon: String,
    display_name: String,
}

fn parse_search_response(address: &str, body: &str) -> Result<GeocodedAddress, GeocodingError> {
    let places: Vec<Place> = serde_json::from_str(body)
        .map_err(|e| GeocodingError::Parse(format!("failed to parse response: {}", e)))?;
    let place = places
        .into_iter()
        .next()
        .ok_or_else(|| GeocodingError::NotFound(address.to_string()))?;

    let latitude = parse_degrees("lat", &place.lat)?;
    let longitude = parse_degrees("lon", &place.lon)?;
    let coordinate =
        Coordinate::new(latitude, longitude).map_err(|e| GeocodingError::Parse(e.to_string()))?;
    Ok(GeocodedAddress::new(coordinate, place.display_name))
}

fn parse_degrees(field: &str, raw: &str) -> Result<f64, GeocodingError> {
    raw.parse()
        .map_err(|_| GeocodingError::Parse(format!("{} is not a number: {}", field, raw)))
}
