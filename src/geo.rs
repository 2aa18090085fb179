use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde::Deserialize;

/// Best-effort address lookup. Callers must treat failures as recoverable;
/// the reporting loop falls back to a formatted coordinate string.
#[async_trait]
pub trait ReverseGeocoder: Send + Sync {
    async fn reverse(&self, lat: f64, lon: f64) -> Result<String>;
}

/// Nominatim-compatible reverse geocoding over HTTP.
pub struct NominatimGeocoder {
    client: reqwest::Client,
    endpoint: String,
}

impl NominatimGeocoder {
    pub fn new(endpoint: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("hrtrack/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("failed to build geocoder HTTP client")?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }
}

#[derive(Deserialize)]
struct ReverseResponse {
    display_name: Option<String>,
}

#[async_trait]
impl ReverseGeocoder for NominatimGeocoder {
    async fn reverse(&self, lat: f64, lon: f64) -> Result<String> {
        let url = format!(
            "{}/reverse?format=jsonv2&lat={lat}&lon={lon}",
            self.endpoint.trim_end_matches('/')
        );
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .context("reverse geocode request failed")?
            .error_for_status()
            .context("reverse geocode returned an error status")?;
        let parsed: ReverseResponse = response
            .json()
            .await
            .context("reverse geocode response was not valid JSON")?;
        parsed
            .display_name
            .filter(|name| !name.trim().is_empty())
            .ok_or_else(|| anyhow!("reverse geocode response had no display name"))
    }
}

/// Used when no geocoder endpoint is configured; the reporter then always
/// records the coordinate-string fallback.
pub struct DisabledGeocoder;

#[async_trait]
impl ReverseGeocoder for DisabledGeocoder {
    async fn reverse(&self, _lat: f64, _lon: f64) -> Result<String> {
        Err(anyhow!("reverse geocoding is not configured"))
    }
}

/// The address string recorded when geocoding fails or is disabled.
pub fn coordinate_address(lat: f64, lon: f64) -> String {
    format!("{lat:.4}°, {lon:.4}°")
}

#[cfg(test)]
mod tests {
    use super::coordinate_address;

    #[test]
    fn formats_coordinates_to_four_places() {
        assert_eq!(coordinate_address(28.4595, 77.0266), "28.4595°, 77.0266°");
        assert_eq!(
            coordinate_address(12.971598, 77.594566),
            "12.9716°, 77.5946°"
        );
    }
}
