//! Google Geocoding API adapter.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::GeocodeError;
use crate::model::Coordinate;
use crate::traits::Geocoder;

pub const API_KEY_ENV: &str = "GOOGLE_MAPS_API_KEY";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeocoderConfig {
    pub base_url: String,
    /// Usually supplied through `GOOGLE_MAPS_API_KEY` rather than the config file.
    #[serde(skip_serializing)]
    pub api_key: String,
    pub timeout_secs: u64,
}

impl Default for GeocoderConfig {
    fn default() -> Self {
        Self {
            base_url: "https://maps.googleapis.com/maps/api/geocode/json".to_string(),
            api_key: String::new(),
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GoogleGeocoder {
    config: GeocoderConfig,
    client: reqwest::blocking::Client,
}

impl GoogleGeocoder {
    /// Builds the HTTP client. No request is made until the first lookup.
    pub fn new(config: GeocoderConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { config, client })
    }
}

impl Geocoder for GoogleGeocoder {
    fn geocode(&self, address: &str) -> Result<Option<Coordinate>, GeocodeError> {
        if self.config.api_key.is_empty() {
            return Err(GeocodeError::MissingApiKey);
        }
        let response = self
            .client
            .get(&self.config.base_url)
            .query(&[("address", address), ("key", self.config.api_key.as_str())])
            .send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(GeocodeError::Http(status.as_u16()));
        }

        let body = response.json::<GeocodeResponse>()?;
        let coordinate = body.into_coordinate()?;
        debug!(address, found = coordinate.is_some(), "geocoded");
        Ok(coordinate)
    }
}

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    status: String,
    #[serde(default)]
    results: Vec<GeocodeResult>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    geometry: Geometry,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    location: Location,
}

#[derive(Debug, Deserialize)]
struct Location {
    lat: f64,
    lng: f64,
}

impl GeocodeResponse {
    /// `ZERO_RESULTS` is the only status treated as a definitive "no match".
    fn into_coordinate(self) -> Result<Option<Coordinate>, GeocodeError> {
        match self.status.as_str() {
            "OK" => self
                .results
                .into_iter()
                .next()
                .map(|result| Some(Coordinate::new(result.geometry.location.lat, result.geometry.location.lng)))
                .ok_or(GeocodeError::MalformedResponse),
            "ZERO_RESULTS" => Ok(None),
            _ => Err(GeocodeError::Provider { status: self.status }),
        }
    }
}
