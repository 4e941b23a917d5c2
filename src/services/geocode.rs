use crate::core::search::Geocoder;
use crate::models::GeoPoint;
use crate::services::StoreError;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

/// Geocoding client resolving a postal code to coordinates.
///
/// Speaks the MapQuest-style geocoding shape:
/// `GET {api_url}?key={key}&location={zip}` with the first location's
/// `latLng` as the result.
pub struct GeocodeClient {
    api_url: String,
    api_key: String,
    client: Client,
}

impl GeocodeClient {
    pub fn new(api_url: String, api_key: String) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            api_url,
            api_key,
            client,
        }
    }
}

#[async_trait]
impl Geocoder for GeocodeClient {
    async fn locate(&self, postal_code: &str) -> Result<GeoPoint, StoreError> {
        let url = format!(
            "{}?key={}&location={}",
            self.api_url,
            self.api_key,
            urlencoding::encode(postal_code)
        );

        tracing::debug!("Geocoding postal code {}", postal_code);

        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(StoreError::Api(format!(
                "geocoder returned {}",
                response.status()
            )));
        }

        let body: Value = response.json().await?;

        let lat_lng = body
            .get("results")
            .and_then(|r| r.get(0))
            .and_then(|r| r.get("locations"))
            .and_then(|l| l.get(0))
            .and_then(|l| l.get("latLng"));

        let Some(lat_lng) = lat_lng else {
            return Err(StoreError::NotFound(format!(
                "no geocoding result for {}",
                postal_code
            )));
        };

        let (Some(latitude), Some(longitude)) = (
            lat_lng.get("lat").and_then(Value::as_f64),
            lat_lng.get("lng").and_then(Value::as_f64),
        ) else {
            return Err(StoreError::InvalidResponse(
                "latLng missing lat/lng values".to_string(),
            ));
        };

        Ok(GeoPoint {
            latitude,
            longitude,
        })
    }
}
