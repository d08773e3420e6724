use crate::circuit_breaker::{create_upstream_circuit_breaker, UpstreamBreaker};
use crate::config::Config;
use crate::errors::{AppError, GeocodeError};
use crate::models::Coordinates;
use failsafe::futures::CircuitBreaker;
use reqwest::Client;
use serde::Deserialize;
use url::Url;

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    #[serde(default)]
    features: Vec<GeocodeFeature>,
}

#[derive(Debug, Deserialize)]
struct GeocodeFeature {
    /// `[lng, lat]`
    #[serde(default)]
    center: Vec<f64>,
}

/// Forward geocoding against the Mapbox places API.
#[derive(Clone)]
pub struct MapboxGeocoder {
    client: Client,
    base_url: String,
    token: String,
    country: String,
    language: String,
    breaker: UpstreamBreaker,
}

impl MapboxGeocoder {
    pub fn new(config: &Config) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(config.upstream_timeout())
            .connect_timeout(config.upstream_timeout())
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create geocoder client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.mapbox_base_url.clone(),
            token: config.mapbox_token.clone(),
            country: config.mapbox_country.clone(),
            language: config.mapbox_language.clone(),
            breaker: create_upstream_circuit_breaker(),
        })
    }

    fn geocode_url(&self, address: &str) -> Result<Url, GeocodeError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| GeocodeError::ServiceUnavailable(format!("Invalid Mapbox URL: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| GeocodeError::ServiceUnavailable("Mapbox URL cannot be a base".into()))?
            .pop_if_empty()
            .extend(["geocoding", "v5", "mapbox.places"])
            .push(&format!("{}.json", address));
        url.query_pairs_mut()
            .append_pair("access_token", &self.token)
            .append_pair("limit", "1")
            .append_pair("language", &self.language)
            .append_pair("country", &self.country);
        Ok(url)
    }

    /// Resolves a free-text address to coordinates with exactly one request.
    ///
    /// # Errors
    ///
    /// * [`GeocodeError::NotFound`] when the service returns no usable match.
    /// * [`GeocodeError::ServiceUnavailable`] on network, HTTP, timeout or
    ///   decoding failure, or while the circuit breaker is open.
    pub async fn geocode(&self, address: &str) -> Result<Coordinates, GeocodeError> {
        let url = self.geocode_url(address)?;
        tracing::debug!("Geocoding address ({} chars)", address.chars().count());

        // Ok(None) is a successful call with no match, so it does not trip the breaker
        let request = async {
            let response = self.client.get(url).send().await.map_err(|e| {
                GeocodeError::ServiceUnavailable(format!(
                    "Geocoding request failed: {}",
                    e.without_url()
                ))
            })?;

            if !response.status().is_success() {
                let status = response.status();
                return Err(GeocodeError::ServiceUnavailable(format!(
                    "Geocoding service returned {}",
                    status
                )));
            }

            let body: GeocodeResponse = response.json().await.map_err(|e| {
                GeocodeError::ServiceUnavailable(format!(
                    "Failed to parse geocoding response: {}",
                    e.without_url()
                ))
            })?;

            Ok(body.features.into_iter().next().and_then(|feature| {
                match feature.center.as_slice() {
                    [lng, lat] => Some(Coordinates::new(*lat, *lng)).filter(Coordinates::is_finite),
                    _ => None,
                }
            }))
        };

        match self.breaker.call(request).await {
            Ok(Some(coords)) => {
                tracing::debug!("Geocoded to ({}, {})", coords.lat, coords.lng);
                Ok(coords)
            }
            Ok(None) => {
                tracing::debug!("No geocoding candidates");
                Err(GeocodeError::NotFound)
            }
            Err(failsafe::Error::Inner(e)) => {
                tracing::error!("{}", e);
                Err(e)
            }
            Err(failsafe::Error::Rejected) => Err(GeocodeError::ServiceUnavailable(
                "Geocoding circuit open".to_string(),
            )),
        }
    }
}
