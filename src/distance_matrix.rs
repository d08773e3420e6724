//! Batched travel distance/duration lookups against the Mapbox Matrix API.

use crate::config::{Config, MATRIX_DESTINATION_CAP};
use crate::errors::AppError;
use crate::models::{Coordinates, TravelStats};
use futures::stream::{self, StreamExt};
use reqwest::Client;
use serde::Deserialize;
use url::Url;

#[derive(Debug, Deserialize)]
struct MatrixResponse {
    code: String,
    #[serde(default)]
    durations: Vec<Vec<Option<f64>>>,
    #[serde(default)]
    distances: Vec<Vec<Option<f64>>>,
}

/// Number of matrix requests needed for `destinations` eligible points.
pub fn chunk_count(destinations: usize, chunk_size: usize) -> usize {
    destinations.div_ceil(chunk_size.max(1))
}

#[derive(Clone)]
pub struct MatrixClient {
    client: Client,
    base_url: String,
    token: String,
    profile: String,
    chunk_size: usize,
    concurrency: usize,
}

impl MatrixClient {
    pub fn new(config: &Config) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(config.upstream_timeout())
            .connect_timeout(config.upstream_timeout())
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create matrix client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.mapbox_base_url.clone(),
            token: config.mapbox_token.clone(),
            profile: config.mapbox_profile.clone(),
            chunk_size: config.matrix_max_destinations.clamp(1, MATRIX_DESTINATION_CAP),
            concurrency: config.matrix_concurrency.max(1),
        })
    }

    fn matrix_url(&self, origin: Coordinates, chunk: &[Coordinates]) -> Result<Url, AppError> {
        let coords = std::iter::once(origin)
            .chain(chunk.iter().copied())
            .map(|c| format!("{},{}", c.lng, c.lat))
            .collect::<Vec<_>>()
            .join(";");

        let mut url = Url::parse(&self.base_url)
            .map_err(|e| AppError::Internal(format!("Invalid Mapbox URL: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| AppError::Internal("Mapbox URL cannot be a base".to_string()))?
            .pop_if_empty()
            .extend(["directions-matrix", "v1", "mapbox", self.profile.as_str()])
            .push(&coords);
        url.query_pairs_mut()
            .append_pair("access_token", &self.token)
            .append_pair("annotations", "distance,duration")
            .append_pair("sources", "0");
        Ok(url)
    }

    /// Travel stats from `origin` to every destination, aligned by position.
    ///
    /// Destinations without finite coordinates are never sent and get `None`.
    /// The rest are split into chunks of at most the service cap; chunks run
    /// in order (at most `concurrency` in flight) and a failed chunk leaves
    /// its destinations at `None` without affecting the others.
    pub async fn compute_travel_stats(
        &self,
        origin: Coordinates,
        destinations: &[Coordinates],
    ) -> Vec<Option<TravelStats>> {
        let mut results: Vec<Option<TravelStats>> = vec![None; destinations.len()];
        if !origin.is_finite() {
            tracing::warn!("Matrix origin is not finite, skipping distance computation");
            return results;
        }

        let eligible: Vec<usize> = destinations
            .iter()
            .enumerate()
            .filter(|(_, c)| c.is_finite())
            .map(|(i, _)| i)
            .collect();
        if eligible.is_empty() {
            return results;
        }

        let chunks: Vec<Vec<usize>> = eligible
            .chunks(self.chunk_size)
            .map(<[usize]>::to_vec)
            .collect();
        let total_chunks = chunks.len();
        tracing::debug!(
            "Matrix: {} destination(s) in {} chunk(s) of up to {}",
            eligible.len(),
            total_chunks,
            self.chunk_size
        );

        // buffered() yields in submission order whatever the completion order
        let mut responses = stream::iter(chunks.into_iter().enumerate())
            .map(|(chunk_no, indices)| async move {
                let points: Vec<Coordinates> = indices.iter().map(|&i| destinations[i]).collect();
                let outcome = self.request_chunk(origin, &points).await;
                (chunk_no, indices, outcome)
            })
            .buffered(self.concurrency);

        let mut failed = 0usize;
        while let Some((chunk_no, indices, outcome)) = responses.next().await {
            match outcome {
                Ok(stats) => {
                    for (slot, stat) in indices.into_iter().zip(stats) {
                        results[slot] = stat;
                    }
                }
                Err(e) => {
                    failed += 1;
                    tracing::warn!(
                        "Matrix chunk {}/{} failed, dropping {} destination(s): {}",
                        chunk_no + 1,
                        total_chunks,
                        indices.len(),
                        e
                    );
                }
            }
        }

        if failed > 0 {
            tracing::warn!("Matrix: {}/{} chunk(s) failed", failed, total_chunks);
        }
        results
    }

    /// One matrix request for `chunk`; the result has exactly `chunk.len()`
    /// entries, `None` where the service could not route.
    async fn request_chunk(
        &self,
        origin: Coordinates,
        chunk: &[Coordinates],
    ) -> Result<Vec<Option<TravelStats>>, AppError> {
        let url = self.matrix_url(origin, chunk)?;

        let response = self.client.get(url).send().await.map_err(|e| {
            AppError::UpstreamUnavailable(format!("Matrix request failed: {}", e.without_url()))
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::UpstreamUnavailable(format!(
                "Matrix service returned {}: {}",
                status, error_text
            )));
        }

        let body: MatrixResponse = response.json().await.map_err(|e| {
            AppError::UpstreamUnavailable(format!(
                "Failed to parse matrix response: {}",
                e.without_url()
            ))
        })?;

        if body.code != "Ok" {
            return Err(AppError::UpstreamUnavailable(format!(
                "Matrix service answered code {}",
                body.code
            )));
        }

        let durations = body.durations.first().map(Vec::as_slice).unwrap_or_default();
        let distances = body.distances.first().map(Vec::as_slice).unwrap_or_default();
        if durations.len() != chunk.len() + 1 || distances.len() != chunk.len() + 1 {
            return Err(AppError::UpstreamUnavailable(format!(
                "Matrix row has {} durations and {} distances for {} destination(s)",
                durations.len(),
                distances.len(),
                chunk.len()
            )));
        }

        // Column 0 is the origin itself
        Ok(durations[1..]
            .iter()
            .zip(&distances[1..])
            .map(|(duration, distance)| match (duration, distance) {
                (Some(duration), Some(distance)) if duration.is_finite() && distance.is_finite() => {
                    Some(TravelStats {
                        distance_meters: *distance,
                        duration_seconds: *duration,
                    })
                }
                _ => None,
            })
            .collect())
    }
}
