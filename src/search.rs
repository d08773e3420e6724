/// Provider search pipeline
///
/// 1. Geocode the origin address (fatal on failure)
/// 2. Load and normalize the directory
/// 3. Keep providers with finite coordinates that pass every filter
/// 4. Batch travel stats from the origin to each candidate
/// 5. Drop candidates without stats, sort by duration, truncate
use crate::campaigns::matches_any;
use crate::config::Config;
use crate::directory::DirectorySource;
use crate::distance_matrix::MatrixClient;
use crate::errors::{AppError, ResultExt};
use crate::geocoder::MapboxGeocoder;
use crate::models::{Coordinates, Provider, RankedResult, SearchCriteria, SearchOutcome, TravelStats};

fn equals_filter(value: &str, filter: Option<&String>) -> bool {
    match filter.map(|f| f.trim()).filter(|f| !f.is_empty()) {
        Some(wanted) => value.trim().to_lowercase() == wanted.to_lowercase(),
        None => true,
    }
}

/// True when the provider satisfies every active filter of `criteria`.
/// Coordinates are not checked here.
pub fn matches_criteria(provider: &Provider, criteria: &SearchCriteria) -> bool {
    matches_any(&provider.campaign_tags, &criteria.campaigns)
        && equals_filter(&provider.provider_type, criteria.provider_type.as_ref())
        && equals_filter(&provider.profession, criteria.profession.as_ref())
        && equals_filter(&provider.specialty, criteria.specialty.as_ref())
        && equals_filter(&provider.sub_specialty, criteria.sub_specialty.as_ref())
}

/// Providers eligible for ranking: finite coordinates and every filter
/// passed, in directory order.
pub fn filter_providers<'a>(providers: &'a [Provider], criteria: &SearchCriteria) -> Vec<&'a Provider> {
    providers
        .iter()
        .filter(|p| p.coordinates().is_some())
        .filter(|p| matches_criteria(p, criteria))
        .collect()
}

/// Merges travel stats onto candidates (aligned by position), drops those
/// without a finite duration, sorts ascending by duration and truncates.
///
/// The sort is stable, so equal durations keep candidate order.
pub fn rank_results(
    candidates: &[&Provider],
    stats: &[Option<TravelStats>],
    limit: usize,
) -> Vec<RankedResult> {
    let mut ranked: Vec<RankedResult> = candidates
        .iter()
        .zip(stats)
        .filter_map(|(provider, stat)| {
            let stat = (*stat)?;
            stat.duration_seconds.is_finite().then(|| RankedResult {
                provider: (*provider).clone(),
                distance_meters: stat.distance_meters,
                duration_seconds: stat.duration_seconds,
            })
        })
        .collect();

    ranked.sort_by(|a, b| a.duration_seconds.total_cmp(&b.duration_seconds));
    ranked.truncate(limit);
    ranked
}

/// Top-level search service. Holds no per-request state, so one instance
/// serves concurrent searches.
#[derive(Clone)]
pub struct ProviderSearch {
    geocoder: MapboxGeocoder,
    directory: DirectorySource,
    matrix: MatrixClient,
}

impl ProviderSearch {
    pub fn new(geocoder: MapboxGeocoder, directory: DirectorySource, matrix: MatrixClient) -> Self {
        Self {
            geocoder,
            directory,
            matrix,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self, AppError> {
        Ok(Self::new(
            MapboxGeocoder::new(config)?,
            DirectorySource::from_config(config)?,
            MatrixClient::new(config)?,
        ))
    }

    pub fn directory(&self) -> &DirectorySource {
        &self.directory
    }

    /// Runs the search pipeline.
    ///
    /// # Errors
    ///
    /// * `InvalidRequest` if the address is empty or the limit is zero;
    ///   nothing external is called.
    /// * `AddressNotFound` / `UpstreamUnavailable` if geocoding fails.
    /// * `UpstreamUnavailable` if the directory cannot be read.
    ///
    /// No matches, or every distance chunk failing, is an empty result and
    /// not an error.
    pub async fn search(&self, criteria: &SearchCriteria) -> Result<SearchOutcome, AppError> {
        let address = criteria.origin_address.trim();
        if address.is_empty() {
            return Err(AppError::InvalidRequest("address is required".to_string()));
        }
        if criteria.result_limit == 0 {
            return Err(AppError::InvalidRequest(
                "limit must be a positive integer".to_string(),
            ));
        }

        let origin: Coordinates = self
            .geocoder
            .geocode(address)
            .await
            .map_err(AppError::from)
            .context("geocoding search origin")?;

        let providers = self
            .directory
            .load()
            .await
            .context("loading provider directory")?;

        let candidates = filter_providers(&providers, criteria);
        tracing::info!(
            "Search: {} of {} provider(s) pass filters",
            candidates.len(),
            providers.len()
        );
        if candidates.is_empty() {
            return Ok(SearchOutcome {
                origin,
                results: Vec::new(),
            });
        }

        let destinations: Vec<Coordinates> = candidates
            .iter()
            .filter_map(|p| p.coordinates())
            .collect();
        let stats = self.matrix.compute_travel_stats(origin, &destinations).await;

        let results = rank_results(&candidates, &stats, criteria.result_limit);
        tracing::info!(
            "Search: returning {} result(s) (limit {})",
            results.len(),
            criteria.result_limit
        );

        Ok(SearchOutcome { origin, results })
    }
}
