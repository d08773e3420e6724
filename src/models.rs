use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

// ============ Record Store Models ============

/// One raw row as returned by the record store. Column names vary between
/// tables and over time, so fields stay an untyped JSON map until the
/// normalizer resolves them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawRecord {
    pub id: String,
    #[serde(default)]
    pub fields: serde_json::Map<String, serde_json::Value>,
}

/// One page of the record store listing.
#[derive(Debug, Deserialize)]
pub struct RecordPage {
    #[serde(default)]
    pub records: Vec<serde_json::Value>,
    /// Cursor for the next page; absent on the last page.
    pub offset: Option<String>,
}

// ============ Domain Models ============

/// A geographic point in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    pub fn is_finite(&self) -> bool {
        self.lat.is_finite() && self.lng.is_finite()
    }
}

/// A single healthcare professional, clinic or location from the directory.
///
/// Rebuilt from the record store on every load. Absent text fields are empty
/// strings and absent coordinates are NaN, so no field is ever missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Provider {
    pub id: String,
    pub name: String,
    pub address: String,
    pub municipality: String,
    pub state: String,
    pub lat: f64,
    pub lng: f64,
    pub provider_type: String,
    pub profession: String,
    pub specialty: String,
    pub sub_specialty: String,
    /// Canonical campaign labels, deduplicated, in first-seen order.
    pub campaign_tags: Vec<String>,
    pub phone: String,
    pub email: String,
}

impl Provider {
    /// Coordinates usable for distance computation; `None` unless both
    /// components are finite.
    pub fn coordinates(&self) -> Option<Coordinates> {
        let coords = Coordinates::new(self.lat, self.lng);
        coords.is_finite().then_some(coords)
    }
}

/// Travel distance and duration from the origin to one destination.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TravelStats {
    pub distance_meters: f64,
    pub duration_seconds: f64,
}

/// Distance in meters to kilometers, rounded to one decimal place.
pub fn meters_to_km(meters: f64) -> f64 {
    (meters / 1000.0 * 10.0).round() / 10.0
}

/// Duration in seconds to whole minutes, rounded to nearest.
pub fn seconds_to_minutes(seconds: f64) -> i64 {
    (seconds / 60.0).round() as i64
}

/// Filter criteria for one search request.
#[derive(Debug, Clone, Default)]
pub struct SearchCriteria {
    pub origin_address: String,
    /// Canonical campaign labels; empty means no campaign constraint.
    pub campaigns: Vec<String>,
    pub provider_type: Option<String>,
    pub profession: Option<String>,
    pub specialty: Option<String>,
    pub sub_specialty: Option<String>,
    pub result_limit: usize,
}

/// A provider with its computed travel stats.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedResult {
    pub provider: Provider,
    pub distance_meters: f64,
    pub duration_seconds: f64,
}

/// Outcome of the search pipeline before it is shaped for the wire.
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub origin: Coordinates,
    pub results: Vec<RankedResult>,
}

// ============ API Models ============

/// Query string of `GET /api/v1/providers`.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct SearchQueryParams {
    /// Free-text origin address (required).
    pub address: Option<String>,
    /// Comma-separated campaign labels, canonical or raw.
    pub campaigns: Option<String>,
    #[serde(rename = "type")]
    pub provider_type: Option<String>,
    pub profession: Option<String>,
    pub specialty: Option<String>,
    pub sub_specialty: Option<String>,
    /// Maximum number of results.
    pub limit: Option<String>,
}

/// One ranked provider as exposed to presentation layers.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RankedProviderView {
    pub id: String,
    pub name: String,
    pub address: String,
    pub municipality: String,
    pub state: String,
    pub lat: f64,
    pub lng: f64,
    pub provider_type: String,
    pub profession: String,
    pub specialty: String,
    pub sub_specialty: String,
    pub campaign_tags: Vec<String>,
    pub phone: String,
    pub email: String,
    pub distance_km: f64,
    pub duration_min: i64,
}

impl From<RankedResult> for RankedProviderView {
    fn from(ranked: RankedResult) -> Self {
        let p = ranked.provider;
        Self {
            id: p.id,
            name: p.name,
            address: p.address,
            municipality: p.municipality,
            state: p.state,
            lat: p.lat,
            lng: p.lng,
            provider_type: p.provider_type,
            profession: p.profession,
            specialty: p.specialty,
            sub_specialty: p.sub_specialty,
            campaign_tags: p.campaign_tags,
            phone: p.phone,
            email: p.email,
            distance_km: meters_to_km(ranked.distance_meters),
            duration_min: seconds_to_minutes(ranked.duration_seconds),
        }
    }
}

/// Response body of `GET /api/v1/providers`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SearchResponse {
    pub origin: Coordinates,
    pub count: usize,
    pub results: Vec<RankedProviderView>,
}

impl From<SearchOutcome> for SearchResponse {
    fn from(outcome: SearchOutcome) -> Self {
        let results: Vec<RankedProviderView> =
            outcome.results.into_iter().map(Into::into).collect();
        Self {
            origin: outcome.origin,
            count: results.len(),
            results,
        }
    }
}

/// Distinct sorted values per filterable dimension.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Facets {
    pub types: Vec<String>,
    pub professions: Vec<String>,
    pub specialties: Vec<String>,
    pub sub_specialties: Vec<String>,
    pub campaigns: Vec<String>,
}

/// A distinct profession/specialty/sub-specialty combination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClinicalCombo {
    pub profession: String,
    pub specialty: String,
    pub sub_specialty: String,
    pub label: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ClinicalCombosResponse {
    pub campaign: Option<String>,
    pub total: usize,
    pub combos: Vec<ClinicalCombo>,
}

/// A static secondary location drawn next to providers for some campaigns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct StaticPin {
    pub name: String,
    pub address: String,
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StaticPinsResponse {
    pub campaign: String,
    pub color: String,
    pub pins: Vec<StaticPin>,
}

/// Query string shared by the campaign-scoped endpoints.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CampaignQuery {
    pub campaign: Option<String>,
}

/// One raw header observed in the record store sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FieldSeen {
    pub name: String,
    pub count: usize,
    /// Logical field this header resolves to, if any.
    pub resolves_to: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FieldsReport {
    pub table: String,
    pub sample: usize,
    pub fields_seen: Vec<FieldSeen>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_conversions_round() {
        assert_eq!(meters_to_km(12_345.0), 12.3);
        assert_eq!(meters_to_km(12_350.0), 12.4);
        assert_eq!(meters_to_km(0.0), 0.0);
        assert_eq!(seconds_to_minutes(89.0), 1);
        assert_eq!(seconds_to_minutes(90.0), 2);
        assert_eq!(seconds_to_minutes(29.0), 0);
    }

    #[test]
    fn test_coordinates_gate() {
        let mut provider = Provider {
            id: "rec1".into(),
            name: String::new(),
            address: String::new(),
            municipality: String::new(),
            state: String::new(),
            lat: 19.4,
            lng: f64::NAN,
            provider_type: String::new(),
            profession: String::new(),
            specialty: String::new(),
            sub_specialty: String::new(),
            campaign_tags: vec![],
            phone: String::new(),
            email: String::new(),
        };
        assert!(provider.coordinates().is_none());

        provider.lng = -99.16;
        assert_eq!(provider.coordinates(), Some(Coordinates::new(19.4, -99.16)));

        provider.lat = f64::INFINITY;
        assert!(provider.coordinates().is_none());
    }

    #[test]
    fn test_search_response_counts_results() {
        let outcome = SearchOutcome {
            origin: Coordinates::new(19.4, -99.16),
            results: vec![],
        };
        let response = SearchResponse::from(outcome);
        assert_eq!(response.count, 0);
        assert!(response.results.is_empty());
    }
}
