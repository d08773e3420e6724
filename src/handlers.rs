use crate::campaigns::{canonicalize, parse_campaign_list};
use crate::config::Config;
use crate::directory::FIELD_SAMPLE_SIZE;
use crate::errors::AppError;
use crate::facets::{build_clinical_combos, build_facets};
use crate::geocoder::MapboxGeocoder;
use crate::models::*;
use crate::search::ProviderSearch;
use crate::static_pins::StaticPinService;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde_json::json;
use std::sync::Arc;
use utoipa::OpenApi;

/// Shared application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Config,
    /// Search pipeline; also owns the directory source.
    pub search: ProviderSearch,
    /// Static overlay for configured campaigns.
    pub static_pins: StaticPinService,
}

impl AppState {
    pub fn from_config(config: Config) -> Result<Self, AppError> {
        let search = ProviderSearch::from_config(&config)?;
        // Own geocoder and breaker: overlay failures must not reject searches
        let static_pins = StaticPinService::new(
            config.static_pins.clone(),
            search.directory().store().clone(),
            MapboxGeocoder::new(&config)?,
        );
        Ok(Self {
            config,
            search,
            static_pins,
        })
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(search_providers, get_facets, get_clinical_combos, get_static_pins, get_field_diagnostics),
    components(schemas(
        Coordinates,
        RankedProviderView,
        SearchResponse,
        Facets,
        ClinicalCombo,
        ClinicalCombosResponse,
        StaticPin,
        StaticPinsResponse,
        FieldSeen,
        FieldsReport
    ))
)]
pub struct ApiDoc;

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Validates query parameters into search criteria.
///
/// A missing or blank address and a non-positive or non-numeric limit are
/// rejected; an absent limit takes `default_limit`.
pub fn criteria_from_params(
    params: SearchQueryParams,
    default_limit: usize,
) -> Result<SearchCriteria, AppError> {
    let origin_address = non_empty(params.address)
        .ok_or_else(|| AppError::InvalidRequest("address is required".to_string()))?;

    let result_limit = match non_empty(params.limit) {
        Some(raw) => match raw.parse::<usize>() {
            Ok(limit) if limit > 0 => limit,
            _ => {
                return Err(AppError::InvalidRequest(
                    "limit must be a positive integer".to_string(),
                ))
            }
        },
        None => default_limit,
    };

    Ok(SearchCriteria {
        origin_address,
        campaigns: params
            .campaigns
            .as_deref()
            .map(parse_campaign_list)
            .unwrap_or_default(),
        provider_type: non_empty(params.provider_type),
        profession: non_empty(params.profession),
        specialty: non_empty(params.specialty),
        sub_specialty: non_empty(params.sub_specialty),
        result_limit,
    })
}

/// Health check endpoint.
pub async fn health() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": "provider-locator",
            "version": env!("CARGO_PKG_VERSION")
        })),
    )
}

/// GET /api/v1/providers
///
/// Nearest matching providers to an address, ranked by travel time.
#[utoipa::path(
    get,
    path = "/api/v1/providers",
    params(SearchQueryParams),
    responses(
        (status = 200, description = "Ranked providers (possibly empty)", body = SearchResponse),
        (status = 400, description = "Missing address or invalid limit"),
        (status = 404, description = "Address not found"),
        (status = 503, description = "Record store or mapping service unavailable")
    )
)]
pub async fn search_providers(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchQueryParams>,
) -> Result<Json<SearchResponse>, AppError> {
    tracing::info!("GET /providers - params: {:?}", params);

    let criteria = criteria_from_params(params, state.config.default_result_limit)?;
    let outcome = state.search.search(&criteria).await?;

    Ok(Json(outcome.into()))
}

/// GET /api/v1/facets
///
/// Distinct values of every filterable dimension.
#[utoipa::path(
    get,
    path = "/api/v1/facets",
    responses(
        (status = 200, description = "Facet values", body = Facets),
        (status = 503, description = "Record store unavailable")
    )
)]
pub async fn get_facets(State(state): State<Arc<AppState>>) -> Result<Json<Facets>, AppError> {
    let providers = state.search.directory().load().await?;
    let facets = build_facets(&providers);

    tracing::info!(
        "Facets: {} types, {} professions, {} specialties, {} sub-specialties, {} campaigns",
        facets.types.len(),
        facets.professions.len(),
        facets.specialties.len(),
        facets.sub_specialties.len(),
        facets.campaigns.len()
    );

    Ok(Json(facets))
}

/// GET /api/v1/clinical-combos
///
/// Profession/specialty/sub-specialty combinations, optionally for one campaign.
#[utoipa::path(
    get,
    path = "/api/v1/clinical-combos",
    params(CampaignQuery),
    responses(
        (status = 200, description = "Clinical combinations", body = ClinicalCombosResponse),
        (status = 503, description = "Record store unavailable")
    )
)]
pub async fn get_clinical_combos(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CampaignQuery>,
) -> Result<Json<ClinicalCombosResponse>, AppError> {
    let campaign = non_empty(params.campaign).map(|c| canonicalize(&c));
    let providers = state.search.directory().load().await?;
    let combos = build_clinical_combos(&providers, campaign.as_deref());

    Ok(Json(ClinicalCombosResponse {
        campaign,
        total: combos.len(),
        combos,
    }))
}

/// GET /api/v1/static-pins
///
/// Static overlay locations for a campaign (empty unless configured).
#[utoipa::path(
    get,
    path = "/api/v1/static-pins",
    params(CampaignQuery),
    responses(
        (status = 200, description = "Overlay pins", body = StaticPinsResponse),
        (status = 400, description = "Missing campaign"),
        (status = 503, description = "Stores table or geocoder unavailable")
    )
)]
pub async fn get_static_pins(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CampaignQuery>,
) -> Result<Json<StaticPinsResponse>, AppError> {
    let campaign = non_empty(params.campaign)
        .ok_or_else(|| AppError::InvalidRequest("campaign is required".to_string()))?;

    let response = state.static_pins.pins_for(&campaign).await?;
    Ok(Json(response))
}

/// GET /api/v1/diagnostics/fields
///
/// Header names seen in a sample of the directory and what they resolve to.
#[utoipa::path(
    get,
    path = "/api/v1/diagnostics/fields",
    responses(
        (status = 200, description = "Header report", body = FieldsReport),
        (status = 503, description = "Record store unavailable")
    )
)]
pub async fn get_field_diagnostics(
    State(state): State<Arc<AppState>>,
) -> Result<Json<FieldsReport>, AppError> {
    let report = state
        .search
        .directory()
        .inspect_fields(FIELD_SAMPLE_SIZE)
        .await?;
    Ok(Json(report))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(address: Option<&str>, limit: Option<&str>) -> SearchQueryParams {
        SearchQueryParams {
            address: address.map(str::to_string),
            limit: limit.map(str::to_string),
            ..SearchQueryParams::default()
        }
    }

    #[test]
    fn test_missing_address_rejected() {
        for address in [None, Some(""), Some("   ")] {
            let err = criteria_from_params(params(address, None), 50).unwrap_err();
            assert!(matches!(err, AppError::InvalidRequest(_)));
        }
    }

    #[test]
    fn test_limit_defaults_and_validation() {
        let criteria = criteria_from_params(params(Some("Roma Norte"), None), 50).unwrap();
        assert_eq!(criteria.result_limit, 50);

        let criteria = criteria_from_params(params(Some("Roma Norte"), Some("5")), 50).unwrap();
        assert_eq!(criteria.result_limit, 5);

        for bad in ["0", "-3", "abc"] {
            let err = criteria_from_params(params(Some("Roma Norte"), Some(bad)), 50).unwrap_err();
            assert!(matches!(err, AppError::InvalidRequest(_)));
        }
    }

    #[test]
    fn test_campaigns_canonicalized() {
        let mut p = params(Some("Roma Norte"), None);
        p.campaigns = Some("mutus, LIVERPOOL".to_string());
        p.specialty = Some("  ".to_string());

        let criteria = criteria_from_params(p, 50).unwrap();
        assert_eq!(criteria.campaigns, vec!["Mutuus", "Liverpool"]);
        assert_eq!(criteria.specialty, None);
    }

    #[test]
    fn test_openapi_lists_search_path() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/api/v1/providers"));
    }
}
