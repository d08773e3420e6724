//! Static secondary locations (e.g. partner stores) shown next to providers
//! for explicitly configured campaigns.

use crate::campaigns::{canonicalize, same_campaign};
use crate::config::StaticPinsConfig;
use crate::errors::AppError;
use crate::field_resolver::{as_text, resolve};
use crate::geocoder::MapboxGeocoder;
use crate::models::{StaticPin, StaticPinsResponse};
use crate::normalizer::parse_raw_record;
use crate::record_store::RecordStoreClient;
use moka::future::Cache;
use regex::Regex;
use serde_json::{Map, Value};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

/// Upper bound on store rows read per campaign.
const MAX_STORE_ROWS: usize = 5000;

fn zip_regex() -> &'static Regex {
    static ZIP: OnceLock<Regex> = OnceLock::new();
    ZIP.get_or_init(|| Regex::new(r"\b(\d{5})\b").expect("valid zip regex"))
}

fn field(fields: &Map<String, Value>, candidates: &[&str]) -> String {
    as_text(resolve(fields, candidates))
}

/// Builds a one-line address for a store row.
///
/// Uses the full-address column when present, otherwise joins street,
/// exterior number, neighborhood, `CP <zip>`, locality and state. The zip
/// falls back to the first 5-digit group of the reference column.
pub fn compose_address(fields: &Map<String, Value>) -> String {
    let full = field(fields, &["Dirección completa"]);
    if !full.is_empty() {
        return full;
    }

    let mut zip = field(fields, &["C.P.", "Código postal"]);
    if zip.is_empty() {
        let reference = field(fields, &["CP Referencia"]);
        if let Some(caps) = zip_regex().captures(&reference) {
            zip = caps[1].to_string();
        }
    }

    let parts = [
        field(fields, &["CALLE"]),
        field(fields, &["Exterior", "Número exterior"]),
        field(fields, &["COLONIA"]),
        if zip.is_empty() { String::new() } else { format!("CP {}", zip) },
        field(fields, &["Localidad", "Municipio"]),
        field(fields, &["Estado"]),
    ];

    parts
        .into_iter()
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Serves the static overlay. Campaigns outside the configured list always
/// get an empty pin list.
#[derive(Clone)]
pub struct StaticPinService {
    config: StaticPinsConfig,
    store: RecordStoreClient,
    geocoder: MapboxGeocoder,
    cache: Cache<String, Arc<Vec<StaticPin>>>,
}

impl StaticPinService {
    pub fn new(config: StaticPinsConfig, store: RecordStoreClient, geocoder: MapboxGeocoder) -> Self {
        let cache = Cache::builder()
            .time_to_live(Duration::from_secs(config.cache_ttl_secs.max(1)))
            .max_capacity(64)
            .build();
        Self {
            config,
            store,
            geocoder,
            cache,
        }
    }

    /// Canonical label if `campaign` has an overlay configured.
    pub fn configured_campaign(&self, campaign: &str) -> Option<String> {
        let canonical = canonicalize(campaign);
        self.config
            .campaigns
            .iter()
            .find(|c| same_campaign(c, &canonical))
            .cloned()
    }

    pub async fn pins_for(&self, campaign: &str) -> Result<StaticPinsResponse, AppError> {
        let label = canonicalize(campaign);
        let pins = match self.configured_campaign(campaign) {
            Some(configured) if self.config.is_enabled() => {
                self.cache
                    .try_get_with(configured.clone(), self.load_pins(&configured))
                    .await
                    .map_err(|e| (*e).clone())?
            }
            _ => {
                tracing::debug!("No static overlay configured for campaign '{}'", label);
                Arc::new(Vec::new())
            }
        };

        Ok(StaticPinsResponse {
            campaign: label,
            color: self.config.color.clone(),
            pins: pins.as_ref().clone(),
        })
    }

    async fn load_pins(&self, campaign: &str) -> Result<Arc<Vec<StaticPin>>, AppError> {
        let (Some(base_id), Some(table)) = (&self.config.stores_base_id, &self.config.stores_table)
        else {
            return Ok(Arc::new(Vec::new()));
        };

        let rows = self.store.list_records(base_id, table, MAX_STORE_ROWS).await?;
        let total = rows.len();
        let mut pins = Vec::new();

        // One at a time: the Mapbox rate limit is shared with searches
        for record in rows.into_iter().filter_map(parse_raw_record) {
            let address = compose_address(&record.fields);
            if address.is_empty() {
                continue;
            }
            match self.geocoder.geocode(&address).await {
                Ok(coords) => {
                    let name = field(&record.fields, &["UNIDAD", "Nombre"]);
                    pins.push(StaticPin {
                        name: if name.is_empty() { "Tienda".to_string() } else { name },
                        address,
                        lat: coords.lat,
                        lng: coords.lng,
                    });
                }
                Err(e) => {
                    tracing::warn!("Skipping store '{}': {}", address, e);
                }
            }
        }

        tracing::info!(
            "Static overlay '{}': {} pin(s) from {} store row(s)",
            campaign,
            pins.len(),
            total
        );
        Ok(Arc::new(pins))
    }
}
