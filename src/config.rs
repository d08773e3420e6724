use serde::Deserialize;
use std::time::Duration;

/// Hard per-request destination cap of the matrix service (25 coordinates
/// including the origin).
pub const MATRIX_DESTINATION_CAP: usize = 24;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub port: u16,
    pub airtable_api_key: String,
    pub airtable_base_id: String,
    pub airtable_table_name: String,
    pub airtable_base_url: String,
    pub airtable_max_records: usize,
    pub mapbox_token: String,
    pub mapbox_base_url: String,
    pub mapbox_country: String,
    pub mapbox_language: String,
    pub mapbox_profile: String,
    pub matrix_max_destinations: usize,
    pub matrix_concurrency: usize,
    pub upstream_timeout_secs: u64,
    pub default_result_limit: usize,
    pub directory_cache_ttl_secs: u64,
    pub static_pins: StaticPinsConfig,
}

/// Explicit opt-in for the secondary location overlay. Campaigns not listed
/// here never get static pins.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StaticPinsConfig {
    pub campaigns: Vec<String>,
    pub stores_base_id: Option<String>,
    pub stores_table: Option<String>,
    pub color: String,
    pub cache_ttl_secs: u64,
}

impl StaticPinsConfig {
    /// True when the stores table is configured at all.
    pub fn is_enabled(&self) -> bool {
        self.stores_base_id.is_some() && self.stores_table.is_some() && !self.campaigns.is_empty()
    }
}

fn required(name: &str) -> anyhow::Result<String> {
    std::env::var(name)
        .map_err(|_| anyhow::anyhow!("{} environment variable required", name))
        .and_then(|value| {
            if value.trim().is_empty() {
                anyhow::bail!("{} cannot be empty", name);
            }
            Ok(value)
        })
}

fn optional(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.trim().is_empty())
}

fn url_or_default(name: &str, default: &str) -> anyhow::Result<String> {
    let url = optional(name).unwrap_or_else(|| default.to_string());
    if !url.starts_with("http://") && !url.starts_with("https://") {
        anyhow::bail!("{} must start with http:// or https://", name);
    }
    Ok(url.trim_end_matches('/').to_string())
}

fn number_or_default<T: std::str::FromStr>(name: &str, default: T) -> anyhow::Result<T> {
    match optional(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| anyhow::anyhow!("{} must be a valid number", name)),
        None => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let matrix_max_destinations =
            number_or_default("MATRIX_MAX_DESTINATIONS", MATRIX_DESTINATION_CAP)?;
        if matrix_max_destinations == 0 || matrix_max_destinations > MATRIX_DESTINATION_CAP {
            anyhow::bail!(
                "MATRIX_MAX_DESTINATIONS must be between 1 and {}",
                MATRIX_DESTINATION_CAP
            );
        }

        let default_result_limit = number_or_default("DEFAULT_RESULT_LIMIT", 50usize)?;
        if default_result_limit == 0 {
            anyhow::bail!("DEFAULT_RESULT_LIMIT must be positive");
        }

        let config = Self {
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number between 1-65535"))?,
            airtable_api_key: required("AIRTABLE_API_KEY")?,
            airtable_base_id: required("AIRTABLE_BASE_ID")?,
            airtable_table_name: optional("AIRTABLE_TABLE_NAME")
                .unwrap_or_else(|| "Directorio de consultorios".to_string()),
            airtable_base_url: url_or_default("AIRTABLE_BASE_URL", "https://api.airtable.com/v0")?,
            airtable_max_records: number_or_default("AIRTABLE_MAX_RECORDS", 3000usize)?,
            mapbox_token: required("MAPBOX_TOKEN")?,
            mapbox_base_url: url_or_default("MAPBOX_BASE_URL", "https://api.mapbox.com")?,
            mapbox_country: optional("MAPBOX_COUNTRY").unwrap_or_else(|| "mx".to_string()),
            mapbox_language: optional("MAPBOX_LANGUAGE").unwrap_or_else(|| "es".to_string()),
            mapbox_profile: optional("MAPBOX_PROFILE").unwrap_or_else(|| "driving".to_string()),
            matrix_max_destinations,
            matrix_concurrency: number_or_default("MATRIX_CONCURRENCY", 1usize)?.max(1),
            upstream_timeout_secs: number_or_default("UPSTREAM_TIMEOUT_SECS", 10u64)?.max(1),
            default_result_limit,
            directory_cache_ttl_secs: number_or_default("DIRECTORY_CACHE_TTL_SECS", 0u64)?,
            static_pins: StaticPinsConfig {
                campaigns: optional("STATIC_PIN_CAMPAIGNS")
                    .map(|raw| crate::campaigns::parse_campaign_list(&raw))
                    .unwrap_or_default(),
                stores_base_id: optional("AIRTABLE_BASE_ID_STORES"),
                stores_table: optional("AIRTABLE_TABLE_STORES"),
                color: optional("STATIC_PIN_COLOR").unwrap_or_else(|| "#721390".to_string()),
                cache_ttl_secs: number_or_default("STATIC_PIN_CACHE_TTL_SECS", 3600u64)?,
            },
        };

        // Never log credentials
        tracing::debug!("Airtable base URL: {}", config.airtable_base_url);
        tracing::debug!("Airtable table: {}", config.airtable_table_name);
        tracing::debug!("Mapbox base URL: {}", config.mapbox_base_url);
        tracing::debug!(
            "Matrix chunk size: {}, concurrency: {}",
            config.matrix_max_destinations,
            config.matrix_concurrency
        );
        if config.static_pins.is_enabled() {
            tracing::info!(
                "Static pin overlay enabled for campaigns: {:?}",
                config.static_pins.campaigns
            );
        }

        Ok(config)
    }

    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream_timeout_secs)
    }

    /// `None` when the directory snapshot cache is disabled.
    pub fn directory_cache_ttl(&self) -> Option<Duration> {
        (self.directory_cache_ttl_secs > 0).then(|| Duration::from_secs(self.directory_cache_ttl_secs))
    }

    /// Configuration pointing every upstream at `base_url`, used by tests
    /// that run the record store and the mapping service on one mock server.
    pub fn for_base_url(base_url: &str) -> Self {
        let base_url = base_url.trim_end_matches('/').to_string();
        Self {
            port: 0,
            airtable_api_key: "test_key".to_string(),
            airtable_base_id: "appTEST".to_string(),
            airtable_table_name: "Directorio de consultorios".to_string(),
            airtable_base_url: format!("{}/v0", base_url),
            airtable_max_records: 3000,
            mapbox_token: "pk.test".to_string(),
            mapbox_base_url: base_url,
            mapbox_country: "mx".to_string(),
            mapbox_language: "es".to_string(),
            mapbox_profile: "driving".to_string(),
            matrix_max_destinations: MATRIX_DESTINATION_CAP,
            matrix_concurrency: 1,
            upstream_timeout_secs: 5,
            default_result_limit: 50,
            directory_cache_ttl_secs: 0,
            static_pins: StaticPinsConfig {
                color: "#721390".to_string(),
                cache_ttl_secs: 3600,
                ..StaticPinsConfig::default()
            },
        }
    }
}
