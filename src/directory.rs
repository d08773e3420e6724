//! Loading the provider directory from the record store.

use crate::config::Config;
use crate::errors::AppError;
use crate::facets::spanish_cmp;
use crate::field_resolver::LogicalField;
use crate::models::{FieldSeen, FieldsReport, Provider};
use crate::normalizer::{normalize_rows, parse_raw_record};
use crate::record_store::RecordStoreClient;
use moka::future::Cache;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Rows sampled by the field diagnostics.
pub const FIELD_SAMPLE_SIZE: usize = 50;

/// Optional snapshot cache for the normalized directory.
///
/// Entries expire after `ttl`; `invalidate` drops the snapshot immediately.
/// Searches behave identically with or without it, only staler by at most
/// `ttl`.
#[derive(Clone)]
pub struct DirectoryCache {
    cache: Cache<(), Arc<Vec<Provider>>>,
    ttl: Duration,
}

impl DirectoryCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            cache: Cache::builder().time_to_live(ttl).max_capacity(1).build(),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub async fn invalidate(&self) {
        self.cache.invalidate(&()).await;
    }
}

/// The provider table plus the client that reads it.
#[derive(Clone)]
pub struct DirectorySource {
    store: RecordStoreClient,
    base_id: String,
    table: String,
    max_records: usize,
    cache: Option<DirectoryCache>,
}

impl DirectorySource {
    pub fn new(
        store: RecordStoreClient,
        base_id: String,
        table: String,
        max_records: usize,
        cache: Option<DirectoryCache>,
    ) -> Self {
        Self {
            store,
            base_id,
            table,
            max_records,
            cache,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self, AppError> {
        let store = RecordStoreClient::new(
            config.airtable_base_url.clone(),
            config.airtable_api_key.clone(),
            config.upstream_timeout(),
        )?;
        Ok(Self::new(
            store,
            config.airtable_base_id.clone(),
            config.airtable_table_name.clone(),
            config.airtable_max_records,
            config.directory_cache_ttl().map(DirectoryCache::new),
        ))
    }

    pub fn store(&self) -> &RecordStoreClient {
        &self.store
    }

    pub fn cache(&self) -> Option<&DirectoryCache> {
        self.cache.as_ref()
    }

    /// Loads and normalizes every provider, through the cache when present.
    pub async fn load(&self) -> Result<Arc<Vec<Provider>>, AppError> {
        match &self.cache {
            Some(cache) => {
                // Concurrent misses share one load
                cache
                    .cache
                    .try_get_with((), self.load_fresh())
                    .await
                    .map_err(|e| (*e).clone())
            }
            None => self.load_fresh().await,
        }
    }

    async fn load_fresh(&self) -> Result<Arc<Vec<Provider>>, AppError> {
        let rows = self
            .store
            .list_records(&self.base_id, &self.table, self.max_records)
            .await?;
        let (providers, _skipped) = normalize_rows(rows);
        Ok(Arc::new(providers))
    }

    /// Raw header names seen in a sample of the table, with how often each
    /// appears and which logical field it resolves to.
    pub async fn inspect_fields(&self, sample: usize) -> Result<FieldsReport, AppError> {
        let rows = self
            .store
            .list_records(&self.base_id, &self.table, sample)
            .await?;
        let records: Vec<_> = rows.into_iter().filter_map(parse_raw_record).collect();

        let mut counts: HashMap<String, usize> = HashMap::new();
        for record in &records {
            for key in record.fields.keys() {
                *counts.entry(key.clone()).or_insert(0) += 1;
            }
        }

        let mut fields_seen: Vec<FieldSeen> = counts
            .into_iter()
            .map(|(name, count)| FieldSeen {
                resolves_to: LogicalField::for_header(&name).map(|f| f.as_str().to_string()),
                name,
                count,
            })
            .collect();
        fields_seen.sort_by(|a, b| spanish_cmp(&a.name, &b.name));

        Ok(FieldsReport {
            table: self.table.clone(),
            sample: records.len(),
            fields_seen,
        })
    }
}
