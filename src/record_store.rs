use crate::circuit_breaker::{create_upstream_circuit_breaker, UpstreamBreaker};
use crate::errors::AppError;
use crate::models::RecordPage;
use failsafe::futures::CircuitBreaker;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use url::Url;

/// Largest page the record store serves per request.
const MAX_PAGE_SIZE: usize = 100;

/// Read-only client for the hosted tabular record store (Airtable REST API).
#[derive(Clone)]
pub struct RecordStoreClient {
    client: Client,
    base_url: String,
    api_key: String,
    breaker: UpstreamBreaker,
}

impl RecordStoreClient {
    /// Creates a new `RecordStoreClient`.
    ///
    /// # Arguments
    ///
    /// * `base_url` - API root, e.g. `https://api.airtable.com/v0`.
    /// * `api_key` - Personal access token.
    /// * `timeout` - Per-request timeout.
    pub fn new(base_url: String, api_key: String, timeout: Duration) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()
            .map_err(|e| {
                AppError::Internal(format!("Failed to create record store client: {}", e))
            })?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            breaker: create_upstream_circuit_breaker(),
        })
    }

    fn table_url(&self, base_id: &str, table: &str) -> Result<Url, AppError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| AppError::Internal(format!("Invalid record store URL: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| AppError::Internal("Record store URL cannot be a base".to_string()))?
            .pop_if_empty()
            .push(base_id)
            .push(table);
        Ok(url)
    }

    /// Lists up to `max_records` rows of a table, following the pagination
    /// cursor. Rows are returned untyped; normalization happens later.
    ///
    /// A failed page fails the whole listing: a partial directory would
    /// silently hide providers.
    pub async fn list_records(
        &self,
        base_id: &str,
        table: &str,
        max_records: usize,
    ) -> Result<Vec<Value>, AppError> {
        let mut rows: Vec<Value> = Vec::new();
        let mut offset: Option<String> = None;
        let mut pages = 0usize;

        while rows.len() < max_records {
            let page_size = MAX_PAGE_SIZE.min(max_records - rows.len());
            let page = self
                .fetch_page(base_id, table, page_size, max_records, offset.as_deref())
                .await?;
            pages += 1;
            rows.extend(page.records);

            match page.offset {
                Some(next) if !next.is_empty() => offset = Some(next),
                _ => break,
            }
        }

        rows.truncate(max_records);
        tracing::info!(
            "Record store: loaded {} row(s) from '{}' in {} page(s)",
            rows.len(),
            table,
            pages
        );
        Ok(rows)
    }

    async fn fetch_page(
        &self,
        base_id: &str,
        table: &str,
        page_size: usize,
        max_records: usize,
        offset: Option<&str>,
    ) -> Result<RecordPage, AppError> {
        let mut url = self.table_url(base_id, table)?;
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("pageSize", &page_size.to_string())
                .append_pair("maxRecords", &max_records.to_string());
            if let Some(offset) = offset {
                query.append_pair("offset", offset);
            }
        }

        tracing::debug!("Record store: GET {} (offset: {:?})", url.path(), offset);

        let request = async {
            let response = self
                .client
                .get(url)
                .bearer_auth(&self.api_key)
                .send()
                .await
                .map_err(|e| {
                    AppError::UpstreamUnavailable(format!(
                        "Record store request failed: {}",
                        e.without_url()
                    ))
                })?;

            if !response.status().is_success() {
                let status = response.status();
                let error_text = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "Unknown error".to_string());
                return Err(AppError::UpstreamUnavailable(format!(
                    "Record store returned {}: {}",
                    status, error_text
                )));
            }

            response.json::<RecordPage>().await.map_err(|e| {
                AppError::UpstreamUnavailable(format!(
                    "Failed to parse record store response: {}",
                    e.without_url()
                ))
            })
        };

        match self.breaker.call(request).await {
            Ok(page) => Ok(page),
            Err(failsafe::Error::Inner(e)) => Err(e),
            Err(failsafe::Error::Rejected) => Err(AppError::UpstreamUnavailable(
                "Record store circuit open".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_url_encodes_table_name() {
        let client = RecordStoreClient::new(
            "https://api.airtable.com/v0/".to_string(),
            "key".to_string(),
            Duration::from_secs(5),
        )
        .unwrap();

        let url = client
            .table_url("appABC", "Directorio de consultorios")
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.airtable.com/v0/appABC/Directorio%20de%20consultorios"
        );
    }
}
