//! `WarehouseClient` — the billed, slow, external analytical store.
//!
//! The joining/filtering SQL templates and CAMEO/GCAM parsing upstream
//! of this client are out of scope; this is strictly an HTTP adapter
//! over a configured analytical-query endpoint.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use gdelt_core::{ArticleRow, CountryCode, QueryKind};
use serde::{Deserialize, Serialize};

use crate::error::{CacheError, CacheResult};

/// One fetch result: the rows returned plus the bytes the warehouse
/// reports having scanned, for usage metering.
#[derive(Debug, Clone)]
pub struct WarehouseFetch {
    pub rows: Vec<ArticleRow>,
    pub bytes_scanned: u64,
}

#[async_trait]
pub trait WarehouseClient: Send + Sync {
    async fn fetch_day(
        &self,
        country: CountryCode,
        date: chrono::NaiveDate,
        limit: i64,
    ) -> CacheResult<WarehouseFetch>;

    async fn fetch_range(
        &self,
        country: CountryCode,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        limit: i64,
    ) -> CacheResult<WarehouseFetch>;
}

#[derive(Debug, Serialize)]
struct WarehouseRequest<'a> {
    country_code: &'a str,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
    limit: i64,
    query_kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct WarehouseResponse {
    rows: Vec<WarehouseRow>,
    bytes_scanned: u64,
}

#[derive(Debug, Deserialize)]
struct WarehouseRow {
    gkg_record_id: String,
    country_code: String,
    date_added: i64,
    payload: serde_json::Value,
}

/// Talks to a configured analytical-query endpoint (`GDELT_WAREHOUSE_URL`)
/// over HTTP, posting a `{country_code, from, to, limit}` request and
/// parsing back `{rows, bytes_scanned}`.
pub struct HttpWarehouseClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpWarehouseClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    async fn post(
        &self,
        country: CountryCode,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        limit: i64,
        kind: QueryKind,
    ) -> CacheResult<WarehouseFetch> {
        let body = WarehouseRequest {
            country_code: country.as_str(),
            from,
            to,
            limit,
            query_kind: kind.as_str(),
        };

        let resp = self
            .client
            .post(format!("{}/scan", self.base_url))
            .json(&body)
            .send()
            .await
            .map_err(|e| CacheError::Upstream(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(CacheError::Upstream(format!(
                "warehouse returned status {}",
                resp.status()
            )));
        }

        let parsed: WarehouseResponse = resp
            .json()
            .await
            .map_err(|e| CacheError::Upstream(e.to_string()))?;

        let rows = parsed
            .rows
            .into_iter()
            .map(|r| {
                Ok(ArticleRow {
                    gkg_record_id: r.gkg_record_id,
                    country_code: r
                        .country_code
                        .parse()
                        .map_err(|e| CacheError::Upstream(format!("{e}")))?,
                    date_added: r.date_added,
                    created_at: Utc::now(),
                    payload: r.payload,
                })
            })
            .collect::<CacheResult<Vec<_>>>()?;

        Ok(WarehouseFetch {
            rows,
            bytes_scanned: parsed.bytes_scanned,
        })
    }
}

#[async_trait]
impl WarehouseClient for HttpWarehouseClient {
    async fn fetch_day(
        &self,
        country: CountryCode,
        date: chrono::NaiveDate,
        limit: i64,
    ) -> CacheResult<WarehouseFetch> {
        let start = date.and_hms_opt(0, 0, 0).expect("midnight is valid").and_utc();
        let end = date
            .and_hms_opt(23, 59, 59)
            .expect("23:59:59 is valid")
            .and_utc();
        self.post(country, start, end, limit, QueryKind::HistoricalDay)
            .await
    }

    async fn fetch_range(
        &self,
        country: CountryCode,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        limit: i64,
    ) -> CacheResult<WarehouseFetch> {
        self.post(country, from, to, limit, QueryKind::CurrentDayRefresh)
            .await
    }
}

/// Always returns zero rows. Used by tests so the suite never depends on
/// network access, and as a safe default when no endpoint is configured.
#[derive(Debug, Default)]
pub struct NullWarehouseClient;

#[async_trait]
impl WarehouseClient for NullWarehouseClient {
    async fn fetch_day(
        &self,
        _country: CountryCode,
        _date: chrono::NaiveDate,
        _limit: i64,
    ) -> CacheResult<WarehouseFetch> {
        Ok(WarehouseFetch {
            rows: Vec::new(),
            bytes_scanned: 0,
        })
    }

    async fn fetch_range(
        &self,
        _country: CountryCode,
        _from: DateTime<Utc>,
        _to: DateTime<Utc>,
        _limit: i64,
    ) -> CacheResult<WarehouseFetch> {
        Ok(WarehouseFetch {
            rows: Vec::new(),
            bytes_scanned: 0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn null_client_always_returns_empty() {
        let client = NullWarehouseClient;
        let fetch = client
            .fetch_day(
                "CH".parse().unwrap(),
                chrono::NaiveDate::from_ymd_opt(2026, 1, 21).unwrap(),
                100,
            )
            .await
            .unwrap();
        assert!(fetch.rows.is_empty());
        assert_eq!(fetch.bytes_scanned, 0);
    }
}
