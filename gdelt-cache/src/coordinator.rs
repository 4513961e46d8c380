//! `FetchCoordinator` — the core algorithm.
//!
//! Partitions a request window into historical days and today, closes
//! coverage/freshness gaps under single-flight, and reads the union
//! window back out of the store.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use futures_util::stream::{FuturesUnordered, StreamExt};
use gdelt_core::{Calendar, Clock, CountryCode, DayKey, FreshnessVerdict, QueryKind};
use tokio::sync::Semaphore;
use tracing::{error, info};

use crate::config::CacheConfig;
use crate::coverage::CoverageEvaluator;
use crate::error::CacheResult;
use crate::freshness::FreshnessEvaluator;
use crate::singleflight::SingleFlightRegistry;
use crate::store::ArticleStore;
use crate::usage::UsageMeter;
use crate::warehouse::WarehouseClient;

/// Outcome of a `get_articles` call: the rows read back, plus whether
/// any historical day's fetch failed (surfaced to the handler as
/// `meta.partial = true`, never escalated to a 5xx on its own).
#[derive(Debug, Clone)]
pub struct FetchOutcome {
    pub rows: Vec<gdelt_core::ArticleRow>,
    pub partial: bool,
}

pub struct FetchCoordinator<C: Clock> {
    store: Arc<dyn ArticleStore>,
    warehouse: Arc<dyn WarehouseClient>,
    usage: Arc<dyn UsageMeter>,
    calendar: Arc<Calendar<C>>,
    coverage: CoverageEvaluator<C>,
    freshness: FreshnessEvaluator<C>,
    singleflight: SingleFlightRegistry<DayKey>,
    config: CacheConfig,
}

impl<C: Clock + 'static> FetchCoordinator<C> {
    pub fn new(
        store: Arc<dyn ArticleStore>,
        warehouse: Arc<dyn WarehouseClient>,
        usage: Arc<dyn UsageMeter>,
        calendar: Arc<Calendar<C>>,
        config: CacheConfig,
    ) -> Self {
        let coverage = CoverageEvaluator::new(store.clone(), calendar.clone(), config.clone());
        let freshness = FreshnessEvaluator::new(store.clone(), calendar.clone(), config.clone());
        Self {
            store,
            warehouse,
            usage,
            calendar,
            coverage,
            freshness,
            singleflight: SingleFlightRegistry::new(),
            config,
        }
    }

    pub async fn get_articles(&self, country: CountryCode, days_back: i64) -> CacheResult<FetchOutcome> {
        let days_back = days_back.clamp(1, self.config.max_days_back);
        let historical = self.calendar.recent_days(days_back as u32);

        let mut partial = false;

        // Historical gap fill, bounded concurrency.
        let semaphore = Arc::new(Semaphore::new(self.config.historical_fanout));
        let mut in_flight = FuturesUnordered::new();
        for date in historical.iter().copied() {
            let semaphore = semaphore.clone();
            in_flight.push(async move {
                let _permit = semaphore.acquire().await.expect("semaphore never closed");
                self.fill_historical_gap(country, date).await
            });
        }
        while let Some(result) = in_flight.next().await {
            if let Err(e) = result {
                if e.is_store_failure() {
                    error!(country_code = %country, error = %e, event = "historical_fetch_store_error", "store unavailable during historical fetch");
                    return Err(e);
                }
                error!(country_code = %country, error = %e, event = "historical_fetch_failed", "historical day fetch failed, continuing");
                partial = true;
            }
        }

        // Current-day refresh.
        if let Err(e) = self.refresh_today(country).await {
            if e.is_store_failure() {
                error!(country_code = %country, error = %e, event = "today_refresh_store_error", "store unavailable during current-day refresh");
                return Err(e);
            }
            error!(country_code = %country, error = %e, event = "today_refresh_failed", "current-day refresh failed, continuing");
            partial = true;
        }

        let rows = self.read_out(country, &historical).await?;
        Ok(FetchOutcome { rows, partial })
    }

    async fn fill_historical_gap(&self, country: CountryCode, date: NaiveDate) -> CacheResult<()> {
        let verdict = self.coverage.coverage(country, date).await?;
        if verdict.is_sufficient() {
            return Ok(());
        }

        let key = DayKey::new(country, date);
        self.singleflight
            .do_once(&key, None, || async {
                // Double-checked: re-evaluate coverage inside the critical section.
                let verdict = self.coverage.coverage(country, date).await?;
                if verdict.is_sufficient() {
                    return Ok(());
                }

                let fetch = self
                    .warehouse
                    .fetch_day(country, date, self.config.expected_per_day)
                    .await?;

                if !fetch.rows.is_empty() {
                    self.store.upsert_many(&fetch.rows).await?;
                }
                self.usage
                    .record(QueryKind::HistoricalDay, fetch.bytes_scanned)
                    .await?;

                info!(
                    country_code = %country,
                    %date,
                    rows = fetch.rows.len(),
                    bytes_scanned = fetch.bytes_scanned,
                    event = "historical_day_fetched",
                    "historical day fetch completed"
                );
                Ok(())
            })
            .await
    }

    async fn refresh_today(&self, country: CountryCode) -> CacheResult<()> {
        let verdict = self.freshness.freshness(country).await?;
        if matches!(verdict, FreshnessVerdict::Fresh) {
            return Ok(());
        }

        let today = self.calendar.today();
        let key = DayKey::new(country, today);
        self.singleflight
            .do_once(&key, None, || async {
                let verdict = self.freshness.freshness(country).await?;
                if matches!(verdict, FreshnessVerdict::Fresh) {
                    return Ok(());
                }

                let Some((from, to)) = self.freshness.refresh_window(verdict) else {
                    return Ok(());
                };

                let fetch = self
                    .warehouse
                    .fetch_range(country, from, to, self.config.expected_per_day)
                    .await?;

                if !fetch.rows.is_empty() {
                    self.store.upsert_many(&fetch.rows).await?;
                }
                self.usage
                    .record(QueryKind::CurrentDayRefresh, fetch.bytes_scanned)
                    .await?;

                info!(
                    country_code = %country,
                    from = %from,
                    to = %to,
                    rows = fetch.rows.len(),
                    event = "today_refreshed",
                    "current-day refresh completed"
                );
                Ok(())
            })
            .await
    }

    async fn read_out(
        &self,
        country: CountryCode,
        historical: &[NaiveDate],
    ) -> CacheResult<Vec<gdelt_core::ArticleRow>> {
        let today = self.calendar.today();
        let now = self.calendar.now();

        let lo = match historical.first() {
            Some(first) => self.calendar.day_window(*first).2,
            None => self.calendar.day_window(today).2,
        };
        let now_int = gdelt_core::datetime_to_int(
            today,
            chrono::Timelike::hour(&now),
            chrono::Timelike::minute(&now),
            chrono::Timelike::second(&now),
        );

        let mut rows = self.store.select_range(country, lo, now_int).await?;
        rows.sort_by(|a, b| b.date_added.cmp(&a.date_added));
        Ok(rows)
    }
}
