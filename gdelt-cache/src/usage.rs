//! `UsageMeter` — monthly warehouse-byte accounting against a budget.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use deadpool_postgres::Pool;
use gdelt_core::{Calendar, Clock, QueryKind, UsageByKind, UsageRecord, UsageStats, UsageWarningLevel};
use tokio::sync::Mutex;
use tracing::warn;

use crate::config::CacheConfig;
use crate::error::CacheResult;

#[async_trait]
pub trait UsageMeter: Send + Sync {
    /// Appends to the current month's counters. May log a warning when
    /// the cumulative fraction crosses the 50/80/90% thresholds.
    async fn record(&self, kind: QueryKind, bytes_scanned: u64) -> CacheResult<()>;

    async fn snapshot(&self) -> CacheResult<UsageStats>;
}

fn derive_stats(record: UsageRecord, config: &CacheConfig) -> UsageStats {
    let budget = config.warehouse_monthly_budget_bytes;
    let percent = if budget == 0 {
        0.0
    } else {
        record.total_bytes as f64 / budget as f64 * 100.0
    };
    let remaining_bytes = budget.saturating_sub(record.total_bytes);

    let avg_bytes_per_query = if record.query_count > 0 {
        (record.total_bytes / record.query_count).max(1)
    } else {
        config.avg_bytes_per_query_fallback
    };
    let estimated_queries_left = remaining_bytes / avg_bytes_per_query.max(1);

    let warning_level = warning_level_for(percent);

    UsageStats {
        month: record.month,
        total_bytes: record.total_bytes,
        query_count: record.query_count,
        by_kind: record.by_kind,
        percent,
        remaining_bytes,
        estimated_queries_left,
        warning_level,
    }
}

fn warning_level_for(percent: f64) -> UsageWarningLevel {
    if percent >= 90.0 {
        UsageWarningLevel::Critical
    } else if percent >= 80.0 {
        UsageWarningLevel::High
    } else if percent >= 50.0 {
        UsageWarningLevel::Elevated
    } else {
        UsageWarningLevel::Ok
    }
}

fn maybe_warn(before_percent: f64, after_percent: f64, month: &str) {
    for threshold in [50.0, 80.0, 90.0] {
        if before_percent < threshold && after_percent >= threshold {
            warn!(
                month,
                percent = after_percent,
                threshold,
                event = "usage_threshold_crossed",
                "monthly warehouse usage crossed a budget threshold"
            );
        }
    }
}

/// Persists `UsageRecord` as one row per month in Postgres, mutating it
/// under a row-level `SELECT ... FOR UPDATE` inside a transaction — the
/// relational equivalent of "exclusive lock during record, atomic write".
pub struct PostgresUsageMeter<C: Clock> {
    pool: Pool,
    calendar: Arc<Calendar<C>>,
    config: CacheConfig,
}

impl<C: Clock> PostgresUsageMeter<C> {
    pub fn new(pool: Pool, calendar: Arc<Calendar<C>>, config: CacheConfig) -> Self {
        Self {
            pool,
            calendar,
            config,
        }
    }

    fn current_month(&self) -> String {
        self.calendar.now().format("%Y-%m").to_string()
    }
}

#[async_trait]
impl<C: Clock> UsageMeter for PostgresUsageMeter<C> {
    async fn record(&self, kind: QueryKind, bytes_scanned: u64) -> CacheResult<()> {
        let month = self.current_month();
        let mut conn = self.pool.get().await?;
        let txn = conn.transaction().await?;

        let row = txn
            .query_opt(
                "SELECT total_bytes, query_count, by_kind FROM usage_meter WHERE month = $1 FOR UPDATE",
                &[&month],
            )
            .await?;

        let mut record = match row {
            Some(r) => {
                let by_kind_json: serde_json::Value = r.get("by_kind");
                let by_kind: HashMap<String, UsageByKind> =
                    serde_json::from_value(by_kind_json).unwrap_or_default();
                UsageRecord {
                    month: month.clone(),
                    total_bytes: r.get::<_, i64>("total_bytes") as u64,
                    query_count: r.get::<_, i64>("query_count") as u64,
                    by_kind,
                }
            }
            None => UsageRecord::empty(month.clone()),
        };

        let before_percent = derive_stats(record.clone(), &self.config).percent;

        record.total_bytes += bytes_scanned;
        record.query_count += 1;
        let entry = record.by_kind.entry(kind.as_str().to_string()).or_default();
        entry.bytes += bytes_scanned;
        entry.count += 1;

        let by_kind_json = serde_json::to_value(&record.by_kind)
            .map_err(|e| crate::error::CacheError::Internal(e.to_string()))?;

        txn.execute(
            "INSERT INTO usage_meter (month, total_bytes, query_count, by_kind)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (month) DO UPDATE SET
                total_bytes = EXCLUDED.total_bytes,
                query_count = EXCLUDED.query_count,
                by_kind = EXCLUDED.by_kind",
            &[
                &record.month,
                &(record.total_bytes as i64),
                &(record.query_count as i64),
                &by_kind_json,
            ],
        )
        .await?;
        txn.commit().await?;

        let after_percent = derive_stats(record, &self.config).percent;
        maybe_warn(before_percent, after_percent, &month);

        Ok(())
    }

    async fn snapshot(&self) -> CacheResult<UsageStats> {
        let month = self.current_month();
        let conn = self.pool.get().await?;
        let row = conn
            .query_opt(
                "SELECT total_bytes, query_count, by_kind FROM usage_meter WHERE month = $1",
                &[&month],
            )
            .await?;

        let record = match row {
            Some(r) => {
                let by_kind_json: serde_json::Value = r.get("by_kind");
                let by_kind: HashMap<String, UsageByKind> =
                    serde_json::from_value(by_kind_json).unwrap_or_default();
                UsageRecord {
                    month,
                    total_bytes: r.get::<_, i64>("total_bytes") as u64,
                    query_count: r.get::<_, i64>("query_count") as u64,
                    by_kind,
                }
            }
            None => UsageRecord::empty(month),
        };

        Ok(derive_stats(record, &self.config))
    }
}

/// In-memory test double behind a `Mutex`, mirroring the contract of
/// [`PostgresUsageMeter`] without a live pool.
pub struct InMemoryUsageMeter<C: Clock> {
    record: Mutex<UsageRecord>,
    calendar: Arc<Calendar<C>>,
    config: CacheConfig,
}

impl<C: Clock> InMemoryUsageMeter<C> {
    pub fn new(calendar: Arc<Calendar<C>>, config: CacheConfig) -> Self {
        let month = calendar.now().format("%Y-%m").to_string();
        Self {
            record: Mutex::new(UsageRecord::empty(month)),
            calendar,
            config,
        }
    }
}

#[async_trait]
impl<C: Clock> UsageMeter for InMemoryUsageMeter<C> {
    async fn record(&self, kind: QueryKind, bytes_scanned: u64) -> CacheResult<()> {
        let month = self.calendar.now().format("%Y-%m").to_string();
        let mut record = self.record.lock().await;
        if record.month != month {
            *record = UsageRecord::empty(month.clone());
        }

        let before_percent = derive_stats(record.clone(), &self.config).percent;

        record.total_bytes += bytes_scanned;
        record.query_count += 1;
        let entry = record.by_kind.entry(kind.as_str().to_string()).or_default();
        entry.bytes += bytes_scanned;
        entry.count += 1;

        let after_percent = derive_stats(record.clone(), &self.config).percent;
        maybe_warn(before_percent, after_percent, &month);

        Ok(())
    }

    async fn snapshot(&self) -> CacheResult<UsageStats> {
        let record = self.record.lock().await.clone();
        Ok(derive_stats(record, &self.config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use gdelt_core::FixedClock;

    fn meter_with_budget(budget_bytes: u64) -> InMemoryUsageMeter<FixedClock> {
        let clock = FixedClock(Utc.with_ymd_and_hms(2026, 1, 22, 0, 0, 0).unwrap());
        let calendar = Arc::new(Calendar::new(clock, chrono_tz::UTC));
        let mut config = CacheConfig::default();
        config.warehouse_monthly_budget_bytes = budget_bytes;
        InMemoryUsageMeter::new(calendar, config)
    }

    #[tokio::test]
    async fn usage_is_monotonic_and_sums_inputs() {
        let meter = meter_with_budget(1_000_000);
        meter.record(QueryKind::HistoricalDay, 100).await.unwrap();
        meter.record(QueryKind::CurrentDayRefresh, 250).await.unwrap();
        meter.record(QueryKind::HistoricalDay, 50).await.unwrap();

        let stats = meter.snapshot().await.unwrap();
        assert_eq!(stats.total_bytes, 400);
        assert_eq!(stats.query_count, 3);
        assert_eq!(stats.by_kind["historical_day"].bytes, 150);
        assert_eq!(stats.by_kind["current_day_refresh"].bytes, 250);
    }

    #[tokio::test]
    async fn warning_level_escalates_with_percent() {
        let meter = meter_with_budget(100);
        meter.record(QueryKind::HistoricalDay, 55).await.unwrap();
        let stats = meter.snapshot().await.unwrap();
        assert_eq!(stats.warning_level, UsageWarningLevel::Elevated);

        meter.record(QueryKind::HistoricalDay, 30).await.unwrap();
        let stats = meter.snapshot().await.unwrap();
        assert_eq!(stats.warning_level, UsageWarningLevel::High);

        meter.record(QueryKind::HistoricalDay, 10).await.unwrap();
        let stats = meter.snapshot().await.unwrap();
        assert_eq!(stats.warning_level, UsageWarningLevel::Critical);
    }

    #[tokio::test]
    async fn estimated_queries_left_uses_fallback_before_any_sample() {
        let meter = meter_with_budget(8 * 1024u64.pow(3));
        let stats = meter.snapshot().await.unwrap();
        // remaining == budget, fallback avg == 4 GiB -> exactly 2 queries left
        assert_eq!(stats.estimated_queries_left, 2);
    }
}
