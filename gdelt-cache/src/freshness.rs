//! `FreshnessEvaluator` — how stale is today's ingest?

use std::sync::Arc;

use chrono::{DateTime, Timelike, Utc};
use gdelt_core::{Calendar, Clock, CountryCode, FreshnessVerdict};

use crate::config::CacheConfig;
use crate::error::CacheResult;
use crate::store::ArticleStore;

pub struct FreshnessEvaluator<C: Clock> {
    store: Arc<dyn ArticleStore>,
    calendar: Arc<Calendar<C>>,
    config: CacheConfig,
}

impl<C: Clock> FreshnessEvaluator<C> {
    pub fn new(store: Arc<dyn ArticleStore>, calendar: Arc<Calendar<C>>, config: CacheConfig) -> Self {
        Self {
            store,
            calendar,
            config,
        }
    }

    pub async fn freshness(&self, country: CountryCode) -> CacheResult<FreshnessVerdict> {
        let now = self.calendar.now();
        let today = self.calendar.today();
        let (_, _, day_start_int, _) = self.calendar.day_window(today);
        let now_int = gdelt_core::datetime_to_int(today, now.time().hour(), now.time().minute(), now.time().second());

        let latest = self
            .store
            .max_date_added(country, day_start_int, now_int)
            .await?;

        let Some(latest) = latest else {
            return Ok(FreshnessVerdict::Empty);
        };

        let Some(last) = gdelt_core::int_to_datetime(latest) else {
            return Ok(FreshnessVerdict::Empty);
        };

        let age = now.signed_duration_since(last).num_seconds();
        if age >= self.config.today_ttl_seconds {
            Ok(FreshnessVerdict::Stale(latest))
        } else {
            Ok(FreshnessVerdict::Fresh)
        }
    }

    /// The `[from, now]` window to fetch for a verdict that needs one.
    /// Returns `None` for `Fresh`.
    pub fn refresh_window(&self, verdict: FreshnessVerdict) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        let now = self.calendar.now();
        match verdict {
            FreshnessVerdict::Fresh => None,
            FreshnessVerdict::Empty => {
                let today = self.calendar.today();
                let (start, _, _, _) = self.calendar.day_window(today);
                Some((start, now))
            }
            FreshnessVerdict::Stale(last) => {
                gdelt_core::int_to_datetime(last).map(|from| (from, now))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone};
    use gdelt_core::{ArticleRow, FixedClock};

    use crate::store::MockArticleStore;

    async fn evaluator_at(
        now: DateTime<Utc>,
        store: Arc<MockArticleStore>,
    ) -> FreshnessEvaluator<FixedClock> {
        let clock = FixedClock(now);
        let calendar = Arc::new(Calendar::new(clock, chrono_tz::UTC));
        FreshnessEvaluator::new(store, calendar, CacheConfig::default())
    }

    fn row(date_added: i64) -> ArticleRow {
        ArticleRow {
            gkg_record_id: "a1".to_string(),
            country_code: "US".parse().unwrap(),
            date_added,
            created_at: Utc::now(),
            payload: serde_json::json!({}),
        }
    }

    #[tokio::test]
    async fn empty_store_is_empty_verdict() {
        let store = Arc::new(MockArticleStore::new());
        let now = Utc.with_ymd_and_hms(2026, 1, 22, 15, 30, 0).unwrap();
        let eval = evaluator_at(now, store).await;
        let verdict = eval.freshness("US".parse().unwrap()).await.unwrap();
        assert_eq!(verdict, FreshnessVerdict::Empty);
    }

    #[tokio::test]
    async fn stale_when_latest_ingest_older_than_ttl() {
        let store = Arc::new(MockArticleStore::new());
        store.seed(vec![row(20260122150000)]).await; // 15 min before now

        let now = Utc.with_ymd_and_hms(2026, 1, 22, 15, 30, 0).unwrap();
        let eval = evaluator_at(now, store).await;
        let verdict = eval.freshness("US".parse().unwrap()).await.unwrap();
        assert_eq!(verdict, FreshnessVerdict::Stale(20260122150000));
    }

    #[tokio::test]
    async fn fresh_when_latest_ingest_within_ttl() {
        let store = Arc::new(MockArticleStore::new());
        store.seed(vec![row(20260122152500)]).await; // 5 min before now

        let now = Utc.with_ymd_and_hms(2026, 1, 22, 15, 30, 0).unwrap();
        let eval = evaluator_at(now, store).await;
        let verdict = eval.freshness("US".parse().unwrap()).await.unwrap();
        assert_eq!(verdict, FreshnessVerdict::Fresh);
    }

    #[test]
    fn day_window_helper_compiles() {
        let _ = NaiveDate::from_ymd_opt(2026, 1, 22).unwrap();
    }
}
