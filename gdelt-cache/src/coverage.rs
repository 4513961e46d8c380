//! `CoverageEvaluator` — is a (country, day) already sufficiently cached?

use std::sync::Arc;

use chrono::NaiveDate;
use gdelt_core::{Calendar, Clock, CountryCode, CoverageVerdict};
use tracing::warn;

use crate::config::CacheConfig;
use crate::error::CacheResult;
use crate::store::ArticleStore;

pub struct CoverageEvaluator<C: Clock> {
    store: Arc<dyn ArticleStore>,
    calendar: Arc<Calendar<C>>,
    config: CacheConfig,
}

impl<C: Clock> CoverageEvaluator<C> {
    pub fn new(store: Arc<dyn ArticleStore>, calendar: Arc<Calendar<C>>, config: CacheConfig) -> Self {
        Self {
            store,
            calendar,
            config,
        }
    }

    /// `Sufficient` iff the stored row count is `>= floor(E * r)`.
    ///
    /// A count in `(0, threshold)` is logged at WARN but otherwise
    /// treated identically to zero: the caller re-fetches the whole day.
    pub async fn coverage(&self, country: CountryCode, date: NaiveDate) -> CacheResult<CoverageVerdict> {
        let (_, _, lo, hi) = self.calendar.day_window(date);
        let count = self.store.count_in_day(country, lo, hi).await?;
        let threshold = self.config.coverage_threshold();

        if count >= threshold {
            return Ok(CoverageVerdict::Sufficient);
        }

        if count > 0 {
            warn!(
                country_code = %country,
                %date,
                count,
                threshold,
                event = "coverage_insufficient_partial",
                "day has partial coverage, re-fetching in whole"
            );
        }

        Ok(CoverageVerdict::Insufficient(count))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use gdelt_core::{ArticleRow, FixedClock};

    use crate::store::MockArticleStore;

    async fn evaluator(store: Arc<MockArticleStore>) -> CoverageEvaluator<FixedClock> {
        let clock = FixedClock(Utc.with_ymd_and_hms(2026, 1, 22, 15, 30, 0).unwrap());
        let calendar = Arc::new(Calendar::new(clock, chrono_tz::UTC));
        CoverageEvaluator::new(store, calendar, CacheConfig::default())
    }

    #[tokio::test]
    async fn empty_day_is_insufficient_zero() {
        let store = Arc::new(MockArticleStore::new());
        let eval = evaluator(store).await;
        let date = NaiveDate::from_ymd_opt(2026, 1, 21).unwrap();
        let verdict = eval.coverage("CH".parse().unwrap(), date).await.unwrap();
        assert_eq!(verdict, CoverageVerdict::Insufficient(0));
    }

    #[tokio::test]
    async fn eighty_rows_meets_default_threshold() {
        let store = Arc::new(MockArticleStore::new());
        let date = NaiveDate::from_ymd_opt(2026, 1, 21).unwrap();
        let rows: Vec<ArticleRow> = (0..80)
            .map(|i| ArticleRow {
                gkg_record_id: format!("a{i}"),
                country_code: "CH".parse().unwrap(),
                date_added: 20260121120000,
                created_at: Utc::now(),
                payload: serde_json::json!({}),
            })
            .collect();
        store.seed(rows).await;

        let eval = evaluator(store).await;
        let verdict = eval.coverage("CH".parse().unwrap(), date).await.unwrap();
        assert_eq!(verdict, CoverageVerdict::Sufficient);
    }

    #[tokio::test]
    async fn seventy_nine_rows_is_insufficient() {
        let store = Arc::new(MockArticleStore::new());
        let date = NaiveDate::from_ymd_opt(2026, 1, 21).unwrap();
        let rows: Vec<ArticleRow> = (0..79)
            .map(|i| ArticleRow {
                gkg_record_id: format!("a{i}"),
                country_code: "CH".parse().unwrap(),
                date_added: 20260121120000,
                created_at: Utc::now(),
                payload: serde_json::json!({}),
            })
            .collect();
        store.seed(rows).await;

        let eval = evaluator(store).await;
        let verdict = eval.coverage("CH".parse().unwrap(), date).await.unwrap();
        assert_eq!(verdict, CoverageVerdict::Insufficient(79));
        assert!(!verdict.is_sufficient());
    }
}
