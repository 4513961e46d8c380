//! `Scheduler` — a small cron-style job registry, and the nightly
//! retention + pre-warm job registered onto it.
//!
//! A `tokio::select!` over a `watch` shutdown signal and an `interval`
//! tick drives the poll loop; `AtomicU64` counters are exposed via
//! `snapshot()` for the readiness/stats surface.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, Timelike};
use futures_util::future::BoxFuture;
use gdelt_core::{Calendar, Clock, CountryCode};
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{error, info};

use crate::coordinator::FetchCoordinator;
use crate::store::ArticleStore;

/// How often the scheduler checks whether any registered job is due. The
/// actual fire instant is still gated on each job's `CronSpec`; a missed
/// fire (process was down) is not back-filled.
const POLL_INTERVAL: Duration = Duration::from_secs(60);

/// A daily firing time, checked against a calendar's wall clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CronSpec {
    pub hour: u32,
    pub minute: u32,
}

impl CronSpec {
    pub fn daily_at(hour: u32, minute: u32) -> Self {
        Self { hour, minute }
    }

    fn is_due_at(&self, now: &impl Timelike) -> bool {
        now.hour() == self.hour && now.minute() == self.minute
    }
}

type Job = Box<dyn Fn() -> BoxFuture<'static, ()> + Send + Sync>;

struct RegisteredJob {
    cron_spec: CronSpec,
    job: Job,
    last_run_date: Option<NaiveDate>,
}

/// A tiny in-process cron: jobs are registered with a `CronSpec` and run
/// at most once per calendar day, the first poll tick after their time
/// matches the wall clock. There is no persistence across restarts and
/// no catch-up for a fire missed while the process was down.
pub struct Scheduler<C: Clock> {
    calendar: Arc<Calendar<C>>,
    poll_interval: Duration,
    jobs: Vec<RegisteredJob>,
}

impl<C: Clock + 'static> Scheduler<C> {
    pub fn new(calendar: Arc<Calendar<C>>) -> Self {
        Self {
            calendar,
            poll_interval: POLL_INTERVAL,
            jobs: Vec::new(),
        }
    }

    /// Registers a job to fire daily at `cron_spec`. `job` is called
    /// fresh on every fire, so it must capture its own collaborators by
    /// clone, not by move-once.
    pub fn register<F, Fut>(&mut self, cron_spec: CronSpec, job: F)
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.jobs.push(RegisteredJob {
            cron_spec,
            job: Box::new(move || Box::pin(job()) as Pin<Box<dyn Future<Output = ()> + Send>>),
            last_run_date: None,
        });
    }

    /// Polls until `shutdown_rx` observes a change, firing any due job
    /// at most once per calendar day.
    pub async fn run(mut self, mut shutdown_rx: watch::Receiver<bool>) {
        let mut interval = tokio::time::interval(self.poll_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = shutdown_rx.changed() => {
                    info!(event = "maintenance_shutdown", "scheduler stopping");
                    return;
                }
                _ = interval.tick() => {
                    let now = self.calendar.now();
                    let today = self.calendar.today();
                    for registered in self.jobs.iter_mut() {
                        let due = registered.cron_spec.is_due_at(&now.time())
                            && registered.last_run_date != Some(today);
                        if !due {
                            continue;
                        }
                        registered.last_run_date = Some(today);
                        (registered.job)().await;
                    }
                }
            }
        }
    }
}

#[derive(Debug, Default)]
pub struct MaintenanceMetrics {
    pub runs: AtomicU64,
    pub rows_deleted: AtomicU64,
    pub countries_warmed: AtomicU64,
    pub warm_failures: AtomicU64,
}

#[derive(Debug, Clone, Default)]
pub struct MaintenanceSnapshot {
    pub runs: u64,
    pub rows_deleted: u64,
    pub countries_warmed: u64,
    pub warm_failures: u64,
}

impl MaintenanceMetrics {
    pub fn snapshot(&self) -> MaintenanceSnapshot {
        MaintenanceSnapshot {
            runs: self.runs.load(Ordering::Relaxed),
            rows_deleted: self.rows_deleted.load(Ordering::Relaxed),
            countries_warmed: self.countries_warmed.load(Ordering::Relaxed),
            warm_failures: self.warm_failures.load(Ordering::Relaxed),
        }
    }
}

/// Builds a `Scheduler`, registers the retention + pre-warm job at
/// `maintenance_hour:maintenance_minute`, and runs it until
/// `shutdown_rx` observes a change.
pub async fn maintenance_task<C: Clock + 'static>(
    store: Arc<dyn ArticleStore>,
    coordinator: Arc<FetchCoordinator<C>>,
    calendar: Arc<Calendar<C>>,
    retention_days: i64,
    warmup_countries: Vec<String>,
    warm_today: bool,
    maintenance_hour: u32,
    maintenance_minute: u32,
    metrics: Arc<MaintenanceMetrics>,
    shutdown_rx: watch::Receiver<bool>,
) {
    let mut scheduler = Scheduler::new(calendar);
    scheduler.register(CronSpec::daily_at(maintenance_hour, maintenance_minute), move || {
        let store = store.clone();
        let coordinator = coordinator.clone();
        let warmup_countries = warmup_countries.clone();
        let metrics = metrics.clone();
        async move {
            run_once(&store, &coordinator, retention_days, &warmup_countries, warm_today, &metrics).await;
        }
    });
    scheduler.run(shutdown_rx).await;
}

async fn run_once<C: Clock + 'static>(
    store: &Arc<dyn ArticleStore>,
    coordinator: &Arc<FetchCoordinator<C>>,
    retention_days: i64,
    warmup_countries: &[String],
    warm_today: bool,
    metrics: &Arc<MaintenanceMetrics>,
) {
    metrics.runs.fetch_add(1, Ordering::Relaxed);

    let stats_before = match store.count_total().await {
        Ok(n) => Some(n),
        Err(e) => {
            error!(error = %e, event = "storage_snapshot_failed", "could not snapshot storage count before retention pass");
            None
        }
    };

    let deleted = match store.delete_older_than(retention_days).await {
        Ok(n) => n,
        Err(e) => {
            error!(error = %e, event = "retention_failed", "retention pass failed");
            0
        }
    };
    metrics.rows_deleted.fetch_add(deleted, Ordering::Relaxed);

    let stats_after = match store.count_total().await {
        Ok(n) => Some(n),
        Err(e) => {
            error!(error = %e, event = "storage_snapshot_failed", "could not snapshot storage count after retention pass");
            None
        }
    };

    info!(
        rows_deleted = deleted,
        storage_count_before = ?stats_before,
        storage_count_after = ?stats_after,
        event = "retention_deleted",
        "nightly retention pass complete"
    );

    // Warm yesterday and the preceding window; `days_back` covers the
    // retention horizon minus one so the next day's first request is cheap.
    let warm_days_back = (retention_days - 1).max(1);
    for code in warmup_countries {
        let country: CountryCode = match code.parse() {
            Ok(c) => c,
            Err(e) => {
                error!(country_code = %code, error = %e, event = "warmup_bad_country_code", "skipping malformed warmup country");
                continue;
            }
        };

        match coordinator.get_articles(country, warm_days_back).await {
            Ok(_) => {
                metrics.countries_warmed.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) => {
                metrics.warm_failures.fetch_add(1, Ordering::Relaxed);
                error!(country_code = %code, error = %e, event = "warmup_failed", "pre-warm failed for country, continuing");
            }
        }
    }

    if warm_today {
        info!(event = "warm_today_enabled", "warm_today is set but handled via per-request freshness checks");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use gdelt_core::FixedClock;

    use crate::config::CacheConfig;
    use crate::store::MockArticleStore;
    use crate::usage::InMemoryUsageMeter;
    use crate::warehouse::NullWarehouseClient;

    #[tokio::test]
    async fn run_once_deletes_and_warms_without_aborting_on_failure() {
        let store: Arc<dyn ArticleStore> = Arc::new(MockArticleStore::new());

        let clock = FixedClock(Utc.with_ymd_and_hms(2026, 1, 22, 0, 0, 0).unwrap());
        let calendar = Arc::new(Calendar::new(clock, chrono_tz::UTC));
        let config = CacheConfig::default();
        let usage = Arc::new(InMemoryUsageMeter::new(calendar.clone(), config.clone()));
        let warehouse = Arc::new(NullWarehouseClient);
        let coordinator = Arc::new(FetchCoordinator::new(
            store.clone(),
            warehouse,
            usage,
            calendar,
            config,
        ));
        let metrics = Arc::new(MaintenanceMetrics::default());

        run_once(
            &store,
            &coordinator,
            7,
            &["CH".to_string(), "1A".to_string()],
            false,
            &metrics,
        )
        .await;

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.runs, 1);
        assert_eq!(snapshot.countries_warmed, 1, "CH warms fine");
        assert_eq!(snapshot.warm_failures, 0, "malformed codes are skipped, not counted as warm failures");
    }

    #[test]
    fn cron_spec_is_due_only_at_its_exact_minute() {
        let spec = CronSpec::daily_at(3, 15);
        let hit = Utc.with_ymd_and_hms(2026, 1, 22, 3, 15, 0).unwrap();
        let miss = Utc.with_ymd_and_hms(2026, 1, 22, 3, 16, 0).unwrap();
        assert!(spec.is_due_at(&hit.time()));
        assert!(!spec.is_due_at(&miss.time()));
    }

    #[tokio::test]
    async fn scheduler_runs_a_registered_job_then_stops_on_shutdown() {
        let clock = FixedClock(Utc.with_ymd_and_hms(2026, 1, 22, 3, 15, 0).unwrap());
        let calendar = Arc::new(Calendar::new(clock, chrono_tz::UTC));

        let fire_count = Arc::new(AtomicU64::new(0));
        let mut scheduler: Scheduler<FixedClock> = Scheduler::new(calendar);
        scheduler.poll_interval = Duration::from_millis(5);

        let counter = fire_count.clone();
        scheduler.register(CronSpec::daily_at(3, 15), move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::Relaxed);
            }
        });

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(scheduler.run(shutdown_rx));

        tokio::time::sleep(Duration::from_millis(30)).await;
        let _ = shutdown_tx.send(true);
        handle.await.unwrap();

        assert_eq!(fire_count.load(Ordering::Relaxed), 1, "fires once per day even across many poll ticks");
    }
}
