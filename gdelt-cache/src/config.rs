//! Tunables for coverage, freshness, usage metering and maintenance.

use chrono_tz::Tz;

fn env_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    env_var(key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Configuration for the caching/coordination engine. Every field has a
/// spec-mandated default; `from_env()` overrides them from `GDELT_*` vars.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// `E`: expected rows per (country, day).
    pub expected_per_day: i64,
    /// `r`: the fraction of `expected_per_day` that counts as sufficient.
    pub coverage_ratio: f64,
    /// `T`: seconds before today's latest ingest is considered stale.
    pub today_ttl_seconds: i64,
    /// Bounded concurrency for historical-day fanout.
    pub historical_fanout: usize,
    /// Upper bound on a request's `days_back`.
    pub max_days_back: i64,
    /// Rows with `created_at` older than this are evicted nightly.
    pub retention_days: i64,
    /// Basis for usage warning levels.
    pub warehouse_monthly_budget_bytes: u64,
    /// Fallback used for `estimated_queries_left` before any query has run.
    pub avg_bytes_per_query_fallback: u64,
    /// Wall-clock hour/minute the maintenance job fires, in `zone`.
    pub maintenance_hour: u32,
    pub maintenance_minute: u32,
    /// Countries pre-warmed by the nightly maintenance job.
    pub warmup_countries: Vec<String>,
    /// Whether maintenance force-warms today in addition to the recent
    /// window. Defaults to `false`: the recent window plus per-request
    /// freshness checks are the only warm path unless an operator opts in.
    pub warm_today: bool,
    /// IANA zone name day boundaries and `recent_days` are computed in.
    /// Must match whatever zone the warehouse used to assign `date_added`.
    pub zone: Tz,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            expected_per_day: 100,
            coverage_ratio: 0.8,
            today_ttl_seconds: 900,
            historical_fanout: 4,
            max_days_back: 30,
            retention_days: 7,
            warehouse_monthly_budget_bytes: 1024_u64.pow(4), // 1 TiB
            avg_bytes_per_query_fallback: 4 * 1024_u64.pow(3), // 4 GiB
            maintenance_hour: 0,
            maintenance_minute: 0,
            warmup_countries: default_warmup_countries(),
            warm_today: false,
            zone: chrono_tz::UTC,
        }
    }
}

fn default_warmup_countries() -> Vec<String> {
    [
        "US", "GB", "FR", "DE", "CH", "IN", "BR", "JP", "CA", "AU",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

impl CacheConfig {
    /// Build configuration from `GDELT_*` environment variables, falling
    /// back to the spec defaults for anything unset or unparsable.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            expected_per_day: env_parse("GDELT_EXPECTED_PER_DAY", defaults.expected_per_day),
            coverage_ratio: env_parse("GDELT_COVERAGE_RATIO", defaults.coverage_ratio),
            today_ttl_seconds: env_parse("GDELT_TODAY_TTL_SECONDS", defaults.today_ttl_seconds),
            historical_fanout: env_parse("GDELT_HISTORICAL_FANOUT", defaults.historical_fanout),
            max_days_back: env_parse("GDELT_MAX_DAYS_BACK", defaults.max_days_back),
            retention_days: env_parse("GDELT_RETENTION_DAYS", defaults.retention_days),
            warehouse_monthly_budget_bytes: env_parse(
                "GDELT_WAREHOUSE_MONTHLY_BUDGET_BYTES",
                defaults.warehouse_monthly_budget_bytes,
            ),
            avg_bytes_per_query_fallback: env_parse(
                "GDELT_AVG_BYTES_PER_QUERY_FALLBACK",
                defaults.avg_bytes_per_query_fallback,
            ),
            maintenance_hour: env_parse("GDELT_MAINTENANCE_HOUR", defaults.maintenance_hour),
            maintenance_minute: env_parse("GDELT_MAINTENANCE_MINUTE", defaults.maintenance_minute),
            warmup_countries: env_var("GDELT_WARMUP_COUNTRIES")
                .map(|v| v.split(',').map(|s| s.trim().to_uppercase()).collect())
                .unwrap_or(defaults.warmup_countries),
            warm_today: env_parse("GDELT_WARM_TODAY", defaults.warm_today),
            zone: env_var("GDELT_ZONE")
                .and_then(|v| v.parse::<Tz>().ok())
                .unwrap_or(defaults.zone),
        }
    }

    /// `⌊E·r⌋`, the minimum row count a day needs to be `Sufficient`.
    pub fn coverage_threshold(&self) -> i64 {
        (self.expected_per_day as f64 * self.coverage_ratio).floor() as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec() {
        let cfg = CacheConfig::default();
        assert_eq!(cfg.expected_per_day, 100);
        assert_eq!(cfg.coverage_ratio, 0.8);
        assert_eq!(cfg.today_ttl_seconds, 900);
        assert_eq!(cfg.historical_fanout, 4);
        assert_eq!(cfg.max_days_back, 30);
        assert_eq!(cfg.retention_days, 7);
        assert_eq!(cfg.warehouse_monthly_budget_bytes, 1024u64.pow(4));
        assert_eq!(cfg.warmup_countries.len(), 10);
        assert!(!cfg.warm_today);
        assert_eq!(cfg.zone, chrono_tz::UTC);
    }

    #[test]
    fn coverage_threshold_floors() {
        let cfg = CacheConfig::default();
        assert_eq!(cfg.coverage_threshold(), 80);
    }
}
