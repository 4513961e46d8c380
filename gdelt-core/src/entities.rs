//! Stored rows, derived verdicts, and usage accounting types.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::identity::CountryCode;

/// A stored article row. `gkg_record_id` is globally unique upstream;
/// `payload` is an opaque blob the core never inspects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleRow {
    pub gkg_record_id: String,
    pub country_code: CountryCode,
    /// `YYYYMMDDHHMMSS`, upstream wall clock, monotonic within a day.
    pub date_added: i64,
    pub created_at: DateTime<Utc>,
    pub payload: serde_json::Value,
}

/// The public JSON shape produced by [`ArticleProjector`](crate) for a row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleProjection {
    pub gkg_record_id: String,
    pub country_code: String,
    pub date_added: i64,
    pub payload: serde_json::Value,
}

impl From<&ArticleRow> for ArticleProjection {
    fn from(row: &ArticleRow) -> Self {
        Self {
            gkg_record_id: row.gkg_record_id.clone(),
            country_code: row.country_code.to_string(),
            date_added: row.date_added,
            payload: row.payload.clone(),
        }
    }
}

/// Outcome of evaluating whether a day's store rows are sufficient.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoverageVerdict {
    Sufficient,
    Insufficient(i64),
}

impl CoverageVerdict {
    pub fn is_sufficient(&self) -> bool {
        matches!(self, Self::Sufficient)
    }
}

/// Outcome of evaluating how stale today's ingest is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FreshnessVerdict {
    /// No rows for today yet; fetch `[day_start, now]`.
    Empty,
    /// Latest ingest is older than the TTL; fetch `[last_ingest, now]`.
    Stale(i64),
    /// Latest ingest is within the TTL; no action needed.
    Fresh,
}

impl FreshnessVerdict {
    pub fn needs_fetch(&self) -> bool {
        !matches!(self, Self::Fresh)
    }
}

/// Tags a warehouse query by the table family it scans, for per-kind
/// usage accounting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryKind {
    HistoricalDay,
    CurrentDayRefresh,
}

impl QueryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HistoricalDay => "historical_day",
            Self::CurrentDayRefresh => "current_day_refresh",
        }
    }
}

/// Accumulated bytes/count for one [`QueryKind`] within a month.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageByKind {
    pub bytes: u64,
    pub count: u64,
}

/// Persisted, one-row-per-month usage counter. Monotonic within the month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageRecord {
    /// `YYYY-MM`.
    pub month: String,
    pub total_bytes: u64,
    pub query_count: u64,
    pub by_kind: HashMap<String, UsageByKind>,
}

impl UsageRecord {
    pub fn empty(month: impl Into<String>) -> Self {
        Self {
            month: month.into(),
            total_bytes: 0,
            query_count: 0,
            by_kind: HashMap::new(),
        }
    }
}

/// Coarse usage-warning bucket derived from the monthly usage percent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UsageWarningLevel {
    Ok,
    Elevated,
    High,
    Critical,
}

/// Derived view over a [`UsageRecord`] plus the configured monthly budget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageStats {
    pub month: String,
    pub total_bytes: u64,
    pub query_count: u64,
    pub by_kind: HashMap<String, UsageByKind>,
    pub percent: f64,
    pub remaining_bytes: u64,
    pub estimated_queries_left: u64,
    pub warning_level: UsageWarningLevel,
}
