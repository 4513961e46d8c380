//! GDELT Article Cache - Caching & Fetch-Coordination Engine
//!
//! Sits between inbound requests and the warehouse: coverage/freshness
//! evaluation, single-flight coordination, bounded-fanout historical
//! backfill, usage metering, and nightly maintenance. `gdelt-api` is the
//! only consumer; this crate has no HTTP awareness.

pub mod config;
pub mod coordinator;
pub mod coverage;
pub mod error;
pub mod freshness;
pub mod projector;
pub mod scheduler;
pub mod singleflight;
pub mod store;
pub mod usage;
pub mod warehouse;

pub use config::CacheConfig;
pub use coordinator::{FetchCoordinator, FetchOutcome};
pub use coverage::CoverageEvaluator;
pub use error::{CacheError, CacheResult};
pub use freshness::FreshnessEvaluator;
pub use projector::ArticleProjector;
pub use scheduler::{maintenance_task, MaintenanceMetrics, MaintenanceSnapshot};
pub use singleflight::SingleFlightRegistry;
pub use store::{ArticleStore, MockArticleStore, PostgresArticleStore};
pub use usage::{InMemoryUsageMeter, PostgresUsageMeter, UsageMeter};
pub use warehouse::{HttpWarehouseClient, NullWarehouseClient, WarehouseClient, WarehouseFetch};
