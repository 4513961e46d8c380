//! GDELT Article Cache - HTTP API Layer
//!
//! Exposes the caching/fetch-coordination engine (`gdelt-cache`) over a
//! read-only REST surface: `GET /api/articles`, `GET /api/articles/stats`,
//! and Kubernetes-style health checks. No authentication, no write API
//! beyond what caching requires.

pub mod config;
pub mod constants;
pub mod db;
pub mod error;
pub mod rate_limit;
pub mod routes;
pub mod state;
pub mod telemetry;

pub use config::ApiConfig;
pub use db::DbConfig;
pub use error::{ApiError, ApiResult, ErrorCode};
pub use rate_limit::{build_rate_limiter, ClientRateLimiter};
pub use routes::create_api_router;
pub use state::AppState;
pub use telemetry::{init_tracing, TelemetryConfig};
