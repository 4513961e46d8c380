//! Per-client-IP request rate limiting via `governor`.
//!
//! Exceeding the quota is surfaced as `429 RATE_LIMITED`, matching
//! `ErrorCode::RateLimited`.

use std::net::SocketAddr;
use std::num::NonZeroU32;
use std::sync::Arc;

use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use governor::{clock::DefaultClock, state::keyed::DefaultKeyedStateStore, Quota, RateLimiter};

use crate::config::ApiConfig;
use crate::error::ApiError;

pub type ClientRateLimiter = RateLimiter<SocketAddr, DefaultKeyedStateStore<SocketAddr>, DefaultClock>;

/// Builds a per-client limiter from `ApiConfig`'s rate-limit tunables, or
/// `None` when rate limiting is disabled.
pub fn build_rate_limiter(config: &ApiConfig) -> Option<Arc<ClientRateLimiter>> {
    if !config.rate_limit_enabled {
        return None;
    }

    let per_minute = NonZeroU32::new(config.rate_limit_per_minute).unwrap_or(NonZeroU32::MIN);
    let burst = NonZeroU32::new(config.rate_limit_burst).unwrap_or(per_minute);
    let quota = Quota::per_minute(per_minute).allow_burst(burst);
    Some(Arc::new(RateLimiter::keyed(quota)))
}

/// Axum middleware rejecting with `RATE_LIMITED` once a client IP
/// exceeds its quota. A `None` limiter (rate limiting disabled) passes
/// every request through.
pub async fn enforce(
    State(limiter): State<Option<Arc<ClientRateLimiter>>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    req: Request,
    next: Next,
) -> Response {
    if let Some(limiter) = &limiter {
        if limiter.check_key(&addr).is_err() {
            return ApiError::rate_limited().into_response();
        }
    }
    next.run(req).await
}
