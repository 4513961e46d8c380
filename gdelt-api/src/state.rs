//! Shared application state for Axum routers.

use std::sync::Arc;

use axum::extract::FromRef;
use gdelt_cache::{CacheConfig, FetchCoordinator, UsageMeter};
use gdelt_core::SystemClock;

use crate::config::ApiConfig;

/// Application-wide state shared across all routes.
#[derive(Clone)]
pub struct AppState {
    pub coordinator: Arc<FetchCoordinator<SystemClock>>,
    pub usage: Arc<dyn UsageMeter>,
    pub cache_config: CacheConfig,
    pub api_config: ApiConfig,
    pub start_time: std::time::Instant,
}

impl FromRef<AppState> for Arc<FetchCoordinator<SystemClock>> {
    fn from_ref(state: &AppState) -> Self {
        state.coordinator.clone()
    }
}

impl FromRef<AppState> for Arc<dyn UsageMeter> {
    fn from_ref(state: &AppState) -> Self {
        state.usage.clone()
    }
}

impl FromRef<AppState> for std::time::Instant {
    fn from_ref(state: &AppState) -> Self {
        state.start_time
    }
}
