//! GDELT Article Cache API - Server Entry Point
//!
//! Bootstraps configuration, builds the Postgres pool and cache
//! collaborators, spawns the nightly maintenance job, and starts the
//! Axum HTTP server.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use gdelt_api::{
    build_rate_limiter, create_api_router, init_tracing, rate_limit, ApiConfig, ApiError,
    ApiResult, AppState, DbConfig, TelemetryConfig,
};
use gdelt_cache::{
    maintenance_task, CacheConfig, FetchCoordinator, HttpWarehouseClient, MaintenanceMetrics,
    NullWarehouseClient, PostgresArticleStore, PostgresUsageMeter, WarehouseClient,
};
use gdelt_core::{Calendar, SystemClock};
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::info;

const DEFAULT_CONCURRENCY_LIMIT: usize = 256;

#[tokio::main]
async fn main() -> ApiResult<()> {
    let telemetry_config = TelemetryConfig::default();
    init_tracing(&telemetry_config);

    let cache_config = CacheConfig::from_env();
    let api_config = gdelt_api::ApiConfig::from_env();
    let db_config = DbConfig::from_env();

    let pool = db_config.build_pool()?;

    let calendar = Arc::new(Calendar::new(SystemClock, cache_config.zone));
    let store = Arc::new(PostgresArticleStore::new(pool.clone()));
    let usage = Arc::new(PostgresUsageMeter::new(
        pool.clone(),
        calendar.clone(),
        cache_config.clone(),
    ));

    let warehouse: Arc<dyn WarehouseClient> = match std::env::var("GDELT_WAREHOUSE_URL") {
        Ok(url) if !url.is_empty() => {
            info!(warehouse_url = %url, "using HTTP warehouse client");
            Arc::new(HttpWarehouseClient::new(url))
        }
        _ => {
            tracing::warn!("GDELT_WAREHOUSE_URL unset, falling back to a no-op warehouse client");
            Arc::new(NullWarehouseClient)
        }
    };

    let coordinator = Arc::new(FetchCoordinator::new(
        store.clone(),
        warehouse,
        usage.clone(),
        calendar.clone(),
        cache_config.clone(),
    ));

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    let maintenance_metrics = Arc::new(MaintenanceMetrics::default());
    let maintenance_handle = tokio::spawn(maintenance_task(
        store,
        coordinator.clone(),
        calendar,
        cache_config.retention_days,
        cache_config.warmup_countries.clone(),
        cache_config.warm_today,
        cache_config.maintenance_hour,
        cache_config.maintenance_minute,
        maintenance_metrics,
        shutdown_rx,
    ));

    let state = AppState {
        coordinator,
        usage,
        cache_config,
        api_config: api_config.clone(),
        start_time: std::time::Instant::now(),
    };

    let cors = build_cors_layer(&api_config);
    let limiter = build_rate_limiter(&api_config);
    let app: Router = create_api_router(state)
        .layer(axum::middleware::from_fn_with_state(limiter, rate_limit::enforce))
        .layer(cors)
        .layer(ConcurrencyLimitLayer::new(DEFAULT_CONCURRENCY_LIMIT))
        .layer(tower_http::trace::TraceLayer::new_for_http());

    let addr = resolve_bind_addr()?;
    info!(%addr, "starting gdelt-api server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| ApiError::internal(format!("failed to bind {addr}: {e}")))?;
    let server = axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>());

    tokio::select! {
        result = server => {
            result.map_err(|e| ApiError::internal(format!("server error: {e}")))?;
        }
        _ = tokio::signal::ctrl_c() => {
            info!("shutdown signal received");
        }
    }

    let _ = shutdown_tx.send(true);
    let _ = tokio::time::timeout(Duration::from_secs(5), maintenance_handle).await;

    Ok(())
}

fn build_cors_layer(config: &ApiConfig) -> CorsLayer {
    let config = config.clone();
    CorsLayer::new()
        .allow_methods([axum::http::Method::GET])
        .max_age(Duration::from_secs(config.cors_max_age_secs))
        .allow_origin(AllowOrigin::predicate(move |origin, _parts| {
            origin
                .to_str()
                .map(|o| config.is_origin_allowed(o))
                .unwrap_or(false)
        }))
}

fn resolve_bind_addr() -> ApiResult<SocketAddr> {
    let host = std::env::var("GDELT_API_BIND").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port_str = std::env::var("PORT")
        .ok()
        .or_else(|| std::env::var("GDELT_API_PORT").ok())
        .unwrap_or_else(|| "3000".to_string());
    let port: u16 = port_str
        .parse()
        .map_err(|e| ApiError::internal(format!("invalid port '{port_str}': {e}")))?;

    let addr = format!("{host}:{port}");
    addr.parse()
        .map_err(|e| ApiError::internal(format!("invalid bind address '{addr}': {e}")))
}
