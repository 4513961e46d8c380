//! Postgres connection pool bootstrap.
//!
//! Thin wrapper around `deadpool_postgres` and `tokio_postgres`. The
//! schema is plain tables with no extensions, so there's no extension
//! bootstrap step here beyond building the pool.

use deadpool_postgres::{Config as PoolConfig, ManagerConfig, Pool, RecyclingMethod, Runtime};
use tokio_postgres::NoTls;

use crate::error::{ApiError, ApiResult};

/// Database connection parameters, read from `GDELT_DB_*` environment
/// variables.
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub dbname: String,
    pub pool_size: usize,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            user: "postgres".to_string(),
            password: String::new(),
            dbname: "gdelt".to_string(),
            pool_size: 16,
        }
    }
}

impl DbConfig {
    /// Reads `GDELT_DB_HOST`, `GDELT_DB_PORT`, `GDELT_DB_NAME`,
    /// `GDELT_DB_USER`, `GDELT_DB_PASSWORD`, `GDELT_DB_POOL_SIZE`.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: std::env::var("GDELT_DB_HOST").unwrap_or(defaults.host),
            port: std::env::var("GDELT_DB_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.port),
            user: std::env::var("GDELT_DB_USER").unwrap_or(defaults.user),
            password: std::env::var("GDELT_DB_PASSWORD").unwrap_or(defaults.password),
            dbname: std::env::var("GDELT_DB_NAME").unwrap_or(defaults.dbname),
            pool_size: std::env::var("GDELT_DB_POOL_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.pool_size),
        }
    }

    pub fn build_pool(&self) -> ApiResult<Pool> {
        let mut cfg = PoolConfig::new();
        cfg.host = Some(self.host.clone());
        cfg.port = Some(self.port);
        cfg.user = Some(self.user.clone());
        cfg.password = Some(self.password.clone());
        cfg.dbname = Some(self.dbname.clone());
        cfg.manager = Some(ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        });
        cfg.pool = Some(deadpool_postgres::PoolConfig::new(self.pool_size));

        cfg.create_pool(Some(Runtime::Tokio1), NoTls)
            .map_err(|e| ApiError::internal(format!("failed to build database pool: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane_for_local_development() {
        let config = DbConfig::default();
        assert_eq!(config.host, "localhost");
        assert_eq!(config.port, 5432);
        assert_eq!(config.dbname, "gdelt");
        assert_eq!(config.pool_size, 16);
    }
}
