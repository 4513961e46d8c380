//! API Configuration Module
//!
//! CORS and rate-limiting configuration, loaded from environment variables
//! with sensible defaults for development.

/// API configuration for CORS, rate limiting, and production hardening.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Allowed CORS origins (comma-separated in env var).
    /// Empty means allow all origins (dev mode).
    pub cors_origins: Vec<String>,

    pub cors_allow_credentials: bool,

    /// Max age for CORS preflight cache in seconds.
    pub cors_max_age_secs: u64,

    pub rate_limit_enabled: bool,

    /// Requests per minute per caller IP, fed into `governor`'s quota.
    pub rate_limit_per_minute: u32,

    /// Burst capacity (allow this many requests beyond the steady rate).
    pub rate_limit_burst: u32,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            cors_origins: Vec::new(),
            cors_allow_credentials: false,
            cors_max_age_secs: 86400,
            rate_limit_enabled: true,
            rate_limit_per_minute: 100,
            rate_limit_burst: 10,
        }
    }
}

impl ApiConfig {
    /// Build from environment variables:
    /// - `GDELT_CORS_ORIGINS`: comma-separated allowed origins (empty = allow all)
    /// - `GDELT_CORS_ALLOW_CREDENTIALS`: "true" or "false" (default: false)
    /// - `GDELT_CORS_MAX_AGE_SECS`: preflight cache duration (default: 86400)
    /// - `GDELT_RATE_LIMIT_ENABLED`: "true" or "false" (default: true)
    /// - `GDELT_RATE_LIMIT_PER_MINUTE`: requests per minute per caller (default: 100)
    /// - `GDELT_RATE_LIMIT_BURST`: burst capacity (default: 10)
    pub fn from_env() -> Self {
        let cors_origins = std::env::var("GDELT_CORS_ORIGINS")
            .ok()
            .map(|s| {
                s.split(',')
                    .map(|o| o.trim().to_string())
                    .filter(|o| !o.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        let cors_allow_credentials = std::env::var("GDELT_CORS_ALLOW_CREDENTIALS")
            .ok()
            .map(|s| s.to_lowercase() == "true")
            .unwrap_or(false);

        let cors_max_age_secs = std::env::var("GDELT_CORS_MAX_AGE_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(86400);

        let rate_limit_enabled = std::env::var("GDELT_RATE_LIMIT_ENABLED")
            .ok()
            .map(|s| s.to_lowercase() != "false")
            .unwrap_or(true);

        let rate_limit_per_minute = std::env::var("GDELT_RATE_LIMIT_PER_MINUTE")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(100);

        let rate_limit_burst = std::env::var("GDELT_RATE_LIMIT_BURST")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(10);

        Self {
            cors_origins,
            cors_allow_credentials,
            cors_max_age_secs,
            rate_limit_enabled,
            rate_limit_per_minute,
            rate_limit_burst,
        }
    }

    pub fn is_production(&self) -> bool {
        !self.cors_origins.is_empty()
    }

    pub fn is_origin_allowed(&self, origin: &str) -> bool {
        if self.cors_origins.is_empty() {
            return true;
        }

        self.cors_origins.iter().any(|allowed| {
            if allowed == origin {
                return true;
            }
            if let Some(pattern) = allowed.strip_prefix("*.") {
                if let Some(origin_domain) = origin.strip_prefix("https://") {
                    return origin_domain.ends_with(pattern)
                        || origin_domain == pattern.strip_prefix('.').unwrap_or(pattern);
                }
            }
            false
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = ApiConfig::default();
        assert!(config.cors_origins.is_empty());
        assert!(!config.cors_allow_credentials);
        assert_eq!(config.cors_max_age_secs, 86400);
        assert!(config.rate_limit_enabled);
        assert_eq!(config.rate_limit_per_minute, 100);
        assert_eq!(config.rate_limit_burst, 10);
    }

    #[test]
    fn is_production_reflects_origin_list() {
        let mut config = ApiConfig::default();
        assert!(!config.is_production());

        config.cors_origins = vec!["https://gdelt-cache.example.com".to_string()];
        assert!(config.is_production());
    }

    #[test]
    fn origin_allowed_dev_mode_allows_anything() {
        let config = ApiConfig::default();
        assert!(config.is_origin_allowed("https://anything.com"));
        assert!(config.is_origin_allowed("http://localhost:3000"));
    }

    #[test]
    fn origin_allowed_production_checks_allowlist() {
        let mut config = ApiConfig::default();
        config.cors_origins = vec![
            "https://gdelt-cache.example.com".to_string(),
            "https://app.gdelt-cache.example.com".to_string(),
        ];

        assert!(config.is_origin_allowed("https://gdelt-cache.example.com"));
        assert!(config.is_origin_allowed("https://app.gdelt-cache.example.com"));
        assert!(!config.is_origin_allowed("https://evil.com"));
    }

    #[test]
    fn wildcard_subdomain_matches() {
        let mut config = ApiConfig::default();
        config.cors_origins = vec!["*.gdelt-cache.example.com".to_string()];

        assert!(config.is_origin_allowed("https://app.gdelt-cache.example.com"));
        assert!(config.is_origin_allowed("https://api.gdelt-cache.example.com"));
        assert!(!config.is_origin_allowed("https://evil.com"));
    }
}
