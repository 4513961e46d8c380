//! Constants used throughout the API layer.

/// Default CORS max age in seconds (24 hours).
pub const DEFAULT_CORS_MAX_AGE_SECS: u64 = 86400;

/// Default rate limit, requests per minute per caller.
pub const DEFAULT_RATE_LIMIT_PER_MINUTE: u32 = 100;

/// Default burst size for rate limiting.
pub const DEFAULT_RATE_LIMIT_BURST: u32 = 10;

/// Upper bound accepted for `days_back`, mirroring `CacheConfig::max_days_back`'s
/// default; the coordinator itself clamps, this is just what the validator
/// rejects up front with a 400 instead of a silent clamp.
pub const MAX_DAYS_BACK: i64 = 30;
