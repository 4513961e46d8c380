//! Error Types for the GDELT API
//!
//! Defines `ErrorCode`/`ApiError` (categorized error + HTTP status mapping)
//! and the envelope wrapper every response — success or failure — goes
//! out in: `{success, data, error, meta}`.

use std::fmt;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// ERROR CODE ENUM
// ============================================================================

/// Error codes for API responses. Each maps to exactly one HTTP status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Request parameters failed validation (bad country code, out-of-range days_back).
    ValidationError,
    /// The article store is unreachable or the connection pool is exhausted.
    DatabaseUnavailable,
    /// The requested resource does not exist.
    ResourceNotFound,
    /// Unclassified internal failure.
    InternalError,
    /// The operation did not complete within its deadline.
    Timeout,
    /// The caller exceeded the configured request rate.
    RateLimited,
}

impl ErrorCode {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ErrorCode::ValidationError => StatusCode::BAD_REQUEST,
            ErrorCode::DatabaseUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            ErrorCode::ResourceNotFound => StatusCode::NOT_FOUND,
            ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
            ErrorCode::Timeout => StatusCode::GATEWAY_TIMEOUT,
            ErrorCode::RateLimited => StatusCode::TOO_MANY_REQUESTS,
        }
    }

    pub fn default_message(&self) -> &'static str {
        match self {
            ErrorCode::ValidationError => "Request validation failed",
            ErrorCode::DatabaseUnavailable => "Article store is temporarily unavailable",
            ErrorCode::ResourceNotFound => "Resource not found",
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::Timeout => "Operation timed out",
            ErrorCode::RateLimited => "Rate limit exceeded",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

// ============================================================================
// API ERROR STRUCT
// ============================================================================

/// Structured error carried inside the `error` field of the envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn from_code(code: ErrorCode) -> Self {
        Self {
            code,
            message: code.default_message().to_string(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn status_code(&self) -> StatusCode {
        self.code.status_code()
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ValidationError, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ResourceNotFound, message)
    }

    pub fn database_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::DatabaseUnavailable, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    pub fn timeout(operation: &str) -> Self {
        Self::new(ErrorCode::Timeout, format!("Operation '{}' timed out", operation))
    }

    pub fn rate_limited() -> Self {
        Self::from_code(ErrorCode::RateLimited)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

/// Maps `gdelt_cache::CacheError` onto the API's error taxonomy. An
/// upstream warehouse failure never reaches here — the coordinator
/// swallows it into `FetchOutcome::partial`; only store/pool failures
/// and internal invariant violations surface as errors at all.
impl From<gdelt_cache::CacheError> for ApiError {
    fn from(err: gdelt_cache::CacheError) -> Self {
        match err {
            gdelt_cache::CacheError::Store(e) => {
                tracing::error!(error = %e, "store error");
                ApiError::database_unavailable("Article store is unavailable")
            }
            gdelt_cache::CacheError::Pool(e) => {
                tracing::error!(error = %e, "connection pool error");
                ApiError::database_unavailable("Article store connection pool is exhausted")
            }
            gdelt_cache::CacheError::Upstream(msg) => {
                tracing::error!(error = %msg, "warehouse call failed outside the coordinator's own handling");
                ApiError::database_unavailable("Upstream warehouse call failed")
            }
            gdelt_cache::CacheError::Timeout(what) => ApiError::timeout(&what),
            gdelt_cache::CacheError::Internal(msg) => {
                tracing::error!(error = %msg, "internal invariant violation");
                ApiError::internal("Internal server error")
            }
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

// ============================================================================
// RESPONSE ENVELOPE
// ============================================================================

/// Metadata carried by every envelope, success or failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
    /// Present on `GET /api/articles` responses: whether some historical
    /// day or the current-day refresh failed and was skipped.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partial: Option<bool>,
    /// Present on `GET /api/articles` responses: row count returned.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<usize>,
    /// Present on `GET /api/articles` responses: the resolved country
    /// code the request was served for, after defaulting.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country_code: Option<String>,
    /// Present on `GET /api/articles` responses: the resolved
    /// `days_back`, after defaulting.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub days_back: Option<i64>,
}

impl ResponseMeta {
    pub fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
            partial: None,
            total: None,
            country_code: None,
            days_back: None,
        }
    }

    pub fn with_partial(mut self, partial: bool) -> Self {
        self.partial = Some(partial);
        self
    }

    pub fn with_total(mut self, total: usize) -> Self {
        self.total = Some(total);
        self
    }

    pub fn with_query(mut self, country_code: impl Into<String>, days_back: i64) -> Self {
        self.country_code = Some(country_code.into());
        self.days_back = Some(days_back);
        self
    }
}

/// `{success, data, error, meta}` — the shape of every response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiError>,
    pub meta: ResponseMeta,
}

impl<T: Serialize> Envelope<T> {
    pub fn ok(data: T, meta: ResponseMeta) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            meta,
        }
    }
}

impl Envelope<()> {
    pub fn err(error: ApiError, meta: ResponseMeta) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error),
            meta,
        }
    }
}

impl<T: Serialize> IntoResponse for Envelope<T> {
    fn into_response(self) -> Response {
        let status = self
            .error
            .as_ref()
            .map(|e| e.status_code())
            .unwrap_or(StatusCode::OK);
        (status, Json(self)).into_response()
    }
}

/// Bare `ApiError` also implements `IntoResponse`, wrapping itself in an
/// envelope with a freshly minted request id, for handlers that return
/// `Result<Envelope<T>, ApiError>` and hit the `Err` arm.
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let meta = ResponseMeta::new(crate::routes::new_request_id());
        (status, Json(Envelope::<()>::err(self, meta))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_code_status_mapping() {
        assert_eq!(ErrorCode::ValidationError.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ErrorCode::DatabaseUnavailable.status_code(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(ErrorCode::ResourceNotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(ErrorCode::InternalError.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(ErrorCode::Timeout.status_code(), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(ErrorCode::RateLimited.status_code(), StatusCode::TOO_MANY_REQUESTS);
    }

    #[test]
    fn envelope_success_serializes_without_error_field() {
        let meta = ResponseMeta::new("req-1".to_string()).with_total(3);
        let envelope = Envelope::ok(vec![1, 2, 3], meta);
        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json["success"], true);
        assert!(json.get("error").is_none());
        assert_eq!(json["meta"]["total"], 3);
    }

    #[test]
    fn envelope_error_serializes_without_data_field() {
        let meta = ResponseMeta::new("req-2".to_string());
        let envelope = Envelope::<()>::err(ApiError::validation("bad country code"), meta);
        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json["success"], false);
        assert!(json.get("data").is_none());
        assert_eq!(json["error"]["code"], "VALIDATION_ERROR");
    }

    #[test]
    fn cache_error_upstream_maps_to_database_unavailable() {
        let err: ApiError = gdelt_cache::CacheError::Upstream("boom".to_string()).into();
        assert_eq!(err.code, ErrorCode::DatabaseUnavailable);
    }
}
