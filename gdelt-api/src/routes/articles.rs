//! `GET /api/articles` and `GET /api/articles/stats`.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    routing::get,
    Router,
};
use gdelt_cache::{ArticleProjector, FetchCoordinator, UsageMeter};
use gdelt_core::SystemClock;
use serde::Deserialize;

use crate::constants::MAX_DAYS_BACK;
use crate::error::{ApiError, ApiResult, Envelope, ResponseMeta};
use crate::routes::new_request_id;
use crate::state::AppState;

const DEFAULT_DAYS_BACK: i64 = 1;
const DEFAULT_COUNTRY_CODE: &str = "CH";

fn validate_days_back(days_back: i64) -> ApiResult<i64> {
    if days_back < 1 || days_back > MAX_DAYS_BACK {
        return Err(ApiError::validation(format!(
            "days_back must be between 1 and {MAX_DAYS_BACK}, got {days_back}"
        )));
    }
    Ok(days_back)
}

#[derive(Debug, Deserialize)]
pub struct ArticlesQuery {
    pub country_code: Option<String>,
    pub days_back: Option<i64>,
}

pub async fn get_articles(
    State(coordinator): State<Arc<FetchCoordinator<SystemClock>>>,
    Query(query): Query<ArticlesQuery>,
) -> ApiResult<Envelope<Vec<gdelt_core::ArticleProjection>>> {
    let country_code = query
        .country_code
        .unwrap_or_else(|| DEFAULT_COUNTRY_CODE.to_string());
    let country = country_code
        .parse()
        .map_err(|e| ApiError::validation(format!("invalid country_code: {e}")))?;

    let days_back = validate_days_back(query.days_back.unwrap_or(DEFAULT_DAYS_BACK))?;

    let outcome = coordinator.get_articles(country, days_back).await?;
    let projections = ArticleProjector::project_all(&outcome.rows);

    let meta = ResponseMeta::new(new_request_id())
        .with_partial(outcome.partial)
        .with_total(projections.len())
        .with_query(country_code, days_back);
    Ok(Envelope::ok(projections, meta))
}

pub async fn get_stats(
    State(usage): State<Arc<dyn UsageMeter>>,
) -> ApiResult<Envelope<gdelt_core::UsageStats>> {
    let stats = usage.snapshot().await?;
    let meta = ResponseMeta::new(new_request_id());
    Ok(Envelope::ok(stats, meta))
}

pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_articles))
        .route("/stats", get(get_stats))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_zero_and_negative_days_back() {
        assert!(validate_days_back(0).is_err());
        assert!(validate_days_back(-1).is_err());
    }

    #[test]
    fn rejects_days_back_past_the_configured_ceiling() {
        assert!(validate_days_back(MAX_DAYS_BACK + 1).is_err());
    }

    #[test]
    fn accepts_the_default_and_the_ceiling() {
        assert_eq!(DEFAULT_DAYS_BACK, 1, "spec.md §6 documents days_back defaulting to 1");
        assert!(validate_days_back(DEFAULT_DAYS_BACK).is_ok());
        assert!(validate_days_back(MAX_DAYS_BACK).is_ok());
    }
}
