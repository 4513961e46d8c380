//! REST API Routes Module

pub mod articles;
pub mod health;

use axum::Router;
use uuid::Uuid;

use crate::state::AppState;

/// Mints a fresh request id for `ResponseMeta`: 8 hex characters, taken
/// from the low 32 bits of a freshly minted UUIDv7. Not derived from any
/// inbound header; the API has no auth layer to correlate against.
pub fn new_request_id() -> String {
    let bytes = Uuid::now_v7().into_bytes();
    let low32 = u32::from_be_bytes([bytes[12], bytes[13], bytes[14], bytes[15]]);
    format!("{low32:08x}")
}

/// Builds the full application router: health checks plus the article
/// cache's read surface.
pub fn create_api_router(state: AppState) -> Router {
    Router::new()
        .route("/health", axum::routing::get(health::health_check))
        .nest("/health", health::create_router())
        .nest("/api/articles", articles::create_router())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_ids_are_unique() {
        let a = new_request_id();
        let b = new_request_id();
        assert_ne!(a, b);
    }
}
