pub mod health;
pub mod resource;


use axum::Router;

use crate::error::ApiError;
use crate::state::AppState;

/// Assemble the full router: health checks at the root, every catalog
/// resource under the configured API prefix.
pub fn build_router(state: AppState) -> Router {
    let resources = state
        .services()
        .fold(Router::new(), |router, service| router.merge(resource::routes(service)));

    let prefix = state.config().api_prefix.clone();
    let api = if prefix.is_empty() {
        resources
    } else {
        Router::new().nest(&prefix, resources)
    };

    Router::new()
        .merge(health::routes().with_state(state))
        .merge(api)
        .fallback(route_not_found)
}

async fn route_not_found() -> ApiError {
    ApiError::NotFound("Route not found".to_string())
}
