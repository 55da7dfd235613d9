// libs/provider-cell/src/router.rs
use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, put},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn provider_routes(state: Arc<AppConfig>) -> Router {
    let protected_routes = Router::new()
        .route("/", get(handlers::list_providers))
        .route("/resolve", get(handlers::resolve_provider))
        .route("/{provider_id}", get(handlers::get_provider))
        .route("/{provider_id}/availability", get(handlers::get_availability))
        .route("/{provider_id}/availability", put(handlers::upsert_availability))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new().merge(protected_routes).with_state(state)
}
