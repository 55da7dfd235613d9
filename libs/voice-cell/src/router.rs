// libs/voice-cell/src/router.rs
use std::sync::Arc;

use axum::{middleware, routing::post, Router};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn voice_routes(state: Arc<AppConfig>) -> Router {
    let protected_routes = Router::new()
        .route("/transcribe", post(handlers::transcribe))
        .route("/interpret", post(handlers::interpret))
        .route("/converse", post(handlers::converse))
        .route("/book", post(handlers::book))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new().merge(protected_routes).with_state(state)
}
