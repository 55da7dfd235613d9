use std::sync::Arc;

use axum::{
    Router,
    routing::get,
};

use appointment_cell::router::appointment_routes;
use provider_cell::router::provider_routes;
use shared_config::AppConfig;
use voice_cell::router::voice_routes;

pub fn create_router(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", get(|| async { "CareVoice API is running!" }))
        .nest("/providers", provider_routes(state.clone()))
        .nest("/appointments", appointment_routes(state.clone()))
        .nest("/voice", voice_routes(state.clone()))
}
