// libs/provider-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    Json,
};
use axum_extra::TypedHeader;
use headers::{authorization::Bearer, Authorization};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::error::AppError;

use crate::models::{ProviderError, ResolveQuery, UpsertAvailabilityRequest};
use crate::services::availability::AvailabilityService;
use crate::services::provider::ProviderService;
use crate::services::resolver::ProviderResolver;

fn map_provider_error(e: ProviderError) -> AppError {
    match e {
        ProviderError::NotFound { query } => {
            AppError::NotFound(format!("No provider matched \"{}\"", query))
        }
        ProviderError::ValidationError(msg) => AppError::ValidationError(msg),
        ProviderError::DatabaseError(msg) => AppError::Database(msg),
    }
}

#[axum::debug_handler]
pub async fn list_providers(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Value>, AppError> {
    let providers = ProviderService::new(&state)
        .list_providers(auth.token())
        .await
        .map_err(map_provider_error)?;

    Ok(Json(json!({ "providers": providers })))
}

#[axum::debug_handler]
pub async fn get_provider(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(provider_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let provider = ProviderService::new(&state)
        .get_provider(provider_id, auth.token())
        .await
        .map_err(map_provider_error)?;

    Ok(Json(json!({ "provider": provider })))
}

/// Free-text provider lookup used by the voice pipeline and by the booking
/// form's typeahead. Unresolved input is a 404 echoing the search term.
#[axum::debug_handler]
pub async fn resolve_provider(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Query(query): Query<ResolveQuery>,
) -> Result<Json<Value>, AppError> {
    if query.q.trim().is_empty() {
        return Err(AppError::ValidationError("Search text is required".to_string()));
    }

    let resolved = ProviderResolver::new(&state)
        .resolve(&query.q, auth.token())
        .await
        .map_err(map_provider_error)?;

    Ok(Json(json!({
        "provider": resolved.provider,
        "confidence": resolved.confidence,
    })))
}

#[axum::debug_handler]
pub async fn get_availability(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(provider_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let rows = AvailabilityService::new(&state)
        .get_weekly(provider_id, auth.token())
        .await
        .map_err(map_provider_error)?;

    Ok(Json(json!({ "availability": rows })))
}

/// Weekly schedule upsert. Only the owning provider or an admin may write.
#[axum::debug_handler]
pub async fn upsert_availability(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path(provider_id): Path<Uuid>,
    Json(request): Json<UpsertAvailabilityRequest>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();

    if !user.is_admin() {
        let provider = ProviderService::new(&state)
            .get_provider(provider_id, token)
            .await
            .map_err(map_provider_error)?;

        if provider.user_id.to_string() != user.id {
            return Err(AppError::Auth(
                "Not authorized to modify this provider's schedule".to_string(),
            ));
        }
    }

    let rows = AvailabilityService::new(&state)
        .upsert_weekly(provider_id, request, token)
        .await
        .map_err(map_provider_error)?;

    Ok(Json(json!({
        "success": true,
        "availability": rows,
    })))
}
