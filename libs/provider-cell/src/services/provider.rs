use reqwest::Method;
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::{Provider, ProviderError};

pub struct ProviderService {
    supabase: SupabaseClient,
}

impl ProviderService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    /// Full roster, ordered for deterministic downstream matching.
    pub async fn list_providers(&self, auth_token: &str) -> Result<Vec<Provider>, ProviderError> {
        debug!("Fetching provider roster");

        let path = "/rest/v1/providers?order=full_name.asc,id.asc";
        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, path, Some(auth_token), None)
            .await
            .map_err(|e| ProviderError::DatabaseError(e.to_string()))?;

        let providers: Vec<Provider> = result
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<Provider>, _>>()
            .map_err(|e| ProviderError::DatabaseError(format!("Failed to parse providers: {}", e)))?;

        Ok(providers)
    }

    pub async fn get_provider(
        &self,
        provider_id: Uuid,
        auth_token: &str,
    ) -> Result<Provider, ProviderError> {
        debug!("Fetching provider: {}", provider_id);

        let path = format!("/rest/v1/providers?id=eq.{}", provider_id);
        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| ProviderError::DatabaseError(e.to_string()))?;

        if result.is_empty() {
            return Err(ProviderError::NotFound {
                query: provider_id.to_string(),
            });
        }

        serde_json::from_value(result[0].clone())
            .map_err(|e| ProviderError::DatabaseError(format!("Failed to parse provider: {}", e)))
    }
}
