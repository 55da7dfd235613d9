use anyhow::Result;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use shared_database::supabase::SupabaseClient;

use crate::models::Appointment;

/// Write-only notification records informing a provider of a new request.
/// Strictly best effort: the booking path logs and swallows failures here.
pub struct NotificationService {
    supabase: Arc<SupabaseClient>,
}

impl NotificationService {
    pub fn new(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }

    pub async fn notify_new_request(
        &self,
        provider_user_id: Uuid,
        appointment: &Appointment,
        auth_token: &str,
    ) -> Result<()> {
        debug!("Notifying provider user {} of appointment {}", provider_user_id, appointment.id);

        let body = json!({
            "user_id": provider_user_id,
            "type": "appointment_requested",
            "title": "New appointment request",
            "message": format!(
                "New appointment request for {} at {}",
                appointment.appointment_date, appointment.appointment_time
            ),
            "related_id": appointment.id,
        });

        let _: Vec<Value> = self
            .supabase
            .insert_returning("/rest/v1/notifications", Some(auth_token), body)
            .await?;

        Ok(())
    }
}
