// libs/voice-cell/src/services/transcription.rs
use reqwest::{header, multipart, Client};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use shared_config::AppConfig;

use crate::models::VoiceError;

/// Speech-to-text client. One call per recording; failures are surfaced
/// as-is and never retried automatically.
pub struct TranscriptionService {
    api_key: String,
    base_url: String,
    http_client: Client,
}

impl TranscriptionService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            api_key: config.openai_api_key.clone(),
            base_url: config.openai_base_url.clone(),
            http_client: Client::builder()
                .timeout(Duration::from_secs(config.http_timeout_seconds))
                .build()
                .expect("Failed to build HTTP client"),
        }
    }

    pub async fn transcribe(&self, audio: Vec<u8>, filename: &str) -> Result<String, VoiceError> {
        debug!("Transcribing {} bytes of audio ({})", audio.len(), filename);

        if audio.is_empty() {
            return Err(VoiceError::ValidationError("Audio body is empty".to_string()));
        }

        let part = multipart::Part::bytes(audio)
            .file_name(filename.to_string())
            .mime_str("application/octet-stream")
            .map_err(|e| VoiceError::UpstreamServiceError(e.to_string()))?;

        let form = multipart::Form::new()
            .part("file", part)
            .text("model", "whisper-1");

        let url = format!("{}/v1/audio/transcriptions", self.base_url);
        let response = self
            .http_client
            .post(&url)
            .header(header::AUTHORIZATION, format!("Bearer {}", self.api_key))
            .multipart(form)
            .send()
            .await
            .map_err(|e| VoiceError::UpstreamServiceError(format!("Transcription request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(VoiceError::UpstreamServiceError(format!(
                "Transcription service returned {}: {}",
                status, error_text
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| VoiceError::UpstreamServiceError(format!("Invalid transcription response: {}", e)))?;

        body["text"]
            .as_str()
            .map(|t| t.trim().to_string())
            .ok_or_else(|| {
                VoiceError::UpstreamServiceError("Transcription response missing text field".to_string())
            })
    }
}
