// libs/voice-cell/src/services/extraction.rs
use chrono::NaiveDate;
use reqwest::{header, Client};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, warn};

use shared_config::AppConfig;

use crate::models::{ExtractedBooking, VoiceError};

const EXTRACTION_SYSTEM_PROMPT: &str = "You extract appointment booking details from a patient's \
spoken request. Respond with a single JSON object and nothing else, using exactly these keys: \
provider (string or null), specialty (string or null), date (YYYY-MM-DD or null), \
time (HH:MM 24-hour or null), intent (one of: book, confirm, cancel, other), \
confidence (number between 0 and 1). Resolve relative dates like \"tomorrow\" or \
\"next Tuesday\" against the reference date given by the user.";

/// Natural-language extraction client: free text plus a reference date in,
/// a partially-populated `ExtractedBooking` out.
pub struct ExtractionService {
    api_key: String,
    base_url: String,
    http_client: Client,
}

impl ExtractionService {
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

    pub async fn extract(
        &self,
        transcript: &str,
        today: NaiveDate,
    ) -> Result<ExtractedBooking, VoiceError> {
        debug!("Extracting booking details from transcript ({} chars)", transcript.len());

        if transcript.trim().is_empty() {
            return Err(VoiceError::ValidationError("Transcript is empty".to_string()));
        }

        let request = json!({
            "model": "gpt-4o",
            "messages": [
                { "role": "system", "content": EXTRACTION_SYSTEM_PROMPT },
                {
                    "role": "user",
                    "content": format!("Reference date (today): {}\nRequest: {}", today, transcript)
                }
            ],
            "temperature": 0.0
        });

        let url = format!("{}/v1/chat/completions", self.base_url);
        let response = self
            .http_client
            .post(&url)
            .header(header::AUTHORIZATION, format!("Bearer {}", self.api_key))
            .header(header::CONTENT_TYPE, "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| VoiceError::UpstreamServiceError(format!("Extraction request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(VoiceError::UpstreamServiceError(format!(
                "Extraction service returned {}: {}",
                status, error_text
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| VoiceError::UpstreamServiceError(format!("Invalid extraction response: {}", e)))?;

        let content = body["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| {
                VoiceError::UpstreamServiceError("Extraction response missing content".to_string())
            })?;

        parse_extraction(content).ok_or_else(|| {
            warn!("Unparseable extraction output: {}", content);
            VoiceError::UpstreamServiceError("Extraction output contained no JSON object".to_string())
        })
    }
}

/// Deserialize model output into the typed record, tolerating code fences
/// and surrounding prose.
pub fn parse_extraction(content: &str) -> Option<ExtractedBooking> {
    let object = extract_first_json_object(content)?;
    serde_json::from_str(object).ok()
}

/// The first balanced `{...}` in the input, honoring string literals and
/// escapes so braces inside quoted values do not break the scan.
pub fn extract_first_json_object(input: &str) -> Option<&str> {
    let start = input.find('{')?;
    let bytes = input.as_bytes();

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, &b) in bytes.iter().enumerate().skip(start) {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }

        match b {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&input[start..=i]);
                }
            }
            _ => {}
        }
    }

    None
}
