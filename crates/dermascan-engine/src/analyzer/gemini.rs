use std::sync::Arc;
use std::time::Instant;

use anyhow::{bail, Context, Result};
use dermascan_contracts::imaging::{DataUri, SourceImage, DEFAULT_IMAGE_MIME};
use dermascan_contracts::profiles::AnalysisProfile;
use reqwest::blocking::{Client as HttpClient, Response as HttpResponse};
use serde_json::{json, Map, Value};
use tracing::{debug, info};

use super::ImageAnalyzer;
use crate::config::AnalyzerConfig;
use crate::credentials::CredentialHost;

const API_KEY_HEADER: &str = "x-goog-api-key";
const ERROR_BODY_MAX_CHARS: usize = 512;

/// Request client for the Gemini `generateContent` endpoint.
///
/// The API key is read from the host on every call, so a key selected
/// between two analyses is used by the second one.
pub struct GeminiAnalyzer {
    config: AnalyzerConfig,
    host: Option<Arc<dyn CredentialHost>>,
    http: HttpClient,
}

impl GeminiAnalyzer {
    pub fn new(config: AnalyzerConfig, host: Option<Arc<dyn CredentialHost>>) -> Result<Self> {
        let http = HttpClient::builder()
            .timeout(config.request_timeout)
            .build()
            .context("failed to build Gemini HTTP client")?;
        Ok(Self::with_http_client(config, host, http))
    }

    pub fn with_http_client(
        config: AnalyzerConfig,
        host: Option<Arc<dyn CredentialHost>>,
        http: HttpClient,
    ) -> Self {
        Self { config, host, http }
    }

    fn endpoint_for_model(&self, model: &str) -> String {
        let trimmed = model.trim();
        let model_path = if trimmed.starts_with("models/") {
            trimmed.to_string()
        } else {
            format!("models/{trimmed}")
        };
        format!("{}/{}:generateContent", self.config.api_base, model_path)
    }

    fn build_payload(profile: &AnalysisProfile, image: &SourceImage) -> Value {
        let uri = image.data_uri();
        let parts = vec![
            json!({ "text": profile.prompt }),
            json!({
                "inlineData": {
                    "mimeType": uri.mime_type(),
                    "data": uri.data(),
                }
            }),
        ];

        let mut generation_config = Map::new();
        generation_config.insert(
            "responseModalities".to_string(),
            json!(["TEXT", "IMAGE"]),
        );
        let mut image_config = Map::new();
        if let Some(aspect_ratio) = profile.aspect_ratio.as_deref() {
            image_config.insert("aspectRatio".to_string(), json!(aspect_ratio));
        }
        if let Some(image_size) = profile.image_size.as_deref() {
            image_config.insert("imageSize".to_string(), json!(image_size));
        }
        if !image_config.is_empty() {
            generation_config.insert("imageConfig".to_string(), Value::Object(image_config));
        }

        json!({
            "contents": [{
                "role": "user",
                "parts": parts,
            }],
            "generationConfig": generation_config,
        })
    }

    fn api_key(&self) -> Option<String> {
        self.host
            .as_ref()
            .and_then(|host| host.api_key())
            .filter(|key| !key.trim().is_empty())
    }
}

impl ImageAnalyzer for GeminiAnalyzer {
    fn name(&self) -> &str {
        "gemini"
    }

    fn analyze(&self, image: &SourceImage) -> Result<DataUri> {
        let Some(api_key) = self.api_key() else {
            bail!("Gemini request rejected (403): PERMISSION_DENIED, no API key selected");
        };
        let profile = &self.config.profile;
        let endpoint = self.endpoint_for_model(&profile.model);
        let payload = Self::build_payload(profile, image);

        info!(
            model = %profile.model,
            profile = %profile.name,
            input_bytes = image.byte_len(),
            "sending analysis request"
        );
        let started = Instant::now();
        let response = self
            .http
            .post(&endpoint)
            .header(API_KEY_HEADER, api_key)
            .json(&payload)
            .send()
            // Failure text is classified for authorization markers; a URL
            // such as `:8403` must not leak into it.
            .map_err(reqwest::Error::without_url)
            .context("Gemini request could not be sent")?;
        let response_payload = response_json_or_error("Gemini", response)?;
        debug!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            "analysis response received"
        );
        image_from_response(&response_payload)
    }
}

/// Returns the first inline image among the response's content parts.
pub fn image_from_response(response_payload: &Value) -> Result<DataUri> {
    if let Some(image) = first_inline_image(response_payload) {
        return Ok(image);
    }
    match no_image_reason(response_payload) {
        Some(reason) => bail!("Gemini returned no image ({reason})"),
        None => bail!("Gemini returned no image"),
    }
}

fn first_inline_image(response_payload: &Value) -> Option<DataUri> {
    let candidates = response_payload
        .get("candidates")
        .and_then(Value::as_array)?;

    for candidate in candidates {
        let Some(parts) = candidate
            .get("content")
            .and_then(|content| content.get("parts"))
            .and_then(Value::as_array)
        else {
            continue;
        };
        for part in parts {
            let Some(inline) = part
                .get("inlineData")
                .or_else(|| part.get("inline_data"))
                .and_then(Value::as_object)
            else {
                continue;
            };
            let data = inline
                .get("data")
                .and_then(Value::as_str)
                .unwrap_or_default();
            if data.is_empty() {
                continue;
            }
            let mime_type = inline
                .get("mimeType")
                .or_else(|| inline.get("mime_type"))
                .and_then(Value::as_str)
                .filter(|value| !value.trim().is_empty())
                .unwrap_or(DEFAULT_IMAGE_MIME);
            return Some(DataUri::new(mime_type, data));
        }
    }
    None
}

fn no_image_reason(response_payload: &Value) -> Option<String> {
    if let Some(block_reason) = response_payload
        .get("promptFeedback")
        .and_then(|feedback| feedback.get("blockReason"))
        .and_then(Value::as_str)
    {
        return Some(format!("blocked: {block_reason}"));
    }
    response_payload
        .get("candidates")
        .and_then(Value::as_array)
        .and_then(|candidates| candidates.first())
        .and_then(|candidate| candidate.get("finishReason"))
        .and_then(Value::as_str)
        .filter(|reason| *reason != "STOP")
        .map(|reason| format!("finish reason: {reason}"))
}

fn response_json_or_error(provider: &str, response: HttpResponse) -> Result<Value> {
    let status = response.status();
    let code = status.as_u16();
    let body = response
        .text()
        .with_context(|| format!("{provider} response body read failed"))?;
    if !status.is_success() {
        bail!(
            "{provider} request failed ({code}): {}",
            truncate_text(&body, ERROR_BODY_MAX_CHARS)
        );
    }
    let parsed: Value = serde_json::from_str(&body)
        .with_context(|| format!("{provider} returned invalid JSON payload"))?;
    Ok(parsed)
}

fn truncate_text(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        return value.to_string();
    }
    value.chars().take(max_chars).collect::<String>() + "…"
}
