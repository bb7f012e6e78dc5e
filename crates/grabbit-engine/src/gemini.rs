use std::env;
use std::error::Error as StdError;
use std::fmt;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use grabbit_contracts::ConfigError;
use reqwest::blocking::{Client as HttpClient, Response as HttpResponse};
use serde_json::{json, Map, Value};
use tracing::debug;

use crate::{
    GenerationError, ImageBuffer, ImageProvider, ProviderRequest, ProviderResponse,
    ProviderTool, ResponsePart,
};

pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
const PROVIDER: &str = "gemini";
const ERROR_TEXT_LIMIT: usize = 512;

pub struct GeminiProvider {
    api_base: String,
    api_key: String,
    http: HttpClient,
}

impl fmt::Debug for GeminiProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiProvider")
            .field("api_base", &self.api_base)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

impl GeminiProvider {
    pub fn new(
        api_key: impl Into<String>,
        api_base: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ConfigError> {
        let http = HttpClient::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| ConfigError::InvalidHttpClient(err.to_string()))?;
        Ok(Self {
            api_base: api_base.into().trim().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            http,
        })
    }

    /// Reads the credential from `GEMINI_API_KEY`, falling back to
    /// `GOOGLE_API_KEY`, and the endpoint from `GEMINI_API_BASE`.
    pub fn from_env(timeout: Duration) -> Result<Self, ConfigError> {
        let api_key = Self::api_key().ok_or(ConfigError::MissingCredential)?;
        let api_base =
            non_empty_env("GEMINI_API_BASE").unwrap_or_else(|| DEFAULT_API_BASE.to_string());
        Self::new(api_key, api_base, timeout)
    }

    pub fn api_key() -> Option<String> {
        non_empty_env("GEMINI_API_KEY").or_else(|| non_empty_env("GOOGLE_API_KEY"))
    }

    fn endpoint_for_model(&self, model: &str) -> String {
        let trimmed = model.trim();
        let model_path = if trimmed.starts_with("models/") {
            trimmed.to_string()
        } else {
            format!("models/{trimmed}")
        };
        format!("{}/{}:generateContent", self.api_base, model_path)
    }

    /// Prompt text first, then each reference image in the order given.
    fn build_parts(request: &ProviderRequest) -> Vec<Value> {
        let mut parts = vec![json!({ "text": request.prompt })];
        for reference in &request.references {
            parts.push(json!({
                "inlineData": {
                    "mimeType": reference.mime_type,
                    "data": BASE64.encode(&reference.bytes),
                }
            }));
        }
        parts
    }

    pub(crate) fn build_payload(request: &ProviderRequest) -> Value {
        let mut image_config = Map::new();
        image_config.insert(
            "aspectRatio".to_string(),
            Value::String(request.aspect_ratio.clone()),
        );
        if let Some(size) = request.image_size.as_ref() {
            image_config.insert("imageSize".to_string(), Value::String(size.clone()));
        }

        let modalities: Vec<Value> = request
            .response_modalities
            .iter()
            .map(|modality| Value::String(modality.as_str().to_string()))
            .collect();

        let mut payload = Map::new();
        payload.insert(
            "contents".to_string(),
            json!([{ "role": "user", "parts": Self::build_parts(request) }]),
        );
        payload.insert(
            "generationConfig".to_string(),
            json!({
                "responseModalities": modalities,
                "imageConfig": image_config,
            }),
        );
        let tools: Vec<Value> = request
            .tools
            .iter()
            .map(|tool| match tool {
                ProviderTool::SearchGrounding => json!({ "google_search": {} }),
            })
            .collect();
        if !tools.is_empty() {
            payload.insert("tools".to_string(), Value::Array(tools));
        }
        Value::Object(payload)
    }

    /// Flattens every candidate's parts, in order. Thought text is kept as
    /// commentary; thought images are interim drafts and are dropped.
    /// Undecodable image parts become warnings, and only fail the response
    /// when no image part decoded at all.
    pub(crate) fn extract_parts(payload: &Value) -> Result<ProviderResponse, GenerationError> {
        let mut response = ProviderResponse::default();
        let mut decoded_images = 0usize;
        let mut decode_failure = None;
        let candidates = payload
            .get("candidates")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();

        if candidates.is_empty() {
            let reason = payload
                .pointer("/promptFeedback/blockReason")
                .and_then(Value::as_str)
                .unwrap_or("no candidates returned");
            response.warnings.push(format!("Gemini response empty: {reason}"));
        }

        for candidate in candidates {
            let parts = candidate
                .pointer("/content/parts")
                .and_then(Value::as_array)
                .map(Vec::as_slice)
                .unwrap_or_default();
            for part in parts {
                if let Some(text) = part.get("text").and_then(Value::as_str) {
                    if !text.trim().is_empty() {
                        response.parts.push(ResponsePart::Text(text.to_string()));
                    }
                    continue;
                }
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
                if part.get("thought").and_then(Value::as_bool) == Some(true) {
                    debug!(bytes = data.len(), "skipping thought image");
                    continue;
                }
                let bytes = match BASE64.decode(data.as_bytes()) {
                    Ok(bytes) => bytes,
                    Err(err) => {
                        response
                            .warnings
                            .push(format!("Gemini image part could not be decoded: {err}"));
                        decode_failure.get_or_insert_with(|| err.to_string());
                        continue;
                    }
                };
                decoded_images += 1;
                let mime_type = inline
                    .get("mimeType")
                    .or_else(|| inline.get("mime_type"))
                    .and_then(Value::as_str)
                    .map(str::to_string);
                response
                    .parts
                    .push(ResponsePart::Image(ImageBuffer { bytes, mime_type }));
            }

            if let Some(reason) = candidate.get("finishReason").and_then(Value::as_str) {
                if reason != "STOP" {
                    response
                        .warnings
                        .push(format!("Gemini finished with reason {reason}"));
                }
            }
        }

        if decoded_images == 0 {
            if let Some(message) = decode_failure {
                return Err(GenerationError::Decode {
                    provider: PROVIDER.to_string(),
                    message,
                });
            }
        }
        Ok(response)
    }
}

impl ImageProvider for GeminiProvider {
    fn name(&self) -> &str {
        PROVIDER
    }

    fn generate(&self, request: &ProviderRequest) -> Result<ProviderResponse, GenerationError> {
        let endpoint = self.endpoint_for_model(&request.model);
        let payload = Self::build_payload(request);
        debug!(
            model = %request.model,
            references = request.references.len(),
            tools = request.tools.len(),
            "sending Gemini generateContent request"
        );

        let response = self
            .http
            .post(&endpoint)
            .header("x-goog-api-key", &self.api_key)
            .json(&payload)
            .send()
            .map_err(|err| GenerationError::Transport {
                provider: PROVIDER.to_string(),
                message: error_chain_text(&err, ERROR_TEXT_LIMIT),
            })?;
        let parsed = response_json_or_error(PROVIDER, response)?;
        Self::extract_parts(&parsed)
    }
}

fn response_json_or_error(provider: &str, response: HttpResponse) -> Result<Value, GenerationError> {
    let status = response.status();
    let body = response.text().map_err(|err| GenerationError::Transport {
        provider: provider.to_string(),
        message: error_chain_text(&err, ERROR_TEXT_LIMIT),
    })?;
    if !status.is_success() {
        return Err(GenerationError::Status {
            provider: provider.to_string(),
            code: status.as_u16(),
            message: api_error_message(&body),
        });
    }
    serde_json::from_str(&body).map_err(|err| GenerationError::InvalidResponse {
        provider: provider.to_string(),
        message: err.to_string(),
    })
}

/// Prefers the API's own `error.message`, falling back to the raw body.
fn api_error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|value| {
            value
                .pointer("/error/message")
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_else(|| truncate_text(body.trim(), ERROR_TEXT_LIMIT))
}

fn error_chain_text(err: &(dyn StdError + 'static), max_chars: usize) -> String {
    let mut parts: Vec<String> = Vec::new();
    let mut current = Some(err);
    while let Some(cause) = current {
        let text = cause.to_string();
        let trimmed = text.trim();
        if !trimmed.is_empty() && parts.last().map(String::as_str) != Some(trimmed) {
            parts.push(trimmed.to_string());
        }
        current = cause.source();
    }
    truncate_text(&parts.join(" | caused by: "), max_chars)
}

fn truncate_text(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        return value.to_string();
    }
    value.chars().take(max_chars).collect::<String>() + "…"
}

fn non_empty_env(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
