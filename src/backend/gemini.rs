//! Backend for the Gemini `generateContent` REST API.
//!
//! Endpoint: `{base}/v1beta/models/{model}:generateContent`.
//! Structured output: `responseMimeType: application/json` plus
//! `responseJsonSchema` carrying the sanitized schema.

use super::{Backend, GenerationReply, GenerationRequest};
use crate::error::Result;
use crate::DebateError;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

/// Default base URL for the Gemini API.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Environment variables consulted by [`GeminiBackend::from_env`], in order.
pub const API_KEY_VARS: [&str; 2] = ["GEMINI_API_KEY", "GOOGLE_API_KEY"];

/// Backend for Google's Gemini models.
///
/// # Example
///
/// ```
/// use decision_debate::backend::GeminiBackend;
///
/// let backend = GeminiBackend::new("AIza-example");
/// assert!(format!("{:?}", backend).contains("***"));
/// ```
#[derive(Clone)]
pub struct GeminiBackend {
    /// Sent as the `x-goog-api-key` header.
    pub(crate) api_key: String,
}

impl std::fmt::Debug for GeminiBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let redacted = match self.api_key.char_indices().nth(6) {
            Some((idx, _)) => format!("{}***", &self.api_key[..idx]),
            None => "***".to_string(),
        };
        f.debug_struct("GeminiBackend")
            .field("api_key", &redacted)
            .finish()
    }
}

impl GeminiBackend {
    /// Create a backend with an explicit API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
        }
    }

    /// Read the API key from `GEMINI_API_KEY`, falling back to `GOOGLE_API_KEY`.
    pub fn from_env() -> Result<Self> {
        API_KEY_VARS
            .iter()
            .filter_map(|var| std::env::var(var).ok())
            .map(|key| key.trim().to_string())
            .find(|key| !key.is_empty())
            .map(Self::new)
            .ok_or_else(|| {
                DebateError::InvalidConfig(format!(
                    "no API key found; set {}",
                    API_KEY_VARS.join(" or ")
                ))
            })
    }

    /// Build the `generateContent` request body.
    fn build_body(request: &GenerationRequest) -> Value {
        json!({
            "systemInstruction": {
                "parts": [{"text": request.system_instruction}]
            },
            "contents": [{
                "role": "user",
                "parts": [{"text": request.user_text}]
            }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseJsonSchema": request.response_schema,
                "temperature": request.config.temperature,
                "maxOutputTokens": request.config.max_output_tokens,
            }
        })
    }

    fn endpoint(base_url: &str, model: &str) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            base_url.trim_end_matches('/'),
            model
        )
    }

    /// Concatenate the text parts of the first candidate, skipping thought parts.
    fn extract_text(json_resp: &Value) -> String {
        json_resp
            .get("candidates")
            .and_then(|c| c.get(0))
            .and_then(|c| c.get("content"))
            .and_then(|c| c.get("parts"))
            .and_then(|p| p.as_array())
            .map(|parts| {
                parts
                    .iter()
                    .filter(|p| !p.get("thought").and_then(Value::as_bool).unwrap_or(false))
                    .filter_map(|p| p.get("text").and_then(Value::as_str))
                    .collect::<String>()
            })
            .unwrap_or_default()
    }
}

#[async_trait]
impl Backend for GeminiBackend {
    async fn generate(
        &self,
        client: &Client,
        base_url: &str,
        request: &GenerationRequest,
    ) -> Result<GenerationReply> {
        let url = Self::endpoint(base_url, &request.model);
        let body = Self::build_body(request);

        let resp = client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = resp.status().as_u16();

        if !resp.status().is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(DebateError::Provider {
                status: Some(status),
                message: format!("HTTP {}: {}", status, text),
            });
        }

        let json_resp: Value = resp.json().await?;
        Ok(GenerationReply::Text(Self::extract_text(&json_resp)))
    }

    fn name(&self) -> &'static str {
        "gemini"
    }
}
