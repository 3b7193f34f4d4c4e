use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::{
    core::prompt::itinerary_system_instruction,
    error::{PlannerError, Result},
    services::generation::GenerationClient,
    types::ItineraryRequest,
};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

const API_KEY_HEADER: &str = "x-goog-api-key";

#[derive(Clone)]
pub struct GeminiClient {
    api_key: Option<String>,
    base_url: String,
    model: String,
    http: reqwest::Client,
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish()
    }
}

impl GeminiClient {
    /// A client without a key is still constructible; calls fail with a
    /// configuration error instead.
    pub fn new(api_key: Option<String>, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| {
                PlannerError::Configuration(format!("Failed to build HTTP client: {err}"))
            })?;

        Ok(Self {
            api_key: api_key.filter(|key| !key.trim().is_empty()),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            http,
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn api_key(&self) -> Result<&str> {
        self.api_key.as_deref().ok_or_else(|| {
            PlannerError::Configuration("GEMINI_API_KEY is required".to_string())
        })
    }

    /// Send one `generateContent` request and return the response text.
    pub async fn generate_content(&self, request: &GenerateContentRequest) -> Result<String> {
        let api_key = self.api_key()?;
        let url = build_generate_url(&self.base_url, &self.model);

        debug!(
            target: "trip_planner::gemini",
            model = %self.model,
            has_image = request.has_inline_data(),
            "sending generateContent request"
        );

        let response = self
            .http
            .post(&url)
            .header(API_KEY_HEADER, api_key)
            .json(&request.to_value())
            .send()
            .await
            .map_err(|err| {
                PlannerError::Upstream(format!("HTTP request failed: {}", err.without_url()))
            })?;

        let status = response.status();
        let response_text = response
            .text()
            .await
            .map_err(|err| {
                PlannerError::Upstream(format!("Failed to read response: {}", err.without_url()))
            })?;

        if !status.is_success() {
            return Err(PlannerError::Upstream(describe_http_error(
                status.as_u16(),
                &response_text,
            )));
        }

        let mut deserializer = serde_json::Deserializer::from_str(&response_text);
        let parsed: GenerateContentResponse = serde_path_to_error::deserialize(&mut deserializer)
            .map_err(|err| {
                let path = err.path().to_string();
                PlannerError::Upstream(format!(
                    "Unexpected generateContent response at {}: {}",
                    if path.is_empty() { "<root>" } else { path.as_str() },
                    err.inner()
                ))
            })?;

        if let Some(reason) = parsed.block_reason() {
            warn!(target: "trip_planner::gemini", reason, "prompt was blocked by the provider");
        }

        Ok(parsed.text())
    }
}

#[async_trait]
impl GenerationClient for GeminiClient {
    fn ensure_configured(&self) -> Result<()> {
        self.api_key().map(|_| ())
    }

    async fn generate(&self, request: &ItineraryRequest) -> Result<String> {
        let mut body = GenerateContentRequest::new(request.prompt_text())
            .with_system_instruction(itinerary_system_instruction());

        if let Some(image) = request.image() {
            body = body.with_inline_image(&image.bytes, image.mime_type());
        }

        self.generate_content(&body).await
    }
}

fn build_generate_url(base_url: &str, model: &str) -> String {
    let trimmed = base_url.trim_end_matches('/');
    format!("{}/models/{}:generateContent", trimmed, model)
}

/// `HTTP <code> <STATUS>: <message>` from a Google API error envelope,
/// falling back to the raw body.
fn describe_http_error(code: u16, body: &str) -> String {
    let envelope: Option<Value> = serde_json::from_str(body).ok();
    let error = envelope.as_ref().and_then(|value| value.get("error"));

    let message = error
        .and_then(|error| error.get("message"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| body.trim().to_string());

    match error.and_then(|error| error.get("status")).and_then(Value::as_str) {
        Some(status) => format!("HTTP {code} {status}: {message}"),
        None => format!("HTTP {code}: {message}"),
    }
}

/// Body of a `generateContent` call.
#[derive(Clone, Debug, Default)]
pub struct GenerateContentRequest {
    system_instruction: Option<String>,
    parts: Vec<Value>,
}

impl GenerateContentRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            system_instruction: None,
            parts: vec![json!({ "text": prompt.into() })],
        }
    }

    pub fn with_system_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = Some(instruction.into());
        self
    }

    pub fn with_inline_image(mut self, bytes: &[u8], mime_type: &str) -> Self {
        self.parts.push(json!({
            "inlineData": {
                "mimeType": mime_type,
                "data": STANDARD.encode(bytes),
            }
        }));
        self
    }

    fn has_inline_data(&self) -> bool {
        self.parts.iter().any(|part| part.get("inlineData").is_some())
    }

    pub fn to_value(&self) -> Value {
        let mut body = json!({
            "contents": [{ "role": "user", "parts": self.parts }],
        });

        if let Some(instruction) = &self.system_instruction {
            body["systemInstruction"] = json!({ "parts": [{ "text": instruction }] });
        }

        body
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Default, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
}

#[derive(Debug, Default, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Default, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    thought: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

impl GenerateContentResponse {
    fn parts(&self) -> impl Iterator<Item = &Part> {
        self.candidates
            .iter()
            .filter_map(|candidate| candidate.content.as_ref())
            .flat_map(|content| content.parts.iter())
    }

    /// Text of the first candidate; otherwise every text fragment across
    /// all candidates joined by newlines; otherwise empty.
    pub fn text(&self) -> String {
        let primary: String = self
            .candidates
            .first()
            .and_then(|candidate| candidate.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter(|part| !part.thought)
                    .filter_map(|part| part.text.as_deref())
                    .collect()
            })
            .unwrap_or_default();

        if !primary.is_empty() {
            return primary;
        }

        self.parts()
            .filter_map(|part| part.text.as_deref())
            .filter(|text| !text.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn block_reason(&self) -> Option<&str> {
        self.prompt_feedback
            .as_ref()
            .and_then(|feedback| feedback.block_reason.as_deref())
    }
}
