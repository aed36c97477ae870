use crate::ai::hints::parse_gemini_error_hints;
use crate::ai::{normalize_api_key, RemoteError, RemoteTranslator, TranslationRequest};
use crate::config::GeminiConfig;
use log::debug;
use reqwest::blocking::Client;
use reqwest::Url;
use serde::Deserialize;

pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Gemini `generateContent` backend constrained to a JSON array of strings.
#[derive(Debug)]
pub struct GeminiTranslator {
    client: Client,
    api_key: Option<String>,
    model: String,
    base_url: String,
    temperature: f32,
}

impl GeminiTranslator {
    pub fn new(config: &GeminiConfig) -> Result<Self, RemoteError> {
        let client = Client::builder().timeout(config.timeout()).build()?;
        Ok(Self {
            client,
            api_key: None,
            model: config.model.trim().to_string(),
            base_url: config.base_url.trim().trim_end_matches('/').to_string(),
            temperature: config.temperature,
        })
    }

    /// Builds the backend with the key from `GEMINI_API_KEY`.
    pub fn from_env(config: &GeminiConfig) -> Result<Self, RemoteError> {
        Ok(Self::new(config)?.with_api_key(std::env::var(API_KEY_ENV).ok()))
    }

    pub fn with_api_key(mut self, key: Option<String>) -> Self {
        self.api_key = normalize_api_key(key);
        self
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self, api_key: &str) -> Result<Url, RemoteError> {
        let normalized_model = if self.model.starts_with("models/") {
            self.model.clone()
        } else {
            format!("models/{}", self.model)
        };

        let mut url = Url::parse(&format!(
            "{}/v1beta/{}:generateContent",
            self.base_url, normalized_model
        ))
        .map_err(|err| RemoteError::Failure(format!("invalid Gemini endpoint: {err}")))?;
        url.query_pairs_mut().append_pair("key", api_key);
        Ok(url)
    }

    fn request_body(&self, prompt: &str) -> serde_json::Value {
        serde_json::json!({
            "contents": [
                {
                    "role": "user",
                    "parts": [
                        {
                            "text": prompt
                        }
                    ]
                }
            ],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": {
                    "type": "ARRAY",
                    "items": {
                        "type": "STRING"
                    }
                },
                "temperature": self.temperature
            }
        })
    }
}

impl RemoteTranslator for GeminiTranslator {
    fn name(&self) -> &'static str {
        "Gemini"
    }

    fn translate(&mut self, request: &TranslationRequest<'_>) -> Result<String, RemoteError> {
        let api_key = self.api_key.as_deref().ok_or(RemoteError::MissingApiKey)?;
        let url = self.endpoint(api_key)?;

        let response = self
            .client
            .post(url)
            .json(&self.request_body(&request.prompt))
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            let hints = parse_gemini_error_hints(&body);
            let message = hints.message.unwrap_or_else(|| {
                let trimmed = body.trim();
                if trimmed.is_empty() {
                    status.canonical_reason().unwrap_or("request failed").to_string()
                } else {
                    trimmed.to_string()
                }
            });
            return Err(RemoteError::Http {
                status: status.as_u16(),
                message,
                quota_failure: hints.quota_failure,
            });
        }

        let payload = response
            .json::<GenerateContentResponse>()
            .map_err(|err| RemoteError::MalformedResponse(err.to_string()))?;
        debug!(
            "Gemini finish reason: {:?}",
            payload
                .candidates
                .first()
                .and_then(|candidate| candidate.finish_reason.as_deref())
        );
        payload.into_text()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<Content>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

impl GenerateContentResponse {
    fn into_text(self) -> Result<String, RemoteError> {
        let block_reason = self
            .prompt_feedback
            .and_then(|feedback| feedback.block_reason);

        let text: String = self
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|part| part.text)
                    .collect()
            })
            .unwrap_or_default();

        if !text.is_empty() {
            return Ok(text);
        }

        match block_reason {
            Some(reason) => Err(RemoteError::MalformedResponse(format!(
                "prompt was blocked: {reason}"
            ))),
            None => Err(RemoteError::MalformedResponse(
                "response contained no candidate text".into(),
            )),
        }
    }
}
