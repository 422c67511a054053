//! Client for the hosted model.
//!
//! [`InferenceClient`] is the seam the turn loop talks to; [`GeminiClient`] is
//! the implementation that calls the Gemini `generateContent` REST endpoint.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument};

use crate::config::Settings;
use crate::error::InferenceError;
use crate::prompt::RenderedPrompt;

#[async_trait]
pub trait InferenceClient: Send + Sync {
    /// Sends one prompt and returns the raw completion text.
    async fn complete(&self, prompt: &RenderedPrompt) -> Result<String, InferenceError>;
}

#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    endpoint: String,
    model: String,
    temperature: f64,
    max_output_tokens: u32,
}

impl GeminiClient {
    pub fn new(settings: &Settings) -> Result<Self, InferenceError> {
        let client = Client::builder()
            .timeout(settings.request_timeout)
            .build()
            .map_err(InferenceError::Transport)?;
        Ok(Self {
            client,
            api_key: settings.api_key.clone(),
            endpoint: format!("{}/models/{}:generateContent", settings.base_url, settings.model),
            model: settings.model.clone(),
            temperature: settings.temperature,
            max_output_tokens: settings.max_output_tokens,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn build_request(&self, prompt: &RenderedPrompt) -> GenerateContentRequest {
        GenerateContentRequest {
            system_instruction: Content {
                role: None,
                parts: vec![Part { text: prompt.system.clone() }],
            },
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part { text: prompt.user.clone() }],
            }],
            generation_config: GenerationConfig {
                temperature: self.temperature,
                max_output_tokens: self.max_output_tokens,
                candidate_count: 1,
            },
        }
    }
}

#[async_trait]
impl InferenceClient for GeminiClient {
    #[instrument(skip(self, prompt), fields(model = %self.model))]
    async fn complete(&self, prompt: &RenderedPrompt) -> Result<String, InferenceError> {
        let body = self.build_request(prompt);
        debug!(user_prompt = %prompt.user, "Sending prompt to Gemini");

        let response = self
            .client
            .post(&self.endpoint)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error body".to_string());
            error!(%status, %error_body, "Gemini API request failed");
            return Err(InferenceError::Status {
                status: status.as_u16(),
                message: provider_message(&error_body),
            });
        }

        let parsed = response.json::<GenerateContentResponse>().await?;
        let text = extract_text(parsed)?;
        debug!(completion = %text, "Received Gemini completion");
        Ok(text)
    }
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    system_instruction: Content,
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Serialize, Debug)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    parts: Vec<Part>,
}

#[derive(Serialize, Debug)]
struct Part {
    text: String,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f64,
    max_output_tokens: u32,
    candidate_count: u32,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Deserialize, Debug)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize, Debug)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize, Debug)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Deserialize)]
struct ErrorWrapper {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
    status: Option<String>,
}

fn extract_text(response: GenerateContentResponse) -> Result<String, InferenceError> {
    if let Some(reason) = response.prompt_feedback.and_then(|f| f.block_reason) {
        return Err(InferenceError::Blocked(reason));
    }

    let text: String = response
        .candidates
        .and_then(|candidates| candidates.into_iter().next())
        .and_then(|candidate| candidate.content)
        .map(|content| content.parts.into_iter().filter_map(|part| part.text).collect())
        .unwrap_or_default();

    if text.is_empty() {
        Err(InferenceError::EmptyResponse)
    } else {
        Ok(text)
    }
}

/// `STATUS: message` from a Gemini error body, or the body itself.
fn provider_message(body: &str) -> String {
    match serde_json::from_str::<ErrorWrapper>(body) {
        Ok(wrapper) => {
            let message = wrapper.error.message.unwrap_or_else(|| body.to_string());
            match wrapper.error.status {
                Some(status) if !status.is_empty() => format!("{}: {}", status, message),
                _ => message,
            }
        }
        Err(_) => body.to_string(),
    }
}
