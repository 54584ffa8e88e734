//! Google Gemini `generateContent` client.
//!
//! The transcript is flattened into a single user turn (prompt + dialogue so
//! far), matching how the secretary prompt is written; executed function
//! calls are replayed as model/function turns so the follow-up invocation
//! sees their results.

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use cardesk_core::config::LlmConfig;
use cardesk_core::domain::conversation::MessageRole;

use crate::llm::{FunctionCall, LanguageModel, ModelError, ModelRequest, ModelResponse};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

pub struct GeminiClient {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: SecretString,
    temperature: f64,
    max_output_tokens: u32,
}

#[derive(Debug, thiserror::Error)]
pub enum GeminiClientError {
    #[error("llm.api_key is required for the Gemini provider")]
    MissingApiKey,
    #[error("failed to build HTTP client: {0}")]
    Http(#[from] reqwest::Error),
}

impl GeminiClient {
    pub fn from_config(config: &LlmConfig) -> Result<Self, GeminiClientError> {
        let api_key = config.api_key.clone().ok_or(GeminiClientError::MissingApiKey)?;
        // The request timeout is the only bound on a stalled provider; a
        // client without it is not usable, so builder failure is fatal.
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config
                .base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            model: config.model.clone(),
            api_key,
            temperature: config.temperature,
            max_output_tokens: config.max_output_tokens,
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }

    fn build_body(&self, request: &ModelRequest) -> Value {
        let mut dialogue = String::new();
        for message in &request.transcript {
            let speaker = match message.role {
                MessageRole::Assistant => "Assistant",
                MessageRole::Function => continue,
                _ => "User",
            };
            dialogue.push_str(speaker);
            dialogue.push_str(": ");
            dialogue.push_str(&message.content);
            dialogue.push('\n');
        }

        let full_prompt = format!(
            "{}\n\nConversation so far:\n{}\nAssistant:",
            request.system_prompt, dialogue
        );

        let mut contents = vec![json!({
            "role": "user",
            "parts": [{ "text": full_prompt }]
        })];

        for (call, result) in &request.function_results {
            contents.push(json!({
                "role": "model",
                "parts": [{ "functionCall": { "name": call.name, "args": call.arguments } }]
            }));
            contents.push(json!({
                "role": "function",
                "parts": [{ "functionResponse": { "name": call.name, "response": result } }]
            }));
        }

        let mut body = json!({
            "contents": contents,
            "generationConfig": {
                "temperature": self.temperature,
                "maxOutputTokens": self.max_output_tokens,
            }
        });

        if !request.tools.is_empty() {
            let declarations: Vec<Value> = request
                .tools
                .iter()
                .map(|tool| {
                    json!({
                        "name": tool.name,
                        "description": tool.description,
                        "parameters": tool.parameters,
                    })
                })
                .collect();
            body["tools"] = json!([{ "functionDeclarations": declarations }]);
        }

        body
    }
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    text: Option<String>,
    function_call: Option<PartFunctionCall>,
}

#[derive(Deserialize)]
struct PartFunctionCall {
    name: String,
    #[serde(default)]
    args: Value,
}

#[async_trait]
impl LanguageModel for GeminiClient {
    async fn generate(&self, request: ModelRequest) -> Result<ModelResponse, ModelError> {
        let body = self.build_body(&request);

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", self.api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| ModelError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ModelError::Provider { status: status.as_u16(), body });
        }

        let decoded: GenerateResponse =
            response.json().await.map_err(|e| ModelError::Decode(e.to_string()))?;

        let mut text: Option<String> = None;
        let mut function_calls = Vec::new();
        for part in decoded
            .candidates
            .into_iter()
            .filter_map(|c| c.content)
            .flat_map(|c| c.parts)
        {
            if let Some(chunk) = part.text {
                match &mut text {
                    Some(existing) => existing.push_str(&chunk),
                    None => text = Some(chunk),
                }
            }
            if let Some(call) = part.function_call {
                function_calls
                    .push(FunctionCall { name: call.name, arguments: call.args });
            }
        }

        debug!(
            event_name = "secretary.model.generated",
            has_text = text.is_some(),
            function_calls = function_calls.len(),
            "model response decoded"
        );

        Ok(ModelResponse { text, function_calls })
    }
}
