//! Provider-agnostic language-model contract. The orchestrator is written
//! against this trait so the backing provider can be swapped (or scripted in
//! tests) without touching the dialogue loop.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use cardesk_core::domain::conversation::Message;

/// One callable capability declared to the model: a name, a human-readable
/// description, and a JSON-schema parameter object.
#[derive(Clone, Debug, PartialEq)]
pub struct ToolSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub parameters: Value,
}

/// A function invocation requested by the model.
#[derive(Clone, Debug, PartialEq)]
pub struct FunctionCall {
    pub name: String,
    pub arguments: Value,
}

#[derive(Clone, Debug)]
pub struct ModelRequest {
    pub system_prompt: String,
    pub transcript: Vec<Message>,
    pub tools: Vec<ToolSpec>,
    /// Executed calls and their results, appended when re-invoking the model
    /// after tool execution.
    pub function_results: Vec<(FunctionCall, Value)>,
}

#[derive(Clone, Debug, Default)]
pub struct ModelResponse {
    pub text: Option<String>,
    pub function_calls: Vec<FunctionCall>,
}

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("model transport failed: {0}")]
    Transport(String),
    #[error("model provider returned status {status}: {body}")]
    Provider { status: u16, body: String },
    #[error("model response could not be decoded: {0}")]
    Decode(String),
}

#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn generate(&self, request: ModelRequest) -> Result<ModelResponse, ModelError>;
}
