//! Language-model access for question answering and summarization.
//!
//! The rest of the crate only sees [`InferenceClient::invoke`]: a rendered prompt goes in,
//! generated text comes out. The Ollama adapter talks to the runtime's `/api/generate`
//! endpoint directly over HTTP and accepts either the `{"response": ...}` shape or a chat-style
//! `{"message": {"content": ...}}` body.

pub mod prompt;

use crate::config::{Config, InferenceProvider};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;

pub use prompt::{PromptTemplate, PromptVariables, QA_TEMPLATE, SUMMARIZE_TEMPLATE};

/// Errors surfaced while invoking the inference backend.
#[derive(Debug, Error)]
pub enum InferenceError {
    /// Backend could not be reached or does not serve the endpoint.
    #[error("Inference backend unavailable: {0}")]
    Unavailable(String),
    /// Backend ran out of memory while loading or running the model.
    #[error("Model requires more memory than available: {0}")]
    OutOfMemory(String),
    /// Backend returned an error response.
    #[error("Failed to generate text: {0}")]
    GenerationFailed(String),
    /// Backend response could not be parsed.
    #[error("Malformed backend response: {0}")]
    InvalidResponse(String),
    /// A prompt template was rendered without one of its variables.
    #[error("Missing prompt variable: {0}")]
    MissingVariable(String),
}

/// Capability interface implemented by inference backends.
#[async_trait]
pub trait InferenceClient: Send + Sync {
    /// Generate a completion for a fully rendered prompt.
    async fn invoke(&self, prompt: &str) -> Result<String, InferenceError>;

    /// Render `template` with `variables` and generate a completion for it.
    async fn invoke_template(
        &self,
        template: &PromptTemplate,
        variables: &PromptVariables,
    ) -> Result<String, InferenceError> {
        let prompt = template.render(variables)?;
        self.invoke(&prompt).await
    }
}

/// Build the inference client selected by configuration.
///
/// Returns `None` when inference is disabled or the HTTP client cannot be constructed; callers
/// then report the model as unavailable instead of failing.
pub fn get_inference_client(config: &Config) -> Option<Arc<dyn InferenceClient>> {
    match config.inference_provider {
        InferenceProvider::None => {
            tracing::info!("Inference disabled by configuration");
            None
        }
        InferenceProvider::Ollama => {
            match OllamaClient::new(config.ollama_url.clone(), config.llm_model.clone()) {
                Ok(client) => {
                    tracing::info!(
                        base_url = %config.ollama_url,
                        model = %config.llm_model,
                        "Connecting to Ollama"
                    );
                    Some(Arc::new(client))
                }
                Err(error) => {
                    tracing::warn!(error = %error, "Failed to initialize Ollama client");
                    None
                }
            }
        }
    }
}

/// Ollama `/api/generate` adapter.
pub struct OllamaClient {
    http: Client,
    base_url: String,
    model: String,
}

impl OllamaClient {
    /// Build a client for `model` served at `base_url`.
    pub fn new(base_url: String, model: String) -> Result<Self, InferenceError> {
        let http = Client::builder()
            .user_agent("analyst-ai/inference")
            .build()
            .map_err(|error| InferenceError::Unavailable(error.to_string()))?;
        Ok(Self {
            http,
            base_url,
            model,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/api/generate", self.base_url.trim_end_matches('/'))
    }
}

#[derive(Debug, Deserialize)]
struct OllamaResponse {
    #[serde(default)]
    response: Option<String>,
    #[serde(default)]
    message: Option<OllamaMessage>,
    #[serde(default = "default_done")]
    done: bool,
}

#[derive(Debug, Deserialize)]
struct OllamaMessage {
    content: String,
}

fn default_done() -> bool {
    true
}

#[async_trait]
impl InferenceClient for OllamaClient {
    async fn invoke(&self, prompt: &str) -> Result<String, InferenceError> {
        let payload = json!({
            "model": self.model,
            "prompt": prompt,
            "stream": false,
        });

        let response = self
            .http
            .post(self.endpoint())
            .json(&payload)
            .send()
            .await
            .map_err(|error| {
                InferenceError::Unavailable(format!(
                    "failed to reach Ollama at {}: {error}",
                    self.base_url
                ))
            })?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(InferenceError::Unavailable(format!(
                "Ollama endpoint {} returned 404",
                self.endpoint()
            )));
        }

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            if mentions_memory(&body) {
                return Err(InferenceError::OutOfMemory(body));
            }
            return Err(InferenceError::GenerationFailed(format!(
                "Ollama returned {status}: {body}"
            )));
        }

        let body: OllamaResponse = response.json().await.map_err(|error| {
            InferenceError::InvalidResponse(format!("failed to decode Ollama response: {error}"))
        })?;

        if !body.done {
            return Err(InferenceError::InvalidResponse(
                "Ollama response incomplete (streaming not supported)".into(),
            ));
        }

        body.response
            .or(body.message.map(|message| message.content))
            .map(|text| text.trim().to_string())
            .ok_or_else(|| {
                InferenceError::InvalidResponse("Ollama response carried no text".into())
            })
    }
}

fn mentions_memory(body: &str) -> bool {
    let lower = body.to_lowercase();
    lower.contains("out of memory") || lower.contains("more system memory")
}
