//! Question answering and summarization over the loaded corpus.
//!
//! Both operations always produce a displayable string: failures are rendered as explanatory
//! answers rather than surfaced as errors, so the HTTP layer can return them with `200 OK`.

use std::sync::Arc;
use thiserror::Error;

use crate::corpus::CorpusStore;
use crate::inference::{
    InferenceClient, InferenceError, PromptTemplate, PromptVariables, QA_TEMPLATE,
    SUMMARIZE_TEMPLATE,
};

const OUT_OF_MEMORY_ANSWER: &str =
    "MemoryError: Model requires more RAM than available. Try smaller chunk_size.";

/// Reasons a query or summary could not be produced.
#[derive(Debug, Error)]
pub enum QueryError {
    /// The corpus holds no chunks.
    #[error("no text loaded")]
    NoTextLoaded,
    /// No inference client is configured.
    #[error("LLM not available")]
    BackendUnavailable,
    /// The backend failed while generating.
    #[error(transparent)]
    Inference(#[from] InferenceError),
}

/// Which operation an error message should describe.
#[derive(Debug, Clone, Copy)]
enum Operation {
    Answer,
    Summarize,
}

impl QueryError {
    fn into_answer(self, operation: Operation) -> String {
        match (self, operation) {
            (Self::NoTextLoaded, Operation::Answer) => {
                "No text loaded. Please load text first.".to_string()
            }
            (Self::NoTextLoaded, Operation::Summarize) => {
                "No text loaded to summarize.".to_string()
            }
            (Self::BackendUnavailable, Operation::Answer) => {
                "LLM not available. Cannot answer query.".to_string()
            }
            (Self::BackendUnavailable, Operation::Summarize) => {
                "LLM not available. Cannot summarize text.".to_string()
            }
            (Self::Inference(InferenceError::OutOfMemory(_)), _) => {
                OUT_OF_MEMORY_ANSWER.to_string()
            }
            (Self::Inference(error), Operation::Answer) => {
                format!("Error answering query: {error}")
            }
            (Self::Inference(error), Operation::Summarize) => {
                format!("Error summarizing text: {error}")
            }
        }
    }
}

/// Builds prompts from the corpus and forwards them to the inference backend.
#[derive(Clone)]
pub struct QueryService {
    corpus: CorpusStore,
    client: Option<Arc<dyn InferenceClient>>,
}

impl QueryService {
    /// Answer questions over `corpus` using `client`; `None` means no model is available.
    pub fn new(corpus: CorpusStore, client: Option<Arc<dyn InferenceClient>>) -> Self {
        Self { corpus, client }
    }

    /// Whether an inference backend is configured.
    pub fn has_backend(&self) -> bool {
        self.client.is_some()
    }

    /// Answer `query` from the loaded chunks, or return a typed failure.
    pub async fn try_answer(&self, query: &str) -> Result<String, QueryError> {
        let variables = |context: String| {
            PromptVariables::from([("context", context), ("question", query.to_string())])
        };
        self.generate(&QA_TEMPLATE, variables).await
    }

    /// Summarize the loaded chunks, or return a typed failure.
    pub async fn try_summarize(&self) -> Result<String, QueryError> {
        self.generate(&SUMMARIZE_TEMPLATE, |context| {
            PromptVariables::from([("text", context)])
        })
        .await
    }

    /// Answer `query`, rendering any failure as an explanatory answer.
    pub async fn answer_query(&self, query: &str) -> String {
        self.try_answer(query).await.unwrap_or_else(|error| {
            log_failure(&error, "Failed to answer query");
            error.into_answer(Operation::Answer)
        })
    }

    /// Summarize the corpus, rendering any failure as an explanatory answer.
    pub async fn summarize(&self) -> String {
        self.try_summarize().await.unwrap_or_else(|error| {
            log_failure(&error, "Failed to summarize text");
            error.into_answer(Operation::Summarize)
        })
    }

    async fn generate<F>(
        &self,
        template: &PromptTemplate,
        variables: F,
    ) -> Result<String, QueryError>
    where
        F: FnOnce(String) -> PromptVariables,
    {
        let context = self.corpus.context().await.ok_or(QueryError::NoTextLoaded)?;
        let client = self.client.as_ref().ok_or(QueryError::BackendUnavailable)?;
        tracing::debug!(context_chars = context.chars().count(), "Invoking inference backend");
        let answer = client.invoke_template(template, &variables(context)).await?;
        Ok(answer)
    }
}

fn log_failure(error: &QueryError, message: &str) {
    match error {
        QueryError::Inference(inner) => tracing::error!(error = %inner, "{message}"),
        other => tracing::debug!(reason = %other, "{message}"),
    }
}
