//! HTTP surface for Analyst AI.
//!
//! This module exposes a compact Axum router with a handful of endpoints:
//!
//! - `POST /process-multi` – Accept a JSON array of `{ "fileName", "data" }` uploads (base64
//!   `data`), extract and clean their text, persist the combined text, and load it as the
//!   queryable corpus. Returns `{ "status", "message", "combined_file" }`.
//! - `POST /query` – Answer `{ "query" }` over the loaded corpus. Returns `{ "answer" }`.
//! - `POST /summarize` – Summarize the loaded corpus in a few lines. Returns `{ "summary" }`.
//! - `GET /chunks` – Inspect the loaded chunks with their load time and content hash.
//! - `GET /metrics` – Observe ingestion counters.
//! - `GET /commands` – Machine-readable command catalog for quick discovery by tools/hosts.
//!
//! Query and summary failures are rendered into the answer text and still return `200 OK`.

use crate::processing::{IngestError, ProcessingApi, UploadedFile};
use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Serialize;
use serde_json::{Value, json};
use std::sync::Arc;

/// Build the HTTP router exposing the ingestion and query API surface.
pub fn create_router<S>(service: Arc<S>) -> Router
where
    S: ProcessingApi + 'static,
{
    Router::new()
        .route("/process-multi", post(process_multi::<S>))
        .route("/query", post(query::<S>))
        .route("/summarize", post(summarize::<S>))
        .route("/chunks", get(get_chunks::<S>))
        .route("/metrics", get(get_metrics::<S>))
        .route("/commands", get(get_commands))
        .with_state(service)
}

/// Success response for `POST /process-multi`.
#[derive(Serialize)]
struct ProcessResponse {
    status: &'static str,
    message: String,
    combined_file: String,
}

/// Ingest a batch of uploaded files and replace the corpus.
///
/// The body must be a non-empty JSON array. Entries that are not objects, or that lack a
/// string `fileName` or `data`, are skipped by the pipeline rather than rejecting the batch.
async fn process_multi<S>(
    State(service): State<Arc<S>>,
    body: Result<Json<Value>, JsonRejection>,
) -> Response
where
    S: ProcessingApi,
{
    let entries = match body {
        Ok(Json(Value::Array(entries))) if !entries.is_empty() => entries,
        other => {
            if let Err(rejection) = other {
                tracing::debug!(error = %rejection, "Rejected upload body");
            }
            return invalid_request("No files received or invalid format");
        }
    };

    let files: Vec<UploadedFile> = entries
        .into_iter()
        .map(|entry| serde_json::from_value(entry).unwrap_or_default())
        .collect();
    let received = files.len();

    match service.ingest_uploads(files).await {
        Ok(summary) => {
            tracing::info!(
                files = received,
                chunks = summary.chunk_count,
                hash = %summary.content_hash,
                "Process request completed"
            );
            Json(ProcessResponse {
                status: "success",
                message: format!("{received} files processed, cleaned, and loaded"),
                combined_file: summary.artifact_path.display().to_string(),
            })
            .into_response()
        }
        Err(error) => AppError(error).into_response(),
    }
}

/// Response body for `POST /query`.
#[derive(Serialize)]
struct QueryResponse {
    answer: String,
}

/// Answer a question over the loaded corpus.
async fn query<S>(
    State(service): State<Arc<S>>,
    body: Result<Json<Value>, JsonRejection>,
) -> Response
where
    S: ProcessingApi,
{
    let question = body.ok().and_then(|Json(value)| {
        value
            .get("query")
            .and_then(Value::as_str)
            .filter(|text| !text.trim().is_empty())
            .map(str::to_string)
    });
    let Some(question) = question else {
        return invalid_request("Query text missing");
    };

    let answer = service.answer_query(&question).await;
    Json(QueryResponse { answer }).into_response()
}

/// Response body for `POST /summarize`.
#[derive(Serialize)]
struct SummaryResponse {
    summary: String,
}

/// Summarize the loaded corpus.
async fn summarize<S>(State(service): State<Arc<S>>) -> Json<SummaryResponse>
where
    S: ProcessingApi,
{
    Json(SummaryResponse {
        summary: service.summarize().await,
    })
}

/// Response body for `GET /chunks`.
#[derive(Serialize)]
struct ChunksResponse {
    chunk_count: usize,
    loaded_at: Option<String>,
    content_hash: Option<String>,
    chunks: Vec<String>,
}

/// Return the loaded chunks in order.
async fn get_chunks<S>(State(service): State<Arc<S>>) -> Json<ChunksResponse>
where
    S: ProcessingApi,
{
    let corpus = service.corpus_snapshot().await;
    Json(ChunksResponse {
        chunk_count: corpus.chunks.len(),
        loaded_at: corpus.loaded_at,
        content_hash: corpus.content_hash,
        chunks: corpus.chunks,
    })
}

/// Return ingestion counters.
async fn get_metrics<S>(State(service): State<Arc<S>>) -> Json<crate::metrics::MetricsSnapshot>
where
    S: ProcessingApi,
{
    Json(service.metrics_snapshot())
}

/// Descriptor for a single command in the discovery catalog.
#[derive(Serialize)]
struct CommandDescriptor {
    name: &'static str,
    method: &'static str,
    path: &'static str,
    description: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    request_example: Option<Value>,
}

/// Response body for `GET /commands`.
#[derive(Serialize)]
struct CommandsResponse {
    commands: Vec<CommandDescriptor>,
}

/// Enumerate supported HTTP commands for discovery/UX in hosts and tools.
async fn get_commands() -> Json<CommandsResponse> {
    Json(CommandsResponse {
        commands: vec![
            CommandDescriptor {
                name: "process_multi",
                method: "POST",
                path: "/process-multi",
                description: "Extract and clean text from base64-encoded files (.txt, .pdf, .docx, .csv, .xls, .xlsx), save the combined text, and load it in chunks for querying.",
                request_example: Some(json!([
                    { "fileName": "notes.txt", "data": "SGVsbG8gd29ybGQ=" }
                ])),
            },
            CommandDescriptor {
                name: "query",
                method: "POST",
                path: "/query",
                description: "Answer a question using the loaded text as context. Response returns { \"answer\": string }.",
                request_example: Some(json!({ "query": "What are the key findings?" })),
            },
            CommandDescriptor {
                name: "summarize",
                method: "POST",
                path: "/summarize",
                description: "Summarize the loaded text in 2-3 lines. Response returns { \"summary\": string }.",
                request_example: None,
            },
            CommandDescriptor {
                name: "chunks",
                method: "GET",
                path: "/chunks",
                description: "Return the loaded chunks with their load time and content hash.",
                request_example: None,
            },
            CommandDescriptor {
                name: "metrics",
                method: "GET",
                path: "/metrics",
                description: "Return ingestion counters useful for observability dashboards.",
                request_example: None,
            },
        ],
    })
}

fn invalid_request(message: &str) -> Response {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response()
}

struct AppError(IngestError);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self.0 {
            IngestError::EmptyCorpus | IngestError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            IngestError::Persist { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            tracing::error!(error = %self.0, "Process request failed");
        }
        (
            status,
            Json(json!({ "status": "error", "message": self.0.to_string() })),
        )
            .into_response()
    }
}
