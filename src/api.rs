//! HTTP surface for the summarization pipeline.
//!
//! - `POST /summarize` – Summarize raw text. Body: `{ "text", "name"?, "max_segment_length"? }`.
//! - `POST /summarize-pdf` – Summarize a PDF sent as the raw request body. Optional query
//!   parameters `name` and `max_segment_length`.
//! - `GET /metrics` – Document and segment counters.
//! - `GET /commands` – Machine-readable command catalog.
//!
//! Successful responses report how many segments were attempted, summarized, and failed so a
//! client can show an "N of M sections summarized" notice. Failures carry no partial text,
//! only `{ "error": <kind>, "details": <message> }`. Bodies over the upload limit are answered
//! with `document_too_large` (413) and undecodable bodies with `invalid_request` (400).

use crate::backend::FailureKind;
use crate::extract::{ExtractError, PdfExtractor, TextExtractor};
use crate::pipeline::{Document, PipelineError, PipelineResult, SummarizeApi, aggregate};
use axum::{
    Json, Router,
    body::Bytes,
    extract::{
        DefaultBodyLimit, Query, State,
        rejection::{BytesRejection, JsonRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

struct ApiState<S> {
    service: Arc<S>,
    max_upload_bytes: usize,
}

impl<S> Clone for ApiState<S> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
            max_upload_bytes: self.max_upload_bytes,
        }
    }
}

/// Build the HTTP router exposing the summarization surface.
pub fn create_router<S>(service: Arc<S>, max_upload_bytes: usize) -> Router
where
    S: SummarizeApi + 'static,
{
    Router::new()
        .route("/summarize", post(summarize_text::<S>))
        .route("/summarize-pdf", post(summarize_pdf::<S>))
        .route("/metrics", get(get_metrics::<S>))
        .route("/commands", get(get_commands))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .with_state(ApiState {
            service,
            max_upload_bytes,
        })
}

/// Request body for `POST /summarize`.
#[derive(Deserialize)]
struct SummarizeRequest {
    /// Raw document text.
    text: String,
    /// Optional document name used as the summary heading.
    #[serde(default)]
    name: Option<String>,
    /// Optional segment bound (defaults to `MAX_SEGMENT_LENGTH`).
    #[serde(default)]
    max_segment_length: Option<usize>,
}

/// Query parameters for `POST /summarize-pdf`.
#[derive(Deserialize)]
struct PdfQuery {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    max_segment_length: Option<usize>,
}

/// Success response for both summarize endpoints.
#[derive(Serialize)]
struct SummaryResponse {
    document_id: Uuid,
    summary: String,
    segments_attempted: usize,
    segments_succeeded: usize,
    segments_failed: usize,
    failures: Vec<FailureResponse>,
}

#[derive(Serialize)]
struct FailureResponse {
    index: usize,
    kind: FailureKind,
    detail: String,
}

impl SummaryResponse {
    fn new(document_id: Uuid, name: Option<String>, result: PipelineResult) -> Self {
        let failures = result
            .failures()
            .iter()
            .map(|failure| FailureResponse {
                index: failure.index,
                kind: failure.kind,
                detail: failure.detail.clone(),
            })
            .collect();
        let segments_attempted = result.attempted();
        let segments_succeeded = result.succeeded();
        let segments_failed = result.failed();
        let body = result.into_summary();
        let summary = match name {
            Some(name) => aggregate::titled(&name, &body),
            None => body,
        };
        Self {
            document_id,
            summary,
            segments_attempted,
            segments_succeeded,
            segments_failed,
            failures,
        }
    }
}

/// Summarize raw text submitted as JSON.
async fn summarize_text<S>(
    State(state): State<ApiState<S>>,
    request: Result<Json<SummarizeRequest>, JsonRejection>,
) -> Result<Json<SummaryResponse>, AppError>
where
    S: SummarizeApi,
{
    let Json(request) = request.map_err(|rejection| {
        AppError::rejected(rejection.status(), rejection.body_text(), state.max_upload_bytes)
    })?;
    let SummarizeRequest {
        text,
        name,
        max_segment_length,
    } = request;
    let mut document = Document::new(text);
    document.name = name;
    summarize(&*state.service, document, max_segment_length).await
}

/// Extract text from a PDF body and summarize it.
async fn summarize_pdf<S>(
    State(state): State<ApiState<S>>,
    Query(query): Query<PdfQuery>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<SummaryResponse>, AppError>
where
    S: SummarizeApi,
{
    let limit = state.max_upload_bytes;
    let body = body.map_err(|rejection| {
        AppError::rejected(rejection.status(), rejection.body_text(), limit)
    })?;
    let text = tokio::task::spawn_blocking(move || PdfExtractor::new(limit).extract(&body))
        .await
        .map_err(|error| AppError::Internal(format!("extraction task failed: {error}")))??;

    let mut document = Document::new(text);
    document.name = query.name;
    summarize(&*state.service, document, query.max_segment_length).await
}

async fn summarize<S>(
    service: &S,
    document: Document,
    max_segment_length: Option<usize>,
) -> Result<Json<SummaryResponse>, AppError>
where
    S: SummarizeApi + ?Sized,
{
    let document_id = document.id;
    let name = document.name.clone();
    let result = service
        .summarize_document(document, max_segment_length)
        .await?;
    tracing::info!(
        document_id = %document_id,
        attempted = result.attempted(),
        succeeded = result.succeeded(),
        "Summarize request completed"
    );
    Ok(Json(SummaryResponse::new(document_id, name, result)))
}

/// Return the summarization counters.
async fn get_metrics<S>(State(state): State<ApiState<S>>) -> Json<crate::metrics::MetricsSnapshot>
where
    S: SummarizeApi,
{
    Json(state.service.metrics_snapshot())
}

/// Descriptor for a single command in the discovery catalog.
#[derive(Serialize)]
struct CommandDescriptor {
    name: &'static str,
    method: &'static str,
    path: &'static str,
    description: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    request_example: Option<serde_json::Value>,
}

/// Response body for `GET /commands`.
#[derive(Serialize)]
struct CommandsResponse {
    commands: Vec<CommandDescriptor>,
}

/// Enumerate supported HTTP commands for discovery.
async fn get_commands() -> Json<CommandsResponse> {
    Json(CommandsResponse {
        commands: vec![
            CommandDescriptor {
                name: "summarize",
                method: "POST",
                path: "/summarize",
                description: "Split text into sentence-bounded segments, summarize each one, and return the joined summary with segment counts.",
                request_example: Some(json!({
                    "text": "Document contents. More sentences.",
                    "name": "optional-title",
                    "max_segment_length": 4000
                })),
            },
            CommandDescriptor {
                name: "summarize_pdf",
                method: "POST",
                path: "/summarize-pdf",
                description: "Extract text from a PDF request body and summarize it. Query parameters: name, max_segment_length.",
                request_example: None,
            },
            CommandDescriptor {
                name: "metrics",
                method: "GET",
                path: "/metrics",
                description: "Return document and segment counters.",
                request_example: None,
            },
        ],
    })
}

enum AppError {
    Pipeline(PipelineError),
    Extract(ExtractError),
    /// Body larger than the upload limit, rejected before extraction.
    BodyTooLarge { limit: usize },
    /// Body the extractors could not buffer or decode.
    InvalidRequest(String),
    Internal(String),
}

impl AppError {
    /// Map an axum extractor rejection onto the JSON failure shape.
    fn rejected(status: StatusCode, details: String, limit: usize) -> Self {
        if status == StatusCode::PAYLOAD_TOO_LARGE {
            Self::BodyTooLarge { limit }
        } else {
            Self::InvalidRequest(details)
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, kind, details) = match self {
            Self::Pipeline(error) => {
                let status = match &error {
                    PipelineError::EmptyInput | PipelineError::InvalidSegmentLength(_) => {
                        StatusCode::BAD_REQUEST
                    }
                    PipelineError::NoSegmentsProduced => StatusCode::UNPROCESSABLE_ENTITY,
                    PipelineError::AllSegmentsFailed { .. } => StatusCode::BAD_GATEWAY,
                };
                (status, error.kind(), error.to_string())
            }
            Self::Extract(error) => match &error {
                ExtractError::DocumentTooLarge { .. } => (
                    StatusCode::PAYLOAD_TOO_LARGE,
                    "document_too_large",
                    error.to_string(),
                ),
                ExtractError::UnreadableDocument(_) => (
                    StatusCode::BAD_REQUEST,
                    "unreadable_document",
                    error.to_string(),
                ),
            },
            Self::BodyTooLarge { limit } => (
                StatusCode::PAYLOAD_TOO_LARGE,
                "document_too_large",
                format!("Request body exceeds the {limit} byte limit"),
            ),
            Self::InvalidRequest(details) => (StatusCode::BAD_REQUEST, "invalid_request", details),
            Self::Internal(message) => (StatusCode::INTERNAL_SERVER_ERROR, "internal", message),
        };
        tracing::warn!(status = status.as_u16(), kind, details = %details, "Request failed");
        (status, Json(json!({ "error": kind, "details": details }))).into_response()
    }
}

impl From<PipelineError> for AppError {
    fn from(inner: PipelineError) -> Self {
        Self::Pipeline(inner)
    }
}

impl From<ExtractError> for AppError {
    fn from(inner: ExtractError) -> Self {
        Self::Extract(inner)
    }
}
