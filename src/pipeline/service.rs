//! Pipeline orchestrator coordinating chunking, backend calls, and aggregation.

use crate::{
    backend::{SummarizationClient, build_summarization_client},
    config::{Config, PipelineConfig},
    metrics::{MetricsSnapshot, PipelineMetrics},
    pipeline::{
        chunking::chunk,
        limiter::RateLimiter,
        types::{Document, PipelineError, PipelineResult, Segment, SegmentResult},
    },
};
use async_trait::async_trait;
use futures_util::stream::{self, StreamExt};
use std::sync::Arc;

/// Drives one document at a time through chunking, per-segment summarization, and joining.
///
/// A segment failure is recorded and the run moves on; only an empty document, a rejected
/// segment bound, or a run in which every segment failed is reported as an error. Segments
/// are processed sequentially unless `max_in_flight > 1`, in which case calls overlap but
/// results are still merged in segment order.
///
/// The pipeline holds no per-run state, so one instance can serve concurrent callers.
pub struct SummarizationPipeline {
    client: Box<dyn SummarizationClient>,
    config: PipelineConfig,
    limiter: Option<RateLimiter>,
    metrics: Arc<PipelineMetrics>,
}

/// Abstraction over the pipeline used by external surfaces (HTTP, CLI).
#[async_trait]
pub trait SummarizeApi: Send + Sync {
    /// Summarize a document, falling back to the configured segment length when none is given.
    async fn summarize_document(
        &self,
        document: Document,
        max_segment_length: Option<usize>,
    ) -> Result<PipelineResult, PipelineError>;

    /// Retrieve the current metrics snapshot for diagnostics.
    fn metrics_snapshot(&self) -> MetricsSnapshot;
}

impl SummarizationPipeline {
    /// Build a pipeline around an existing client.
    pub fn new(client: Box<dyn SummarizationClient>, config: PipelineConfig) -> Self {
        let max_in_flight = config.max_in_flight.max(1);
        let limiter = config.requests_per_minute.map(|requests_per_minute| {
            RateLimiter::per_minute(
                requests_per_minute,
                u32::try_from(max_in_flight).unwrap_or(u32::MAX),
            )
        });
        Self {
            client,
            config: PipelineConfig {
                max_in_flight,
                ..config
            },
            limiter,
            metrics: Arc::new(PipelineMetrics::new()),
        }
    }

    /// Build a pipeline with the HTTP backend client described by `config`.
    pub fn from_config(config: &Config) -> Result<Self, reqwest::Error> {
        tracing::info!(endpoint = %config.backend.endpoint, "Initializing summarization client");
        let client = build_summarization_client(config.backend.clone())?;
        Ok(Self::new(client, config.pipeline))
    }

    /// Segment length applied when a caller does not choose one.
    pub fn default_max_segment_length(&self) -> usize {
        self.config.default_max_segment_length
    }

    /// Summarize `document` using segments shorter than `max_segment_length` characters.
    pub async fn run(
        &self,
        document: &Document,
        max_segment_length: usize,
    ) -> Result<PipelineResult, PipelineError> {
        if document.text.trim().is_empty() {
            tracing::warn!(document_id = %document.id, "Rejecting empty document");
            self.metrics.record_rejected();
            return Err(PipelineError::EmptyInput);
        }

        let segments = match chunk(&document.text, max_segment_length) {
            Ok(segments) => segments,
            Err(error) => {
                self.metrics.record_rejected();
                return Err(error.into());
            }
        };
        if segments.is_empty() {
            self.metrics.record_rejected();
            return Err(PipelineError::NoSegmentsProduced);
        }

        tracing::info!(
            document_id = %document.id,
            name = ?document.name,
            segments = segments.len(),
            max_segment_length,
            max_in_flight = self.config.max_in_flight,
            "Summarizing document"
        );

        let results = if self.config.max_in_flight == 1 {
            self.run_sequential(&segments).await
        } else {
            self.run_concurrent(&segments).await
        };

        let failed = results
            .iter()
            .filter(|result| matches!(result, SegmentResult::Failed { .. }))
            .count();
        let succeeded = results.len() - failed;
        self.metrics.record_run(succeeded as u64, failed as u64);

        let outcome = PipelineResult::from_results(results);
        match &outcome {
            Ok(result) => tracing::info!(
                document_id = %document.id,
                attempted = result.attempted(),
                succeeded = result.succeeded(),
                failed = result.failed(),
                "Document summarized"
            ),
            Err(error) => tracing::error!(
                document_id = %document.id,
                error = %error,
                "Document summarization failed"
            ),
        }
        outcome
    }

    async fn run_sequential(&self, segments: &[Segment]) -> Vec<SegmentResult> {
        let mut results = Vec::with_capacity(segments.len());
        for segment in segments {
            results.push(self.summarize_segment(segment).await);
        }
        results
    }

    async fn run_concurrent(&self, segments: &[Segment]) -> Vec<SegmentResult> {
        // Build the futures before streaming them so `run` stays `Send`.
        let pending: Vec<_> = segments
            .iter()
            .map(|segment| self.summarize_segment(segment))
            .collect();
        let mut results: Vec<SegmentResult> = stream::iter(pending)
            .buffer_unordered(self.config.max_in_flight)
            .collect()
            .await;
        results.sort_by_key(SegmentResult::index);
        results
    }

    async fn summarize_segment(&self, segment: &Segment) -> SegmentResult {
        if let Some(limiter) = &self.limiter {
            limiter.acquire().await;
        }

        let index = segment.index();
        match self.client.summarize(segment.text()).await {
            Ok(summary) => {
                tracing::debug!(index, length = segment.length(), "Segment summarized");
                SegmentResult::Succeeded { index, summary }
            }
            Err(error) => {
                tracing::warn!(
                    index,
                    kind = ?error.kind(),
                    error = %error,
                    "Segment failed; continuing with remaining segments"
                );
                SegmentResult::Failed { index, error }
            }
        }
    }

    /// Return the current summarization metrics snapshot.
    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }
}

#[async_trait]
impl SummarizeApi for SummarizationPipeline {
    async fn summarize_document(
        &self,
        document: Document,
        max_segment_length: Option<usize>,
    ) -> Result<PipelineResult, PipelineError> {
        let max_segment_length = max_segment_length.unwrap_or(self.config.default_max_segment_length);
        self.run(&document, max_segment_length).await
    }

    fn metrics_snapshot(&self) -> MetricsSnapshot {
        SummarizationPipeline::metrics_snapshot(self)
    }
}
