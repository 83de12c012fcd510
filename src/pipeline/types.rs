//! Core data types and error definitions for the summarization pipeline.

use crate::backend::{BackendError, FailureKind};
use thiserror::Error;
use uuid::Uuid;

/// Errors produced while splitting text into segments.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChunkingError {
    /// Caller requested an impossible segment bound.
    #[error("maximum segment length must be greater than zero")]
    InvalidMaxLength,
}

/// Run-level failures of [`crate::pipeline::SummarizationPipeline::run`].
///
/// Per-segment backend failures never appear here unless every segment failed.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Document text was empty or whitespace only.
    #[error("document text is empty")]
    EmptyInput,
    /// Segment bound was rejected by the chunker.
    #[error("invalid segment length: {0}")]
    InvalidSegmentLength(#[from] ChunkingError),
    /// Chunker emitted no segments for a non-empty document.
    #[error("no segments were produced from the document")]
    NoSegmentsProduced,
    /// Every segment failed; `last` is the failure of the highest-indexed segment.
    #[error("all {attempted} segments failed; last error: {last}")]
    AllSegmentsFailed {
        /// Number of segments attempted.
        attempted: usize,
        /// Last observed failure, for diagnostics.
        last: BackendError,
    },
}

impl PipelineError {
    /// Stable identifier for reporting.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::EmptyInput => "empty_input",
            Self::InvalidSegmentLength(_) => "invalid_segment_length",
            Self::NoSegmentsProduced => "no_segments_produced",
            Self::AllSegmentsFailed { .. } => "all_segments_failed",
        }
    }
}

/// A document submitted for summarization.
#[derive(Debug, Clone)]
pub struct Document {
    /// Opaque identifier used in logs and responses.
    pub id: Uuid,
    /// Optional display name, such as an uploaded file name.
    pub name: Option<String>,
    /// Raw extracted text.
    pub text: String,
}

impl Document {
    /// Wrap raw text with a fresh identifier.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: None,
            text: text.into(),
        }
    }

    /// Attach a display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// An ordered slice of document text sent to the backend as one unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    index: usize,
    text: String,
}

impl Segment {
    pub(crate) fn new(index: usize, text: String) -> Self {
        Self { index, text }
    }

    /// Position in emission order, starting at zero.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Segment text, including its sentence terminators.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Length in characters.
    pub fn length(&self) -> usize {
        self.text.chars().count()
    }
}

/// Outcome of summarizing one segment.
#[derive(Debug, Clone)]
pub enum SegmentResult {
    /// Backend produced a summary.
    Succeeded {
        /// Index of the originating segment.
        index: usize,
        /// Generated text exactly as returned.
        summary: String,
    },
    /// Backend call failed.
    Failed {
        /// Index of the originating segment.
        index: usize,
        /// Classified failure.
        error: BackendError,
    },
}

impl SegmentResult {
    /// Index of the originating segment.
    pub fn index(&self) -> usize {
        match self {
            Self::Succeeded { index, .. } | Self::Failed { index, .. } => *index,
        }
    }
}

/// A failed segment as reported to callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentFailure {
    /// Index of the failed segment.
    pub index: usize,
    /// Failure category.
    pub kind: FailureKind,
    /// Human-readable detail.
    pub detail: String,
}

/// Final outcome of a successful (possibly partial) run.
#[derive(Debug, Clone)]
pub struct PipelineResult {
    summary: String,
    attempted: usize,
    succeeded: usize,
    failures: Vec<SegmentFailure>,
}

impl PipelineResult {
    /// Build a result from index-ordered segment results.
    ///
    /// Returns `AllSegmentsFailed` when no result succeeded, so a `PipelineResult` always
    /// carries text from at least one segment.
    pub(crate) fn from_results(results: Vec<SegmentResult>) -> Result<Self, PipelineError> {
        let attempted = results.len();
        let mut summaries = Vec::new();
        let mut failures = Vec::new();
        let mut last_error = None;

        for result in results {
            match result {
                SegmentResult::Succeeded { summary, .. } => summaries.push(summary),
                SegmentResult::Failed { index, error } => {
                    failures.push(SegmentFailure {
                        index,
                        kind: error.kind(),
                        detail: error.to_string(),
                    });
                    last_error = Some(error);
                }
            }
        }

        if summaries.is_empty() {
            return match last_error {
                Some(last) => Err(PipelineError::AllSegmentsFailed { attempted, last }),
                None => Err(PipelineError::NoSegmentsProduced),
            };
        }

        Ok(Self {
            summary: super::aggregate::join(&summaries),
            attempted,
            succeeded: summaries.len(),
            failures,
        })
    }

    /// Joined summary text.
    pub fn summary(&self) -> &str {
        &self.summary
    }

    /// Consume the result, keeping only the summary text.
    pub fn into_summary(self) -> String {
        self.summary
    }

    /// Number of segments sent to the backend.
    pub fn attempted(&self) -> usize {
        self.attempted
    }

    /// Number of segments summarized.
    pub fn succeeded(&self) -> usize {
        self.succeeded
    }

    /// Number of segments that failed.
    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    /// Failed segments in index order.
    pub fn failures(&self) -> &[SegmentFailure] {
        &self.failures
    }

    /// Whether some segments failed.
    pub fn is_partial(&self) -> bool {
        !self.failures.is_empty()
    }
}
