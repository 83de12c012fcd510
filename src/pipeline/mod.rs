//! Summarization pipeline: chunking, per-segment backend calls, and aggregation.

pub mod aggregate;
pub mod chunking;
mod limiter;
mod service;
pub mod types;

pub use service::{SummarizationPipeline, SummarizeApi};
pub use types::{
    ChunkingError, Document, PipelineError, PipelineResult, Segment, SegmentFailure,
    SegmentResult,
};
