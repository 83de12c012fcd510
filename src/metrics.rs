use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters describing summarization activity.
#[derive(Default)]
pub struct PipelineMetrics {
    documents_summarized: AtomicU64,
    documents_failed: AtomicU64,
    segments_attempted: AtomicU64,
    segments_succeeded: AtomicU64,
    segments_failed: AtomicU64,
}

impl PipelineMetrics {
    /// Create an empty metrics accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the segment outcomes of one finished run.
    ///
    /// A run with zero successes counts as a failed document.
    pub fn record_run(&self, succeeded: u64, failed: u64) {
        if succeeded > 0 {
            self.documents_summarized.fetch_add(1, Ordering::Relaxed);
        } else {
            self.documents_failed.fetch_add(1, Ordering::Relaxed);
        }
        self.segments_attempted
            .fetch_add(succeeded + failed, Ordering::Relaxed);
        self.segments_succeeded
            .fetch_add(succeeded, Ordering::Relaxed);
        self.segments_failed.fetch_add(failed, Ordering::Relaxed);
    }

    /// Record a run rejected before any segment was attempted.
    pub fn record_rejected(&self) {
        self.documents_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Return a snapshot of the current counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            documents_summarized: self.documents_summarized.load(Ordering::Relaxed),
            documents_failed: self.documents_failed.load(Ordering::Relaxed),
            segments_attempted: self.segments_attempted.load(Ordering::Relaxed),
            segments_succeeded: self.segments_succeeded.load(Ordering::Relaxed),
            segments_failed: self.segments_failed.load(Ordering::Relaxed),
        }
    }
}

/// Immutable view of summarization counters used for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct MetricsSnapshot {
    /// Documents that produced a summary (fully or partially).
    pub documents_summarized: u64,
    /// Documents rejected or with every segment failing.
    pub documents_failed: u64,
    /// Segments sent to the backend.
    pub segments_attempted: u64,
    /// Segments the backend summarized.
    pub segments_succeeded: u64,
    /// Segments whose backend call failed.
    pub segments_failed: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_runs_and_segments() {
        let metrics = PipelineMetrics::new();
        metrics.record_run(3, 0);
        metrics.record_run(2, 1);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.documents_summarized, 2);
        assert_eq!(snapshot.documents_failed, 0);
        assert_eq!(snapshot.segments_attempted, 6);
        assert_eq!(snapshot.segments_succeeded, 5);
        assert_eq!(snapshot.segments_failed, 1);
    }

    #[test]
    fn total_failure_counts_as_failed_document() {
        let metrics = PipelineMetrics::new();
        metrics.record_run(0, 4);
        metrics.record_rejected();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.documents_summarized, 0);
        assert_eq!(snapshot.documents_failed, 2);
        assert_eq!(snapshot.segments_failed, 4);
    }
}
