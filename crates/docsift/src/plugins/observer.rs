//! Pipeline events.
//!
//! The pipeline reports what it does through a closed set of
//! [`PipelineEvent`]s. Observers registered on an
//! [`OcrPipeline`](crate::OcrPipeline) receive every event synchronously, on
//! the task that produced it, so implementations should return quickly.

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum PipelineEvent {
    CacheHit {
        file_hash: String,
    },
    CacheMiss {
        file_hash: String,
    },
    RecognitionStarted {
        file_hash: String,
        engine: String,
        mime_type: String,
        size_bytes: usize,
    },
    RecognitionCompleted {
        file_hash: String,
        engine: String,
        elapsed_seconds: f64,
        confidence: f64,
    },
    RecognitionFailed {
        file_hash: String,
        engine: String,
        error_kind: String,
    },
    BatchCompleted {
        total: usize,
        succeeded: usize,
        failed: usize,
        elapsed_seconds: f64,
    },
}

impl PipelineEvent {
    pub fn name(&self) -> &'static str {
        match self {
            PipelineEvent::CacheHit { .. } => "cache_hit",
            PipelineEvent::CacheMiss { .. } => "cache_miss",
            PipelineEvent::RecognitionStarted { .. } => "recognition_started",
            PipelineEvent::RecognitionCompleted { .. } => "recognition_completed",
            PipelineEvent::RecognitionFailed { .. } => "recognition_failed",
            PipelineEvent::BatchCompleted { .. } => "batch_completed",
        }
    }
}

pub trait PipelineObserver: Send + Sync {
    fn on_event(&self, event: &PipelineEvent);
}

/// Forwards every event to `tracing` under the `docsift::events` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl PipelineObserver for TracingObserver {
    fn on_event(&self, event: &PipelineEvent) {
        match event {
            PipelineEvent::RecognitionFailed {
                file_hash,
                engine,
                error_kind,
            } => {
                tracing::warn!(target: "docsift::events", file_hash = %file_hash, engine = %engine, error_kind = %error_kind, "recognition_failed");
            }
            PipelineEvent::BatchCompleted {
                total,
                succeeded,
                failed,
                elapsed_seconds,
            } => {
                tracing::info!(
                    target: "docsift::events",
                    total,
                    succeeded,
                    failed,
                    elapsed_seconds,
                    "batch_completed"
                );
            }
            other => {
                tracing::debug!(target: "docsift::events", event = ?other, "{}", other.name());
            }
        }
    }
}
