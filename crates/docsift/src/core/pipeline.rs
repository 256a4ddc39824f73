//! Single-document pipeline.
//!
//! `OcrPipeline` ties the pieces together: input validation, cache lookup,
//! the recognition engine on a miss, normalization, cache write, quality
//! assessment and field extraction.

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Instant;

use crate::cache::{CacheStats, CacheStore, compute_content_hash};
use crate::core::config::PipelineConfig;
use crate::core::mime::{validate_mime_type, validate_payload_size};
use crate::error::{DocsiftError, Result};
use crate::extraction::extract_structured;
use crate::plugins::{PipelineEvent, PipelineObserver, RecognitionEngine};
use crate::text::QualityAssessor;
use crate::types::{DocumentAnalysis, OcrResult, ProcessingOptions};

/// File name used for single documents submitted without one.
pub const DEFAULT_FILE_NAME: &str = "document";

/// Global Tokio runtime for the synchronous wrappers.
///
/// Built once and reused; creating a runtime per call is far more expensive
/// than the work most calls do. Failing to build it means the process cannot
/// run async work at all, so it panics.
pub(crate) static GLOBAL_RUNTIME: Lazy<tokio::runtime::Runtime> = Lazy::new(|| {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("Failed to create global Tokio runtime - system may be out of resources")
});

#[derive(Clone)]
pub struct OcrPipeline {
    pub(crate) engine: Arc<dyn RecognitionEngine>,
    pub(crate) cache: Arc<CacheStore>,
    pub(crate) config: Arc<PipelineConfig>,
    quality: Arc<QualityAssessor>,
    observers: Arc<RwLock<Vec<Arc<dyn PipelineObserver>>>>,
}

impl std::fmt::Debug for OcrPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OcrPipeline")
            .field("engine", &self.engine.name())
            .field("cache", &self.cache)
            .field("config", &self.config)
            .field("observers", &self.observers.read().len())
            .finish()
    }
}

impl OcrPipeline {
    /// Pipeline with default configuration and an in-memory cache.
    pub fn new(engine: Arc<dyn RecognitionEngine>) -> Self {
        Self::from_parts(engine, PipelineConfig::default(), Arc::new(CacheStore::in_memory()))
    }

    /// # Errors
    ///
    /// Returns `DocsiftError::Validation` for an invalid configuration, or a
    /// cache error if the configured cache directory can't be created.
    pub fn with_config(engine: Arc<dyn RecognitionEngine>, config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        let cache = Arc::new(CacheStore::from_config(&config.cache)?);
        Ok(Self::from_parts(engine, config, cache))
    }

    fn from_parts(engine: Arc<dyn RecognitionEngine>, config: PipelineConfig, cache: Arc<CacheStore>) -> Self {
        Self {
            engine,
            cache,
            config: Arc::new(config),
            quality: Arc::new(QualityAssessor::default()),
            observers: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Share a cache store between pipelines.
    pub fn with_cache_store(mut self, cache: Arc<CacheStore>) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_quality_assessor(mut self, assessor: QualityAssessor) -> Self {
        self.quality = Arc::new(assessor);
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn cache(&self) -> &Arc<CacheStore> {
        &self.cache
    }

    pub fn engine_name(&self) -> &str {
        self.engine.name()
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Register an observer. It receives events from every clone of this pipeline.
    pub fn add_observer(&self, observer: Arc<dyn PipelineObserver>) {
        self.observers.write().push(observer);
    }

    pub(crate) fn emit(&self, event: PipelineEvent) {
        // Observers may register more observers, so dispatch without the lock.
        let observers: Vec<Arc<dyn PipelineObserver>> = self.observers.read().clone();
        for observer in &observers {
            observer.on_event(&event);
        }
    }

    /// Recognize a document, going through the cache.
    ///
    /// # Errors
    ///
    /// - `UnsupportedFormat` if the MIME type is not accepted
    /// - `PayloadTooLarge` if `content` exceeds `max_payload_bytes`
    /// - `Recognition` if the engine fails
    #[tracing::instrument(
        skip(self, content, options),
        fields(
            ocr.mime_type = mime_type,
            ocr.size_bytes = content.len(),
        )
    )]
    pub async fn extract_text(&self, content: &[u8], mime_type: &str, options: &ProcessingOptions) -> Result<OcrResult> {
        let (_, result, _) = self.recognize(content, mime_type, options).await?;
        Ok(result)
    }

    /// Recognize a document, then assess its quality and extract fields.
    ///
    /// `template_hint` forces the document type (`invoice`, `receipt`,
    /// `form` or `generic`); unknown hints are ignored.
    #[tracing::instrument(
        skip(self, content, options),
        fields(
            ocr.mime_type = mime_type,
            ocr.size_bytes = content.len(),
        )
    )]
    pub async fn extract_structured_data(
        &self,
        content: &[u8],
        mime_type: &str,
        options: &ProcessingOptions,
        template_hint: Option<&str>,
    ) -> Result<DocumentAnalysis> {
        self.analyze_document(content, mime_type, options, template_hint, DEFAULT_FILE_NAME.to_string())
            .await
    }

    pub(crate) async fn analyze_document(
        &self,
        content: &[u8],
        mime_type: &str,
        options: &ProcessingOptions,
        template_hint: Option<&str>,
        file_name: String,
    ) -> Result<DocumentAnalysis> {
        let (file_hash, ocr, from_cache) = self.recognize(content, mime_type, options).await?;
        let quality = self.quality.assess(&ocr);
        let structured = extract_structured(&ocr, template_hint);

        Ok(DocumentAnalysis {
            file_name,
            file_hash,
            from_cache,
            ocr,
            quality,
            structured,
        })
    }

    /// Returns the content hash, the result, and whether it came from the cache.
    async fn recognize(
        &self,
        content: &[u8],
        mime_type: &str,
        options: &ProcessingOptions,
    ) -> Result<(String, OcrResult, bool)> {
        let mime_type = validate_mime_type(mime_type)?;
        validate_payload_size(content.len(), self.config.max_payload_bytes)?;

        let file_hash = compute_content_hash(content);
        let cache_enabled = self.config.cache.enabled;

        if cache_enabled {
            if let Some(cached) = self.cache.get(&file_hash, options) {
                self.emit(PipelineEvent::CacheHit {
                    file_hash: file_hash.clone(),
                });
                return Ok((file_hash, cached, true));
            }
            self.emit(PipelineEvent::CacheMiss {
                file_hash: file_hash.clone(),
            });
        }

        let engine = self.engine.name().to_string();
        self.emit(PipelineEvent::RecognitionStarted {
            file_hash: file_hash.clone(),
            engine: engine.clone(),
            mime_type: mime_type.clone(),
            size_bytes: content.len(),
        });

        let started = Instant::now();
        let mut output = match self.engine.recognize(content, &mime_type, options).await {
            Ok(output) => output,
            Err(e) => {
                self.emit(PipelineEvent::RecognitionFailed {
                    file_hash: file_hash.clone(),
                    engine: engine.clone(),
                    error_kind: e.kind().to_string(),
                });
                return Err(match e {
                    recognition @ DocsiftError::Recognition { .. } => recognition,
                    other => DocsiftError::recognition_with_source(format!("Engine '{}' failed", engine), other),
                });
            }
        };
        let elapsed_seconds = started.elapsed().as_secs_f64();

        if output.processing_time_seconds <= 0.0 {
            output.processing_time_seconds = elapsed_seconds;
        }
        let result = OcrResult::from_recognition(output);

        if cache_enabled {
            self.cache.put(&file_hash, options, &result, self.config.cache.ttl());
        }

        self.emit(PipelineEvent::RecognitionCompleted {
            file_hash: file_hash.clone(),
            engine,
            elapsed_seconds,
            confidence: result.confidence,
        });

        Ok((file_hash, result, false))
    }

    /// Synchronous wrapper for [`extract_text`](Self::extract_text).
    ///
    /// Runs on a shared global runtime. Must not be called from inside an
    /// async context.
    pub fn extract_text_sync(&self, content: &[u8], mime_type: &str, options: &ProcessingOptions) -> Result<OcrResult> {
        GLOBAL_RUNTIME.block_on(self.extract_text(content, mime_type, options))
    }

    /// Synchronous wrapper for [`extract_structured_data`](Self::extract_structured_data).
    pub fn extract_structured_data_sync(
        &self,
        content: &[u8],
        mime_type: &str,
        options: &ProcessingOptions,
        template_hint: Option<&str>,
    ) -> Result<DocumentAnalysis> {
        GLOBAL_RUNTIME.block_on(self.extract_structured_data(content, mime_type, options, template_hint))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DocumentType, RecognitionOutput};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingEngine {
        text: &'static str,
        calls: AtomicUsize,
    }

    impl CountingEngine {
        fn new(text: &'static str) -> Arc<Self> {
            Arc::new(Self {
                text,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl RecognitionEngine for CountingEngine {
        fn name(&self) -> &str {
            "counting"
        }

        async fn recognize(&self, _content: &[u8], _mime: &str, _options: &ProcessingOptions) -> Result<RecognitionOutput> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(RecognitionOutput::new(self.text, 0.92))
        }
    }

    struct BrokenEngine;

    #[async_trait]
    impl RecognitionEngine for BrokenEngine {
        fn name(&self) -> &str {
            "broken"
        }

        async fn recognize(&self, _content: &[u8], _mime: &str, _options: &ProcessingOptions) -> Result<RecognitionOutput> {
            Err(DocsiftError::Other("device unplugged".to_string()))
        }
    }

    #[derive(Default)]
    struct RecordingObserver {
        events: parking_lot::Mutex<Vec<&'static str>>,
    }

    impl PipelineObserver for RecordingObserver {
        fn on_event(&self, event: &PipelineEvent) {
            self.events.lock().push(event.name());
        }
    }

    /// Registers a follow-up observer the first time it sees an event.
    struct ChainingObserver {
        pipeline: parking_lot::Mutex<Option<OcrPipeline>>,
        follower: Arc<RecordingObserver>,
    }

    impl PipelineObserver for ChainingObserver {
        fn on_event(&self, _event: &PipelineEvent) {
            if let Some(pipeline) = self.pipeline.lock().take() {
                pipeline.add_observer(self.follower.clone());
            }
        }
    }

    #[tokio::test]
    async fn test_observer_can_register_observer_during_dispatch() {
        let pipeline = OcrPipeline::new(CountingEngine::new("hello world"));
        let follower = Arc::new(RecordingObserver::default());
        pipeline.add_observer(Arc::new(ChainingObserver {
            pipeline: parking_lot::Mutex::new(Some(pipeline.clone())),
            follower: follower.clone(),
        }));

        pipeline
            .extract_text(b"page", "image/png", &ProcessingOptions::new())
            .await
            .unwrap();

        assert_eq!(
            *follower.events.lock(),
            vec!["recognition_started", "recognition_completed"]
        );
    }

    #[tokio::test]
    async fn test_second_call_hits_cache() {
        let engine = CountingEngine::new("Invoice #INV-1\nTotal: $10.00");
        let pipeline = OcrPipeline::new(engine.clone());
        let options = ProcessingOptions::new();

        let first = pipeline
            .extract_structured_data(b"page", "image/png", &options, None)
            .await
            .unwrap();
        let second = pipeline
            .extract_structured_data(b"page", "image/png", &options, None)
            .await
            .unwrap();

        assert!(!first.from_cache);
        assert!(second.from_cache);
        assert_eq!(first.ocr, second.ocr);
        assert_eq!(first.structured.document_type, DocumentType::Invoice);
        assert_eq!(engine.calls.load(Ordering::SeqCst), 1);
        assert_eq!(pipeline.cache_stats().hits, 1);
    }

    #[tokio::test]
    async fn test_cache_disabled_always_calls_engine() {
        let engine = CountingEngine::new("hello world");
        let mut config = PipelineConfig::default();
        config.cache.enabled = false;
        let pipeline = OcrPipeline::with_config(engine.clone(), config).unwrap();
        let options = ProcessingOptions::new();

        pipeline.extract_text(b"page", "image/png", &options).await.unwrap();
        pipeline.extract_text(b"page", "image/png", &options).await.unwrap();

        assert_eq!(engine.calls.load(Ordering::SeqCst), 2);
        assert_eq!(pipeline.cache_stats().writes, 0);
    }

    #[tokio::test]
    async fn test_validation_runs_before_engine() {
        let engine = CountingEngine::new("unused");
        let config = PipelineConfig {
            max_payload_bytes: 4,
            ..Default::default()
        };
        let pipeline = OcrPipeline::with_config(engine.clone(), config).unwrap();
        let options = ProcessingOptions::new();

        let err = pipeline.extract_text(b"page", "text/plain", &options).await.unwrap_err();
        assert!(matches!(err, DocsiftError::UnsupportedFormat(_)));

        let err = pipeline.extract_text(b"too long", "image/png", &options).await.unwrap_err();
        assert!(matches!(err, DocsiftError::PayloadTooLarge { size: 8, limit: 4 }));

        assert_eq!(engine.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_engine_errors_become_recognition_errors() {
        let pipeline = OcrPipeline::new(Arc::new(BrokenEngine));
        let observer = Arc::new(RecordingObserver::default());
        pipeline.add_observer(observer.clone());

        let err = pipeline
            .extract_text(b"page", "image/png", &ProcessingOptions::new())
            .await
            .unwrap_err();

        assert_eq!(err.kind(), "recognition_failure");
        assert_eq!(
            *observer.events.lock(),
            vec!["cache_miss", "recognition_started", "recognition_failed"]
        );
        assert_eq!(pipeline.cache_stats().entries, 0);
    }

    #[test]
    fn test_sync_wrapper() {
        let pipeline = OcrPipeline::new(CountingEngine::new("Receipt\nTotal: $3.50"));
        let analysis = pipeline
            .extract_structured_data_sync(b"page", "image/jpeg", &ProcessingOptions::new(), Some("receipt"))
            .unwrap();

        assert_eq!(analysis.file_name, DEFAULT_FILE_NAME);
        assert_eq!(analysis.structured.document_type, DocumentType::Receipt);
        assert_eq!(analysis.structured.field("total").unwrap().value.as_amount(), Some(3.5));
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = PipelineConfig {
            max_concurrency: 0,
            ..Default::default()
        };
        assert!(OcrPipeline::with_config(CountingEngine::new(""), config).is_err());
    }
}
