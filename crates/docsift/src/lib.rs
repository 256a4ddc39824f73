//! docsift - OCR result processing
//!
//! docsift takes raw text-recognition output for a document and turns it into
//! cached, quality-scored, structurally extracted data. The OCR engine itself
//! is supplied by the caller through the [`RecognitionEngine`] trait.
//!
//! # Quick Start
//!
//! ```rust
//! use async_trait::async_trait;
//! use docsift::{OcrPipeline, RecognitionEngine, Result};
//! use docsift::types::{ProcessingOptions, RecognitionOutput};
//! use std::sync::Arc;
//!
//! struct StubEngine;
//!
//! #[async_trait]
//! impl RecognitionEngine for StubEngine {
//!     fn name(&self) -> &str {
//!         "stub"
//!     }
//!
//!     async fn recognize(&self, _: &[u8], _: &str, _: &ProcessingOptions) -> Result<RecognitionOutput> {
//!         Ok(RecognitionOutput::new("Invoice #INV-2024-001\nTotal: $450.00\nDate: 01/15/2024", 0.94))
//!     }
//! }
//!
//! # fn main() -> Result<()> {
//! let pipeline = OcrPipeline::new(Arc::new(StubEngine));
//! let analysis = pipeline.extract_structured_data_sync(b"...", "image/png", &ProcessingOptions::new(), None)?;
//!
//! let total = analysis.structured.field("total_amount").and_then(|f| f.value.as_amount());
//! assert_eq!(total, Some(450.0));
//! # Ok(())
//! # }
//! ```
//!
//! # Architecture
//!
//! - **Core** (`core`): `OcrPipeline`, batch orchestration, input validation, config loading
//! - **Cache** (`cache`): content-addressed, TTL-bound result cache with memory and disk backends
//! - **Text** (`text`): normalization and heuristic quality assessment
//! - **Extraction** (`extraction`): document classification and table-driven field extraction
//! - **Plugins** (`plugins`): the recognition engine trait and pipeline observers

#![deny(unsafe_code)]

pub mod cache;
pub mod core;
pub mod error;
pub mod extraction;
pub mod plugins;
pub mod text;
pub mod types;

pub use error::{DocsiftError, Result};

pub use types::*;

pub use cache::{CacheBackend, CacheStats, CacheStore, MemoryCacheBackend, compute_content_hash};

#[cfg(feature = "disk-cache")]
pub use cache::DiskCacheBackend;

pub use core::config::{CacheConfig, PipelineConfig};
pub use core::pipeline::OcrPipeline;

pub use extraction::{classify_document, extract_structured};

pub use plugins::{PipelineEvent, PipelineObserver, RecognitionEngine, TracingObserver};

pub use text::{QualityAssessor, QualityThresholds, assess_quality, normalize_text};
