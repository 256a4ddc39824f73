//! Pipeline orchestration.
//!
//! - **Pipeline** (`pipeline`): `OcrPipeline`, the single-document path
//!   (validation, cache, engine, quality, extraction)
//! - **Batch** (`batch`): bounded-concurrency batch processing on `OcrPipeline`
//! - **MIME** (`mime`): allow-list and payload ceiling checks
//! - **Configuration** (`config`): `PipelineConfig` and its file loaders
//!
//! # Example
//!
//! ```rust,no_run
//! use docsift::core::config::PipelineConfig;
//! use docsift::core::pipeline::OcrPipeline;
//! # use docsift::plugins::RecognitionEngine;
//! # use std::sync::Arc;
//!
//! # async fn example(engine: Arc<dyn RecognitionEngine>) -> docsift::Result<()> {
//! let config = PipelineConfig::discover()?.unwrap_or_default();
//! let pipeline = OcrPipeline::with_config(engine, config)?;
//! let bytes = std::fs::read("invoice.png")?;
//! let analysis = pipeline
//!     .extract_structured_data(&bytes, "image/png", &Default::default(), Some("invoice"))
//!     .await?;
//! println!("{:?}", analysis.structured.field("total_amount"));
//! # Ok(())
//! # }
//! ```

pub mod batch;
pub mod config;
pub mod mime;
pub mod pipeline;

pub use config::{CacheConfig, PipelineConfig};
pub use mime::{validate_mime_type, validate_payload_size};
pub use pipeline::OcrPipeline;
