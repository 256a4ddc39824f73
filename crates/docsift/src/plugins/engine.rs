//! Recognition engine trait.
//!
//! The pipeline does not do OCR itself. It drives an implementation of
//! [`RecognitionEngine`] and post-processes whatever text comes back.

use async_trait::async_trait;

use crate::Result;
use crate::types::{ProcessingOptions, RecognitionOutput};

/// Trait for OCR engines.
///
/// Engines are shared across concurrent batch tasks, so they must be
/// `Send + Sync`. Failures should be reported as
/// [`DocsiftError::Recognition`](crate::DocsiftError::Recognition).
///
/// # Example
///
/// ```rust
/// use async_trait::async_trait;
/// use docsift::plugins::RecognitionEngine;
/// use docsift::types::{ProcessingOptions, RecognitionOutput};
/// use docsift::Result;
///
/// struct FixedTextEngine;
///
/// #[async_trait]
/// impl RecognitionEngine for FixedTextEngine {
///     fn name(&self) -> &str {
///         "fixed-text"
///     }
///
///     async fn recognize(
///         &self,
///         _content: &[u8],
///         _mime_type: &str,
///         _options: &ProcessingOptions,
///     ) -> Result<RecognitionOutput> {
///         Ok(RecognitionOutput::new("Invoice #42", 0.93))
///     }
/// }
/// ```
#[async_trait]
pub trait RecognitionEngine: Send + Sync {
    /// Engine identifier, used in logs and events.
    fn name(&self) -> &str;

    /// Recognize text in a validated document payload.
    ///
    /// `mime_type` is already normalized to one of the supported types.
    async fn recognize(&self, content: &[u8], mime_type: &str, options: &ProcessingOptions) -> Result<RecognitionOutput>;
}
