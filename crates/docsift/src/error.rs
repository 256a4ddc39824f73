//! Error types for docsift.
//!
//! All fallible operations return [`DocsiftError`]. The variants map onto the
//! failure classes of the pipeline:
//!
//! - `UnsupportedFormat` / `PayloadTooLarge` - input validation that runs
//!   before the recognition engine is called
//! - `Recognition` - the external engine failed or timed out
//! - `Cache` - a cache backend failed; the [`CacheStore`](crate::cache::CacheStore)
//!   swallows these and treats them as misses, so callers only see them when
//!   talking to a backend directly
//! - `Validation` - invalid configuration or parameters
//! - `Serialization` - JSON/MessagePack encoding failures
//! - `Io` - file system errors, always bubbled up unchanged
//!
//! Low OCR confidence is never an error; it is reported through
//! [`QualityAssessment::issues`](crate::types::QualityAssessment).
//!
//! # Example
//!
//! ```rust
//! use docsift::{DocsiftError, Result};
//!
//! fn check_language(code: &str) -> Result<()> {
//!     if code.is_empty() {
//!         return Err(DocsiftError::validation("language code must not be empty"));
//!     }
//!     Ok(())
//! }
//!
//! assert!(check_language("").is_err());
//! ```
use thiserror::Error;

/// Result type alias using `DocsiftError`.
pub type Result<T> = std::result::Result<T, DocsiftError>;

/// Main error type for all docsift operations.
#[derive(Debug, Error)]
pub enum DocsiftError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Payload too large: {size} bytes exceeds the {limit} byte limit")]
    PayloadTooLarge { size: usize, limit: usize },

    #[error("Recognition error: {message}")]
    Recognition {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Cache error: {message}")]
    Cache {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Validation error: {message}")]
    Validation {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Serialization error: {message}")]
    Serialization {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for DocsiftError {
    fn from(err: serde_json::Error) -> Self {
        DocsiftError::Serialization {
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}

#[cfg(feature = "disk-cache")]
impl From<rmp_serde::encode::Error> for DocsiftError {
    fn from(err: rmp_serde::encode::Error) -> Self {
        DocsiftError::Serialization {
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}

#[cfg(feature = "disk-cache")]
impl From<rmp_serde::decode::Error> for DocsiftError {
    fn from(err: rmp_serde::decode::Error) -> Self {
        DocsiftError::Serialization {
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}

macro_rules! error_constructor {
    ($name:ident, $variant:ident) => {
        pastey::paste! {
            #[doc = "Create a " $variant " error"]
            pub fn $name<S: Into<String>>(message: S) -> Self {
                Self::$variant {
                    message: message.into(),
                    source: None,
                }
            }

            #[doc = "Create a " $variant " error with source"]
            pub fn [<$name _with_source>]<S: Into<String>, E: std::error::Error + Send + Sync + 'static>(
                message: S,
                source: E,
            ) -> Self {
                Self::$variant {
                    message: message.into(),
                    source: Some(Box::new(source)),
                }
            }
        }
    };
}

impl DocsiftError {
    error_constructor!(recognition, Recognition);
    error_constructor!(cache, Cache);
    error_constructor!(validation, Validation);
    error_constructor!(serialization, Serialization);

    /// Stable snake_case tag for the error class.
    ///
    /// Batch results carry this tag next to the message so callers can branch
    /// on the failure class without parsing display strings.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Io(_) => "io",
            Self::UnsupportedFormat(_) => "unsupported_format",
            Self::PayloadTooLarge { .. } => "payload_too_large",
            Self::Recognition { .. } => "recognition_failure",
            Self::Cache { .. } => "cache_unavailable",
            Self::Validation { .. } => "validation",
            Self::Serialization { .. } => "serialization",
            Self::Other(_) => "other",
        }
    }
}
