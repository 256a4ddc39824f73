//! Extension points: the recognition engine the pipeline drives and the
//! observers it reports to.

pub mod engine;
pub mod observer;

pub use engine::RecognitionEngine;
pub use observer::{PipelineEvent, PipelineObserver, TracingObserver};
