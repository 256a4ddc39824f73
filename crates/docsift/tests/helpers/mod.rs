//! Shared test helpers: a scripted recognition engine and log setup.

#![allow(dead_code)]

use async_trait::async_trait;
use docsift::types::{ProcessingOptions, RecognitionOutput};
use docsift::{DocsiftError, RecognitionEngine, Result};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

pub const INVOICE_TEXT: &str = "Invoice #INV-2024-001\nTotal: $450.00\nDate: 01/15/2024";

/// Behaviour for one payload.
#[derive(Debug, Clone)]
pub struct Script {
    pub text: String,
    pub confidence: f64,
    pub delay: Duration,
    pub fail: bool,
}

impl Script {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            confidence: 0.92,
            delay: Duration::ZERO,
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::text("")
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence;
        self
    }
}

/// Engine whose output is scripted per payload.
///
/// Unscripted payloads echo their bytes back as text. Tracks total calls and
/// the highest number of concurrent calls seen.
#[derive(Default)]
pub struct MockEngine {
    scripts: HashMap<Vec<u8>, Script>,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MockEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(mut self, content: impl Into<Vec<u8>>, script: Script) -> Self {
        self.scripts.insert(content.into(), script);
        self
    }

    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

struct InFlightGuard<'a>(&'a AtomicUsize);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl RecognitionEngine for MockEngine {
    fn name(&self) -> &str {
        "mock"
    }

    async fn recognize(&self, content: &[u8], _mime_type: &str, _options: &ProcessingOptions) -> Result<RecognitionOutput> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);
        let _guard = InFlightGuard(&self.in_flight);

        let script = self
            .scripts
            .get(content)
            .cloned()
            .unwrap_or_else(|| Script::text(String::from_utf8_lossy(content)).with_delay(Duration::from_millis(5)));

        if !script.delay.is_zero() {
            tokio::time::sleep(script.delay).await;
        }

        if script.fail {
            return Err(DocsiftError::recognition("scripted engine failure"));
        }

        Ok(RecognitionOutput::new(script.text, script.confidence))
    }
}

/// Install a test subscriber once; honours `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
