//! Batch orchestration.
//!
//! Items run concurrently on a `JoinSet`, bounded by a semaphore sized
//! `min(len, max_concurrency)`. One item failing never affects its siblings,
//! and results always come back in submission order.

use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::core::pipeline::{GLOBAL_RUNTIME, OcrPipeline};
use crate::error::DocsiftError;
use crate::plugins::PipelineEvent;
use crate::types::{BatchItem, BatchItemResult, BatchResult, ProcessingOptions};

impl OcrPipeline {
    /// Process many documents with bounded concurrency.
    ///
    /// Every item gets a slot in the returned [`BatchResult`] at its original
    /// index, either a full analysis or the error that stopped it. There is
    /// no batch-level failure and no retry. Dropping the returned future
    /// aborts the items still in flight.
    #[tracing::instrument(
        skip(self, items, options),
        fields(
            batch.size = items.len(),
            batch.max_concurrency = self.config.max_concurrency,
        )
    )]
    pub async fn batch_process(&self, items: Vec<BatchItem>, options: &ProcessingOptions) -> BatchResult {
        let started = Instant::now();
        let total = items.len();
        let permits = total.min(self.config.max_concurrency.max(1)).max(1);
        let semaphore = Arc::new(Semaphore::new(permits));
        let options = Arc::new(options.clone());

        let mut file_names = Vec::with_capacity(total);
        let mut tasks = JoinSet::new();

        for (index, item) in items.into_iter().enumerate() {
            let file_name = item
                .file_name
                .clone()
                .unwrap_or_else(|| format!("document-{}", index));
            file_names.push(file_name.clone());

            let pipeline = self.clone();
            let semaphore = Arc::clone(&semaphore);
            let options = Arc::clone(&options);

            tasks.spawn(async move {
                let outcome = match semaphore.acquire_owned().await {
                    Ok(_permit) => {
                        pipeline
                            .analyze_document(
                                &item.content,
                                &item.mime_type,
                                &options,
                                item.template_hint.as_deref(),
                                file_name,
                            )
                            .await
                    }
                    Err(_) => Err(DocsiftError::Other("Batch semaphore closed".to_string())),
                };
                (index, outcome)
            });
        }

        let mut slots: Vec<Option<BatchItemResult>> = (0..total).map(|_| None).collect();

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, Ok(analysis))) => {
                    slots[index] = Some(BatchItemResult::success(index, analysis));
                }
                Ok((index, Err(e))) => {
                    tracing::warn!(index, file_name = %file_names[index], "Batch item failed: {}", e);
                    slots[index] = Some(BatchItemResult::failure(index, file_names[index].clone(), &e));
                }
                // The slot stays empty and is filled below.
                Err(join_err) => {
                    tracing::error!("Batch task did not complete: {}", join_err);
                }
            }
        }

        let results: Vec<BatchItemResult> = slots
            .into_iter()
            .enumerate()
            .map(|(index, slot)| {
                slot.unwrap_or_else(|| {
                    let error = DocsiftError::Other("Task panicked or was cancelled before completing".to_string());
                    BatchItemResult::failure(index, file_names[index].clone(), &error)
                })
            })
            .collect();

        let batch = BatchResult::from_results(results, started.elapsed().as_secs_f64());

        tracing::info!(
            total,
            succeeded = batch.succeeded,
            failed = batch.failed,
            elapsed_seconds = batch.elapsed_seconds,
            "Batch complete"
        );
        self.emit(PipelineEvent::BatchCompleted {
            total,
            succeeded: batch.succeeded,
            failed: batch.failed,
            elapsed_seconds: batch.elapsed_seconds,
        });

        batch
    }

    /// Synchronous wrapper for [`batch_process`](Self::batch_process).
    ///
    /// Runs on a shared global runtime. Must not be called from inside an
    /// async context.
    pub fn batch_process_sync(&self, items: Vec<BatchItem>, options: &ProcessingOptions) -> BatchResult {
        GLOBAL_RUNTIME.block_on(self.batch_process(items, options))
    }
}
