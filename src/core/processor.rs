use serde::Serialize;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, RwLock};
use std::time::Instant;
use crate::core::queue::FileQueue;
use crate::core::transform::{output_file_name, MediaTransform};
use crate::models::{CompressedOutput, FileId, FileStatus, OutputProfile, SqueezeError};
use crate::utils::format::format_size;
use crate::utils::progress::ProgressEmitter;

/// Output settings shared with whoever drives the UI; read once per file
pub type SettingsHandle<S> = Arc<RwLock<S>>;

/// Counts reported when a batch has run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchSummary {
    pub completed: usize,
    pub failed: usize,
    pub total: usize,
    pub elapsed_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOutcome {
    /// Engine not ready; nothing was touched
    EngineUnavailable,
    /// No file was `Pending`
    NothingPending,
    Finished(BatchSummary),
}

// Transient state of a running batch, dropped when the run ends
struct BatchProgress {
    total: usize,
    settled: usize,
    completed: usize,
    started_at: Instant,
}

/// Sequential batch runner
///
/// Processes every file that is `Pending` when `run` is called, in queue
/// order, one at a time: file k+1 is not handed to the transform until
/// file k is `Completed` or `Error`. A failing file does not stop the batch.
pub struct BatchProcessor<'a, T: MediaTransform> {
    transform: &'a T,
    settings: &'a RwLock<T::Settings>,
    emitter: &'a ProgressEmitter,
}

impl<'a, T: MediaTransform> BatchProcessor<'a, T> {
    pub fn new(
        transform: &'a T,
        settings: &'a RwLock<T::Settings>,
        emitter: &'a ProgressEmitter,
    ) -> Self {
        Self {
            transform,
            settings,
            emitter,
        }
    }

    pub fn run(&self, queue: &mut FileQueue) -> BatchOutcome {
        // Checked once up front; an unavailable engine makes the whole call inert
        if !self.transform.is_ready() {
            tracing::warn!(kind = %self.transform.kind(), "engine not ready, batch skipped");
            return BatchOutcome::EngineUnavailable;
        }

        let batch = queue.pending_ids();
        if batch.is_empty() {
            return BatchOutcome::NothingPending;
        }

        let mut progress = BatchProgress {
            total: batch.len(),
            settled: 0,
            completed: 0,
            started_at: Instant::now(),
        };
        self.emitter.emit_started(progress.total);

        for (index, id) in batch.iter().enumerate() {
            let Some(source) = queue.get(id).map(|f| f.source().clone()) else {
                continue;
            };

            queue.set_status(id, FileStatus::Processing);
            self.emitter.emit_file_started(index + 1, progress.total, id, source.name());

            // Snapshot at invocation time so mid-batch changes reach later files
            let settings = self.settings.read().unwrap_or_else(|e| e.into_inner()).clone();

            let attempt = AssertUnwindSafe(|| self.transform.transform(&source, &settings));
            let result = catch_unwind(attempt).unwrap_or_else(|_| Err(SqueezeError::Transcode(
                format!("Transform panicked on {}", source.name())
            )));

            let (status, message) = match result {
                Ok(bytes) => {
                    let message = format!(
                        "Compressed {} ({} -> {})",
                        source.name(),
                        format_size(source.size()),
                        format_size(bytes.len() as u64)
                    );
                    let output = CompressedOutput::new(
                        bytes,
                        settings.content_type(),
                        output_file_name(source.name(), &settings),
                    );
                    (FileStatus::Completed(output), message)
                }
                Err(err) => {
                    let message = format!("Failed to compress {}: {}", source.name(), err);
                    (FileStatus::Error(err.into()), message)
                }
            };

            let succeeded = matches!(status, FileStatus::Completed(_));
            queue.set_status(id, status);
            self.settle(&mut progress, id, succeeded, message);
        }

        let summary = BatchSummary {
            completed: progress.completed,
            failed: progress.settled - progress.completed,
            total: progress.total,
            elapsed_ms: progress.started_at.elapsed().as_millis() as u64,
        };
        self.emitter.emit_finished(summary.completed, summary.total, summary.elapsed_ms);

        BatchOutcome::Finished(summary)
    }

    fn settle(&self, progress: &mut BatchProgress, id: &FileId, succeeded: bool, message: String) {
        progress.settled += 1;
        if succeeded {
            progress.completed += 1;
        }
        self.emitter.emit_file_settled(progress.settled, progress.total, id, succeeded, message);
    }
}
