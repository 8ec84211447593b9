use serde::Serialize;
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex};
use crate::models::FileId;

/// Notifications emitted while a batch runs
#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum BatchEvent {
    /// Emitted once before the first file starts
    #[serde(rename_all = "camelCase")]
    Started { total_files: usize },

    /// A file moved to `processing` (1-based `current_file`)
    #[serde(rename_all = "camelCase")]
    FileStarted {
        current_file: usize,
        total_files: usize,
        file_id: FileId,
        filename: String,
    },

    /// A file reached `completed` or `error`
    #[serde(rename_all = "camelCase")]
    FileSettled {
        settled_files: usize,
        total_files: usize,
        file_id: FileId,
        succeeded: bool,
        /// Percent of the batch settled so far (0 - 100)
        progress: f32,
        message: String,
    },

    #[serde(rename_all = "camelCase")]
    Finished {
        completed: usize,
        total_files: usize,
        elapsed_ms: u64,
    },
}

/// Receives batch notifications; implementations must not block for long
pub trait ProgressListener: Send + Sync {
    fn on_event(&self, event: &BatchEvent);
}

/// Forwards every event into an mpsc channel
pub struct ChannelListener {
    sender: Mutex<Sender<BatchEvent>>,
}

impl ChannelListener {
    pub fn new(sender: Sender<BatchEvent>) -> Self {
        Self {
            sender: Mutex::new(sender),
        }
    }
}

impl ProgressListener for ChannelListener {
    fn on_event(&self, event: &BatchEvent) {
        let sender = self.sender.lock().unwrap_or_else(|e| e.into_inner());
        // A dropped receiver just means nobody is watching anymore
        let _ = sender.send(event.clone());
    }
}

/// Fans batch notifications out to an optional listener and the log
#[derive(Clone, Default)]
pub struct ProgressEmitter {
    listener: Option<Arc<dyn ProgressListener>>,
}

impl ProgressEmitter {
    pub fn new(listener: Arc<dyn ProgressListener>) -> Self {
        Self {
            listener: Some(listener),
        }
    }

    /// Emitter that only logs
    pub fn silent() -> Self {
        Self { listener: None }
    }

    pub fn emit_started(&self, total_files: usize) {
        tracing::info!(total_files, "batch started");
        self.emit(BatchEvent::Started { total_files });
    }

    pub fn emit_file_started(
        &self,
        current_file: usize,
        total_files: usize,
        file_id: &FileId,
        filename: &str,
    ) {
        tracing::debug!(%file_id, filename, current_file, total_files, "processing file");
        self.emit(BatchEvent::FileStarted {
            current_file,
            total_files,
            file_id: file_id.clone(),
            filename: filename.to_string(),
        });
    }

    pub fn emit_file_settled(
        &self,
        settled_files: usize,
        total_files: usize,
        file_id: &FileId,
        succeeded: bool,
        message: String,
    ) {
        let progress = if total_files == 0 {
            100.0
        } else {
            (settled_files as f32 / total_files as f32) * 100.0
        };
        if succeeded {
            tracing::debug!(%file_id, settled_files, total_files, "file settled");
        } else {
            tracing::warn!(%file_id, settled_files, total_files, %message, "file failed");
        }
        self.emit(BatchEvent::FileSettled {
            settled_files,
            total_files,
            file_id: file_id.clone(),
            succeeded,
            progress,
            message,
        });
    }

    pub fn emit_finished(&self, completed: usize, total_files: usize, elapsed_ms: u64) {
        tracing::info!(completed, total_files, elapsed_ms, "batch finished");
        self.emit(BatchEvent::Finished {
            completed,
            total_files,
            elapsed_ms,
        });
    }

    fn emit(&self, event: BatchEvent) {
        if let Some(listener) = &self.listener {
            listener.on_event(&event);
        }
    }
}
