// Test doubles shared by the processor and session tests

use std::sync::{Arc, Mutex};
use crate::core::probe::MetadataProber;
use crate::core::transform::MediaTransform;
use crate::models::{
    ImageMetadata, ImageSettings, MediaKind, MediaMetadata, SourceFile, SqueezeError,
};
use crate::utils::progress::{BatchEvent, ProgressListener};

/// Shared, ordered record of what happened during a test
pub type CallLog = Arc<Mutex<Vec<String>>>;

pub fn new_log() -> CallLog {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn entries(log: &CallLog) -> Vec<String> {
    log.lock().unwrap().clone()
}

/// Halves every payload; fails for file names listed in `fail_on`
pub struct FakeTransform {
    pub kind: MediaKind,
    pub ready: bool,
    pub fail_on: Vec<String>,
    pub log: CallLog,
}

impl FakeTransform {
    pub fn new(log: CallLog) -> Self {
        Self {
            kind: MediaKind::Image,
            ready: true,
            fail_on: Vec::new(),
            log,
        }
    }

    pub fn for_kind(mut self, kind: MediaKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn failing_on(mut self, name: &str) -> Self {
        self.fail_on.push(name.to_string());
        self
    }

    pub fn not_ready(mut self) -> Self {
        self.ready = false;
        self
    }
}

impl MediaTransform for FakeTransform {
    type Settings = ImageSettings;

    fn kind(&self) -> MediaKind {
        self.kind
    }

    fn is_ready(&self) -> bool {
        self.ready
    }

    fn transform(
        &self,
        source: &SourceFile,
        _settings: &ImageSettings,
    ) -> Result<Vec<u8>, SqueezeError> {
        self.log.lock().unwrap().push(format!("transform:{}", source.name()));
        if self.fail_on.iter().any(|n| n == source.name()) {
            return Err(SqueezeError::ImageProcessing(format!("cannot decode {}", source.name())));
        }
        let data = source.read()?;
        Ok(data[..data.len() / 2].to_vec())
    }
}

/// Writes settle events into a call log next to the transform's entries
pub struct LogListener {
    pub log: CallLog,
    pub events: Mutex<Vec<BatchEvent>>,
}

impl LogListener {
    pub fn new(log: CallLog) -> Self {
        Self {
            log,
            events: Mutex::new(Vec::new()),
        }
    }

    pub fn events(&self) -> Vec<BatchEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl ProgressListener for LogListener {
    fn on_event(&self, event: &BatchEvent) {
        if let BatchEvent::FileSettled { succeeded, .. } = event {
            self.log.lock().unwrap().push(format!("settled:{}", succeeded));
        }
        self.events.lock().unwrap().push(event.clone());
    }
}

/// Reports the payload length as the image width
pub struct SizeProber;

impl MetadataProber for SizeProber {
    fn probe(&self, source: &SourceFile) -> Result<MediaMetadata, SqueezeError> {
        if source.name().starts_with("corrupt") {
            return Err(SqueezeError::Probe("unreadable header".to_string()));
        }
        Ok(MediaMetadata::Image(ImageMetadata {
            width: source.size() as u32,
            height: 1,
        }))
    }
}
