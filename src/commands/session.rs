use std::sync::{Arc, RwLock};
use std::time::Duration;
use crate::core::export::{self, CompressionStats, Download, DownloadSink};
use crate::core::intake::{IntakeReport, IntakeValidator};
use crate::core::probe::{FfprobeProber, ImageProber, MetadataProber};
use crate::core::processor::{BatchOutcome, BatchProcessor, SettingsHandle};
use crate::core::queue::FileQueue;
use crate::core::transform::{FfmpegTranscoder, ImageEncoder, MediaTransform};
use crate::models::{
    FileId, MediaKind, MediaMetadata, QueueLimits, QueuedFile, QueuedFileView, SessionConfig,
    SourceFile, SqueezeError,
};
use crate::utils::parallel::{ProbePool, ProbeReport};
use crate::utils::progress::{ProgressEmitter, ProgressListener};

/// Audio compressor backed by ffmpeg
pub type AudioSession = CompressorSession<FfmpegTranscoder>;

/// Image compressor backed by the in-process encoder
pub type ImageSession = CompressorSession<ImageEncoder>;

/// Everything one compressor page owns: the queue, its settings, the
/// transform and the background metadata probes
///
/// Each method is one command the UI can issue. `process_batch` borrows the
/// session mutably for the whole run, so no other command can touch the
/// queue while files are being processed.
pub struct CompressorSession<T: MediaTransform> {
    transform: T,
    settings: SettingsHandle<T::Settings>,
    validator: IntakeValidator,
    queue: FileQueue,
    prober: Arc<dyn MetadataProber>,
    probes: ProbePool,
    emitter: ProgressEmitter,
    download_delay: Duration,
}

impl AudioSession {
    pub fn audio(config: &SessionConfig) -> Result<Self, SqueezeError> {
        Self::new(
            FfmpegTranscoder::new(config.engine.ffmpeg_path.clone()),
            config.audio.clone(),
            Arc::new(FfprobeProber::new(config.engine.ffprobe_path.clone())),
            &config.limits,
        )
    }
}

impl ImageSession {
    pub fn image(config: &SessionConfig) -> Result<Self, SqueezeError> {
        Self::new(
            ImageEncoder::new(),
            config.image.clone(),
            Arc::new(ImageProber::new()),
            &config.limits,
        )
    }
}

impl<T: MediaTransform> CompressorSession<T> {
    pub fn new(
        transform: T,
        settings: T::Settings,
        prober: Arc<dyn MetadataProber>,
        limits: &QueueLimits,
    ) -> Result<Self, SqueezeError> {
        let probes = match limits.probe_threads {
            Some(threads) => ProbePool::with_threads(threads)?,
            None => ProbePool::new()?,
        };

        Ok(Self {
            validator: IntakeValidator::new(transform.kind(), limits),
            transform,
            settings: Arc::new(RwLock::new(settings)),
            queue: FileQueue::new(),
            prober,
            probes,
            emitter: ProgressEmitter::silent(),
            download_delay: Duration::from_millis(limits.download_delay_ms),
        })
    }

    /// Route batch notifications to `listener`
    pub fn with_listener(mut self, listener: Arc<dyn ProgressListener>) -> Self {
        self.emitter = ProgressEmitter::new(listener);
        self
    }

    pub fn kind(&self) -> MediaKind {
        self.validator.kind()
    }

    /// Validate and enqueue files, starting a metadata probe for each accepted one
    pub fn add_files(&mut self, files: Vec<SourceFile>) -> IntakeReport {
        let screening = self.validator.screen(files);

        let mut accepted = Vec::with_capacity(screening.accepted.len());
        for source in screening.accepted {
            let id = self.queue.push(source.clone());
            self.probes.submit(id.clone(), source, Arc::clone(&self.prober));
            accepted.push(id);
        }

        if let Some(banner) = &screening.banner {
            tracing::warn!(kind = %self.kind(), %banner, "files rejected at intake");
        }
        tracing::info!(
            accepted = accepted.len(),
            rejected = screening.rejected.len(),
            "files added"
        );

        IntakeReport {
            accepted,
            rejected: screening.rejected,
            banner: screening.banner,
        }
    }

    pub fn remove_file(&mut self, id: &FileId) -> Result<QueuedFile, SqueezeError> {
        let removed = self.queue.remove(id)?;
        tracing::debug!(file_id = %id, "file removed");
        Ok(removed)
    }

    /// Empty the queue; returns how many files were dropped
    pub fn clear(&mut self) -> usize {
        self.queue.clear()
    }

    /// Compress every pending file, one after another
    pub fn process_batch(&mut self) -> BatchOutcome {
        self.collect_metadata();
        BatchProcessor::new(&self.transform, &self.settings, &self.emitter).run(&mut self.queue)
    }

    pub fn download(&self, id: &FileId) -> Result<Download<'_>, SqueezeError> {
        export::download(&self.queue, id)
    }

    /// Deliver every completed file to `sink`, pacing deliveries by the configured delay
    pub fn download_all(&self, sink: &mut dyn DownloadSink) -> Result<usize, SqueezeError> {
        export::download_all(&self.queue, sink, self.download_delay)
    }

    pub fn stats(&self) -> CompressionStats {
        CompressionStats::from_queue(&self.queue)
    }

    pub fn files(&self) -> &[QueuedFile] {
        self.queue.files()
    }

    pub fn pending_count(&self) -> usize {
        self.queue.files().iter().filter(|f| f.is_pending()).count()
    }

    /// Metadata collected so far; see [`Self::collect_metadata`]
    pub fn metadata(&self, id: &FileId) -> Option<&MediaMetadata> {
        self.queue.metadata(id)
    }

    /// Fold in probe results that have already arrived; returns how many were stored
    pub fn collect_metadata(&mut self) -> usize {
        let reports = self.probes.try_collect();
        self.apply_reports(reports)
    }

    /// Block until every outstanding probe has reported
    pub fn wait_for_metadata(&mut self) -> usize {
        let reports = self.probes.wait_all();
        self.apply_reports(reports)
    }

    /// Render-ready view of the queue, including any metadata that has arrived
    pub fn snapshot(&mut self) -> Vec<QueuedFileView> {
        self.collect_metadata();
        self.queue.snapshot()
    }

    /// Copy of the current settings
    pub fn settings(&self) -> T::Settings {
        self.settings.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Shared handle; writes through it reach files not yet started in a running batch
    pub fn settings_handle(&self) -> SettingsHandle<T::Settings> {
        Arc::clone(&self.settings)
    }

    pub fn update_settings(&self, settings: T::Settings) {
        *self.settings.write().unwrap_or_else(|e| e.into_inner()) = settings;
    }

    fn apply_reports(&mut self, reports: Vec<ProbeReport>) -> usize {
        let mut stored = 0;
        for report in reports {
            match report.result {
                Ok(metadata) => {
                    if self.queue.set_metadata(report.file_id.clone(), metadata) {
                        stored += 1;
                    } else {
                        tracing::debug!(
                            file_id = %report.file_id,
                            "metadata for removed file dropped"
                        );
                    }
                }
                Err(err) => {
                    tracing::warn!(
                        file_id = %report.file_id,
                        error = %err,
                        "metadata probe failed"
                    );
                }
            }
        }
        stored
    }
}
