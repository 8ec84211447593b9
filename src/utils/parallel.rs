use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use crate::core::probe::MetadataProber;
use crate::models::{FileId, MediaMetadata, SourceFile, SqueezeError};

/// Outcome of one metadata probe
#[derive(Debug)]
pub struct ProbeReport {
    pub file_id: FileId,
    pub result: Result<MediaMetadata, SqueezeError>,
}

/// Runs metadata probes off the caller's thread
///
/// Uses a Rayon pool so several probes can be in flight at once. Reports come
/// back over a channel in completion order, which need not match submission order.
pub struct ProbePool {
    pool: rayon::ThreadPool,
    thread_count: usize,
    sender: Sender<ProbeReport>,
    receiver: Receiver<ProbeReport>,
    outstanding: usize,
}

impl ProbePool {
    /// Create a probe pool using all available CPU cores
    pub fn new() -> Result<Self, SqueezeError> {
        Self::with_threads(num_cpus::get())
    }

    /// Create a probe pool with a custom thread count
    pub fn with_threads(thread_count: usize) -> Result<Self, SqueezeError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(thread_count)
            .thread_name(|i| format!("metadata-probe-{}", i))
            .build()
            .map_err(|e| SqueezeError::InvalidConfig(
                format!("Failed to create probe thread pool: {}", e)
            ))?;
        let (sender, receiver) = mpsc::channel();

        Ok(Self {
            pool,
            thread_count,
            sender,
            receiver,
            outstanding: 0,
        })
    }

    /// Start probing `source` in the background
    pub fn submit(&mut self, file_id: FileId, source: SourceFile, prober: Arc<dyn MetadataProber>) {
        let sender = self.sender.clone();
        self.outstanding += 1;

        self.pool.spawn(move || {
            let result = catch_unwind(AssertUnwindSafe(|| prober.probe(&source)))
                .unwrap_or_else(|_| Err(SqueezeError::Probe(
                    format!("Probe panicked for {}", source.name())
                )));
            // Receiver only disappears with the pool's owner
            let _ = sender.send(ProbeReport { file_id, result });
        });
    }

    /// Reports that have arrived so far, without blocking
    pub fn try_collect(&mut self) -> Vec<ProbeReport> {
        let mut reports = Vec::new();
        while let Ok(report) = self.receiver.try_recv() {
            reports.push(report);
        }
        self.outstanding -= reports.len();
        reports
    }

    /// Block until every submitted probe has reported
    pub fn wait_all(&mut self) -> Vec<ProbeReport> {
        let mut reports = Vec::with_capacity(self.outstanding);
        while self.outstanding > 0 {
            match self.receiver.recv() {
                Ok(report) => {
                    self.outstanding -= 1;
                    reports.push(report);
                }
                Err(_) => break,
            }
        }
        reports
    }

    /// Probes submitted but not yet collected
    pub fn outstanding(&self) -> usize {
        self.outstanding
    }

    pub fn thread_count(&self) -> usize {
        self.thread_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ImageMetadata;
    use std::thread;
    use std::time::Duration;

    struct SlowProber;

    impl MetadataProber for SlowProber {
        fn probe(&self, source: &SourceFile) -> Result<MediaMetadata, SqueezeError> {
            // Earlier submissions finish later
            let delay = if source.name() == "first.png" { 50 } else { 0 };
            thread::sleep(Duration::from_millis(delay));
            Ok(MediaMetadata::Image(ImageMetadata { width: source.size() as u32, height: 1 }))
        }
    }

    struct PanickingProber;

    impl MetadataProber for PanickingProber {
        fn probe(&self, _source: &SourceFile) -> Result<MediaMetadata, SqueezeError> {
            panic!("decoder exploded");
        }
    }

    #[test]
    fn test_probe_pool_creation() {
        let pool = ProbePool::new().unwrap();
        assert!(pool.thread_count() > 0);

        let custom = ProbePool::with_threads(2).unwrap();
        assert_eq!(custom.thread_count(), 2);
        assert_eq!(custom.outstanding(), 0);
    }

    #[test]
    fn test_wait_all_collects_every_report() {
        let mut pool = ProbePool::with_threads(2).unwrap();
        let prober: Arc<dyn MetadataProber> = Arc::new(SlowProber);

        let first = SourceFile::from_bytes("first.png", "image/png", vec![0; 3]);
        let second = SourceFile::from_bytes("second.png", "image/png", vec![0; 5]);
        pool.submit(FileId::from("a"), first, Arc::clone(&prober));
        pool.submit(FileId::from("b"), second, prober);
        assert_eq!(pool.outstanding(), 2);

        let reports = pool.wait_all();
        assert_eq!(reports.len(), 2);
        assert_eq!(pool.outstanding(), 0);
        assert!(reports.iter().all(|r| r.result.is_ok()));
        let mut ids: Vec<_> = reports.iter().map(|r| r.file_id.to_string()).collect();
        ids.sort();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn test_panicking_probe_reports_error() {
        let mut pool = ProbePool::with_threads(1).unwrap();
        pool.submit(
            FileId::from("x"),
            SourceFile::from_bytes("bad.png", "image/png", vec![]),
            Arc::new(PanickingProber),
        );

        let reports = pool.wait_all();
        assert_eq!(reports.len(), 1);
        assert!(matches!(reports[0].result, Err(SqueezeError::Probe(_))));
    }
}
