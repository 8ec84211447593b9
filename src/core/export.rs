use serde::Serialize;
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;
use crate::core::queue::FileQueue;
use crate::models::{FileId, QueuedFile, SqueezeError};

/// Aggregate sizes, recomputed from the queue on every call
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompressionStats {
    /// Sum of original sizes of every queued file
    pub total_original: u64,
    /// Sum of output sizes of `Completed` files only
    pub total_compressed: u64,
    pub reduction_percent: f64,
}

impl CompressionStats {
    pub fn from_queue(queue: &FileQueue) -> Self {
        let total_original = queue.files().iter().map(|f| f.source().size()).sum();
        let total_compressed = queue.files().iter().filter_map(QueuedFile::compressed_size).sum();

        Self {
            total_original,
            total_compressed,
            reduction_percent: reduction_percent(total_original, total_compressed),
        }
    }
}

/// `(1 - compressed / original) * 100`, or 0 when either side is 0
pub fn reduction_percent(original: u64, compressed: u64) -> f64 {
    if original == 0 || compressed == 0 {
        return 0.0;
    }
    (1.0 - compressed as f64 / original as f64) * 100.0
}

/// A compressed result packaged for the download target
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Download<'a> {
    pub file_name: &'a str,
    pub content_type: &'static str,
    pub bytes: &'a [u8],
}

impl<'a> Download<'a> {
    /// Package a completed file; errors for any other status
    pub fn from_file(file: &'a QueuedFile) -> Result<Self, SqueezeError> {
        let output = file
            .result()
            .ok_or_else(|| SqueezeError::NoResult(file.source().name().to_string()))?;

        Ok(Self {
            file_name: output.file_name(),
            content_type: output.content_type(),
            bytes: output.bytes(),
        })
    }
}

/// Where downloads are delivered
pub trait DownloadSink {
    fn deliver(&mut self, download: &Download<'_>) -> Result<(), SqueezeError>;
}

/// Writes each download into a directory, creating it when missing
pub struct DirectorySink {
    dir: PathBuf,
    written: Vec<PathBuf>,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            written: Vec::new(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Paths written so far, in delivery order
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }
}

impl DownloadSink for DirectorySink {
    fn deliver(&mut self, download: &Download<'_>) -> Result<(), SqueezeError> {
        fs::create_dir_all(&self.dir).map_err(|e| SqueezeError::Download(
            format!("Failed to create directory {}: {}", self.dir.display(), e)
        ))?;

        // Names come from user files; keep only the final component
        let file_name = Path::new(download.file_name)
            .file_name()
            .ok_or_else(|| {
                SqueezeError::Download(format!("Invalid file name: {}", download.file_name))
            })?;
        let (dest, mut file) = create_unique(&self.dir, Path::new(file_name))?;

        file.write_all(download.bytes).map_err(|e| SqueezeError::Download(
            format!("Failed to write {}: {}", dest.display(), e)
        ))?;

        tracing::debug!(path = %dest.display(), bytes = download.bytes.len(), "download written");
        self.written.push(dest);
        Ok(())
    }
}

/// Create `name` in `dir`, or "stem (n).ext" if that name is taken
///
/// Existing files are never overwritten, so two results sharing a name both
/// land on disk.
fn create_unique(dir: &Path, name: &Path) -> Result<(PathBuf, File), SqueezeError> {
    let stem = name.file_stem().map(|s| s.to_string_lossy()).unwrap_or_default();
    let ext = name.extension().map(|e| e.to_string_lossy());

    for n in 0u32.. {
        let candidate = match (n, &ext) {
            (0, _) => name.to_path_buf(),
            (_, Some(ext)) => PathBuf::from(format!("{} ({}).{}", stem, n, ext)),
            (_, None) => PathBuf::from(format!("{} ({})", stem, n)),
        };
        let dest = dir.join(candidate);

        match OpenOptions::new().write(true).create_new(true).open(&dest) {
            Ok(file) => return Ok((dest, file)),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
            Err(e) => {
                return Err(SqueezeError::Download(format!(
                    "Failed to create {}: {}",
                    dest.display(),
                    e
                )));
            }
        }
    }

    Err(SqueezeError::Download(format!("No free name for {}", name.display())))
}

/// Package one file by id
pub fn download<'a>(queue: &'a FileQueue, id: &FileId) -> Result<Download<'a>, SqueezeError> {
    let file = queue
        .get(id)
        .ok_or_else(|| SqueezeError::FileNotFound(id.to_string()))?;
    Download::from_file(file)
}

/// Deliver every completed file, one at a time, pausing `delay` between deliveries
///
/// The pause keeps hosts whose download managers choke on bursts responsive.
/// Returns the number of files delivered.
pub fn download_all(
    queue: &FileQueue,
    sink: &mut dyn DownloadSink,
    delay: Duration,
) -> Result<usize, SqueezeError> {
    let mut delivered = 0;

    for file in queue.completed() {
        if delivered > 0 && !delay.is_zero() {
            thread::sleep(delay);
        }
        sink.deliver(&Download::from_file(file)?)?;
        delivered += 1;
    }

    tracing::info!(delivered, "downloaded all completed files");
    Ok(delivered)
}
