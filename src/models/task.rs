use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use crate::models::{MediaMetadata, SqueezeError};

/// Which media family a queue accepts
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Audio,
    Image,
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaKind::Audio => f.write_str("audio"),
            MediaKind::Image => f.write_str("image"),
        }
    }
}

/// Opaque queue entry identifier: `<unix millis>-<random suffix>`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileId(String);

impl FileId {
    pub fn generate() -> Self {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or(0);
        let suffix: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(9)
            .map(|b| char::from(b).to_ascii_lowercase())
            .collect();
        Self(format!("{}-{}", millis, suffix))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FileId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

#[derive(Debug, Clone)]
enum Payload {
    Memory(Arc<[u8]>),
    Disk(PathBuf),
}

/// A user-selected file: declared name, media type and size plus its bytes
#[derive(Debug, Clone)]
pub struct SourceFile {
    name: String,
    mime_type: String,
    size: u64,
    payload: Payload,
}

impl SourceFile {
    /// In-memory file; the declared size is the payload length
    pub fn from_bytes(
        name: impl Into<String>,
        mime_type: impl Into<String>,
        data: Vec<u8>,
    ) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            size: data.len() as u64,
            payload: Payload::Memory(Arc::from(data)),
        }
    }

    /// File on disk, read lazily; the declared size comes from filesystem metadata
    pub fn from_path(
        path: impl AsRef<Path>,
        mime_type: impl Into<String>,
    ) -> Result<Self, SqueezeError> {
        let path = path.as_ref();
        let metadata = fs::metadata(path)?;
        if !metadata.is_file() {
            return Err(SqueezeError::UnsupportedType(format!(
                "{} is not a regular file",
                path.display()
            )));
        }
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());

        Ok(Self {
            name,
            mime_type: mime_type.into(),
            size: metadata.len(),
            payload: Payload::Disk(path.to_path_buf()),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    /// Lowercased extension of the declared name, if any
    pub fn extension(&self) -> Option<String> {
        Path::new(&self.name)
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
    }

    /// Backing path for files added from disk; `None` for in-memory payloads
    pub fn path(&self) -> Option<&Path> {
        match &self.payload {
            Payload::Memory(_) => None,
            Payload::Disk(path) => Some(path),
        }
    }

    /// Load the whole payload
    pub fn read(&self) -> Result<Arc<[u8]>, SqueezeError> {
        match &self.payload {
            Payload::Memory(data) => Ok(Arc::clone(data)),
            Payload::Disk(path) => Ok(Arc::from(fs::read(path)?)),
        }
    }

    /// Materialize the payload at `dest` (copy for disk files, write for memory)
    pub fn write_to(&self, dest: &Path) -> Result<(), SqueezeError> {
        match &self.payload {
            Payload::Memory(data) => fs::write(dest, data)?,
            Payload::Disk(path) => {
                fs::copy(path, dest)?;
            }
        }
        Ok(())
    }
}

/// Encoded output of a successful transform
#[derive(Debug, Clone, PartialEq)]
pub struct CompressedOutput {
    bytes: Vec<u8>,
    content_type: &'static str,
    file_name: String,
}

impl CompressedOutput {
    pub fn new(bytes: Vec<u8>, content_type: &'static str, file_name: String) -> Self {
        Self {
            bytes,
            content_type,
            file_name,
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn content_type(&self) -> &'static str {
        self.content_type
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }
}

/// Lifecycle of a queued file. `Completed` and `Error` are terminal.
#[derive(Debug, Clone, PartialEq)]
pub enum FileStatus {
    Pending,
    Processing,
    Completed(CompressedOutput),
    Error(String),
}

impl FileStatus {
    pub fn label(&self) -> &'static str {
        match self {
            FileStatus::Pending => "pending",
            FileStatus::Processing => "processing",
            FileStatus::Completed(_) => "completed",
            FileStatus::Error(_) => "error",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, FileStatus::Completed(_) | FileStatus::Error(_))
    }
}

/// One entry of the queue
#[derive(Debug, Clone)]
pub struct QueuedFile {
    id: FileId,
    source: SourceFile,
    status: FileStatus,
}

impl QueuedFile {
    pub fn new(source: SourceFile) -> Self {
        Self {
            id: FileId::generate(),
            source,
            status: FileStatus::Pending,
        }
    }

    pub fn id(&self) -> &FileId {
        &self.id
    }

    pub fn source(&self) -> &SourceFile {
        &self.source
    }

    pub fn status(&self) -> &FileStatus {
        &self.status
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.status, FileStatus::Pending)
    }

    pub fn result(&self) -> Option<&CompressedOutput> {
        match &self.status {
            FileStatus::Completed(output) => Some(output),
            _ => None,
        }
    }

    pub fn compressed_size(&self) -> Option<u64> {
        self.result().map(CompressedOutput::size)
    }

    pub fn error(&self) -> Option<&str> {
        match &self.status {
            FileStatus::Error(message) => Some(message),
            _ => None,
        }
    }

    pub(crate) fn set_status(&mut self, status: FileStatus) {
        self.status = status;
    }
}

/// Serializable snapshot of a queue entry for rendering
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueuedFileView {
    pub id: FileId,
    pub name: String,
    pub original_size: u64,
    pub status: &'static str,
    pub compressed_size: Option<u64>,
    pub error: Option<String>,
    pub metadata: Option<MediaMetadata>,
}

impl QueuedFileView {
    pub fn new(file: &QueuedFile, metadata: Option<&MediaMetadata>) -> Self {
        Self {
            id: file.id.clone(),
            name: file.source.name.clone(),
            original_size: file.source.size,
            status: file.status.label(),
            compressed_size: file.compressed_size(),
            error: file.error().map(str::to_string),
            metadata: metadata.cloned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_file_id_format_and_uniqueness() {
        let a = FileId::generate();
        let b = FileId::generate();
        assert_ne!(a, b);

        let (millis, suffix) = a.as_str().split_once('-').unwrap();
        assert!(millis.parse::<u128>().is_ok());
        assert_eq!(suffix.len(), 9);
        assert!(suffix.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
    }

    #[test]
    fn test_status_payload_matches_status() {
        let source = SourceFile::from_bytes("a.mp3", "audio/mpeg", vec![1, 2, 3]);
        let mut file = QueuedFile::new(source);
        assert!(file.is_pending());
        assert!(file.result().is_none() && file.error().is_none());

        file.set_status(FileStatus::Completed(CompressedOutput::new(
            vec![9; 2],
            "audio/mpeg",
            "a_compressed.mp3".to_string(),
        )));
        assert_eq!(file.compressed_size(), Some(2));
        assert!(file.error().is_none());
        assert!(file.status().is_terminal());

        file.set_status(FileStatus::Error("boom".to_string()));
        assert_eq!(file.error(), Some("boom"));
        assert!(file.result().is_none());
        assert!(file.compressed_size().is_none());
    }

    #[test]
    fn test_source_from_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("Track.FLAC");
        fs::write(&path, b"0123456789").unwrap();

        let source = SourceFile::from_path(&path, "audio/flac").unwrap();
        assert_eq!(source.name(), "Track.FLAC");
        assert_eq!(source.size(), 10);
        assert_eq!(source.extension().as_deref(), Some("flac"));
        assert_eq!(source.path(), Some(path.as_path()));
        assert_eq!(&*source.read().unwrap(), b"0123456789");
        assert!(SourceFile::from_bytes("a.flac", "", vec![1]).path().is_none());

        let copy = dir.path().join("copy.flac");
        source.write_to(&copy).unwrap();
        assert_eq!(fs::read(copy).unwrap(), b"0123456789");
    }

    #[test]
    fn test_source_from_path_rejects_directory() {
        let dir = TempDir::new().unwrap();
        assert!(SourceFile::from_path(dir.path(), "audio/mpeg").is_err());
    }

    #[test]
    fn test_view_serializes_camel_case() {
        let file = QueuedFile::new(SourceFile::from_bytes("photo.png", "image/png", vec![0; 4]));
        let view = QueuedFileView::new(&file, None);
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["name"], "photo.png");
        assert_eq!(json["originalSize"], 4);
        assert_eq!(json["status"], "pending");
        assert!(json["compressedSize"].is_null());
    }
}
