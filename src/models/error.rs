use thiserror::Error;

/// Error types for the media compressor
#[derive(Error, Debug)]
pub enum SqueezeError {
    #[error("Unsupported file type: {0}")]
    UnsupportedType(String),

    #[error("{name} exceeds the {limit} size limit")]
    FileTooLarge { name: String, limit: String },

    #[error("Transcoding failed: {0}")]
    Transcode(String),

    #[error("Image processing error: {0}")]
    ImageProcessing(String),

    #[error("Metadata probe failed: {0}")]
    Probe(String),

    #[error("File not found in queue: {0}")]
    FileNotFound(String),

    #[error("File is still being processed: {0}")]
    FileBusy(String),

    #[error("File has no compressed result: {0}")]
    NoResult(String),

    #[error("Download failed: {0}")]
    Download(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

// Per-file failures are stored on the queue entry as a short message
impl From<SqueezeError> for String {
    fn from(err: SqueezeError) -> String {
        err.to_string()
    }
}
