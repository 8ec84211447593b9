pub mod error;
pub mod task;
pub mod config;
pub mod metadata;

// Re-export commonly used types
pub use error::SqueezeError;
pub use task::{
    CompressedOutput, FileId, FileStatus, MediaKind, QueuedFile, QueuedFileView, SourceFile,
};
pub use config::{
    AudioFormat, AudioSettings, EngineConfig, ImageFormat, ImageSettings, OutputProfile,
    QueueLimits, SessionConfig,
};
pub use metadata::{AudioMetadata, ImageMetadata, MediaMetadata};
