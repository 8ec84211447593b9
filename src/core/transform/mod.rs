// Per-file compression transforms

pub mod audio;
pub mod image;

use std::path::Path;
use crate::models::{MediaKind, OutputProfile, SourceFile, SqueezeError};

pub use self::audio::FfmpegTranscoder;
pub use self::image::ImageEncoder;

/// Converts one source file into a compressed buffer
///
/// The batch processor checks `is_ready` once per batch and then calls
/// `transform` for one file at a time, never concurrently.
pub trait MediaTransform {
    /// Output settings, snapshotted per call
    type Settings: OutputProfile + Clone + Send + Sync;

    /// Media family this transform accepts at intake
    fn kind(&self) -> MediaKind;

    /// Whether the underlying engine can be invoked right now
    fn is_ready(&self) -> bool;

    fn transform(
        &self,
        source: &SourceFile,
        settings: &Self::Settings,
    ) -> Result<Vec<u8>, SqueezeError>;
}

/// Download name: `<original stem><suffix>.<extension>`
///
/// # Example
/// ```ignore
/// "Live Set.wav" + mp3 settings -> "Live Set_compressed.mp3"
/// "photo.jpeg"   + webp settings -> "photo_optimized.webp"
/// ```
pub fn output_file_name(original_name: &str, profile: &dyn OutputProfile) -> String {
    let stem = Path::new(original_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or("file");

    format!("{}{}.{}", stem, profile.file_suffix(), profile.extension())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AudioFormat, AudioSettings, ImageFormat, ImageSettings};

    #[test]
    fn test_output_file_name() {
        let mp3 = AudioSettings::new(AudioFormat::Mp3, 128);
        assert_eq!(output_file_name("Live Set.wav", &mp3), "Live Set_compressed.mp3");
        assert_eq!(output_file_name("archive.tar.flac", &mp3), "archive.tar_compressed.mp3");
        assert_eq!(output_file_name("noext", &mp3), "noext_compressed.mp3");
        assert_eq!(output_file_name("", &mp3), "file_compressed.mp3");

        let webp = ImageSettings::new(ImageFormat::Webp, 0.8);
        assert_eq!(output_file_name("photo.jpeg", &webp), "photo_optimized.webp");
    }
}
