use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use crate::models::SqueezeError;

/// Size ceiling for a single audio file (5 GiB)
pub const AUDIO_MAX_BYTES: u64 = 5 * 1024 * 1024 * 1024;

/// Size ceiling for a single image file (100 MiB)
pub const IMAGE_MAX_BYTES: u64 = 100 * 1024 * 1024;

/// Pause between deliveries when downloading every result
pub const DEFAULT_DOWNLOAD_DELAY_MS: u64 = 500;

pub const MIN_AUDIO_BITRATE_KBPS: u32 = 32;
pub const MAX_AUDIO_BITRATE_KBPS: u32 = 320;

/// Describes the file a set of output settings produces
pub trait OutputProfile {
    /// Extension without the leading dot
    fn extension(&self) -> &'static str;

    /// MIME type handed to the download target
    fn content_type(&self) -> &'static str;

    /// Appended to the original file stem when naming the output
    fn file_suffix(&self) -> &'static str;
}

/// Audio output container/codec
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    #[default]
    Mp3,
    Aac,
    Opus,
    Ogg,
    M4a,
    Wav,
    Flac,
}

impl AudioFormat {
    pub const ALL: [AudioFormat; 7] = [
        AudioFormat::Mp3,
        AudioFormat::Aac,
        AudioFormat::Opus,
        AudioFormat::Ogg,
        AudioFormat::M4a,
        AudioFormat::Wav,
        AudioFormat::Flac,
    ];

    pub fn extension(self) -> &'static str {
        match self {
            AudioFormat::Mp3 => "mp3",
            AudioFormat::Aac => "aac",
            AudioFormat::Opus => "opus",
            AudioFormat::Ogg => "ogg",
            AudioFormat::M4a => "m4a",
            AudioFormat::Wav => "wav",
            AudioFormat::Flac => "flac",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            AudioFormat::Mp3 => "audio/mpeg",
            AudioFormat::Aac => "audio/aac",
            AudioFormat::Opus => "audio/opus",
            AudioFormat::Ogg => "audio/ogg",
            AudioFormat::M4a => "audio/mp4",
            AudioFormat::Wav => "audio/wav",
            AudioFormat::Flac => "audio/flac",
        }
    }

    /// Lossless formats ignore the bitrate setting
    pub fn is_lossless(self) -> bool {
        matches!(self, AudioFormat::Wav | AudioFormat::Flac)
    }

    /// Encoder arguments for ffmpeg, excluding bitrate
    pub fn codec_args(self) -> &'static [&'static str] {
        match self {
            AudioFormat::Mp3 => &["-c:a", "libmp3lame"],
            AudioFormat::Aac => &["-c:a", "aac", "-f", "adts"],
            AudioFormat::Opus => &["-c:a", "libopus"],
            AudioFormat::Ogg => &["-c:a", "libvorbis"],
            AudioFormat::M4a => &["-c:a", "aac", "-movflags", "+faststart"],
            AudioFormat::Wav => &["-c:a", "pcm_s16le"],
            AudioFormat::Flac => &["-c:a", "flac", "-compression_level", "8"],
        }
    }
}

/// Audio compression settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct AudioSettings {
    pub format: AudioFormat,
    /// Target bitrate in kbps (32 - 320), ignored by lossless formats
    pub bitrate_kbps: u32,
    /// Resample to this rate (Hz) when set
    pub sample_rate: Option<u32>,
    /// Downmix/upmix to this many channels when set
    pub channels: Option<u8>,
}

impl AudioSettings {
    pub fn new(format: AudioFormat, bitrate_kbps: u32) -> Self {
        Self {
            format,
            bitrate_kbps: bitrate_kbps.clamp(MIN_AUDIO_BITRATE_KBPS, MAX_AUDIO_BITRATE_KBPS),
            sample_rate: None,
            channels: None,
        }
    }

    pub fn with_sample_rate(mut self, sample_rate: u32) -> Self {
        self.sample_rate = Some(sample_rate).filter(|r| *r > 0);
        self
    }

    pub fn with_channels(mut self, channels: u8) -> Self {
        self.channels = Some(channels).filter(|c| *c > 0);
        self
    }

    /// Re-apply constructor bounds to values that bypassed `new` (e.g. deserialized)
    pub fn normalized(self) -> Self {
        let mut settings = Self::new(self.format, self.bitrate_kbps);
        settings.sample_rate = self.sample_rate.filter(|r| *r > 0);
        settings.channels = self.channels.filter(|c| *c > 0);
        settings
    }
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self::new(AudioFormat::Mp3, 128)
    }
}

impl OutputProfile for AudioSettings {
    fn extension(&self) -> &'static str {
        self.format.extension()
    }

    fn content_type(&self) -> &'static str {
        self.format.content_type()
    }

    fn file_suffix(&self) -> &'static str {
        "_compressed"
    }
}

/// Image output encoding
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    #[default]
    Jpeg,
    Png,
    Webp,
}

impl ImageFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "jpg",
            ImageFormat::Png => "png",
            ImageFormat::Webp => "webp",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::Png => "image/png",
            ImageFormat::Webp => "image/webp",
        }
    }

    /// Lossless encoders ignore the quality setting
    pub fn is_lossless(self) -> bool {
        matches!(self, ImageFormat::Png)
    }
}

/// Image compression settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ImageSettings {
    pub format: ImageFormat,
    /// Encoder quality fraction (0.1 - 1.0)
    pub quality: f32,
    /// Downscale wider images to this width, keeping aspect ratio
    pub max_width: Option<u32>,
}

impl ImageSettings {
    pub fn new(format: ImageFormat, quality: f32) -> Self {
        Self {
            format,
            quality: quality.clamp(0.1, 1.0),
            max_width: None,
        }
    }

    pub fn with_max_width(mut self, max_width: u32) -> Self {
        self.max_width = Some(max_width).filter(|w| *w > 0);
        self
    }

    pub fn normalized(self) -> Self {
        let mut settings = Self::new(self.format, self.quality);
        settings.max_width = self.max_width.filter(|w| *w > 0);
        settings
    }

    /// JPEG quality on the encoder's 1 - 100 scale
    pub fn jpeg_quality(&self) -> u8 {
        (self.quality * 100.0).round().clamp(1.0, 100.0) as u8
    }
}

impl Default for ImageSettings {
    fn default() -> Self {
        Self::new(ImageFormat::Jpeg, 0.8)
    }
}

impl OutputProfile for ImageSettings {
    fn extension(&self) -> &'static str {
        self.format.extension()
    }

    fn content_type(&self) -> &'static str {
        self.format.content_type()
    }

    fn file_suffix(&self) -> &'static str {
        "_optimized"
    }
}

/// Locations of the external transcoding tools
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    pub ffmpeg_path: PathBuf,
    pub ffprobe_path: PathBuf,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: PathBuf::from("ffmpeg"),
            ffprobe_path: PathBuf::from("ffprobe"),
        }
    }
}

/// Intake ceilings and export pacing
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct QueueLimits {
    pub max_audio_bytes: u64,
    pub max_image_bytes: u64,
    pub download_delay_ms: u64,
    /// Metadata probe threads; all logical cores when unset
    pub probe_threads: Option<usize>,
}

impl Default for QueueLimits {
    fn default() -> Self {
        Self {
            max_audio_bytes: AUDIO_MAX_BYTES,
            max_image_bytes: IMAGE_MAX_BYTES,
            download_delay_ms: DEFAULT_DOWNLOAD_DELAY_MS,
            probe_threads: None,
        }
    }
}

/// Everything a session needs at construction
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionConfig {
    pub engine: EngineConfig,
    pub limits: QueueLimits,
    pub audio: AudioSettings,
    pub image: ImageSettings,
}

impl SessionConfig {
    /// Parse a JSON config; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self, SqueezeError> {
        let config: SessionConfig = serde_json::from_str(json)
            .map_err(|e| SqueezeError::InvalidConfig(format!("Failed to parse config: {}", e)))?;
        config.validate()
    }

    fn validate(mut self) -> Result<Self, SqueezeError> {
        if self.limits.max_audio_bytes == 0 || self.limits.max_image_bytes == 0 {
            return Err(SqueezeError::InvalidConfig(
                "Size limits must be greater than zero".to_string(),
            ));
        }
        if self.limits.probe_threads == Some(0) {
            return Err(SqueezeError::InvalidConfig(
                "probeThreads must be at least 1".to_string(),
            ));
        }
        self.audio = self.audio.normalized();
        self.image = self.image.normalized();
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audio_bitrate_clamped() {
        assert_eq!(AudioSettings::new(AudioFormat::Mp3, 8).bitrate_kbps, 32);
        assert_eq!(AudioSettings::new(AudioFormat::Mp3, 999).bitrate_kbps, 320);
        assert_eq!(AudioSettings::new(AudioFormat::Opus, 96).bitrate_kbps, 96);
    }

    #[test]
    fn test_image_quality_clamped() {
        assert_eq!(ImageSettings::new(ImageFormat::Jpeg, 0.0).quality, 0.1);
        assert_eq!(ImageSettings::new(ImageFormat::Jpeg, 3.0).quality, 1.0);
        assert_eq!(ImageSettings::new(ImageFormat::Jpeg, 0.75).jpeg_quality(), 75);
    }

    #[test]
    fn test_zero_max_width_means_no_resize() {
        let settings = ImageSettings::default().with_max_width(0);
        assert_eq!(settings.max_width, None);
    }

    #[test]
    fn test_output_profiles() {
        let audio = AudioSettings::new(AudioFormat::M4a, 128);
        assert_eq!(audio.extension(), "m4a");
        assert_eq!(audio.content_type(), "audio/mp4");

        let image = ImageSettings::new(ImageFormat::Webp, 0.9);
        assert_eq!(image.extension(), "webp");
        assert_eq!(image.content_type(), "image/webp");
        assert!(ImageFormat::Png.is_lossless());
        assert!(!ImageFormat::Webp.is_lossless());
        assert!(AudioFormat::Flac.is_lossless());
        assert!(!AudioFormat::Opus.is_lossless());
    }

    #[test]
    fn test_config_from_json_defaults() {
        let config = SessionConfig::from_json("{}").unwrap();
        assert_eq!(config.limits.max_audio_bytes, AUDIO_MAX_BYTES);
        assert_eq!(config.limits.max_image_bytes, IMAGE_MAX_BYTES);
        assert_eq!(config.limits.download_delay_ms, 500);
        assert_eq!(config.engine.ffmpeg_path, PathBuf::from("ffmpeg"));
    }

    #[test]
    fn test_config_from_json_normalizes_settings() {
        let json = r#"{
            "audio": { "format": "opus", "bitrateKbps": 4000 },
            "image": { "format": "png", "quality": 7.5, "maxWidth": 1920 },
            "limits": { "downloadDelayMs": 0 }
        }"#;
        let config = SessionConfig::from_json(json).unwrap();
        assert_eq!(config.audio.format, AudioFormat::Opus);
        assert_eq!(config.audio.bitrate_kbps, 320);
        assert_eq!(config.image.format, ImageFormat::Png);
        assert_eq!(config.image.quality, 1.0);
        assert_eq!(config.image.max_width, Some(1920));
        assert_eq!(config.limits.download_delay_ms, 0);
    }

    #[test]
    fn test_config_rejects_zero_limits() {
        let result = SessionConfig::from_json(r#"{ "limits": { "maxImageBytes": 0 } }"#);
        assert!(matches!(result, Err(SqueezeError::InvalidConfig(_))));

        let result = SessionConfig::from_json(r#"{ "limits": { "probeThreads": 0 } }"#);
        assert!(matches!(result, Err(SqueezeError::InvalidConfig(_))));
    }

    #[test]
    fn test_config_rejects_malformed_json() {
        let result = SessionConfig::from_json("{ not json");
        assert!(matches!(result, Err(SqueezeError::InvalidConfig(_))));
    }
}
