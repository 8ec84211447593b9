use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::OnceLock;
use crate::core::file_ops::ScratchDir;
use crate::core::transform::MediaTransform;
use crate::models::{AudioSettings, MediaKind, OutputProfile, SourceFile, SqueezeError};

/// Audio transcoding through an external `ffmpeg` executable
///
/// Each call mounts the source into a fresh [`ScratchDir`], runs ffmpeg on it
/// and reads the output back. The scratch directory goes away when the call
/// returns, on every path.
pub struct FfmpegTranscoder {
    ffmpeg_path: PathBuf,
    ready: OnceLock<bool>,
}

impl FfmpegTranscoder {
    pub fn new(ffmpeg_path: impl Into<PathBuf>) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
            ready: OnceLock::new(),
        }
    }

    pub fn ffmpeg_path(&self) -> &Path {
        &self.ffmpeg_path
    }

    /// Full ffmpeg argument list for one conversion
    pub fn build_args(input: &Path, output: &Path, settings: &AudioSettings) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "-hide_banner".into(),
            "-nostdin".into(),
            "-y".into(),
            "-i".into(),
            input.into(),
            // Cover art would otherwise be carried over as a video stream
            "-vn".into(),
        ];

        args.extend(settings.format.codec_args().iter().map(OsString::from));

        if !settings.format.is_lossless() {
            args.push("-b:a".into());
            args.push(format!("{}k", settings.bitrate_kbps).into());
        }
        if let Some(rate) = settings.sample_rate {
            args.push("-ar".into());
            args.push(rate.to_string().into());
        }
        if let Some(channels) = settings.channels {
            args.push("-ac".into());
            args.push(channels.to_string().into());
        }

        args.push(output.into());
        args
    }
}

impl MediaTransform for FfmpegTranscoder {
    type Settings = AudioSettings;

    fn kind(&self) -> MediaKind {
        MediaKind::Audio
    }

    /// Probed once with `ffmpeg -version`, then cached
    fn is_ready(&self) -> bool {
        *self.ready.get_or_init(|| {
            let available = Command::new(&self.ffmpeg_path)
                .arg("-version")
                .stdin(Stdio::null())
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .status()
                .map(|status| status.success())
                .unwrap_or(false);
            if !available {
                tracing::warn!(path = %self.ffmpeg_path.display(), "ffmpeg is not available");
            }
            available
        })
    }

    #[tracing::instrument(
        skip(self, source, settings),
        fields(file = source.name(), format = ?settings.format)
    )]
    fn transform(
        &self,
        source: &SourceFile,
        settings: &AudioSettings,
    ) -> Result<Vec<u8>, SqueezeError> {
        let input_ext = source.extension().unwrap_or_else(|| "bin".to_string());
        let scratch = ScratchDir::new(source.name(), &input_ext, settings.extension())?;
        scratch.mount(source)?;

        let output = Command::new(&self.ffmpeg_path)
            .args(Self::build_args(scratch.input_path(), scratch.output_path(), settings))
            .stdin(Stdio::null())
            .output()
            .map_err(|e| SqueezeError::Transcode(format!("Failed to run ffmpeg: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let reason = stderr
                .lines()
                .rev()
                .find(|line| !line.trim().is_empty())
                .unwrap_or("unknown error")
                .trim();
            return Err(SqueezeError::Transcode(format!(
                "ffmpeg exited with {}: {}",
                output.status, reason
            )));
        }

        let bytes = scratch.read_output()?;
        tracing::debug!(original = source.size(), compressed = bytes.len(), "transcoded");
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AudioFormat;

    fn args_as_strings(settings: &AudioSettings) -> Vec<String> {
        FfmpegTranscoder::build_args(Path::new("/s/input.wav"), Path::new("/s/output.x"), settings)
            .into_iter()
            .map(|a| a.to_string_lossy().to_string())
            .collect()
    }

    #[test]
    fn test_mp3_args() {
        let args = args_as_strings(&AudioSettings::new(AudioFormat::Mp3, 192));
        assert_eq!(
            args,
            vec![
                "-hide_banner", "-nostdin", "-y", "-i", "/s/input.wav", "-vn",
                "-c:a", "libmp3lame", "-b:a", "192k", "/s/output.x",
            ]
        );
    }

    #[test]
    fn test_lossless_args_skip_bitrate() {
        let args = args_as_strings(&AudioSettings::new(AudioFormat::Flac, 192));
        assert!(args.windows(2).any(|w| w == ["-c:a", "flac"]));
        assert!(!args.contains(&"-b:a".to_string()));

        let args = args_as_strings(&AudioSettings::new(AudioFormat::Wav, 192));
        assert!(args.contains(&"pcm_s16le".to_string()));
        assert!(!args.contains(&"-b:a".to_string()));
    }

    #[test]
    fn test_resample_and_downmix_args() {
        let settings = AudioSettings::new(AudioFormat::Opus, 64)
            .with_sample_rate(48000)
            .with_channels(1);
        let args = args_as_strings(&settings);
        assert!(args.windows(2).any(|w| w == ["-c:a", "libopus"]));
        assert!(args.windows(2).any(|w| w == ["-b:a", "64k"]));
        assert!(args.windows(2).any(|w| w == ["-ar", "48000"]));
        assert!(args.windows(2).any(|w| w == ["-ac", "1"]));
        assert_eq!(args.last().unwrap(), "/s/output.x");
    }

    #[test]
    fn test_every_format_names_a_codec() {
        for format in AudioFormat::ALL {
            let args = args_as_strings(&AudioSettings::new(format, 128));
            assert!(args.contains(&"-c:a".to_string()), "{:?} has no codec", format);
        }
    }

    #[test]
    fn test_missing_engine_is_not_ready() {
        let transcoder = FfmpegTranscoder::new("/nonexistent/ffmpeg-binary");
        assert!(!transcoder.is_ready());
        // Cached answer
        assert!(!transcoder.is_ready());
    }

    #[test]
    fn test_missing_engine_transform_fails_cleanly() {
        let transcoder = FfmpegTranscoder::new("/nonexistent/ffmpeg-binary");
        let source = SourceFile::from_bytes("a.wav", "audio/wav", b"RIFF....WAVE".to_vec());
        let result = transcoder.transform(&source, &AudioSettings::default());
        assert!(matches!(result, Err(SqueezeError::Transcode(_))));
    }
}
