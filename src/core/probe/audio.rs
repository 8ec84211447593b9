use serde::Deserialize;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use std::process::Command;
use crate::core::probe::MetadataProber;
use crate::models::{AudioMetadata, MediaMetadata, SourceFile, SqueezeError};

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    format: Option<FfprobeFormat>,
    streams: Option<Vec<FfprobeStream>>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
    bit_rate: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: Option<String>,
    codec_name: Option<String>,
    sample_rate: Option<String>,
    channels: Option<u32>,
}

/// Audio metadata via the `ffprobe` executable
pub struct FfprobeProber {
    ffprobe_path: PathBuf,
}

impl FfprobeProber {
    pub fn new(ffprobe_path: impl Into<PathBuf>) -> Self {
        Self {
            ffprobe_path: ffprobe_path.into(),
        }
    }

    /// Interpret `ffprobe -show_format -show_streams -of json` output
    ///
    /// Falls back to a size/duration bitrate estimate when the container has none.
    pub fn parse_output(json: &[u8], file_size: u64) -> Result<AudioMetadata, SqueezeError> {
        let output: FfprobeOutput = serde_json::from_slice(json)
            .map_err(|e| SqueezeError::Probe(format!("Failed to parse ffprobe output: {}", e)))?;

        let duration_secs = output
            .format
            .as_ref()
            .and_then(|f| f.duration.as_deref())
            .and_then(|d| d.parse::<f64>().ok())
            .filter(|d| d.is_finite() && *d > 0.0);

        let bitrate_kbps = output
            .format
            .as_ref()
            .and_then(|f| f.bit_rate.as_deref())
            .and_then(|b| b.parse::<u64>().ok())
            .map(|bps| ((bps + 500) / 1000) as u32)
            .or_else(|| {
                duration_secs.and_then(|d| AudioMetadata::estimate_bitrate_kbps(file_size, d))
            });

        let audio_stream = output.streams.and_then(|streams| {
            streams
                .into_iter()
                .find(|s| s.codec_type.as_deref() == Some("audio"))
        });

        if audio_stream.is_none() && duration_secs.is_none() {
            return Err(SqueezeError::Probe("No audio stream found".to_string()));
        }

        Ok(AudioMetadata {
            duration_secs,
            bitrate_kbps,
            channels: audio_stream.as_ref().and_then(|s| s.channels),
            sample_rate: audio_stream
                .as_ref()
                .and_then(|s| s.sample_rate.as_deref())
                .and_then(|r| r.parse::<u32>().ok()),
            codec: audio_stream.and_then(|s| s.codec_name),
        })
    }
}

/// Path handed to ffprobe
///
/// Disk files are probed in place. In-memory payloads are written to a temp
/// file that is removed when this is dropped.
enum ProbeInput<'a> {
    InPlace(&'a Path),
    Temp(NamedTempFile),
}

impl<'a> ProbeInput<'a> {
    fn for_source(source: &'a SourceFile) -> Result<Self, SqueezeError> {
        if let Some(path) = source.path() {
            return Ok(ProbeInput::InPlace(path));
        }

        let suffix = source.extension().map(|e| format!(".{}", e)).unwrap_or_default();
        let temp_file = tempfile::Builder::new()
            .prefix("squeeze_probe_")
            .suffix(&suffix)
            .tempfile()?;
        source.write_to(temp_file.path())?;
        Ok(ProbeInput::Temp(temp_file))
    }

    fn path(&self) -> &Path {
        match self {
            ProbeInput::InPlace(path) => path,
            ProbeInput::Temp(file) => file.path(),
        }
    }
}

impl MetadataProber for FfprobeProber {
    #[tracing::instrument(skip(self, source), fields(file = source.name()))]
    fn probe(&self, source: &SourceFile) -> Result<MediaMetadata, SqueezeError> {
        let input = ProbeInput::for_source(source)?;

        let output = Command::new(&self.ffprobe_path)
            .args(["-v", "error", "-show_format", "-show_streams", "-of", "json"])
            .arg(input.path())
            .output()
            .map_err(|e| SqueezeError::Probe(format!("Failed to run ffprobe: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SqueezeError::Probe(format!("ffprobe failed: {}", stderr.trim())));
        }

        let metadata = Self::parse_output(&output.stdout, source.size())?;
        tracing::debug!(
            duration = ?metadata.duration_secs,
            bitrate = ?metadata.bitrate_kbps,
            "probed audio"
        );
        Ok(MediaMetadata::Audio(metadata))
    }
}
