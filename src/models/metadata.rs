use serde::{Deserialize, Serialize};

/// Display-only properties of an audio file
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AudioMetadata {
    pub duration_secs: Option<f64>,
    /// Container bitrate, or estimated from size and duration
    pub bitrate_kbps: Option<u32>,
    pub channels: Option<u32>,
    pub sample_rate: Option<u32>,
    pub codec: Option<String>,
}

impl AudioMetadata {
    /// Average bitrate implied by the file size over its duration
    pub fn estimate_bitrate_kbps(size_bytes: u64, duration_secs: f64) -> Option<u32> {
        if !duration_secs.is_finite() || duration_secs <= 0.0 {
            return None;
        }
        Some(((size_bytes as f64 * 8.0) / duration_secs / 1000.0).round() as u32)
    }
}

/// Display-only properties of an image
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ImageMetadata {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum MediaMetadata {
    Audio(AudioMetadata),
    Image(ImageMetadata),
}
