// Metadata probes: display-only properties read from a file before compression

pub mod audio;
pub mod image;

use crate::models::{MediaMetadata, SourceFile, SqueezeError};

pub use self::audio::FfprobeProber;
pub use self::image::ImageProber;

/// Reads intrinsic properties of a file
///
/// Runs on the probe pool, so implementations must be shareable across threads.
/// A failed probe never affects whether the file can be compressed.
pub trait MetadataProber: Send + Sync {
    fn probe(&self, source: &SourceFile) -> Result<MediaMetadata, SqueezeError>;
}
