use std::io::{BufRead, Cursor, Seek};
use ::image::ImageReader;
use crate::core::probe::MetadataProber;
use crate::models::{ImageMetadata, MediaMetadata, SourceFile, SqueezeError};

/// Image dimensions read from the file header, without decoding pixels
#[derive(Debug, Default, Clone, Copy)]
pub struct ImageProber;

impl ImageProber {
    pub fn new() -> Self {
        Self
    }

    pub fn dimensions(data: &[u8]) -> Result<(u32, u32), SqueezeError> {
        Self::header_dimensions(ImageReader::new(Cursor::new(data)))
    }

    fn header_dimensions<R: BufRead + Seek>(
        reader: ImageReader<R>,
    ) -> Result<(u32, u32), SqueezeError> {
        reader
            .with_guessed_format()
            .map_err(|e| SqueezeError::Probe(format!("Failed to read image header: {}", e)))?
            .into_dimensions()
            .map_err(|e| SqueezeError::Probe(format!("Failed to read image dimensions: {}", e)))
    }
}

impl MetadataProber for ImageProber {
    fn probe(&self, source: &SourceFile) -> Result<MediaMetadata, SqueezeError> {
        // Disk files are read only as far as the header
        let (width, height) = match source.path() {
            Some(path) => Self::header_dimensions(ImageReader::open(path)?)?,
            None => Self::dimensions(&source.read()?)?,
        };
        Ok(MediaMetadata::Image(ImageMetadata { width, height }))
    }
}
