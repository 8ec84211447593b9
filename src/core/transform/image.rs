use std::io::Cursor;
use ::image::codecs::jpeg::JpegEncoder;
use ::image::codecs::png::{CompressionType, FilterType as PngFilter, PngEncoder};
use ::image::imageops::FilterType;
use ::image::{DynamicImage, GenericImageView};
use crate::core::transform::MediaTransform;
use crate::models::{ImageFormat, ImageSettings, MediaKind, SourceFile, SqueezeError};

/// In-process image re-encoding with optional downscale
#[derive(Debug, Default, Clone, Copy)]
pub struct ImageEncoder;

impl ImageEncoder {
    pub fn new() -> Self {
        Self
    }

    /// Target size when capping the width, preserving aspect ratio
    ///
    /// Images already narrower than `max_width` keep their size.
    pub fn fit_width(width: u32, height: u32, max_width: Option<u32>) -> (u32, u32) {
        match max_width {
            Some(max) if width > max => {
                let scaled = (height as f64 * max as f64 / width as f64).round() as u32;
                (max, scaled.max(1))
            }
            _ => (width, height),
        }
    }

    /// Downscale if needed, then encode
    pub fn encode(
        &self,
        img: DynamicImage,
        settings: &ImageSettings,
    ) -> Result<Vec<u8>, SqueezeError> {
        let (width, height) = img.dimensions();
        let (target_w, target_h) = Self::fit_width(width, height, settings.max_width);
        let img = if (target_w, target_h) != (width, height) {
            img.resize_exact(target_w, target_h, FilterType::Lanczos3)
        } else {
            img
        };

        let mut buf = Cursor::new(Vec::new());
        let written = match settings.format {
            ImageFormat::Jpeg => {
                // JPEG has no alpha channel
                let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
                let encoder = JpegEncoder::new_with_quality(&mut buf, settings.jpeg_quality());
                rgb.write_with_encoder(encoder)
            }
            ImageFormat::Png => img.write_with_encoder(PngEncoder::new_with_quality(
                &mut buf,
                CompressionType::Best,
                PngFilter::Adaptive,
            )),
            ImageFormat::Webp => return Ok(Self::encode_webp(&img, settings.quality)),
        };
        written.map_err(|e| SqueezeError::ImageProcessing(
            format!("Failed to encode {:?}: {}", settings.format, e)
        ))?;

        Ok(buf.into_inner())
    }

    /// Lossy WebP through libwebp; the `image` crate only writes lossless WebP
    fn encode_webp(img: &DynamicImage, quality: f32) -> Vec<u8> {
        let (width, height) = img.dimensions();
        let rgba = img.to_rgba8();
        let encoded = webp::Encoder::from_rgba(&rgba, width, height).encode(quality * 100.0);
        encoded.to_vec()
    }
}

impl MediaTransform for ImageEncoder {
    type Settings = ImageSettings;

    fn kind(&self) -> MediaKind {
        MediaKind::Image
    }

    fn is_ready(&self) -> bool {
        true
    }

    fn transform(
        &self,
        source: &SourceFile,
        settings: &ImageSettings,
    ) -> Result<Vec<u8>, SqueezeError> {
        let data = source.read()?;
        let img = ::image::load_from_memory(&data).map_err(|e| SqueezeError::ImageProcessing(
            format!("Failed to decode {}: {}", source.name(), e)
        ))?;
        self.encode(img, settings)
    }
}
