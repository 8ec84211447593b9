use serde::Serialize;
use std::fmt;
use crate::models::{FileId, MediaKind, QueueLimits, SourceFile, SqueezeError};
use crate::utils::format::format_size;

pub const AUDIO_MIME_TYPES: &[&str] = &[
    "audio/mpeg",
    "audio/mp3",
    "audio/wav",
    "audio/x-wav",
    "audio/wave",
    "audio/flac",
    "audio/x-flac",
    "audio/aac",
    "audio/ogg",
    "audio/opus",
    "audio/mp4",
    "audio/x-m4a",
    "audio/webm",
    "audio/aiff",
    "audio/x-aiff",
    "audio/x-ms-wma",
];

pub const AUDIO_EXTENSIONS: &[&str] = &[
    "mp3", "wav", "flac", "aac", "ogg", "oga", "opus", "m4a", "webm", "aiff", "aif", "wma",
];

pub const IMAGE_MIME_TYPES: &[&str] = &[
    "image/jpeg",
    "image/png",
    "image/webp",
    "image/gif",
    "image/bmp",
    "image/tiff",
];

pub const IMAGE_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "webp", "gif", "bmp", "tif", "tiff",
];

/// Why a file was turned away at intake
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum RejectReason {
    UnsupportedType,
    TooLarge,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Rejection {
    pub name: String,
    pub reason: RejectReason,
}

/// The single message shown after an intake
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum IntakeBanner {
    #[serde(rename_all = "camelCase")]
    SizeLimit { file_name: String, limit: String },
    NoValidFiles { kind: MediaKind },
}

impl fmt::Display for IntakeBanner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntakeBanner::SizeLimit { file_name, limit } => {
                write!(f, "{} is too large. Maximum file size is {}.", file_name, limit)
            }
            IntakeBanner::NoValidFiles { kind } => {
                write!(f, "No valid {} files were selected.", kind)
            }
        }
    }
}

/// Result of validating one batch of candidates
#[derive(Debug)]
pub struct Screening {
    /// Admissible files, in input order
    pub accepted: Vec<SourceFile>,
    pub rejected: Vec<Rejection>,
    pub banner: Option<IntakeBanner>,
}

/// What `add_files` reports back to the caller
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IntakeReport {
    pub accepted: Vec<FileId>,
    pub rejected: Vec<Rejection>,
    pub banner: Option<IntakeBanner>,
}

/// Type and size gate for one media family
#[derive(Debug, Clone)]
pub struct IntakeValidator {
    kind: MediaKind,
    max_bytes: u64,
    mime_types: &'static [&'static str],
    extensions: &'static [&'static str],
}

impl IntakeValidator {
    pub fn new(kind: MediaKind, limits: &QueueLimits) -> Self {
        match kind {
            MediaKind::Audio => Self {
                kind,
                max_bytes: limits.max_audio_bytes,
                mime_types: AUDIO_MIME_TYPES,
                extensions: AUDIO_EXTENSIONS,
            },
            MediaKind::Image => Self {
                kind,
                max_bytes: limits.max_image_bytes,
                mime_types: IMAGE_MIME_TYPES,
                extensions: IMAGE_EXTENSIONS,
            },
        }
    }

    pub fn kind(&self) -> MediaKind {
        self.kind
    }

    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    /// Declared media type OR extension is on the allow-list
    pub fn is_supported_type(&self, source: &SourceFile) -> bool {
        let mime = source
            .mime_type()
            .split(';')
            .next()
            .unwrap_or("")
            .trim()
            .to_ascii_lowercase();
        if self.mime_types.contains(&mime.as_str()) {
            return true;
        }

        source
            .extension()
            .map(|ext| self.extensions.contains(&ext.as_str()))
            .unwrap_or(false)
    }

    /// A file exactly at the ceiling is allowed
    pub fn is_within_limit(&self, size: u64) -> bool {
        size <= self.max_bytes
    }

    /// Check a single file
    pub fn check(&self, source: &SourceFile) -> Result<(), SqueezeError> {
        if !self.is_supported_type(source) {
            return Err(SqueezeError::UnsupportedType(format!(
                "{} is not a supported {} file",
                source.name(),
                self.kind
            )));
        }
        if !self.is_within_limit(source.size()) {
            return Err(SqueezeError::FileTooLarge {
                name: source.name().to_string(),
                limit: format_size(self.max_bytes),
            });
        }
        Ok(())
    }

    /// Split a batch into admissible files and rejections
    ///
    /// The banner names the first oversized file; when nothing in a non-empty
    /// batch has a supported type it reports "no valid files" instead.
    pub fn screen(&self, files: Vec<SourceFile>) -> Screening {
        let had_input = !files.is_empty();
        let mut accepted = Vec::with_capacity(files.len());
        let mut rejected = Vec::new();
        let mut banner = None;
        let mut type_matches = 0usize;

        for file in files {
            if !self.is_supported_type(&file) {
                rejected.push(Rejection {
                    name: file.name().to_string(),
                    reason: RejectReason::UnsupportedType,
                });
                continue;
            }
            type_matches += 1;

            if !self.is_within_limit(file.size()) {
                if banner.is_none() {
                    banner = Some(IntakeBanner::SizeLimit {
                        file_name: file.name().to_string(),
                        limit: format_size(self.max_bytes),
                    });
                }
                rejected.push(Rejection {
                    name: file.name().to_string(),
                    reason: RejectReason::TooLarge,
                });
                continue;
            }

            accepted.push(file);
        }

        if had_input && type_matches == 0 {
            banner = Some(IntakeBanner::NoValidFiles { kind: self.kind });
        }

        Screening {
            accepted,
            rejected,
            banner,
        }
    }
}
