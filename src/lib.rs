//! Session state for a batch media compressor.
//!
//! A [`CompressorSession`] owns an ordered queue of audio or image files,
//! validates them at intake, probes their metadata in the background,
//! compresses pending files one at a time through a [`MediaTransform`] and
//! exposes size statistics and downloads of the results.

// Module declarations
pub mod models;
pub mod core;
pub mod commands;
pub mod utils;

pub use commands::{AudioSession, CompressorSession, ImageSession};
pub use crate::core::export::{CompressionStats, DirectorySink, Download, DownloadSink};
pub use crate::core::intake::{IntakeBanner, IntakeReport, RejectReason, Rejection};
pub use crate::core::probe::MetadataProber;
pub use crate::core::processor::{BatchOutcome, BatchSummary, SettingsHandle};
pub use crate::core::transform::MediaTransform;
pub use models::*;
pub use utils::progress::{BatchEvent, ChannelListener, ProgressListener};
