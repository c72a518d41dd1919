//! Segment quality index builder.
//!
//! This crate provides:
//! - Video discovery in an input folder
//! - Layered configuration (defaults, `VSCORE_*` environment, CLI flags)
//! - Parallel per-segment decoding and scoring
//! - Index assembly and JSON output
//! - Structured per-video logging and run metrics

pub mod config;
pub mod discovery;
pub mod error;
pub mod indexer;
pub mod logging;
pub mod metrics;

pub use config::{ExtractorKind, IndexerConfig};
pub use discovery::{discover_videos, is_video_file, VIDEO_EXTENSIONS};
pub use error::{IndexerError, IndexerResult};
pub use indexer::{write_index, IndexedVideo, VideoIndexer};
pub use logging::VideoLogger;
