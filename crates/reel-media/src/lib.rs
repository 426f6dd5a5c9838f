#![deny(unreachable_patterns)]
//! FFmpeg CLI wrapper for scene-to-video assembly.
//!
//! This crate provides:
//! - Type-safe FFmpeg command building with multi-input support
//! - Caption segmentation with word-count-proportional timing
//! - Per-scene segment rendering with an automatic no-captions fallback
//! - Lossless concat-demuxer concatenation
//! - Ephemeral per-request workspace lifecycle

pub mod captions;
pub mod command;
pub mod concat;
pub mod error;
pub mod filters;
pub mod probe;
pub mod segment;
pub mod workspace;

pub use captions::{segment_narration, CaptionSegment, DEFAULT_MAX_CAPTION_CHARS};
pub use command::{check_ffmpeg, check_ffprobe, CommandRunner, FfmpegCommand, FfmpegRunner};
pub use concat::{concat_segments, write_manifest};
pub use error::{MediaError, MediaResult};
pub use filters::OutputFormat;
pub use probe::{get_duration, probe_media, MediaInfo};
pub use segment::{render_segment, RenderPass, SegmentEncoding, SegmentSpec};
pub use workspace::Workspace;
