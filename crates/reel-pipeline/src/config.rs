//! Pipeline configuration.

use std::time::Duration;

use reel_media::{captions::DEFAULT_MAX_CAPTION_CHARS, OutputFormat, SegmentEncoding};
use reel_models::RequestLimits;

/// Pipeline configuration.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Maximum simultaneously in-flight scene generations.
    pub concurrency: usize,
    /// Attempts per external call (including the first).
    pub retry_attempts: u32,
    /// Base delay for exponential retry backoff.
    pub retry_initial_delay: Duration,
    /// Minimum spacing between consecutive calls to the rate-limited
    /// visual backend.
    pub throttle_spacing: Duration,
    /// Deadline for one external generation call, retries included.
    /// Throttle queue waits and retry backoff sleeps count against this
    /// deadline, so it must exceed the worst-case wait for a throttle
    /// slot (`throttle_spacing` times the number of queued callers).
    pub call_timeout: Duration,
    /// Deadline for rendering a single segment.
    pub render_timeout: Duration,
    /// Deadline for the whole concatenation step, distinct from per-call
    /// timeouts.
    pub concat_timeout: Duration,
    /// Default voice selector for narration synthesis.
    pub default_voice: String,
    /// Request validation limits.
    pub limits: RequestLimits,
    /// Output resolution and overlay layout.
    pub output: OutputFormat,
    /// Segment encoding settings (identical across segments so concat can
    /// stream-copy).
    pub encoding: SegmentEncoding,
    /// Maximum characters per caption segment.
    pub max_caption_chars: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            concurrency: 3,
            retry_attempts: 3,
            retry_initial_delay: Duration::from_millis(1000),
            throttle_spacing: Duration::from_secs(10),
            call_timeout: Duration::from_secs(120),
            render_timeout: Duration::from_secs(180),
            concat_timeout: Duration::from_secs(120),
            default_voice: "narrator".to_string(),
            limits: RequestLimits::default(),
            output: OutputFormat::default(),
            encoding: SegmentEncoding::default(),
            max_caption_chars: DEFAULT_MAX_CAPTION_CHARS,
        }
    }
}

impl PipelineConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            concurrency: std::env::var("REEL_CONCURRENCY")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.concurrency),
            retry_attempts: std::env::var("REEL_RETRY_ATTEMPTS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.retry_attempts),
            retry_initial_delay: Duration::from_millis(
                std::env::var("REEL_RETRY_INITIAL_MS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(1000),
            ),
            throttle_spacing: Duration::from_secs(
                std::env::var("REEL_THROTTLE_SPACING_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(10),
            ),
            call_timeout: Duration::from_secs(
                std::env::var("REEL_CALL_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(120),
            ),
            render_timeout: Duration::from_secs(
                std::env::var("REEL_RENDER_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(180),
            ),
            concat_timeout: Duration::from_secs(
                std::env::var("REEL_CONCAT_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(120),
            ),
            default_voice: std::env::var("REEL_DEFAULT_VOICE")
                .unwrap_or(defaults.default_voice),
            limits: RequestLimits::from_env(),
            output: defaults.output,
            encoding: defaults.encoding,
            max_caption_chars: std::env::var("REEL_MAX_CAPTION_CHARS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_caption_chars),
        }
    }
}
