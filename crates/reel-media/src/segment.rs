//! Per-scene segment rendering.
//!
//! Renders one scene's visual and narration assets into a fixed-duration
//! segment. The captioned render is attempted first; if it fails, the
//! same segment is re-rendered without captions before any error reaches
//! the caller. This is the one place in the pipeline where a failure is
//! recovered locally rather than propagated.

use std::path::Path;
use tracing::{info, warn};

use crate::captions::CaptionSegment;
use crate::command::{CommandRunner, FfmpegCommand};
use crate::error::{MediaError, MediaResult};
use crate::filters::{build_segment_filter, OutputFormat};

/// Encoding settings for segment rendering.
///
/// Segments are concatenated with stream copy, so every segment must use
/// identical settings.
#[derive(Debug, Clone)]
pub struct SegmentEncoding {
    pub video_codec: String,
    pub preset: String,
    pub crf: u8,
    pub pix_fmt: String,
    pub audio_codec: String,
    pub audio_bitrate: String,
}

impl Default for SegmentEncoding {
    fn default() -> Self {
        Self {
            video_codec: "libx264".to_string(),
            preset: "veryfast".to_string(),
            crf: 23,
            pix_fmt: "yuv420p".to_string(),
            audio_codec: "aac".to_string(),
            audio_bitrate: "192k".to_string(),
        }
    }
}

/// Inputs for rendering one segment.
#[derive(Debug)]
pub struct SegmentSpec<'a> {
    /// Scene position, for logging only.
    pub scene_index: usize,
    /// Path to the visual payload file.
    pub visual_path: &'a Path,
    /// Still image (held static) vs video clip (looped then truncated).
    pub is_image: bool,
    /// Path to the narration audio file.
    pub audio_path: &'a Path,
    /// Effective duration in seconds.
    pub duration_secs: f64,
    /// Timed caption segments; empty disables the overlay.
    pub captions: &'a [CaptionSegment],
}

/// Which render pass produced the segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderPass {
    WithCaptions,
    WithoutCaptions,
}

impl RenderPass {
    /// Ordered passes for a render attempt. The captionless pass is the
    /// automatic fallback when the captioned pass fails.
    fn sequence(captions_requested: bool) -> &'static [RenderPass] {
        if captions_requested {
            &[RenderPass::WithCaptions, RenderPass::WithoutCaptions]
        } else {
            &[RenderPass::WithoutCaptions]
        }
    }
}

/// Render one scene's assets into a segment file.
///
/// Returns the pass that succeeded. An error is returned only if the
/// captionless fallback also fails (the captioned pass's error is the one
/// surfaced, as the root cause), or on cancellation/timeout, which are
/// never retried locally.
pub async fn render_segment(
    spec: &SegmentSpec<'_>,
    output: &Path,
    format: &OutputFormat,
    encoding: &SegmentEncoding,
    runner: &dyn CommandRunner,
) -> MediaResult<RenderPass> {
    let captions_requested = !spec.captions.is_empty();
    let passes = RenderPass::sequence(captions_requested);

    let mut last_err = None;
    for &pass in passes {
        let captions = match pass {
            RenderPass::WithCaptions => spec.captions,
            RenderPass::WithoutCaptions => &[],
        };
        let cmd = build_segment_command(spec, captions, output, format, encoding);

        match runner.run(&cmd).await {
            Ok(()) => {
                info!(
                    scene_index = spec.scene_index,
                    pass = ?pass,
                    duration = spec.duration_secs,
                    "Rendered segment"
                );
                return Ok(pass);
            }
            Err(e @ (MediaError::Cancelled | MediaError::Timeout(_))) => return Err(e),
            Err(e) => {
                if pass == RenderPass::WithCaptions {
                    warn!(
                        scene_index = spec.scene_index,
                        error = %e,
                        "Captioned render failed, retrying without captions"
                    );
                }
                // First failure is the root cause; keep it over later ones
                last_err.get_or_insert(e);
            }
        }
    }

    Err(last_err.unwrap_or_else(|| {
        MediaError::ffmpeg_failed("segment render produced no result", None, None)
    }))
}

/// Build the ffmpeg command for one render pass.
fn build_segment_command(
    spec: &SegmentSpec<'_>,
    captions: &[CaptionSegment],
    output: &Path,
    format: &OutputFormat,
    encoding: &SegmentEncoding,
) -> FfmpegCommand {
    let filter = build_segment_filter(spec.duration_secs, captions, format);

    let mut cmd = FfmpegCommand::new(output);
    cmd = if spec.is_image {
        // A still image is held for the full duration
        cmd.input_with_args(["-loop", "1"], spec.visual_path)
    } else {
        // A clip loops to cover the duration, then is truncated below
        cmd.input_with_args(["-stream_loop", "-1"], spec.visual_path)
    };
    cmd = cmd
        .input(spec.audio_path)
        .filter_complex(format!("[0:v]{}[v]", filter))
        .map("[v]")
        .map("1:a")
        .duration(spec.duration_secs)
        .video_codec(&encoding.video_codec)
        .preset(&encoding.preset)
        .crf(encoding.crf)
        .pix_fmt(&encoding.pix_fmt)
        .audio_codec(&encoding.audio_codec)
        .audio_bitrate(&encoding.audio_bitrate);

    if !spec.is_image {
        // Looping clip: stop at the lesser of duration and audio length
        cmd = cmd.shortest();
    }

    cmd
}
