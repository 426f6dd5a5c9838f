//! FFmpeg video filter construction for scene segments.
//!
//! A segment's filter chain is, in order: uniform scale-and-letterbox to
//! the output resolution, fade-in at t=0, fade-out ending exactly at the
//! effective duration, and one time-windowed drawtext clause per caption
//! segment.

use crate::captions::CaptionSegment;

/// Fixed output format for rendered segments.
#[derive(Debug, Clone)]
pub struct OutputFormat {
    /// Output width in pixels.
    pub width: u32,
    /// Output height in pixels.
    pub height: u32,
    /// Fade-in/fade-out length in seconds.
    pub fade_secs: f64,
    /// Caption font size in pixels.
    pub font_size: u32,
    /// Caption baseline offset from the bottom edge, in pixels.
    pub caption_margin: u32,
}

impl Default for OutputFormat {
    fn default() -> Self {
        Self {
            width: 1080,
            height: 1920,
            fade_secs: 0.5,
            font_size: 54,
            caption_margin: 240,
        }
    }
}

/// Scale to fit and pad to the exact output resolution.
pub fn letterbox_filter(format: &OutputFormat) -> String {
    format!(
        "scale={w}:{h}:force_original_aspect_ratio=decrease,pad={w}:{h}:(ow-iw)/2:(oh-ih)/2",
        w = format.width,
        h = format.height
    )
}

/// Fade-in at t=0 and fade-out ending exactly at `duration`.
pub fn fade_filters(duration: f64, fade_secs: f64) -> String {
    let fade = fade_secs.min(duration / 2.0);
    format!(
        "fade=t=in:st=0:d={fade:.3},fade=t=out:st={out_start:.3}:d={fade:.3}",
        fade = fade,
        out_start = (duration - fade).max(0.0),
    )
}

/// One drawtext clause, visible only within the segment's [start, end) window.
pub fn drawtext_clause(segment: &CaptionSegment, format: &OutputFormat) -> String {
    format!(
        "drawtext=text='{text}':fontcolor=white:fontsize={size}:borderw=2:bordercolor=black:\
         x=(w-text_w)/2:y=h-{margin}:enable='between(t,{start:.3},{end:.3})'",
        text = segment.text,
        size = format.font_size,
        margin = format.caption_margin,
        start = segment.start,
        end = segment.end,
    )
}

/// Full filter chain for one segment.
///
/// `captions` may be empty, in which case only letterbox and fades are
/// applied (the no-captions fallback renders this way).
pub fn build_segment_filter(
    duration: f64,
    captions: &[CaptionSegment],
    format: &OutputFormat,
) -> String {
    let mut parts = vec![letterbox_filter(format), fade_filters(duration, format.fade_secs)];
    parts.extend(captions.iter().map(|s| drawtext_clause(s, format)));
    parts.join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_letterbox_filter() {
        let filter = letterbox_filter(&OutputFormat::default());
        assert!(filter.contains("scale=1080:1920"));
        assert!(filter.contains("pad=1080:1920"));
        assert!(filter.contains("force_original_aspect_ratio=decrease"));
    }

    #[test]
    fn test_fade_out_ends_at_duration() {
        let filter = fade_filters(6.0, 0.5);
        assert!(filter.contains("fade=t=in:st=0:d=0.500"));
        assert!(filter.contains("fade=t=out:st=5.500:d=0.500"));
    }

    #[test]
    fn test_fade_clamped_for_short_scene() {
        // Fade never exceeds half the scene, so in and out cannot overlap
        let filter = fade_filters(0.6, 0.5);
        assert!(filter.contains("d=0.300"));
    }

    #[test]
    fn test_drawtext_clause_window() {
        let segment = CaptionSegment {
            text: "Check the horn.".to_string(),
            start: 0.0,
            end: 6.0,
        };
        let clause = drawtext_clause(&segment, &OutputFormat::default());
        assert!(clause.contains("text='Check the horn.'"));
        assert!(clause.contains("enable='between(t,0.000,6.000)'"));
    }

    #[test]
    fn test_build_segment_filter_with_captions() {
        let captions = vec![
            CaptionSegment {
                text: "one".to_string(),
                start: 0.0,
                end: 3.0,
            },
            CaptionSegment {
                text: "two".to_string(),
                start: 3.0,
                end: 9.0,
            },
        ];
        let filter = build_segment_filter(9.0, &captions, &OutputFormat::default());
        assert_eq!(filter.matches("drawtext").count(), 2);
        assert!(filter.contains("between(t,3.000,9.000)"));
    }

    #[test]
    fn test_build_segment_filter_without_captions() {
        let filter = build_segment_filter(6.0, &[], &OutputFormat::default());
        assert!(!filter.contains("drawtext"));
        assert!(filter.contains("fade=t=out"));
    }
}
