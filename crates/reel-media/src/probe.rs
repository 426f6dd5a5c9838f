//! FFprobe media information.
//!
//! Used to discover the real duration of generated narration audio and of
//! looping visual clips.

use serde::Deserialize;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

use crate::error::{MediaError, MediaResult};

/// Media file information.
#[derive(Debug, Clone)]
pub struct MediaInfo {
    /// Duration in seconds
    pub duration: f64,
    /// Width in pixels (0 for audio-only files)
    pub width: u32,
    /// Height in pixels (0 for audio-only files)
    pub height: u32,
    /// Codec of the first stream
    pub codec: String,
    /// Whether the file carries an audio stream
    pub has_audio: bool,
}

/// FFprobe JSON output format.
#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    format: FfprobeFormat,
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: String,
    codec_name: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    duration: Option<String>,
}

/// Probe a media file for information.
pub async fn probe_media(path: impl AsRef<Path>) -> MediaResult<MediaInfo> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(MediaError::FileNotFound(path.to_path_buf()));
    }

    which::which("ffprobe").map_err(|_| MediaError::FfprobeNotFound)?;

    let output = Command::new("ffprobe")
        .args([
            "-v",
            "quiet",
            "-print_format",
            "json",
            "-show_format",
            "-show_streams",
        ])
        .arg(path)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await?;

    if !output.status.success() {
        return Err(MediaError::FfprobeFailed {
            message: "FFprobe failed".to_string(),
            stderr: Some(String::from_utf8_lossy(&output.stderr).to_string()),
        });
    }

    let probe: FfprobeOutput = serde_json::from_slice(&output.stdout)?;
    parse_probe(probe)
}

/// Get media duration in seconds.
pub async fn get_duration(path: impl AsRef<Path>) -> MediaResult<f64> {
    let info = probe_media(path).await?;
    Ok(info.duration)
}

fn parse_probe(probe: FfprobeOutput) -> MediaResult<MediaInfo> {
    let video_stream = probe.streams.iter().find(|s| s.codec_type == "video");
    let audio_stream = probe.streams.iter().find(|s| s.codec_type == "audio");

    let first = probe
        .streams
        .first()
        .ok_or_else(|| MediaError::invalid_media("no streams found"))?;

    // Container duration, falling back to the first stream's own field
    let duration = probe
        .format
        .duration
        .as_deref()
        .or(first.duration.as_deref())
        .and_then(|d| d.parse::<f64>().ok())
        .unwrap_or(0.0);

    Ok(MediaInfo {
        duration,
        width: video_stream.and_then(|s| s.width).unwrap_or(0),
        height: video_stream.and_then(|s| s.height).unwrap_or(0),
        codec: first.codec_name.clone().unwrap_or_default(),
        has_audio: audio_stream.is_some(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_probe_audio_only() {
        let probe: FfprobeOutput = serde_json::from_str(
            r#"{
                "format": {"duration": "6.520"},
                "streams": [{"codec_type": "audio", "codec_name": "mp3"}]
            }"#,
        )
        .unwrap();

        let info = parse_probe(probe).unwrap();
        assert!((info.duration - 6.52).abs() < 0.001);
        assert_eq!(info.width, 0);
        assert!(info.has_audio);
    }

    #[test]
    fn test_parse_probe_video() {
        let probe: FfprobeOutput = serde_json::from_str(
            r#"{
                "format": {"duration": "4.0"},
                "streams": [
                    {"codec_type": "video", "codec_name": "h264", "width": 1080, "height": 1920}
                ]
            }"#,
        )
        .unwrap();

        let info = parse_probe(probe).unwrap();
        assert_eq!(info.width, 1080);
        assert_eq!(info.height, 1920);
        assert!(!info.has_audio);
    }

    #[test]
    fn test_parse_probe_stream_duration_fallback() {
        let probe: FfprobeOutput = serde_json::from_str(
            r#"{
                "format": {},
                "streams": [{"codec_type": "audio", "codec_name": "aac", "duration": "2.5"}]
            }"#,
        )
        .unwrap();

        let info = parse_probe(probe).unwrap();
        assert!((info.duration - 2.5).abs() < 0.001);
    }

    #[test]
    fn test_parse_probe_no_streams() {
        let probe: FfprobeOutput =
            serde_json::from_str(r#"{"format": {}, "streams": []}"#).unwrap();
        assert!(parse_probe(probe).is_err());
    }
}
