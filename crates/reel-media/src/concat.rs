//! Lossless segment concatenation.
//!
//! Segments are joined with ffmpeg's concat demuxer under stream copy, so
//! no re-encode happens at this stage. The whole step runs under its own
//! deadline, distinct from per-call timeouts; expiry is fatal for the
//! request.

use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::info;

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::MediaResult;

/// Build the concat-demuxer manifest: one quoted absolute path per line.
pub fn manifest_contents(segments: &[PathBuf]) -> String {
    let mut out = String::new();
    for path in segments {
        // Single quotes inside the path use the concat demuxer's '\''
        // quoting form.
        let quoted = path.to_string_lossy().replace('\'', "'\\''");
        out.push_str(&format!("file '{}'\n", quoted));
    }
    out
}

/// Write the manifest file referencing the ordered segments.
pub async fn write_manifest(manifest_path: &Path, segments: &[PathBuf]) -> MediaResult<()> {
    fs::write(manifest_path, manifest_contents(segments)).await?;
    Ok(())
}

/// Concatenate the manifest's segments into `output` with stream copy.
///
/// `deadline_secs` bounds the entire concatenation; on expiry the
/// subprocess is killed and a timeout error is returned.
pub async fn concat_segments(
    manifest_path: &Path,
    output: &Path,
    deadline_secs: u64,
) -> MediaResult<()> {
    let cmd = FfmpegCommand::new(output)
        .input_with_args(["-f", "concat", "-safe", "0"], manifest_path)
        .codec_copy();

    FfmpegRunner::new()
        .with_timeout(deadline_secs)
        .run(&cmd)
        .await?;

    info!(output = %output.display(), "Concatenated segments");
    Ok(())
}
