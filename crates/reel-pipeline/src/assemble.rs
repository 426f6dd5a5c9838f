//! Assembly of scene assets into the final output video.
//!
//! Validates the request before touching storage, renders one segment per
//! scene in index order inside an ephemeral workspace, then losslessly
//! concatenates the segments and reads the result back. The workspace is
//! removed on every exit path: success, validation failure, render
//! failure, or timeout.

use tokio::fs;
use tracing::{info, warn};

use reel_media::{
    concat, get_duration, render_segment, segment_narration, FfmpegRunner, MediaError, RenderPass,
    SegmentSpec, Workspace,
};
use reel_models::AssemblyRequest;

use crate::config::PipelineConfig;
use crate::error::{PipelineError, PipelineResult};

/// Assemble rendered segments for every scene and concatenate them into
/// one output, returned as the final media blob.
pub async fn assemble(
    config: &PipelineConfig,
    request: &AssemblyRequest,
) -> PipelineResult<Vec<u8>> {
    // Validation failures never touch the filesystem
    request.validate(&config.limits)?;

    info!(
        scenes = request.assets.len(),
        captions = request.captions_enabled,
        "Assembling output"
    );

    let workspace = Workspace::create().map_err(PipelineError::from)?;

    let mut segment_paths = Vec::with_capacity(request.assets.len());
    for asset in &request.assets {
        let index = asset.scene_index;

        let visual_path = workspace.visual_path(index, asset.visual.extension());
        let audio_path = workspace.audio_path(index);
        fs::write(&visual_path, asset.visual.bytes()).await?;
        fs::write(&audio_path, &asset.audio).await?;

        // Probe the written narration file; a generator may under-report
        // its duration, and truncating speech is worse than a longer scene.
        let probed = get_duration(&audio_path).await.ok();
        let duration_secs = effective_duration(asset.duration_secs, probed);

        let captions = if request.captions_enabled {
            asset
                .narration
                .as_deref()
                .map(|n| segment_narration(n, duration_secs, config.max_caption_chars))
                .unwrap_or_default()
        } else {
            Vec::new()
        };

        let spec = SegmentSpec {
            scene_index: index,
            visual_path: &visual_path,
            is_image: asset.visual.is_image(),
            audio_path: &audio_path,
            duration_secs,
            captions: &captions,
        };
        let segment_path = workspace.segment_path(index);
        let runner = FfmpegRunner::new().with_timeout(config.render_timeout.as_secs());

        match render_segment(&spec, &segment_path, &config.output, &config.encoding, &runner).await
        {
            Ok(RenderPass::WithoutCaptions) if !captions.is_empty() => {
                // Fallback path already warned in the renderer
            }
            Ok(_) => {}
            Err(MediaError::Cancelled) => return Err(PipelineError::Cancelled),
            Err(e @ MediaError::Timeout(_)) => return Err(e.into()),
            Err(e) => {
                warn!(scene_index = index, error = %e, "Segment render failed on both passes");
                return Err(PipelineError::Render(format!(
                    "scene {}: segment render failed",
                    index
                )));
            }
        }
        segment_paths.push(segment_path);
    }

    let manifest_path = workspace.manifest_path();
    concat::write_manifest(&manifest_path, &segment_paths)
        .await
        .map_err(PipelineError::from)?;

    let output_path = workspace.output_path();
    match concat::concat_segments(&manifest_path, &output_path, config.concat_timeout.as_secs())
        .await
    {
        Ok(()) => {}
        // Concatenation runs under its own deadline; expiry is fatal
        Err(MediaError::Timeout(secs)) => {
            return Err(PipelineError::Timeout(format!(
                "final concatenation timed out after {} seconds",
                secs
            )));
        }
        Err(e) => return Err(e.into()),
    }

    let blob = fs::read(&output_path).await?;

    info!(
        bytes = blob.len(),
        workspace_id = %workspace.id(),
        "Assembly complete"
    );
    if let Err(e) = workspace.close() {
        warn!(error = %e, "Workspace teardown reported an error");
    }

    Ok(blob)
}

/// Prefer the probed audio duration when it exceeds the claimed one.
/// Probing can fail (no ffprobe, unreadable file); the claimed duration
/// then stands.
fn effective_duration(claimed: f64, probed: Option<f64>) -> f64 {
    match probed {
        Some(p) if p > claimed => p,
        _ => claimed,
    }
}
