//! Single-scene regeneration.
//!
//! Re-generates one scene's assets without re-generating the rest, then
//! re-assembles the full list. The previous output artifact stays usable:
//! the new blob is returned only on success, and the caller swaps it in.

use tokio::sync::{mpsc, watch};
use tracing::info;

use reel_models::{AssemblyRequest, Scene, SceneAsset, ValidationError};

use crate::assemble::assemble;
use crate::error::PipelineResult;
use crate::generate::{generate_one, wait_cancelled, GeneratorContext, SceneEvent};

/// Options for a single-scene regeneration.
#[derive(Clone, Default)]
pub struct RegenerateOptions {
    /// Voice selector override for narration synthesis.
    pub voice: Option<String>,
    /// Whether captions are rendered in the re-assembled output.
    pub captions_enabled: bool,
    /// Cancellation signal scoped to this regeneration only; an unrelated
    /// batch generation is not affected.
    pub cancel: Option<watch::Receiver<bool>>,
    /// Sink for the scene's completion event.
    pub events: Option<mpsc::UnboundedSender<SceneEvent>>,
}

/// Regenerate the scene at `index`, splice it into a copy of
/// `current_assets`, and assemble the updated list.
///
/// All other assets are carried over unchanged.
pub async fn regenerate_scene(
    ctx: &GeneratorContext,
    index: usize,
    scene: &Scene,
    current_assets: &[SceneAsset],
    options: &RegenerateOptions,
) -> PipelineResult<(Vec<SceneAsset>, Vec<u8>)> {
    if index >= current_assets.len() {
        return Err(ValidationError::SceneIndexOutOfRange {
            index,
            len: current_assets.len(),
        }
        .into());
    }

    info!(scene_index = index, "Regenerating scene");

    // Narrow, independent cancellation scope for the single generation
    let (cancel_tx, cancel_rx) = watch::channel(false);
    let forwarder = options.cancel.clone().map(|external| {
        tokio::spawn(async move {
            wait_cancelled(external).await;
            let _ = cancel_tx.send(true);
        })
    });

    let voice = options
        .voice
        .clone()
        .unwrap_or_else(|| ctx.config.default_voice.clone());

    let result = generate_one(
        ctx,
        index,
        scene,
        options.captions_enabled,
        &voice,
        cancel_rx,
        options.events.as_ref(),
    )
    .await;

    if let Some(handle) = forwarder {
        handle.abort();
    }
    let new_asset = result?;

    let updated = splice_asset(current_assets, index, new_asset);
    let request = AssemblyRequest::new(updated.clone(), options.captions_enabled);
    let blob = assemble(&ctx.config, &request).await?;

    info!(scene_index = index, "Scene regenerated and re-assembled");
    Ok((updated, blob))
}

/// Replace the asset at `index` in a copy of `assets`.
fn splice_asset(assets: &[SceneAsset], index: usize, mut new_asset: SceneAsset) -> Vec<SceneAsset> {
    new_asset.scene_index = index;
    let mut updated = assets.to_vec();
    updated[index] = new_asset;
    updated
}
