//! Concurrency-bounded scene-asset generation.
//!
//! A fixed-size pool (semaphore permits) bounds the number of
//! simultaneously in-flight generation calls. Each scene's visual and
//! audio assets are fetched concurrently, combined once both resolve, and
//! written into a pre-sized result slot at the scene's own index, so
//! output order always matches input order regardless of completion
//! order.
//!
//! Failure policy is fail-fast: the first exhausted-retry failure flips
//! the shared cancellation signal and aborts the batch. Already-produced
//! assets are discarded, but completion events already emitted (and any
//! cost they carried) are not rolled back.

use std::sync::Arc;

use tokio::sync::{mpsc, watch, Semaphore};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use reel_models::{Scene, SceneAsset, ValidationError};

use crate::config::PipelineConfig;
use crate::deadline::with_deadline;
use crate::error::{PipelineError, PipelineResult};
use crate::generator::{AudioGenerator, VisualGenerator};
use crate::retry::{retry_async, RetryConfig};
use crate::throttle::Throttle;

/// Per-scene progress event for an external metering consumer.
#[derive(Debug, Clone, PartialEq)]
pub enum SceneEvent {
    /// A scene's assets were produced.
    Completed {
        /// Scene index.
        index: usize,
        /// Usage cost incurred for the scene, in backend units.
        cost: f64,
    },
}

/// Generator backends plus the shared resilience objects.
#[derive(Clone)]
pub struct GeneratorContext {
    pub visual: Arc<dyn VisualGenerator>,
    pub audio: Arc<dyn AudioGenerator>,
    /// Spacing queue for the rate-limited visual backend.
    pub throttle: Throttle,
    pub config: PipelineConfig,
}

impl GeneratorContext {
    /// Create a context with a fresh throttle sized from the config.
    pub fn new(
        visual: Arc<dyn VisualGenerator>,
        audio: Arc<dyn AudioGenerator>,
        config: PipelineConfig,
    ) -> Self {
        let throttle = Throttle::new(config.throttle_spacing);
        Self {
            visual,
            audio,
            throttle,
            config,
        }
    }

    /// Replace the throttle, e.g. to share one spacing queue between
    /// pipelines targeting the same backend.
    pub fn with_throttle(mut self, throttle: Throttle) -> Self {
        self.throttle = throttle;
        self
    }
}

/// Options for one generation batch.
#[derive(Clone, Default)]
pub struct GenerateOptions {
    /// Pool size override; the config value applies when `None`.
    pub concurrency: Option<usize>,
    /// Voice selector override for narration synthesis.
    pub voice: Option<String>,
    /// Whether assets keep a narration copy for caption rendering.
    pub captions_enabled: bool,
    /// Caller-held cancellation signal for the whole batch.
    pub cancel: Option<watch::Receiver<bool>>,
    /// Sink for per-scene completion events.
    pub events: Option<mpsc::UnboundedSender<SceneEvent>>,
}

/// Generate assets for every scene, preserving input order.
///
/// Request-level limits are enforced before any generation call is made.
/// A cancelled batch yields [`PipelineError::Cancelled`], distinct from a
/// generation failure.
pub async fn generate_scene_assets(
    ctx: &GeneratorContext,
    scenes: &[Scene],
    options: &GenerateOptions,
) -> PipelineResult<Vec<SceneAsset>> {
    if scenes.is_empty() {
        return Ok(Vec::new());
    }
    let limits = &ctx.config.limits;
    if scenes.len() > limits.max_scenes {
        return Err(ValidationError::TooManyScenes {
            count: scenes.len(),
            max: limits.max_scenes,
        }
        .into());
    }
    for (index, scene) in scenes.iter().enumerate() {
        let chars = scene.narration.chars().count();
        if chars > limits.max_narration_chars {
            return Err(ValidationError::NarrationTooLong {
                scene_index: index,
                chars,
                max: limits.max_narration_chars,
            }
            .into());
        }
    }

    let concurrency = options.concurrency.unwrap_or(ctx.config.concurrency).max(1);
    let voice = options
        .voice
        .clone()
        .unwrap_or_else(|| ctx.config.default_voice.clone());

    info!(
        scenes = scenes.len(),
        concurrency,
        captions = options.captions_enabled,
        "Starting scene generation batch"
    );

    // One shared signal governs the whole batch: the caller's token is
    // forwarded into it, and the fail-fast path flips it directly.
    let (cancel_tx, cancel_rx) = watch::channel(false);
    let cancel_tx = Arc::new(cancel_tx);
    let forwarder = options.cancel.clone().map(|external| {
        let cancel_tx = Arc::clone(&cancel_tx);
        tokio::spawn(async move {
            wait_cancelled(external).await;
            let _ = cancel_tx.send(true);
        })
    });

    let semaphore = Arc::new(Semaphore::new(concurrency));
    let mut join_set: JoinSet<PipelineResult<(usize, SceneAsset)>> = JoinSet::new();

    for (index, scene) in scenes.iter().enumerate() {
        let ctx = ctx.clone();
        let scene = scene.clone();
        let voice = voice.clone();
        let captions_enabled = options.captions_enabled;
        let events = options.events.clone();
        let semaphore = Arc::clone(&semaphore);
        let cancel_rx = cancel_rx.clone();

        join_set.spawn(async move {
            let _permit = semaphore
                .acquire_owned()
                .await
                .map_err(|_| PipelineError::Cancelled)?;
            if *cancel_rx.borrow() {
                return Err(PipelineError::Cancelled);
            }
            let asset = generate_one(
                &ctx,
                index,
                &scene,
                captions_enabled,
                &voice,
                cancel_rx,
                events.as_ref(),
            )
            .await?;
            Ok((index, asset))
        });
    }

    // Pre-sized, index-addressed result slots keep output order equal to
    // input order regardless of completion order.
    let mut slots: Vec<Option<SceneAsset>> = Vec::with_capacity(scenes.len());
    slots.resize_with(scenes.len(), || None);
    let mut first_err: Option<PipelineError> = None;

    while let Some(joined) = join_set.join_next().await {
        match joined {
            Ok(Ok((index, asset))) => {
                debug!(scene_index = index, "Scene assets ready");
                slots[index] = Some(asset);
            }
            Ok(Err(e)) => {
                if first_err.is_none() && !e.is_cancelled() {
                    // Fail fast: abort every in-flight sub-request
                    let _ = cancel_tx.send(true);
                    first_err = Some(e);
                }
            }
            Err(join_err) => {
                if first_err.is_none() && !join_err.is_cancelled() {
                    let _ = cancel_tx.send(true);
                    first_err = Some(PipelineError::internal(format!(
                        "scene generation task failed: {}",
                        join_err
                    )));
                }
            }
        }
    }

    if let Some(handle) = forwarder {
        handle.abort();
    }

    if let Some(e) = first_err {
        warn!(error = %e, "Scene generation batch aborted");
        return Err(e);
    }

    let mut assets = Vec::with_capacity(scenes.len());
    for slot in slots {
        match slot {
            Some(asset) => assets.push(asset),
            // A hole with no recorded failure means the batch was cancelled
            None => {
                info!("Scene generation batch cancelled");
                return Err(PipelineError::Cancelled);
            }
        }
    }

    info!(scenes = assets.len(), "Scene generation batch complete");
    Ok(assets)
}

/// Generate visual and audio assets for one scene.
///
/// Used both by the pool and by single-scene regeneration, which needs no
/// pool for one item.
pub(crate) async fn generate_one(
    ctx: &GeneratorContext,
    index: usize,
    scene: &Scene,
    captions_enabled: bool,
    voice: &str,
    cancel_rx: watch::Receiver<bool>,
    events: Option<&mpsc::UnboundedSender<SceneEvent>>,
) -> PipelineResult<SceneAsset> {
    let retry = RetryConfig::new(format!("scene {} generation", index))
        .with_attempts(ctx.config.retry_attempts)
        .with_initial_delay(ctx.config.retry_initial_delay);

    let visual_fut = with_deadline("visual generation", ctx.config.call_timeout, async {
        retry_async(&retry, || async {
            // The spacing queue applies to every attempt against the
            // rate-limited backend
            ctx.throttle.acquire().await;
            ctx.visual
                .generate(&scene.visual_prompt, cancel_rx.clone())
                .await
        })
        .await
        .map_err(|e| {
            warn!(scene_index = index, error = %e, "Visual generation exhausted retries");
            PipelineError::generation(index, "visual generation failed after all retries")
        })
    });

    let audio_fut = with_deadline("audio generation", ctx.config.call_timeout, async {
        retry_async(&retry, || async {
            ctx.audio
                .synthesize(&scene.narration, voice, cancel_rx.clone())
                .await
        })
        .await
        .map_err(|e| {
            warn!(scene_index = index, error = %e, "Audio generation exhausted retries");
            PipelineError::generation(index, "audio generation failed after all retries")
        })
    });

    let work = async { tokio::try_join!(visual_fut, audio_fut) };
    let (visual, audio) = tokio::select! {
        _ = wait_cancelled(cancel_rx.clone()) => return Err(PipelineError::Cancelled),
        result = work => result?,
    };

    let mut duration = audio.duration_secs;
    if let Some(hint) = visual.duration_hint {
        duration = duration.max(hint);
    }
    if let Some(hint) = scene.duration_hint {
        duration = duration.max(hint);
    }
    duration = duration.max(ctx.config.limits.min_scene_duration_secs);

    if let Some(events) = events {
        let _ = events.send(SceneEvent::Completed {
            index,
            cost: visual.cost + audio.cost,
        });
    }

    Ok(SceneAsset {
        scene_index: index,
        visual: visual.payload,
        audio: audio.audio,
        duration_secs: duration,
        narration: captions_enabled.then(|| scene.narration.clone()),
    })
}

/// Resolve once the signal reads `true`. Never resolves if the sender is
/// dropped without cancelling.
pub(crate) async fn wait_cancelled(mut rx: watch::Receiver<bool>) {
    loop {
        if *rx.borrow() {
            return;
        }
        if rx.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}
