//! External generator seams.
//!
//! The visual and audio backends are opaque, fallible, asynchronous
//! collaborators. Implementations receive the batch cancellation receiver
//! so they can abort in-flight requests early; the pipeline's own timeout
//! wrapper cannot cancel work it abandons.

use async_trait::async_trait;
use tokio::sync::watch;

use reel_models::VisualPayload;

/// Result of a visual generation call.
#[derive(Debug, Clone)]
pub struct VisualAsset {
    /// Image bytes or looping video-clip bytes.
    pub payload: VisualPayload,
    /// Optional duration hint in seconds (clip length, slideshow pacing).
    pub duration_hint: Option<f64>,
    /// Usage cost incurred by this call, in backend units.
    pub cost: f64,
}

/// Result of an audio synthesis call.
#[derive(Debug, Clone)]
pub struct AudioClip {
    /// Speech audio bytes.
    pub audio: Vec<u8>,
    /// Actual speech duration in seconds.
    pub duration_secs: f64,
    /// Usage cost incurred by this call, in backend units.
    pub cost: f64,
}

/// Visual generation backend: prompt -> image or looping clip.
#[async_trait]
pub trait VisualGenerator: Send + Sync {
    async fn generate(
        &self,
        prompt: &str,
        cancel: watch::Receiver<bool>,
    ) -> anyhow::Result<VisualAsset>;
}

/// Audio synthesis backend: narration + voice selector -> speech audio.
#[async_trait]
pub trait AudioGenerator: Send + Sync {
    async fn synthesize(
        &self,
        narration: &str,
        voice: &str,
        cancel: watch::Receiver<bool>,
    ) -> anyhow::Result<AudioClip>;
}
