//! Scene and scene-asset models.

use serde::{Deserialize, Serialize};

/// One narrated unit of the output video.
///
/// Created from upstream script data; immutable once handed to the
/// pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scene {
    /// Narration text spoken over the scene.
    pub narration: String,
    /// Prompt handed to the visual generator.
    pub visual_prompt: String,
    /// Optional duration hint in seconds from the upstream script.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_hint: Option<f64>,
}

impl Scene {
    /// Create a scene with no duration hint.
    pub fn new(narration: impl Into<String>, visual_prompt: impl Into<String>) -> Self {
        Self {
            narration: narration.into(),
            visual_prompt: visual_prompt.into(),
            duration_hint: None,
        }
    }

    /// Set the duration hint.
    pub fn with_duration_hint(mut self, secs: f64) -> Self {
        self.duration_hint = Some(secs);
        self
    }
}

/// The visual track of a scene: exactly one of a still image or a
/// loopable video clip.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisualPayload {
    /// Still image bytes, held static for the scene duration.
    Image(Vec<u8>),
    /// Short video clip bytes, looped to cover the scene duration.
    VideoClip(Vec<u8>),
}

impl VisualPayload {
    /// Raw payload bytes regardless of kind.
    pub fn bytes(&self) -> &[u8] {
        match self {
            VisualPayload::Image(b) => b,
            VisualPayload::VideoClip(b) => b,
        }
    }

    /// Returns true for the still-image kind.
    pub fn is_image(&self) -> bool {
        matches!(self, VisualPayload::Image(_))
    }

    /// File extension used when the payload is written to a workspace.
    pub fn extension(&self) -> &'static str {
        match self {
            VisualPayload::Image(_) => "png",
            VisualPayload::VideoClip(_) => "mp4",
        }
    }
}

/// Generated assets for one scene.
///
/// Produced by the scene generator (or single-scene regeneration) and
/// consumed by the segment builder. Never mutated after creation;
/// regeneration replaces the whole value at an index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneAsset {
    /// Position in the scene list (contiguous, 0-based).
    pub scene_index: usize,
    /// Visual track payload.
    pub visual: VisualPayload,
    /// Narration audio bytes.
    pub audio: Vec<u8>,
    /// Effective scene duration in seconds, already floored to the
    /// configured minimum.
    pub duration_secs: f64,
    /// Narration copy, present only when captions were requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub narration: Option<String>,
}

impl SceneAsset {
    /// Total payload size in bytes (visual + audio).
    pub fn payload_bytes(&self) -> usize {
        self.visual.bytes().len() + self.audio.len()
    }
}
