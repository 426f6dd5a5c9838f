//! Assembly request validation.
//!
//! A request is checked against [`RequestLimits`] before the pipeline
//! touches the filesystem or spawns any subprocess. Validation failures
//! never incur generation or rendering work.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::scene::SceneAsset;

/// Limits enforced on an assembly request before any work begins.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestLimits {
    /// Maximum scenes per request.
    pub max_scenes: usize,
    /// Maximum total payload size across all scenes, in bytes.
    pub max_total_bytes: usize,
    /// Maximum narration length per scene, in characters.
    pub max_narration_chars: usize,
    /// Minimum floor on per-scene duration, in seconds.
    pub min_scene_duration_secs: f64,
}

impl Default for RequestLimits {
    fn default() -> Self {
        Self {
            max_scenes: 10,
            max_total_bytes: 256 * 1024 * 1024,
            max_narration_chars: 1500,
            min_scene_duration_secs: 3.0,
        }
    }
}

impl RequestLimits {
    /// Create limits from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_scenes: std::env::var("REEL_MAX_SCENES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_scenes),
            max_total_bytes: std::env::var("REEL_MAX_TOTAL_BYTES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_total_bytes),
            max_narration_chars: std::env::var("REEL_MAX_NARRATION_CHARS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_narration_chars),
            min_scene_duration_secs: std::env::var("REEL_MIN_SCENE_DURATION_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.min_scene_duration_secs),
        }
    }
}

/// A malformed or over-limit request, rejected before any work.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Errors raised by request validation.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("request contains no scenes")]
    Empty,

    #[error("too many scenes: {count} exceeds maximum of {max}")]
    TooManyScenes { count: usize, max: usize },

    #[error("scene {scene_index}: exactly one of image/video required")]
    InvalidVisualPayload { scene_index: usize },

    #[error("scene {scene_index}: audio payload is empty")]
    EmptyAudio { scene_index: usize },

    #[error("scene {scene_index}: duration {duration:.2}s is not positive")]
    NonPositiveDuration { scene_index: usize, duration: f64 },

    #[error("scene {scene_index}: narration is {chars} characters, maximum is {max}")]
    NarrationTooLong {
        scene_index: usize,
        chars: usize,
        max: usize,
    },

    #[error("scene indices are not contiguous: expected {expected}, found {found}")]
    NonContiguousIndex { expected: usize, found: usize },

    #[error("total payload of {total} bytes exceeds maximum of {max}")]
    PayloadTooLarge { total: usize, max: usize },

    #[error("scene index {index} is out of range for {len} scenes")]
    SceneIndexOutOfRange { index: usize, len: usize },
}

/// An ordered list of scene assets plus a captions-enabled flag.
#[derive(Debug, Clone)]
pub struct AssemblyRequest {
    /// Assets ordered by scene index.
    pub assets: Vec<SceneAsset>,
    /// Whether caption overlays are rendered.
    pub captions_enabled: bool,
}

impl AssemblyRequest {
    /// Create a request.
    pub fn new(assets: Vec<SceneAsset>, captions_enabled: bool) -> Self {
        Self {
            assets,
            captions_enabled,
        }
    }

    /// Validate the request against the given limits.
    ///
    /// Checks scene-count bounds, index contiguity, payload shape,
    /// positive durations, narration length and total payload size.
    pub fn validate(&self, limits: &RequestLimits) -> ValidationResult<()> {
        if self.assets.is_empty() {
            return Err(ValidationError::Empty);
        }
        if self.assets.len() > limits.max_scenes {
            return Err(ValidationError::TooManyScenes {
                count: self.assets.len(),
                max: limits.max_scenes,
            });
        }

        let mut total_bytes = 0usize;
        for (expected, asset) in self.assets.iter().enumerate() {
            if asset.scene_index != expected {
                return Err(ValidationError::NonContiguousIndex {
                    expected,
                    found: asset.scene_index,
                });
            }
            if asset.visual.bytes().is_empty() {
                return Err(ValidationError::InvalidVisualPayload {
                    scene_index: asset.scene_index,
                });
            }
            if asset.audio.is_empty() {
                return Err(ValidationError::EmptyAudio {
                    scene_index: asset.scene_index,
                });
            }
            if asset.duration_secs <= 0.0 {
                return Err(ValidationError::NonPositiveDuration {
                    scene_index: asset.scene_index,
                    duration: asset.duration_secs,
                });
            }
            if let Some(narration) = &asset.narration {
                let chars = narration.chars().count();
                if chars > limits.max_narration_chars {
                    return Err(ValidationError::NarrationTooLong {
                        scene_index: asset.scene_index,
                        chars,
                        max: limits.max_narration_chars,
                    });
                }
            }
            total_bytes += asset.payload_bytes();
        }

        if total_bytes > limits.max_total_bytes {
            return Err(ValidationError::PayloadTooLarge {
                total: total_bytes,
                max: limits.max_total_bytes,
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::VisualPayload;

    fn asset(index: usize) -> SceneAsset {
        SceneAsset {
            scene_index: index,
            visual: VisualPayload::Image(vec![0; 16]),
            audio: vec![0; 16],
            duration_secs: 4.0,
            narration: Some("Check the horn.".to_string()),
        }
    }

    #[test]
    fn test_valid_request() {
        let request = AssemblyRequest::new(vec![asset(0), asset(1)], true);
        assert!(request.validate(&RequestLimits::default()).is_ok());
    }

    #[test]
    fn test_empty_request_rejected() {
        let request = AssemblyRequest::new(vec![], true);
        assert!(matches!(
            request.validate(&RequestLimits::default()),
            Err(ValidationError::Empty)
        ));
    }

    #[test]
    fn test_scene_count_bound() {
        let assets: Vec<SceneAsset> = (0..11).map(asset).collect();
        let request = AssemblyRequest::new(assets, false);
        let err = request.validate(&RequestLimits::default()).unwrap_err();
        assert!(matches!(
            err,
            ValidationError::TooManyScenes { count: 11, max: 10 }
        ));
    }

    #[test]
    fn test_empty_visual_payload_rejected() {
        let mut bad = asset(0);
        bad.visual = VisualPayload::Image(vec![]);
        let request = AssemblyRequest::new(vec![bad], false);
        let err = request.validate(&RequestLimits::default()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "scene 0: exactly one of image/video required"
        );
    }

    #[test]
    fn test_non_positive_duration_rejected() {
        let mut bad = asset(1);
        bad.duration_secs = 0.0;
        let request = AssemblyRequest::new(vec![asset(0), bad], false);
        assert!(matches!(
            request.validate(&RequestLimits::default()),
            Err(ValidationError::NonPositiveDuration { scene_index: 1, .. })
        ));
    }

    #[test]
    fn test_non_contiguous_index_rejected() {
        let request = AssemblyRequest::new(vec![asset(0), asset(2)], false);
        assert!(matches!(
            request.validate(&RequestLimits::default()),
            Err(ValidationError::NonContiguousIndex {
                expected: 1,
                found: 2
            })
        ));
    }

    #[test]
    fn test_total_payload_bound() {
        let limits = RequestLimits {
            max_total_bytes: 16,
            ..Default::default()
        };
        let request = AssemblyRequest::new(vec![asset(0)], false);
        assert!(matches!(
            request.validate(&limits),
            Err(ValidationError::PayloadTooLarge { .. })
        ));
    }

    #[test]
    fn test_narration_length_bound() {
        let limits = RequestLimits {
            max_narration_chars: 5,
            ..Default::default()
        };
        let request = AssemblyRequest::new(vec![asset(0)], true);
        assert!(matches!(
            request.validate(&limits),
            Err(ValidationError::NarrationTooLong { .. })
        ));
    }
}
