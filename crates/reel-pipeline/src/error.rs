//! Pipeline error types.
//!
//! Cancellation is a benign outcome distinct from failure: it is never
//! logged as an error condition and callers can branch on
//! [`PipelineError::is_cancelled`].

use thiserror::Error;

use reel_media::MediaError;
use reel_models::ValidationError;

pub type PipelineResult<T> = Result<T, PipelineError>;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// Malformed or over-limit request, rejected before any work.
    #[error("invalid request: {0}")]
    Validation(#[from] ValidationError),

    /// A scene's visual/audio fetch exhausted all retries. Aborts the
    /// whole batch.
    #[error("scene {scene_index}: {message}")]
    Generation { scene_index: usize, message: String },

    /// Both the captioned render and its captionless fallback failed.
    #[error("render failed: {0}")]
    Render(String),

    /// A call or stage exceeded its deadline.
    #[error("{0}")]
    Timeout(String),

    /// Caller-initiated abort.
    #[error("operation cancelled")]
    Cancelled,

    /// Media subsystem failure outside the render fallback path.
    #[error("media error: {0}")]
    Media(MediaError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<MediaError> for PipelineError {
    fn from(e: MediaError) -> Self {
        // Normalize the benign/deadline outcomes so callers see one taxonomy
        match e {
            MediaError::Cancelled => PipelineError::Cancelled,
            MediaError::Timeout(secs) => {
                PipelineError::Timeout(format!("media operation timed out after {} seconds", secs))
            }
            other => PipelineError::Media(other),
        }
    }
}

impl PipelineError {
    /// Create a generation failure with a caller-facing message.
    pub fn generation(scene_index: usize, message: impl Into<String>) -> Self {
        Self::Generation {
            scene_index,
            message: message.into(),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// True for the benign caller-initiated abort outcome.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, PipelineError::Cancelled)
    }

    /// True if the request was rejected before any work began.
    pub fn is_validation(&self) -> bool {
        matches!(self, PipelineError::Validation(_))
    }

    /// True if a deadline expired.
    pub fn is_timeout(&self) -> bool {
        matches!(self, PipelineError::Timeout(_))
    }
}
