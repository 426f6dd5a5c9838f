//! Deadline wrapping for pipeline stages.
//!
//! Known limitation: expiry abandons the wrapped future but does not
//! cancel whatever work it started; an external call may keep running to
//! completion in the background. Operations that must support early
//! abandonment take a cancellation token themselves (see
//! [`crate::generator`]). FFmpeg subprocesses are the exception: their
//! runner kills the child on timeout.

use std::future::Future;
use std::time::Duration;

use crate::error::{PipelineError, PipelineResult};

/// Run `future` under a deadline.
///
/// On expiry, rejects with [`PipelineError::Timeout`] naming the stage.
pub async fn with_deadline<F, T>(
    stage: &str,
    deadline: Duration,
    future: F,
) -> PipelineResult<T>
where
    F: Future<Output = PipelineResult<T>>,
{
    match tokio::time::timeout(deadline, future).await {
        Ok(result) => result,
        Err(_) => Err(PipelineError::Timeout(format!(
            "{} timed out after {} seconds",
            stage,
            deadline.as_secs()
        ))),
    }
}
