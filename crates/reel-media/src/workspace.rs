//! Ephemeral per-request workspace.
//!
//! All intermediate files for one assembly request (per-scene payloads,
//! rendered segments, manifest, output) live in a single temporary
//! directory. The directory is removed on every exit path: dropping the
//! workspace deletes it and everything in it.

use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::debug;
use uuid::Uuid;

use crate::error::MediaResult;

/// Ephemeral directory owning all intermediate files for one request.
#[derive(Debug)]
pub struct Workspace {
    id: String,
    dir: TempDir,
}

impl Workspace {
    /// Create a fresh workspace directory.
    pub fn create() -> MediaResult<Self> {
        let id = Uuid::new_v4().to_string();
        let dir = TempDir::with_prefix(format!("reel-{}-", &id[..8]))?;
        debug!(workspace_id = %id, path = %dir.path().display(), "Created workspace");
        Ok(Self { id, dir })
    }

    /// Request identifier.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Workspace root directory.
    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Path for a scene's visual payload.
    pub fn visual_path(&self, scene_index: usize, extension: &str) -> PathBuf {
        self.root()
            .join(format!("scene_{:03}_visual.{}", scene_index, extension))
    }

    /// Path for a scene's narration audio payload.
    pub fn audio_path(&self, scene_index: usize) -> PathBuf {
        self.root().join(format!("scene_{:03}_audio.mp3", scene_index))
    }

    /// Path for a scene's rendered segment.
    pub fn segment_path(&self, scene_index: usize) -> PathBuf {
        self.root().join(format!("segment_{:03}.mp4", scene_index))
    }

    /// Path for the concat manifest.
    pub fn manifest_path(&self) -> PathBuf {
        self.root().join("segments.txt")
    }

    /// Path for the final concatenated output.
    pub fn output_path(&self) -> PathBuf {
        self.root().join("output.mp4")
    }

    /// Explicitly tear the workspace down, surfacing removal errors.
    ///
    /// Dropping the workspace performs the same removal best-effort.
    pub fn close(self) -> MediaResult<()> {
        debug!(workspace_id = %self.id, "Closing workspace");
        self.dir.close()?;
        Ok(())
    }
}
