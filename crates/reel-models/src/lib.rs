//! Shared data models for the Reelsmith assembly pipeline.
//!
//! This crate provides Serde-serializable types for:
//! - Scenes and generated per-scene assets
//! - Assembly requests and their validation limits

pub mod request;
pub mod scene;

// Re-export common types
pub use request::{AssemblyRequest, RequestLimits, ValidationError};
pub use scene::{Scene, SceneAsset, VisualPayload};
