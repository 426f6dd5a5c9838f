#![deny(unreachable_patterns)]
//! Scene-asset generation and video-assembly pipeline.
//!
//! This crate provides the three entrypoints exposed to the surrounding
//! application:
//! - [`generate_scene_assets`]: concurrency-bounded, order-preserving
//!   generation of per-scene visual and audio assets
//! - [`assemble`]: render per-scene segments and losslessly concatenate
//!   them into the final media blob inside an ephemeral workspace
//! - [`regenerate_scene`]: replace one scene's assets and re-assemble
//!   without re-generating the rest

pub mod assemble;
pub mod config;
pub mod deadline;
pub mod error;
pub mod generate;
pub mod generator;
pub mod regenerate;
pub mod retry;
pub mod throttle;

pub use assemble::assemble;
pub use config::PipelineConfig;
pub use deadline::with_deadline;
pub use error::{PipelineError, PipelineResult};
pub use generate::{generate_scene_assets, GenerateOptions, GeneratorContext, SceneEvent};
pub use generator::{AudioClip, AudioGenerator, VisualAsset, VisualGenerator};
pub use regenerate::{regenerate_scene, RegenerateOptions};
pub use retry::{retry_async, RetryConfig};
pub use throttle::Throttle;
