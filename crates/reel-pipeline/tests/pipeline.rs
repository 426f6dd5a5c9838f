//! Pipeline integration tests with mock generator backends.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{mpsc, watch};

use reel_models::{Scene, SceneAsset, VisualPayload};
use reel_pipeline::{
    generate_scene_assets, regenerate_scene, AudioClip, AudioGenerator, GenerateOptions,
    GeneratorContext, PipelineConfig, PipelineError, RegenerateOptions, SceneEvent, VisualAsset,
    VisualGenerator,
};

/// Visual backend double: index-tagged payloads, optional per-prompt
/// failures, configurable latency.
#[derive(Default)]
struct MockVisual {
    calls: AtomicU32,
    fail_prompt: Option<String>,
    delay: Duration,
    duration_hint: Option<f64>,
}

#[async_trait]
impl VisualGenerator for MockVisual {
    async fn generate(
        &self,
        prompt: &str,
        _cancel: watch::Receiver<bool>,
    ) -> anyhow::Result<VisualAsset> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        if self.fail_prompt.as_deref() == Some(prompt) {
            anyhow::bail!("backend returned 500");
        }
        Ok(VisualAsset {
            payload: VisualPayload::Image(prompt.as_bytes().to_vec()),
            duration_hint: self.duration_hint,
            cost: 1.0,
        })
    }
}

#[derive(Default)]
struct MockAudio {
    calls: AtomicU32,
    duration_secs: f64,
    delay: Duration,
}

#[async_trait]
impl AudioGenerator for MockAudio {
    async fn synthesize(
        &self,
        narration: &str,
        _voice: &str,
        _cancel: watch::Receiver<bool>,
    ) -> anyhow::Result<AudioClip> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        Ok(AudioClip {
            audio: narration.as_bytes().to_vec(),
            duration_secs: self.duration_secs,
            cost: 0.5,
        })
    }
}

fn test_config() -> PipelineConfig {
    PipelineConfig {
        retry_attempts: 2,
        retry_initial_delay: Duration::from_millis(1),
        throttle_spacing: Duration::ZERO,
        ..Default::default()
    }
}

fn context(visual: MockVisual, audio: MockAudio) -> GeneratorContext {
    GeneratorContext::new(Arc::new(visual), Arc::new(audio), test_config())
}

fn scenes(n: usize) -> Vec<Scene> {
    (0..n)
        .map(|i| Scene::new(format!("Narration for scene {}.", i), format!("prompt-{}", i)))
        .collect()
}

#[tokio::test(start_paused = true)]
async fn generation_preserves_input_order_under_concurrency() {
    // Later scenes finish first, so completion order is reversed
    let visual = MockVisual {
        delay: Duration::from_millis(50),
        ..Default::default()
    };
    let audio = MockAudio {
        duration_secs: 5.0,
        ..Default::default()
    };
    let ctx = context(visual, audio);

    let options = GenerateOptions {
        concurrency: Some(3),
        captions_enabled: true,
        ..Default::default()
    };
    let assets = generate_scene_assets(&ctx, &scenes(6), &options)
        .await
        .unwrap();

    assert_eq!(assets.len(), 6);
    for (i, asset) in assets.iter().enumerate() {
        assert_eq!(asset.scene_index, i);
        assert_eq!(asset.visual.bytes(), format!("prompt-{}", i).as_bytes());
        assert_eq!(
            asset.narration.as_deref(),
            Some(format!("Narration for scene {}.", i).as_str())
        );
    }
}

#[tokio::test]
async fn narration_copy_absent_when_captions_disabled() {
    let ctx = context(
        MockVisual::default(),
        MockAudio {
            duration_secs: 5.0,
            ..Default::default()
        },
    );

    let options = GenerateOptions::default();
    let assets = generate_scene_assets(&ctx, &scenes(2), &options)
        .await
        .unwrap();
    assert!(assets.iter().all(|a| a.narration.is_none()));
}

#[tokio::test]
async fn effective_duration_applies_floor_and_hints() {
    // Audio shorter than the configured minimum gets floored
    let ctx = context(
        MockVisual::default(),
        MockAudio {
            duration_secs: 1.0,
            ..Default::default()
        },
    );
    let assets = generate_scene_assets(&ctx, &scenes(1), &GenerateOptions::default())
        .await
        .unwrap();
    assert_eq!(assets[0].duration_secs, 3.0);

    // A longer visual hint wins over the audio duration
    let ctx = context(
        MockVisual {
            duration_hint: Some(8.0),
            ..Default::default()
        },
        MockAudio {
            duration_secs: 5.0,
            ..Default::default()
        },
    );
    let assets = generate_scene_assets(&ctx, &scenes(1), &GenerateOptions::default())
        .await
        .unwrap();
    assert_eq!(assets[0].duration_secs, 8.0);
}

#[tokio::test]
async fn exhausted_retries_fail_the_whole_batch() {
    let visual = MockVisual {
        fail_prompt: Some("prompt-2".to_string()),
        ..Default::default()
    };
    let audio = MockAudio {
        duration_secs: 5.0,
        ..Default::default()
    };
    let ctx = context(visual, audio);

    let err = generate_scene_assets(&ctx, &scenes(4), &GenerateOptions::default())
        .await
        .unwrap_err();

    match err {
        PipelineError::Generation {
            scene_index,
            message,
        } => {
            assert_eq!(scene_index, 2);
            // Caller-facing message carries no backend detail
            assert!(!message.contains("500"));
        }
        other => panic!("expected generation failure, got {:?}", other),
    }
}

#[tokio::test]
async fn failing_scene_is_retried_before_aborting() {
    let visual = Arc::new(MockVisual {
        fail_prompt: Some("prompt-0".to_string()),
        ..Default::default()
    });
    let audio = Arc::new(MockAudio {
        duration_secs: 5.0,
        ..Default::default()
    });
    let ctx = GeneratorContext::new(visual.clone(), audio.clone(), test_config());

    let err = generate_scene_assets(&ctx, &scenes(1), &GenerateOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::Generation { .. }));
    // retry_attempts = 2 in the test config: initial call plus one retry
    assert_eq!(visual.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn over_limit_batch_rejected_with_zero_generation_calls() {
    let visual = Arc::new(MockVisual::default());
    let audio = Arc::new(MockAudio {
        duration_secs: 5.0,
        ..Default::default()
    });
    let ctx = GeneratorContext::new(visual.clone(), audio.clone(), test_config());

    let err = generate_scene_assets(&ctx, &scenes(11), &GenerateOptions::default())
        .await
        .unwrap_err();

    assert!(err.is_validation());
    assert_eq!(visual.calls.load(Ordering::SeqCst), 0);
    assert_eq!(audio.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn throttle_queue_wait_counts_against_call_timeout() {
    // Three callers share one 100s-spaced throttle, so the last slot is
    // at 200s, past the 120s per-call deadline
    let mut config = test_config();
    config.throttle_spacing = Duration::from_secs(100);
    config.call_timeout = Duration::from_secs(120);
    let ctx = GeneratorContext::new(
        Arc::new(MockVisual::default()),
        Arc::new(MockAudio {
            duration_secs: 5.0,
            ..Default::default()
        }),
        config,
    );

    let err = generate_scene_assets(&ctx, &scenes(3), &GenerateOptions::default())
        .await
        .unwrap_err();
    assert!(err.is_timeout());
}

#[tokio::test(start_paused = true)]
async fn cancelling_mid_batch_yields_cancelled_outcome() {
    // Backends hang far longer than the test horizon
    let visual = MockVisual {
        delay: Duration::from_secs(600),
        ..Default::default()
    };
    let audio = MockAudio {
        duration_secs: 5.0,
        delay: Duration::from_secs(600),
        ..Default::default()
    };
    let ctx = context(visual, audio);

    let (cancel_tx, cancel_rx) = watch::channel(false);
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        let _ = cancel_tx.send(true);
    });

    let options = GenerateOptions {
        cancel: Some(cancel_rx),
        ..Default::default()
    };
    let err = generate_scene_assets(&ctx, &scenes(3), &options)
        .await
        .unwrap_err();

    // A cancellation outcome, not a generic failure
    assert!(err.is_cancelled());
}

#[tokio::test]
async fn completion_events_cover_every_scene_with_cost() {
    let ctx = context(
        MockVisual::default(),
        MockAudio {
            duration_secs: 5.0,
            ..Default::default()
        },
    );

    let (events_tx, mut events_rx) = mpsc::unbounded_channel();
    let options = GenerateOptions {
        events: Some(events_tx),
        ..Default::default()
    };
    generate_scene_assets(&ctx, &scenes(4), &options)
        .await
        .unwrap();

    let mut indices = Vec::new();
    while let Ok(event) = events_rx.try_recv() {
        let SceneEvent::Completed { index, cost } = event;
        assert_eq!(cost, 1.5);
        indices.push(index);
    }
    indices.sort();
    assert_eq!(indices, vec![0, 1, 2, 3]);
}

#[tokio::test]
async fn regenerate_out_of_range_index_is_validation_error() {
    let ctx = context(
        MockVisual::default(),
        MockAudio {
            duration_secs: 5.0,
            ..Default::default()
        },
    );

    let current: Vec<SceneAsset> = vec![SceneAsset {
        scene_index: 0,
        visual: VisualPayload::Image(vec![1]),
        audio: vec![1],
        duration_secs: 4.0,
        narration: None,
    }];

    let err = regenerate_scene(
        &ctx,
        5,
        &Scene::new("text", "prompt"),
        &current,
        &RegenerateOptions::default(),
    )
    .await
    .unwrap_err();

    assert!(err.is_validation());
}
