//! Director pipeline scenarios with fake plugins

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::*;
use sotto_core::ErrorKind;
use sotto_plugins::{
    DirectorError, DirectorEvent, DirectorOptions, DirectorPlugin, PipelineStage, PluginCategory,
    RecorderPlugin,
};
use tokio::sync::Notify;

fn speech() -> Vec<u8> {
    // 0.1 s of a quiet square wave, 16 kHz mono PCM16
    (0..1600u32)
        .flat_map(|i| (if i % 40 < 20 { 1000i16 } else { -1000i16 }).to_le_bytes())
        .collect()
}

#[tokio::test]
async fn completes_with_polished_text() {
    let h = harness(
        FakeRecorder::new(speech()),
        FakeAsr::new("hello world"),
        Some(FakeLlm::new(LlmBehavior::Reply("Hello, world.".into()))),
        manual_options(),
    );
    let mut rx = h.director.subscribe();

    h.director.start().await;
    h.director.stop().await;

    assert_eq!(
        drain(&mut rx),
        vec![
            DirectorEvent::RecordingStarted,
            DirectorEvent::TranscriptionStarted,
            DirectorEvent::PolishingStarted,
            DirectorEvent::PipelineCompleted {
                raw_text: "hello world".into(),
                polished_text: Some("Hello, world.".into()),
                final_text: "Hello, world.".into(),
            },
        ]
    );
    assert_eq!(h.recorder.calls(), vec!["start", "stop"]);
    assert_eq!(*h.asr.sample_counts.lock().unwrap(), vec![1600]);

    let prompts = h.llm.as_ref().unwrap().prompts.lock().unwrap().clone();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("LANGUAGE: English"));
    assert!(prompts[0].ends_with("INPUT: hello world\nOUTPUT: "));
    assert!(!h.director.is_running());
}

#[tokio::test]
async fn silence_yields_empty_transcription_error() {
    let h = harness(
        FakeRecorder::new(vec![0u8; 16000]),
        FakeAsr::new(""),
        Some(FakeLlm::new(LlmBehavior::Reply("unused".into()))),
        manual_options(),
    );
    let mut rx = h.director.subscribe();

    h.director.start().await;
    h.director.stop().await;

    let events = drain(&mut rx);
    assert_eq!(
        events,
        vec![
            DirectorEvent::RecordingStarted,
            DirectorEvent::TranscriptionStarted,
            DirectorEvent::PipelineError {
                stage: PipelineStage::Transcription,
                error: DirectorError::EmptyTranscription,
            },
        ]
    );
    assert!(h.llm.unwrap().prompts.lock().unwrap().is_empty());
}

#[tokio::test]
async fn whitespace_transcription_never_polishes() {
    let h = harness(
        FakeRecorder::new(speech()),
        FakeAsr::new(" \n\t "),
        Some(FakeLlm::new(LlmBehavior::Reply("unused".into()))),
        manual_options(),
    );
    let mut rx = h.director.subscribe();

    h.director.start().await;
    h.director.stop().await;

    let events = drain(&mut rx);
    assert!(!events.contains(&DirectorEvent::PolishingStarted));
    assert!(matches!(
        events.last(),
        Some(DirectorEvent::PipelineError { stage: PipelineStage::Transcription, .. })
    ));
}

#[tokio::test]
async fn stop_without_start_is_a_state_failure() {
    let h = harness(
        FakeRecorder::new(speech()),
        FakeAsr::new("hello"),
        None,
        manual_options(),
    );
    let mut rx = h.director.subscribe();

    h.director.stop().await;

    match drain(&mut rx).as_slice() {
        [DirectorEvent::PipelineError { stage, error }] => {
            assert_eq!(*stage, PipelineStage::Recording);
            assert_eq!(*error, DirectorError::NotRecording);
            assert_eq!(error.kind(), ErrorKind::StateFailure);
        }
        other => panic!("unexpected events: {:?}", other),
    }
    assert!(h.recorder.calls().is_empty());
}

#[tokio::test]
async fn cancel_while_recording_stops_recorder() {
    let h = harness(
        FakeRecorder::new(speech()),
        FakeAsr::new("hello"),
        None,
        manual_options(),
    );
    let mut rx = h.director.subscribe();

    h.director.start().await;
    assert!(h.recorder.is_currently_recording());
    h.director.cancel().await;

    assert_eq!(
        drain(&mut rx),
        vec![DirectorEvent::RecordingStarted, DirectorEvent::PipelineCancelled]
    );
    assert_eq!(h.recorder.calls(), vec!["start", "stop"]);

    // A pending stop loses to the cancel
    h.director.stop().await;
    assert!(drain(&mut rx).is_empty());
}

#[tokio::test]
async fn cancel_reports_even_when_recorder_stop_fails() {
    let h = harness(
        FakeRecorder::new(speech()).failing_stop(),
        FakeAsr::new("hello"),
        None,
        manual_options(),
    );
    let mut rx = h.director.subscribe();

    h.director.start().await;
    h.director.cancel().await;

    assert_eq!(
        drain(&mut rx),
        vec![DirectorEvent::RecordingStarted, DirectorEvent::PipelineCancelled]
    );
    assert_eq!(h.recorder.calls(), vec!["start", "stop"]);
}

#[tokio::test]
async fn cancel_after_completion_has_no_effect() {
    let h = harness(
        FakeRecorder::new(speech()),
        FakeAsr::new("hello"),
        None,
        manual_options(),
    );
    let mut rx = h.director.subscribe();

    h.director.start().await;
    h.director.stop().await;
    assert!(matches!(
        drain(&mut rx).last(),
        Some(DirectorEvent::PipelineCompleted { .. })
    ));

    h.director.cancel().await;
    assert!(drain(&mut rx).is_empty());
    assert_eq!(h.recorder.calls(), vec!["start", "stop"]);

    // The next stop still reports that nothing is recording
    h.director.stop().await;
    assert!(matches!(
        drain(&mut rx).as_slice(),
        [DirectorEvent::PipelineError { error: DirectorError::NotRecording, .. }]
    ));
}

#[tokio::test]
async fn cancel_during_transcription_wins_over_completion() {
    let gate = Arc::new(Notify::new());
    let h = harness(
        FakeRecorder::new(speech()),
        FakeAsr::new("hello").gated(gate.clone()),
        None,
        manual_options(),
    );
    let mut rx = h.director.subscribe();

    h.director.start().await;
    let stopping = tokio::spawn({
        let director = h.director.clone();
        async move { director.stop().await }
    });

    assert_eq!(next_event(&mut rx).await, DirectorEvent::RecordingStarted);
    assert_eq!(next_event(&mut rx).await, DirectorEvent::TranscriptionStarted);
    h.asr.entered.notified().await;

    h.director.cancel().await;
    assert_eq!(next_event(&mut rx).await, DirectorEvent::PipelineCancelled);

    gate.notify_one();
    stopping.await.unwrap();
    assert!(drain(&mut rx).is_empty());
    assert!(!h.director.is_running());
}

#[tokio::test]
async fn dropping_stop_mid_run_cancels() {
    let gate = Arc::new(Notify::new());
    let h = harness(
        FakeRecorder::new(speech()),
        FakeAsr::new("hello").gated(gate),
        None,
        manual_options(),
    );
    let mut rx = h.director.subscribe();

    h.director.start().await;
    let stopping = tokio::spawn({
        let director = h.director.clone();
        async move { director.stop().await }
    });
    h.asr.entered.notified().await;

    stopping.abort();
    assert!(stopping.await.unwrap_err().is_cancelled());

    assert_eq!(
        drain(&mut rx),
        vec![
            DirectorEvent::RecordingStarted,
            DirectorEvent::TranscriptionStarted,
            DirectorEvent::PipelineCancelled,
        ]
    );
    assert!(!h.director.is_running());
}

#[tokio::test]
async fn abandoned_start_cancels_and_releases_recorder() {
    let h = harness(
        FakeRecorder::new(speech()).slow_start(Duration::from_millis(200)),
        FakeAsr::new("hello"),
        None,
        manual_options(),
    );
    let mut rx = h.director.subscribe();

    let result = tokio::time::timeout(Duration::from_millis(50), h.director.start()).await;
    assert!(result.is_err());

    assert_eq!(
        drain(&mut rx),
        vec![DirectorEvent::RecordingStarted, DirectorEvent::PipelineCancelled]
    );
    assert!(!h.director.is_running());

    // The device finishes opening in the background and is closed again
    tokio::time::sleep(Duration::from_millis(400)).await;
    assert!(!h.recorder.is_currently_recording());
    assert_eq!(h.recorder.calls(), vec!["start", "stop"]);

    h.director.start().await;
    assert!(h.director.is_running());
    assert!(h.recorder.is_currently_recording());
}

#[tokio::test]
async fn polishing_failure_is_terminal() {
    let h = harness(
        FakeRecorder::new(speech()),
        FakeAsr::new("hello world"),
        Some(FakeLlm::new(LlmBehavior::Fail)),
        manual_options(),
    );
    let mut rx = h.director.subscribe();

    h.director.start().await;
    h.director.stop().await;

    let events = drain(&mut rx);
    assert_eq!(events[2], DirectorEvent::PolishingStarted);
    match &events[3] {
        DirectorEvent::PipelineError { stage, error } => {
            assert_eq!(*stage, PipelineStage::Polishing);
            assert!(matches!(error, DirectorError::Plugin(_)));
        }
        other => panic!("unexpected event: {:?}", other),
    }
    assert_eq!(events.len(), 4);
}

#[tokio::test]
async fn polishing_timeout() {
    let options = DirectorOptions {
        llm_timeout_ms: 50,
        ..manual_options()
    };
    let h = harness(
        FakeRecorder::new(speech()),
        FakeAsr::new("hello world"),
        Some(FakeLlm::new(LlmBehavior::Hang)),
        options,
    );
    let mut rx = h.director.subscribe();

    h.director.start().await;
    h.director.stop().await;

    match drain(&mut rx).last() {
        Some(DirectorEvent::PipelineError { stage, error }) => {
            assert_eq!(*stage, PipelineStage::Polishing);
            assert_eq!(*error, DirectorError::PolishingTimeout(50));
            assert_eq!(error.kind(), ErrorKind::TransportFailure);
        }
        other => panic!("unexpected event: {:?}", other),
    }
}

#[tokio::test]
async fn text_processing_disabled_returns_raw_text() {
    let options = DirectorOptions {
        enable_text_processing: false,
        ..manual_options()
    };
    let h = harness(
        FakeRecorder::new(speech()),
        FakeAsr::new("hello world"),
        Some(FakeLlm::new(LlmBehavior::Reply("Hello, world.".into()))),
        options,
    );
    let mut rx = h.director.subscribe();

    h.director.start().await;
    h.director.stop().await;

    assert_eq!(
        drain(&mut rx),
        vec![
            DirectorEvent::RecordingStarted,
            DirectorEvent::TranscriptionStarted,
            DirectorEvent::PipelineCompleted {
                raw_text: "hello world".into(),
                polished_text: None,
                final_text: "hello world".into(),
            },
        ]
    );
}

#[tokio::test]
async fn without_llm_returns_raw_text() {
    let h = harness(
        FakeRecorder::new(speech()),
        FakeAsr::new("hello world"),
        None,
        manual_options(),
    );
    let mut rx = h.director.subscribe();

    h.director.start().await;
    h.director.stop().await;

    assert!(matches!(
        drain(&mut rx).last(),
        Some(DirectorEvent::PipelineCompleted { polished_text: None, final_text, .. }) if final_text == "hello world"
    ));
}

#[tokio::test]
async fn start_without_recorder_fails() {
    let h = harness(
        FakeRecorder::new(speech()),
        FakeAsr::new("hello"),
        None,
        manual_options(),
    );
    h.registry.write().unwrap().shutdown_all();
    let mut rx = h.director.subscribe();

    h.director.start().await;

    assert_eq!(
        drain(&mut rx),
        vec![DirectorEvent::PipelineError {
            stage: PipelineStage::Recording,
            error: DirectorError::NoActivePlugin(PluginCategory::Recorder),
        }]
    );
    assert!(!h.director.is_running());
}

#[tokio::test]
async fn second_start_is_ignored() {
    let h = harness(
        FakeRecorder::new(speech()),
        FakeAsr::new("hello"),
        None,
        manual_options(),
    );
    let mut rx = h.director.subscribe();

    h.director.start().await;
    h.director.start().await;
    h.director.stop().await;

    let events = drain(&mut rx);
    assert_eq!(
        events
            .iter()
            .filter(|e| **e == DirectorEvent::RecordingStarted)
            .count(),
        1
    );
    assert_eq!(h.recorder.calls(), vec!["start", "stop"]);
}

#[tokio::test]
async fn auto_stop_completes_the_run() {
    let options = DirectorOptions {
        max_recording_duration_ms: 50,
        ..Default::default()
    };
    let h = harness(
        FakeRecorder::new(speech()),
        FakeAsr::new("hello"),
        None,
        options,
    );
    let mut rx = h.director.subscribe();

    h.director.start().await;

    assert_eq!(next_event(&mut rx).await, DirectorEvent::RecordingStarted);
    assert_eq!(next_event(&mut rx).await, DirectorEvent::TranscriptionStarted);
    assert!(matches!(
        next_event(&mut rx).await,
        DirectorEvent::PipelineCompleted { .. }
    ));

    // A manual stop afterwards is a plain state failure
    h.director.stop().await;
    assert!(matches!(
        next_event(&mut rx).await,
        DirectorEvent::PipelineError { error: DirectorError::NotRecording, .. }
    ));
}

#[tokio::test]
async fn manual_stop_disarms_auto_stop() {
    let options = DirectorOptions {
        max_recording_duration_ms: 100,
        ..Default::default()
    };
    let h = harness(
        FakeRecorder::new(speech()),
        FakeAsr::new("hello"),
        None,
        options,
    );
    let mut rx = h.director.subscribe();

    h.director.start().await;
    h.director.stop().await;
    tokio::time::sleep(Duration::from_millis(250)).await;

    let events = drain(&mut rx);
    assert_eq!(events.len(), 3);
    assert!(matches!(events[2], DirectorEvent::PipelineCompleted { .. }));
}

#[tokio::test]
async fn runs_are_repeatable() {
    let h = harness(
        FakeRecorder::new(speech()),
        FakeAsr::new("again"),
        None,
        manual_options(),
    );
    let mut rx = h.director.subscribe();

    for _ in 0..3 {
        h.director.start().await;
        h.director.stop().await;
    }

    let completed = drain(&mut rx)
        .into_iter()
        .filter(|e| matches!(e, DirectorEvent::PipelineCompleted { .. }))
        .count();
    assert_eq!(completed, 3);
}

#[tokio::test]
async fn active_director_is_resolved_from_registry() {
    let h = harness(
        FakeRecorder::new(speech()),
        FakeAsr::new("hello"),
        None,
        manual_options(),
    );
    let director = h.registry.read().unwrap().active_director().unwrap();
    let mut rx = director.subscribe();

    director.start().await;
    director.stop().await;

    assert!(matches!(
        drain(&mut rx).last(),
        Some(DirectorEvent::PipelineCompleted { .. })
    ));
}

#[tokio::test]
async fn options_update_through_registry() {
    let h = harness(
        FakeRecorder::new(speech()),
        FakeAsr::new("hola mundo"),
        Some(FakeLlm::new(LlmBehavior::Reply("Hola, mundo.".into()))),
        manual_options(),
    );
    h.registry
        .read()
        .unwrap()
        .update_options(
            PluginCategory::Director,
            "director-default",
            serde_json::json!({"language": "es", "max_recording_duration_ms": 0}),
        )
        .unwrap();
    assert_eq!(h.director.options().language().name, "Spanish");

    h.director.start().await;
    h.director.stop().await;

    let prompts = h.llm.unwrap().prompts.lock().unwrap().clone();
    assert!(prompts[0].contains("LANGUAGE: Spanish"));
}
