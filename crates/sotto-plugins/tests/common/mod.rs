//! Fake plugins shared by the integration tests

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use sotto_plugins::{
    AsrPlugin, AsrRequest, AsrResponse, DirectorEvent, DirectorOptions, DirectorPipeline,
    Lifecycle, LlmPlugin, LlmRequest, LlmResponse, Plugin, PluginCategory, PluginError,
    PluginHandle, PluginRegistry, RecorderPlugin, RecorderResponse, SharedRegistry,
};
use tokio::sync::{broadcast, Notify};

pub struct FakeRecorder {
    lifecycle: Lifecycle,
    recording: AtomicBool,
    audio: Vec<u8>,
    fail_stop: bool,
    start_delay: Option<Duration>,
    pub calls: Mutex<Vec<&'static str>>,
}

impl FakeRecorder {
    pub fn new(audio: Vec<u8>) -> Self {
        Self {
            lifecycle: Lifecycle::new(),
            recording: AtomicBool::new(false),
            audio,
            fail_stop: false,
            start_delay: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing_stop(mut self) -> Self {
        self.fail_stop = true;
        self
    }

    /// Device that takes `delay` to open
    pub fn slow_start(mut self, delay: Duration) -> Self {
        self.start_delay = Some(delay);
        self
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }
}

impl Plugin for FakeRecorder {
    fn id(&self) -> &str {
        "fake-recorder"
    }

    fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    fn update_options(&self, _options: serde_json::Value) -> Result<(), PluginError> {
        Ok(())
    }
}

impl RecorderPlugin for FakeRecorder {
    fn is_currently_recording(&self) -> bool {
        self.recording.load(Ordering::SeqCst)
    }

    fn start_recording(&self) -> Result<(), PluginError> {
        self.calls.lock().unwrap().push("start");
        if let Some(delay) = self.start_delay {
            std::thread::sleep(delay);
        }
        self.recording.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn stop_recording(&self) -> Result<RecorderResponse, PluginError> {
        self.calls.lock().unwrap().push("stop");
        if !self.recording.swap(false, Ordering::SeqCst) {
            return Err(PluginError::Recorder("not recording".into()));
        }
        if self.fail_stop {
            return Err(PluginError::Recorder("device unplugged".into()));
        }
        Ok(RecorderResponse {
            audio_data: self.audio.clone(),
        })
    }
}

pub struct FakeAsr {
    lifecycle: Lifecycle,
    text: String,
    /// When set, transcription waits for a notification
    gate: Option<Arc<Notify>>,
    pub entered: Arc<Notify>,
    pub sample_counts: Mutex<Vec<usize>>,
}

impl FakeAsr {
    pub fn new(text: &str) -> Self {
        Self {
            lifecycle: Lifecycle::new(),
            text: text.to_string(),
            gate: None,
            entered: Arc::new(Notify::new()),
            sample_counts: Mutex::new(Vec::new()),
        }
    }

    pub fn gated(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }
}

impl Plugin for FakeAsr {
    fn id(&self) -> &str {
        "fake-asr"
    }

    fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    fn update_options(&self, _options: serde_json::Value) -> Result<(), PluginError> {
        Ok(())
    }
}

#[async_trait]
impl AsrPlugin for FakeAsr {
    async fn transcribe(&self, request: AsrRequest) -> Result<AsrResponse, PluginError> {
        self.sample_counts.lock().unwrap().push(request.samples.len());
        self.entered.notify_one();
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        Ok(AsrResponse {
            text: self.text.clone(),
        })
    }
}

pub enum LlmBehavior {
    Reply(String),
    Fail,
    Hang,
}

pub struct FakeLlm {
    lifecycle: Lifecycle,
    behavior: LlmBehavior,
    pub prompts: Mutex<Vec<String>>,
}

impl FakeLlm {
    pub fn new(behavior: LlmBehavior) -> Self {
        Self {
            lifecycle: Lifecycle::new(),
            behavior,
            prompts: Mutex::new(Vec::new()),
        }
    }
}

impl Plugin for FakeLlm {
    fn id(&self) -> &str {
        "fake-llm"
    }

    fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    fn update_options(&self, _options: serde_json::Value) -> Result<(), PluginError> {
        Ok(())
    }
}

#[async_trait]
impl LlmPlugin for FakeLlm {
    async fn generate(&self, request: LlmRequest) -> Result<LlmResponse, PluginError> {
        self.prompts.lock().unwrap().push(request.text);
        match &self.behavior {
            LlmBehavior::Reply(text) => Ok(LlmResponse { text: text.clone() }),
            LlmBehavior::Fail => Err(PluginError::Generation("model crashed".into())),
            LlmBehavior::Hang => {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Err(PluginError::Timeout("hung".into()))
            }
        }
    }

    async fn list_models(&self) -> Result<Vec<String>, PluginError> {
        Ok(vec!["fake".into()])
    }
}

pub struct Harness {
    pub registry: SharedRegistry,
    pub director: Arc<DirectorPipeline>,
    pub recorder: Arc<FakeRecorder>,
    pub asr: Arc<FakeAsr>,
    pub llm: Option<Arc<FakeLlm>>,
}

pub fn harness(
    recorder: FakeRecorder,
    asr: FakeAsr,
    llm: Option<FakeLlm>,
    options: DirectorOptions,
) -> Harness {
    let registry = PluginRegistry::new().into_shared();
    let recorder = Arc::new(recorder);
    let asr = Arc::new(asr);
    let llm = llm.map(Arc::new);
    let director = Arc::new(DirectorPipeline::new(&registry, options));

    {
        let mut reg = registry.write().unwrap();
        reg.register(PluginHandle::Recorder(recorder.clone())).unwrap();
        reg.set_active_by_id(PluginCategory::Recorder, "fake-recorder").unwrap();
        reg.register(PluginHandle::Asr(asr.clone())).unwrap();
        reg.set_active_by_id(PluginCategory::Asr, "fake-asr").unwrap();
        if let Some(llm) = &llm {
            reg.register(PluginHandle::Llm(llm.clone())).unwrap();
            reg.set_active_by_id(PluginCategory::Llm, "fake-llm").unwrap();
        }
        reg.register(PluginHandle::Director(director.clone())).unwrap();
        reg.set_active_by_id(PluginCategory::Director, DirectorPipeline::ID).unwrap();
    }

    Harness {
        registry,
        director,
        recorder,
        asr,
        llm,
    }
}

/// Options with the auto-stop timer off so tests control stop()
pub fn manual_options() -> DirectorOptions {
    DirectorOptions {
        max_recording_duration_ms: 0,
        ..Default::default()
    }
}

pub async fn next_event(rx: &mut broadcast::Receiver<DirectorEvent>) -> DirectorEvent {
    tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("timed out waiting for director event")
        .expect("event channel closed")
}

/// Events already sent, without waiting
pub fn drain(rx: &mut broadcast::Receiver<DirectorEvent>) -> Vec<DirectorEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}
