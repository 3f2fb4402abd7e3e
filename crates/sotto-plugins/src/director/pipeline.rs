//! Default director: record, transcribe, polish
//!
//! One run at a time. A run exists from `start()` until its terminal event.
//! `start()` and `stop()` serialize on the pipeline lock; `cancel()` does not
//! take it. Instead every event goes through the run state mutex and is only
//! sent while its run is still current, so exactly one terminal event is
//! committed per run whichever side gets there first.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, Weak};

use async_trait::async_trait;
use sotto_core::pcm16_to_f32;
use tokio::sync::broadcast;
use tokio::task::{JoinError, JoinHandle};
use tracing::{debug, error, info, warn};

use super::events::{DirectorEvent, PipelineStage};
use super::options::DirectorOptions;
use super::prompt::build_polishing_prompt;
use crate::contracts::{AsrPlugin, AsrRequest, DirectorPlugin, LlmPlugin, LlmRequest, RecorderPlugin};
use crate::error::{DirectorError, PluginError};
use crate::plugin::{parse_options, Lifecycle, Plugin, PluginCategory};
use crate::registry::{PluginRegistry, SharedRegistry};

const EVENT_CAPACITY: usize = 64;

/// Plugins resolved when a run starts
#[derive(Clone)]
struct RunPlugins {
    recorder: Arc<dyn RecorderPlugin>,
    asr: Arc<dyn AsrPlugin>,
    llm: Option<Arc<dyn LlmPlugin>>,
}

struct ActiveRun {
    id: u64,
    plugins: RunPlugins,
    auto_stop: Option<JoinHandle<()>>,
}

#[derive(Default)]
struct RunState {
    current: Option<ActiveRun>,
    next_id: u64,
}

struct Inner {
    lifecycle: Lifecycle,
    registry: Weak<RwLock<PluginRegistry>>,
    options: Mutex<DirectorOptions>,
    pipeline_lock: tokio::sync::Mutex<()>,
    run: Mutex<RunState>,
    cancelled: AtomicBool,
    events: broadcast::Sender<DirectorEvent>,
}

/// Director that resolves its plugins from a [`PluginRegistry`]
///
/// Holds a weak handle so the registry can own the director.
#[derive(Clone)]
pub struct DirectorPipeline {
    inner: Arc<Inner>,
}

impl DirectorPipeline {
    pub const ID: &'static str = "director-default";

    pub fn new(registry: &SharedRegistry, options: DirectorOptions) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                lifecycle: Lifecycle::new(),
                registry: Arc::downgrade(registry),
                options: Mutex::new(options),
                pipeline_lock: tokio::sync::Mutex::new(()),
                run: Mutex::new(RunState::default()),
                cancelled: AtomicBool::new(false),
                events,
            }),
        }
    }

    pub fn options(&self) -> DirectorOptions {
        self.inner.options()
    }

    pub fn set_options(&self, options: DirectorOptions) {
        *self.inner.options.lock().unwrap_or_else(PoisonError::into_inner) = options;
    }

    /// Whether a run is between `start()` and its terminal event
    pub fn is_running(&self) -> bool {
        self.inner.run_state().current.is_some()
    }
}

impl Plugin for DirectorPipeline {
    fn id(&self) -> &str {
        Self::ID
    }

    fn lifecycle(&self) -> &Lifecycle {
        &self.inner.lifecycle
    }

    fn update_options(&self, options: serde_json::Value) -> Result<(), PluginError> {
        let options: DirectorOptions = parse_options(Self::ID, options)?;
        self.set_options(options);
        Ok(())
    }

    fn on_shutdown(&self) -> Result<(), PluginError> {
        if let Some(run) = self.inner.run_state().current.as_mut() {
            if let Some(timer) = run.auto_stop.take() {
                timer.abort();
            }
        }
        Ok(())
    }
}

#[async_trait]
impl DirectorPlugin for DirectorPipeline {
    async fn start(&self) {
        self.inner.start().await;
    }

    async fn stop(&self) {
        self.inner.stop_run(None).await;
    }

    async fn cancel(&self) {
        self.inner.cancel().await;
    }

    fn subscribe(&self) -> broadcast::Receiver<DirectorEvent> {
        self.inner.events.subscribe()
    }
}

impl Inner {
    fn run_state(&self) -> MutexGuard<'_, RunState> {
        self.run.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn options(&self) -> DirectorOptions {
        self.options
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn send(&self, event: DirectorEvent) {
        debug!("Director event: {:?}", event);
        // No subscribers is fine
        let _ = self.events.send(event);
    }

    fn is_current(&self, run_id: u64) -> bool {
        matches!(&self.run_state().current, Some(run) if run.id == run_id)
    }

    /// Send a stage event if the run is still in flight
    fn emit_stage(&self, run_id: u64, event: DirectorEvent) -> bool {
        let state = self.run_state();
        match &state.current {
            Some(run) if run.id == run_id => {
                self.send(event);
                true
            }
            _ => false,
        }
    }

    /// Commit the terminal event of a run. Later commits for the same run are dropped.
    fn finish(&self, run_id: u64, event: DirectorEvent) -> bool {
        let mut state = self.run_state();
        if !matches!(&state.current, Some(run) if run.id == run_id) {
            return false;
        }
        if let Some(timer) = state.current.take().and_then(|run| run.auto_stop) {
            timer.abort();
        }
        if event == DirectorEvent::PipelineCancelled {
            self.cancelled.store(true, Ordering::SeqCst);
        }
        self.send(event);
        true
    }

    fn fail(&self, run_id: u64, stage: PipelineStage, error: DirectorError) {
        error!("Pipeline failed during {:?}: {}", stage, error);
        self.finish(run_id, DirectorEvent::PipelineError { stage, error });
    }

    fn resolve_plugins(&self) -> Result<RunPlugins, DirectorError> {
        let shared = self
            .registry
            .upgrade()
            .ok_or(DirectorError::RegistryUnavailable)?;
        let registry = shared.read().unwrap_or_else(PoisonError::into_inner);

        Ok(RunPlugins {
            recorder: registry
                .active_recorder()
                .ok_or(DirectorError::NoActivePlugin(PluginCategory::Recorder))?,
            asr: registry
                .active_asr()
                .ok_or(DirectorError::NoActivePlugin(PluginCategory::Asr))?,
            llm: registry.active_llm(),
        })
    }

    async fn start(self: &Arc<Self>) {
        let _pipeline = self.pipeline_lock.lock().await;

        if self.run_state().current.is_some() {
            warn!("Pipeline already running, ignoring start");
            return;
        }
        self.cancelled.store(false, Ordering::SeqCst);

        let plugins = match self.resolve_plugins() {
            Ok(plugins) => plugins,
            Err(e) => {
                error!("Failed to start recording: {}", e);
                self.send(DirectorEvent::PipelineError {
                    stage: PipelineStage::Recording,
                    error: e,
                });
                return;
            }
        };
        let recorder = plugins.recorder.clone();

        let run_id = {
            let mut state = self.run_state();
            state.next_id += 1;
            let id = state.next_id;
            state.current = Some(ActiveRun {
                id,
                plugins,
                auto_stop: None,
            });
            self.send(DirectorEvent::RecordingStarted);
            id
        };

        let guard = CancelOnDrop::new(self, run_id).stopping(recorder.clone());

        let starting = recorder.clone();
        let inner = Arc::clone(self);
        let started = joined(
            tokio::task::spawn_blocking(move || -> Result<(), PluginError> {
                starting.start_recording()?;
                // Cancelled, or start() abandoned, while the recorder was starting up
                if !inner.is_current(run_id) && starting.is_currently_recording() {
                    if let Err(e) = starting.stop_recording() {
                        error!("Failed to stop recording after cancel: {}", e);
                    }
                }
                Ok(())
            })
            .await,
        );
        guard.disarm();

        if let Err(e) = started {
            self.fail(run_id, PipelineStage::Recording, e);
            return;
        }
        if !self.is_current(run_id) {
            return;
        }

        info!("Recording started");
        if let Some(limit) = self.options().max_recording_duration() {
            let weak = Arc::downgrade(self);
            let timer = tokio::spawn(async move {
                tokio::time::sleep(limit).await;
                if let Some(inner) = weak.upgrade() {
                    info!("Auto-stop timer triggered after {} ms", limit.as_millis());
                    // Separate task: stop() aborts this timer
                    tokio::spawn(async move { inner.stop_run(Some(run_id)).await });
                }
            });

            let mut state = self.run_state();
            match state.current.as_mut() {
                Some(run) if run.id == run_id => run.auto_stop = Some(timer),
                _ => timer.abort(),
            }
        }
    }

    /// Stop the current run. `expected_run` is set by the auto-stop timer,
    /// which stays silent when its run is already over.
    async fn stop_run(&self, expected_run: Option<u64>) {
        let _pipeline = self.pipeline_lock.lock().await;

        let (run_id, plugins) = {
            let mut state = self.run_state();
            if self.cancelled.load(Ordering::SeqCst) {
                info!("Pipeline was cancelled, skipping stop");
                return;
            }
            match state.current.as_mut() {
                Some(run) if expected_run.map_or(true, |id| id == run.id) => {
                    if let Some(timer) = run.auto_stop.take() {
                        timer.abort();
                    }
                    (run.id, run.plugins.clone())
                }
                Some(_) => return,
                None => {
                    if expected_run.is_none() {
                        warn!("stop() called without a recording in progress");
                        self.send(DirectorEvent::PipelineError {
                            stage: PipelineStage::Recording,
                            error: DirectorError::NotRecording,
                        });
                    }
                    return;
                }
            }
        };

        let _cancel_on_drop = CancelOnDrop::new(self, run_id);
        self.execute(run_id, plugins).await;
    }

    async fn execute(&self, run_id: u64, plugins: RunPlugins) {
        let options = self.options();

        let recorder = plugins.recorder.clone();
        let audio = match joined(tokio::task::spawn_blocking(move || recorder.stop_recording()).await) {
            Ok(response) => response.audio_data,
            Err(e) => {
                self.fail(run_id, PipelineStage::Recording, e);
                return;
            }
        };
        debug!("Recorded {} bytes", audio.len());

        if !self.emit_stage(run_id, DirectorEvent::TranscriptionStarted) {
            return;
        }
        let request = AsrRequest {
            samples: pcm16_to_f32(&audio),
            audio_info: plugins.recorder.audio_info(),
        };
        let raw_text = match plugins.asr.transcribe(request).await {
            Ok(response) => response.text,
            Err(e) => {
                self.fail(run_id, PipelineStage::Transcription, e.into());
                return;
            }
        };

        if !self.is_current(run_id) {
            return;
        }
        if raw_text.trim().is_empty() {
            warn!("Empty transcription, skipping polishing");
            self.fail(run_id, PipelineStage::Transcription, DirectorError::EmptyTranscription);
            return;
        }

        let polished_text = match plugins.llm {
            Some(llm) if options.enable_text_processing => {
                if !self.emit_stage(run_id, DirectorEvent::PolishingStarted) {
                    return;
                }
                let prompt = build_polishing_prompt(
                    &raw_text,
                    &options.language(),
                    &options.custom_context,
                    &options.custom_vocabulary,
                );
                match tokio::time::timeout(options.llm_timeout(), llm.generate(LlmRequest { text: prompt })).await {
                    Ok(Ok(response)) => Some(response.text.trim().to_string()),
                    Ok(Err(e)) => {
                        self.fail(run_id, PipelineStage::Polishing, e.into());
                        return;
                    }
                    Err(_) => {
                        self.fail(
                            run_id,
                            PipelineStage::Polishing,
                            DirectorError::PolishingTimeout(options.llm_timeout_ms),
                        );
                        return;
                    }
                }
            }
            _ => None,
        };

        let final_text = polished_text.clone().unwrap_or_else(|| raw_text.clone());
        if self.finish(
            run_id,
            DirectorEvent::PipelineCompleted {
                raw_text,
                polished_text,
                final_text,
            },
        ) {
            info!("Pipeline completed");
        }
    }

    async fn cancel(&self) {
        let (run_id, recorder) = {
            let state = self.run_state();
            match &state.current {
                Some(run) => (run.id, run.plugins.recorder.clone()),
                None => {
                    debug!("Nothing to cancel");
                    return;
                }
            }
        };

        if !self.finish(run_id, DirectorEvent::PipelineCancelled) {
            return;
        }
        info!("Pipeline cancelled");

        if recorder.is_currently_recording() {
            match joined(tokio::task::spawn_blocking(move || recorder.stop_recording()).await) {
                Ok(_) => debug!("Recorder stopped during cancel"),
                Err(e) => error!("Failed to stop recording during cancel: {}", e),
            }
        }
    }
}

/// Turns an abandoned `start()` or `stop()` into a cancellation
struct CancelOnDrop<'a> {
    inner: &'a Inner,
    run_id: u64,
    recorder: Option<Arc<dyn RecorderPlugin>>,
    armed: bool,
}

impl<'a> CancelOnDrop<'a> {
    fn new(inner: &'a Inner, run_id: u64) -> Self {
        Self {
            inner,
            run_id,
            recorder: None,
            armed: true,
        }
    }

    /// Also force-stop this recorder when the guard fires
    fn stopping(mut self, recorder: Arc<dyn RecorderPlugin>) -> Self {
        self.recorder = Some(recorder);
        self
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for CancelOnDrop<'_> {
    fn drop(&mut self) {
        if !self.armed || !self.inner.finish(self.run_id, DirectorEvent::PipelineCancelled) {
            return;
        }
        info!("Pipeline cancelled: caller stopped waiting");

        let Some(recorder) = self.recorder.take() else {
            return;
        };
        if !recorder.is_currently_recording() {
            return;
        }
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                drop(handle.spawn_blocking(move || {
                    if let Err(e) = recorder.stop_recording() {
                        error!("Failed to stop recording during cancel: {}", e);
                    }
                }));
            }
            Err(_) => warn!("No runtime to stop the recorder on"),
        }
    }
}

fn joined<T>(result: Result<Result<T, PluginError>, JoinError>) -> Result<T, DirectorError> {
    match result {
        Ok(inner) => inner.map_err(DirectorError::from),
        Err(e) => Err(DirectorError::Task(e.to_string())),
    }
}
