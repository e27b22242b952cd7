use std::sync::Arc;
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};

use subtone_core::{
    AppState, EffectRegistry, PipelineScheduler, PixelBuffer, RunOutput, SchedulerConfig, StateMessage,
};
use tracing::{debug, warn};

use crate::message::Message;

/// One interactive editing session: a source image, the parameter record and
/// the most recent pipeline output.
///
/// Every message that changes the record resubmits the pipeline. Rapid edits
/// coalesce in the scheduler, so only the latest state is guaranteed to run.
pub struct Session {
    pub state: AppState,
    pub source: Option<Arc<PixelBuffer>>,
    pub latest: Option<RunOutput>,
    pub status_message: String,
    last_submitted: Option<u64>,
    scheduler: PipelineScheduler,
    results: Receiver<RunOutput>,
}

impl Session {
    pub fn new(registry: EffectRegistry, config: SchedulerConfig) -> subtone_core::Result<Self> {
        let (scheduler, results) = PipelineScheduler::spawn(registry, config)?;
        Ok(Self {
            state: AppState::default(),
            source: None,
            latest: None,
            status_message: String::new(),
            last_submitted: None,
            scheduler,
            results,
        })
    }

    pub fn with_state(mut self, state: AppState) -> Self {
        self.state = state;
        self
    }

    /// Apply a message. Returns true if a pipeline run was submitted.
    pub fn update(&mut self, message: Message) -> bool {
        match message {
            Message::OpenImage(path) => {
                let loaded = subtone_media::load_image(&path).map_err(|e| e.to_string());
                self.update(Message::ImageLoaded(loaded))
            }
            Message::ImageLoaded(result) => match result {
                Ok(buffer) => {
                    self.status_message = format!("Loaded {}x{} image", buffer.width, buffer.height);
                    self.source = Some(Arc::new(buffer));
                    self.latest = None;
                    self.submit()
                }
                Err(e) => {
                    warn!(error = %e, "image load failed");
                    self.status_message = format!("Load failed: {e}");
                    false
                }
            },
            Message::Edit(edit) => self.apply(edit),
            Message::Patch(patch) => match self.state.parse_patch(&patch) {
                Ok(edit) => self.apply(edit),
                Err(e) => {
                    warn!(patch = %patch, error = %e, "ignoring parameter patch");
                    self.status_message = format!("Patch failed: {e}");
                    false
                }
            },
            Message::LoadState(path) => match AppState::load(&path) {
                Ok(state) => {
                    let changed = state != self.state;
                    self.state = state;
                    self.status_message = format!("Loaded state from {}", path.display());
                    changed && self.submit()
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "state file rejected");
                    self.status_message = format!("State load failed: {e}");
                    false
                }
            },
        }
    }

    fn apply(&mut self, edit: StateMessage) -> bool {
        match self.state.update(edit) {
            Ok(true) => self.submit(),
            Ok(false) => {
                debug!("state unchanged, no run submitted");
                false
            }
            Err(e) => {
                warn!(error = %e, "state update rejected");
                self.status_message = format!("Update failed: {e}");
                false
            }
        }
    }

    fn submit(&mut self) -> bool {
        let Some(source) = &self.source else {
            return false;
        };
        match self.scheduler.submit(Arc::clone(source), self.state.snapshot()) {
            Ok(submission) => {
                self.last_submitted = Some(submission.generation());
                true
            }
            Err(e) => {
                self.status_message = format!("Render failed: {e}");
                false
            }
        }
    }

    /// True when the latest submitted state has been rendered.
    pub fn is_current(&self) -> bool {
        match (self.last_submitted, &self.latest) {
            (None, _) => true,
            (Some(submitted), Some(latest)) => latest.generation >= submitted,
            (Some(_), None) => false,
        }
    }

    /// Take any finished runs without blocking. Returns true if `latest`
    /// changed.
    pub fn poll(&mut self) -> bool {
        let mut changed = false;
        while let Ok(output) = self.results.try_recv() {
            changed |= self.accept(output);
        }
        changed
    }

    /// Block until the latest submitted state has been rendered or `timeout`
    /// elapses.
    pub fn wait_latest(&mut self, timeout: Duration) -> Option<&RunOutput> {
        let deadline = Instant::now() + timeout;
        self.poll();
        while !self.is_current() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.results.recv_timeout(remaining) {
                Ok(output) => {
                    self.accept(output);
                }
                Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => break,
            }
        }
        if self.is_current() { self.latest.as_ref() } else { None }
    }

    fn accept(&mut self, output: RunOutput) -> bool {
        if self
            .latest
            .as_ref()
            .is_some_and(|latest| latest.generation >= output.generation)
        {
            debug!(generation = output.generation, "stale run output dropped");
            return false;
        }
        self.status_message = format!(
            "Rendered {} in {} ms",
            output.result.effect.map_or("no effect", |e| e.display_name()),
            output.elapsed.as_millis()
        );
        self.latest = Some(output);
        true
    }
}
