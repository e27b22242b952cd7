//! Single-worker pipeline scheduler with a one-place mailbox.
//!
//! At most one run is in flight. A request submitted while another is still
//! waiting to start replaces it, so the worker always picks up the latest
//! state once it is free.

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::buffer::PixelBuffer;
use crate::error::{CoreError, Result};
use crate::pipeline::{EffectContext, EffectRegistry, PipelineResult, run_pipeline};
use crate::state::AppState;

#[derive(Debug, Clone, Default)]
pub struct SchedulerConfig {
    /// Fixed seed for every run. `None` draws a fresh seed per run.
    pub seed: Option<u64>,
}

/// What happened to a submitted request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submission {
    /// The mailbox was empty.
    Queued { generation: u64 },
    /// A request that had not started yet was replaced.
    Coalesced { generation: u64, replaced: u64 },
}

impl Submission {
    pub fn generation(&self) -> u64 {
        match self {
            Self::Queued { generation } | Self::Coalesced { generation, .. } => *generation,
        }
    }
}

#[derive(Debug)]
pub struct RunOutput {
    pub generation: u64,
    pub result: PipelineResult,
    pub elapsed: Duration,
}

struct Request {
    generation: u64,
    source: Arc<PixelBuffer>,
    state: AppState,
}

#[derive(Default)]
struct Mailbox {
    pending: Option<Request>,
    next_generation: u64,
    closed: bool,
}

struct Shared {
    mailbox: Mutex<Mailbox>,
    ready: Condvar,
}

pub struct PipelineScheduler {
    shared: Arc<Shared>,
    worker: Option<JoinHandle<()>>,
}

impl PipelineScheduler {
    /// Start the worker thread. Completed runs arrive on the returned receiver
    /// in completion order.
    pub fn spawn(registry: EffectRegistry, config: SchedulerConfig) -> Result<(Self, Receiver<RunOutput>)> {
        let shared = Arc::new(Shared {
            mailbox: Mutex::new(Mailbox::default()),
            ready: Condvar::new(),
        });
        let (sender, receiver) = mpsc::channel();

        let worker_shared = Arc::clone(&shared);
        let worker = thread::Builder::new()
            .name("subtone-pipeline".to_owned())
            .spawn(move || worker_loop(&worker_shared, &registry, &config, &sender))?;

        Ok((
            Self {
                shared,
                worker: Some(worker),
            },
            receiver,
        ))
    }

    /// Hand a source and a state snapshot to the worker.
    pub fn submit(&self, source: Arc<PixelBuffer>, state: AppState) -> Result<Submission> {
        let mut mailbox = self
            .shared
            .mailbox
            .lock()
            .map_err(|_| CoreError::SchedulerClosed)?;
        if mailbox.closed {
            return Err(CoreError::SchedulerClosed);
        }

        mailbox.next_generation += 1;
        let generation = mailbox.next_generation;
        let replaced = mailbox.pending.replace(Request {
            generation,
            source,
            state,
        });
        self.shared.ready.notify_one();

        Ok(match replaced {
            Some(old) => {
                debug!(generation, replaced = old.generation, "coalesced pending request");
                Submission::Coalesced {
                    generation,
                    replaced: old.generation,
                }
            }
            None => Submission::Queued { generation },
        })
    }

    /// Stop accepting requests, drop any request that has not started, let
    /// the in-flight run finish and join the worker.
    pub fn shutdown(&mut self) {
        if let Ok(mut mailbox) = self.shared.mailbox.lock() {
            mailbox.closed = true;
            if let Some(dropped) = mailbox.pending.take() {
                debug!(generation = dropped.generation, "discarded pending request on shutdown");
            }
        }
        self.shared.ready.notify_all();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!("pipeline worker panicked");
            }
        }
    }
}

impl Drop for PipelineScheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Closes the mailbox when the worker leaves its loop, including by panic, so
/// later submissions fail instead of waiting forever.
struct CloseOnExit<'a>(&'a Shared);

impl Drop for CloseOnExit<'_> {
    fn drop(&mut self) {
        let mut mailbox = self.0.mailbox.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        mailbox.closed = true;
        mailbox.pending = None;
        if thread::panicking() {
            warn!("pipeline worker stopped by a panicking effect");
        }
    }
}

fn worker_loop(shared: &Shared, registry: &EffectRegistry, config: &SchedulerConfig, sender: &Sender<RunOutput>) {
    let _close = CloseOnExit(shared);
    debug!("pipeline worker started");
    while let Some(request) = next_request(shared) {
        let started = Instant::now();
        let mut ctx = EffectContext::new(config.seed);
        let result = run_pipeline(&request.source, &request.state, registry, &mut ctx);
        let elapsed = started.elapsed();

        info!(
            generation = request.generation,
            effect = %request.state.active_effect,
            width = result.frame.width,
            height = result.frame.height,
            elapsed_ms = elapsed.as_millis() as u64,
            "pipeline run complete"
        );
        let output = RunOutput {
            generation: request.generation,
            result,
            elapsed,
        };
        if sender.send(output).is_err() {
            debug!("result receiver dropped");
        }
    }
    debug!("pipeline worker stopped");
}

/// Block until a request is waiting or the scheduler closes.
fn next_request(shared: &Shared) -> Option<Request> {
    let mut mailbox = shared.mailbox.lock().ok()?;
    loop {
        if mailbox.closed {
            return None;
        }
        if let Some(request) = mailbox.pending.take() {
            return Some(request);
        }
        mailbox = shared.ready.wait(mailbox).ok()?;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::{EffectId, ParameterSet};
    use crate::pipeline::PixelEffect;

    /// Signals when a run starts, then waits for a release token.
    struct GateEffect {
        started: Mutex<Sender<()>>,
        release: Mutex<Receiver<()>>,
    }

    impl PixelEffect for GateEffect {
        fn process(&self, input: PixelBuffer, _params: &ParameterSet, _ctx: &mut EffectContext) -> PixelBuffer {
            let _ = self.started.lock().unwrap().send(());
            let _ = self.release.lock().unwrap().recv();
            input
        }
    }

    fn gated_registry() -> (EffectRegistry, Receiver<()>, Sender<()>) {
        let (started_tx, started_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel();
        let mut registry = EffectRegistry::with_builtins();
        registry.register(
            EffectId::Dithering,
            Box::new(GateEffect {
                started: Mutex::new(started_tx),
                release: Mutex::new(release_rx),
            }),
        );
        (registry, started_rx, release_tx)
    }

    #[test]
    fn test_single_request_runs() {
        let (scheduler, results) =
            PipelineScheduler::spawn(EffectRegistry::with_builtins(), SchedulerConfig { seed: Some(1) }).unwrap();
        let source = Arc::new(PixelBuffer::filled(4, 4, [0, 0, 0, 255]));
        let submission = scheduler.submit(source, AppState::default()).unwrap();
        assert_eq!(submission, Submission::Queued { generation: 1 });
        let output = results.recv_timeout(Duration::from_secs(10)).unwrap();
        assert_eq!(output.generation, 1);
        assert_eq!(output.result.frame.pixel(0, 0), &[0, 0, 0, 255]);
    }

    #[test]
    fn test_requests_during_a_run_coalesce_to_the_latest() {
        let (registry, started, release) = gated_registry();
        let (scheduler, results) = PipelineScheduler::spawn(registry, SchedulerConfig::default()).unwrap();
        let source = Arc::new(PixelBuffer::filled(2, 2, [9, 9, 9, 255]));

        scheduler.submit(Arc::clone(&source), AppState::default()).unwrap();
        started.recv_timeout(Duration::from_secs(10)).unwrap();

        // first run is now blocked inside the effect
        let second = scheduler.submit(Arc::clone(&source), AppState::default()).unwrap();
        let third = scheduler.submit(Arc::clone(&source), AppState::default()).unwrap();
        assert_eq!(second, Submission::Queued { generation: 2 });
        assert_eq!(third, Submission::Coalesced { generation: 3, replaced: 2 });

        release.send(()).unwrap();
        release.send(()).unwrap();

        let first = results.recv_timeout(Duration::from_secs(10)).unwrap();
        let last = results.recv_timeout(Duration::from_secs(10)).unwrap();
        assert_eq!(first.generation, 1);
        assert_eq!(last.generation, 3);
        assert!(results.recv_timeout(Duration::from_millis(200)).is_err());
    }

    struct PanicEffect;

    impl PixelEffect for PanicEffect {
        fn process(&self, _input: PixelBuffer, _params: &ParameterSet, _ctx: &mut EffectContext) -> PixelBuffer {
            panic!("effect failed");
        }
    }

    #[test]
    fn test_panicking_effect_closes_the_scheduler() {
        let mut registry = EffectRegistry::with_builtins();
        registry.register(EffectId::Dithering, Box::new(PanicEffect));
        let (mut scheduler, results) = PipelineScheduler::spawn(registry, SchedulerConfig::default()).unwrap();
        let source = Arc::new(PixelBuffer::new(2, 2));

        scheduler.submit(Arc::clone(&source), AppState::default()).unwrap();
        // the worker drops its sender while unwinding, after closing the mailbox
        assert!(matches!(
            results.recv_timeout(Duration::from_secs(10)),
            Err(mpsc::RecvTimeoutError::Disconnected)
        ));

        let err = scheduler.submit(source, AppState::default()).unwrap_err();
        assert!(matches!(err, CoreError::SchedulerClosed));
        scheduler.shutdown();
    }

    #[test]
    fn test_submit_after_shutdown_fails() {
        let (mut scheduler, _results) =
            PipelineScheduler::spawn(EffectRegistry::with_builtins(), SchedulerConfig::default()).unwrap();
        scheduler.shutdown();
        let err = scheduler
            .submit(Arc::new(PixelBuffer::new(1, 1)), AppState::default())
            .unwrap_err();
        assert!(matches!(err, CoreError::SchedulerClosed));
    }

    #[test]
    fn test_shutdown_waits_for_in_flight_run_and_drops_pending() {
        let (registry, started, release) = gated_registry();
        let (mut scheduler, results) = PipelineScheduler::spawn(registry, SchedulerConfig::default()).unwrap();
        let source = Arc::new(PixelBuffer::new(1, 1));

        scheduler.submit(Arc::clone(&source), AppState::default()).unwrap();
        started.recv_timeout(Duration::from_secs(10)).unwrap();
        scheduler.submit(Arc::clone(&source), AppState::default()).unwrap();

        // release the first run only once shutdown has closed the mailbox
        let releaser = thread::spawn(move || {
            thread::sleep(Duration::from_millis(100));
            let _ = release.send(());
            let _ = release.send(());
        });
        scheduler.shutdown();
        releaser.join().unwrap();

        let outputs: Vec<u64> = results.try_iter().map(|o| o.generation).collect();
        assert_eq!(outputs, vec![1]);
    }
}
