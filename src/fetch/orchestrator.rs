// src/fetch/orchestrator.rs

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::{
    sync::{mpsc, watch},
    task::{JoinError, JoinHandle},
    time::{sleep, timeout},
};
use tokio_util::{sync::CancellationToken, task::AbortOnDropHandle};
use tracing::{debug, info, warn};

use super::backoff::{BackoffPolicy, FetchAttemptState, Generation};
use super::CsvSource;
use crate::error::{AttemptError, FetchError};
use crate::history::SnapshotCache;
use crate::process::{aggregate::Aggregate, process_csv, ProcessOptions};
use crate::reconcile::{Decision, DisplayState, DonationSnapshot, Gate};

/// Everything the loop needs besides the source and the gate.
#[derive(Clone, Copy, Debug)]
pub struct OrchestratorSettings {
    pub backoff: BackoffPolicy,
    pub request_timeout: Duration,
    pub goal_amount: f64,
    pub process: ProcessOptions,
}

/// Operator-facing details about recent attempts.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Diagnostics {
    pub attempts: u64,
    pub consecutive_failures: u32,
    pub next_retry_ms: u64,
    pub last_error: Option<String>,
    pub last_error_at: Option<DateTime<Utc>>,
    pub last_success_at: Option<DateTime<Utc>>,
}

/// Published after every attempt, success or not.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Status {
    pub display: DisplayState,
    pub diagnostics: Diagnostics,
}

/// Drives fetch → process → reconcile on a fixed-delay schedule.
pub struct Orchestrator<S: CsvSource> {
    source: Arc<S>,
    settings: OrchestratorSettings,
    gate: Gate,
    state: FetchAttemptState,
    diagnostics: Diagnostics,
    cache: Option<SnapshotCache>,
    in_flight: Arc<AtomicBool>,
    status_tx: watch::Sender<Status>,
    status_rx: watch::Receiver<Status>,
    trigger_tx: mpsc::Sender<()>,
    trigger_rx: mpsc::Receiver<()>,
    shutdown: CancellationToken,
}

/// Control surface for a spawned orchestrator.
pub struct OrchestratorHandle {
    trigger_tx: mpsc::Sender<()>,
    in_flight: Arc<AtomicBool>,
    status_rx: watch::Receiver<Status>,
    shutdown: CancellationToken,
    task: JoinHandle<Gate>,
}

impl OrchestratorHandle {
    /// Ask for an immediate fetch. Returns `false` when one is already
    /// running or already requested; the request is dropped, not queued.
    pub fn trigger(&self) -> bool {
        if self.in_flight.load(Ordering::SeqCst) {
            debug!("trigger ignored: fetch in flight");
            return false;
        }
        self.trigger_tx.try_send(()).is_ok()
    }

    /// Receiver for status updates; the current value counts as seen.
    pub fn status(&self) -> watch::Receiver<Status> {
        self.status_rx.clone()
    }

    /// Cancel the loop (abandoning any in-flight fetch) and return the gate.
    pub async fn shutdown(self) -> Result<Gate, JoinError> {
        self.shutdown.cancel();
        self.task.await
    }
}

impl<S: CsvSource> Orchestrator<S> {
    pub fn new(source: S, settings: OrchestratorSettings, gate: Gate) -> Self {
        let diagnostics = Diagnostics {
            next_retry_ms: settings.backoff.base.as_millis() as u64,
            ..Diagnostics::default()
        };
        let initial = Status {
            display: gate.accepted().view(settings.goal_amount),
            diagnostics: diagnostics.clone(),
        };
        let (status_tx, status_rx) = watch::channel(initial);
        let (trigger_tx, trigger_rx) = mpsc::channel(1);
        Self {
            source: Arc::new(source),
            settings,
            gate,
            state: FetchAttemptState::new(settings.backoff),
            diagnostics,
            cache: None,
            in_flight: Arc::new(AtomicBool::new(false)),
            status_tx,
            status_rx,
            trigger_tx,
            trigger_rx,
            shutdown: CancellationToken::new(),
        }
    }

    /// Persist every accepted snapshot to `cache`.
    pub fn with_cache(mut self, cache: SnapshotCache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Run the loop on the tokio runtime.
    pub fn spawn(self) -> OrchestratorHandle {
        let trigger_tx = self.trigger_tx.clone();
        let in_flight = Arc::clone(&self.in_flight);
        let status_rx = self.status_rx.clone();
        let shutdown = self.shutdown.clone();
        let task = tokio::spawn(self.run());
        OrchestratorHandle {
            trigger_tx,
            in_flight,
            status_rx,
            shutdown,
            task,
        }
    }

    async fn run(mut self) -> Gate {
        let shutdown = self.shutdown.clone();
        info!(
            interval_ms = self.settings.backoff.base.as_millis() as u64,
            policy = ?self.gate.policy(),
            "orchestrator started"
        );

        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                _ = self.attempt() => {}
            }

            while self.trigger_rx.try_recv().is_ok() {
                debug!("dropped trigger received during fetch");
            }
            // cleared only after the drain so a trigger accepted from here on survives
            self.in_flight.store(false, Ordering::SeqCst);

            let delay = self.state.next_interval();
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                Some(()) = self.trigger_rx.recv() => debug!("explicit trigger"),
                _ = sleep(delay) => {}
            }
        }

        info!("orchestrator stopped");
        self.gate
    }

    /// One complete fetch cycle. The request runs on its own task, aborted on
    /// timeout or when this future is dropped at shutdown. Leaves `in_flight`
    /// set for `run` to clear.
    async fn attempt(&mut self) {
        let Some(generation) = self.state.begin() else {
            return;
        };
        self.in_flight.store(true, Ordering::SeqCst);
        self.diagnostics.attempts += 1;
        let fetched_at = Utc::now();
        debug!(generation, "fetch started");

        let source = Arc::clone(&self.source);
        let mut task =
            AbortOnDropHandle::new(tokio::spawn(async move { source.fetch_csv().await }));
        let body = match timeout(self.settings.request_timeout, &mut task).await {
            Ok(Ok(res)) => res,
            Ok(Err(join)) => Err(FetchError::Aborted(join.to_string())),
            Err(_) => {
                task.abort();
                Err(FetchError::Timeout(self.settings.request_timeout))
            }
        };

        let outcome = body
            .map_err(AttemptError::from)
            .and_then(|text| process_csv(&text, &self.settings.process).map_err(Into::into));

        self.complete(generation, fetched_at, outcome);
        self.publish();
    }

    /// Apply the result of attempt `generation`, unless a newer attempt has
    /// already started or finished.
    fn complete(
        &mut self,
        generation: Generation,
        fetched_at: DateTime<Utc>,
        outcome: Result<Aggregate, AttemptError>,
    ) {
        match outcome {
            Ok(agg) => {
                if !self.state.succeed(generation) {
                    warn!(generation, "discarding stale fetch result");
                    return;
                }
                self.diagnostics.last_success_at = Some(Utc::now());
                let decision = self
                    .gate
                    .reconcile(DonationSnapshot::from_aggregate(agg, fetched_at));
                if let Decision::Accepted { .. } = decision {
                    self.persist();
                }
                debug!(generation, ?decision, "fetch applied");
            }
            Err(e) => {
                if !self.state.fail(generation) {
                    warn!(generation, error = %e, "discarding stale fetch failure");
                    return;
                }
                warn!(
                    generation,
                    kind = e.kind(),
                    error = %e,
                    failures = self.state.consecutive_failures(),
                    delay_ms = self.state.next_interval().as_millis() as u64,
                    "fetch attempt failed; keeping last accepted snapshot"
                );
                self.diagnostics.last_error = Some(e.to_string());
                self.diagnostics.last_error_at = Some(Utc::now());
            }
        }
        self.diagnostics.consecutive_failures = self.state.consecutive_failures();
        self.diagnostics.next_retry_ms = self.state.next_interval().as_millis() as u64;
    }

    fn persist(&self) {
        if let Some(cache) = &self.cache {
            if let Err(e) = cache.save(self.gate.accepted()) {
                warn!(error = %e, "could not write snapshot cache");
            }
        }
    }

    fn publish(&self) {
        self.status_tx.send_replace(Status {
            display: self.gate.accepted().view(self.settings.goal_amount),
            diagnostics: self.diagnostics.clone(),
        });
    }
}
