//! # Batch Optimizer Main Orchestrator
//!
//! Orchestratore del batch: esegue i job con concorrenza limitata e delega
//! la compressione a `TaskOptimizer`.
//!
//! ## Responsabilità:
//! - Ammissione dei job fino a `Config::workers` in parallelo (default 4)
//! - Prenotazione delle destinazioni prima di avviare il batch, con suffisso
//!   automatico in caso di collisione tra job o con un input del batch
//! - Cancellazione cooperativa controllata prima di ogni ammissione
//! - Aggiornamento di `BatchState` (unico scrittore) e notifica degli snapshot
//!
//! ## Flusso:
//! 1. `Starting...` e snapshot iniziale
//! 2. Ammissione: `Processing <file>...`, snapshot
//! 3. Completamento: risultato registrato, snapshot, poi nuova ammissione
//! 4. Fine: `Batch Complete` oppure `Cancelled`, progresso al 100%
//!
//! I job già avviati non vengono mai interrotti: la cancellazione ferma solo
//! le nuove ammissioni e i job in corso producono comunque il loro risultato.
//! Non esiste timeout per singolo job.

use crate::{
    compressor::Compressor,
    config::{OutputStrategy, SettingsHandle},
    error::CompressError,
    file_manager::FileManager,
    job::{CompressionJob, CompressionOutcome},
    optimizer::{
        batch_state::BatchState,
        path_resolver::{DestinationRegistry, PathResolver},
        task_optimizer::TaskOptimizer,
    },
};
use futures::stream::{FuturesUnordered, StreamExt};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

/// Cooperative cancellation flag shared with collaborators
#[derive(Clone)]
pub struct CancelHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl CancelHandle {
    fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Stop admitting new jobs; running jobs still finish
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }

    fn reset(&self) {
        self.tx.send_replace(false);
    }
}

/// Orchestratore principale
pub struct BatchOptimizer {
    settings: SettingsHandle,
    worker: TaskOptimizer,
    cancel: CancelHandle,
    state_tx: watch::Sender<BatchState>,
}

impl BatchOptimizer {
    /// Crea nuova istanza dell'orchestratore
    pub fn new(settings: SettingsHandle) -> Self {
        Self::with_compressor(settings, Compressor::default())
    }

    pub fn with_compressor(settings: SettingsHandle, compressor: Compressor) -> Self {
        let (state_tx, _rx) = watch::channel(BatchState::default());
        Self {
            settings,
            worker: TaskOptimizer::new(compressor),
            cancel: CancelHandle::new(),
            state_tx,
        }
    }

    pub fn settings(&self) -> &SettingsHandle {
        &self.settings
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Receiver of every published `BatchState` snapshot
    pub fn subscribe(&self) -> watch::Receiver<BatchState> {
        self.state_tx.subscribe()
    }

    /// Latest published state
    pub fn state(&self) -> BatchState {
        self.state_tx.borrow().clone()
    }

    /// Compress `paths` with destinations derived from `strategy`.
    ///
    /// Each job reads the live settings when it is admitted.
    pub async fn compress_files<F>(
        &self,
        paths: Vec<PathBuf>,
        strategy: OutputStrategy,
        on_progress: F,
    ) -> Vec<CompressionOutcome>
    where
        F: FnMut(&BatchState),
    {
        self.cancel.reset();
        let inputs = paths.clone();
        let destinations = Self::plan_destinations(move || {
            let requests: Vec<(PathBuf, PathBuf)> = inputs
                .iter()
                .map(|path| (path.clone(), PathResolver::destination_for(path, &strategy.output_dir_for(path))))
                .collect();
            DestinationRegistry::plan(&requests)
        })
        .await;

        let settings = self.settings.clone();
        let jobs = paths
            .into_iter()
            .zip(destinations)
            .map(move |(path, destination)| CompressionJob::resolved(path, destination, settings.snapshot()));
        self.drive(jobs, on_progress).await
    }

    /// Run `jobs` with bounded concurrency, returning outcomes in completion order.
    ///
    /// A destination that repeats within the batch, or that names one of the
    /// batch inputs, gets a `_N` suffix.
    pub async fn run_batch<I, F>(&self, jobs: I, on_progress: F) -> Vec<CompressionOutcome>
    where
        I: IntoIterator<Item = CompressionJob>,
        F: FnMut(&BatchState),
    {
        self.cancel.reset();
        let jobs: Vec<CompressionJob> = jobs.into_iter().collect();
        let requests: Vec<(PathBuf, PathBuf)> = jobs
            .iter()
            .map(|job| (job.input.clone(), job.destination.clone()))
            .collect();
        let destinations = Self::plan_destinations(move || DestinationRegistry::plan(&requests)).await;

        let jobs = jobs
            .into_iter()
            .zip(destinations)
            .map(|(job, destination)| job.with_destination(destination));
        self.drive(jobs, on_progress).await
    }

    /// Resolve every destination up front, away from the coordinating task
    async fn plan_destinations<P>(plan: P) -> Vec<PathBuf>
    where
        P: FnOnce() -> Vec<PathBuf> + Clone + Send + 'static,
    {
        match tokio::task::spawn_blocking(plan.clone()).await {
            Ok(destinations) => destinations,
            Err(e) => {
                warn!("Destination planning task failed ({}), planning inline", e);
                plan()
            }
        }
    }

    async fn drive<I, F>(&self, mut jobs: I, mut on_progress: F) -> Vec<CompressionOutcome>
    where
        I: ExactSizeIterator<Item = CompressionJob>,
        F: FnMut(&BatchState),
    {
        let total = jobs.len();
        let max_in_flight = self.settings.snapshot().workers.max(1);

        let mut state = BatchState::start(total);
        let mut in_flight = FuturesUnordered::new();

        info!("Starting batch of {} files ({} concurrent)", total, max_in_flight);
        self.publish(&state, &mut on_progress);

        loop {
            while in_flight.len() < max_in_flight {
                if self.observe_cancel(&mut state, &mut on_progress) {
                    break;
                }
                let Some(job) = jobs.next() else { break };
                state.record_admission(&job.input);

                let input = job.input.clone();
                let worker = self.worker.clone();
                let handle = tokio::spawn(async move { worker.process(job).await });
                in_flight.push(async move { (input, handle.await) });

                self.publish(&state, &mut on_progress);
            }

            let Some((input, joined)) = in_flight.next().await else { break };
            let outcome = match joined {
                Ok(outcome) => outcome,
                Err(e) => {
                    error!("Worker for {} did not finish: {}", input.display(), e);
                    CompressionOutcome::Failure {
                        original_size: FileManager::file_size(&input).await,
                        original_path: input,
                        reason: CompressError::ConversionFailed,
                    }
                }
            };

            debug!("Completed {} ({}/{})", outcome.original_path().display(), state.completed_count + 1, total);
            state.record_completion(outcome);
            self.publish(&state, &mut on_progress);
        }

        self.observe_cancel(&mut state, &mut on_progress);
        state.finish();
        info!(
            "{}: {} succeeded, {} failed",
            state.status_message,
            state.success_count(),
            state.failure_count()
        );
        self.publish(&state, &mut on_progress);

        state.results
    }

    /// Switch to "Cancelling..." the first time the flag is seen
    fn observe_cancel<F>(&self, state: &mut BatchState, on_progress: &mut F) -> bool
    where
        F: FnMut(&BatchState),
    {
        if !self.cancel.is_cancelled() {
            return false;
        }
        if !state.cancelled {
            info!("Cancellation requested, waiting for {} running jobs", state.in_flight());
            state.mark_cancelling();
            self.publish(state, on_progress);
        }
        true
    }

    fn publish<F>(&self, state: &BatchState, on_progress: &mut F)
    where
        F: FnMut(&BatchState),
    {
        self.state_tx.send_replace(state.clone());
        on_progress(state);
    }
}
