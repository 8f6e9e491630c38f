//! Job orchestration: one worker task per job.
//!
//! Jobs run concurrently with each other; within a job, pairs are processed
//! sequentially in submission order, since every pair drives an external
//! process that is itself CPU- and I/O-heavy. A pair's failure does not
//! abort the batch. Cancellation of a running job is not supported: once
//! submitted, a job runs each pair to completion or failure.

use dubforge_common::{JobId, ProcessingMode, Result};
use std::sync::Arc;

use crate::pipeline::{self, PipelineSettings};
use crate::state::{AppEvent, FilePair, Job, JobRegistry};

/// Accepts submissions and exposes job status to asynchronous callers.
#[derive(Clone)]
pub struct Orchestrator {
    registry: Arc<JobRegistry>,
    settings: Arc<PipelineSettings>,
}

impl Orchestrator {
    pub fn new(registry: Arc<JobRegistry>, settings: PipelineSettings) -> Self {
        Self {
            registry,
            settings: Arc::new(settings),
        }
    }

    /// The registry backing this orchestrator.
    pub fn registry(&self) -> &Arc<JobRegistry> {
        &self.registry
    }

    /// Submit a batch of pairs for processing.
    ///
    /// Returns as soon as the job is recorded and its worker spawned; the
    /// caller polls [`Orchestrator::status`] or subscribes to registry
    /// events for progress.
    ///
    /// # Errors
    ///
    /// `EmptyBatch` for an empty batch and `PathBusy` when any submitted
    /// path is already owned by an active job. In both cases no job is
    /// created.
    pub fn submit(&self, mode: ProcessingMode, pairs: Vec<FilePair>) -> Result<JobId> {
        let job = self.registry.create_job(mode, &pairs)?;
        let id = job.id;

        let registry = Arc::clone(&self.registry);
        let settings = Arc::clone(&self.settings);
        tokio::spawn(async move {
            run_job(registry, settings, id, mode, pairs).await;
        });

        Ok(id)
    }

    /// Snapshot of one job.
    ///
    /// # Errors
    ///
    /// `NotFound` for unknown job IDs.
    pub fn status(&self, id: JobId) -> Result<Job> {
        self.registry.get_job(id)
    }

    /// Snapshots of all jobs that have not yet finished.
    pub fn list_active(&self) -> Vec<Job> {
        self.registry.list_active()
    }

    /// Wait until a job reaches a terminal status and return its final
    /// snapshot. Used by the CLI; API callers poll instead.
    ///
    /// # Errors
    ///
    /// `NotFound` for unknown job IDs.
    pub async fn wait(&self, id: JobId) -> Result<Job> {
        // Subscribe before the status check so a completion between the two
        // cannot be missed.
        let mut rx = self.registry.subscribe();

        loop {
            let job = self.registry.get_job(id)?;
            if job.status.is_terminal() {
                return Ok(job);
            }

            match rx.recv().await {
                Ok(AppEvent::JobCompleted { id: done } | AppEvent::JobFailed { id: done, .. })
                    if done == id =>
                {
                    return self.registry.get_job(id);
                }
                Ok(_) => {}
                Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => {
                    // Dropped events; re-check the snapshot on the next turn.
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => {
                    return self.registry.get_job(id);
                }
            }
        }
    }
}

/// Worker body: drive each pair through the pipeline in submission order.
async fn run_job(
    registry: Arc<JobRegistry>,
    settings: Arc<PipelineSettings>,
    id: JobId,
    mode: ProcessingMode,
    pairs: Vec<FilePair>,
) {
    registry.start_job(id);

    for (index, pair) in pairs.iter().enumerate() {
        let mut on_state = |state| registry.set_pair_state(id, index, state);
        let report = pipeline::process_pair(
            &pair.vo_file,
            &pair.es_file,
            mode,
            &settings,
            &mut on_state,
        )
        .await;

        registry.record_pair_report(id, index, &report);
    }

    registry.finish_job(id);
}
