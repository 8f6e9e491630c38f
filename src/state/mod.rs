//! In-memory job registry.
//!
//! Process-wide state with an explicit lifecycle: created empty at startup,
//! entries added on submit, never removed. Workers mutate only their own
//! job; status readers always observe a consistent snapshot (records are
//! cloned out under the lock). The registry also owns the per-path locks
//! that guarantee at most one in-flight pipeline per file path.

mod types;

pub use types::*;

use dubforge_common::{Error, JobId, ProcessingMode, Result};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::broadcast;

use crate::pipeline::{PairReport, PairState};

/// Application-wide event stream for lifecycle observers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum AppEvent {
    /// A job has been accepted and its paths locked.
    JobQueued {
        id: JobId,
        mode: ProcessingMode,
        pair_count: usize,
    },
    /// A job's worker has started processing.
    JobStarted { id: JobId },
    /// One pair moved to a new pipeline state.
    PairStateChanged {
        id: JobId,
        index: usize,
        state: PairState,
    },
    /// A job's progress changed after a pair finished.
    JobProgress { id: JobId, progress: f32 },
    /// Every pair reached `Done`.
    JobCompleted { id: JobId },
    /// At least one pair failed.
    JobFailed { id: JobId, error: String },
}

/// The process-wide registry of jobs and locked paths.
pub struct JobRegistry {
    jobs: RwLock<HashMap<JobId, Job>>,
    locked_paths: Mutex<HashSet<PathBuf>>,
    event_tx: broadcast::Sender<AppEvent>,
}

impl JobRegistry {
    pub fn new() -> Arc<Self> {
        let (event_tx, _) = broadcast::channel(256);
        Arc::new(Self {
            jobs: RwLock::new(HashMap::new()),
            locked_paths: Mutex::new(HashSet::new()),
            event_tx,
        })
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AppEvent> {
        self.event_tx.subscribe()
    }

    /// Broadcast an event to all subscribers.
    fn broadcast(&self, event: AppEvent) {
        if self.event_tx.send(event).is_err() {
            tracing::debug!("no subscribers for job event");
        }
    }

    /// Accept a submission: validate the batch, lock its paths, and record
    /// the job in `starting` state.
    ///
    /// # Errors
    ///
    /// - [`Error::EmptyBatch`] when `pairs` is empty.
    /// - [`Error::PathBusy`] when any VO or ES path is already owned by an
    ///   active job. The check and the locking happen atomically; on failure
    ///   no job is created and no path is locked.
    pub fn create_job(&self, mode: ProcessingMode, pairs: &[FilePair]) -> Result<Job> {
        if pairs.is_empty() {
            return Err(Error::EmptyBatch);
        }

        {
            let mut locked = self.locked_paths.lock();
            for pair in pairs {
                for path in [&pair.vo_file, &pair.es_file] {
                    if locked.contains(path.as_path()) {
                        return Err(Error::path_busy(path.clone()));
                    }
                }
            }
            for pair in pairs {
                locked.insert(pair.vo_file.clone());
                locked.insert(pair.es_file.clone());
            }
        }

        let job = Job::new(mode, pairs);
        self.jobs.write().insert(job.id, job.clone());

        tracing::info!(job = %job.id, mode = %mode, pairs = pairs.len(), "job queued");
        self.broadcast(AppEvent::JobQueued {
            id: job.id,
            mode,
            pair_count: pairs.len(),
        });

        Ok(job)
    }

    /// Mark a job as processing.
    pub fn start_job(&self, id: JobId) {
        let started = {
            let mut jobs = self.jobs.write();
            match jobs.get_mut(&id) {
                Some(job) => {
                    job.start();
                    true
                }
                None => false,
            }
        };
        if started {
            self.broadcast(AppEvent::JobStarted { id });
        }
    }

    /// Record a pair's state transition while its pipeline runs.
    pub fn set_pair_state(&self, id: JobId, index: usize, state: PairState) {
        let updated = {
            let mut jobs = self.jobs.write();
            match jobs.get_mut(&id).and_then(|j| j.pairs.get_mut(index)) {
                Some(record) => {
                    record.state = state.clone();
                    true
                }
                None => false,
            }
        };
        if updated {
            self.broadcast(AppEvent::PairStateChanged { id, index, state });
        }
    }

    /// Fold a finished pair's report into the job and update progress.
    pub fn record_pair_report(&self, id: JobId, index: usize, report: &PairReport) {
        let progress = {
            let mut jobs = self.jobs.write();
            let Some(job) = jobs.get_mut(&id) else {
                return;
            };
            if let Some(record) = job.pairs.get_mut(index) {
                record.state = report.state.clone();
                record.output = report.output.clone();
                record.stages = report.stages.clone();
            }
            job.update_progress();
            job.progress
        };

        self.broadcast(AppEvent::PairStateChanged {
            id,
            index,
            state: report.state.clone(),
        });
        self.broadcast(AppEvent::JobProgress { id, progress });
    }

    /// Move a job to its terminal status and release its path locks.
    pub fn finish_job(&self, id: JobId) {
        let finished = {
            let mut jobs = self.jobs.write();
            let Some(job) = jobs.get_mut(&id) else {
                return;
            };
            job.finish();
            job.clone()
        };

        {
            let mut locked = self.locked_paths.lock();
            for pair in &finished.pairs {
                locked.remove(&pair.vo_file);
                locked.remove(&pair.es_file);
            }
        }

        match finished.status {
            JobStatus::Failed => {
                let error = finished.error.clone().unwrap_or_default();
                tracing::error!(job = %id, "job failed: {error}");
                self.broadcast(AppEvent::JobFailed { id, error });
            }
            _ => {
                tracing::info!(job = %id, "job completed");
                self.broadcast(AppEvent::JobCompleted { id });
            }
        }
    }

    /// Snapshot of one job.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] for unknown IDs.
    pub fn get_job(&self, id: JobId) -> Result<Job> {
        self.jobs
            .read()
            .get(&id)
            .cloned()
            .ok_or_else(|| Error::not_found("job", id))
    }

    /// Snapshots of all non-terminal jobs.
    pub fn list_active(&self) -> Vec<Job> {
        self.jobs
            .read()
            .values()
            .filter(|j| !j.status.is_terminal())
            .cloned()
            .collect()
    }

    /// Snapshots of every job the process has seen.
    pub fn list_jobs(&self) -> Vec<Job> {
        self.jobs.read().values().cloned().collect()
    }

    /// Whether a path is currently owned by an active job.
    pub fn is_path_locked(&self, path: &std::path::Path) -> bool {
        self.locked_paths.lock().contains(path)
    }
}
