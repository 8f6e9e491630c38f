use chrono::{DateTime, Utc};
use dubforge_common::{JobId, ProcessingMode};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::pipeline::{PairState, Stage, StageResult};

/// One VO/ES pair as submitted for processing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilePair {
    /// The original-language file (video source).
    pub vo_file: PathBuf,
    /// The dubbed file (audio donor).
    pub es_file: PathBuf,
}

impl FilePair {
    pub fn new(vo_file: impl Into<PathBuf>, es_file: impl Into<PathBuf>) -> Self {
        Self {
            vo_file: vo_file.into(),
            es_file: es_file.into(),
        }
    }
}

/// Per-pair processing record inside a job.
///
/// Every pair's outcome stays independently retrievable after the job
/// finishes; a failure in one pair is never collapsed into just the job
/// error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PairRecord {
    pub vo_file: PathBuf,
    pub es_file: PathBuf,
    /// Current position in the pair state machine.
    pub state: PairState,
    /// The merged output path once the pair reaches `Done`.
    pub output: Option<PathBuf>,
    /// Per-stage results in execution order.
    pub stages: Vec<StageResult>,
}

impl PairRecord {
    fn new(pair: &FilePair) -> Self {
        Self {
            vo_file: pair.vo_file.clone(),
            es_file: pair.es_file.clone(),
            state: PairState::Pending,
            output: None,
            stages: Vec::new(),
        }
    }

    /// The failing stage and reason, when this pair failed.
    pub fn failure(&self) -> Option<(Stage, &str)> {
        match &self.state {
            PairState::Failed { stage, reason } => Some((*stage, reason.as_str())),
            _ => None,
        }
    }
}

/// Lifecycle status of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Accepted, worker not yet running.
    Starting,
    /// Worker is driving pairs through the pipeline.
    Processing,
    /// Every pair reached `Done`.
    Completed,
    /// At least one pair failed.
    Failed,
}

impl JobStatus {
    /// Whether the job has finished.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

/// A batch of pairs moving through the pipeline, owned by one worker task.
///
/// Mutated only by that worker (via the registry); readers always get a
/// cloned snapshot. Terminal once `status` is completed or failed; retained
/// in memory for the process lifetime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub mode: ProcessingMode,
    pub pairs: Vec<PairRecord>,
    pub status: JobStatus,
    /// Completed pairs over total pairs, 0-100.
    pub progress: f32,
    pub started_at: DateTime<Utc>,
    /// Set exactly once, when the last pair finishes.
    pub finished_at: Option<DateTime<Utc>>,
    /// Summary of the first failing pair's stage and reason.
    pub error: Option<String>,
}

impl Job {
    pub fn new(mode: ProcessingMode, pairs: &[FilePair]) -> Self {
        Self {
            id: JobId::new(),
            mode,
            pairs: pairs.iter().map(PairRecord::new).collect(),
            status: JobStatus::Starting,
            progress: 0.0,
            started_at: Utc::now(),
            finished_at: None,
            error: None,
        }
    }

    pub fn start(&mut self) {
        self.status = JobStatus::Processing;
    }

    /// Number of pairs that reached a terminal state.
    pub fn completed_pairs(&self) -> usize {
        self.pairs.iter().filter(|p| p.state.is_terminal()).count()
    }

    /// Recompute progress from per-pair terminal states.
    pub fn update_progress(&mut self) {
        let total = self.pairs.len();
        if total == 0 {
            self.progress = 100.0;
            return;
        }
        self.progress = (self.completed_pairs() as f32 / total as f32) * 100.0;
    }

    /// Move the job to its terminal status.
    ///
    /// `finished_at` is set exactly once regardless of outcome; calling this
    /// again is a no-op.
    pub fn finish(&mut self) {
        if self.finished_at.is_some() {
            return;
        }
        self.finished_at = Some(Utc::now());
        self.update_progress();

        let first_failure = self.pairs.iter().enumerate().find_map(|(i, p)| {
            p.failure()
                .map(|(stage, reason)| format!("pair {} failed at {stage}: {reason}", i + 1))
        });

        match first_failure {
            None => self.status = JobStatus::Completed,
            Some(summary) => {
                self.status = JobStatus::Failed;
                self.error = Some(summary);
            }
        }
    }
}
