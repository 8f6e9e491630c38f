//! Stage and per-pair state types for the processing pipeline.

use serde::{Deserialize, Serialize};

/// The five pipeline stages, in execution order.
///
/// Modeled as a tagged enum with one handler per variant so the state
/// machine stays explicit and exhaustive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Normalize,
    Convert,
    Merge,
    Validate,
    Cleanup,
}

impl Stage {
    /// Short stage name used in logs and error summaries.
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Normalize => "normalize",
            Stage::Convert => "convert",
            Stage::Merge => "merge",
            Stage::Validate => "validate",
            Stage::Cleanup => "cleanup",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Typed failure of one pipeline stage.
#[derive(Debug, thiserror::Error)]
pub enum StageError {
    /// The normalized target name is already occupied by another file.
    #[error("name conflict: {0}")]
    NameConflict(String),

    /// Container conversion did not produce a usable MKV.
    #[error("conversion failed: {0}")]
    ConversionFailed(String),

    /// The audio merge did not produce a usable output.
    #[error("merge failed: {0}")]
    MergeFailed(String),

    /// The merged output did not pass the stream checks.
    #[error("validation failed: {0}")]
    ValidationFailed(String),

    /// Deleting sources or intermediates failed after a successful merge.
    #[error("cleanup failed: {0}")]
    CleanupFailed(String),

    /// An external tool exceeded its bounded execution time.
    #[error("timed out: {0}")]
    Timeout(String),
}

/// Outcome of one executed stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StageOutcome {
    Success,
    Failure,
}

/// Record of one executed stage, kept per pair for status queries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageResult {
    /// Which stage ran.
    pub stage: Stage,
    /// Whether it succeeded.
    pub outcome: StageOutcome,
    /// Human-readable detail (target name, stream counts, error text).
    pub detail: String,
}

impl StageResult {
    pub fn success(stage: Stage, detail: impl Into<String>) -> Self {
        Self {
            stage,
            outcome: StageOutcome::Success,
            detail: detail.into(),
        }
    }

    pub fn failure(stage: Stage, detail: impl Into<String>) -> Self {
        Self {
            stage,
            outcome: StageOutcome::Failure,
            detail: detail.into(),
        }
    }
}

/// Per-pair state machine.
///
/// `Pending → Normalizing → Converting → Merging → Validating → CleaningUp →
/// Done`, with `Failed` absorbing from any non-terminal state. There are no
/// backward transitions and a failed pair is never retried within its job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum PairState {
    Pending,
    Normalizing,
    Converting,
    Merging,
    Validating,
    CleaningUp,
    Done,
    Failed { stage: Stage, reason: String },
}

impl PairState {
    /// Whether the pair has finished, successfully or not.
    pub fn is_terminal(&self) -> bool {
        matches!(self, PairState::Done | PairState::Failed { .. })
    }
}

impl std::fmt::Display for PairState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PairState::Pending => write!(f, "pending"),
            PairState::Normalizing => write!(f, "normalizing"),
            PairState::Converting => write!(f, "converting"),
            PairState::Merging => write!(f, "merging"),
            PairState::Validating => write!(f, "validating"),
            PairState::CleaningUp => write!(f, "cleaning up"),
            PairState::Done => write!(f, "done"),
            PairState::Failed { stage, reason } => write!(f, "failed at {stage}: {reason}"),
        }
    }
}
