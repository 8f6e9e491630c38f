//! The per-pair processing pipeline.
//!
//! Five stages run in fixed order for every VO/ES pair:
//! normalize → convert → merge → validate → cleanup. Each stage returns a
//! typed [`StageError`] on failure; no stage suppresses an error from the
//! ones before it. A failed pair never leaves a partial file at the final
//! output name, and the source files stay intact unless cleanup ran after a
//! successful validation.

mod naming;
mod stage;

pub use naming::{derive_output_name, derive_output_path};
pub use stage::{PairState, Stage, StageError, StageOutcome, StageResult};

use dubforge_av::{merge_dub_audio, probe_file, remux_to_mkv, Container};
use dubforge_common::{ProcessingMode, TrackSide};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::config::Config;

/// Everything a pipeline run needs to know, resolved once per job.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    /// Resolved ffmpeg executable.
    pub ffmpeg: PathBuf,
    /// Resolved ffprobe executable.
    pub ffprobe: PathBuf,
    /// Language tag for the original audio stream.
    pub original_lang: String,
    /// Language tag for the dubbed audio stream.
    pub dubbed_lang: String,
    /// Bound on each external tool invocation.
    pub tool_timeout: Duration,
    /// Output directory override; the VO file's directory when unset.
    pub destination: Option<PathBuf>,
}

impl PipelineSettings {
    /// Resolve settings from the application config, locating the tools.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let ffmpeg = dubforge_av::get_tool_path("ffmpeg", config.tools.ffmpeg_path.as_deref())?;
        let ffprobe = dubforge_av::get_tool_path("ffprobe", config.tools.ffprobe_path.as_deref())?;

        Ok(Self {
            ffmpeg,
            ffprobe,
            original_lang: config.languages.original.clone(),
            dubbed_lang: config.languages.dubbed.clone(),
            tool_timeout: config.tools.timeout(),
            destination: config.media.destination.clone(),
        })
    }
}

/// Result of running one pair through the whole pipeline.
#[derive(Debug, Clone)]
pub struct PairReport {
    /// Terminal state: `Done` or `Failed`.
    pub state: PairState,
    /// The merged output path, present when the pair reached `Done`.
    pub output: Option<PathBuf>,
    /// Per-stage results in execution order.
    pub stages: Vec<StageResult>,
    /// Cleanup warning, when deletion could not complete after a successful
    /// merge.
    pub warning: Option<String>,
}

/// Working state threaded through the stages of one pair.
struct PairContext {
    vo_source: PathBuf,
    es_source: PathBuf,
    vo_working: PathBuf,
    es_working: PathBuf,
    target: PathBuf,
    /// Intermediates produced by the convert stage, removed by cleanup.
    temp_files: Vec<PathBuf>,
    /// The VO file renamed aside when the target name equals its own.
    staged_source: Option<PathBuf>,
}

impl PairContext {
    fn new(vo: &Path, es: &Path) -> Self {
        Self {
            vo_source: vo.to_path_buf(),
            es_source: es.to_path_buf(),
            vo_working: vo.to_path_buf(),
            es_working: es.to_path_buf(),
            target: PathBuf::new(),
            temp_files: Vec::new(),
            staged_source: None,
        }
    }

    /// Undo the stage-aside rename after a merge or validation failure so
    /// the VO source is exactly where it started.
    fn restore_staged(&mut self) {
        if let Some(staged) = self.staged_source.take() {
            if let Err(e) = std::fs::rename(&staged, &self.target) {
                tracing::warn!(
                    staged = %staged.display(),
                    "failed to restore staged VO source: {e}"
                );
            } else {
                self.vo_working = self.target.clone();
            }
        }
    }
}

/// Run one VO/ES pair through the five stages.
///
/// `on_state` observes every state transition; the caller uses it to keep
/// the job record current while the pipeline runs.
pub async fn process_pair(
    vo: &Path,
    es: &Path,
    mode: ProcessingMode,
    settings: &PipelineSettings,
    on_state: &mut (dyn FnMut(PairState) + Send),
) -> PairReport {
    let mut ctx = PairContext::new(vo, es);
    let mut report = PairReport {
        state: PairState::Pending,
        output: None,
        stages: Vec::new(),
        warning: None,
    };

    tracing::info!(vo = %vo.display(), es = %es.display(), "processing pair");

    on_state(PairState::Normalizing);
    match normalize(&mut ctx, mode, settings) {
        Ok(detail) => report.stages.push(StageResult::success(Stage::Normalize, detail)),
        Err(e) => return fail(report, Stage::Normalize, e, on_state),
    }

    on_state(PairState::Converting);
    match convert(&mut ctx, settings).await {
        Ok(detail) => report.stages.push(StageResult::success(Stage::Convert, detail)),
        Err(e) => return fail(report, Stage::Convert, e, on_state),
    }

    on_state(PairState::Merging);
    match merge(&mut ctx, settings).await {
        Ok(detail) => report.stages.push(StageResult::success(Stage::Merge, detail)),
        Err(e) => return fail(report, Stage::Merge, e, on_state),
    }

    on_state(PairState::Validating);
    match validate(&mut ctx, settings).await {
        Ok(detail) => report.stages.push(StageResult::success(Stage::Validate, detail)),
        Err(e) => return fail(report, Stage::Validate, e, on_state),
    }

    on_state(PairState::CleaningUp);
    match cleanup(&ctx) {
        Ok(detail) => report.stages.push(StageResult::success(Stage::Cleanup, detail)),
        Err(e) => {
            // The merge already succeeded; a cleanup failure is reported as
            // a warning, not a pipeline failure.
            tracing::warn!("cleanup incomplete: {e}");
            report.stages.push(StageResult::failure(Stage::Cleanup, e.to_string()));
            report.warning = Some(e.to_string());
        }
    }

    report.output = Some(ctx.target.clone());
    report.state = PairState::Done;
    on_state(PairState::Done);
    tracing::info!(output = %ctx.target.display(), "pair done");
    report
}

/// Record the failure and put the pair in its absorbing state.
fn fail(
    mut report: PairReport,
    stage: Stage,
    err: StageError,
    on_state: &mut (dyn FnMut(PairState) + Send),
) -> PairReport {
    let reason = err.to_string();
    tracing::error!(stage = %stage, "pair failed: {reason}");
    report.stages.push(StageResult::failure(stage, reason.clone()));
    let state = PairState::Failed { stage, reason };
    report.state = state.clone();
    on_state(state);
    report
}

/// Map a toolkit error into a stage error, keeping timeouts distinct.
fn av_stage_error(e: dubforge_av::Error, wrap: fn(String) -> StageError) -> StageError {
    if e.is_timeout() {
        StageError::Timeout(e.to_string())
    } else {
        wrap(e.to_string())
    }
}

/// Normalize: derive the output name and check for conflicts.
fn normalize(
    ctx: &mut PairContext,
    mode: ProcessingMode,
    settings: &PipelineSettings,
) -> Result<String, StageError> {
    let target = naming::derive_output_path(
        &ctx.vo_source,
        mode,
        settings.destination.as_deref(),
        &settings.original_lang,
        &settings.dubbed_lang,
    );

    if target.exists() && target != ctx.vo_source {
        return Err(StageError::NameConflict(format!(
            "{} already exists",
            target.display()
        )));
    }

    let detail = format!("target {}", target.display());
    ctx.target = target;
    Ok(detail)
}

/// Convert: remux any input whose container cannot take an extra
/// stream-copied audio track.
async fn convert(ctx: &mut PairContext, settings: &PipelineSettings) -> Result<String, StageError> {
    let mut converted = 0usize;

    for side in [TrackSide::Vo, TrackSide::Es] {
        let input = match side {
            TrackSide::Vo => ctx.vo_working.clone(),
            TrackSide::Es => ctx.es_working.clone(),
        };

        if Container::from_path(&input)
            .map(|c| c.supports_multi_audio_copy())
            .unwrap_or(false)
        {
            continue;
        }

        let output = input.with_extension(Container::Mkv.extension());
        if output.exists() {
            return Err(StageError::ConversionFailed(format!(
                "converted name {} already exists",
                output.display()
            )));
        }

        remux_to_mkv(&settings.ffmpeg, &input, &output, settings.tool_timeout)
            .await
            .map_err(|e| av_stage_error(e, StageError::ConversionFailed))?;

        ctx.temp_files.push(output.clone());
        match side {
            TrackSide::Vo => ctx.vo_working = output,
            TrackSide::Es => ctx.es_working = output,
        }
        converted += 1;
    }

    Ok(match converted {
        0 => "no conversion needed".to_string(),
        n => format!("converted {n} file(s) to mkv"),
    })
}

/// Merge: stream-copy the ES audio into the VO container at the target name.
async fn merge(ctx: &mut PairContext, settings: &PipelineSettings) -> Result<String, StageError> {
    if ctx.target == ctx.vo_working {
        // The source already holds the target name; stage it aside so ffmpeg
        // does not read and write the same file.
        let staged = ctx.vo_working.with_extension("orig.mkv");
        if staged.exists() {
            return Err(StageError::MergeFailed(format!(
                "staging name {} already exists",
                staged.display()
            )));
        }
        std::fs::rename(&ctx.vo_working, &staged).map_err(|e| {
            StageError::MergeFailed(format!("failed to stage source aside: {e}"))
        })?;
        ctx.vo_working = staged.clone();
        ctx.staged_source = Some(staged);
    }

    let result = merge_dub_audio(
        &settings.ffmpeg,
        &ctx.vo_working,
        &ctx.es_working,
        &ctx.target,
        &settings.original_lang,
        &settings.dubbed_lang,
        settings.tool_timeout,
    )
    .await;

    if let Err(e) = result {
        ctx.restore_staged();
        return Err(av_stage_error(e, StageError::MergeFailed));
    }

    Ok(format!("merged into {}", ctx.target.display()))
}

/// Validate: probe the merged output and check its streams. On failure the
/// merged output is deleted and the sources are left untouched.
async fn validate(ctx: &mut PairContext, settings: &PipelineSettings) -> Result<String, StageError> {
    match check_streams(ctx, settings).await {
        Ok(detail) => Ok(detail),
        Err(e) => {
            if ctx.target.exists() {
                if let Err(remove_err) = std::fs::remove_file(&ctx.target) {
                    tracing::warn!(
                        target = %ctx.target.display(),
                        "failed to remove invalid merge output: {remove_err}"
                    );
                }
            }
            ctx.restore_staged();
            Err(e)
        }
    }
}

async fn check_streams(
    ctx: &PairContext,
    settings: &PipelineSettings,
) -> Result<String, StageError> {
    let info = probe_file(&settings.ffprobe, &ctx.target)
        .await
        .map_err(|e| av_stage_error(e, StageError::ValidationFailed))?;

    if info.video_tracks.is_empty() {
        return Err(StageError::ValidationFailed(
            "output has no video stream".to_string(),
        ));
    }
    if info.audio_tracks.len() < 2 {
        return Err(StageError::ValidationFailed(format!(
            "output has only {} audio stream(s), expected at least 2",
            info.audio_tracks.len()
        )));
    }

    let languages = info.audio_languages();
    for expected in [&settings.original_lang, &settings.dubbed_lang] {
        if !languages.contains(&expected.to_lowercase()) {
            return Err(StageError::ValidationFailed(format!(
                "output is missing an audio stream tagged '{expected}'"
            )));
        }
    }

    Ok(format!(
        "{} video, {} audio streams [{}]",
        info.video_tracks.len(),
        info.audio_tracks.len(),
        languages.join(", ")
    ))
}

/// Cleanup: remove the ES source, conversion intermediates, and the
/// superseded VO original. Only runs after a successful validation.
fn cleanup(ctx: &PairContext) -> Result<String, StageError> {
    let mut doomed: Vec<PathBuf> = vec![ctx.es_source.clone()];
    doomed.extend(ctx.temp_files.iter().cloned());
    if let Some(staged) = &ctx.staged_source {
        doomed.push(staged.clone());
    }
    // A converted VO leaves its pre-conversion original behind; the merged
    // output supersedes it.
    if ctx.vo_source != ctx.vo_working && ctx.vo_source != ctx.target {
        doomed.push(ctx.vo_source.clone());
    }

    let mut removed = 0usize;
    let mut errors: Vec<String> = Vec::new();

    for path in doomed {
        if path == ctx.target {
            continue;
        }
        match std::fs::remove_file(&path) {
            Ok(()) => {
                tracing::debug!(path = %path.display(), "removed");
                removed += 1;
            }
            Err(e) => errors.push(format!("{}: {e}", path.display())),
        }
    }

    if errors.is_empty() {
        Ok(format!("removed {removed} file(s)"))
    } else {
        Err(StageError::CleanupFailed(errors.join("; ")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn settings_for(dir: &Path) -> PipelineSettings {
        PipelineSettings {
            // Nonexistent tools: any stage that shells out fails, which the
            // tests below rely on.
            ffmpeg: PathBuf::from("ffmpeg_missing_for_tests"),
            ffprobe: PathBuf::from("ffprobe_missing_for_tests"),
            original_lang: "eng".to_string(),
            dubbed_lang: "spa".to_string(),
            tool_timeout: Duration::from_secs(5),
            destination: Some(dir.to_path_buf()),
        }
    }

    fn touch(path: &Path) {
        fs::write(path, b"stub").unwrap();
    }

    #[tokio::test]
    async fn normalize_conflict_fails_without_touching_sources() {
        let dir = tempfile::tempdir().unwrap();
        let vo = dir.path().join("Show.S01E02.1080p.mkv");
        let es = dir.path().join("Show.S01E02.es.mkv");
        touch(&vo);
        touch(&es);
        // Occupy the target name.
        touch(&dir.path().join("Show.S01E02.1080p.eng.spa.mkv"));

        let settings = settings_for(dir.path());
        let mut states = Vec::new();
        let report = process_pair(
            &vo,
            &es,
            ProcessingMode::Tv,
            &settings,
            &mut |s| states.push(s),
        )
        .await;

        assert!(matches!(
            report.state,
            PairState::Failed {
                stage: Stage::Normalize,
                ..
            }
        ));
        assert!(vo.exists());
        assert!(es.exists());
        assert_eq!(states.first(), Some(&PairState::Normalizing));
        assert!(states.last().unwrap().is_terminal());
    }

    #[tokio::test]
    async fn merge_failure_leaves_sources_and_no_output() {
        let dir = tempfile::tempdir().unwrap();
        let vo = dir.path().join("Show.S01E02.1080p.mkv");
        let es = dir.path().join("Show.S01E02.es.mkv");
        touch(&vo);
        touch(&es);

        let settings = settings_for(dir.path());
        let report = process_pair(&vo, &es, ProcessingMode::Tv, &settings, &mut |_| {}).await;

        // Both inputs are mkv so convert is a no-op; merge fails because the
        // tool is missing.
        assert!(matches!(
            report.state,
            PairState::Failed {
                stage: Stage::Merge,
                ..
            }
        ));
        assert!(vo.exists(), "VO source must be untouched");
        assert!(es.exists(), "ES source must be untouched");
        assert!(
            !dir.path().join("Show.S01E02.1080p.eng.spa.mkv").exists(),
            "no output may occupy the target name"
        );
        // Stage results: normalize + convert succeeded, merge failed.
        assert_eq!(report.stages.len(), 3);
        assert_eq!(report.stages[2].stage, Stage::Merge);
        assert_eq!(report.stages[2].outcome, StageOutcome::Failure);
    }

    #[tokio::test]
    async fn conversion_failure_reported_at_convert_stage() {
        let dir = tempfile::tempdir().unwrap();
        let vo = dir.path().join("Show.S01E02.1080p.mp4");
        let es = dir.path().join("Show.S01E02.es.mkv");
        touch(&vo);
        touch(&es);

        let settings = settings_for(dir.path());
        let report = process_pair(&vo, &es, ProcessingMode::Tv, &settings, &mut |_| {}).await;

        assert!(matches!(
            report.state,
            PairState::Failed {
                stage: Stage::Convert,
                ..
            }
        ));
        assert!(vo.exists());
        assert!(es.exists());
    }

    #[tokio::test]
    async fn state_transitions_are_forward_only() {
        let dir = tempfile::tempdir().unwrap();
        let vo = dir.path().join("Show.S01E02.mkv");
        let es = dir.path().join("Show.S01E02.es.mkv");
        touch(&vo);
        touch(&es);

        let settings = settings_for(dir.path());
        let mut states = Vec::new();
        let _ = process_pair(
            &vo,
            &es,
            ProcessingMode::Tv,
            &settings,
            &mut |s| states.push(s),
        )
        .await;

        // Normalizing, Converting, Merging, then the absorbing failure.
        assert_eq!(states[0], PairState::Normalizing);
        assert_eq!(states[1], PairState::Converting);
        assert_eq!(states[2], PairState::Merging);
        assert!(states[3].is_terminal());
        assert_eq!(states.len(), 4);
    }

    #[test]
    fn cleanup_reports_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut ctx = PairContext::new(
            &dir.path().join("vo.mkv"),
            &dir.path().join("es.mkv"),
        );
        ctx.target = dir.path().join("out.mkv");

        // The ES source never existed, so cleanup cannot complete.
        let result = cleanup(&ctx);
        assert!(matches!(result, Err(StageError::CleanupFailed(_))));
    }

    #[test]
    fn cleanup_removes_sources_and_temps() {
        let dir = tempfile::tempdir().unwrap();
        let vo = dir.path().join("vo.mp4");
        let vo_converted = dir.path().join("vo.mkv");
        let es = dir.path().join("es.mkv");
        touch(&vo);
        touch(&vo_converted);
        touch(&es);

        let mut ctx = PairContext::new(&vo, &es);
        ctx.vo_working = vo_converted.clone();
        ctx.temp_files.push(vo_converted.clone());
        ctx.target = dir.path().join("out.mkv");
        touch(&ctx.target);

        let result = cleanup(&ctx).unwrap();
        assert!(result.contains("3 file(s)"));
        assert!(!vo.exists(), "superseded VO original removed");
        assert!(!vo_converted.exists(), "conversion intermediate removed");
        assert!(!es.exists(), "ES source removed");
        assert!(ctx.target.exists(), "output never removed by cleanup");
    }
}
