mod cli;

use dubforge::{
    config,
    matcher::{self, MatchOutcome},
    orchestrator::Orchestrator,
    pipeline::PipelineSettings,
    scanner,
    state::{FilePair, JobRegistry, JobStatus},
};

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use dubforge_common::ProcessingMode;
use std::path::{Path, PathBuf};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "dubforge=trace,dubforge_av=debug,dubforge_parser=debug,dubforge_common=debug"
                .to_string()
        } else {
            "dubforge=info,dubforge_av=info".to_string()
        }
    });

    tracing_subscriber::fmt().with_env_filter(&env_filter).init();

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(run(cli))
}

async fn run(cli: Cli) -> Result<()> {
    let config = config::load_config_or_default(cli.config.as_deref())?;

    match cli.command {
        Commands::Search {
            series,
            season,
            paths,
        } => {
            let outcome = gather(&config, series.as_deref(), season, &paths);
            print_outcome(&outcome);
            Ok(())
        }
        Commands::Process {
            series,
            season,
            paths,
            destination,
        } => process(&config, series.as_deref(), season, &paths, destination).await,
        Commands::Merge {
            vo,
            es,
            destination,
        } => merge_single(&config, vo, es, destination).await,
        Commands::Normalize { files } => {
            for file in files {
                let name = file.to_string_lossy();
                println!("{} -> {}", name, dubforge_parser::normalize_filename(&name));
            }
            Ok(())
        }
        Commands::Convert { files } => convert_files(&config, &files).await,
        Commands::Probe { file, json } => probe_file(&config, &file, json).await,
        Commands::CheckTools => check_tools(),
        Commands::Version => {
            println!("dubforge {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

/// Scan and match in one step, shared by `search` and `process`.
fn gather(
    config: &config::Config,
    series: Option<&str>,
    season: Option<u32>,
    paths: &[PathBuf],
) -> MatchOutcome {
    let search_paths = if paths.is_empty() {
        config.media.search_paths.clone()
    } else {
        paths.to_vec()
    };

    let lists = scanner::collect_candidates(&config.media.root, &search_paths);
    matcher::match_candidates(lists.vo, lists.es, series, season)
}

fn print_outcome(outcome: &MatchOutcome) {
    println!("Matched pairs: {}", outcome.pairs.len());
    for pair in &outcome.pairs {
        println!("  {}", pair.key);
        println!("    VO: {}", pair.vo_file.path.display());
        println!("    ES: {}", pair.es_file.path.display());
    }

    if !outcome.ambiguous.is_empty() {
        println!("\nAmbiguous (manual selection required):");
        for key in &outcome.ambiguous {
            println!("  {}", key);
        }
    }
    if !outcome.unmatched_vo.is_empty() {
        println!("\nUnmatched VO files:");
        for candidate in &outcome.unmatched_vo {
            println!("  {}", candidate.path.display());
        }
    }
    if !outcome.unmatched_es.is_empty() {
        println!("\nUnmatched ES files:");
        for candidate in &outcome.unmatched_es {
            println!("  {}", candidate.path.display());
        }
    }
}

async fn process(
    config: &config::Config,
    series: Option<&str>,
    season: Option<u32>,
    paths: &[PathBuf],
    destination: Option<PathBuf>,
) -> Result<()> {
    let outcome = gather(config, series, season, paths);
    print_outcome(&outcome);

    if outcome.pairs.is_empty() {
        anyhow::bail!("No matching file pairs found");
    }

    let mut settings = PipelineSettings::from_config(config)?;
    if destination.is_some() {
        settings.destination = destination;
    }

    let orchestrator = Orchestrator::new(JobRegistry::new(), settings);
    let pairs: Vec<FilePair> = outcome
        .pairs
        .iter()
        .map(|p| FilePair::new(&p.vo_file.path, &p.es_file.path))
        .collect();
    let total = pairs.len();

    let id = orchestrator.submit(ProcessingMode::Tv, pairs)?;
    println!("\nSubmitted job {id} with {total} pair(s)");

    let job = orchestrator.wait(id).await?;
    report_job(&job);

    if job.status == JobStatus::Failed {
        anyhow::bail!(
            "{}",
            job.error.unwrap_or_else(|| "job failed".to_string())
        );
    }
    Ok(())
}

async fn merge_single(
    config: &config::Config,
    vo: PathBuf,
    es: PathBuf,
    destination: Option<PathBuf>,
) -> Result<()> {
    let mut settings = PipelineSettings::from_config(config)?;
    if destination.is_some() {
        settings.destination = destination;
    }

    let orchestrator = Orchestrator::new(JobRegistry::new(), settings);
    let id = orchestrator.submit(ProcessingMode::Movie, vec![FilePair::new(vo, es)])?;
    let job = orchestrator.wait(id).await?;
    report_job(&job);

    if job.status == JobStatus::Failed {
        anyhow::bail!(
            "{}",
            job.error.unwrap_or_else(|| "merge failed".to_string())
        );
    }
    Ok(())
}

fn report_job(job: &dubforge::state::Job) {
    let done = job
        .pairs
        .iter()
        .filter(|p| p.state == dubforge::pipeline::PairState::Done)
        .count();
    println!(
        "\nJob {}: {} ({}/{} pair(s) succeeded)",
        job.id,
        match job.status {
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
            JobStatus::Starting => "starting",
            JobStatus::Processing => "processing",
        },
        done,
        job.pairs.len()
    );

    for (i, pair) in job.pairs.iter().enumerate() {
        match (&pair.state, &pair.output) {
            (dubforge::pipeline::PairState::Done, Some(output)) => {
                println!("  pair {}: done -> {}", i + 1, output.display());
            }
            (state, _) => println!("  pair {}: {}", i + 1, state),
        }
    }
}

async fn convert_files(config: &config::Config, files: &[PathBuf]) -> Result<()> {
    let settings = PipelineSettings::from_config(config)?;

    for file in files {
        if dubforge_av::Container::from_path(file)
            .map(|c| c.supports_multi_audio_copy())
            .unwrap_or(false)
        {
            println!("Already in MKV format: {}", file.display());
            continue;
        }

        let output = file.with_extension(dubforge_av::Container::Mkv.extension());
        dubforge_av::remux_to_mkv(&settings.ffmpeg, file, &output, settings.tool_timeout).await?;
        println!("Converted: {}", output.display());
    }
    Ok(())
}

async fn probe_file(config: &config::Config, file: &Path, json: bool) -> Result<()> {
    if !file.exists() {
        anyhow::bail!("File does not exist: {:?}", file);
    }

    let ffprobe = dubforge_av::get_tool_path("ffprobe", config.tools.ffprobe_path.as_deref())?;
    let media_info = dubforge_av::probe_file(&ffprobe, file).await?;

    if json {
        let json_str = serde_json::to_string_pretty(&media_info)?;
        println!("{}", json_str);
    } else {
        println!("File: {}", media_info.file_path.display());
        println!("Container: {}", media_info.container);
        if let Some(ref duration) = media_info.duration {
            let secs = duration.as_secs();
            let mins = secs / 60;
            let hours = mins / 60;
            println!("Duration: {:02}:{:02}:{:02}", hours, mins % 60, secs % 60);
        }

        println!("\nVideo Tracks: {}", media_info.video_tracks.len());
        for (i, track) in media_info.video_tracks.iter().enumerate() {
            println!("  [{}] {} {}x{}", i, track.codec, track.width, track.height);
        }

        println!("\nAudio Tracks: {}", media_info.audio_tracks.len());
        for (i, track) in media_info.audio_tracks.iter().enumerate() {
            print!("  [{}] {} {}ch", i, track.codec, track.channels);
            if let Some(ref lang) = track.language {
                print!(" ({})", lang);
            }
            if track.default {
                print!(" [default]");
            }
            println!();
        }
    }

    Ok(())
}

fn check_tools() -> Result<()> {
    println!("Checking external tools...\n");

    let tools = dubforge_av::check_tools();
    let mut all_ok = true;

    for tool in &tools {
        let status = if tool.available {
            "✓"
        } else {
            all_ok = false;
            "✗"
        };

        print!("{} {}", status, tool.name);

        if let Some(ref version) = tool.version {
            print!(" ({})", version.lines().next().unwrap_or(""));
        }

        if let Some(ref path) = tool.path {
            print!(" - {}", path.display());
        }

        println!();
    }

    println!();
    if all_ok {
        println!("All required tools are available!");
    } else {
        println!("Some tools are missing. Install them to enable all features.");
    }

    Ok(())
}
