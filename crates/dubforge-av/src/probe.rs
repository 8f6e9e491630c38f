//! FFprobe-based media probing.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::command::ToolCommand;
use crate::{Error, Result};

/// Default probe timeout. Probing only reads headers, so this is short.
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(60);

/// Media information extracted from a container.
#[derive(Debug, Clone, Serialize)]
pub struct MediaInfo {
    /// Path the probe ran against.
    pub file_path: PathBuf,
    /// Container format name as reported by ffprobe (e.g. "matroska,webm").
    pub container: String,
    /// Total duration, when the container reports one.
    pub duration: Option<Duration>,
    /// Video streams in container order.
    pub video_tracks: Vec<VideoTrack>,
    /// Audio streams in container order.
    pub audio_tracks: Vec<AudioTrack>,
}

impl MediaInfo {
    /// Languages tagged on the audio tracks, lowercased, in stream order.
    pub fn audio_languages(&self) -> Vec<String> {
        self.audio_tracks
            .iter()
            .filter_map(|t| t.language.as_ref())
            .map(|l| l.to_lowercase())
            .collect()
    }
}

/// A single video stream.
#[derive(Debug, Clone, Serialize)]
pub struct VideoTrack {
    /// Zero-based index among video streams.
    pub index: u32,
    /// Codec name.
    pub codec: String,
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
}

/// A single audio stream.
#[derive(Debug, Clone, Serialize)]
pub struct AudioTrack {
    /// Zero-based index among audio streams.
    pub index: u32,
    /// Codec name.
    pub codec: String,
    /// Channel count.
    pub channels: u32,
    /// Language tag from stream metadata, if present.
    pub language: Option<String>,
    /// Whether the stream carries the default disposition.
    pub default: bool,
}

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    format: FfprobeFormat,
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    format_name: String,
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: String,
    codec_name: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    channels: Option<u32>,
    #[serde(default)]
    disposition: FfprobeDisposition,
    #[serde(default)]
    tags: FfprobeTags,
}

#[derive(Debug, Default, Deserialize)]
struct FfprobeDisposition {
    #[serde(default)]
    default: u8,
}

#[derive(Debug, Default, Deserialize)]
struct FfprobeTags {
    language: Option<String>,
}

/// Probe a media file using ffprobe.
///
/// # Errors
///
/// Fails when the file does not exist, ffprobe is missing or exits non-zero,
/// or the JSON output does not match the documented probe contract.
pub async fn probe_file(ffprobe: &Path, path: &Path) -> Result<MediaInfo> {
    if !path.exists() {
        return Err(Error::file_not_found(path));
    }

    let output = ToolCommand::new(ffprobe)
        .arg("-v")
        .arg("quiet")
        .arg("-print_format")
        .arg("json")
        .arg("-show_format")
        .arg("-show_streams")
        .arg(path.to_string_lossy())
        .timeout(PROBE_TIMEOUT)
        .execute()
        .await?;

    parse_ffprobe_json(path, &output.stdout)
}

/// Parse ffprobe's JSON output into a [`MediaInfo`].
///
/// Split out from [`probe_file`] so the parsing contract is testable without
/// ffprobe installed.
pub fn parse_ffprobe_json(path: &Path, json: &str) -> Result<MediaInfo> {
    let ff_output: FfprobeOutput = serde_json::from_str(json)
        .map_err(|e| Error::parse_error("ffprobe", e.to_string()))?;

    let duration = ff_output
        .format
        .duration
        .and_then(|s| s.parse::<f64>().ok())
        .map(Duration::from_secs_f64);

    let mut info = MediaInfo {
        file_path: path.to_path_buf(),
        container: ff_output.format.format_name,
        duration,
        video_tracks: Vec::new(),
        audio_tracks: Vec::new(),
    };

    let mut video_index = 0u32;
    let mut audio_index = 0u32;

    for stream in ff_output.streams {
        match stream.codec_type.as_str() {
            "video" => {
                info.video_tracks.push(VideoTrack {
                    index: video_index,
                    codec: stream.codec_name.unwrap_or_default(),
                    width: stream.width.unwrap_or(0),
                    height: stream.height.unwrap_or(0),
                });
                video_index += 1;
            }
            "audio" => {
                info.audio_tracks.push(AudioTrack {
                    index: audio_index,
                    codec: stream.codec_name.unwrap_or_default(),
                    channels: stream.channels.unwrap_or(2),
                    language: stream.tags.language,
                    default: stream.disposition.default == 1,
                });
                audio_index += 1;
            }
            _ => {}
        }
    }

    Ok(info)
}
