use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub media: MediaConfig,

    #[serde(default)]
    pub languages: LanguageConfig,

    #[serde(default)]
    pub tools: ToolsConfig,
}

/// Where media lives and where output goes.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MediaConfig {
    /// Root directory all scanned and processed paths must live under.
    #[serde(default = "default_media_root")]
    pub root: PathBuf,

    /// Directories searched for VO/ES candidates. Entries outside the media
    /// root are skipped at scan time.
    #[serde(default)]
    pub search_paths: Vec<PathBuf>,

    /// Directory merged output files are written to. Defaults to the VO
    /// file's directory when unset.
    #[serde(default)]
    pub destination: Option<PathBuf>,
}

fn default_media_root() -> PathBuf {
    PathBuf::from("/mnt/media")
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            root: default_media_root(),
            search_paths: Vec::new(),
            destination: None,
        }
    }
}

/// Language tags written into the merged container's stream metadata.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LanguageConfig {
    /// Tag for the original audio stream.
    #[serde(default = "default_original_lang")]
    pub original: String,

    /// Tag for the merged-in dubbed audio stream.
    #[serde(default = "default_dubbed_lang")]
    pub dubbed: String,
}

fn default_original_lang() -> String {
    "eng".to_string()
}

fn default_dubbed_lang() -> String {
    "spa".to_string()
}

impl Default for LanguageConfig {
    fn default() -> Self {
        Self {
            original: default_original_lang(),
            dubbed: default_dubbed_lang(),
        }
    }
}

/// External tool locations and limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ToolsConfig {
    /// Explicit ffmpeg path; falls back to PATH lookup when unset.
    #[serde(default)]
    pub ffmpeg_path: Option<PathBuf>,

    /// Explicit ffprobe path; falls back to PATH lookup when unset.
    #[serde(default)]
    pub ffprobe_path: Option<PathBuf>,

    /// Upper bound on a single remux/merge invocation, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    900
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: None,
            ffprobe_path: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl ToolsConfig {
    /// Tool timeout as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
